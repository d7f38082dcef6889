//! Shared test fixtures for integration tests.
#![allow(dead_code)]

use chrono::{NaiveDate, NaiveDateTime};

use bess_sizer::config::{LoadConfig, ScenarioConfig, StorageParams};
use bess_sizer::profile::{AlignedProfile, HourlySeries, LoadSeries, SolarSynthesizer, SyntheticLoad};
use bess_sizer::sim::StorageConfig;

/// Midnight at the start of the given date.
pub fn midnight(year: i32, month: u32, day: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .expect("valid date")
}

/// Constant load for `days` days starting Monday 2024-03-04 00:00.
pub fn flat_load(load_kw: f64, days: usize) -> LoadSeries {
    HourlySeries::from_hourly_values(midnight(2024, 3, 4), vec![load_kw; 24 * days])
}

/// One weekday at 100 kW with a single 300 kW spike at 16:00.
pub fn single_spike_day() -> LoadSeries {
    let mut values = vec![100.0; 24];
    values[16] = 300.0;
    HourlySeries::from_hourly_values(midnight(2024, 3, 4), values)
}

/// Seeded synthetic plant year from the load section of a scenario.
pub fn synthetic_year(load: &LoadConfig) -> LoadSeries {
    SyntheticLoad::new(
        load.base_kw,
        load.amp_kw,
        load.phase_rad,
        load.noise_std,
        load.weekend_factor,
        load.seed,
    )
    .for_year(load.year)
}

/// Synthetic year aligned with the scenario's PV array.
pub fn scenario_profile(cfg: &ScenarioConfig) -> (LoadSeries, AlignedProfile) {
    let load = synthetic_year(&cfg.load);
    let aligned = SolarSynthesizer::new(cfg.pv.capacity_kwp, cfg.economics.pv_yield_kwh_per_kwp)
        .site_profile(&load);
    (load, aligned)
}

/// Constant load of `hours` hours starting at `start`.
pub fn flat_load_from(start: NaiveDateTime, load_kw: f64, hours: usize) -> LoadSeries {
    HourlySeries::from_hourly_values(start, vec![load_kw; hours])
}

/// 200 kWh / 100 kW storage with the default efficiency and SOC band.
pub fn default_storage() -> StorageConfig {
    StorageConfig::from_capacity(200.0, &StorageParams::default())
}

//! Hour-by-hour dispatch simulation over an aligned load/PV profile.

use tracing::{debug, instrument, warn};

use super::dispatch::{HourState, arbitrage, charge_from_surplus, shave_peak};
use super::matcher::match_hour;
use super::result::DispatchResult;
use super::types::{DispatchWindows, HourStep, StorageConfig};
use crate::profile::series::{AlignedProfile, percentile};

/// Simulation engine for one storage candidate.
///
/// Borrows the profile and windows; owns only the carried state of charge.
/// The peak-shaving threshold is computed once from the measured load hours;
/// zero-filled gaps do not pull it down.
pub struct Engine<'a> {
    profile: &'a AlignedProfile,
    storage: StorageConfig,
    windows: &'a DispatchWindows,
    peak_threshold_kw: f64,
    soc_kwh: f64,
}

impl<'a> Engine<'a> {
    pub fn new(
        profile: &'a AlignedProfile,
        storage: StorageConfig,
        windows: &'a DispatchWindows,
    ) -> Self {
        Self {
            profile,
            storage,
            windows,
            peak_threshold_kw: percentile(&profile.measured_load_kw(), windows.peak_percentile),
            soc_kwh: storage.initial_soc_kwh(),
        }
    }

    /// Executes hour `i` and advances the carried SOC.
    pub fn step(&mut self, i: usize) -> HourStep {
        let load_kw = self.profile.load_kw[i];
        let generation_kwh = self.profile.generation_kwh[i];
        let window = self.windows.classify(self.profile.hour_of_day(i));
        let rte = self.storage.round_trip_efficiency;

        let surplus = match_hour(load_kw, generation_kwh).surplus_kwh;

        let state = HourState::begin(self.soc_kwh, &self.storage);
        let state = charge_from_surplus(state, surplus, rte);
        let state = arbitrage(state, window, rte);
        let state = shave_peak(state, load_kw, self.peak_threshold_kw);
        let soc_end_kwh = state.settle(&self.storage);

        let step = HourStep {
            hour: i,
            timestamp: self.profile.hours[i],
            load_kw,
            generation_kwh,
            window,
            soc_start_kwh: self.soc_kwh,
            soc_end_kwh,
            net_kwh: state.net_kwh,
            self_consumption_kwh: state.flows.self_consumption_kwh,
            arbitrage_charge_kwh: state.flows.arbitrage_charge_kwh,
            arbitrage_discharge_kwh: state.flows.arbitrage_discharge_kwh,
            peak_shaving_kwh: state.flows.peak_shaving_kwh,
        };
        self.soc_kwh = soc_end_kwh;
        step
    }

    /// Executes every hour of the profile and returns the step records.
    pub fn run(&mut self) -> Vec<HourStep> {
        (0..self.profile.len()).map(|i| self.step(i)).collect()
    }

    pub fn peak_threshold_kw(&self) -> f64 {
        self.peak_threshold_kw
    }
}

/// Simulates one storage candidate over the whole profile.
///
/// A candidate that cannot hold or move energy produces all-zero streams and
/// a zero SOC trace rather than an error.
#[instrument(
    level = "debug",
    skip_all,
    fields(capacity_kwh = storage.capacity_kwh, hours = profile.len()),
)]
pub fn simulate(
    profile: &AlignedProfile,
    storage: &StorageConfig,
    windows: &DispatchWindows,
) -> DispatchResult {
    if storage.is_degenerate() {
        if storage.capacity_kwh.is_finite() && storage.capacity_kwh >= 0.0 {
            debug!("storage cannot move energy, returning zero streams");
        } else {
            warn!(capacity_kwh = storage.capacity_kwh, "invalid storage capacity");
        }
        return idle_result(profile, windows);
    }

    let mut engine = Engine::new(profile, *storage, windows);
    let steps = engine.run();
    let result = DispatchResult::from_steps(steps, storage.capacity_kwh, engine.peak_threshold_kw());
    debug!(
        self_consumption_kwh = result.self_consumption_kwh,
        arbitrage_discharge_kwh = result.arbitrage_discharge_kwh,
        peak_shaving_kwh = result.peak_shaving_kwh,
        cycles = result.cycle_count,
        "dispatch finished"
    );
    result
}

fn idle_result(profile: &AlignedProfile, windows: &DispatchWindows) -> DispatchResult {
    let steps = (0..profile.len())
        .map(|i| HourStep {
            hour: i,
            timestamp: profile.hours[i],
            load_kw: profile.load_kw[i],
            generation_kwh: profile.generation_kwh[i],
            window: windows.classify(profile.hour_of_day(i)),
            soc_start_kwh: 0.0,
            soc_end_kwh: 0.0,
            net_kwh: 0.0,
            self_consumption_kwh: 0.0,
            arbitrage_charge_kwh: 0.0,
            arbitrage_discharge_kwh: 0.0,
            peak_shaving_kwh: 0.0,
        })
        .collect();
    let threshold = percentile(&profile.measured_load_kw(), windows.peak_percentile);
    DispatchResult::from_steps(steps, 0.0, threshold)
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::config::StorageParams;
    use crate::profile::series::HourlySeries;
    use crate::sim::types::HourWindow;

    fn flat_day(load_kw: f64, days: usize) -> AlignedProfile {
        let start = NaiveDate::from_ymd_opt(2024, 3, 4)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .unwrap();
        AlignedProfile::load_only(&HourlySeries::from_hourly_values(start, vec![load_kw; 24 * days]))
    }

    fn night_and_evening() -> DispatchWindows {
        DispatchWindows {
            cheap_hours: vec![HourWindow(0, 6)],
            expensive_hours: vec![HourWindow(17, 21)],
            ..DispatchWindows::default()
        }
    }

    #[test]
    fn flat_load_charges_at_night_and_discharges_in_the_evening() {
        let profile = flat_day(100.0, 1);
        let storage = StorageConfig::from_capacity(200.0, &StorageParams::default());
        let result = simulate(&profile, &storage, &night_and_evening());

        assert_eq!(result.soc_trace[0], 100.0);
        assert!((result.soc_trace[1] - 180.0).abs() < 1e-9);
        assert!((result.soc_trace[17] - 180.0).abs() < 1e-9);
        assert!((result.soc_trace[18] - 80.0).abs() < 1e-9);
        assert!((result.soc_trace[19] - 20.0).abs() < 1e-9);
        assert!((result.arbitrage_discharge_kwh - 160.0).abs() < 1e-9);
        assert_eq!(result.self_consumption_kwh, 0.0);
        assert_eq!(result.peak_shaving_kwh, 0.0);
    }

    #[test]
    fn zero_capacity_gives_zero_streams() {
        let profile = flat_day(100.0, 2);
        let storage = StorageConfig::from_capacity(0.0, &StorageParams::default());
        let result = simulate(&profile, &storage, &DispatchWindows::default());
        assert_eq!(result.hours(), 48);
        assert!(result.soc_trace.iter().all(|soc| *soc == 0.0));
        assert_eq!(result.throughput_kwh(), 0.0);
        assert_eq!(result.cycle_count, 0.0);
    }

    #[test]
    fn empty_profile_gives_empty_result() {
        let storage = StorageConfig::from_capacity(100.0, &StorageParams::default());
        let result = simulate(&AlignedProfile::default(), &storage, &DispatchWindows::default());
        assert_eq!(result.hours(), 0);
    }

    #[test]
    fn threshold_ignores_zero_filled_hours() {
        let start = NaiveDate::from_ymd_opt(2024, 3, 4)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .unwrap();
        // Two readings 30 hours apart; the gap must not drag P95 towards zero.
        let load = HourlySeries::new([(start, 100.0), (start + chrono::Duration::hours(30), 100.0)]);
        let profile = AlignedProfile::load_only(&load);
        assert_eq!(profile.len(), 31);

        let storage = StorageConfig::from_capacity(100.0, &StorageParams::default());
        let result = simulate(&profile, &storage, &DispatchWindows::default());
        assert_eq!(result.peak_threshold_kw, 100.0);
        assert_eq!(result.peak_shaving_kwh, 0.0);
    }

    #[test]
    fn step_records_carry_soc_forward() {
        let profile = flat_day(50.0, 3);
        let storage = StorageConfig::from_capacity(100.0, &StorageParams::default());
        let windows = DispatchWindows::default();
        let mut engine = Engine::new(&profile, storage, &windows);
        let steps = engine.run();
        for pair in steps.windows(2) {
            assert_eq!(pair[0].soc_end_kwh, pair[1].soc_start_kwh);
        }
    }
}

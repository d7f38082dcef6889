//! TOML-based scenario configuration and preset definitions.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::economics::tariff::{
    CategoryDowngrades, CategoryMultipliers, DemandChargeCategory, default_downgrades,
    default_multipliers,
};
use crate::sim::types::{DispatchWindows, HourWindow};
use crate::sizing::storage::MAX_CANDIDATES;

/// Top-level scenario configuration parsed from TOML.
///
/// All sections have defaults matching the baseline scenario. Load from
/// TOML with [`ScenarioConfig::from_toml_file`] or use
/// [`ScenarioConfig::baseline`] for the built-in default.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScenarioConfig {
    /// Battery physics shared by every sizing candidate.
    #[serde(default)]
    pub storage: StorageParams,
    /// Cheap/expensive hour windows and the peak-shaving percentile.
    #[serde(default)]
    pub dispatch: DispatchWindows,
    /// Candidate capacity grid.
    #[serde(default)]
    pub search: SearchConfig,
    /// Cost and price registry used to value dispatch results.
    #[serde(default)]
    pub economics: EconomicParameters,
    /// Client tariff: prices, capacity fee and demand-charge category.
    #[serde(default)]
    pub tariff: TariffInputs,
    /// Installed PV on site.
    #[serde(default)]
    pub pv: PvConfig,
    /// Multi-year cash-flow projection.
    #[serde(default)]
    pub finance: FinanceConfig,
    /// Roof-limited sizing of additional PV.
    #[serde(default)]
    pub pv_sizing: PvSizingConfig,
    /// Synthetic load used when no profile is supplied.
    #[serde(default)]
    pub load: LoadConfig,
}

/// Storage parameters independent of the candidate capacity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StorageParams {
    /// Fraction of drawn energy that ends up stored (0.0-1.0].
    pub round_trip_efficiency: f64,
    /// Lower SOC bound as a fraction of capacity.
    pub min_soc_fraction: f64,
    /// Upper SOC bound as a fraction of capacity.
    pub max_soc_fraction: f64,
    /// SOC at the first simulated hour as a fraction of capacity.
    pub initial_soc_fraction: f64,
    /// Power rating per kWh of capacity (0.5 = C/2).
    pub c_rate: f64,
}

impl Default for StorageParams {
    fn default() -> Self {
        Self {
            round_trip_efficiency: 0.90,
            min_soc_fraction: 0.10,
            max_soc_fraction: 0.90,
            initial_soc_fraction: 0.50,
            c_rate: 0.5,
        }
    }
}

/// Grid of candidate storage capacities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SearchConfig {
    /// Smallest candidate (kWh).
    pub min_capacity_kwh: f64,
    /// Distance between candidates (kWh).
    pub capacity_step_kwh: f64,
    /// Upper bound never drops below this (kWh).
    pub max_capacity_floor_kwh: f64,
    /// Upper bound as a share of average daily consumption.
    pub max_daily_share: f64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            min_capacity_kwh: 50.0,
            capacity_step_kwh: 50.0,
            max_capacity_floor_kwh: 500.0,
            max_daily_share: 0.5,
        }
    }
}

/// Named scalars and lookup tables used to turn energy into money.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EconomicParameters {
    /// Value of one arbitrage kWh (currency/kWh).
    pub price_spread: f64,
    /// Capacity-fee multiplier per demand-charge category.
    pub category_multipliers: CategoryMultipliers,
    /// Category reached once peaks are shaved.
    pub category_downgrades: CategoryDowngrades,
    /// Battery hardware cost (currency/kWh).
    pub storage_cost_per_kwh: f64,
    /// Energy-management system cost per installation.
    pub ems_fixed_cost: f64,
    /// Installation cost as a fraction of hardware cost.
    pub installation_fraction: f64,
    /// Export price as a fraction of the energy price.
    pub net_billing_multiplier: f64,
    /// Share of annual consumption billed in the capacity-fee window.
    pub peak_consumption_share: f64,
    /// Annual PV production per installed kWp (kWh/kWp).
    pub pv_yield_kwh_per_kwp: f64,
}

impl Default for EconomicParameters {
    fn default() -> Self {
        Self {
            price_spread: 0.30,
            category_multipliers: default_multipliers(),
            category_downgrades: default_downgrades(),
            storage_cost_per_kwh: 2000.0,
            ems_fixed_cost: 30_000.0,
            installation_fraction: 0.10,
            net_billing_multiplier: 0.5,
            peak_consumption_share: 0.65,
            pv_yield_kwh_per_kwp: 1050.0,
        }
    }
}

/// Tariff figures taken from the client's invoice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TariffInputs {
    /// Active energy price (currency/kWh).
    pub energy_price: f64,
    /// Variable distribution fee (currency/kWh).
    pub distribution_fee: f64,
    /// Capacity fee (currency/MWh).
    pub capacity_fee_per_mwh: f64,
    /// Demand-charge category; estimated from the load profile when absent.
    pub category: Option<DemandChargeCategory>,
    /// Annual consumption (kWh); the load-profile total when absent.
    pub annual_consumption_kwh: Option<f64>,
}

impl TariffInputs {
    /// Category used when neither the scenario nor a profile estimate provides one.
    pub const FALLBACK_CATEGORY: DemandChargeCategory = DemandChargeCategory::K3;

    pub fn effective_category(&self) -> DemandChargeCategory {
        self.category.unwrap_or(Self::FALLBACK_CATEGORY)
    }
}

impl Default for TariffInputs {
    fn default() -> Self {
        Self {
            energy_price: 0.65,
            distribution_fee: 0.25,
            capacity_fee_per_mwh: 219.40,
            category: None,
            annual_consumption_kwh: None,
        }
    }
}

/// PV already installed on site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PvConfig {
    /// Nameplate capacity (kWp); 0 means no PV.
    pub capacity_kwp: f64,
    /// Measured annual production (kWh); nameplate times yield when absent.
    pub existing_production_kwh: Option<f64>,
}

impl Default for PvConfig {
    fn default() -> Self {
        Self {
            capacity_kwp: 100.0,
            existing_production_kwh: None,
        }
    }
}

/// Horizon and rates of the cash-flow projection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FinanceConfig {
    /// Projection length (years).
    pub horizon_years: u32,
    /// Annual discount rate for NPV.
    pub discount_rate: f64,
    /// Annual loss of savings from battery degradation.
    pub degradation_rate: f64,
}

impl Default for FinanceConfig {
    fn default() -> Self {
        Self {
            horizon_years: 10,
            discount_rate: 0.06,
            degradation_rate: 0.02,
        }
    }
}

/// Roof and price inputs for sizing additional PV.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PvSizingConfig {
    /// Usable roof area (m²); below `min_roof_area_m2` no PV is proposed.
    pub roof_area_m2: f64,
    pub min_roof_area_m2: f64,
    /// Roof area needed per installed kWp.
    pub m2_per_kwp: f64,
    /// Target share of annual consumption covered by PV.
    pub coverage_target: f64,
    /// Distance between scanned sizes (kWp).
    pub step_kwp: f64,
    /// Capital cost per kWp below `small_limit_kwp`.
    pub capex_small_per_kwp: f64,
    /// Capital cost per kWp below `medium_limit_kwp`.
    pub capex_medium_per_kwp: f64,
    /// Capital cost per kWp from `medium_limit_kwp` upward.
    pub capex_large_per_kwp: f64,
    pub small_limit_kwp: f64,
    pub medium_limit_kwp: f64,
}

impl Default for PvSizingConfig {
    fn default() -> Self {
        Self {
            roof_area_m2: 0.0,
            min_roof_area_m2: 20.0,
            m2_per_kwp: 5.5,
            coverage_target: 0.70,
            step_kwp: 10.0,
            capex_small_per_kwp: 3800.0,
            capex_medium_per_kwp: 3200.0,
            capex_large_per_kwp: 2800.0,
            small_limit_kwp: 50.0,
            medium_limit_kwp: 200.0,
        }
    }
}

/// Parameters of the seeded synthetic industrial load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoadConfig {
    /// Calendar year of the generated profile.
    pub year: i32,
    /// Baseline consumption (kW).
    pub base_kw: f64,
    /// Sinusoidal amplitude (kW).
    pub amp_kw: f64,
    /// Phase offset (radians).
    pub phase_rad: f64,
    /// Gaussian noise standard deviation (kW).
    pub noise_std: f64,
    /// Multiplier applied on weekends.
    pub weekend_factor: f64,
    /// Random seed.
    pub seed: u64,
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self {
            year: 2024,
            base_kw: 120.0,
            amp_kw: 60.0,
            phase_rad: -std::f64::consts::FRAC_PI_2,
            noise_std: 8.0,
            weekend_factor: 0.6,
            seed: 42,
        }
    }
}

/// Configuration error with field path and constraint description.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("config error: {field}: {message}")]
pub struct ConfigError {
    /// Dotted field path (e.g., `"storage.round_trip_efficiency"`).
    pub field: String,
    /// Human-readable constraint description.
    pub message: String,
}

impl ConfigError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl ScenarioConfig {
    /// Returns the baseline scenario: mid-size two-shift plant with 100 kWp PV.
    pub fn baseline() -> Self {
        Self::default()
    }

    /// Returns the high-solar preset: large PV array on a daytime-heavy plant.
    pub fn high_solar() -> Self {
        Self {
            pv: PvConfig {
                capacity_kwp: 600.0,
                ..PvConfig::default()
            },
            load: LoadConfig {
                base_kw: 180.0,
                amp_kw: 90.0,
                ..LoadConfig::default()
            },
            pv_sizing: PvSizingConfig {
                roof_area_m2: 5000.0,
                ..PvSizingConfig::default()
            },
            ..Self::default()
        }
    }

    /// Returns the peaky-load preset: spiky demand billed in the top category.
    pub fn peaky_load() -> Self {
        Self {
            pv: PvConfig {
                capacity_kwp: 0.0,
                ..PvConfig::default()
            },
            load: LoadConfig {
                base_kw: 250.0,
                amp_kw: 150.0,
                noise_std: 60.0,
                weekend_factor: 0.3,
                ..LoadConfig::default()
            },
            tariff: TariffInputs {
                category: Some(DemandChargeCategory::K4),
                ..TariffInputs::default()
            },
            dispatch: DispatchWindows {
                expensive_hours: vec![HourWindow(16, 21)],
                ..DispatchWindows::default()
            },
            ..Self::default()
        }
    }

    /// Available preset names.
    pub const PRESETS: &[&str] = &["baseline", "high_solar", "peaky_load"];

    /// Loads a scenario from a named preset.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the preset name is unknown.
    pub fn from_preset(name: &str) -> Result<Self, ConfigError> {
        match name {
            "baseline" => Ok(Self::baseline()),
            "high_solar" => Ok(Self::high_solar()),
            "peaky_load" => Ok(Self::peaky_load()),
            _ => Err(ConfigError::new(
                "preset",
                format!(
                    "unknown preset \"{name}\", available: {}",
                    Self::PRESETS.join(", ")
                ),
            )),
        }
    }

    /// Parses a scenario from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or the TOML is invalid.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| {
            ConfigError::new("scenario", format!("cannot read \"{}\": {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses a scenario from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the TOML is invalid or contains unknown fields.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError::new("toml", e.to_string()))
    }

    /// Validates all fields and returns a list of errors.
    ///
    /// Returns an empty vector if configuration is valid.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        let mut require = |ok: bool, field: &str, message: &str| {
            if !ok {
                errors.push(ConfigError::new(field, message));
            }
        };

        let st = &self.storage;
        require(
            st.round_trip_efficiency > 0.0 && st.round_trip_efficiency <= 1.0,
            "storage.round_trip_efficiency",
            "must be in (0.0, 1.0]",
        );
        require(
            (0.0..1.0).contains(&st.min_soc_fraction),
            "storage.min_soc_fraction",
            "must be in [0.0, 1.0)",
        );
        require(
            st.max_soc_fraction > 0.0 && st.max_soc_fraction <= 1.0,
            "storage.max_soc_fraction",
            "must be in (0.0, 1.0]",
        );
        require(
            st.min_soc_fraction < st.max_soc_fraction,
            "storage.min_soc_fraction",
            "must be < storage.max_soc_fraction",
        );
        require(
            (0.0..=1.0).contains(&st.initial_soc_fraction),
            "storage.initial_soc_fraction",
            "must be in [0.0, 1.0]",
        );
        require(st.c_rate > 0.0, "storage.c_rate", "must be > 0");

        let d = &self.dispatch;
        let windows_in_day = |ws: &[HourWindow]| ws.iter().all(|w| w.0 <= 24 && w.1 <= 24);
        require(
            windows_in_day(&d.cheap_hours),
            "dispatch.cheap_hours",
            "window bounds must be <= 24",
        );
        require(
            windows_in_day(&d.expensive_hours),
            "dispatch.expensive_hours",
            "window bounds must be <= 24",
        );
        require(
            (0.0..=100.0).contains(&d.peak_percentile),
            "dispatch.peak_percentile",
            "must be in [0, 100]",
        );

        let s = &self.search;
        require(s.min_capacity_kwh > 0.0, "search.min_capacity_kwh", "must be > 0");
        require(s.capacity_step_kwh > 0.0, "search.capacity_step_kwh", "must be > 0");
        require(
            s.max_capacity_floor_kwh >= 0.0,
            "search.max_capacity_floor_kwh",
            "must be >= 0",
        );
        require(s.max_daily_share >= 0.0, "search.max_daily_share", "must be >= 0");
        let floor_steps = (s.max_capacity_floor_kwh - s.min_capacity_kwh) / s.capacity_step_kwh;
        require(
            s.capacity_step_kwh <= 0.0 || floor_steps < MAX_CANDIDATES as f64,
            "search.capacity_step_kwh",
            "too small: the grid up to max_capacity_floor_kwh exceeds the candidate limit",
        );

        let e = &self.economics;
        require(e.price_spread >= 0.0, "economics.price_spread", "must be >= 0");
        require(
            e.storage_cost_per_kwh >= 0.0,
            "economics.storage_cost_per_kwh",
            "must be >= 0",
        );
        require(e.ems_fixed_cost >= 0.0, "economics.ems_fixed_cost", "must be >= 0");
        require(
            e.installation_fraction >= 0.0,
            "economics.installation_fraction",
            "must be >= 0",
        );
        require(
            (0.0..=1.0).contains(&e.net_billing_multiplier),
            "economics.net_billing_multiplier",
            "must be in [0.0, 1.0]",
        );
        require(
            (0.0..=1.0).contains(&e.peak_consumption_share),
            "economics.peak_consumption_share",
            "must be in [0.0, 1.0]",
        );
        require(
            e.pv_yield_kwh_per_kwp > 0.0,
            "economics.pv_yield_kwh_per_kwp",
            "must be > 0",
        );
        require(
            e.category_multipliers.values().all(|m| *m >= 0.0),
            "economics.category_multipliers",
            "multipliers must be >= 0",
        );

        let t = &self.tariff;
        require(t.energy_price >= 0.0, "tariff.energy_price", "must be >= 0");
        require(t.distribution_fee >= 0.0, "tariff.distribution_fee", "must be >= 0");
        require(
            t.capacity_fee_per_mwh >= 0.0,
            "tariff.capacity_fee_per_mwh",
            "must be >= 0",
        );
        require(
            t.annual_consumption_kwh.is_none_or(|kwh| kwh >= 0.0),
            "tariff.annual_consumption_kwh",
            "must be >= 0",
        );

        let pv = &self.pv;
        require(
            pv.capacity_kwp.is_finite() && pv.capacity_kwp >= 0.0,
            "pv.capacity_kwp",
            "must be a finite value >= 0",
        );
        require(
            pv.existing_production_kwh.is_none_or(|kwh| kwh >= 0.0),
            "pv.existing_production_kwh",
            "must be >= 0",
        );

        let f = &self.finance;
        require(f.horizon_years > 0, "finance.horizon_years", "must be > 0");
        require(f.discount_rate > -1.0, "finance.discount_rate", "must be > -1.0");
        require(
            (0.0..1.0).contains(&f.degradation_rate),
            "finance.degradation_rate",
            "must be in [0.0, 1.0)",
        );

        let ps = &self.pv_sizing;
        require(ps.roof_area_m2 >= 0.0, "pv_sizing.roof_area_m2", "must be >= 0");
        require(ps.m2_per_kwp > 0.0, "pv_sizing.m2_per_kwp", "must be > 0");
        require(ps.step_kwp > 0.0, "pv_sizing.step_kwp", "must be > 0");
        require(
            (0.0..=1.0).contains(&ps.coverage_target),
            "pv_sizing.coverage_target",
            "must be in [0.0, 1.0]",
        );
        require(
            ps.small_limit_kwp <= ps.medium_limit_kwp,
            "pv_sizing.small_limit_kwp",
            "must be <= pv_sizing.medium_limit_kwp",
        );

        let l = &self.load;
        require(l.base_kw >= 0.0, "load.base_kw", "must be >= 0");
        require(l.noise_std >= 0.0, "load.noise_std", "must be >= 0");
        require(l.weekend_factor >= 0.0, "load.weekend_factor", "must be >= 0");

        errors
    }
}

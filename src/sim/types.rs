//! Core simulation types: storage configuration, price windows, and step data.

use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::config::StorageParams;

/// Physical parameters of one storage candidate, fixed for a whole run.
///
/// # Examples
///
/// ```
/// use bess_sizer::config::StorageParams;
/// use bess_sizer::sim::types::StorageConfig;
///
/// let storage = StorageConfig::from_capacity(200.0, &StorageParams::default());
/// assert_eq!(storage.power_kw, 100.0);
/// assert_eq!(storage.soc_min_kwh(), 20.0);
/// assert_eq!(storage.soc_max_kwh(), 180.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StorageConfig {
    /// Nameplate energy capacity (kWh).
    pub capacity_kwh: f64,
    /// Charge and discharge power rating (kW).
    pub power_kw: f64,
    /// Share of drawn energy that is stored; losses are taken on ingress.
    pub round_trip_efficiency: f64,
    pub min_soc_fraction: f64,
    pub max_soc_fraction: f64,
    pub initial_soc_fraction: f64,
}

impl StorageConfig {
    /// Derives a candidate from its capacity, with power = capacity × C-rate.
    pub fn from_capacity(capacity_kwh: f64, params: &StorageParams) -> Self {
        Self {
            capacity_kwh,
            power_kw: capacity_kwh * params.c_rate,
            round_trip_efficiency: params.round_trip_efficiency,
            min_soc_fraction: params.min_soc_fraction,
            max_soc_fraction: params.max_soc_fraction,
            initial_soc_fraction: params.initial_soc_fraction,
        }
    }

    pub fn soc_min_kwh(&self) -> f64 {
        self.capacity_kwh * self.min_soc_fraction
    }

    pub fn soc_max_kwh(&self) -> f64 {
        self.capacity_kwh * self.max_soc_fraction
    }

    /// Starting state of charge, pulled into `[soc_min, soc_max]`.
    pub fn initial_soc_kwh(&self) -> f64 {
        (self.capacity_kwh * self.initial_soc_fraction)
            .max(self.soc_min_kwh())
            .min(self.soc_max_kwh())
    }

    /// True when this configuration cannot hold or move any energy.
    pub fn is_degenerate(&self) -> bool {
        let finite = [
            self.capacity_kwh,
            self.power_kw,
            self.round_trip_efficiency,
            self.min_soc_fraction,
            self.max_soc_fraction,
            self.initial_soc_fraction,
        ]
        .iter()
        .all(|v| v.is_finite());

        !finite
            || self.capacity_kwh <= 0.0
            || self.power_kw <= 0.0
            || self.round_trip_efficiency <= 0.0
            || self.min_soc_fraction > self.max_soc_fraction
    }
}

/// Half-open range of clock hours `[start, end)`.
///
/// A window whose end is before its start wraps past midnight, so
/// `HourWindow(22, 6)` covers 22:00 through 05:59. Equal bounds cover nothing.
/// In TOML a window is written as a two-element array: `[22, 6]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HourWindow(pub u32, pub u32);

impl HourWindow {
    pub fn contains(self, hour: u32) -> bool {
        let HourWindow(start, end) = self;
        if start <= end {
            (start..end).contains(&hour)
        } else {
            hour >= start || hour < end
        }
    }
}

/// Tariff window an hour falls into for arbitrage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceWindow {
    Cheap,
    Expensive,
    Neutral,
}

/// Arbitrage windows and the peak-shaving threshold percentile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DispatchWindows {
    /// Hours in which the battery charges from the grid.
    pub cheap_hours: Vec<HourWindow>,
    /// Hours in which the battery discharges into the site load.
    pub expensive_hours: Vec<HourWindow>,
    /// Load percentile above which peak shaving kicks in.
    pub peak_percentile: f64,
}

impl Default for DispatchWindows {
    fn default() -> Self {
        Self {
            cheap_hours: vec![HourWindow(22, 6), HourWindow(10, 15)],
            expensive_hours: vec![HourWindow(17, 21)],
            peak_percentile: 95.0,
        }
    }
}

impl DispatchWindows {
    /// Classifies a clock hour. Cheap wins when windows overlap.
    pub fn classify(&self, hour: u32) -> PriceWindow {
        if self.cheap_hours.iter().any(|w| w.contains(hour)) {
            PriceWindow::Cheap
        } else if self.expensive_hours.iter().any(|w| w.contains(hour)) {
            PriceWindow::Expensive
        } else {
            PriceWindow::Neutral
        }
    }
}

/// Complete record of one simulated hour.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HourStep {
    /// Index on the aligned hour axis.
    pub hour: usize,
    pub timestamp: NaiveDateTime,
    pub load_kw: f64,
    pub generation_kwh: f64,
    pub window: PriceWindow,
    /// SOC at the start of the hour (kWh).
    pub soc_start_kwh: f64,
    /// SOC carried into the next hour (kWh).
    pub soc_end_kwh: f64,
    /// Net energy applied to the battery this hour (kWh; positive = charge).
    pub net_kwh: f64,
    /// PV surplus stored in the battery (kWh, after losses).
    pub self_consumption_kwh: f64,
    /// Energy drawn from the grid in a cheap hour (kWh, before losses).
    pub arbitrage_charge_kwh: f64,
    /// Energy released in an expensive hour (kWh).
    pub arbitrage_discharge_kwh: f64,
    /// Energy released to cap load at the peak threshold (kWh).
    pub peak_shaving_kwh: f64,
}

impl fmt::Display for HourStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "h={:>4} {} | load={:>7.1} kW  pv={:>6.1} kWh | SoC {:>7.1} -> {:>7.1} kWh \
             | sc={:.1} arb+={:.1} arb-={:.1} peak={:.1}",
            self.hour,
            self.timestamp.format("%Y-%m-%d %H:%M"),
            self.load_kw,
            self.generation_kwh,
            self.soc_start_kwh,
            self.soc_end_kwh,
            self.self_consumption_kwh,
            self.arbitrage_charge_kwh,
            self.arbitrage_discharge_kwh,
            self.peak_shaving_kwh,
        )
    }
}

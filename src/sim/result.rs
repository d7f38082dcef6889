//! Post-hoc aggregation of a dispatch run.

use std::fmt;

use serde::Serialize;

use super::types::HourStep;

/// Energy streams and SOC trace of one simulation run.
///
/// Computed post-hoc from the per-hour step records, so the totals always
/// agree with the trace.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DispatchResult {
    /// PV surplus stored over the year (kWh, after losses).
    pub self_consumption_kwh: f64,
    /// Grid energy drawn in cheap hours (kWh).
    pub arbitrage_charge_kwh: f64,
    /// Energy released in expensive hours (kWh).
    pub arbitrage_discharge_kwh: f64,
    /// Energy released to cap load at the peak threshold (kWh).
    pub peak_shaving_kwh: f64,
    /// Full-cycle equivalents: throughput over capacity.
    pub cycle_count: f64,
    /// Load level above which peak shaving was attempted (kW).
    pub peak_threshold_kw: f64,
    /// SOC at the start of each hour (kWh).
    pub soc_trace: Vec<f64>,
    #[serde(skip)]
    pub steps: Vec<HourStep>,
}

impl DispatchResult {
    /// Aggregates the step records of a run.
    pub fn from_steps(steps: Vec<HourStep>, capacity_kwh: f64, peak_threshold_kw: f64) -> Self {
        let mut result = Self {
            peak_threshold_kw,
            soc_trace: steps.iter().map(|s| s.soc_start_kwh).collect(),
            ..Self::default()
        };

        for s in &steps {
            result.self_consumption_kwh += s.self_consumption_kwh;
            result.arbitrage_charge_kwh += s.arbitrage_charge_kwh;
            result.arbitrage_discharge_kwh += s.arbitrage_discharge_kwh;
            result.peak_shaving_kwh += s.peak_shaving_kwh;
        }

        result.cycle_count = if capacity_kwh > 0.0 {
            result.throughput_kwh() / capacity_kwh
        } else {
            0.0
        };
        result.steps = steps;
        result
    }

    /// Energy counted toward cycling: stored PV plus all discharges.
    pub fn throughput_kwh(&self) -> f64 {
        self.self_consumption_kwh + self.arbitrage_discharge_kwh + self.peak_shaving_kwh
    }

    pub fn hours(&self) -> usize {
        self.soc_trace.len()
    }
}

impl fmt::Display for DispatchResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Dispatch ---")?;
        writeln!(f, "Hours simulated:       {}", self.hours())?;
        writeln!(f, "PV surplus stored:     {:.1} kWh", self.self_consumption_kwh)?;
        writeln!(
            f,
            "Arbitrage:             {:.1} kWh in / {:.1} kWh out",
            self.arbitrage_charge_kwh, self.arbitrage_discharge_kwh
        )?;
        writeln!(
            f,
            "Peak shaving:          {:.1} kWh above {:.1} kW",
            self.peak_shaving_kwh, self.peak_threshold_kw
        )?;
        write!(f, "Equivalent cycles:     {:.1}", self.cycle_count)
    }
}

//! Capital cost, simple payback, and a degraded multi-year cash-flow outlook.

use std::fmt;

use serde::Serialize;

use crate::config::{EconomicParameters, FinanceConfig};

/// Payback reported when a configuration never pays for itself.
pub const PAYBACK_SENTINEL_YEARS: f64 = 999.0;

/// Installed cost of a storage system: hardware, installation share, and EMS.
pub fn capital_cost(capacity_kwh: f64, econ: &EconomicParameters) -> f64 {
    let hardware = capacity_kwh.max(0.0) * econ.storage_cost_per_kwh;
    hardware * (1.0 + econ.installation_fraction) + econ.ems_fixed_cost
}

/// Capital over annual savings, or [`PAYBACK_SENTINEL_YEARS`] without savings.
pub fn simple_payback(capital: f64, annual_savings: f64) -> f64 {
    if annual_savings > 0.0 {
        capital / annual_savings
    } else {
        PAYBACK_SENTINEL_YEARS
    }
}

/// Ranking key for candidate selection; +∞ without savings so such a
/// candidate can never beat one that saves money.
pub fn payback_rank(capital: f64, annual_savings: f64) -> f64 {
    if annual_savings > 0.0 {
        capital / annual_savings
    } else {
        f64::INFINITY
    }
}

/// One projected year.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct YearProjection {
    pub year: u32,
    /// Share of first-year performance left after degradation.
    pub retention: f64,
    pub savings: f64,
    /// Capital outlay plus all savings up to and including this year.
    pub cumulative_cash_flow: f64,
}

/// Cash-flow projection of an investment over the configured horizon.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FinancialOutlook {
    pub capital_cost: f64,
    pub annual_savings: f64,
    pub payback_years: f64,
    /// Net present value of degraded savings minus capital.
    pub npv: f64,
    /// Undiscounted, undegraded return over the horizon (%).
    pub roi_pct: f64,
    /// First year in which cumulative cash flow is non-negative.
    pub break_even_year: Option<u32>,
    pub years: Vec<YearProjection>,
}

impl FinancialOutlook {
    pub fn project(capital_cost: f64, annual_savings: f64, finance: &FinanceConfig) -> Self {
        let mut npv = -capital_cost;
        let mut cumulative = -capital_cost;
        let mut break_even_year = None;
        let mut years = Vec::with_capacity(finance.horizon_years as usize);

        for year in 1..=finance.horizon_years {
            let exponent = year as i32;
            let retention = (1.0 - finance.degradation_rate).powi(exponent);
            let savings = annual_savings * retention;
            npv += savings / (1.0 + finance.discount_rate).powi(exponent);
            cumulative += savings;
            if break_even_year.is_none() && cumulative >= 0.0 {
                break_even_year = Some(year);
            }
            years.push(YearProjection {
                year,
                retention,
                savings,
                cumulative_cash_flow: cumulative,
            });
        }

        let roi_pct = if capital_cost > 0.0 {
            (annual_savings * f64::from(finance.horizon_years) - capital_cost) / capital_cost * 100.0
        } else {
            0.0
        };

        Self {
            capital_cost,
            annual_savings,
            payback_years: simple_payback(capital_cost, annual_savings),
            npv,
            roi_pct,
            break_even_year,
            years,
        }
    }
}

impl fmt::Display for FinancialOutlook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- {}-Year Outlook ---", self.years.len())?;
        writeln!(f, "NPV:                   {:.0}", self.npv)?;
        writeln!(f, "ROI:                   {:.0}%", self.roi_pct)?;
        match self.break_even_year {
            Some(year) => writeln!(f, "Break-even:            year {year}")?,
            None => writeln!(f, "Break-even:            not within horizon")?,
        }
        write!(f, "Year  Retention  Savings  Cumulative")?;
        for y in &self.years {
            write!(
                f,
                "\n{:>4}  {:>8.1}%  {:>7.0}  {:>10.0}",
                y.year,
                y.retention * 100.0,
                y.savings,
                y.cumulative_cash_flow
            )?;
        }
        Ok(())
    }
}

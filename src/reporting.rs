//! Assembles and renders the outcome of a sizing run.

use std::fmt;

use serde::Serialize;

use crate::config::ScenarioConfig;
use crate::economics::finance::{FinancialOutlook, PAYBACK_SENTINEL_YEARS};
use crate::profile::analysis::ProfileStats;
use crate::profile::series::LoadSeries;
use crate::profile::solar::SolarSynthesizer;
use crate::sim::result::DispatchResult;
use crate::sizing::pv::{PvRecommendation, recommend_pv};
use crate::sizing::storage::{CandidateSummary, Recommendation, SizingContext, SizingRun, search};

/// Everything the binary prints for one scenario.
#[derive(Debug, Clone, Serialize)]
pub struct SizingReport {
    pub profile: ProfileStats,
    pub recommendation: Recommendation,
    pub outlook: FinancialOutlook,
    pub dispatch: DispatchResult,
    pub candidates: Vec<CandidateSummary>,
    pub pv: Option<PvRecommendation>,
}

impl SizingReport {
    /// Runs the storage search, the finance projection and PV sizing.
    ///
    /// Annual consumption comes from the tariff when set, else the load total.
    pub fn build(cfg: &ScenarioConfig, load: &LoadSeries) -> Self {
        let profile = ProfileStats::from_series(load);
        let aligned =
            SolarSynthesizer::new(cfg.pv.capacity_kwp, cfg.economics.pv_yield_kwh_per_kwp).site_profile(load);
        let annual = cfg.tariff.annual_consumption_kwh.unwrap_or(profile.annual_kwh);

        let SizingRun {
            recommendation,
            dispatch,
            candidates,
        } = search(&aligned, annual, &SizingContext::from_scenario(cfg));

        let outlook = FinancialOutlook::project(
            recommendation.capital_cost,
            recommendation.total_annual_savings,
            &cfg.finance,
        );
        let pv = recommend_pv(load, &cfg.pv, &cfg.pv_sizing, &cfg.economics, &cfg.tariff, annual);

        Self {
            profile,
            recommendation,
            outlook,
            dispatch,
            candidates,
            pv,
        }
    }
}

fn payback_label(years: f64) -> String {
    if years >= PAYBACK_SENTINEL_YEARS {
        "never".to_string()
    } else {
        format!("{years:.1} years")
    }
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Storage Recommendation ---")?;
        writeln!(
            f,
            "Capacity / power:      {:.0} kWh / {:.0} kW",
            self.capacity_kwh, self.power_kw
        )?;
        writeln!(f, "Capital cost:          {:.0}", self.capital_cost)?;
        writeln!(f, "Annual savings:        {}", self.savings)?;
        writeln!(f, "Payback:               {}", payback_label(self.payback_years))?;
        writeln!(f, "Cycles per year:       {:.1}", self.cycle_count)?;
        write!(f, "Candidates evaluated:  {}", self.candidates_evaluated)?;
        if !self.is_viable() {
            write!(f, "\nNo candidate saves money; showing the smallest.")?;
        }
        Ok(())
    }
}

impl fmt::Display for PvRecommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- PV Recommendation ---")?;
        writeln!(
            f,
            "Additional capacity:   {:.0} kWp ({:.0} kWh/year)",
            self.new_capacity_kwp, self.annual_production_kwh
        )?;
        writeln!(f, "Capital cost:          {:.0}", self.capital_cost)?;
        writeln!(f, "Annual savings:        {:.0}", self.annual_savings)?;
        writeln!(f, "Self-consumption:      {:.1}%", self.self_consumption_pct)?;
        write!(f, "Payback:               {}", payback_label(self.payback_years))
    }
}

impl fmt::Display for SizingReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.profile)?;
        writeln!(f)?;
        writeln!(f, "Capacity   Capital    Savings  Payback  Cycles")?;
        for c in &self.candidates {
            writeln!(
                f,
                "{:>8.0}  {:>8.0}  {:>9.0}  {:>7}  {:>6.1}",
                c.capacity_kwh,
                c.capital_cost,
                c.savings.total(),
                if c.payback_years >= PAYBACK_SENTINEL_YEARS {
                    "-".to_string()
                } else {
                    format!("{:.1}", c.payback_years)
                },
                c.cycle_count
            )?;
        }
        writeln!(f)?;
        writeln!(f, "{}", self.recommendation)?;
        writeln!(f)?;
        writeln!(f, "{}", self.dispatch)?;
        writeln!(f)?;
        write!(f, "{}", self.outlook)?;
        match &self.pv {
            Some(pv) => write!(f, "\n\n{pv}"),
            None => write!(f, "\n\n--- PV Recommendation ---\nNo additional PV proposed."),
        }
    }
}

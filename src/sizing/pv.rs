use serde::Serialize;
use tracing::{debug, instrument, trace};

use super::first_minimum;
use crate::config::{EconomicParameters, PvConfig, PvSizingConfig, TariffInputs};
use crate::economics::finance::{payback_rank, simple_payback};
use crate::profile::series::LoadSeries;
use crate::profile::solar::SolarSynthesizer;
use crate::sim::matcher::SelfConsumption;

/// Additional PV capacity with the shortest payback.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PvRecommendation {
    /// Capacity to add on top of the existing array (kWp).
    pub new_capacity_kwp: f64,
    /// Expected production of the added capacity (kWh/year).
    pub annual_production_kwh: f64,
    pub capital_cost: f64,
    pub annual_savings: f64,
    pub payback_years: f64,
    /// Self-consumed share of the combined array's output (%).
    pub self_consumption_pct: f64,
}

/// Per-kWp capital cost tier for an array of `capacity_kwp`.
pub fn capex_per_kwp(capacity_kwp: f64, sizing: &PvSizingConfig) -> f64 {
    if capacity_kwp < sizing.small_limit_kwp {
        sizing.capex_small_per_kwp
    } else if capacity_kwp < sizing.medium_limit_kwp {
        sizing.capex_medium_per_kwp
    } else {
        sizing.capex_large_per_kwp
    }
}

/// Scans additional PV sizes in fixed steps and returns the shortest payback.
///
/// Returns `None` when the roof is too small, when existing production
/// already meets the coverage target, or when no size saves money. Sizes
/// run from one step up to the smaller of the coverage need and the roof
/// limit (at least one step) and never exceed what fits on the roof.
/// Self-consumption is evaluated hourly for the combined array.
#[instrument(level = "debug", skip_all, fields(roof_m2 = sizing.roof_area_m2))]
pub fn recommend_pv(
    load: &LoadSeries,
    existing: &PvConfig,
    sizing: &PvSizingConfig,
    econ: &EconomicParameters,
    tariff: &TariffInputs,
    annual_consumption_kwh: f64,
) -> Option<PvRecommendation> {
    if sizing.roof_area_m2 < sizing.min_roof_area_m2 || sizing.step_kwp <= 0.0 {
        debug!("roof too small for PV");
        return None;
    }

    let yield_per_kwp = econ.pv_yield_kwh_per_kwp;
    let existing_kwp = existing.capacity_kwp.max(0.0);
    let existing_production = existing
        .existing_production_kwh
        .unwrap_or(existing_kwp * yield_per_kwp);
    let needed_kwh = annual_consumption_kwh * sizing.coverage_target - existing_production;
    if needed_kwh <= 0.0 || yield_per_kwp <= 0.0 {
        debug!(needed_kwh, "existing PV already covers the target");
        return None;
    }

    let roof_limit_kwp = sizing.roof_area_m2 / sizing.m2_per_kwp;
    let scan_limit_kwp = (needed_kwh / yield_per_kwp)
        .min(roof_limit_kwp)
        .max(sizing.step_kwp);
    let upper = scan_limit_kwp.floor() + sizing.step_kwp;

    let full_price = tariff.energy_price + tariff.distribution_fee;
    let export_price = tariff.energy_price * econ.net_billing_multiplier;

    let mut options = Vec::new();
    let mut k = 1_u32;
    loop {
        let size = f64::from(k) * sizing.step_kwp;
        if size >= upper || size > roof_limit_kwp {
            break;
        }
        k += 1;

        let site = SolarSynthesizer::new(existing_kwp + size, yield_per_kwp).site_profile(load);
        let matched = SelfConsumption::compute(&site);
        let sc_share = matched.self_consumption_pct / 100.0;

        let production = size * yield_per_kwp;
        let savings = production * (sc_share * full_price + (1.0 - sc_share) * export_price);
        let capital = size * capex_per_kwp(size, sizing);
        trace!(size_kwp = size, savings, capital, "evaluated PV size");

        options.push(PvRecommendation {
            new_capacity_kwp: size,
            annual_production_kwh: production,
            capital_cost: capital,
            annual_savings: savings,
            payback_years: simple_payback(capital, savings),
            self_consumption_pct: matched.self_consumption_pct,
        });
    }

    let best = first_minimum(
        options
            .iter()
            .map(|o| payback_rank(o.capital_cost, o.annual_savings)),
    )?;
    Some(options.swap_remove(best))
}

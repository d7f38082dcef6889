//! Capacity search for the storage system with the shortest payback.

use serde::Serialize;
use tracing::{debug, instrument, trace, warn};

use super::first_minimum;
use crate::config::{EconomicParameters, ScenarioConfig, SearchConfig, StorageParams, TariffInputs};
use crate::economics::finance::{PAYBACK_SENTINEL_YEARS, capital_cost, payback_rank, simple_payback};
use crate::economics::translator::{SavingsBreakdown, translate};
use crate::profile::series::{AlignedProfile, LoadSeries};
use crate::profile::solar::SolarSynthesizer;
use crate::sim::engine::simulate;
use crate::sim::result::DispatchResult;
use crate::sim::types::{DispatchWindows, StorageConfig};

/// Most grid points a single search evaluates.
pub const MAX_CANDIDATES: usize = 10_000;

/// Parameter objects the search needs, borrowed from a scenario.
#[derive(Debug, Clone, Copy)]
pub struct SizingContext<'a> {
    pub storage: &'a StorageParams,
    pub windows: &'a DispatchWindows,
    pub search: &'a SearchConfig,
    pub economics: &'a EconomicParameters,
    pub tariff: &'a TariffInputs,
}

impl<'a> SizingContext<'a> {
    pub fn from_scenario(cfg: &'a ScenarioConfig) -> Self {
        Self {
            storage: &cfg.storage,
            windows: &cfg.dispatch,
            search: &cfg.search,
            economics: &cfg.economics,
            tariff: &cfg.tariff,
        }
    }
}

/// Best storage configuration found by the search.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    pub capacity_kwh: f64,
    pub power_kw: f64,
    pub capital_cost: f64,
    pub savings: SavingsBreakdown,
    pub total_annual_savings: f64,
    /// Simple payback, or [`PAYBACK_SENTINEL_YEARS`] when nothing saves money.
    pub payback_years: f64,
    pub cycle_count: f64,
    pub candidates_evaluated: usize,
}

impl Recommendation {
    /// False for the zero-savings fallback.
    pub fn is_viable(&self) -> bool {
        self.total_annual_savings > 0.0 && self.payback_years < PAYBACK_SENTINEL_YEARS
    }
}

/// One evaluated grid point.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CandidateSummary {
    pub capacity_kwh: f64,
    pub capital_cost: f64,
    pub savings: SavingsBreakdown,
    pub payback_years: f64,
    pub cycle_count: f64,
}

/// Outcome of a search: the recommendation, the winning dispatch run, and
/// every candidate in grid order.
#[derive(Debug, Clone)]
pub struct SizingRun {
    pub recommendation: Recommendation,
    pub dispatch: DispatchResult,
    pub candidates: Vec<CandidateSummary>,
}

/// Candidate capacities from `min` up to `max(floor, daily × share)`, inclusive.
///
/// Daily consumption is the annual total over 365 days. The upper bound is
/// truncated to whole kWh. An empty range yields just the minimum; a range
/// wider than [`MAX_CANDIDATES`] steps is cut off at that many points.
pub fn candidate_capacities(search: &SearchConfig, annual_consumption_kwh: f64) -> Vec<f64> {
    let daily = annual_consumption_kwh.max(0.0) / 365.0;
    let upper = search.max_capacity_floor_kwh.max(daily * search.max_daily_share).floor();

    let mut capacities = Vec::new();
    if search.capacity_step_kwh > 0.0 && search.capacity_step_kwh.is_finite() {
        for k in 0..MAX_CANDIDATES {
            let capacity = search.min_capacity_kwh + k as f64 * search.capacity_step_kwh;
            if capacity > upper {
                break;
            }
            capacities.push(capacity);
        }
        if capacities.len() == MAX_CANDIDATES {
            warn!(upper_kwh = upper, step_kwh = search.capacity_step_kwh, "candidate grid truncated");
        }
    }
    if capacities.is_empty() {
        capacities.push(search.min_capacity_kwh);
    }
    capacities
}

/// Synthesizes PV over the load's own hours, then runs [`search`].
///
/// A PV nameplate of zero (or less) means no generation. Annual consumption
/// comes from the tariff, or the load total when the tariff leaves it unset.
#[instrument(level = "debug", skip_all, fields(pv_kwp = pv_capacity_kwp, hours = load.len()))]
pub fn optimize(load: &LoadSeries, pv_capacity_kwp: f64, ctx: &SizingContext<'_>) -> Recommendation {
    let profile =
        SolarSynthesizer::new(pv_capacity_kwp, ctx.economics.pv_yield_kwh_per_kwp).site_profile(load);
    let annual = ctx.tariff.annual_consumption_kwh.unwrap_or_else(|| load.total());
    search(&profile, annual, ctx).recommendation
}

/// Evaluates every candidate on an aligned profile and keeps the shortest payback.
///
/// Ties keep the smaller capacity. When no candidate saves money the
/// smallest one is returned with zero savings and the sentinel payback.
#[instrument(level = "debug", skip_all, fields(hours = profile.len(), annual_kwh = annual_consumption_kwh))]
pub fn search(profile: &AlignedProfile, annual_consumption_kwh: f64, ctx: &SizingContext<'_>) -> SizingRun {
    let capacities = candidate_capacities(ctx.search, annual_consumption_kwh);
    let mut candidates = Vec::with_capacity(capacities.len());
    let mut ranks = Vec::with_capacity(capacities.len());
    // The first candidate's run doubles as the fallback dispatch.
    let mut first_dispatch: Option<DispatchResult> = None;

    for &capacity in &capacities {
        let storage = StorageConfig::from_capacity(capacity, ctx.storage);
        let dispatch = simulate(profile, &storage, ctx.windows);
        let savings = translate(&dispatch, ctx.economics, ctx.tariff, annual_consumption_kwh);
        let capital = capital_cost(capacity, ctx.economics);
        let total = savings.total();
        let payback_years = simple_payback(capital, total);
        trace!(capacity_kwh = capacity, savings = total, payback_years, "evaluated candidate");

        candidates.push(CandidateSummary {
            capacity_kwh: capacity,
            capital_cost: capital,
            savings,
            payback_years,
            cycle_count: dispatch.cycle_count,
        });
        ranks.push(payback_rank(capital, total));
        if first_dispatch.is_none() {
            first_dispatch = Some(dispatch);
        }
    }

    let evaluated = candidates.len();
    let (recommendation, dispatch) = match first_minimum(ranks) {
        Some(i) => {
            let c = &candidates[i];
            debug!(capacity_kwh = c.capacity_kwh, payback_years = c.payback_years, "selected candidate");
            let storage = StorageConfig::from_capacity(c.capacity_kwh, ctx.storage);
            let dispatch = match first_dispatch {
                Some(dispatch) if i == 0 => dispatch,
                _ => simulate(profile, &storage, ctx.windows),
            };
            let recommendation = Recommendation {
                capacity_kwh: c.capacity_kwh,
                power_kw: storage.power_kw,
                capital_cost: c.capital_cost,
                savings: c.savings,
                total_annual_savings: c.savings.total(),
                payback_years: c.payback_years,
                cycle_count: c.cycle_count,
                candidates_evaluated: evaluated,
            };
            (recommendation, dispatch)
        }
        None => {
            debug!("no candidate saves money, falling back to the smallest");
            let capacity = capacities.first().copied().unwrap_or(ctx.search.min_capacity_kwh);
            let storage = StorageConfig::from_capacity(capacity, ctx.storage);
            let dispatch = first_dispatch.unwrap_or_else(|| simulate(profile, &storage, ctx.windows));
            let recommendation = Recommendation {
                capacity_kwh: storage.capacity_kwh,
                power_kw: storage.power_kw,
                capital_cost: capital_cost(storage.capacity_kwh, ctx.economics),
                savings: SavingsBreakdown::default(),
                total_annual_savings: 0.0,
                payback_years: PAYBACK_SENTINEL_YEARS,
                cycle_count: dispatch.cycle_count,
                candidates_evaluated: evaluated,
            };
            (recommendation, dispatch)
        }
    };

    SizingRun {
        recommendation,
        dispatch,
        candidates,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_uses_floor_for_small_sites() {
        let caps = candidate_capacities(&SearchConfig::default(), 100_000.0);
        assert_eq!(caps.first(), Some(&50.0));
        assert_eq!(caps.last(), Some(&500.0));
        assert_eq!(caps.len(), 10);
    }

    #[test]
    fn grid_grows_with_daily_consumption() {
        // 1 825 000 kWh / 365 * 0.5 = 2 500 kWh
        let caps = candidate_capacities(&SearchConfig::default(), 1_825_000.0);
        assert_eq!(caps.last(), Some(&2500.0));
    }

    #[test]
    fn empty_range_yields_minimum() {
        let search = SearchConfig {
            min_capacity_kwh: 800.0,
            ..SearchConfig::default()
        };
        assert_eq!(candidate_capacities(&search, 0.0), vec![800.0]);
    }

    #[test]
    fn upper_bound_is_inclusive_after_truncation() {
        let search = SearchConfig {
            max_capacity_floor_kwh: 150.9,
            ..SearchConfig::default()
        };
        assert_eq!(candidate_capacities(&search, 0.0), vec![50.0, 100.0, 150.0]);
    }

    #[test]
    fn tiny_step_is_capped() {
        let search = SearchConfig {
            capacity_step_kwh: 1e-6,
            ..SearchConfig::default()
        };
        let caps = candidate_capacities(&search, 0.0);
        assert_eq!(caps.len(), MAX_CANDIDATES);
        assert_eq!(caps.first(), Some(&50.0));
    }

    #[test]
    fn non_finite_step_yields_minimum() {
        let search = SearchConfig {
            capacity_step_kwh: f64::NAN,
            ..SearchConfig::default()
        };
        assert_eq!(candidate_capacities(&search, 0.0), vec![50.0]);
    }
}

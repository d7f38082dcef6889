//! Conversion of dispatched energy into annual savings.

use std::fmt;

use serde::Serialize;

use super::tariff::{downgraded, multiplier};
use crate::config::{EconomicParameters, TariffInputs};
use crate::sim::result::DispatchResult;

/// Annual savings per value stream (currency/year).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct SavingsBreakdown {
    pub self_consumption: f64,
    pub arbitrage: f64,
    pub peak_shaving: f64,
}

impl SavingsBreakdown {
    pub fn total(&self) -> f64 {
        self.self_consumption + self.arbitrage + self.peak_shaving
    }
}

impl fmt::Display for SavingsBreakdown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "self-consumption {:.0} + arbitrage {:.0} + peak shaving {:.0} = {:.0}",
            self.self_consumption,
            self.arbitrage,
            self.peak_shaving,
            self.total()
        )
    }
}

/// Value of one stored PV kWh: retail price avoided minus export price forgone.
pub fn self_consumption_value_per_kwh(econ: &EconomicParameters, tariff: &TariffInputs) -> f64 {
    let retail = tariff.energy_price + tariff.distribution_fee;
    let export = tariff.energy_price * econ.net_billing_multiplier;
    retail - export
}

/// Capacity-fee reduction from dropping one demand-charge category.
///
/// The benefit is granted in full whenever any peak shaving happened; it does
/// not scale with the shaved energy. Never negative.
pub fn category_downgrade_benefit(
    econ: &EconomicParameters,
    tariff: &TariffInputs,
    annual_consumption_kwh: f64,
) -> f64 {
    let category = tariff.effective_category();
    let after = downgraded(&econ.category_downgrades, category);
    let peak_mwh = annual_consumption_kwh.max(0.0) * econ.peak_consumption_share / 1000.0;
    let fee = peak_mwh * tariff.capacity_fee_per_mwh;
    let current = fee * multiplier(&econ.category_multipliers, category);
    let reduced = fee * multiplier(&econ.category_multipliers, after);
    (current - reduced).max(0.0)
}

/// Values the three energy streams of a dispatch run independently.
pub fn translate(
    result: &DispatchResult,
    econ: &EconomicParameters,
    tariff: &TariffInputs,
    annual_consumption_kwh: f64,
) -> SavingsBreakdown {
    let peak_shaving = if result.peak_shaving_kwh > 0.0 {
        category_downgrade_benefit(econ, tariff, annual_consumption_kwh)
    } else {
        0.0
    };
    SavingsBreakdown {
        self_consumption: result.self_consumption_kwh
            * self_consumption_value_per_kwh(econ, tariff),
        arbitrage: result.arbitrage_discharge_kwh * econ.price_spread,
        peak_shaving,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::economics::tariff::DemandChargeCategory;

    fn result(sc: f64, arb: f64, peak: f64) -> DispatchResult {
        DispatchResult {
            self_consumption_kwh: sc,
            arbitrage_discharge_kwh: arb,
            peak_shaving_kwh: peak,
            ..DispatchResult::default()
        }
    }

    fn tariff(category: DemandChargeCategory) -> TariffInputs {
        TariffInputs {
            energy_price: 0.60,
            distribution_fee: 0.20,
            capacity_fee_per_mwh: 200.0,
            category: Some(category),
            annual_consumption_kwh: None,
        }
    }

    #[test]
    fn self_consumption_uses_retail_minus_export() {
        let econ = EconomicParameters::default();
        // (0.60 + 0.20) - 0.60 * 0.5 = 0.50
        let savings = translate(&result(1000.0, 0.0, 0.0), &econ, &tariff(DemandChargeCategory::K3), 0.0);
        assert!((savings.self_consumption - 500.0).abs() < 1e-9);
    }

    #[test]
    fn arbitrage_uses_spread() {
        let econ = EconomicParameters::default();
        let savings = translate(&result(0.0, 1000.0, 0.0), &econ, &tariff(DemandChargeCategory::K3), 0.0);
        assert!((savings.arbitrage - 300.0).abs() < 1e-9);
    }

    #[test]
    fn peak_benefit_is_all_or_nothing() {
        let econ = EconomicParameters::default();
        let t = tariff(DemandChargeCategory::K3);
        // 1 GWh * 0.65 = 650 MWh * 200 = 130 000; K3 0.70 -> K1 0.17
        let expected = 130_000.0 * (0.70 - 0.17);
        let tiny = translate(&result(0.0, 0.0, 0.001), &econ, &t, 1_000_000.0);
        let large = translate(&result(0.0, 0.0, 50_000.0), &econ, &t, 1_000_000.0);
        assert!((tiny.peak_shaving - expected).abs() < 1e-6);
        assert_eq!(tiny.peak_shaving, large.peak_shaving);

        let none = translate(&result(0.0, 0.0, 0.0), &econ, &t, 1_000_000.0);
        assert_eq!(none.peak_shaving, 0.0);
    }

    #[test]
    fn lowest_category_has_no_peak_benefit() {
        let econ = EconomicParameters::default();
        let savings = translate(&result(0.0, 0.0, 10.0), &econ, &tariff(DemandChargeCategory::K1), 1_000_000.0);
        assert_eq!(savings.peak_shaving, 0.0);
    }

    #[test]
    fn upgrade_mapping_is_floored_at_zero() {
        let mut econ = EconomicParameters::default();
        econ.category_downgrades
            .insert(DemandChargeCategory::K1, DemandChargeCategory::K4);
        let savings = translate(&result(0.0, 0.0, 10.0), &econ, &tariff(DemandChargeCategory::K1), 1_000_000.0);
        assert_eq!(savings.peak_shaving, 0.0);
    }

    #[test]
    fn zero_spread_leaves_other_streams_untouched() {
        let econ = EconomicParameters::default();
        let no_spread = EconomicParameters {
            price_spread: 0.0,
            ..EconomicParameters::default()
        };
        let t = tariff(DemandChargeCategory::K4);
        let r = result(800.0, 5_000.0, 12.0);
        let base = translate(&r, &econ, &t, 500_000.0);
        let zeroed = translate(&r, &no_spread, &t, 500_000.0);
        assert_eq!(zeroed.arbitrage, 0.0);
        assert_eq!(zeroed.self_consumption, base.self_consumption);
        assert_eq!(zeroed.peak_shaving, base.peak_shaving);
    }

    #[test]
    fn total_sums_streams() {
        let s = SavingsBreakdown {
            self_consumption: 1.0,
            arbitrage: 2.0,
            peak_shaving: 3.0,
        };
        assert_eq!(s.total(), 6.0);
    }
}

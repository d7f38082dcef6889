//! Hour-by-hour matching of PV generation against site load.

use serde::Serialize;

use crate::profile::series::{AlignedProfile, GenerationSeries, LoadSeries};

/// How one hour's generation splits between on-site use and surplus.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HourlyMatch {
    /// `min(load, generation)` (kWh).
    pub self_consumed_kwh: f64,
    /// `max(generation - load, 0)` (kWh); available for charging or export.
    pub surplus_kwh: f64,
}

/// Splits one hour. Negative inputs count as zero.
pub fn match_hour(load_kw: f64, generation_kwh: f64) -> HourlyMatch {
    let load = load_kw.max(0.0);
    let generation = generation_kwh.max(0.0);
    HourlyMatch {
        self_consumed_kwh: load.min(generation),
        surplus_kwh: (generation - load).max(0.0),
    }
}

/// Annual self-consumption totals.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct SelfConsumption {
    pub self_consumed_kwh: f64,
    pub surplus_kwh: f64,
    pub generation_kwh: f64,
    /// Self-consumed share of generation, in `[0, 100]`; 0 without generation.
    pub self_consumption_pct: f64,
}

impl SelfConsumption {
    pub fn compute(profile: &AlignedProfile) -> Self {
        let mut totals = Self::default();
        for (&load, &generation) in profile.load_kw.iter().zip(&profile.generation_kwh) {
            let hour = match_hour(load, generation);
            totals.self_consumed_kwh += hour.self_consumed_kwh;
            totals.surplus_kwh += hour.surplus_kwh;
            totals.generation_kwh += generation.max(0.0);
        }
        totals.self_consumption_pct = if totals.generation_kwh > 0.0 {
            (totals.self_consumed_kwh / totals.generation_kwh * 100.0).clamp(0.0, 100.0)
        } else {
            0.0
        };
        totals
    }

    /// Aligns the two series by timestamp, then matches them.
    pub fn from_series(load: &LoadSeries, generation: &GenerationSeries) -> Self {
        Self::compute(&AlignedProfile::align(load, generation))
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::profile::series::HourlySeries;

    #[test]
    fn hour_split() {
        assert_eq!(
            match_hour(10.0, 4.0),
            HourlyMatch { self_consumed_kwh: 4.0, surplus_kwh: 0.0 }
        );
        assert_eq!(
            match_hour(3.0, 7.0),
            HourlyMatch { self_consumed_kwh: 3.0, surplus_kwh: 4.0 }
        );
        assert_eq!(
            match_hour(-2.0, 5.0),
            HourlyMatch { self_consumed_kwh: 0.0, surplus_kwh: 5.0 }
        );
    }

    #[test]
    fn totals_and_percentage() {
        let start = NaiveDate::from_ymd_opt(2024, 6, 1)
            .and_then(|d| d.and_hms_opt(10, 0, 0))
            .unwrap();
        let load = HourlySeries::from_hourly_values(start, [5.0, 5.0, 5.0]);
        let pv = HourlySeries::from_hourly_values(start, [2.0, 8.0, 10.0]);
        let sc = SelfConsumption::from_series(&load, &pv);
        assert_eq!(sc.self_consumed_kwh, 12.0);
        assert_eq!(sc.surplus_kwh, 8.0);
        assert_eq!(sc.generation_kwh, 20.0);
        assert!((sc.self_consumption_pct - 60.0).abs() < 1e-12);
    }

    #[test]
    fn no_generation_gives_zero_percent() {
        let start = NaiveDate::from_ymd_opt(2024, 6, 1)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .unwrap();
        let load = HourlySeries::from_hourly_values(start, [5.0; 24]);
        let sc = SelfConsumption::from_series(&load, &HourlySeries::default());
        assert_eq!(sc.self_consumption_pct, 0.0);
        assert_eq!(sc.self_consumed_kwh, 0.0);
    }
}

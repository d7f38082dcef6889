use std::collections::BTreeMap;

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, Timelike};

use super::series::{AlignedProfile, GenerationSeries, HourlySeries, LoadSeries};

/// Raw profile sums at or below this are treated as "no daylight at all".
const MIN_RAW_SUM: f64 = 1e-9;

/// Synthetic hourly PV generation for a given nameplate capacity.
///
/// `SolarSynthesizer` builds a half-sine daily curve between sunrise and
/// sunset, scaled by a seasonal factor that peaks near the summer solstice.
/// Summer days are also longer: sunrise moves from 06:00 to 04:00 and sunset
/// from 18:00 to 20:00. The raw shape is rescaled by one global multiplier so
/// the series total equals `capacity_kwp * yield_kwh_per_kwp`.
///
/// A non-positive or non-finite capacity yields an all-zero series. The
/// optimizer treats that as "no PV contribution".
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolarSynthesizer {
    /// Installed PV nameplate (kWp).
    pub capacity_kwp: f64,

    /// Expected annual production per installed kWp (kWh/kWp).
    pub yield_kwh_per_kwp: f64,
}

impl SolarSynthesizer {
    pub fn new(capacity_kwp: f64, yield_kwh_per_kwp: f64) -> Self {
        let finite_or_zero = |v: f64| if v.is_finite() { v.max(0.0) } else { 0.0 };
        Self {
            capacity_kwp: finite_or_zero(capacity_kwp),
            yield_kwh_per_kwp: finite_or_zero(yield_kwh_per_kwp),
        }
    }

    /// Calibration target for the full series (kWh).
    pub fn annual_target_kwh(&self) -> f64 {
        self.capacity_kwp * self.yield_kwh_per_kwp
    }

    /// Generation for every hour of `year`, using hour-ending timestamps.
    ///
    /// The first sample is `year-01-01 01:00` and the last is midnight that
    /// closes 31 December. That gives 8,760 samples, or 8,784 in a leap year.
    pub fn for_year(&self, year: i32) -> GenerationSeries {
        self.for_hours(&year_hours(year))
    }

    /// Generation on an arbitrary hour axis, calibrated over that axis.
    pub fn for_hours(&self, hours: &[NaiveDateTime]) -> GenerationSeries {
        let raw: Vec<f64> = hours.iter().map(|ts| raw_output(*ts)).collect();

        let target = self.annual_target_kwh();
        let raw_sum: f64 = raw.iter().sum();
        let scale = if target > 0.0 && raw_sum > MIN_RAW_SUM {
            target / raw_sum
        } else {
            0.0
        };

        HourlySeries::new(hours.iter().zip(raw).map(|(&ts, r)| (ts, r * scale)))
    }

    /// Generation on every hour from the load's first to its last reading.
    ///
    /// Each hour is scaled by the calibration of the year it belongs to, so a
    /// load running from July to June gets the same per-hour output as the
    /// matching stretches of two full synthetic years. Hours are assigned to
    /// years on the hour-ending convention of [`year_hours`].
    pub fn for_load(&self, load: &LoadSeries) -> GenerationSeries {
        let (Some(first), Some(last)) = (load.first_timestamp(), load.last_timestamp()) else {
            return GenerationSeries::default();
        };
        let len = (last - first).num_hours() + 1;

        let target = self.annual_target_kwh();
        let mut scales: BTreeMap<i32, f64> = BTreeMap::new();
        let samples = (0..len).map(|i| {
            let ts = first + Duration::hours(i);
            let year = (ts - Duration::hours(1)).year();
            let scale = *scales.entry(year).or_insert_with(|| {
                let raw_sum: f64 = year_hours(year).iter().map(|h| raw_output(*h)).sum();
                if target > 0.0 && raw_sum > MIN_RAW_SUM {
                    target / raw_sum
                } else {
                    0.0
                }
            });
            (ts, raw_output(ts) * scale)
        });
        HourlySeries::new(samples)
    }

    /// Load and generation for one site, on the load's own hour span.
    pub fn site_profile(&self, load: &LoadSeries) -> AlignedProfile {
        AlignedProfile::align(load, &self.for_load(load))
    }
}

/// Uncalibrated output for one hour-ending timestamp.
fn raw_output(ts: NaiveDateTime) -> f64 {
    let season = seasonal_factor(ts.ordinal());
    season * daylight_shape(f64::from(ts.hour()), season)
}

/// Shorthand for [`SolarSynthesizer::for_year`].
pub fn synthesize_for_year(capacity_kwp: f64, year: i32, yield_kwh_per_kwp: f64) -> GenerationSeries {
    SolarSynthesizer::new(capacity_kwp, yield_kwh_per_kwp).for_year(year)
}

/// Shorthand for [`SolarSynthesizer::for_hours`].
pub fn synthesize_for_hours(
    capacity_kwp: f64,
    hours: &[NaiveDateTime],
    yield_kwh_per_kwp: f64,
) -> GenerationSeries {
    SolarSynthesizer::new(capacity_kwp, yield_kwh_per_kwp).for_hours(hours)
}

/// Seasonal intensity in `[0, 1]`, peaking around day 171 of the year.
pub fn seasonal_factor(day_of_year: u32) -> f64 {
    let angle = 2.0 * std::f64::consts::PI * (f64::from(day_of_year) - 80.0) / 365.0;
    0.5 + 0.5 * angle.sin()
}

/// Within-day half-sine between sunrise and sunset, zero outside the window.
///
/// The window widens with the seasonal factor: sunrise `6 - 2s`, sunset
/// `18 + 2s`.
pub fn daylight_shape(hour: f64, season: f64) -> f64 {
    let sunrise = 6.0 - 2.0 * season;
    let sunset = 18.0 + 2.0 * season;
    if hour < sunrise || hour > sunset {
        return 0.0;
    }
    let day_fraction = (hour - sunrise) / (sunset - sunrise + 1e-9);
    (std::f64::consts::PI * day_fraction).sin().max(0.0)
}

/// Hour-ending timestamps covering one calendar year.
///
/// Returns an empty vector for years chrono cannot represent.
pub fn year_hours(year: i32) -> Vec<NaiveDateTime> {
    let (Some(first_day), Some(next_year)) = (
        NaiveDate::from_ymd_opt(year, 1, 1),
        NaiveDate::from_ymd_opt(year + 1, 1, 1),
    ) else {
        return Vec::new();
    };
    let Some(start) = first_day.and_hms_opt(1, 0, 0) else {
        return Vec::new();
    };
    let count = (next_year - first_day).num_days() * 24;
    (0..count).map(|i| start + Duration::hours(i)).collect()
}

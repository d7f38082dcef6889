//! Hourly time series and their alignment onto a shared hour axis.

use std::collections::BTreeMap;

use chrono::{Duration, NaiveDateTime, Timelike};

/// One hourly reading: power in kW for load, energy in kWh for generation.
///
/// With hourly resolution the two are numerically identical.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HourlySample {
    pub timestamp: NaiveDateTime,
    pub value: f64,
}

/// An ordered series with at most one sample per clock hour.
///
/// Construction snaps every timestamp to the nearest whole hour, sorts the
/// samples, and keeps the first reading when two land on the same hour.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HourlySeries {
    samples: Vec<HourlySample>,
}

/// Measured site consumption, kW per hour.
pub type LoadSeries = HourlySeries;

/// Synthetic or measured PV output, kWh per hour.
pub type GenerationSeries = HourlySeries;

impl HourlySeries {
    /// Builds a series from `(timestamp, value)` pairs in any order.
    pub fn new(samples: impl IntoIterator<Item = (NaiveDateTime, f64)>) -> Self {
        let mut by_hour: BTreeMap<NaiveDateTime, f64> = BTreeMap::new();
        for (timestamp, value) in samples {
            by_hour.entry(snap_to_hour(timestamp)).or_insert(value);
        }
        Self {
            samples: by_hour
                .into_iter()
                .map(|(timestamp, value)| HourlySample { timestamp, value })
                .collect(),
        }
    }

    /// Builds a gap-free series starting at `start`, one value per hour.
    ///
    /// # Examples
    ///
    /// ```
    /// use chrono::NaiveDate;
    /// use bess_sizer::profile::series::HourlySeries;
    ///
    /// let start = NaiveDate::from_ymd_opt(2024, 1, 1)
    ///     .and_then(|d| d.and_hms_opt(1, 0, 0))
    ///     .unwrap_or_default();
    /// let series = HourlySeries::from_hourly_values(start, [1.0, 2.0, 3.0]);
    /// assert_eq!(series.len(), 3);
    /// assert_eq!(series.total(), 6.0);
    /// ```
    pub fn from_hourly_values(start: NaiveDateTime, values: impl IntoIterator<Item = f64>) -> Self {
        let start = snap_to_hour(start);
        let samples = values
            .into_iter()
            .enumerate()
            .map(|(i, value)| HourlySample {
                timestamp: start + Duration::hours(i as i64),
                value,
            })
            .collect();
        Self { samples }
    }

    pub fn samples(&self) -> &[HourlySample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn values(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.value).collect()
    }

    /// Sum of all values (kWh for an hourly series).
    pub fn total(&self) -> f64 {
        self.samples.iter().map(|s| s.value).sum()
    }

    pub fn first_timestamp(&self) -> Option<NaiveDateTime> {
        self.samples.first().map(|s| s.timestamp)
    }

    pub fn last_timestamp(&self) -> Option<NaiveDateTime> {
        self.samples.last().map(|s| s.timestamp)
    }
}

/// Load and generation laid out on one contiguous hourly axis.
///
/// The axis spans from the earliest to the latest hour present in either
/// series. An hour missing from one side counts as zero on that side, so gaps
/// in the load profile become zero-load hours. Negative and non-finite
/// readings are also treated as zero.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AlignedProfile {
    pub hours: Vec<NaiveDateTime>,
    pub load_kw: Vec<f64>,
    pub generation_kwh: Vec<f64>,
    /// True where the load series had a reading; false for zero-filled hours.
    pub load_measured: Vec<bool>,
}

impl AlignedProfile {
    pub fn align(load: &HourlySeries, generation: &HourlySeries) -> Self {
        let starts = [load.first_timestamp(), generation.first_timestamp()];
        let ends = [load.last_timestamp(), generation.last_timestamp()];
        let (Some(start), Some(end)) = (
            starts.into_iter().flatten().min(),
            ends.into_iter().flatten().max(),
        ) else {
            return Self::default();
        };

        let len = (end - start).num_hours() as usize + 1;
        let hours: Vec<NaiveDateTime> = (0..len)
            .map(|i| start + Duration::hours(i as i64))
            .collect();

        let place = |series: &HourlySeries| {
            let mut values = vec![0.0; len];
            for sample in series.samples() {
                let idx = (sample.timestamp - start).num_hours() as usize;
                values[idx] = sanitize(sample.value);
            }
            values
        };

        let mut load_measured = vec![false; len];
        for sample in load.samples() {
            load_measured[(sample.timestamp - start).num_hours() as usize] = true;
        }

        Self {
            load_kw: place(load),
            generation_kwh: place(generation),
            load_measured,
            hours,
        }
    }

    /// Aligns a load series with no PV contribution.
    pub fn load_only(load: &HourlySeries) -> Self {
        Self::align(load, &HourlySeries::default())
    }

    pub fn len(&self) -> usize {
        self.hours.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hours.is_empty()
    }

    /// Load values of the hours the load series actually covered.
    pub fn measured_load_kw(&self) -> Vec<f64> {
        self.load_kw
            .iter()
            .zip(&self.load_measured)
            .filter(|(_, measured)| **measured)
            .map(|(kw, _)| *kw)
            .collect()
    }

    /// Clock hour (0-23) of the `i`-th aligned sample.
    pub fn hour_of_day(&self, i: usize) -> u32 {
        self.hours[i].hour()
    }
}

/// Percentile with linear interpolation between closest ranks.
///
/// Returns 0 for an empty slice.
pub fn percentile(values: &[f64], pct: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let rank = pct.clamp(0.0, 100.0) / 100.0 * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    let weight = rank - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * weight
}

/// Non-finite and negative readings count as zero.
pub(crate) fn sanitize(value: f64) -> f64 {
    if value.is_finite() { value.max(0.0) } else { 0.0 }
}

/// Rounds a timestamp to the nearest whole hour.
fn snap_to_hour(ts: NaiveDateTime) -> NaiveDateTime {
    let past_hour = Duration::seconds(i64::from(ts.minute() * 60 + ts.second()))
        + Duration::nanoseconds(i64::from(ts.nanosecond()));
    let floor = ts - past_hour;
    if ts.minute() >= 30 {
        floor + Duration::hours(1)
    } else {
        floor
    }
}

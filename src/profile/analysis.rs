//! Summary statistics of a load profile and a demand-charge category estimate.

use std::fmt;

use chrono::{Datelike, NaiveDateTime, Timelike};
use serde::Serialize;

use super::series::{LoadSeries, percentile, sanitize};
use crate::economics::tariff::DemandChargeCategory;

/// Upper bounds (kWh of system-peak consumption) for K1, K2 and K3.
const CATEGORY_THRESHOLDS_KWH: [(f64, DemandChargeCategory); 3] = [
    (100_000.0, DemandChargeCategory::K1),
    (500_000.0, DemandChargeCategory::K2),
    (2_000_000.0, DemandChargeCategory::K3),
];

/// How many of the highest hours the profile summary lists.
pub const TOP_PEAK_COUNT: usize = 10;

/// Time-of-use zone of an hour under the tariff's zone definitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TariffZone {
    /// Weekdays 07:00-12:59 and 16:00-20:59.
    Peak,
    OffPeak,
    /// 22:00-05:59 on every day.
    Night,
}

impl TariffZone {
    pub fn of(ts: NaiveDateTime) -> Self {
        let h = ts.hour();
        if h >= 22 || h < 6 {
            return Self::Night;
        }
        let weekday = ts.weekday().num_days_from_monday() < 5;
        if weekday && ((7..13).contains(&h) || (16..21).contains(&h)) {
            Self::Peak
        } else {
            Self::OffPeak
        }
    }
}

/// Consumption per time-of-use zone, in kWh and as a share of the total.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct ZoneSplit {
    pub peak_kwh: f64,
    pub off_peak_kwh: f64,
    pub night_kwh: f64,
    pub peak_pct: f64,
    pub off_peak_pct: f64,
    pub night_pct: f64,
}

impl ZoneSplit {
    fn from_hours(hours: impl IntoIterator<Item = (NaiveDateTime, f64)>) -> Self {
        let mut split = Self::default();
        for (ts, kw) in hours {
            match TariffZone::of(ts) {
                TariffZone::Peak => split.peak_kwh += kw,
                TariffZone::OffPeak => split.off_peak_kwh += kw,
                TariffZone::Night => split.night_kwh += kw,
            }
        }
        let total = split.peak_kwh + split.off_peak_kwh + split.night_kwh;
        if total > 0.0 {
            split.peak_pct = split.peak_kwh / total * 100.0;
            split.off_peak_pct = split.off_peak_kwh / total * 100.0;
            split.night_pct = split.night_kwh / total * 100.0;
        }
        split
    }
}

/// One of the highest-load hours of the profile.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PeakHour {
    pub timestamp: NaiveDateTime,
    pub load_kw: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProfileStats {
    pub hours: usize,
    pub peak_kw: f64,
    pub min_kw: f64,
    pub mean_kw: f64,
    pub annual_kwh: f64,
    /// Mean over peak; 0 for an all-zero profile.
    pub load_factor: f64,
    pub p99_5_kw: f64,
    /// P99.5 rounded to the nearest 10 kW.
    pub contracted_power_kw: f64,
    /// Consumption inside the system-peak window (weekdays 17-19, Nov-Mar).
    pub system_peak_kwh: f64,
    pub estimated_category: DemandChargeCategory,
    pub zones: ZoneSplit,
    /// Highest hours, largest first; equal loads keep the earlier hour first.
    pub top_peaks: Vec<PeakHour>,
    /// Mean load per clock hour 0-23 (kW).
    pub daily_profile_kw: [f64; 24],
    /// Consumption per calendar month, January first (kWh).
    pub monthly_kwh: [f64; 12],
}

impl ProfileStats {
    /// Negative and non-finite readings count as zero.
    pub fn from_series(load: &LoadSeries) -> Self {
        let readings: Vec<(NaiveDateTime, f64)> = load
            .samples()
            .iter()
            .map(|s| (s.timestamp, sanitize(s.value)))
            .collect();
        let values: Vec<f64> = readings.iter().map(|(_, kw)| *kw).collect();
        let hours = values.len();
        let annual_kwh: f64 = values.iter().sum();
        let peak_kw = values.iter().copied().fold(0.0_f64, f64::max);
        let min_kw = if hours == 0 {
            0.0
        } else {
            values.iter().copied().fold(f64::INFINITY, f64::min)
        };
        let mean_kw = if hours == 0 { 0.0 } else { annual_kwh / hours as f64 };
        let load_factor = if peak_kw > 0.0 { mean_kw / peak_kw } else { 0.0 };
        let p99_5_kw = percentile(&values, 99.5);

        let system_peak_kwh: f64 = readings
            .iter()
            .filter(|(ts, _)| is_system_peak_hour(*ts))
            .map(|(_, kw)| kw)
            .sum();

        let mut ranked = readings.clone();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
        let top_peaks = ranked
            .into_iter()
            .take(TOP_PEAK_COUNT)
            .map(|(timestamp, load_kw)| PeakHour { timestamp, load_kw })
            .collect();

        let mut hour_sums = [0.0; 24];
        let mut hour_counts = [0_usize; 24];
        let mut monthly_kwh = [0.0; 12];
        for (ts, kw) in &readings {
            hour_sums[ts.hour() as usize] += kw;
            hour_counts[ts.hour() as usize] += 1;
            monthly_kwh[ts.month0() as usize] += kw;
        }
        let mut daily_profile_kw = [0.0; 24];
        for (mean, (sum, count)) in daily_profile_kw.iter_mut().zip(hour_sums.iter().zip(hour_counts)) {
            if count > 0 {
                *mean = sum / count as f64;
            }
        }

        Self {
            hours,
            peak_kw,
            min_kw,
            mean_kw,
            annual_kwh,
            load_factor,
            p99_5_kw,
            contracted_power_kw: (p99_5_kw / 10.0).round() * 10.0,
            system_peak_kwh,
            estimated_category: category_for_system_peak(system_peak_kwh),
            zones: ZoneSplit::from_hours(readings),
            top_peaks,
            daily_profile_kw,
            monthly_kwh,
        }
    }
}

/// Weekday hours 17:00-18:59 in the winter months November through March.
pub fn is_system_peak_hour(ts: NaiveDateTime) -> bool {
    let weekday = ts.weekday().num_days_from_monday() < 5;
    let evening = (17..19).contains(&ts.hour());
    let winter = matches!(ts.month(), 11 | 12 | 1 | 2 | 3);
    weekday && evening && winter
}

pub fn category_for_system_peak(system_peak_kwh: f64) -> DemandChargeCategory {
    CATEGORY_THRESHOLDS_KWH
        .iter()
        .find(|(limit, _)| system_peak_kwh <= *limit)
        .map_or(DemandChargeCategory::K4, |(_, category)| *category)
}

impl fmt::Display for ProfileStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Load Profile ---")?;
        writeln!(f, "Hours:                 {}", self.hours)?;
        writeln!(f, "Annual consumption:    {:.0} kWh", self.annual_kwh)?;
        writeln!(
            f,
            "Peak / mean / min:     {:.1} / {:.1} / {:.1} kW",
            self.peak_kw, self.mean_kw, self.min_kw
        )?;
        writeln!(f, "Load factor:           {:.2}", self.load_factor)?;
        writeln!(
            f,
            "Contracted power:      {:.0} kW (P99.5 = {:.1} kW)",
            self.contracted_power_kw, self.p99_5_kw
        )?;
        writeln!(
            f,
            "System-peak usage:     {:.0} kWh -> category {}",
            self.system_peak_kwh, self.estimated_category
        )?;
        let z = &self.zones;
        writeln!(
            f,
            "Zone split:            peak {:.0} kWh ({:.1}%), off-peak {:.0} kWh ({:.1}%), night {:.0} kWh ({:.1}%)",
            z.peak_kwh, z.peak_pct, z.off_peak_kwh, z.off_peak_pct, z.night_kwh, z.night_pct
        )?;
        let months: Vec<String> = self.monthly_kwh.iter().map(|kwh| format!("{kwh:.0}")).collect();
        writeln!(f, "Monthly kWh:           {}", months.join(" "))?;
        write!(f, "Top peaks:")?;
        for (rank, peak) in self.top_peaks.iter().enumerate() {
            write!(
                f,
                "\n  {:>2}. {}  {:.1} kW",
                rank + 1,
                peak.timestamp.format("%Y-%m-%d %H:%M"),
                peak.load_kw
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::profile::series::HourlySeries;

    fn ts(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d).and_then(|d| d.and_hms_opt(h, 0, 0)).unwrap()
    }

    #[test]
    fn basic_statistics() {
        let load = HourlySeries::from_hourly_values(ts(2024, 6, 3, 0), [10.0, 20.0, 30.0, 40.0]);
        let stats = ProfileStats::from_series(&load);
        assert_eq!(stats.hours, 4);
        assert_eq!(stats.peak_kw, 40.0);
        assert_eq!(stats.min_kw, 10.0);
        assert_eq!(stats.annual_kwh, 100.0);
        assert!((stats.load_factor - 0.625).abs() < 1e-12);
    }

    #[test]
    fn empty_profile_is_neutral() {
        let stats = ProfileStats::from_series(&HourlySeries::default());
        assert_eq!(stats.peak_kw, 0.0);
        assert_eq!(stats.load_factor, 0.0);
        assert_eq!(stats.estimated_category, DemandChargeCategory::K1);
    }

    #[test]
    fn system_peak_window() {
        // 2024-01-08 is a Monday, 2024-01-13 a Saturday.
        assert!(is_system_peak_hour(ts(2024, 1, 8, 17)));
        assert!(is_system_peak_hour(ts(2024, 1, 8, 18)));
        assert!(!is_system_peak_hour(ts(2024, 1, 8, 19)));
        assert!(!is_system_peak_hour(ts(2024, 1, 13, 17)));
        assert!(!is_system_peak_hour(ts(2024, 7, 8, 17)));
    }

    #[test]
    fn category_thresholds() {
        assert_eq!(category_for_system_peak(100_000.0), DemandChargeCategory::K1);
        assert_eq!(category_for_system_peak(100_001.0), DemandChargeCategory::K2);
        assert_eq!(category_for_system_peak(2_000_000.0), DemandChargeCategory::K3);
        assert_eq!(category_for_system_peak(2_000_001.0), DemandChargeCategory::K4);
    }

    #[test]
    fn invalid_readings_count_as_zero() {
        let load = HourlySeries::from_hourly_values(
            ts(2024, 1, 8, 17),
            [f64::NAN, -50.0, f64::INFINITY, 40.0],
        );
        let stats = ProfileStats::from_series(&load);
        assert_eq!(stats.annual_kwh, 40.0);
        assert_eq!(stats.peak_kw, 40.0);
        assert_eq!(stats.min_kw, 0.0);
        assert_eq!(stats.system_peak_kwh, 0.0);
        assert_eq!(stats.estimated_category, DemandChargeCategory::K1);
    }

    #[test]
    fn zones_follow_tariff_hours() {
        // Monday 2024-01-08 and Saturday 2024-01-13.
        assert_eq!(TariffZone::of(ts(2024, 1, 8, 7)), TariffZone::Peak);
        assert_eq!(TariffZone::of(ts(2024, 1, 8, 13)), TariffZone::OffPeak);
        assert_eq!(TariffZone::of(ts(2024, 1, 8, 20)), TariffZone::Peak);
        assert_eq!(TariffZone::of(ts(2024, 1, 8, 21)), TariffZone::OffPeak);
        assert_eq!(TariffZone::of(ts(2024, 1, 8, 22)), TariffZone::Night);
        assert_eq!(TariffZone::of(ts(2024, 1, 8, 5)), TariffZone::Night);
        assert_eq!(TariffZone::of(ts(2024, 1, 13, 10)), TariffZone::OffPeak);
        assert_eq!(TariffZone::of(ts(2024, 1, 13, 23)), TariffZone::Night);
    }

    #[test]
    fn zone_split_of_a_flat_weekday() {
        let load = HourlySeries::from_hourly_values(ts(2024, 1, 8, 0), vec![10.0; 24]);
        let zones = ProfileStats::from_series(&load).zones;
        // 8 night hours, 11 peak hours, 5 off-peak hours.
        assert_eq!(zones.night_kwh, 80.0);
        assert_eq!(zones.peak_kwh, 110.0);
        assert_eq!(zones.off_peak_kwh, 50.0);
        assert!((zones.peak_pct + zones.off_peak_pct + zones.night_pct - 100.0).abs() < 1e-9);
    }

    #[test]
    fn top_peaks_are_sorted_and_ties_keep_order() {
        let mut values = vec![1.0; 30];
        values[5] = 9.0;
        values[20] = 9.0;
        values[12] = 12.0;
        let load = HourlySeries::from_hourly_values(ts(2024, 6, 3, 0), values);
        let stats = ProfileStats::from_series(&load);

        assert_eq!(stats.top_peaks.len(), TOP_PEAK_COUNT);
        assert_eq!(stats.top_peaks[0].load_kw, 12.0);
        assert_eq!(stats.top_peaks[1].timestamp, ts(2024, 6, 3, 5));
        assert_eq!(stats.top_peaks[2].timestamp, ts(2024, 6, 3, 20));
        assert_eq!(stats.top_peaks[3].load_kw, 1.0);
    }

    #[test]
    fn daily_and_monthly_profiles() {
        // Two days: 10 kW at every hour except 20 kW at noon.
        let mut values = vec![10.0; 48];
        values[12] = 20.0;
        values[36] = 20.0;
        let load = HourlySeries::from_hourly_values(ts(2024, 1, 31, 0), values);
        let stats = ProfileStats::from_series(&load);
        assert_eq!(stats.daily_profile_kw[12], 20.0);
        assert_eq!(stats.daily_profile_kw[3], 10.0);
        assert_eq!(stats.monthly_kwh[0], 250.0);
        assert_eq!(stats.monthly_kwh[1], 250.0);
        assert_eq!(stats.monthly_kwh[2], 0.0);
    }

    #[test]
    fn summary_lists_zones_and_peaks() {
        let load = HourlySeries::from_hourly_values(ts(2024, 1, 8, 0), vec![10.0; 24]);
        let text = ProfileStats::from_series(&load).to_string();
        assert!(text.contains("Zone split:"));
        assert!(text.contains("Top peaks:"));
        assert!(text.contains(" 1. 2024-01-08 00:00  10.0 kW"));
    }

    #[test]
    fn contracted_power_rounds_to_ten_kw() {
        let load = HourlySeries::from_hourly_values(ts(2024, 6, 3, 0), vec![123.0; 10]);
        let stats = ProfileStats::from_series(&load);
        assert_eq!(stats.contracted_power_kw, 120.0);
    }
}

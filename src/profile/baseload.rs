use chrono::{Datelike, NaiveDateTime, Timelike, Weekday};
use rand::{Rng, SeedableRng, rngs::StdRng};

use super::series::{HourlySeries, LoadSeries};
use super::solar::year_hours;

/// A seeded generator of synthetic industrial load profiles.
///
/// `SyntheticLoad` models a plant's hourly demand as a sinusoidal daily
/// pattern around a baseline. Weekends are scaled down and Gaussian noise is
/// added. It stands in for a measured profile in demo runs and tests.
///
/// # Examples
///
/// ```
/// use bess_sizer::profile::baseload::SyntheticLoad;
///
/// let mut plant = SyntheticLoad::new(
///     120.0, // base_kw - average demand
///     60.0,  // amp_kw - day/night swing
///     -std::f64::consts::FRAC_PI_2, // phase_rad - minimum at midnight
///     5.0,   // noise_std
///     0.6,   // weekend_factor
///     42,    // seed
/// );
/// let year = plant.for_year(2024);
/// assert_eq!(year.len(), 8784);
/// ```
#[derive(Debug, Clone)]
pub struct SyntheticLoad {
    /// Baseline demand in kilowatts.
    pub base_kw: f64,

    /// Amplitude of the daily sinusoid in kilowatts.
    pub amp_kw: f64,

    /// Phase offset of the daily sinusoid in radians.
    pub phase_rad: f64,

    /// Standard deviation of the Gaussian noise in kilowatts.
    pub noise_std: f64,

    /// Multiplier applied on Saturdays and Sundays.
    pub weekend_factor: f64,

    rng: StdRng,
}

impl SyntheticLoad {
    pub fn new(
        base_kw: f64,
        amp_kw: f64,
        phase_rad: f64,
        noise_std: f64,
        weekend_factor: f64,
        seed: u64,
    ) -> Self {
        Self {
            base_kw,
            amp_kw,
            phase_rad,
            noise_std: noise_std.max(0.0),
            weekend_factor: weekend_factor.max(0.0),
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Demand for the hour starting at `ts`. Never negative.
    pub fn demand_kw(&mut self, ts: NaiveDateTime) -> f64 {
        let day_pos = f64::from(ts.hour()) / 24.0;
        let angle = 2.0 * std::f64::consts::PI * day_pos + self.phase_rad;
        let noise = gaussian_noise(&mut self.rng, self.noise_std);

        let mut kw = self.base_kw + self.amp_kw * angle.sin() + noise;
        if matches!(ts.weekday(), Weekday::Sat | Weekday::Sun) {
            kw *= self.weekend_factor;
        }
        kw.max(0.0)
    }

    pub fn generate(&mut self, hours: &[NaiveDateTime]) -> LoadSeries {
        let samples: Vec<(NaiveDateTime, f64)> =
            hours.iter().map(|&ts| (ts, self.demand_kw(ts))).collect();
        HourlySeries::new(samples)
    }

    /// A full calendar year on the same hour-ending axis as the PV synthesizer.
    pub fn for_year(&mut self, year: i32) -> LoadSeries {
        self.generate(&year_hours(year))
    }
}

/// Gaussian noise with mean 0 via the Box-Muller transform.
pub fn gaussian_noise(rng: &mut StdRng, std_dev: f64) -> f64 {
    if std_dev <= 0.0 {
        return 0.0;
    }

    let u1: f64 = rng.random::<f64>().clamp(1e-12, 1.0);
    let u2: f64 = rng.random::<f64>();
    let z0 = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
    z0 * std_dev
}

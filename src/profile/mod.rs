//! Hourly load and generation profiles.

/// Load-profile statistics and demand-charge category estimate.
pub mod analysis;
/// Seeded synthetic industrial load generator.
pub mod baseload;
pub mod series;
/// Synthetic PV generation profile.
pub mod solar;

pub use analysis::ProfileStats;
pub use baseload::SyntheticLoad;
pub use series::{AlignedProfile, GenerationSeries, HourlySample, HourlySeries, LoadSeries};
pub use solar::SolarSynthesizer;

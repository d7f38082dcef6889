//! Monetary valuation of dispatch results.

pub mod finance;
/// Demand-charge categories and lookup tables.
pub mod tariff;
pub mod translator;

pub use finance::{FinancialOutlook, PAYBACK_SENTINEL_YEARS, capital_cost, simple_payback};
pub use tariff::DemandChargeCategory;
pub use translator::{SavingsBreakdown, translate};

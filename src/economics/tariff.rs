//! Demand-charge (capacity fee) categories and their lookup tables.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Tiered capacity-fee classification. Peakier load profiles land in
/// higher tiers and pay a larger share of the capacity fee.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum DemandChargeCategory {
    K1,
    K2,
    K3,
    K4,
}

impl DemandChargeCategory {
    pub const ALL: [Self; 4] = [Self::K1, Self::K2, Self::K3, Self::K4];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::K1 => "K1",
            Self::K2 => "K2",
            Self::K3 => "K3",
            Self::K4 => "K4",
        }
    }
}

impl fmt::Display for DemandChargeCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DemandChargeCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "K1" => Ok(Self::K1),
            "K2" => Ok(Self::K2),
            "K3" => Ok(Self::K3),
            "K4" => Ok(Self::K4),
            other => Err(format!("unknown demand-charge category \"{other}\" (expected K1-K4)")),
        }
    }
}

impl TryFrom<String> for DemandChargeCategory {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<DemandChargeCategory> for String {
    fn from(category: DemandChargeCategory) -> Self {
        category.as_str().to_string()
    }
}

/// Multiplier applied to the capacity fee for each category.
pub type CategoryMultipliers = BTreeMap<DemandChargeCategory, f64>;

/// Category a site moves to once storage flattens its peaks.
pub type CategoryDowngrades = BTreeMap<DemandChargeCategory, DemandChargeCategory>;

pub fn default_multipliers() -> CategoryMultipliers {
    use DemandChargeCategory::{K1, K2, K3, K4};
    BTreeMap::from([(K1, 0.17), (K2, 0.40), (K3, 0.70), (K4, 1.00)])
}

pub fn default_downgrades() -> CategoryDowngrades {
    use DemandChargeCategory::{K1, K2, K3, K4};
    BTreeMap::from([(K4, K2), (K3, K1), (K2, K1), (K1, K1)])
}

/// Multiplier for `category`; categories missing from the table pay in full.
pub fn multiplier(table: &CategoryMultipliers, category: DemandChargeCategory) -> f64 {
    table.get(&category).copied().unwrap_or(1.0)
}

/// Category after peak shaving; no entry means no downgrade.
pub fn downgraded(mapping: &CategoryDowngrades, category: DemandChargeCategory) -> DemandChargeCategory {
    mapping.get(&category).copied().unwrap_or(category)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_case_insensitively() {
        assert_eq!("k3".parse::<DemandChargeCategory>(), Ok(DemandChargeCategory::K3));
        assert!("K9".parse::<DemandChargeCategory>().is_err());
    }

    #[test]
    fn default_downgrades_never_raise_the_multiplier() {
        let table = default_multipliers();
        let mapping = default_downgrades();
        for cat in DemandChargeCategory::ALL {
            let after = downgraded(&mapping, cat);
            assert!(multiplier(&table, after) <= multiplier(&table, cat));
        }
    }

    #[test]
    fn missing_entries_fall_back() {
        let empty_table = CategoryMultipliers::new();
        assert_eq!(multiplier(&empty_table, DemandChargeCategory::K2), 1.0);
        let empty_mapping = CategoryDowngrades::new();
        assert_eq!(downgraded(&empty_mapping, DemandChargeCategory::K4), DemandChargeCategory::K4);
    }

    #[test]
    fn category_tables_deserialize_from_toml_keys() {
        #[derive(Deserialize)]
        struct Tables {
            multipliers: CategoryMultipliers,
            downgrades: CategoryDowngrades,
        }
        let parsed: Tables = toml::from_str(
            r#"
[multipliers]
K1 = 0.2
K4 = 1.0

[downgrades]
K4 = "K1"
"#,
        )
        .expect("tables should parse");
        assert_eq!(parsed.multipliers.get(&DemandChargeCategory::K1), Some(&0.2));
        assert_eq!(parsed.downgrades.get(&DemandChargeCategory::K4), Some(&DemandChargeCategory::K1));
    }
}

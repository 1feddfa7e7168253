//! Unit kinds for product stock granularity.
//!
//! Whole-unit products are counted in integral pieces; weight-based
//! products carry fractional quantities (e.g. 0.350 kg of produce).

use serde::{Deserialize, Serialize};

/// Granularity of a product's stock and sale quantities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitKind {
    /// Discrete pieces (bottles, bags, boxes).
    Unit,
    /// Weighed goods, quantities to three decimal places.
    Weight,
}

impl UnitKind {
    /// Returns true if fractional quantities are meaningful for this kind.
    #[must_use]
    pub const fn allows_fractional(self) -> bool {
        matches!(self, Self::Weight)
    }
}

impl std::fmt::Display for UnitKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unit => write!(f, "unit"),
            Self::Weight => write!(f, "weight"),
        }
    }
}

impl std::str::FromStr for UnitKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "unit" => Ok(Self::Unit),
            "weight" => Ok(Self::Weight),
            _ => Err(format!("Unknown unit kind: {s}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_display_roundtrip() {
        assert_eq!(UnitKind::from_str("unit").unwrap(), UnitKind::Unit);
        assert_eq!(UnitKind::from_str("WEIGHT").unwrap(), UnitKind::Weight);
        assert_eq!(UnitKind::Unit.to_string(), "unit");
        assert_eq!(UnitKind::Weight.to_string(), "weight");
    }

    #[test]
    fn test_unknown_kind_rejected() {
        assert!(UnitKind::from_str("volume").is_err());
    }

    #[test]
    fn test_fractional_rules() {
        assert!(!UnitKind::Unit.allows_fractional());
        assert!(UnitKind::Weight.allows_fractional());
    }

    #[test]
    fn test_serde_lowercase() {
        assert_eq!(serde_json::to_string(&UnitKind::Weight).unwrap(), "\"weight\"");
    }
}

//! Plan features
//!
//! Named capabilities gated per tier, the administrator-editable matrix that
//! maps tiers to them, and its persistence.

pub mod matrix;
pub mod service;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub use matrix::FeatureMatrix;
pub use service::FeatureMatrixService;

/// Capability gated per plan tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureFlag {
    /// Activity library, every tier keeps it
    Activities,
    Videos,
    Bonus,
    VipSupport,
}

impl FeatureFlag {
    pub fn all() -> &'static [FeatureFlag] {
        &[
            FeatureFlag::Activities,
            FeatureFlag::Videos,
            FeatureFlag::Bonus,
            FeatureFlag::VipSupport,
        ]
    }

    pub fn key(self) -> &'static str {
        match self {
            FeatureFlag::Activities => "activities",
            FeatureFlag::Videos => "videos",
            FeatureFlag::Bonus => "bonus",
            FeatureFlag::VipSupport => "vip_support",
        }
    }

    /// Whether the flag may never be removed from a tier
    pub fn is_mandatory(self) -> bool {
        matches!(self, FeatureFlag::Activities)
    }
}

impl fmt::Display for FeatureFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for FeatureFlag {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "activities" => Ok(FeatureFlag::Activities),
            "videos" => Ok(FeatureFlag::Videos),
            "bonus" => Ok(FeatureFlag::Bonus),
            "vip_support" | "vip" => Ok(FeatureFlag::VipSupport),
            other => Err(format!("unknown feature: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feature_keys_round_trip() {
        for flag in FeatureFlag::all() {
            assert_eq!(flag.key().parse::<FeatureFlag>(), Ok(*flag));
        }
        assert_eq!("VIP-Support".parse::<FeatureFlag>(), Ok(FeatureFlag::VipSupport));
        assert!("downloads".parse::<FeatureFlag>().is_err());
    }

    #[test]
    fn test_only_activities_mandatory() {
        let mandatory: Vec<_> = FeatureFlag::all().iter().filter(|f| f.is_mandatory()).collect();
        assert_eq!(mandatory, vec![&FeatureFlag::Activities]);
    }
}

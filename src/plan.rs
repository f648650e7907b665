//! Subscription tiers and plan sets
//!
//! Tiers are totally ordered `Demo < Essential < Growth < Prime`. `Admin` is a
//! sentinel outside that order which grants universal access.

use serde::de::{Deserializer, SeqAccess, Visitor};
use serde::ser::{SerializeSeq, Serializer};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::warn;

use crate::types::UnrecognizedPlanKey;

/// Subscription tier
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanTier {
    /// Free preview tier
    #[default]
    Demo,
    Essential,
    Growth,
    Prime,
    /// Administrator sentinel, not part of the ordering
    Admin,
}

const ORDERED: [PlanTier; 4] = [
    PlanTier::Demo,
    PlanTier::Essential,
    PlanTier::Growth,
    PlanTier::Prime,
];

impl PlanTier {
    /// The four real tiers, lowest first
    pub fn ordered() -> &'static [PlanTier] {
        &ORDERED
    }

    /// Position in the tier order. `None` for `Admin`.
    pub fn rank(self) -> Option<u8> {
        match self {
            PlanTier::Demo => Some(0),
            PlanTier::Essential => Some(1),
            PlanTier::Growth => Some(2),
            PlanTier::Prime => Some(3),
            PlanTier::Admin => None,
        }
    }

    /// Canonical storage/session key
    pub fn key(self) -> &'static str {
        match self {
            PlanTier::Demo => "demo",
            PlanTier::Essential => "essential",
            PlanTier::Growth => "growth",
            PlanTier::Prime => "prime",
            PlanTier::Admin => "admin",
        }
    }

    /// Display name
    pub fn label(self) -> &'static str {
        match self {
            PlanTier::Demo => "Demo",
            PlanTier::Essential => "Essential",
            PlanTier::Growth => "Growth",
            PlanTier::Prime => "Prime",
            PlanTier::Admin => "Administrator",
        }
    }

    /// Whether `self` carries at least the entitlement of `threshold`.
    ///
    /// `Admin` satisfies every threshold; only `Admin` satisfies an `Admin`
    /// threshold.
    pub fn at_least(self, threshold: PlanTier) -> bool {
        match (self.rank(), threshold.rank()) {
            (None, _) => true,
            (Some(_), None) => false,
            (Some(have), Some(need)) => have >= need,
        }
    }

    /// Parse a key, recovering to `Demo` when it is not recognized.
    ///
    /// Used for plan keys read from storage or the session: the most
    /// restrictive tier is always a safe answer.
    pub fn from_key_or_demo(key: &str) -> PlanTier {
        key.parse().unwrap_or_else(|e: UnrecognizedPlanKey| {
            warn!(key = key, error = %e, "Falling back to demo tier");
            PlanTier::Demo
        })
    }

    /// Map a stored plan number (0..=3) to a tier, recovering to `Demo`.
    pub fn from_number(number: i64) -> PlanTier {
        match number {
            0 => PlanTier::Demo,
            1 => PlanTier::Essential,
            2 => PlanTier::Growth,
            3 => PlanTier::Prime,
            other => {
                warn!(plan_number = other, "Unknown plan number, falling back to demo tier");
                PlanTier::Demo
            }
        }
    }
}

impl fmt::Display for PlanTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for PlanTier {
    type Err = UnrecognizedPlanKey;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "demo" => Ok(PlanTier::Demo),
            "essential" => Ok(PlanTier::Essential),
            "growth" => Ok(PlanTier::Growth),
            "prime" => Ok(PlanTier::Prime),
            "admin" => Ok(PlanTier::Admin),
            _ => Err(UnrecognizedPlanKey(s.to_string())),
        }
    }
}

/// Stored keys go through [`PlanTier::from_key_or_demo`]: an unknown key
/// recovers to `Demo` instead of failing the whole record.
impl<'de> Deserialize<'de> for PlanTier {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let key = String::deserialize(deserializer)?;
        Ok(PlanTier::from_key_or_demo(&key))
    }
}

// =============================================================================
// PlanSet
// =============================================================================

/// Set of real tiers allowed to access an item.
///
/// Stored as a bitmask indexed by rank. `Admin` is never a member.
/// Serializes as a list of tier keys in tier order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PlanSet(u8);

impl PlanSet {
    pub const fn empty() -> Self {
        PlanSet(0)
    }

    /// Every real tier
    pub const fn all() -> Self {
        PlanSet(0b1111)
    }

    /// Contiguous suffix of the tier order starting at `threshold`
    pub fn at_least(threshold: PlanTier) -> Self {
        ORDERED
            .iter()
            .copied()
            .filter(|tier| tier.at_least(threshold))
            .collect()
    }

    /// Insert a tier. Returns false for `Admin`, which cannot be a member.
    pub fn insert(&mut self, tier: PlanTier) -> bool {
        match tier.rank() {
            Some(rank) => {
                self.0 |= 1 << rank;
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, tier: PlanTier) {
        if let Some(rank) = tier.rank() {
            self.0 &= !(1 << rank);
        }
    }

    pub fn contains(&self, tier: PlanTier) -> bool {
        tier.rank().is_some_and(|rank| self.0 & (1 << rank) != 0)
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    /// Members in tier order
    pub fn iter(&self) -> impl Iterator<Item = PlanTier> + '_ {
        ORDERED.iter().copied().filter(move |tier| self.contains(*tier))
    }

    /// Lowest member by tier order
    pub fn lowest(&self) -> Option<PlanTier> {
        self.iter().next()
    }

    /// Parse a list of keys, dropping anything unrecognized.
    ///
    /// An unknown key must never widen access, so it is discarded rather
    /// than mapped to `Demo`.
    pub fn from_keys<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = PlanSet::empty();
        for key in keys {
            let key = key.as_ref();
            match key.parse::<PlanTier>() {
                Ok(tier) if set.insert(tier) => {}
                Ok(_) => warn!(key = key, "Admin is not a plan set member, dropped"),
                Err(e) => warn!(error = %e, "Dropping unknown plan from plan set"),
            }
        }
        set
    }

    pub fn keys(&self) -> Vec<&'static str> {
        self.iter().map(PlanTier::key).collect()
    }
}

impl FromIterator<PlanTier> for PlanSet {
    fn from_iter<I: IntoIterator<Item = PlanTier>>(iter: I) -> Self {
        let mut set = PlanSet::empty();
        for tier in iter {
            set.insert(tier);
        }
        set
    }
}

impl Serialize for PlanSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.len()))?;
        for tier in self.iter() {
            seq.serialize_element(tier.key())?;
        }
        seq.end()
    }
}

impl<'de> Deserialize<'de> for PlanSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct PlanSetVisitor;

        impl<'de> Visitor<'de> for PlanSetVisitor {
            type Value = PlanSet;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a list of plan keys")
            }

            fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<PlanSet, A::Error> {
                let mut keys: Vec<String> = Vec::new();
                while let Some(key) = seq.next_element::<String>()? {
                    keys.push(key);
                }
                Ok(PlanSet::from_keys(keys))
            }
        }

        deserializer.deserialize_seq(PlanSetVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_ordering() {
        assert!(PlanTier::Prime.at_least(PlanTier::Growth));
        assert!(PlanTier::Growth.at_least(PlanTier::Growth));
        assert!(!PlanTier::Essential.at_least(PlanTier::Growth));
        assert!(PlanTier::Demo.at_least(PlanTier::Demo));
    }

    #[test]
    fn test_admin_outside_order() {
        assert_eq!(PlanTier::Admin.rank(), None);
        assert!(PlanTier::Admin.at_least(PlanTier::Prime));
        assert!(!PlanTier::Prime.at_least(PlanTier::Admin));
        assert!(!PlanTier::ordered().contains(&PlanTier::Admin));
    }

    #[test]
    fn test_key_round_trip() {
        for tier in PlanTier::ordered() {
            assert_eq!(tier.key().parse::<PlanTier>(), Ok(*tier));
        }
        assert_eq!("  PRIME ".parse::<PlanTier>(), Ok(PlanTier::Prime));
    }

    #[test]
    fn test_unknown_key_falls_back_to_demo() {
        assert!("platinum".parse::<PlanTier>().is_err());
        assert_eq!(PlanTier::from_key_or_demo("platinum"), PlanTier::Demo);
        assert_eq!(PlanTier::from_key_or_demo(""), PlanTier::Demo);
        assert_eq!(PlanTier::from_key_or_demo("growth"), PlanTier::Growth);
    }

    #[test]
    fn test_deserialize_recovers_unknown_key() {
        let tier: PlanTier = serde_json::from_str(r#""platinum""#).unwrap();
        assert_eq!(tier, PlanTier::Demo);
        let tier: PlanTier = serde_json::from_str(r#""Prime""#).unwrap();
        assert_eq!(tier, PlanTier::Prime);
        assert_eq!(serde_json::to_string(&PlanTier::Growth).unwrap(), r#""growth""#);
    }

    #[test]
    fn test_from_number() {
        assert_eq!(PlanTier::from_number(1), PlanTier::Essential);
        assert_eq!(PlanTier::from_number(3), PlanTier::Prime);
        assert_eq!(PlanTier::from_number(7), PlanTier::Demo);
        assert_eq!(PlanTier::from_number(-1), PlanTier::Demo);
    }

    #[test]
    fn test_plan_set_at_least() {
        let set = PlanSet::at_least(PlanTier::Growth);
        assert_eq!(set.keys(), vec!["growth", "prime"]);
        assert_eq!(set.lowest(), Some(PlanTier::Growth));
        assert_eq!(PlanSet::at_least(PlanTier::Demo), PlanSet::all());
    }

    #[test]
    fn test_plan_set_rejects_admin() {
        let mut set = PlanSet::empty();
        assert!(!set.insert(PlanTier::Admin));
        assert!(set.is_empty());
        assert!(!set.contains(PlanTier::Admin));
    }

    #[test]
    fn test_plan_set_drops_unknown_keys() {
        let set: PlanSet = serde_json::from_str(r#"["prime", "platinum", "essential"]"#).unwrap();
        assert_eq!(set.keys(), vec!["essential", "prime"]);
        assert!(!set.contains(PlanTier::Demo));

        let json = serde_json::to_string(&set).unwrap();
        assert_eq!(json, r#"["essential","prime"]"#);
    }
}

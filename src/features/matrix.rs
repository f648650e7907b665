//! Feature-permission matrix
//!
//! Maps each real tier to its feature set. Edits go through the pure
//! [`FeatureMatrix::set_feature_for_plan`] transition; the caller persists
//! the returned matrix.
//!
//! ## Hierarchy
//!
//! Removing a feature from a tier also removes it from every lower tier, so a
//! feature missing at `Prime` is missing everywhere below. Additions do not
//! cascade: granting a feature to a low tier alone is allowed.

use serde::Serialize;
use std::collections::BTreeSet;
use tracing::{debug, warn};

use crate::features::FeatureFlag;
use crate::plan::PlanTier;
use crate::store::MatrixRow;
use crate::types::MandatoryFeatureError;

/// Tier to feature-set mapping, indexed by tier rank
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeatureMatrix {
    entries: [BTreeSet<FeatureFlag>; 4],
}

impl Default for FeatureMatrix {
    fn default() -> Self {
        Self::defaults()
    }
}

impl FeatureMatrix {
    /// Code-defined matrix used until an administrator customizes it
    pub fn defaults() -> Self {
        use FeatureFlag::*;
        Self {
            entries: [
                BTreeSet::from([Activities]),
                BTreeSet::from([Activities]),
                BTreeSet::from([Activities, Videos, Bonus]),
                BTreeSet::from([Activities, Videos, Bonus, VipSupport]),
            ],
        }
    }

    /// Discard any customization
    pub fn reset_to_defaults() -> Self {
        Self::defaults()
    }

    /// Build from explicit per-tier sets; `Activities` is always added
    pub fn from_entries(entries: [BTreeSet<FeatureFlag>; 4]) -> Self {
        let mut matrix = Self { entries };
        for set in matrix.entries.iter_mut() {
            set.insert(FeatureFlag::Activities);
        }
        matrix
    }

    /// Features of a real tier. `None` for `Admin`, which has every feature.
    pub fn features(&self, tier: PlanTier) -> Option<&BTreeSet<FeatureFlag>> {
        tier.rank().map(|rank| &self.entries[rank as usize])
    }

    pub fn has(&self, tier: PlanTier, feature: FeatureFlag) -> bool {
        match self.features(tier) {
            Some(set) => set.contains(&feature),
            None => true,
        }
    }

    /// Include or exclude `feature` for `tier`, returning the new matrix.
    ///
    /// Removal cascades to every lower tier. Removing a mandatory feature is
    /// rejected and `self` stays as it was. `Admin` is not in the matrix, so
    /// edits to it return an unchanged copy.
    pub fn set_feature_for_plan(
        &self,
        tier: PlanTier,
        feature: FeatureFlag,
        included: bool,
    ) -> Result<FeatureMatrix, MandatoryFeatureError> {
        if !included && feature.is_mandatory() {
            warn!(tier = %tier, feature = %feature, "Refusing to remove mandatory feature");
            return Err(MandatoryFeatureError { tier, feature });
        }

        let mut next = self.clone();
        let Some(rank) = tier.rank() else {
            debug!(feature = %feature, "Admin has every feature, matrix unchanged");
            return Ok(next);
        };
        let rank = rank as usize;

        if included {
            next.entries[rank].insert(feature);
        } else {
            for set in next.entries[..=rank].iter_mut() {
                set.remove(&feature);
            }
        }

        debug!(tier = %tier, feature = %feature, included = included, "Feature matrix updated");
        Ok(next)
    }

    /// Whether every feature missing at a tier is also missing below it
    pub fn satisfies_hierarchy(&self) -> bool {
        self.entries.windows(2).all(|pair| pair[0].is_subset(&pair[1]))
    }

    /// Rows for persistence, lowest tier first
    pub fn to_rows(&self) -> Vec<MatrixRow> {
        PlanTier::ordered()
            .iter()
            .zip(self.entries.iter())
            .map(|(tier, set)| MatrixRow {
                tier: tier.key().to_string(),
                features: set.iter().map(|f| f.key().to_string()).collect(),
            })
            .collect()
    }

    /// Rebuild from persisted rows.
    ///
    /// Tiers without a row keep their defaults. Unknown tier or feature names
    /// are skipped, since guessing could grant a feature nobody chose.
    pub fn from_rows(rows: &[MatrixRow]) -> Self {
        let mut entries = Self::defaults().entries;

        for row in rows {
            let rank = match row.tier.parse::<PlanTier>().ok().and_then(PlanTier::rank) {
                Some(rank) => rank as usize,
                None => {
                    warn!(tier = %row.tier, "Skipping feature matrix row for unknown tier");
                    continue;
                }
            };

            let mut set = BTreeSet::new();
            for name in &row.features {
                match name.parse::<FeatureFlag>() {
                    Ok(flag) => {
                        set.insert(flag);
                    }
                    Err(e) => warn!(tier = %row.tier, error = %e, "Skipping unknown feature"),
                }
            }
            entries[rank] = set;
        }

        Self::from_entries(entries)
    }
}

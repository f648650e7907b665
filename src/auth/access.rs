//! Access evaluation for content items and features
//!
//! Item gating is set membership, not an ordering test: an item lists the
//! exact tiers allowed to open it. Threshold gating is the special case of a
//! contiguous suffix (see [`crate::plan::PlanSet::at_least`]). Denial is a
//! normal `false`, which the host turns into an upsell prompt.

use crate::auth::identity::Identity;
use crate::auth::simulation::EffectivePlan;
use crate::catalog::ContentItem;
use crate::features::{FeatureFlag, FeatureMatrix};
use crate::plan::PlanTier;

/// Whether `effective` may open `item`.
///
/// Admins bypass all gating, including items they are only previewing. An
/// empty plan set denies everyone else.
pub fn can_access(item: &ContentItem, effective: &EffectivePlan, is_admin: bool) -> bool {
    if is_admin || effective.bypasses_gating() {
        return true;
    }
    item.available_plans.contains(effective.tier)
}

/// The `is_admin` flag to evaluate with for this session.
///
/// An administrator previewing a simulated tier must see the gated view, so
/// the bypass is off while simulating.
pub fn admin_bypass(identity: &Identity, effective: &EffectivePlan) -> bool {
    identity.is_admin && !effective.is_simulating
}

/// Cheapest tier that would unlock a denied item, for upsell messaging
pub fn upgrade_hint(item: &ContentItem, effective: &EffectivePlan, is_admin: bool) -> Option<PlanTier> {
    if can_access(item, effective, is_admin) {
        return None;
    }
    item.available_plans.lowest()
}

/// Lowest tier whose matrix entry holds `feature`, or `Prime` when none does.
///
/// An `Admin` current tier already has every feature and gets `Admin` back.
pub fn required_tier_for(feature: FeatureFlag, current: PlanTier, matrix: &FeatureMatrix) -> PlanTier {
    if current == PlanTier::Admin {
        return PlanTier::Admin;
    }
    PlanTier::ordered()
        .iter()
        .copied()
        .find(|tier| matrix.has(*tier, feature))
        .unwrap_or(PlanTier::Prime)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{ContentKind, Origin};
    use crate::plan::PlanSet;

    fn item(plans: PlanSet) -> ContentItem {
        ContentItem {
            id: "promo".into(),
            kind: ContentKind::Bonus,
            title: "Promo".into(),
            description: String::new(),
            media_ref: None,
            access_url: "https://example.test/promo".into(),
            category: "promo".into(),
            age_range: None,
            available_plans: plans,
            origin: Origin::Dynamic,
            active: true,
            order: None,
            created_at: None,
        }
    }

    #[test]
    fn test_set_membership_not_ordering() {
        let only_growth = item([PlanTier::Growth].into_iter().collect());
        assert!(can_access(&only_growth, &EffectivePlan::real(PlanTier::Growth), false));
        assert!(!can_access(&only_growth, &EffectivePlan::real(PlanTier::Prime), false));
        assert!(!can_access(&only_growth, &EffectivePlan::real(PlanTier::Essential), false));
    }

    #[test]
    fn test_empty_plans_fail_closed() {
        let nobody = item(PlanSet::empty());
        for tier in PlanTier::ordered() {
            assert!(!can_access(&nobody, &EffectivePlan::real(*tier), false));
        }
    }

    #[test]
    fn test_admin_bypass() {
        let nobody = item(PlanSet::empty());
        for tier in PlanTier::ordered() {
            assert!(can_access(&nobody, &EffectivePlan::real(*tier), true));
        }
        assert!(can_access(&nobody, &EffectivePlan::real(PlanTier::Admin), false));
    }

    #[test]
    fn test_simulating_admin_sees_gated_view() {
        let prime_only = item(PlanSet::at_least(PlanTier::Prime));
        let simulated = EffectivePlan {
            tier: PlanTier::Essential,
            is_simulating: true,
        };
        assert!(!can_access(&prime_only, &simulated, false));
    }

    #[test]
    fn test_admin_bypass_off_while_simulating() {
        let admin = Identity::admin("root");
        assert!(admin_bypass(&admin, &EffectivePlan::real(PlanTier::Admin)));
        let simulated = EffectivePlan {
            tier: PlanTier::Growth,
            is_simulating: true,
        };
        assert!(!admin_bypass(&admin, &simulated));
        let member = Identity::member("u1", PlanTier::Prime);
        assert!(!admin_bypass(&member, &EffectivePlan::real(PlanTier::Prime)));
    }

    #[test]
    fn test_upgrade_hint() {
        let growth_up = item(PlanSet::at_least(PlanTier::Growth));
        assert_eq!(
            upgrade_hint(&growth_up, &EffectivePlan::real(PlanTier::Demo), false),
            Some(PlanTier::Growth)
        );
        assert_eq!(upgrade_hint(&growth_up, &EffectivePlan::real(PlanTier::Prime), false), None);
        assert_eq!(upgrade_hint(&item(PlanSet::empty()), &EffectivePlan::real(PlanTier::Demo), false), None);
    }

    #[test]
    fn test_required_tier_for() {
        let matrix = FeatureMatrix::defaults();
        assert_eq!(required_tier_for(FeatureFlag::Activities, PlanTier::Demo, &matrix), PlanTier::Demo);
        assert_eq!(required_tier_for(FeatureFlag::Videos, PlanTier::Demo, &matrix), PlanTier::Growth);
        assert_eq!(required_tier_for(FeatureFlag::VipSupport, PlanTier::Essential, &matrix), PlanTier::Prime);
        assert_eq!(required_tier_for(FeatureFlag::Videos, PlanTier::Admin, &matrix), PlanTier::Admin);
    }

    #[test]
    fn test_required_tier_defaults_to_prime() {
        let matrix = FeatureMatrix::defaults()
            .set_feature_for_plan(PlanTier::Prime, FeatureFlag::Bonus, false)
            .unwrap();
        assert_eq!(required_tier_for(FeatureFlag::Bonus, PlanTier::Demo, &matrix), PlanTier::Prime);
    }
}

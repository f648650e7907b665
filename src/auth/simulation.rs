//! Effective plan and admin plan simulation
//!
//! Administrators can preview the dashboard as any tier. The preference lives
//! in session-scoped storage behind [`SessionStore`]; nothing here is global.
//!
//! ```text
//! NotSimulating --(admin sets tier)--> Simulating(tier)
//! Simulating(tier) --(admin sets tier == real plan)--> NotSimulating
//! any --(logout / identity change)--> NotSimulating
//! ```

use dashmap::DashMap;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info};

use crate::auth::identity::{member_plan, Identity};
use crate::plan::PlanTier;

/// Tier used for authorization in the current session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EffectivePlan {
    pub tier: PlanTier,
    pub is_simulating: bool,
}

impl EffectivePlan {
    /// The identity's own plan, no simulation
    pub fn real(tier: PlanTier) -> Self {
        Self {
            tier,
            is_simulating: false,
        }
    }

    /// Whether the tier itself lifts all gating (the `Admin` sentinel)
    pub fn bypasses_gating(&self) -> bool {
        self.tier == PlanTier::Admin
    }
}

/// Session-scoped storage for the simulated tier key
pub trait SessionStore: Send + Sync {
    fn simulated_tier(&self, identity_id: &str) -> Option<String>;
    fn set_simulated_tier(&self, identity_id: &str, key: &str);
    fn clear_simulated_tier(&self, identity_id: &str);
}

/// In-process session storage
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    entries: DashMap<String, String>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    fn simulated_tier(&self, identity_id: &str) -> Option<String> {
        self.entries.get(identity_id).map(|v| v.value().clone())
    }

    fn set_simulated_tier(&self, identity_id: &str, key: &str) {
        self.entries.insert(identity_id.to_string(), key.to_string());
    }

    fn clear_simulated_tier(&self, identity_id: &str) {
        self.entries.remove(identity_id);
    }
}

/// Computes effective plans and manages admin simulation
pub struct PlanSimulator<S: SessionStore> {
    sessions: Arc<S>,
}

impl<S: SessionStore> PlanSimulator<S> {
    pub fn new(sessions: Arc<S>) -> Self {
        Self { sessions }
    }

    pub fn effective_plan(&self, identity: &Identity) -> EffectivePlan {
        if !identity.is_admin {
            return EffectivePlan::real(member_plan(&identity.id, identity.real_plan));
        }

        match self.sessions.simulated_tier(&identity.id) {
            Some(key) => {
                let simulated = PlanTier::from_key_or_demo(&key);
                if simulated == identity.real_plan {
                    EffectivePlan::real(identity.real_plan)
                } else {
                    EffectivePlan {
                        tier: simulated,
                        is_simulating: true,
                    }
                }
            }
            None => EffectivePlan::real(identity.real_plan),
        }
    }

    /// Preview as `tier`. Ignored for non-admins; choosing the real plan
    /// ends the simulation.
    pub fn set_simulated_tier(&self, identity: &Identity, tier: PlanTier) -> EffectivePlan {
        if !identity.is_admin {
            debug!(identity = %identity.id, "Ignoring plan simulation for non-admin");
            return self.effective_plan(identity);
        }

        if tier == identity.real_plan {
            self.sessions.clear_simulated_tier(&identity.id);
            info!(identity = %identity.id, "Plan simulation ended");
        } else {
            self.sessions.set_simulated_tier(&identity.id, tier.key());
            info!(identity = %identity.id, tier = %tier, "Plan simulation started");
        }
        self.effective_plan(identity)
    }

    /// Drop any simulation for this identity (logout)
    pub fn clear(&self, identity: &Identity) {
        self.sessions.clear_simulated_tier(&identity.id);
    }

    /// Simulation never survives a change of identity
    pub fn on_identity_change(&self, previous: Option<&Identity>, next: Option<&Identity>) {
        if let Some(prev) = previous {
            if next.map(|n| n.id.as_str()) != Some(prev.id.as_str()) {
                self.clear(prev);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn simulator() -> PlanSimulator<MemorySessionStore> {
        PlanSimulator::new(Arc::new(MemorySessionStore::new()))
    }

    #[test]
    fn test_member_uses_real_plan() {
        let sim = simulator();
        let member = Identity::member("u1", PlanTier::Growth);
        assert_eq!(sim.effective_plan(&member), EffectivePlan::real(PlanTier::Growth));
    }

    #[test]
    fn test_member_cannot_simulate() {
        let sim = simulator();
        let member = Identity::member("u1", PlanTier::Essential);
        let plan = sim.set_simulated_tier(&member, PlanTier::Prime);
        assert_eq!(plan, EffectivePlan::real(PlanTier::Essential));
        assert_eq!(sim.effective_plan(&member), EffectivePlan::real(PlanTier::Essential));
    }

    #[test]
    fn test_member_with_admin_plan_is_gated() {
        let sim = simulator();
        // Built directly, as a host deserializing its own record would
        let member = Identity {
            id: "u1".into(),
            is_admin: false,
            real_plan: PlanTier::Admin,
        };
        let plan = sim.effective_plan(&member);
        assert_eq!(plan, EffectivePlan::real(PlanTier::Demo));
        assert!(!plan.bypasses_gating());
    }

    #[test]
    fn test_member_ignores_stale_session_value() {
        let sessions = Arc::new(MemorySessionStore::new());
        sessions.set_simulated_tier("u1", "prime");
        let sim = PlanSimulator::new(sessions);
        let member = Identity::member("u1", PlanTier::Demo);
        assert_eq!(sim.effective_plan(&member).tier, PlanTier::Demo);
    }

    #[test]
    fn test_admin_simulation_lifecycle() {
        let sim = simulator();
        let admin = Identity::admin("root");
        assert!(sim.effective_plan(&admin).bypasses_gating());

        let plan = sim.set_simulated_tier(&admin, PlanTier::Essential);
        assert_eq!(plan.tier, PlanTier::Essential);
        assert!(plan.is_simulating);
        assert!(!plan.bypasses_gating());

        let plan = sim.set_simulated_tier(&admin, PlanTier::Admin);
        assert_eq!(plan, EffectivePlan::real(PlanTier::Admin));
    }

    #[test]
    fn test_unknown_session_key_simulates_demo() {
        let sessions = Arc::new(MemorySessionStore::new());
        sessions.set_simulated_tier("root", "gold");
        let sim = PlanSimulator::new(sessions);
        let plan = sim.effective_plan(&Identity::admin("root"));
        assert_eq!(plan.tier, PlanTier::Demo);
        assert!(plan.is_simulating);
    }

    #[test]
    fn test_identity_change_clears_simulation() {
        let sim = simulator();
        let admin = Identity::admin("root");
        sim.set_simulated_tier(&admin, PlanTier::Growth);

        sim.on_identity_change(Some(&admin), Some(&admin));
        assert!(sim.effective_plan(&admin).is_simulating);

        sim.on_identity_change(Some(&admin), None);
        assert!(!sim.effective_plan(&admin).is_simulating);
    }
}

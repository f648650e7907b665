//! Authenticated identity handed in by the host application
//!
//! Login, signup and token handling happen elsewhere; this crate only sees
//! the resolved result.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::plan::PlanTier;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub id: String,
    pub is_admin: bool,
    pub real_plan: PlanTier,
}

impl Identity {
    /// Subscriber on a paid or demo tier.
    ///
    /// The `Admin` sentinel is reserved for administrators; a member given it
    /// is demoted to `Demo`.
    pub fn member(id: impl Into<String>, plan: PlanTier) -> Self {
        let id = id.into();
        Self {
            real_plan: member_plan(&id, plan),
            id,
            is_admin: false,
        }
    }

    /// Administrator, whose real plan is the `Admin` sentinel
    pub fn admin(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            is_admin: true,
            real_plan: PlanTier::Admin,
        }
    }

    /// Subscriber whose plan is stored as a number
    pub fn from_plan_number(id: impl Into<String>, plan_number: i64) -> Self {
        Self::member(id, PlanTier::from_number(plan_number))
    }
}

/// Plan a non-admin identity may actually hold
pub(crate) fn member_plan(id: &str, plan: PlanTier) -> PlanTier {
    if plan == PlanTier::Admin {
        warn!(identity = id, "Non-admin identity carries the admin plan, using demo");
        PlanTier::Demo
    } else {
        plan
    }
}

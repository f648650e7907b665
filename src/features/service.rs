//! Feature matrix persistence
//!
//! Loads the administrator's customization from the catalog store (defaults
//! when none is stored), applies edits through the pure matrix transition and
//! writes the result back. Concurrent edits by two admins are last-write-wins.

use std::sync::Arc;
use tracing::info;

use crate::auth::{required_tier_for, Identity};
use crate::features::{FeatureFlag, FeatureMatrix};
use crate::logging::{AuditEvent, AuditEventType, AuditLogger};
use crate::plan::PlanTier;
use crate::store::CatalogStore;
use crate::types::{GateError, Result, StorageError};

pub struct FeatureMatrixService<S: CatalogStore> {
    store: Arc<S>,
    audit: AuditLogger,
}

impl<S: CatalogStore> FeatureMatrixService<S> {
    pub fn new(store: Arc<S>, audit: AuditLogger) -> Self {
        Self { store, audit }
    }

    /// Current matrix: the stored customization, or the defaults
    pub async fn load(&self) -> std::result::Result<FeatureMatrix, StorageError> {
        Ok(match self.store.read_feature_matrix().await? {
            Some(rows) => FeatureMatrix::from_rows(&rows),
            None => FeatureMatrix::defaults(),
        })
    }

    pub async fn has_feature(&self, tier: PlanTier, feature: FeatureFlag) -> Result<bool> {
        Ok(self.load().await?.has(tier, feature))
    }

    /// Cheapest tier unlocking `feature` under the current matrix
    pub async fn required_tier_for(&self, feature: FeatureFlag, current: PlanTier) -> Result<PlanTier> {
        Ok(required_tier_for(feature, current, &self.load().await?))
    }

    /// Include or exclude a feature for a tier and persist the result
    pub async fn set_feature(
        &self,
        actor: &Identity,
        tier: PlanTier,
        feature: FeatureFlag,
        included: bool,
    ) -> Result<FeatureMatrix> {
        ensure_admin(actor)?;

        let current = self.load().await?;
        let next = current.set_feature_for_plan(tier, feature, included)?;
        if next == current {
            return Ok(current);
        }

        self.store.write_feature_matrix(next.to_rows()).await?;
        info!(tier = %tier, feature = %feature, included = included, "Feature matrix saved");

        self.audit
            .log(
                AuditEvent::new(AuditEventType::FeatureMatrixUpdated, &actor.id)
                    .with_target(tier.key())
                    .with_details(serde_json::json!({
                        "feature": feature.key(),
                        "included": included,
                    })),
            )
            .await;
        Ok(next)
    }

    /// Drop the customization and return the defaults
    pub async fn reset(&self, actor: &Identity) -> Result<FeatureMatrix> {
        ensure_admin(actor)?;

        self.store.clear_feature_matrix().await?;
        info!("Feature matrix reset to defaults");
        self.audit
            .log(AuditEvent::new(AuditEventType::FeatureMatrixReset, &actor.id))
            .await;
        Ok(FeatureMatrix::reset_to_defaults())
    }
}

pub(crate) fn ensure_admin(actor: &Identity) -> Result<()> {
    if actor.is_admin {
        Ok(())
    } else {
        Err(GateError::Forbidden(format!(
            "{} is not an administrator",
            actor.id
        )))
    }
}

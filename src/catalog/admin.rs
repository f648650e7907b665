//! Administrator catalog editing
//!
//! Validates and audits writes before they reach the catalog store. Fixed
//! items only accept overrides; dynamic items are created, patched and
//! deleted freely.

use std::sync::Arc;
use tracing::info;

use crate::auth::Identity;
use crate::catalog::fixed::FixedCatalog;
use crate::catalog::item::ContentKind;
use crate::features::service::ensure_admin;
use crate::logging::{AuditEvent, AuditEventType, AuditLogger};
use crate::store::{
    CatalogOverride, CatalogStore, DynamicItemPatch, DynamicItemRecord, NewDynamicItem,
    OverridePatch,
};
use crate::types::{GateError, Result};

pub struct CatalogAdmin<S: CatalogStore> {
    store: Arc<S>,
    fixed: Arc<FixedCatalog>,
    audit: AuditLogger,
}

impl<S: CatalogStore> CatalogAdmin<S> {
    pub fn new(store: Arc<S>, fixed: Arc<FixedCatalog>, audit: AuditLogger) -> Self {
        Self { store, fixed, audit }
    }

    /// Change the access URL and/or active flag of a fixed item
    pub async fn set_override(
        &self,
        actor: &Identity,
        item_id: &str,
        patch: OverridePatch,
    ) -> Result<CatalogOverride> {
        ensure_admin(actor)?;
        if !self.fixed.contains(item_id) {
            return Err(GateError::Validation(format!(
                "{item_id} is not a fixed catalog item"
            )));
        }
        if let Some(Some(url)) = &patch.access_url {
            validate_url(url)?;
        }

        let record = self.store.upsert_override(item_id, patch).await?;
        info!(item_id = item_id, active = record.active, "Override saved");

        self.audit
            .log(
                AuditEvent::new(AuditEventType::OverrideUpserted, &actor.id)
                    .with_target(item_id)
                    .with_kind(ContentKind::Activities)
                    .with_details(serde_json::json!({
                        "accessUrl": record.access_url,
                        "active": record.active,
                    })),
            )
            .await;
        Ok(record)
    }

    /// Restore a fixed item's default URL and make it active again
    pub async fn reset_override(&self, actor: &Identity, item_id: &str) -> Result<CatalogOverride> {
        self.set_override(actor, item_id, OverridePatch::reset()).await
    }

    pub async fn create_dynamic_item(
        &self,
        actor: &Identity,
        kind: ContentKind,
        item: NewDynamicItem,
    ) -> Result<DynamicItemRecord> {
        ensure_admin(actor)?;
        if item.title.trim().is_empty() {
            return Err(GateError::Validation("title is required".into()));
        }
        validate_url(&item.access_url)?;
        if item.active && item.available_plans.is_empty() {
            return Err(GateError::Validation(
                "an active item needs at least one plan".into(),
            ));
        }

        let record = self.store.create_dynamic_item(kind, item).await?;
        info!(kind = %kind, id = %record.id, "Dynamic item created");

        self.audit
            .log(
                AuditEvent::new(AuditEventType::DynamicItemCreated, &actor.id)
                    .with_target(&record.id)
                    .with_kind(kind),
            )
            .await;
        Ok(record)
    }

    pub async fn update_dynamic_item(
        &self,
        actor: &Identity,
        kind: ContentKind,
        id: &str,
        patch: DynamicItemPatch,
    ) -> Result<DynamicItemRecord> {
        ensure_admin(actor)?;
        if patch.is_empty() {
            return Err(GateError::Validation("nothing to update".into()));
        }
        if let Some(title) = &patch.title {
            if title.trim().is_empty() {
                return Err(GateError::Validation("title is required".into()));
            }
        }
        if let Some(url) = &patch.access_url {
            validate_url(url)?;
        }

        // The plan invariant depends on the merged result, so check it
        // against the current record before writing.
        if patch.available_plans.is_some() || patch.active.is_some() {
            let current = self
                .store
                .read_dynamic_items(kind)
                .await?
                .into_iter()
                .find(|r| r.id == id);
            if let Some(mut preview) = current {
                patch.apply(&mut preview);
                if preview.active && preview.available_plans.is_empty() {
                    return Err(GateError::Validation(
                        "an active item needs at least one plan".into(),
                    ));
                }
            }
        }

        let record = self.store.update_dynamic_item(kind, id, patch).await?;
        info!(kind = %kind, id = id, "Dynamic item updated");

        self.audit
            .log(
                AuditEvent::new(AuditEventType::DynamicItemUpdated, &actor.id)
                    .with_target(id)
                    .with_kind(kind),
            )
            .await;
        Ok(record)
    }

    pub async fn delete_dynamic_item(&self, actor: &Identity, kind: ContentKind, id: &str) -> Result<()> {
        ensure_admin(actor)?;

        self.store.delete_dynamic_item(kind, id).await?;
        info!(kind = %kind, id = id, "Dynamic item deleted");

        self.audit
            .log(
                AuditEvent::new(AuditEventType::DynamicItemDeleted, &actor.id)
                    .with_target(id)
                    .with_kind(kind),
            )
            .await;
        Ok(())
    }
}

fn validate_url(url: &str) -> Result<()> {
    let url = url.trim();
    if url.starts_with("https://") || url.starts_with("http://") {
        Ok(())
    } else {
        Err(GateError::Validation(format!("invalid access url: {url}")))
    }
}

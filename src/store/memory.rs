//! In-memory catalog store
//!
//! Backs dev mode and tests. Uses DashMap like the other hot in-process maps
//! in this codebase; the feature matrix is a single slot behind a lock.

use chrono::{Duration, Utc};
use dashmap::DashMap;
use std::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use super::{
    CatalogOverride, CatalogStore, DynamicItemPatch, DynamicItemRecord, MatrixRow,
    NewDynamicItem, OverridePatch, StoreResult,
};
use crate::catalog::ContentKind;
use crate::types::StorageError;

#[derive(Debug, Default)]
pub struct MemoryCatalogStore {
    overrides: DashMap<String, CatalogOverride>,
    dynamic: DashMap<ContentKind, Vec<DynamicItemRecord>>,
    matrix: RwLock<Option<Vec<MatrixRow>>>,
}

impl MemoryCatalogStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a complete record as-is, keeping its id and timestamps
    pub fn seed_dynamic_item(&self, record: DynamicItemRecord) {
        self.dynamic.entry(record.kind).or_default().push(record);
    }

    /// Insert a complete override as-is
    pub fn seed_override(&self, record: CatalogOverride) {
        self.overrides.insert(record.item_id.clone(), record);
    }

    fn lock_error() -> StorageError {
        StorageError::Unavailable("feature matrix lock poisoned".into())
    }
}

#[async_trait::async_trait]
impl CatalogStore for MemoryCatalogStore {
    async fn read_overrides(&self) -> StoreResult<Vec<CatalogOverride>> {
        Ok(self.overrides.iter().map(|e| e.value().clone()).collect())
    }

    async fn upsert_override(
        &self,
        item_id: &str,
        patch: OverridePatch,
    ) -> StoreResult<CatalogOverride> {
        let now = Utc::now();
        let mut entry = self
            .overrides
            .entry(item_id.to_string())
            .or_insert_with(|| CatalogOverride {
                item_id: item_id.to_string(),
                access_url: None,
                active: true,
                updated_at: now,
            });

        if let Some(access_url) = patch.access_url {
            entry.access_url = access_url;
        }
        if let Some(active) = patch.active {
            entry.active = active;
        }
        entry.updated_at = now;

        debug!(item_id = item_id, "Override upserted");
        Ok(entry.clone())
    }

    async fn read_dynamic_items(&self, kind: ContentKind) -> StoreResult<Vec<DynamicItemRecord>> {
        Ok(self
            .dynamic
            .get(&kind)
            .map(|items| items.clone())
            .unwrap_or_default())
    }

    async fn create_dynamic_item(
        &self,
        kind: ContentKind,
        item: NewDynamicItem,
    ) -> StoreResult<DynamicItemRecord> {
        let mut items = self.dynamic.entry(kind).or_default();

        // Keep creation times strictly increasing so newest-first is stable
        let mut created_at = Utc::now();
        if let Some(latest) = items.iter().map(|r| r.created_at).max() {
            if created_at <= latest {
                created_at = latest + Duration::microseconds(1);
            }
        }

        let record = DynamicItemRecord {
            id: Uuid::new_v4().to_string(),
            kind,
            title: item.title,
            description: item.description,
            media_ref: item.media_ref,
            access_url: item.access_url,
            category: item.category,
            age_range: item.age_range,
            available_plans: item.available_plans,
            active: item.active,
            created_at,
            updated_at: created_at,
        };
        items.push(record.clone());

        debug!(kind = %kind, id = %record.id, "Dynamic item created");
        Ok(record)
    }

    async fn update_dynamic_item(
        &self,
        kind: ContentKind,
        id: &str,
        patch: DynamicItemPatch,
    ) -> StoreResult<DynamicItemRecord> {
        let mut items = self
            .dynamic
            .get_mut(&kind)
            .ok_or_else(|| StorageError::NotFound(format!("{kind}/{id}")))?;
        let record = items
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| StorageError::NotFound(format!("{kind}/{id}")))?;

        patch.apply(record);
        record.updated_at = Utc::now();
        Ok(record.clone())
    }

    async fn delete_dynamic_item(&self, kind: ContentKind, id: &str) -> StoreResult<()> {
        let mut items = self
            .dynamic
            .get_mut(&kind)
            .ok_or_else(|| StorageError::NotFound(format!("{kind}/{id}")))?;
        let before = items.len();
        items.retain(|r| r.id != id);
        if items.len() == before {
            return Err(StorageError::NotFound(format!("{kind}/{id}")));
        }
        Ok(())
    }

    async fn read_feature_matrix(&self) -> StoreResult<Option<Vec<MatrixRow>>> {
        let slot = self.matrix.read().map_err(|_| Self::lock_error())?;
        Ok(slot.clone())
    }

    async fn write_feature_matrix(&self, rows: Vec<MatrixRow>) -> StoreResult<()> {
        let mut slot = self.matrix.write().map_err(|_| Self::lock_error())?;
        *slot = Some(rows);
        Ok(())
    }

    async fn clear_feature_matrix(&self) -> StoreResult<()> {
        let mut slot = self.matrix.write().map_err(|_| Self::lock_error())?;
        *slot = None;
        Ok(())
    }
}

//! Catalog store port
//!
//! The durable side of the catalog: sparse overrides for fixed items, fully
//! admin-authored dynamic items, and the customized feature matrix. Every
//! call succeeds or fails on its own; nothing here spans multiple records.
//!
//! Implementations:
//! - [`memory::MemoryCatalogStore`] - in-process, for dev mode and tests
//! - [`crate::db::MongoCatalogStore`] - MongoDB

pub mod memory;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::catalog::{ContentItem, ContentKind, Origin};
use crate::plan::PlanSet;
use crate::types::StorageError;

pub use memory::MemoryCatalogStore;

pub type StoreResult<T> = std::result::Result<T, StorageError>;

/// Admin changes to a fixed item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogOverride {
    pub item_id: String,
    /// `None` means use the fixed catalog default
    pub access_url: Option<String>,
    pub active: bool,
    pub updated_at: DateTime<Utc>,
}

/// Fields to change in an override upsert.
///
/// `access_url: Some(None)` clears the URL back to the default; `None` leaves
/// it untouched. A new override starts active with no URL.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OverridePatch {
    pub access_url: Option<Option<String>>,
    pub active: Option<bool>,
}

impl OverridePatch {
    /// Patch that restores the fixed item's defaults
    pub fn reset() -> Self {
        Self {
            access_url: Some(None),
            active: Some(true),
        }
    }
}

/// Stored admin-authored item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DynamicItemRecord {
    pub id: String,
    pub kind: ContentKind,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub media_ref: Option<String>,
    pub access_url: String,
    #[serde(default)]
    pub category: String,
    pub age_range: Option<String>,
    pub available_plans: PlanSet,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DynamicItemRecord {
    pub fn into_content_item(self) -> ContentItem {
        ContentItem {
            id: self.id,
            kind: self.kind,
            title: self.title,
            description: self.description,
            media_ref: self.media_ref,
            access_url: self.access_url,
            category: self.category,
            age_range: self.age_range,
            available_plans: self.available_plans,
            origin: Origin::Dynamic,
            active: self.active,
            order: None,
            created_at: Some(self.created_at),
        }
    }
}

/// Input for creating a dynamic item; the store assigns id and timestamps
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewDynamicItem {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub media_ref: Option<String>,
    pub access_url: String,
    #[serde(default)]
    pub category: String,
    pub age_range: Option<String>,
    pub available_plans: PlanSet,
    #[serde(default = "default_true")]
    pub active: bool,
}

fn default_true() -> bool {
    true
}

/// Partial update of a dynamic item. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DynamicItemPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub media_ref: Option<Option<String>>,
    pub access_url: Option<String>,
    pub category: Option<String>,
    pub age_range: Option<Option<String>>,
    pub available_plans: Option<PlanSet>,
    pub active: Option<bool>,
}

impl DynamicItemPatch {
    pub fn is_empty(&self) -> bool {
        *self == DynamicItemPatch::default()
    }

    /// Apply to a record in place
    pub fn apply(&self, record: &mut DynamicItemRecord) {
        if let Some(title) = &self.title {
            record.title = title.clone();
        }
        if let Some(description) = &self.description {
            record.description = description.clone();
        }
        if let Some(media_ref) = &self.media_ref {
            record.media_ref = media_ref.clone();
        }
        if let Some(access_url) = &self.access_url {
            record.access_url = access_url.clone();
        }
        if let Some(category) = &self.category {
            record.category = category.clone();
        }
        if let Some(age_range) = &self.age_range {
            record.age_range = age_range.clone();
        }
        if let Some(plans) = self.available_plans {
            record.available_plans = plans;
        }
        if let Some(active) = self.active {
            record.active = active;
        }
    }
}

/// One persisted row of a customized feature matrix.
///
/// Names stay as raw strings; the matrix service decides what to do with
/// names it does not recognize.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatrixRow {
    pub tier: String,
    pub features: Vec<String>,
}

/// Durable storage consumed by the resolver, admin service and matrix service
#[async_trait::async_trait]
pub trait CatalogStore: Send + Sync {
    /// All overrides for fixed items
    async fn read_overrides(&self) -> StoreResult<Vec<CatalogOverride>>;

    /// Create or patch the override for a fixed item id
    async fn upsert_override(
        &self,
        item_id: &str,
        patch: OverridePatch,
    ) -> StoreResult<CatalogOverride>;

    /// Dynamic items of one kind, in no particular order
    async fn read_dynamic_items(&self, kind: ContentKind) -> StoreResult<Vec<DynamicItemRecord>>;

    async fn create_dynamic_item(
        &self,
        kind: ContentKind,
        item: NewDynamicItem,
    ) -> StoreResult<DynamicItemRecord>;

    /// Fails with `NotFound` when no item of that kind has the id
    async fn update_dynamic_item(
        &self,
        kind: ContentKind,
        id: &str,
        patch: DynamicItemPatch,
    ) -> StoreResult<DynamicItemRecord>;

    /// Fails with `NotFound` when no item of that kind has the id
    async fn delete_dynamic_item(&self, kind: ContentKind, id: &str) -> StoreResult<()>;

    /// The customized feature matrix, `None` when defaults apply
    async fn read_feature_matrix(&self) -> StoreResult<Option<Vec<MatrixRow>>>;

    /// Replace any stored customization
    async fn write_feature_matrix(&self, rows: Vec<MatrixRow>) -> StoreResult<()>;

    /// Discard the stored customization
    async fn clear_feature_matrix(&self) -> StoreResult<()>;
}

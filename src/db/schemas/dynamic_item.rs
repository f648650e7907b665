//! Dynamic item document schema
//!
//! Admin-authored catalog rows. Creation time lives in the metadata and
//! drives newest-first ordering.

use bson::{doc, oid::ObjectId, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::catalog::ContentKind;
use crate::db::mongo::{IntoIndexes, MutMetadata};
use crate::db::schemas::Metadata;
use crate::plan::PlanSet;
use crate::store::{DynamicItemRecord, NewDynamicItem};

pub const DYNAMIC_ITEM_COLLECTION: &str = "dynamic_items";

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct DynamicItemDoc {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    #[serde(default)]
    pub metadata: Metadata,

    /// Stable public id (UUID)
    pub item_id: String,

    /// Content kind key
    pub kind: String,

    pub title: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub media_ref: Option<String>,

    pub access_url: String,

    #[serde(default)]
    pub category: String,

    #[serde(default)]
    pub age_range: Option<String>,

    /// Tier keys; unknown keys are dropped on read
    #[serde(default)]
    pub available_plans: PlanSet,

    #[serde(default)]
    pub active: bool,
}

impl DynamicItemDoc {
    pub fn new(item_id: String, kind: ContentKind, item: NewDynamicItem) -> Self {
        Self {
            _id: None,
            metadata: Metadata::new(),
            item_id,
            kind: kind.key().to_string(),
            title: item.title,
            description: item.description,
            media_ref: item.media_ref,
            access_url: item.access_url,
            category: item.category,
            age_range: item.age_range,
            available_plans: item.available_plans,
            active: item.active,
        }
    }

    /// Convert for a read that already filtered on `kind`
    pub fn into_record(self, kind: ContentKind) -> DynamicItemRecord {
        let created_at = self.metadata.created_chrono();
        let updated_at = self.metadata.updated_chrono();
        DynamicItemRecord {
            id: self.item_id,
            kind,
            title: self.title,
            description: self.description,
            media_ref: self.media_ref,
            access_url: self.access_url,
            category: self.category,
            age_range: self.age_range,
            available_plans: self.available_plans,
            active: self.active,
            created_at,
            updated_at,
        }
    }
}

impl IntoIndexes for DynamicItemDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![
            (
                doc! { "item_id": 1 },
                Some(
                    IndexOptions::builder()
                        .unique(true)
                        .name("item_id_unique".to_string())
                        .build(),
                ),
            ),
            // Listing by kind, newest first
            (
                doc! { "kind": 1, "metadata.created_at": -1 },
                Some(
                    IndexOptions::builder()
                        .name("kind_created_index".to_string())
                        .build(),
                ),
            ),
        ]
    }
}

impl MutMetadata for DynamicItemDoc {
    fn mut_metadata(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}

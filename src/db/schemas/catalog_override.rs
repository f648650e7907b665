//! Override document schema
//!
//! One sparse record per fixed catalog item an administrator has touched.

use bson::{doc, oid::ObjectId, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::db::mongo::{IntoIndexes, MutMetadata};
use crate::db::schemas::Metadata;
use crate::store::CatalogOverride;

pub const OVERRIDE_COLLECTION: &str = "catalog_overrides";

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct OverrideDoc {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    #[serde(default)]
    pub metadata: Metadata,

    /// Fixed catalog id
    pub item_id: String,

    /// `None` means use the fixed catalog default
    #[serde(default)]
    pub access_url: Option<String>,

    #[serde(default = "default_true")]
    pub active: bool,
}

fn default_true() -> bool {
    true
}

impl From<OverrideDoc> for CatalogOverride {
    fn from(doc: OverrideDoc) -> Self {
        let updated_at = doc.metadata.updated_chrono();
        CatalogOverride {
            item_id: doc.item_id,
            access_url: doc.access_url,
            active: doc.active,
            updated_at,
        }
    }
}

impl IntoIndexes for OverrideDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![(
            doc! { "item_id": 1 },
            Some(
                IndexOptions::builder()
                    .unique(true)
                    .name("item_id_unique".to_string())
                    .build(),
            ),
        )]
    }
}

impl MutMetadata for OverrideDoc {
    fn mut_metadata(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}

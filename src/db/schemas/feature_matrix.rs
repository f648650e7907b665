//! Feature matrix document schema
//!
//! The customized matrix is a single document holding every row, so a save
//! replaces it in one write. No document means defaults apply.

use bson::{doc, oid::ObjectId, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::db::mongo::{IntoIndexes, MutMetadata};
use crate::db::schemas::Metadata;
use crate::store::MatrixRow;

pub const FEATURE_MATRIX_COLLECTION: &str = "feature_matrix";

/// Key of the one customized matrix document
pub const FEATURE_MATRIX_KEY: &str = "customized";

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct FeatureMatrixDoc {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    #[serde(default)]
    pub metadata: Metadata,

    pub key: String,

    /// One row per tier
    #[serde(default)]
    pub rows: Vec<MatrixRow>,
}

impl IntoIndexes for FeatureMatrixDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![(
            doc! { "key": 1 },
            Some(
                IndexOptions::builder()
                    .unique(true)
                    .name("key_unique".to_string())
                    .build(),
            ),
        )]
    }
}

impl MutMetadata for FeatureMatrixDoc {
    fn mut_metadata(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}

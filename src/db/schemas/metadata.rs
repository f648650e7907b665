//! Common metadata for all documents

use bson::DateTime;
use serde::{Deserialize, Serialize};

/// Creation, update and soft-deletion timestamps
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct Metadata {
    #[serde(default)]
    pub is_deleted: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime>,
}

impl Metadata {
    pub fn new() -> Self {
        let now = DateTime::now();
        Self {
            is_deleted: false,
            deleted_at: None,
            updated_at: Some(now),
            created_at: Some(now),
        }
    }

    /// Creation time as chrono, falling back to the epoch when unset
    pub fn created_chrono(&self) -> chrono::DateTime<chrono::Utc> {
        self.created_at.map(|d| d.to_chrono()).unwrap_or_default()
    }

    /// Last update as chrono, falling back to the creation time
    pub fn updated_chrono(&self) -> chrono::DateTime<chrono::Utc> {
        self.updated_at
            .map(|d| d.to_chrono())
            .unwrap_or_else(|| self.created_chrono())
    }
}

//! Unified content item shape
//!
//! Produced only by the hybrid resolver. Consumers never need to know whether
//! an item came from the fixed catalog or was authored by an administrator,
//! but `origin` keeps that visible for admin tooling.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::plan::PlanSet;
use crate::types::GateError;

/// Content catalogs shown on the dashboard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Activities,
    Videos,
    Bonus,
}

impl ContentKind {
    pub fn all() -> &'static [ContentKind] {
        &[ContentKind::Activities, ContentKind::Videos, ContentKind::Bonus]
    }

    pub fn key(self) -> &'static str {
        match self {
            ContentKind::Activities => "activities",
            ContentKind::Videos => "videos",
            ContentKind::Bonus => "bonus",
        }
    }

    /// Only activities have a fixed, code-defined catalog
    pub fn has_fixed_items(self) -> bool {
        matches!(self, ContentKind::Activities)
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for ContentKind {
    type Err = GateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "activities" | "activity" => Ok(ContentKind::Activities),
            "videos" | "video" => Ok(ContentKind::Videos),
            "bonus" | "bonuses" => Ok(ContentKind::Bonus),
            other => Err(GateError::Validation(format!("unknown content kind: {other}"))),
        }
    }
}

/// Where a resolved item came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    Fixed,
    Dynamic,
}

/// A resolved content item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentItem {
    pub id: String,
    pub kind: ContentKind,
    pub title: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media_ref: Option<String>,
    pub access_url: String,
    pub category: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age_range: Option<String>,
    pub available_plans: PlanSet,
    pub origin: Origin,
    pub active: bool,
    /// Curated position, fixed items only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<u32>,
    /// Creation time, dynamic items only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_parsing() {
        assert_eq!("Videos".parse::<ContentKind>().unwrap(), ContentKind::Videos);
        assert_eq!("activity".parse::<ContentKind>().unwrap(), ContentKind::Activities);
        assert!("podcasts".parse::<ContentKind>().is_err());
    }

    #[test]
    fn test_only_activities_have_fixed_items() {
        assert!(ContentKind::Activities.has_fixed_items());
        assert!(!ContentKind::Videos.has_fixed_items());
        assert!(!ContentKind::Bonus.has_fixed_items());
    }
}

//! Error types for plangate
//!
//! Storage failures propagate unchanged; the hybrid resolver wraps them in
//! [`ResolutionError`] so callers see either a complete list or a failure.

use thiserror::Error;

use crate::catalog::ContentKind;
use crate::features::FeatureFlag;
use crate::plan::PlanTier;

/// Failure reported by a [`crate::store::CatalogStore`] implementation
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StorageError {
    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Hybrid resolution failed because one half of the merge could not be read
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Failed to resolve {kind} catalog: {source}")]
pub struct ResolutionError {
    pub kind: ContentKind,
    #[source]
    pub source: StorageError,
}

/// Attempt to revoke a feature every tier must keep
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
#[error("Feature {feature} is mandatory and cannot be removed from {tier}")]
pub struct MandatoryFeatureError {
    pub tier: PlanTier,
    pub feature: FeatureFlag,
}

/// A plan key that matches no known tier
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Unrecognized plan key: {0}")]
pub struct UnrecognizedPlanKey(pub String);

/// Crate-wide error
#[derive(Debug, Error)]
pub enum GateError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Resolution(#[from] ResolutionError),

    #[error(transparent)]
    MandatoryFeature(#[from] MandatoryFeatureError),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl GateError {
    /// Message safe to show an end user.
    ///
    /// Storage internals stay in the logs; the dashboard only learns that
    /// content is unavailable.
    pub fn user_message(&self) -> String {
        match self {
            GateError::Storage(_) | GateError::Resolution(_) => {
                "Content is temporarily unavailable".to_string()
            }
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, GateError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolution_error_wraps_storage() {
        let err = ResolutionError {
            kind: ContentKind::Activities,
            source: StorageError::Unavailable("timeout".into()),
        };
        assert_eq!(
            err.to_string(),
            "Failed to resolve activities catalog: Store unavailable: timeout"
        );
        assert_eq!(
            std::error::Error::source(&err).map(|s| s.to_string()),
            Some("Store unavailable: timeout".to_string())
        );
    }

    #[test]
    fn test_user_message_hides_storage_details() {
        let err: GateError = StorageError::Database("connection refused on 10.0.0.4".into()).into();
        assert_eq!(err.user_message(), "Content is temporarily unavailable");

        let err = GateError::Validation("title is required".into());
        assert_eq!(err.user_message(), "Validation error: title is required");
    }
}

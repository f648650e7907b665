//! Database schemas for plangate
//!
//! MongoDB document structures for catalog overrides, dynamic items and the
//! customized feature matrix.

mod catalog_override;
mod dynamic_item;
mod feature_matrix;
mod metadata;

pub use catalog_override::{OverrideDoc, OVERRIDE_COLLECTION};
pub use dynamic_item::{DynamicItemDoc, DYNAMIC_ITEM_COLLECTION};
pub use feature_matrix::{FeatureMatrixDoc, FEATURE_MATRIX_COLLECTION, FEATURE_MATRIX_KEY};
pub use metadata::Metadata;

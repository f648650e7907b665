//! Content catalog
//!
//! - **fixed**: curated, code-defined activities
//! - **resolver**: merges fixed items, overrides and dynamic items
//! - **filter**: dashboard filtering of a resolved list
//! - **admin**: administrator edits, audited

pub mod admin;
pub mod filter;
pub mod fixed;
pub mod item;
pub mod resolver;

pub use admin::CatalogAdmin;
pub use filter::{categories, CatalogFilter};
pub use fixed::{FixedCatalog, FixedItem};
pub use item::{ContentItem, ContentKind, Origin};
pub use resolver::{merge, HybridResolver, ResolverStats};

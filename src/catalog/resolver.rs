//! Hybrid Resolution - one ordered list per content kind
//!
//! Merges the fixed catalog, its overrides and admin-authored dynamic items.
//!
//! ## Ordering
//!
//! ```text
//! fixed items (active only, ascending `order`)
//!     followed by
//! dynamic items (newest first)
//! ```
//!
//! Curated content always precedes admin-submitted content.
//!
//! ## Failure
//!
//! Overrides and dynamic items are read concurrently. If either read fails the
//! whole resolution fails with a [`ResolutionError`]; callers never see a list
//! silently missing one half.

use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::catalog::fixed::FixedCatalog;
use crate::catalog::item::{ContentItem, ContentKind, Origin};
use crate::store::{CatalogOverride, CatalogStore, DynamicItemRecord};
use crate::types::ResolutionError;

/// Resolution statistics
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct ResolverStats {
    /// Total resolution attempts
    pub resolution_count: u64,
    /// Attempts that failed
    pub failures: u64,
    /// Fixed items returned across all resolutions
    pub fixed_served: u64,
    /// Dynamic items returned across all resolutions
    pub dynamic_served: u64,
}

/// Resolver over a fixed catalog and a catalog store
pub struct HybridResolver<S: CatalogStore> {
    store: Arc<S>,
    fixed: Arc<FixedCatalog>,
    stats: std::sync::RwLock<ResolverStats>,
}

impl<S: CatalogStore> HybridResolver<S> {
    pub fn new(store: Arc<S>, fixed: Arc<FixedCatalog>) -> Self {
        Self {
            store,
            fixed,
            stats: std::sync::RwLock::new(ResolverStats::default()),
        }
    }

    pub fn fixed_catalog(&self) -> &FixedCatalog {
        &self.fixed
    }

    /// Resolve the merged list for one kind.
    ///
    /// Stateless: abandoning the future leaves nothing to roll back, and two
    /// calls against an unchanged store return equal lists.
    pub async fn resolve(&self, kind: ContentKind) -> Result<Vec<ContentItem>, ResolutionError> {
        let result = self.try_resolve(kind).await;
        self.update_stats(&result);

        match &result {
            Ok(items) => debug!(kind = %kind, count = items.len(), "Catalog resolved"),
            Err(e) => warn!(kind = %kind, error = %e, "Catalog resolution failed"),
        }
        result
    }

    async fn try_resolve(&self, kind: ContentKind) -> Result<Vec<ContentItem>, ResolutionError> {
        let wrap = |source| ResolutionError { kind, source };

        let (overrides, dynamic) = if kind.has_fixed_items() {
            tokio::try_join!(self.store.read_overrides(), self.store.read_dynamic_items(kind))
                .map_err(wrap)?
        } else {
            let dynamic = self.store.read_dynamic_items(kind).await.map_err(wrap)?;
            (Vec::new(), dynamic)
        };

        Ok(merge(&self.fixed, kind, overrides, dynamic))
    }

    fn update_stats(&self, result: &Result<Vec<ContentItem>, ResolutionError>) {
        if let Ok(mut stats) = self.stats.write() {
            stats.resolution_count += 1;
            match result {
                Ok(items) => {
                    let (fixed, dynamic) = count_by_origin(items);
                    stats.fixed_served += fixed;
                    stats.dynamic_served += dynamic;
                }
                Err(_) => stats.failures += 1,
            }
        }
    }

    pub fn get_stats(&self) -> ResolverStats {
        self.stats.read().map(|s| s.clone()).unwrap_or_default()
    }

    pub fn reset_stats(&self) {
        if let Ok(mut stats) = self.stats.write() {
            *stats = ResolverStats::default();
        }
    }
}

/// Fixed and dynamic item counts of a resolved list
fn count_by_origin(items: &[ContentItem]) -> (u64, u64) {
    let fixed = items.iter().filter(|i| i.origin == Origin::Fixed).count() as u64;
    (fixed, items.len() as u64 - fixed)
}

/// Pure merge of already-loaded inputs
pub fn merge(
    fixed: &FixedCatalog,
    kind: ContentKind,
    overrides: Vec<CatalogOverride>,
    mut dynamic: Vec<DynamicItemRecord>,
) -> Vec<ContentItem> {
    let overrides: HashMap<String, CatalogOverride> = overrides
        .into_iter()
        .map(|o| (o.item_id.clone(), o))
        .collect();

    // FixedCatalog iterates in ascending order already
    let mut merged: Vec<ContentItem> = fixed
        .items(kind)
        .filter_map(|item| {
            let over = overrides.get(&item.id);
            let active = over.map_or(true, |o| o.active);
            if !active {
                return None;
            }
            let access_url = over
                .and_then(|o| o.access_url.as_deref())
                .filter(|url| !url.trim().is_empty())
                .unwrap_or(item.default_access_url.as_str())
                .to_string();
            Some(item.to_content_item(access_url, true))
        })
        .collect();

    // Newest first; id breaks ties so the order is total
    dynamic.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| a.id.cmp(&b.id))
    });

    // Only placed items reserve an id
    let mut seen: HashSet<String> = merged.iter().map(|item| item.id.clone()).collect();
    for record in dynamic {
        if record.kind != kind {
            continue;
        }
        if !seen.insert(record.id.clone()) {
            warn!(kind = %kind, id = %record.id, "Dropping dynamic item with duplicate id");
            continue;
        }
        merged.push(record.into_content_item());
    }

    merged
}

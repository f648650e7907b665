//! Consumer-side filtering of a resolved catalog
//!
//! Filtering never reorders: output keeps the resolver's fixed-then-dynamic
//! order.

use crate::auth::{can_access, EffectivePlan};
use crate::catalog::item::ContentItem;

/// Dashboard filter over a resolved list
#[derive(Debug, Clone, Default)]
pub struct CatalogFilter {
    pub category: Option<String>,
    pub age_range: Option<String>,
    /// Case-insensitive match against title and description
    pub search: Option<String>,
    /// Keep items whose active flag is false (admin previews)
    pub include_inactive: bool,
    /// Keep only items this plan may open
    pub accessible_for: Option<(EffectivePlan, bool)>,
}

impl CatalogFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn age_range(mut self, age_range: impl Into<String>) -> Self {
        self.age_range = Some(age_range.into());
        self
    }

    pub fn search(mut self, text: impl Into<String>) -> Self {
        self.search = Some(text.into());
        self
    }

    pub fn include_inactive(mut self) -> Self {
        self.include_inactive = true;
        self
    }

    pub fn accessible_for(mut self, plan: EffectivePlan, is_admin: bool) -> Self {
        self.accessible_for = Some((plan, is_admin));
        self
    }

    pub fn matches(&self, item: &ContentItem) -> bool {
        if !self.include_inactive && !item.active {
            return false;
        }
        if let Some(category) = &self.category {
            if !item.category.eq_ignore_ascii_case(category) {
                return false;
            }
        }
        if let Some(age_range) = &self.age_range {
            if item.age_range.as_deref() != Some(age_range.as_str()) {
                return false;
            }
        }
        if let Some(text) = &self.search {
            let needle = text.to_lowercase();
            if !item.title.to_lowercase().contains(&needle)
                && !item.description.to_lowercase().contains(&needle)
            {
                return false;
            }
        }
        if let Some((plan, is_admin)) = &self.accessible_for {
            if !can_access(item, plan, *is_admin) {
                return false;
            }
        }
        true
    }

    pub fn apply<'a>(&self, items: &'a [ContentItem]) -> Vec<&'a ContentItem> {
        items.iter().filter(|item| self.matches(item)).collect()
    }
}

/// Distinct categories in first-seen order
pub fn categories(items: &[ContentItem]) -> Vec<&str> {
    let mut out: Vec<&str> = Vec::new();
    for item in items {
        if !out.contains(&item.category.as_str()) {
            out.push(&item.category);
        }
    }
    out
}

//! Fixed catalog - the curated, code-defined activity list
//!
//! Ids and metadata here are immutable. Administrators can only change an
//! item's access URL and active flag, through overrides in the catalog store.

use crate::catalog::item::{ContentItem, ContentKind, Origin};
use crate::plan::{PlanSet, PlanTier};

/// A curated catalog entry with its defaults
#[derive(Debug, Clone, PartialEq)]
pub struct FixedItem {
    pub id: String,
    pub kind: ContentKind,
    pub title: String,
    pub description: String,
    pub media_ref: Option<String>,
    pub default_access_url: String,
    pub category: String,
    pub age_range: Option<String>,
    pub available_plans: PlanSet,
    pub order: u32,
}

impl FixedItem {
    /// Materialize with the given resolved access URL and active flag
    pub fn to_content_item(&self, access_url: String, active: bool) -> ContentItem {
        ContentItem {
            id: self.id.clone(),
            kind: self.kind,
            title: self.title.clone(),
            description: self.description.clone(),
            media_ref: self.media_ref.clone(),
            access_url,
            category: self.category.clone(),
            age_range: self.age_range.clone(),
            available_plans: self.available_plans,
            origin: Origin::Fixed,
            active,
            order: Some(self.order),
            created_at: None,
        }
    }
}

struct Seed {
    id: &'static str,
    title: &'static str,
    description: &'static str,
    media: &'static str,
    url: &'static str,
    category: &'static str,
    ages: &'static str,
    from: PlanTier,
    order: u32,
}

const SEEDS: &[Seed] = &[
    Seed {
        id: "phonics",
        title: "Phonics Adventure",
        description: "Letter sounds and first blends through picture matching.",
        media: "activities/phonics.webp",
        url: "https://materials.plangate.app/activities/phonics.pdf",
        category: "literacy",
        ages: "4-6",
        from: PlanTier::Essential,
        order: 1,
    },
    Seed {
        id: "counting-garden",
        title: "Counting Garden",
        description: "Count, sort and compare quantities up to twenty.",
        media: "activities/counting-garden.webp",
        url: "https://materials.plangate.app/activities/counting-garden.pdf",
        category: "math",
        ages: "3-5",
        from: PlanTier::Demo,
        order: 2,
    },
    Seed {
        id: "tracing-lines",
        title: "Tracing Lines",
        description: "Fine motor warm-ups: straight, curved and zigzag strokes.",
        media: "activities/tracing-lines.webp",
        url: "https://materials.plangate.app/activities/tracing-lines.pdf",
        category: "motor-skills",
        ages: "3-5",
        from: PlanTier::Essential,
        order: 3,
    },
    Seed {
        id: "syllable-train",
        title: "Syllable Train",
        description: "Clap, split and rebuild words one syllable at a time.",
        media: "activities/syllable-train.webp",
        url: "https://materials.plangate.app/activities/syllable-train.pdf",
        category: "literacy",
        ages: "5-7",
        from: PlanTier::Essential,
        order: 4,
    },
    Seed {
        id: "shapes-hunt",
        title: "Shapes Hunt",
        description: "Find and name shapes hidden in everyday scenes.",
        media: "activities/shapes-hunt.webp",
        url: "https://materials.plangate.app/activities/shapes-hunt.pdf",
        category: "math",
        ages: "4-6",
        from: PlanTier::Growth,
        order: 5,
    },
    Seed {
        id: "feelings-wheel",
        title: "Feelings Wheel",
        description: "Name emotions and talk about what causes them.",
        media: "activities/feelings-wheel.webp",
        url: "https://materials.plangate.app/activities/feelings-wheel.pdf",
        category: "social-emotional",
        ages: "4-8",
        from: PlanTier::Growth,
        order: 6,
    },
    Seed {
        id: "story-sequencing",
        title: "Story Sequencing",
        description: "Put story cards in order and retell the plot.",
        media: "activities/story-sequencing.webp",
        url: "https://materials.plangate.app/activities/story-sequencing.pdf",
        category: "literacy",
        ages: "5-8",
        from: PlanTier::Growth,
        order: 7,
    },
    Seed {
        id: "math-mazes",
        title: "Math Mazes",
        description: "Solve additions and subtractions to find the way out.",
        media: "activities/math-mazes.webp",
        url: "https://materials.plangate.app/activities/math-mazes.pdf",
        category: "math",
        ages: "6-8",
        from: PlanTier::Prime,
        order: 8,
    },
];

/// Immutable fixed catalog, kept sorted by `order`
#[derive(Debug, Clone, Default)]
pub struct FixedCatalog {
    items: Vec<FixedItem>,
}

impl FixedCatalog {
    pub fn new(mut items: Vec<FixedItem>) -> Self {
        items.sort_by_key(|item| item.order);
        Self { items }
    }

    /// The catalog shipped with the application
    pub fn builtin() -> Self {
        let items = SEEDS
            .iter()
            .map(|seed| FixedItem {
                id: seed.id.to_string(),
                kind: ContentKind::Activities,
                title: seed.title.to_string(),
                description: seed.description.to_string(),
                media_ref: Some(seed.media.to_string()),
                default_access_url: seed.url.to_string(),
                category: seed.category.to_string(),
                age_range: Some(seed.ages.to_string()),
                available_plans: PlanSet::at_least(seed.from),
                order: seed.order,
            })
            .collect();
        Self::new(items)
    }

    /// Items of one kind in ascending `order`
    pub fn items(&self, kind: ContentKind) -> impl Iterator<Item = &FixedItem> {
        self.items.iter().filter(move |item| item.kind == kind)
    }

    pub fn get(&self, id: &str) -> Option<&FixedItem> {
        self.items.iter().find(|item| item.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

//! Hybrid catalog integration tests
//!
//! Exercises the public API end to end:
//! - Fixed catalog merged with overrides and dynamic items
//! - Access evaluation for members and administrators
//! - Plan simulation and the feature matrix
//! - All-or-nothing resolution when the store fails

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{Duration, Utc};

use plangate::auth::{
    admin_bypass, can_access, EffectivePlan, Identity, MemorySessionStore, PlanSimulator,
};
use plangate::catalog::{ContentKind, FixedCatalog, FixedItem, HybridResolver, Origin};
use plangate::features::{FeatureFlag, FeatureMatrix};
use plangate::plan::{PlanSet, PlanTier};
use plangate::store::{
    CatalogOverride, CatalogStore, DynamicItemPatch, DynamicItemRecord, MatrixRow,
    MemoryCatalogStore, NewDynamicItem, OverridePatch, StoreResult,
};
use plangate::types::{ResolutionError, StorageError};

// =============================================================================
// Fixtures
// =============================================================================

fn phonics_catalog() -> FixedCatalog {
    FixedCatalog::new(vec![FixedItem {
        id: "phonics".into(),
        kind: ContentKind::Activities,
        title: "Phonics".into(),
        description: "Letter sounds".into(),
        media_ref: None,
        default_access_url: "https://materials.test/url_a".into(),
        category: "literacy".into(),
        age_range: Some("4-6".into()),
        available_plans: PlanSet::at_least(PlanTier::Essential),
        order: 1,
    }])
}

fn dynamic_record(id: &str, kind: ContentKind, minutes_ago: i64) -> DynamicItemRecord {
    let created = Utc::now() - Duration::minutes(minutes_ago);
    DynamicItemRecord {
        id: id.into(),
        kind,
        title: format!("Custom {id}"),
        description: String::new(),
        media_ref: None,
        access_url: format!("https://custom.test/{id}"),
        category: "extra".into(),
        age_range: None,
        available_plans: PlanSet::all(),
        active: true,
        created_at: created,
        updated_at: created,
    }
}

fn member(plan: PlanTier) -> (Identity, EffectivePlan) {
    (Identity::member("u1", plan), EffectivePlan::real(plan))
}

/// Store double whose reads can be made to fail
#[derive(Default)]
struct FailingStore {
    inner: MemoryCatalogStore,
    fail_overrides: AtomicBool,
    fail_dynamic: AtomicBool,
}

impl FailingStore {
    fn unavailable() -> StorageError {
        StorageError::Unavailable("connection reset".into())
    }
}

#[async_trait::async_trait]
impl CatalogStore for FailingStore {
    async fn read_overrides(&self) -> StoreResult<Vec<CatalogOverride>> {
        if self.fail_overrides.load(Ordering::SeqCst) {
            return Err(Self::unavailable());
        }
        self.inner.read_overrides().await
    }

    async fn upsert_override(
        &self,
        item_id: &str,
        patch: OverridePatch,
    ) -> StoreResult<CatalogOverride> {
        self.inner.upsert_override(item_id, patch).await
    }

    async fn read_dynamic_items(&self, kind: ContentKind) -> StoreResult<Vec<DynamicItemRecord>> {
        if self.fail_dynamic.load(Ordering::SeqCst) {
            return Err(Self::unavailable());
        }
        self.inner.read_dynamic_items(kind).await
    }

    async fn create_dynamic_item(
        &self,
        kind: ContentKind,
        item: NewDynamicItem,
    ) -> StoreResult<DynamicItemRecord> {
        self.inner.create_dynamic_item(kind, item).await
    }

    async fn update_dynamic_item(
        &self,
        kind: ContentKind,
        id: &str,
        patch: DynamicItemPatch,
    ) -> StoreResult<DynamicItemRecord> {
        self.inner.update_dynamic_item(kind, id, patch).await
    }

    async fn delete_dynamic_item(&self, kind: ContentKind, id: &str) -> StoreResult<()> {
        self.inner.delete_dynamic_item(kind, id).await
    }

    async fn read_feature_matrix(&self) -> StoreResult<Option<Vec<MatrixRow>>> {
        self.inner.read_feature_matrix().await
    }

    async fn write_feature_matrix(&self, rows: Vec<MatrixRow>) -> StoreResult<()> {
        self.inner.write_feature_matrix(rows).await
    }

    async fn clear_feature_matrix(&self) -> StoreResult<()> {
        self.inner.clear_feature_matrix().await
    }
}

// =============================================================================
// Example scenario
// =============================================================================

#[tokio::test]
async fn test_phonics_override_and_custom_item() {
    let store = Arc::new(MemoryCatalogStore::new());
    store
        .upsert_override(
            "phonics",
            OverridePatch {
                access_url: Some(Some("https://materials.test/url_b".into())),
                active: Some(true),
            },
        )
        .await
        .unwrap();
    store.seed_dynamic_item(dynamic_record("custom1", ContentKind::Activities, 0));

    let resolver = HybridResolver::new(store, Arc::new(phonics_catalog()));
    let items = resolver.resolve(ContentKind::Activities).await.unwrap();

    let ids: Vec<&str> = items.iter().map(|i| i.id.as_str()).collect();
    assert_eq!(ids, vec!["phonics", "custom1"]);
    assert_eq!(items[0].access_url, "https://materials.test/url_b");
    assert_eq!(items[0].origin, Origin::Fixed);
    assert_eq!(items[1].origin, Origin::Dynamic);

    let (_, demo) = member(PlanTier::Demo);
    let (_, essential) = member(PlanTier::Essential);
    assert!(!can_access(&items[0], &demo, false));
    assert!(can_access(&items[0], &essential, false));
}

// =============================================================================
// Merge properties
// =============================================================================

#[tokio::test]
async fn test_fixed_first_then_newest_dynamic_without_duplicates() {
    let store = Arc::new(MemoryCatalogStore::new());
    store.seed_dynamic_item(dynamic_record("older", ContentKind::Activities, 30));
    store.seed_dynamic_item(dynamic_record("newer", ContentKind::Activities, 5));
    // Collides with a fixed id and must not appear twice
    store.seed_dynamic_item(dynamic_record("phonics", ContentKind::Activities, 1));

    let resolver = HybridResolver::new(store, Arc::new(FixedCatalog::builtin()));
    let items = resolver.resolve(ContentKind::Activities).await.unwrap();

    let fixed: Vec<u32> = items.iter().filter_map(|i| i.order).collect();
    let mut sorted = fixed.clone();
    sorted.sort_unstable();
    assert_eq!(fixed, sorted);
    assert_eq!(fixed.len(), FixedCatalog::builtin().len());

    let dynamic: Vec<&str> = items
        .iter()
        .filter(|i| i.origin == Origin::Dynamic)
        .map(|i| i.id.as_str())
        .collect();
    assert_eq!(dynamic, vec!["newer", "older"]);

    let phonics = items.iter().filter(|i| i.id == "phonics").count();
    assert_eq!(phonics, 1);
    assert!(items
        .iter()
        .position(|i| i.origin == Origin::Dynamic)
        .map(|first| items[first..].iter().all(|i| i.origin == Origin::Dynamic))
        .unwrap_or(true));
}

#[tokio::test]
async fn test_deactivated_fixed_item_is_hidden() {
    let store = Arc::new(MemoryCatalogStore::new());
    store
        .upsert_override(
            "phonics",
            OverridePatch {
                access_url: None,
                active: Some(false),
            },
        )
        .await
        .unwrap();

    let catalog = Arc::new(phonics_catalog());
    let resolver = HybridResolver::new(store, catalog.clone());
    let items = resolver.resolve(ContentKind::Activities).await.unwrap();

    assert!(items.is_empty());
    assert!(catalog.contains("phonics"));
}

#[tokio::test]
async fn test_resolve_is_repeatable() {
    let store = Arc::new(MemoryCatalogStore::new());
    store.seed_dynamic_item(dynamic_record("a", ContentKind::Videos, 10));
    store.seed_dynamic_item(dynamic_record("b", ContentKind::Videos, 20));

    let resolver = HybridResolver::new(store, Arc::new(FixedCatalog::builtin()));
    let first = resolver.resolve(ContentKind::Videos).await.unwrap();
    let second = resolver.resolve(ContentKind::Videos).await.unwrap();
    assert_eq!(first, second);
    assert_eq!(resolver.get_stats().resolution_count, 2);
}

// =============================================================================
// Failure propagation
// =============================================================================

#[tokio::test]
async fn test_override_read_failure_fails_whole_resolution() {
    let store = Arc::new(FailingStore::default());
    store.fail_overrides.store(true, Ordering::SeqCst);

    let resolver = HybridResolver::new(store, Arc::new(FixedCatalog::builtin()));
    let err = resolver.resolve(ContentKind::Activities).await.unwrap_err();
    assert_eq!(
        err,
        ResolutionError {
            kind: ContentKind::Activities,
            source: FailingStore::unavailable(),
        }
    );
    assert_eq!(resolver.get_stats().failures, 1);
}

#[tokio::test]
async fn test_dynamic_read_failure_fails_whole_resolution() {
    let store = Arc::new(FailingStore::default());
    store.fail_dynamic.store(true, Ordering::SeqCst);

    let resolver = HybridResolver::new(store.clone(), Arc::new(FixedCatalog::builtin()));
    assert!(resolver.resolve(ContentKind::Activities).await.is_err());
    assert!(resolver.resolve(ContentKind::Bonus).await.is_err());

    store.fail_dynamic.store(false, Ordering::SeqCst);
    let items = resolver.resolve(ContentKind::Activities).await.unwrap();
    assert_eq!(items.len(), FixedCatalog::builtin().len());
}

#[tokio::test]
async fn test_videos_do_not_read_overrides() {
    let store = Arc::new(FailingStore::default());
    store.fail_overrides.store(true, Ordering::SeqCst);

    let resolver = HybridResolver::new(store, Arc::new(FixedCatalog::builtin()));
    assert!(resolver.resolve(ContentKind::Videos).await.is_ok());
}

// =============================================================================
// Access, simulation and matrix
// =============================================================================

#[tokio::test]
async fn test_access_fail_closed_and_admin_bypass() {
    let store = Arc::new(MemoryCatalogStore::new());
    let mut locked = dynamic_record("locked", ContentKind::Bonus, 0);
    locked.available_plans = PlanSet::empty();
    locked.active = false;
    store.seed_dynamic_item(locked);

    let resolver = HybridResolver::new(store, Arc::new(FixedCatalog::builtin()));
    let items = resolver.resolve(ContentKind::Bonus).await.unwrap();
    let item = &items[0];

    for tier in PlanTier::ordered() {
        assert!(!can_access(item, &EffectivePlan::real(*tier), false));
        assert!(can_access(item, &EffectivePlan::real(*tier), true));
    }
}

#[test]
fn test_simulation_ignored_for_members_and_gates_admin_preview() {
    let simulator = PlanSimulator::new(Arc::new(MemorySessionStore::new()));

    let (user, _) = member(PlanTier::Growth);
    let before = simulator.effective_plan(&user);
    simulator.set_simulated_tier(&user, PlanTier::Prime);
    assert_eq!(simulator.effective_plan(&user), before);

    let root = Identity::admin("root");
    let effective = simulator.set_simulated_tier(&root, PlanTier::Demo);
    assert!(effective.is_simulating);
    assert!(!admin_bypass(&root, &effective));

    let item = FixedCatalog::builtin()
        .get("phonics")
        .map(|f| f.to_content_item(f.default_access_url.clone(), true))
        .unwrap();
    assert!(!can_access(&item, &effective, admin_bypass(&root, &effective)));

    simulator.on_identity_change(Some(&root), None);
    assert!(!simulator.effective_plan(&root).is_simulating);
}

#[test]
fn test_matrix_cascade_and_mandatory_feature() {
    let matrix = FeatureMatrix::defaults()
        .set_feature_for_plan(PlanTier::Essential, FeatureFlag::Videos, true)
        .unwrap();

    let next = matrix
        .set_feature_for_plan(PlanTier::Growth, FeatureFlag::Videos, false)
        .unwrap();
    assert!(!next.has(PlanTier::Growth, FeatureFlag::Videos));
    assert!(!next.has(PlanTier::Essential, FeatureFlag::Videos));
    assert!(next.has(PlanTier::Prime, FeatureFlag::Videos));

    for tier in PlanTier::ordered() {
        assert!(matrix
            .set_feature_for_plan(*tier, FeatureFlag::Activities, false)
            .is_err());
    }
}

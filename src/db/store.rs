//! MongoDB-backed catalog store

use bson::{doc, Bson, DateTime, Document};
use tracing::debug;
use uuid::Uuid;

use crate::catalog::ContentKind;
use crate::db::mongo::{MongoClient, MongoCollection};
use crate::db::schemas::{
    DynamicItemDoc, FeatureMatrixDoc, OverrideDoc, DYNAMIC_ITEM_COLLECTION,
    FEATURE_MATRIX_COLLECTION, FEATURE_MATRIX_KEY, OVERRIDE_COLLECTION,
};
use crate::store::{
    CatalogOverride, CatalogStore, DynamicItemPatch, DynamicItemRecord, MatrixRow,
    NewDynamicItem, OverridePatch, StoreResult,
};
use crate::types::StorageError;

pub struct MongoCatalogStore {
    overrides: MongoCollection<OverrideDoc>,
    dynamic: MongoCollection<DynamicItemDoc>,
    matrix: MongoCollection<FeatureMatrixDoc>,
}

impl MongoCatalogStore {
    /// Open the collections, creating their indexes
    pub async fn new(client: &MongoClient) -> StoreResult<Self> {
        Ok(Self {
            overrides: client.collection(OVERRIDE_COLLECTION).await?,
            dynamic: client.collection(DYNAMIC_ITEM_COLLECTION).await?,
            matrix: client.collection(FEATURE_MATRIX_COLLECTION).await?,
        })
    }

    fn item_filter(kind: ContentKind, id: &str) -> Document {
        doc! { "item_id": id, "kind": kind.key() }
    }
}

fn to_bson<T: serde::Serialize>(value: &T) -> StoreResult<Bson> {
    bson::to_bson(value).map_err(|e| StorageError::Serialization(e.to_string()))
}

/// `$set` document for a dynamic item patch
fn patch_update(patch: &DynamicItemPatch) -> StoreResult<Document> {
    let mut set = doc! { "metadata.updated_at": DateTime::now() };
    if let Some(title) = &patch.title {
        set.insert("title", title.as_str());
    }
    if let Some(description) = &patch.description {
        set.insert("description", description.as_str());
    }
    if let Some(media_ref) = &patch.media_ref {
        set.insert("media_ref", media_ref.clone());
    }
    if let Some(access_url) = &patch.access_url {
        set.insert("access_url", access_url.as_str());
    }
    if let Some(category) = &patch.category {
        set.insert("category", category.as_str());
    }
    if let Some(age_range) = &patch.age_range {
        set.insert("age_range", age_range.clone());
    }
    if let Some(plans) = &patch.available_plans {
        set.insert("available_plans", to_bson(plans)?);
    }
    if let Some(active) = patch.active {
        set.insert("active", active);
    }
    Ok(doc! { "$set": set })
}

/// Upsert replacing every matrix row in one document
fn matrix_update(rows: &[MatrixRow]) -> StoreResult<Document> {
    let now = DateTime::now();
    Ok(doc! {
        "$set": {
            "rows": to_bson(&rows)?,
            "metadata.is_deleted": false,
            "metadata.updated_at": now,
        },
        "$setOnInsert": { "metadata.created_at": now },
    })
}

#[async_trait::async_trait]
impl CatalogStore for MongoCatalogStore {
    async fn read_overrides(&self) -> StoreResult<Vec<CatalogOverride>> {
        let docs = self.overrides.find_many(doc! {}).await?;
        Ok(docs.into_iter().map(CatalogOverride::from).collect())
    }

    async fn upsert_override(
        &self,
        item_id: &str,
        patch: OverridePatch,
    ) -> StoreResult<CatalogOverride> {
        let now = DateTime::now();
        let mut set = doc! { "metadata.updated_at": now };
        let mut on_insert = doc! {
            "metadata.is_deleted": false,
            "metadata.created_at": now,
        };

        match patch.access_url {
            Some(url) => {
                set.insert("access_url", url);
            }
            None => {
                on_insert.insert("access_url", Bson::Null);
            }
        }
        match patch.active {
            Some(active) => {
                set.insert("active", active);
            }
            None => {
                on_insert.insert("active", true);
            }
        }

        self.overrides
            .upsert_one(
                doc! { "item_id": item_id },
                doc! { "$set": set, "$setOnInsert": on_insert },
            )
            .await?;
        debug!(item_id = item_id, "Override upserted");

        self.overrides
            .find_one(doc! { "item_id": item_id })
            .await?
            .map(CatalogOverride::from)
            .ok_or_else(|| StorageError::NotFound(format!("override {item_id}")))
    }

    async fn read_dynamic_items(&self, kind: ContentKind) -> StoreResult<Vec<DynamicItemRecord>> {
        let docs = self.dynamic.find_many(doc! { "kind": kind.key() }).await?;
        Ok(docs.into_iter().map(|d| d.into_record(kind)).collect())
    }

    async fn create_dynamic_item(
        &self,
        kind: ContentKind,
        item: NewDynamicItem,
    ) -> StoreResult<DynamicItemRecord> {
        let doc = DynamicItemDoc::new(Uuid::new_v4().to_string(), kind, item);
        self.dynamic.insert_one(doc.clone()).await?;
        debug!(kind = %kind, id = %doc.item_id, "Dynamic item inserted");
        Ok(doc.into_record(kind))
    }

    async fn update_dynamic_item(
        &self,
        kind: ContentKind,
        id: &str,
        patch: DynamicItemPatch,
    ) -> StoreResult<DynamicItemRecord> {
        let mut filter = Self::item_filter(kind, id);
        filter.insert("metadata.is_deleted", doc! { "$ne": true });

        let result = self.dynamic.update_one(filter, patch_update(&patch)?).await?;
        if result.matched_count == 0 {
            return Err(StorageError::NotFound(format!("{kind}/{id}")));
        }

        self.dynamic
            .find_one(Self::item_filter(kind, id))
            .await?
            .map(|d| d.into_record(kind))
            .ok_or_else(|| StorageError::NotFound(format!("{kind}/{id}")))
    }

    async fn delete_dynamic_item(&self, kind: ContentKind, id: &str) -> StoreResult<()> {
        let result = self.dynamic.soft_delete(Self::item_filter(kind, id)).await?;
        if result.matched_count == 0 {
            return Err(StorageError::NotFound(format!("{kind}/{id}")));
        }
        Ok(())
    }

    async fn read_feature_matrix(&self) -> StoreResult<Option<Vec<MatrixRow>>> {
        let doc = self.matrix.find_one(doc! { "key": FEATURE_MATRIX_KEY }).await?;
        Ok(doc.map(|d| d.rows))
    }

    async fn write_feature_matrix(&self, rows: Vec<MatrixRow>) -> StoreResult<()> {
        self.matrix
            .upsert_one(doc! { "key": FEATURE_MATRIX_KEY }, matrix_update(&rows)?)
            .await?;
        debug!(rows = rows.len(), "Feature matrix written");
        Ok(())
    }

    async fn clear_feature_matrix(&self) -> StoreResult<()> {
        let removed = self.matrix.delete_many(doc! { "key": FEATURE_MATRIX_KEY }).await?;
        debug!(removed = removed, "Feature matrix cleared");
        Ok(())
    }
}

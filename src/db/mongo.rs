//! MongoDB client and typed collections
//!
//! Each schema declares its own indexes, created when the collection is
//! opened. Reads only ever see live documents; deletion is a metadata flag
//! unless a caller asks for a hard delete.

use bson::{doc, DateTime, Document};
use mongodb::{
    options::{IndexOptions, UpdateModifications},
    results::UpdateResult,
    Client, Collection, IndexModel,
};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{error, info};

use crate::db::schemas::Metadata;
use crate::types::StorageError;

/// Server selection and connect timeout, so an unreachable server fails fast
const CONNECT_TIMEOUT_MS: u32 = 3000;

/// Schemas that declare their indexes
pub trait IntoIndexes {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)>;
}

/// Schemas carrying [`Metadata`]
pub trait MutMetadata {
    fn mut_metadata(&mut self) -> &mut Metadata;
}

/// Bounds shared by every stored schema
pub trait Schema:
    Serialize + DeserializeOwned + Unpin + Send + Sync + IntoIndexes + MutMetadata
{
}

impl<T> Schema for T where
    T: Serialize + DeserializeOwned + Unpin + Send + Sync + IntoIndexes + MutMetadata
{
}

fn db_error(context: &str, e: impl std::fmt::Display) -> StorageError {
    StorageError::Database(format!("{context}: {e}"))
}

fn with_timeouts(uri: &str) -> String {
    let sep = if uri.contains('?') { '&' } else { '?' };
    format!(
        "{uri}{sep}serverSelectionTimeoutMS={CONNECT_TIMEOUT_MS}&connectTimeoutMS={CONNECT_TIMEOUT_MS}"
    )
}

/// Restrict a filter to documents that are not soft-deleted
fn live(mut filter: Document) -> Document {
    filter.insert("metadata.is_deleted", doc! { "$ne": true });
    filter
}

#[derive(Clone)]
pub struct MongoClient {
    client: Client,
    db_name: String,
}

impl MongoClient {
    /// Connect and ping; any failure is reported as `Unavailable`
    pub async fn new(uri: &str, db_name: &str) -> Result<Self, StorageError> {
        info!(uri = uri, db = db_name, "Connecting to MongoDB");

        let client = Client::with_uri_str(with_timeouts(uri))
            .await
            .map_err(|e| StorageError::Unavailable(format!("Failed to connect to MongoDB: {e}")))?;

        client
            .database(db_name)
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|e| StorageError::Unavailable(format!("MongoDB ping failed: {e}")))?;

        info!(db = db_name, "MongoDB connected");
        Ok(Self {
            client,
            db_name: db_name.to_string(),
        })
    }

    /// Open a collection and make sure its indexes exist
    pub async fn collection<T: Schema>(&self, name: &str) -> Result<MongoCollection<T>, StorageError> {
        let collection = MongoCollection {
            inner: self.client.database(&self.db_name).collection::<T>(name),
        };
        collection.ensure_indexes().await?;
        Ok(collection)
    }
}

#[derive(Debug, Clone)]
pub struct MongoCollection<T: Send + Sync> {
    inner: Collection<T>,
}

impl<T: Schema> MongoCollection<T> {
    async fn ensure_indexes(&self) -> Result<(), StorageError> {
        let models: Vec<IndexModel> = T::into_indices()
            .into_iter()
            .map(|(keys, opts)| IndexModel::builder().keys(keys).options(opts).build())
            .collect();
        if models.is_empty() {
            return Ok(());
        }

        self.inner
            .create_indexes(models)
            .await
            .map_err(|e| db_error("Failed to create indexes", e))?;
        Ok(())
    }

    /// Insert a document. A preset `created_at` is kept.
    pub async fn insert_one(&self, mut item: T) -> Result<(), StorageError> {
        let now = DateTime::now();
        let metadata = item.mut_metadata();
        metadata.is_deleted = false;
        metadata.created_at.get_or_insert(now);
        metadata.updated_at = Some(now);

        self.inner
            .insert_one(item)
            .await
            .map_err(|e| db_error("Insert failed", e))?;
        Ok(())
    }

    pub async fn find_one(&self, filter: Document) -> Result<Option<T>, StorageError> {
        self.inner
            .find_one(live(filter))
            .await
            .map_err(|e| db_error("Find failed", e))
    }

    /// All live documents matching `filter`.
    ///
    /// A document that fails to decode fails the read; dropping it would hand
    /// the resolver a partial list.
    pub async fn find_many(&self, filter: Document) -> Result<Vec<T>, StorageError> {
        use futures_util::TryStreamExt;

        let cursor = self
            .inner
            .find(live(filter))
            .await
            .map_err(|e| db_error("Find failed", e))?;

        cursor.try_collect().await.map_err(|e| {
            error!(error = %e, "Failed to decode document");
            StorageError::Serialization(e.to_string())
        })
    }

    pub async fn update_one(
        &self,
        filter: Document,
        update: impl Into<UpdateModifications>,
    ) -> Result<UpdateResult, StorageError> {
        self.inner
            .update_one(filter, update.into())
            .await
            .map_err(|e| db_error("Update failed", e))
    }

    /// Update, inserting when nothing matches
    pub async fn upsert_one(
        &self,
        filter: Document,
        update: impl Into<UpdateModifications>,
    ) -> Result<UpdateResult, StorageError> {
        self.inner
            .update_one(filter, update.into())
            .upsert(true)
            .await
            .map_err(|e| db_error("Upsert failed", e))
    }

    /// Flag live matches as deleted
    pub async fn soft_delete(&self, filter: Document) -> Result<UpdateResult, StorageError> {
        let now = DateTime::now();
        let update = doc! {
            "$set": {
                "metadata.is_deleted": true,
                "metadata.deleted_at": now,
                "metadata.updated_at": now,
            }
        };
        self.update_one(live(filter), update).await
    }

    /// Hard delete, for records with no history worth keeping
    pub async fn delete_many(&self, filter: Document) -> Result<u64, StorageError> {
        self.inner
            .delete_many(filter)
            .await
            .map(|r| r.deleted_count)
            .map_err(|e| db_error("Delete failed", e))
    }
}

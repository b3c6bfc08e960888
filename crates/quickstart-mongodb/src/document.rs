//! Document trait shared by the catalogue models
//!
//! Implementors get typed CRUD helpers against their own collection. The
//! walkthrough modules build on these instead of repeating collection lookups.

use async_trait::async_trait;
use bson::{doc, oid::ObjectId, Bson, Document as BsonDocument};
use mongodb::Collection;
use quickstart_common::{QuickstartError, Result};
use serde::{de::DeserializeOwned, Serialize};

use crate::connection::Connection;

/// Core trait for catalogue documents
///
/// # Example
///
/// ```ignore
/// let mut podcast = Podcast::new("The Polyglot Developer Podcast", "Nic Raboy");
/// let id = podcast.insert(&conn).await?;
/// let stored = Podcast::find_by_id(&conn, id).await?;
/// ```
#[async_trait]
pub trait Document: Serialize + DeserializeOwned + Send + Sync + Unpin + Sized {
    /// Get the collection name for this document type
    fn collection_name() -> &'static str;

    /// Get the document's ObjectId (if it has one)
    fn get_id(&self) -> Option<ObjectId>;

    /// Set the document's ObjectId
    fn set_id(&mut self, id: ObjectId);

    /// Typed collection for this document
    fn collection(conn: &Connection) -> Collection<Self> {
        conn.database().collection(Self::collection_name())
    }

    /// Insert this document and record the generated id on it
    async fn insert(&mut self, conn: &Connection) -> Result<ObjectId> {
        let result = Self::collection(conn).insert_one(&*self).await?;
        let id = expect_object_id(&result.inserted_id)?;
        self.set_id(id);

        tracing::debug!(collection = Self::collection_name(), %id, "Inserted document");
        Ok(id)
    }

    /// Insert several documents, returning their ids in input order
    async fn insert_many(conn: &Connection, docs: &[Self]) -> Result<Vec<ObjectId>> {
        if docs.is_empty() {
            return Ok(Vec::new());
        }

        let result = Self::collection(conn).insert_many(docs).await?;

        // inserted_ids is keyed by input position
        let mut ids = Vec::with_capacity(docs.len());
        for index in 0..docs.len() {
            let id = result.inserted_ids.get(&index).ok_or_else(|| {
                QuickstartError::MongoDB(format!("No inserted id reported for document {}", index))
            })?;
            ids.push(expect_object_id(id)?);
        }

        tracing::debug!(
            collection = Self::collection_name(),
            count = ids.len(),
            "Inserted documents"
        );
        Ok(ids)
    }

    /// Find a single document matching the filter
    async fn find_one(conn: &Connection, filter: BsonDocument) -> Result<Option<Self>> {
        Ok(Self::collection(conn).find_one(filter).await?)
    }

    /// Find a document by its ObjectId
    async fn find_by_id(conn: &Connection, id: ObjectId) -> Result<Option<Self>> {
        Self::find_one(conn, doc! { "_id": id }).await
    }

    /// Count documents matching the filter
    async fn count(conn: &Connection, filter: BsonDocument) -> Result<u64> {
        Ok(Self::collection(conn).count_documents(filter).await?)
    }
}

/// Inserted ids are driver-generated ObjectIds for every model here
pub(crate) fn expect_object_id(id: &Bson) -> Result<ObjectId> {
    id.as_object_id()
        .ok_or_else(|| QuickstartError::MongoDB(format!("Inserted id is not an ObjectId: {}", id)))
}

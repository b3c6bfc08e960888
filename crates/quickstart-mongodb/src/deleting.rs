//! Deleting documents and dropping collections

use bson::doc;
use quickstart_common::Result;

use crate::connection::{Connection, EPISODES, PODCASTS};
use crate::document::Document;
use crate::models::{Episode, Podcast};
use crate::retrieving::duration_equals;

/// Delete the first podcast titled `title`, returning how many were removed
pub async fn delete_podcast_by_title(conn: &Connection, title: &str) -> Result<u64> {
    let result = Podcast::collection(conn)
        .delete_one(doc! { "title": title })
        .await?;

    tracing::debug!(title, deleted = result.deleted_count, "delete_one on podcasts");
    Ok(result.deleted_count)
}

/// Delete every episode exactly `minutes` long
pub async fn delete_episodes_by_duration(conn: &Connection, minutes: i32) -> Result<u64> {
    let result = Episode::collection(conn)
        .delete_many(duration_equals(minutes))
        .await?;

    tracing::debug!(minutes, deleted = result.deleted_count, "delete_many on episodes");
    Ok(result.deleted_count)
}

/// Drop a collection; a missing collection is not an error
pub async fn drop_collection(conn: &Connection, name: &str) -> Result<()> {
    conn.collection(name).drop().await?;
    tracing::debug!(collection = name, "Dropped collection");
    Ok(())
}

/// Drop both catalogue collections
pub async fn drop_collections(conn: &Connection) -> Result<()> {
    drop_collection(conn, PODCASTS).await?;
    drop_collection(conn, EPISODES).await
}

//! Retrieving documents: find one, filtered finds, sorted finds

use bson::{doc, oid::ObjectId, Document as BsonDocument};
use quickstart_common::Result;

use crate::connection::{Connection, EPISODES, PODCASTS};
use crate::document::Document;
use crate::models::Podcast;
use crate::query::{QueryBuilder, SortOrder};

/// Equality filter on episode length
pub fn duration_equals(minutes: i32) -> BsonDocument {
    doc! { "duration": minutes }
}

/// Strictly-greater filter on episode length
pub fn duration_greater_than(minutes: i32) -> BsonDocument {
    doc! { "duration": { "$gt": minutes } }
}

/// First podcast in natural order, undecoded
pub async fn find_first_podcast(conn: &Connection) -> Result<Option<BsonDocument>> {
    Ok(conn.collection(PODCASTS).find_one(doc! {}).await?)
}

/// Typed lookup by generated id
pub async fn find_podcast_by_id(conn: &Connection, id: ObjectId) -> Result<Option<Podcast>> {
    Podcast::find_by_id(conn, id).await
}

/// Episodes whose duration is exactly `minutes`
pub async fn find_episodes_by_duration(
    conn: &Connection,
    minutes: i32,
) -> Result<Vec<BsonDocument>> {
    QueryBuilder::new()
        .filter(duration_equals(minutes))
        .fetch(&conn.collection(EPISODES))
        .await
}

/// Episodes longer than `minutes`, longest first
pub async fn find_episodes_longer_than(
    conn: &Connection,
    minutes: i32,
) -> Result<Vec<BsonDocument>> {
    QueryBuilder::new()
        .filter(duration_greater_than(minutes))
        .sort_by("duration", SortOrder::Descending)
        .fetch(&conn.collection(EPISODES))
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duration_equals_filter() {
        assert_eq!(duration_equals(25), doc! { "duration": 25 });
    }

    #[test]
    fn test_duration_greater_than_filter() {
        assert_eq!(
            duration_greater_than(24),
            doc! { "duration": { "$gt": 24 } }
        );
    }
}

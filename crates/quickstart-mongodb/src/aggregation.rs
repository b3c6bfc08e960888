//! Aggregation pipelines over the catalogue
//!
//! Two shapes are used:
//! - `$match` + `$group`: total listening time for one podcast
//! - `$lookup` + `$unwind`: every episode with its podcast embedded

use bson::{doc, oid::ObjectId, Document as BsonDocument};
use futures::TryStreamExt;
use quickstart_common::{QuickstartError, Result};

use crate::connection::{Connection, EPISODES, PODCASTS};
use crate::models::{PodcastEpisode, PodcastTotal};

/// Sum episode durations for `podcast_id`
pub fn total_duration_pipeline(podcast_id: ObjectId) -> Vec<BsonDocument> {
    vec![
        doc! { "$match": { "podcast": podcast_id } },
        doc! { "$group": { "_id": "$podcast", "total": { "$sum": "$duration" } } },
    ]
}

/// Replace each episode's `podcast` reference with the podcast document
///
/// Episodes whose podcast no longer exists are dropped by the unwind.
pub fn episodes_with_podcast_pipeline() -> Vec<BsonDocument> {
    vec![
        doc! {
            "$lookup": {
                "from": PODCASTS,
                "localField": "podcast",
                "foreignField": "_id",
                "as": "podcast",
            }
        },
        doc! {
            "$unwind": {
                "path": "$podcast",
                "preserveNullAndEmptyArrays": false,
            }
        },
    ]
}

/// Run `pipeline` against `episodes` and collect the raw results
pub async fn run_pipeline(
    conn: &Connection,
    pipeline: Vec<BsonDocument>,
) -> Result<Vec<BsonDocument>> {
    tracing::debug!(stages = pipeline.len(), "Running aggregation on episodes");
    let cursor = conn.collection(EPISODES).aggregate(pipeline).await?;
    Ok(cursor.try_collect().await?)
}

/// Total duration of every episode of `podcast_id`
///
/// Empty when the podcast has no episodes.
pub async fn total_duration(conn: &Connection, podcast_id: ObjectId) -> Result<Vec<PodcastTotal>> {
    run_pipeline(conn, total_duration_pipeline(podcast_id))
        .await?
        .into_iter()
        .map(|doc| bson::from_document(doc).map_err(QuickstartError::from))
        .collect()
}

/// Episodes joined with their podcast, as loose documents
pub async fn episodes_with_podcast(conn: &Connection) -> Result<Vec<BsonDocument>> {
    run_pipeline(conn, episodes_with_podcast_pipeline()).await
}

/// Episodes joined with their podcast, decoded into [`PodcastEpisode`]
pub async fn episodes_with_podcast_typed(conn: &Connection) -> Result<Vec<PodcastEpisode>> {
    let cursor = conn
        .collection(EPISODES)
        .aggregate(episodes_with_podcast_pipeline())
        .with_type::<PodcastEpisode>()
        .await?;
    Ok(cursor.try_collect().await?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_duration_pipeline_shape() {
        let id = ObjectId::new();
        let pipeline = total_duration_pipeline(id);
        assert_eq!(pipeline.len(), 2);
        assert_eq!(pipeline[0], doc! { "$match": { "podcast": id } });
        let group = pipeline[1].get_document("$group").unwrap();
        assert_eq!(group.get_str("_id").unwrap(), "$podcast");
        assert_eq!(
            group.get_document("total").unwrap(),
            &doc! { "$sum": "$duration" }
        );
    }

    #[test]
    fn test_lookup_joins_on_podcast_id() {
        let pipeline = episodes_with_podcast_pipeline();
        let lookup = pipeline[0].get_document("$lookup").unwrap();
        assert_eq!(lookup.get_str("from").unwrap(), "podcasts");
        assert_eq!(lookup.get_str("localField").unwrap(), "podcast");
        assert_eq!(lookup.get_str("foreignField").unwrap(), "_id");
        assert_eq!(lookup.get_str("as").unwrap(), "podcast");
    }

    #[test]
    fn test_unwind_drops_orphans() {
        let pipeline = episodes_with_podcast_pipeline();
        let unwind = pipeline[1].get_document("$unwind").unwrap();
        assert_eq!(unwind.get_str("path").unwrap(), "$podcast");
        assert!(!unwind.get_bool("preserveNullAndEmptyArrays").unwrap());
    }

    #[test]
    fn test_group_result_decodes() {
        let id = ObjectId::new();
        let total: PodcastTotal = bson::from_document(doc! { "_id": id, "total": 57 }).unwrap();
        assert_eq!(total.podcast, Some(id));
        assert_eq!(total.total, 57);
    }
}

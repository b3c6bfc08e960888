//! Creating documents: single and bulk inserts

use bson::oid::ObjectId;
use quickstart_common::Result;

use crate::connection::Connection;
use crate::document::Document;
use crate::models::{Episode, Podcast};

/// Outcome of seeding the catalogue
#[derive(Debug, Clone, PartialEq)]
pub struct SeedReport {
    pub podcast_id: ObjectId,
    pub episode_ids: Vec<ObjectId>,
}

/// Insert one podcast and return its generated id
pub async fn insert_podcast(conn: &Connection, podcast: &Podcast) -> Result<ObjectId> {
    let mut podcast = podcast.clone();
    podcast.insert(conn).await
}

/// Insert several episodes and return their ids in input order
pub async fn insert_episodes(conn: &Connection, episodes: &[Episode]) -> Result<Vec<ObjectId>> {
    Episode::insert_many(conn, episodes).await
}

/// The show inserted by [`seed`]
pub fn sample_podcast() -> Podcast {
    Podcast::new("The Polyglot Developer Podcast", "Nic Raboy")
        .with_tags(["development", "programming", "coding"])
}

/// The two episodes inserted by [`seed`], attached to `podcast`
pub fn sample_episodes(podcast: ObjectId) -> Vec<Episode> {
    vec![
        Episode::new(podcast, "GraphQL for API Development", 25)
            .with_description("Learn about GraphQL from the co-creator of GraphQL, Lee Byron."),
        Episode::new(podcast, "Progressive Web Application Development", 32)
            .with_description("Learn about PWA development with Tara Manicsic."),
    ]
}

/// Insert the sample podcast and its episodes
pub async fn seed(conn: &Connection) -> Result<SeedReport> {
    let podcast_id = insert_podcast(conn, &sample_podcast()).await?;
    let episode_ids = insert_episodes(conn, &sample_episodes(podcast_id)).await?;

    tracing::info!(
        %podcast_id,
        episodes = episode_ids.len(),
        "Seeded podcast catalogue"
    );

    Ok(SeedReport {
        podcast_id,
        episode_ids,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_episodes_reference_podcast() {
        let podcast_id = ObjectId::new();
        let episodes = sample_episodes(podcast_id);
        assert_eq!(episodes.len(), 2);
        assert!(episodes.iter().all(|e| e.podcast == Some(podcast_id)));
        let durations: Vec<Option<i32>> = episodes.iter().map(|e| e.duration).collect();
        assert_eq!(durations, vec![Some(25), Some(32)]);
    }

    #[test]
    fn test_sample_podcast_has_no_id() {
        let podcast = sample_podcast();
        assert!(podcast.id.is_none());
        assert_eq!(podcast.tags.len(), 3);
    }
}

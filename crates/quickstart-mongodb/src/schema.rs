//! Server-side schema rule for episodes
//!
//! Episodes shorter than [`MIN_EPISODE_DURATION`] minutes are rejected by a
//! `$jsonSchema` validator on the `episodes` collection. The server enforces
//! it; [`check_episode`] mirrors the rule so callers can test it offline.

use bson::{doc, Document as BsonDocument};
use quickstart_common::{QuickstartError, Result};

use crate::connection::{Connection, EPISODES};
use crate::models::Episode;

/// Shortest episode the validator accepts, in minutes
pub const MIN_EPISODE_DURATION: i32 = 2;

/// `$jsonSchema` validator for `episodes`; `duration` stays optional
pub fn episode_validator() -> BsonDocument {
    doc! {
        "$jsonSchema": {
            "bsonType": "object",
            "properties": {
                "duration": {
                    "bsonType": ["int", "long"],
                    "minimum": MIN_EPISODE_DURATION,
                    "description": "episode length in minutes, at least 2",
                },
            },
        }
    }
}

/// Install the validator, creating `episodes` if needed
pub async fn apply_episode_validator(conn: &Connection) -> Result<()> {
    let db = conn.database();
    let existing = db.list_collection_names().await?;

    if existing.iter().any(|name| name == EPISODES) {
        db.run_command(doc! {
            "collMod": EPISODES,
            "validator": episode_validator(),
            "validationLevel": "strict",
            "validationAction": "error",
        })
        .await?;
        tracing::info!(collection = EPISODES, "Updated episode validator");
    } else {
        db.create_collection(EPISODES)
            .validator(episode_validator())
            .await?;
        tracing::info!(collection = EPISODES, "Created episodes with validator");
    }

    Ok(())
}

/// Client-side mirror of the validator
pub fn check_episode(episode: &Episode) -> Result<()> {
    match episode.duration {
        Some(minutes) if minutes < MIN_EPISODE_DURATION => Err(QuickstartError::Validation(
            format!(
                "Episode '{}' lasts {} minute(s), minimum is {}",
                episode.title, minutes, MIN_EPISODE_DURATION
            ),
        )),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::oid::ObjectId;

    #[test]
    fn test_validator_requires_minimum_duration() {
        let validator = episode_validator();
        let duration = validator
            .get_document("$jsonSchema")
            .and_then(|s| s.get_document("properties"))
            .and_then(|p| p.get_document("duration"))
            .unwrap();
        assert_eq!(duration.get_i32("minimum").unwrap(), 2);
    }

    #[test]
    fn test_validator_does_not_require_duration() {
        let schema = episode_validator();
        let schema = schema.get_document("$jsonSchema").unwrap();
        assert!(!schema.contains_key("required"));
    }

    #[test]
    fn test_check_episode_rejects_short() {
        let episode = Episode::new(ObjectId::new(), "Teaser", 1);
        let err = check_episode(&episode).unwrap_err();
        assert!(matches!(err, QuickstartError::Validation(_)));
    }

    #[test]
    fn test_check_episode_accepts_boundary_and_missing() {
        assert!(check_episode(&Episode::new(ObjectId::new(), "Short", 2)).is_ok());
        assert!(check_episode(&Episode::default()).is_ok());
    }
}

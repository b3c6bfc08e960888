//! Podcast catalogue documents
//!
//! Fields are loosely typed on the wire: anything unset is omitted when
//! serialising and defaulted when decoding.

use bson::{oid::ObjectId, Bson};
use serde::{de::Error as _, Deserialize, Deserializer, Serialize};

use crate::connection::{EPISODES, PODCASTS};
use crate::document::Document;

/// A show in the `podcasts` collection
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Podcast {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub title: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub author: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

impl Podcast {
    pub fn new(title: impl Into<String>, author: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            author: author.into(),
            ..Default::default()
        }
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }
}

impl Document for Podcast {
    fn collection_name() -> &'static str {
        PODCASTS
    }

    fn get_id(&self) -> Option<ObjectId> {
        self.id
    }

    fn set_id(&mut self, id: ObjectId) {
        self.id = Some(id);
    }
}

/// An episode in the `episodes` collection, referencing its podcast by id
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Episode {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub podcast: Option<ObjectId>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub title: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    /// Length in minutes
    #[serde(
        default,
        deserialize_with = "whole_i32",
        skip_serializing_if = "Option::is_none"
    )]
    pub duration: Option<i32>,
}

impl Episode {
    pub fn new(podcast: ObjectId, title: impl Into<String>, duration: i32) -> Self {
        Self {
            podcast: Some(podcast),
            title: title.into(),
            duration: Some(duration),
            ..Default::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

impl Document for Episode {
    fn collection_name() -> &'static str {
        EPISODES
    }

    fn get_id(&self) -> Option<ObjectId> {
        self.id
    }

    fn set_id(&mut self, id: ObjectId) {
        self.id = Some(id);
    }
}

/// An episode joined with its podcast by the `$lookup` + `$unwind` pipeline
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PodcastEpisode {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    #[serde(default)]
    pub podcast: Podcast,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub title: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(
        default,
        deserialize_with = "whole_i32",
        skip_serializing_if = "Option::is_none"
    )]
    pub duration: Option<i32>,
    #[serde(
        default,
        deserialize_with = "whole_i32",
        skip_serializing_if = "Option::is_none"
    )]
    pub publish_date: Option<i32>,
}

/// Summed episode length for one podcast, produced by `$group`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PodcastTotal {
    #[serde(rename = "_id")]
    pub podcast: Option<ObjectId>,
    #[serde(deserialize_with = "whole_i64")]
    pub total: i64,
}

/// Integer value of an int32, int64 or a double with no fractional part
///
/// Shells and GUI clients store numbers as doubles by default, and `$sum`
/// over doubles yields a double.
fn whole_number(value: &Bson) -> Option<i64> {
    match *value {
        Bson::Int32(n) => Some(i64::from(n)),
        Bson::Int64(n) => Some(n),
        Bson::Double(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => Some(f as i64),
        _ => None,
    }
}

fn whole_i32<'de, D>(deserializer: D) -> std::result::Result<Option<i32>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Bson>::deserialize(deserializer)? {
        None | Some(Bson::Null) => Ok(None),
        Some(value) => whole_number(&value)
            .and_then(|n| i32::try_from(n).ok())
            .map(Some)
            .ok_or_else(|| {
                D::Error::custom(format!("expected a 32-bit whole number, got {}", value))
            }),
    }
}

fn whole_i64<'de, D>(deserializer: D) -> std::result::Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Bson::deserialize(deserializer)?;
    whole_number(&value)
        .ok_or_else(|| D::Error::custom(format!("expected a whole number, got {}", value)))
}

//! Printing results to stdout

use anyhow::Result;
use bson::Document as BsonDocument;
use serde::Serialize;
use std::fmt::Debug;

/// Writes results either as bson/Debug text or as relaxed extended JSON
#[derive(Debug, Clone, Copy)]
pub struct Printer {
    json: bool,
}

impl Printer {
    pub fn new(json: bool) -> Self {
        Self { json }
    }

    /// Print a loose document
    pub fn document(&self, doc: &BsonDocument) -> Result<()> {
        if self.json {
            println!("{}", to_json(doc)?);
        } else {
            println!("{}", doc);
        }
        Ok(())
    }

    /// Print a list of loose documents, one per line
    pub fn documents(&self, docs: &[BsonDocument]) -> Result<()> {
        if self.json {
            println!("{}", to_json(&docs)?);
        } else {
            for doc in docs {
                println!("{}", doc);
            }
        }
        Ok(())
    }

    /// Print a typed value
    pub fn value<T: Serialize + Debug>(&self, value: &T) -> Result<()> {
        if self.json {
            println!("{}", to_json(value)?);
        } else {
            println!("{:#?}", value);
        }
        Ok(())
    }

    /// Print a status line; suppressed in JSON mode so stdout stays parseable
    pub fn line(&self, message: impl AsRef<str>) {
        if !self.json {
            println!("{}", message.as_ref());
        }
    }
}

/// Relaxed extended JSON, pretty-printed
pub fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    let bson = bson::to_bson(value)?;
    Ok(serde_json::to_string_pretty(&bson.into_relaxed_extjson())?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::{doc, oid::ObjectId};

    #[test]
    fn test_to_json_uses_extended_json_for_object_ids() {
        let id = ObjectId::parse_str("5e3b37e51c9d4400004117e6").unwrap();
        let json = to_json(&doc! { "_id": id, "duration": 25 }).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["_id"]["$oid"], "5e3b37e51c9d4400004117e6");
        assert_eq!(value["duration"], 25);
    }

    #[test]
    fn test_to_json_list() {
        let docs = vec![doc! { "a": 1 }, doc! { "a": 2 }];
        let json = to_json(&docs).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value.as_array().unwrap().len(), 2);
    }
}

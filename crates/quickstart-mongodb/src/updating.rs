//! Updating documents: field-level `$set` and full-document replace

use bson::{doc, oid::ObjectId, Bson, Document as BsonDocument};
use mongodb::results::UpdateResult;
use quickstart_common::{QuickstartError, Result};

use crate::connection::{Connection, PODCASTS};

/// Affected-count metadata returned by every update form
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateReport {
    pub matched: u64,
    pub modified: u64,
    pub upserted_id: Option<Bson>,
}

impl From<UpdateResult> for UpdateReport {
    fn from(result: UpdateResult) -> Self {
        Self {
            matched: result.matched_count,
            modified: result.modified_count,
            upserted_id: result.upserted_id,
        }
    }
}

/// `$set` update document for `fields`
pub fn set_update(fields: BsonDocument) -> BsonDocument {
    doc! { "$set": fields }
}

/// Set the author of the podcast with `id`
pub async fn set_author_by_id(
    conn: &Connection,
    id: ObjectId,
    author: &str,
) -> Result<UpdateReport> {
    let result = conn
        .collection(PODCASTS)
        .update_one(doc! { "_id": id }, set_update(doc! { "author": author }))
        .await?;

    tracing::debug!(%id, matched = result.matched_count, "Updated podcast author");
    Ok(result.into())
}

/// Set the author on every podcast titled `title`
pub async fn set_author_by_title(
    conn: &Connection,
    title: &str,
    author: &str,
) -> Result<UpdateReport> {
    set_fields_by_title(conn, title, doc! { "author": author }).await
}

/// Set arbitrary fields on every podcast titled `title`
///
/// Fields missing from a matched document are added.
pub async fn set_fields_by_title(
    conn: &Connection,
    title: &str,
    fields: BsonDocument,
) -> Result<UpdateReport> {
    if fields.is_empty() {
        return Err(QuickstartError::Query(
            "Update requires at least one field".to_string(),
        ));
    }

    let result = conn
        .collection(PODCASTS)
        .update_many(doc! { "title": title }, set_update(fields))
        .await?;

    tracing::debug!(
        title,
        matched = result.matched_count,
        modified = result.modified_count,
        "Updated podcasts by title"
    );
    Ok(result.into())
}

/// Replace the first podcast by `author` with `replacement`
///
/// The replacement must be a plain document; update operators are rejected.
pub async fn replace_by_author(
    conn: &Connection,
    author: &str,
    replacement: BsonDocument,
) -> Result<UpdateReport> {
    if let Some(key) = replacement.keys().find(|k| k.starts_with('$')) {
        return Err(QuickstartError::Query(format!(
            "Replacement document cannot contain operator '{}'",
            key
        )));
    }

    let result = conn
        .collection(PODCASTS)
        .replace_one(doc! { "author": author }, replacement)
        .await?;

    tracing::debug!(author, modified = result.modified_count, "Replaced podcast");
    Ok(result.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_update_wraps_fields() {
        let update =
            set_update(doc! { "author": "Nic Raboy", "website": "thepolyglotdeveloper.com" });
        assert_eq!(
            update,
            doc! { "$set": { "author": "Nic Raboy", "website": "thepolyglotdeveloper.com" } }
        );
    }

    #[test]
    fn test_update_report_default_is_zero() {
        let report = UpdateReport::default();
        assert_eq!(report.matched, 0);
        assert_eq!(report.modified, 0);
        assert!(report.upserted_id.is_none());
    }
}

//! Query builder for find operations

use bson::Document as BsonDocument;
use futures::TryStreamExt;
use mongodb::{options::FindOptions, Collection};
use quickstart_common::Result;
use serde::de::DeserializeOwned;

/// Sort direction for a single field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

impl SortOrder {
    fn as_i32(self) -> i32 {
        match self {
            SortOrder::Ascending => 1,
            SortOrder::Descending => -1,
        }
    }
}

/// Query builder for find operations
#[derive(Debug, Clone, Default)]
pub struct QueryBuilder {
    filter: BsonDocument,
    sort: Option<BsonDocument>,
    skip: Option<u64>,
    limit: Option<i64>,
}

impl QueryBuilder {
    /// Create a query matching every document
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the filter document
    pub fn filter(mut self, filter: BsonDocument) -> Self {
        self.filter = filter;
        self
    }

    /// Append a sort key; keys apply in the order they are added
    pub fn sort_by(mut self, field: &str, order: SortOrder) -> Self {
        self.sort
            .get_or_insert_with(BsonDocument::new)
            .insert(field, order.as_i32());
        self
    }

    /// Set the number of documents to skip
    pub fn skip(mut self, skip: u64) -> Self {
        self.skip = Some(skip);
        self
    }

    /// Set the maximum number of documents to return
    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Get the filter document
    pub fn get_filter(&self) -> &BsonDocument {
        &self.filter
    }

    /// Get the sort document
    pub fn get_sort(&self) -> Option<&BsonDocument> {
        self.sort.as_ref()
    }

    /// Driver options carrying sort, skip and limit
    pub fn find_options(&self) -> FindOptions {
        let mut options = FindOptions::default();
        options.sort = self.sort.clone();
        options.skip = self.skip;
        options.limit = self.limit;
        options
    }

    /// Execute the query and return all matching documents
    pub async fn fetch<T>(&self, collection: &Collection<T>) -> Result<Vec<T>>
    where
        T: DeserializeOwned + Unpin + Send + Sync,
    {
        tracing::debug!(
            collection = %collection.name(),
            filter = %self.filter,
            "Running find"
        );

        let cursor = collection
            .find(self.filter.clone())
            .with_options(self.find_options())
            .await?;

        Ok(cursor.try_collect().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;

    #[test]
    fn test_query_builder_new() {
        let qb = QueryBuilder::new();
        assert!(qb.get_filter().is_empty());
        assert!(qb.get_sort().is_none());
    }

    #[test]
    fn test_query_builder_filter() {
        let filter = doc! { "duration": 25 };
        let qb = QueryBuilder::new().filter(filter.clone());
        assert_eq!(qb.get_filter(), &filter);
    }

    #[test]
    fn test_sort_keys_keep_insertion_order() {
        let qb = QueryBuilder::new()
            .sort_by("duration", SortOrder::Descending)
            .sort_by("title", SortOrder::Ascending);
        let keys: Vec<&String> = qb.get_sort().unwrap().keys().collect();
        assert_eq!(keys, vec!["duration", "title"]);
        assert_eq!(qb.get_sort().unwrap().get_i32("duration").unwrap(), -1);
    }

    #[test]
    fn test_find_options_carry_paging() {
        let options = QueryBuilder::new()
            .filter(doc! { "duration": { "$gt": 24 } })
            .sort_by("duration", SortOrder::Descending)
            .skip(5)
            .limit(10)
            .find_options();

        assert_eq!(options.sort, Some(doc! { "duration": -1 }));
        assert_eq!(options.skip, Some(5));
        assert_eq!(options.limit, Some(10));
    }

    #[test]
    fn test_find_options_default_empty() {
        let options = QueryBuilder::new().find_options();
        assert!(options.sort.is_none());
        assert!(options.skip.is_none());
        assert!(options.limit.is_none());
    }
}

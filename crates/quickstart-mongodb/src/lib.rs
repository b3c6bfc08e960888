//! MongoDB walkthrough for quickstart
//!
//! Each module is one step of the podcast catalogue walkthrough against a
//! managed MongoDB deployment:
//! - `creating`: single and bulk inserts
//! - `retrieving`: find one, filtered and sorted finds
//! - `updating`: `$set` updates and full replaces
//! - `deleting`: deletes and collection drops
//! - `aggregation`: `$match`/`$group` and `$lookup`/`$unwind` pipelines
//! - `change_stream`: filtered change feed consumed on a background task
//! - `transaction`: manual and driver-retried transactions
//! - `schema`: the episode duration validator

pub mod aggregation;
pub mod change_stream;
pub mod connection;
pub mod creating;
pub mod deleting;
pub mod document;
pub mod models;
pub mod query;
pub mod retrieving;
pub mod schema;
pub mod transaction;
pub mod updating;

pub use change_stream::{ChangeFeed, EpisodeEvent, FeedHandle, FeedOptions, FeedSummary, StopReason};
pub use connection::{Connection, ConnectionConfig, DEFAULT_DATABASE, EPISODES, PODCASTS};
pub use document::Document;
pub use models::{Episode, Podcast, PodcastEpisode, PodcastTotal};
pub use query::{QueryBuilder, SortOrder};
pub use quickstart_common::{QuickstartError, Result};
pub use transaction::TransactionMode;
pub use updating::UpdateReport;

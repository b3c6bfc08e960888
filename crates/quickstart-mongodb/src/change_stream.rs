//! Change feed consumption on a background task
//!
//! The feed's cursor is moved into a single task registered with a
//! [`TaskTracker`]; the caller blocks on [`FeedHandle::wait`] until the task
//! has left its loop. The loop ends when the server closes the feed, a driver
//! error occurs, an optional event limit is reached, or the
//! [`CancellationToken`] fires.

use bson::{doc, Document as BsonDocument};
use futures::{Stream, TryStreamExt};
use mongodb::change_stream::{event::ChangeStreamEvent, ChangeStream};
use quickstart_common::{QuickstartError, Result};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use crate::connection::{Connection, EPISODES};

/// Raw change event on the `episodes` collection
pub type EpisodeEvent = ChangeStreamEvent<BsonDocument>;

/// Only inserts of episodes longer than `min_duration` minutes
pub fn long_insert_filter(min_duration: i32) -> BsonDocument {
    doc! {
        "$match": {
            "operationType": "insert",
            "fullDocument.duration": { "$gt": min_duration },
        }
    }
}

/// Why the consumer loop ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The server closed the feed
    Closed,
    /// The configured event limit was reached
    Limit,
    /// The cancellation token fired
    Cancelled,
}

/// Result of a finished consumer loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeedSummary {
    pub events: u64,
    pub reason: StopReason,
}

/// Loop settings for [`ChangeFeed::spawn`]
#[derive(Debug, Clone, Default)]
pub struct FeedOptions {
    /// Stop after this many events (default: run until closed or cancelled)
    pub limit: Option<u64>,
    /// Token that stops the loop between events
    pub cancel: CancellationToken,
}

/// An open change stream that has not started consuming yet
pub struct ChangeFeed {
    stream: ChangeStream<EpisodeEvent>,
}

impl std::fmt::Debug for ChangeFeed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChangeFeed").finish_non_exhaustive()
    }
}

impl ChangeFeed {
    /// Open a feed on `episodes`, filtered by `pipeline`
    ///
    /// The feed only reports changes made after it is opened.
    pub async fn open(conn: &Connection, pipeline: Vec<BsonDocument>) -> Result<Self> {
        let stream = conn.collection(EPISODES).watch().pipeline(pipeline).await?;
        tracing::info!(collection = EPISODES, "Opened change stream");
        Ok(Self { stream })
    }

    /// Move the cursor onto a background task that calls `handler` per event
    pub fn spawn<F>(self, options: FeedOptions, handler: F) -> FeedHandle
    where
        F: FnMut(EpisodeEvent) + Send + 'static,
    {
        spawn_consumer(self.stream, options, handler)
    }
}

fn spawn_consumer<S, T, F>(stream: S, options: FeedOptions, handler: F) -> FeedHandle
where
    S: Stream<Item = mongodb::error::Result<T>> + Unpin + Send + 'static,
    T: Send + 'static,
    F: FnMut(T) + Send + 'static,
{
    let tracker = TaskTracker::new();
    let cancel = options.cancel.clone();
    let task = tracker.spawn(consume(stream, options, handler));
    // No further tasks join this tracker; wait() returns once the loop exits
    tracker.close();

    FeedHandle {
        tracker,
        task,
        cancel,
    }
}

/// Join side of a running feed
#[derive(Debug)]
pub struct FeedHandle {
    tracker: TaskTracker,
    task: JoinHandle<Result<FeedSummary>>,
    cancel: CancellationToken,
}

impl FeedHandle {
    /// Ask the loop to stop after the event it is currently waiting on
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Block until the background task has finished
    pub async fn wait(self) -> Result<FeedSummary> {
        self.tracker.wait().await;
        self.task
            .await
            .map_err(|e| QuickstartError::Internal(format!("Change stream task failed: {}", e)))?
    }
}

async fn consume<S, T, F>(
    mut stream: S,
    options: FeedOptions,
    mut handler: F,
) -> Result<FeedSummary>
where
    S: Stream<Item = mongodb::error::Result<T>> + Unpin,
    F: FnMut(T),
{
    let mut events = 0u64;

    let reason = loop {
        if options.limit.is_some_and(|limit| events >= limit) {
            break StopReason::Limit;
        }

        // Cancellation wins over an event that is already buffered
        let next = tokio::select! {
            biased;
            _ = options.cancel.cancelled() => break StopReason::Cancelled,
            next = stream.try_next() => next,
        };

        match next {
            Ok(Some(event)) => {
                events += 1;
                tracing::debug!(events, "Change event");
                handler(event);
            }
            Ok(None) => break StopReason::Closed,
            Err(e) => {
                tracing::warn!(error = %e, events, "Change stream failed");
                return Err(e.into());
            }
        }
    };

    tracing::info!(events, ?reason, "Change stream consumer finished");
    Ok(FeedSummary { events, reason })
}

//! Session-scoped transactions
//!
//! Two forms are provided:
//! - [`run_manual`]: start session and transaction, run the body, commit on
//!   success and abort on failure. The body's error is surfaced unchanged.
//! - [`TransactionMode::Convenient`]: the driver's `and_run` helper, which
//!   also retries the body and the commit on errors the server labels
//!   transient. The retry policy belongs to the driver.

use bson::oid::ObjectId;
use futures::future::{BoxFuture, FutureExt};
use mongodb::{ClientSession, Collection};
use quickstart_common::{QuickstartError, Result};

use crate::connection::Connection;
use crate::models::{Episode, Podcast};

/// Which transaction API to drive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransactionMode {
    /// Explicit start / commit / abort
    #[default]
    Manual,
    /// Driver-managed `and_run` with transient-error retries
    Convenient,
}

/// Run `body` inside a transaction on a fresh session
///
/// Commits when the body succeeds. When it fails the transaction is aborted
/// and the body's error is returned; a failing abort is only logged.
pub async fn run_manual<R, F>(conn: &Connection, body: F) -> Result<R>
where
    F: for<'s> FnOnce(&'s mut ClientSession) -> BoxFuture<'s, Result<R>>,
{
    let mut session = conn.client().start_session().await?;
    session.start_transaction().await?;
    tracing::debug!("Started transaction");

    match body(&mut session).await {
        Ok(value) => {
            session.commit_transaction().await?;
            tracing::debug!("Committed transaction");
            Ok(value)
        }
        Err(err) => {
            tracing::warn!(error = %err, "Transaction body failed, aborting");
            if let Err(abort_err) = session.abort_transaction().await {
                tracing::warn!(error = %abort_err, "Abort failed");
            }
            Err(err)
        }
    }
}

/// Insert one podcast in its own transaction
pub async fn insert_podcast_manual(conn: &Connection, podcast: &Podcast) -> Result<ObjectId> {
    let podcasts = conn.podcasts();
    let mut podcast = podcast.clone();
    let id = *podcast.id.get_or_insert_with(ObjectId::new);

    run_manual(conn, move |session| {
        async move {
            podcasts.insert_one(&podcast).session(&mut *session).await?;
            Ok::<(), QuickstartError>(())
        }
        .boxed()
    })
    .await?;

    tracing::info!(%id, "Inserted podcast in transaction");
    Ok(id)
}

/// Collections and documents handed to each `and_run` attempt
struct PairWrite {
    podcasts: Collection<Podcast>,
    episodes: Collection<Episode>,
    podcast: Podcast,
    episode: Episode,
}

/// Insert a podcast and one of its episodes atomically
///
/// Ids are assigned before the transaction starts so the episode can refer to
/// the podcast and retried attempts write identical documents. Returns
/// `(podcast_id, episode_id)`. If either write fails, neither is visible.
pub async fn insert_podcast_with_episode(
    conn: &Connection,
    mode: TransactionMode,
    podcast: &Podcast,
    episode: &Episode,
) -> Result<(ObjectId, ObjectId)> {
    let mut podcast = podcast.clone();
    let mut episode = episode.clone();
    let podcast_id = *podcast.id.get_or_insert_with(ObjectId::new);
    let episode_id = *episode.id.get_or_insert_with(ObjectId::new);
    episode.podcast = Some(podcast_id);

    let write = PairWrite {
        podcasts: conn.podcasts(),
        episodes: conn.episodes(),
        podcast,
        episode,
    };

    match mode {
        TransactionMode::Manual => {
            run_manual(conn, move |session| {
                async move {
                    write.podcasts.insert_one(&write.podcast).session(&mut *session).await?;
                    write.episodes.insert_one(&write.episode).session(&mut *session).await?;
                    Ok::<(), QuickstartError>(())
                }
                .boxed()
            })
            .await?;
        }
        TransactionMode::Convenient => {
            let mut session = conn.client().start_session().await?;
            session
                .start_transaction()
                .and_run(write, |session, write| {
                    async move {
                        write.podcasts.insert_one(&write.podcast).session(&mut *session).await?;
                        write.episodes.insert_one(&write.episode).session(&mut *session).await?;
                        Ok::<(), mongodb::error::Error>(())
                    }
                    .boxed()
                })
                .await?;
        }
    }

    tracing::info!(%podcast_id, %episode_id, ?mode, "Committed podcast and episode");
    Ok((podcast_id, episode_id))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_mode_is_manual() {
        assert_eq!(TransactionMode::default(), TransactionMode::Manual);
    }
}

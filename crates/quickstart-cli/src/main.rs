//! quickstart - podcast catalogue walkthrough against MongoDB
//!
//! Usage:
//!   quickstart create                         Insert a podcast and two episodes
//!   quickstart retrieve                       Find one, find by duration, sorted find
//!   quickstart update [--id HEX]              $set by id, by title, add fields, replace
//!   quickstart delete                         Delete one, delete many, drop collections
//!   quickstart aggregate [--podcast-id HEX]   $match/$group and $lookup/$unwind
//!   quickstart watch [--min-duration 30]      Print long episode inserts until Ctrl-C
//!   quickstart transact [--mode convenient]   Insert inside a transaction
//!   quickstart schema                         Install the episode duration validator
//!
//! The connection string comes from --uri or ATLAS_URI (a .env file is read).

mod config;
mod output;

use anyhow::{bail, Context, Result};
use bson::oid::ObjectId;
use clap::{Parser, Subcommand, ValueEnum};
use quickstart_mongodb::{
    aggregation, change_stream, creating, deleting, retrieving, schema, transaction, updating,
    ChangeFeed, Connection, Episode, FeedOptions, Podcast, TransactionMode,
};

use crate::config::Settings;
use crate::output::Printer;

#[derive(Parser, Debug)]
#[command(name = "quickstart")]
#[command(about = "Podcast catalogue walkthrough against MongoDB", long_about = None)]
#[command(version)]
struct Cli {
    /// MongoDB connection string (default: $ATLAS_URI)
    #[arg(long, global = true)]
    uri: Option<String>,

    /// Database name (default: $QUICKSTART_DATABASE or "quickstart")
    #[arg(long, global = true)]
    database: Option<String>,

    /// Log level (trace, debug, info, warn, error); RUST_LOG takes precedence
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Print results as relaxed extended JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Insert the sample podcast and its episodes
    Create,

    /// Query podcasts and episodes
    Retrieve {
        /// Exact episode length to match
        #[arg(long, default_value = "25")]
        duration: i32,

        /// Lower bound (exclusive) for the sorted query
        #[arg(long, default_value = "24")]
        longer_than: i32,
    },

    /// Run every update form against the sample podcast
    Update {
        /// Podcast id for the single-document update (default: first podcast)
        #[arg(long)]
        id: Option<String>,
    },

    /// Delete sample documents and drop both collections
    Delete {
        /// Keep the collections after deleting documents
        #[arg(long)]
        keep_collections: bool,
    },

    /// Run the aggregation pipelines
    Aggregate {
        /// Podcast to total up (default: first podcast)
        #[arg(long)]
        podcast_id: Option<String>,
    },

    /// Print inserts of long episodes as they happen
    Watch {
        /// Only report episodes longer than this many minutes
        #[arg(long, default_value = "30")]
        min_duration: i32,

        /// Stop after this many events
        #[arg(long)]
        limit: Option<u64>,
    },

    /// Insert inside a transaction
    Transact {
        /// Transaction API to use
        #[arg(long, value_enum, default_value_t = ModeArg::Manual)]
        mode: ModeArg,

        /// Also insert an episode of this length in the same transaction
        /// (below 2 is rejected by the validator and rolls everything back)
        #[arg(long)]
        episode_duration: Option<i32>,
    },

    /// Install the episode duration validator
    Schema,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum ModeArg {
    /// Explicit start, commit and abort
    Manual,
    /// Driver-managed with transient-error retries
    Convenient,
}

impl From<ModeArg> for TransactionMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Manual => TransactionMode::Manual,
            ModeArg::Convenient => TransactionMode::Convenient,
        }
    }
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_logging(&cli.log_level)?;

    let settings = Settings::resolve(cli.uri.clone(), cli.database.clone())?;
    let printer = Printer::new(cli.json);

    let rt = tokio::runtime::Runtime::new().context("Failed to create tokio runtime")?;

    rt.block_on(async {
        let conn = Connection::connect(settings.connection_config())
            .await
            .context("Failed to connect to MongoDB")?;

        let result = run_command(&conn, cli.command, printer).await;
        conn.shutdown().await;
        result
    })
}

async fn run_command(conn: &Connection, command: Commands, printer: Printer) -> Result<()> {
    match command {
        Commands::Create => run_create(conn, printer).await,
        Commands::Retrieve {
            duration,
            longer_than,
        } => run_retrieve(conn, printer, duration, longer_than).await,
        Commands::Update { id } => run_update(conn, printer, id).await,
        Commands::Delete { keep_collections } => run_delete(conn, printer, keep_collections).await,
        Commands::Aggregate { podcast_id } => run_aggregate(conn, printer, podcast_id).await,
        Commands::Watch {
            min_duration,
            limit,
        } => run_watch(conn, printer, min_duration, limit).await,
        Commands::Transact {
            mode,
            episode_duration,
        } => run_transact(conn, printer, mode.into(), episode_duration).await,
        Commands::Schema => {
            schema::apply_episode_validator(conn).await?;
            printer.line(format!(
                "Episodes now require a duration of at least {} minutes",
                schema::MIN_EPISODE_DURATION
            ));
            Ok(())
        }
    }
}

async fn run_create(conn: &Connection, printer: Printer) -> Result<()> {
    let report = creating::seed(conn).await.context("Failed to seed catalogue")?;
    printer.line(format!("Inserted podcast {}", report.podcast_id));
    printer.line(format!(
        "Inserted {} documents into episode collection!",
        report.episode_ids.len()
    ));
    printer.value(&report.episode_ids)?;
    Ok(())
}

async fn run_retrieve(
    conn: &Connection,
    printer: Printer,
    duration: i32,
    longer_than: i32,
) -> Result<()> {
    match retrieving::find_first_podcast(conn).await? {
        Some(podcast) => printer.document(&podcast)?,
        None => printer.line("No podcasts found"),
    }

    let episodes = retrieving::find_episodes_by_duration(conn, duration).await?;
    printer.documents(&episodes)?;

    let episodes = retrieving::find_episodes_longer_than(conn, longer_than).await?;
    printer.documents(&episodes)?;
    Ok(())
}

async fn run_update(conn: &Connection, printer: Printer, id: Option<String>) -> Result<()> {
    let title = creating::sample_podcast().title;
    let id = podcast_id_or_first(conn, id).await?;

    let result = updating::set_author_by_id(conn, id, "Nic Raboy").await?;
    printer.line(format!("Updated {} Documents!", result.matched));

    let result = updating::set_author_by_title(conn, &title, "Nicolas Raboy").await?;
    printer.line(format!("Updated {} Documents!", result.modified));

    let result = updating::set_fields_by_title(
        conn,
        &title,
        bson::doc! { "author": "Nic Raboy", "website": "thepolyglotdeveloper.com" },
    )
    .await?;
    printer.line(format!("Updated {} Documents!", result.modified));

    let result = updating::replace_by_author(
        conn,
        "Nic Raboy",
        bson::doc! { "title": "The Nic Raboy Show", "author": "Nicolas Raboy" },
    )
    .await?;
    printer.line(format!("Replaced {} Documents!", result.modified));
    Ok(())
}

async fn run_delete(conn: &Connection, printer: Printer, keep_collections: bool) -> Result<()> {
    let title = creating::sample_podcast().title;

    let deleted = deleting::delete_podcast_by_title(conn, &title).await?;
    printer.line(format!("DeleteOne removed {} document(s)", deleted));

    let deleted = deleting::delete_episodes_by_duration(conn, 25).await?;
    printer.line(format!("DeleteMany removed {} document(s)", deleted));

    if !keep_collections {
        deleting::drop_collections(conn).await?;
        printer.line("Dropped podcasts and episodes");
    }
    Ok(())
}

async fn run_aggregate(
    conn: &Connection,
    printer: Printer,
    podcast_id: Option<String>,
) -> Result<()> {
    let id = podcast_id_or_first(conn, podcast_id).await?;

    let totals = aggregation::total_duration(conn, id).await?;
    printer.value(&totals)?;

    let loaded = aggregation::episodes_with_podcast(conn).await?;
    printer.documents(&loaded)?;

    let typed = aggregation::episodes_with_podcast_typed(conn).await?;
    printer.value(&typed)?;
    Ok(())
}

async fn run_watch(
    conn: &Connection,
    printer: Printer,
    min_duration: i32,
    limit: Option<u64>,
) -> Result<()> {
    let feed = ChangeFeed::open(conn, vec![change_stream::long_insert_filter(min_duration)])
        .await
        .context("Failed to open change stream")?;

    let options = FeedOptions {
        limit,
        ..Default::default()
    };
    let on_interrupt = options.cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Interrupted, closing change stream");
            on_interrupt.cancel();
        }
    });

    printer.line(format!(
        "Watching for episodes longer than {} minutes (Ctrl-C to stop)",
        min_duration
    ));

    let handle = feed.spawn(options, move |event| {
        if let Err(e) = printer.value(&event) {
            tracing::warn!(error = %e, "Failed to print change event");
        }
    });

    let summary = handle.wait().await?;
    printer.line(format!("Saw {} event(s)", summary.events));
    Ok(())
}

async fn run_transact(
    conn: &Connection,
    printer: Printer,
    mode: TransactionMode,
    episode_duration: Option<i32>,
) -> Result<()> {
    let podcast = Podcast::new("Transactions for All", "Nic Raboy");

    if mode == TransactionMode::Manual && episode_duration.is_none() {
        let id = transaction::insert_podcast_manual(conn, &podcast).await?;
        printer.line(format!("Committed podcast {}", id));
        return Ok(());
    }

    let episode = Episode {
        title: "Transactions in Practice".to_string(),
        duration: Some(episode_duration.unwrap_or(30)),
        ..Default::default()
    };
    if let Err(e) = schema::check_episode(&episode) {
        tracing::warn!(error = %e, "Episode will be rejected by the server validator");
    }

    let (podcast_id, episode_id) =
        transaction::insert_podcast_with_episode(conn, mode, &podcast, &episode)
            .await
            .context("Transaction aborted")?;
    printer.line(format!(
        "Committed podcast {} with episode {}",
        podcast_id, episode_id
    ));
    Ok(())
}

/// Parse `id`, or fall back to the first podcast in the collection
async fn podcast_id_or_first(conn: &Connection, id: Option<String>) -> Result<ObjectId> {
    if let Some(hex) = id {
        return ObjectId::parse_str(&hex).with_context(|| format!("Invalid podcast id '{}'", hex));
    }

    let Some(first) = retrieving::find_first_podcast(conn).await? else {
        bail!("No podcasts found; run `quickstart create` first");
    };
    first
        .get_object_id("_id")
        .context("First podcast has no ObjectId")
}

/// Initialize logging based on log level
fn init_logging(level: &str) -> Result<()> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    // stdout carries results, logs go to stderr
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .try_init()
        .ok(); // Ignore error if already initialized

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "quickstart",
            "retrieve",
            "--duration",
            "30",
            "--database",
            "scratch",
            "--json",
        ])
        .unwrap();
        assert_eq!(cli.database.as_deref(), Some("scratch"));
        assert!(cli.json);
        match cli.command {
            Commands::Retrieve {
                duration,
                longer_than,
            } => {
                assert_eq!(duration, 30);
                assert_eq!(longer_than, 24);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_watch_defaults() {
        let cli = Cli::try_parse_from(["quickstart", "watch"]).unwrap();
        match cli.command {
            Commands::Watch {
                min_duration,
                limit,
            } => {
                assert_eq!(min_duration, 30);
                assert!(limit.is_none());
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_transact_mode() {
        let cli = Cli::try_parse_from([
            "quickstart",
            "transact",
            "--mode",
            "convenient",
            "--episode-duration",
            "1",
        ])
        .unwrap();
        match cli.command {
            Commands::Transact {
                mode,
                episode_duration,
            } => {
                assert_eq!(TransactionMode::from(mode), TransactionMode::Convenient);
                assert_eq!(episode_duration, Some(1));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_unknown_mode_rejected() {
        assert!(Cli::try_parse_from(["quickstart", "transact", "--mode", "eventual"]).is_err());
    }

    #[test]
    fn test_log_level_default() {
        let cli = Cli::try_parse_from(["quickstart", "schema"]).unwrap();
        assert_eq!(cli.log_level, "info");
        assert!(cli.uri.is_none());
    }
}

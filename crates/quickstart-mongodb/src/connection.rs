//! MongoDB connection management with a fixed connection deadline

use bson::{doc, Document as BsonDocument};
use mongodb::{
    options::{ClientOptions, ServerApi, ServerApiVersion},
    Client, Collection, Database,
};
use quickstart_common::{QuickstartError, Result};
use std::time::Duration;

use crate::models::{Episode, Podcast};

/// Database used by every walkthrough step unless overridden
pub const DEFAULT_DATABASE: &str = "quickstart";

/// Collection holding podcasts
pub const PODCASTS: &str = "podcasts";

/// Collection holding episodes
pub const EPISODES: &str = "episodes";

/// Connection configuration
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// MongoDB connection string (`mongodb://` or `mongodb+srv://`)
    pub uri: String,
    /// Database to work in (default: "quickstart")
    pub database: String,
    /// Deadline for connection establishment and server selection (default: 10s)
    pub connect_timeout: Duration,
    /// Application name for server logs
    pub app_name: Option<String>,
}

impl ConnectionConfig {
    /// Create a configuration for `uri` with default settings
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            database: DEFAULT_DATABASE.to_string(),
            connect_timeout: Duration::from_secs(10),
            app_name: Some("quickstart".to_string()),
        }
    }

    /// Use a different database
    pub fn database(mut self, name: impl Into<String>) -> Self {
        self.database = name.into();
        self
    }

    /// Override the connection deadline
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }
}

/// Client handle plus the working database
#[derive(Debug, Clone)]
pub struct Connection {
    client: Client,
    database: Database,
}

impl Connection {
    /// Connect and verify the deployment answers a ping within the deadline
    ///
    /// The deadline covers URI resolution (SRV and TXT lookups for
    /// `mongodb+srv://`), client construction and the ping.
    pub async fn connect(config: ConnectionConfig) -> Result<Self> {
        if config.uri.trim().is_empty() {
            return Err(QuickstartError::Config(
                "Connection string is empty".to_string(),
            ));
        }

        let deadline = config.connect_timeout;
        match tokio::time::timeout(deadline, Self::establish(config)).await {
            Ok(result) => result,
            Err(_) => Err(QuickstartError::Timeout(format!(
                "No response from MongoDB within {:?}",
                deadline
            ))),
        }
    }

    async fn establish(config: ConnectionConfig) -> Result<Self> {
        let mut client_options = ClientOptions::parse(config.uri.as_str()).await?;
        client_options.connect_timeout = Some(config.connect_timeout);
        client_options.server_selection_timeout = Some(config.connect_timeout);
        if let Some(app) = config.app_name {
            client_options.app_name = Some(app);
        }

        // Set stable API version for compatibility
        let server_api = ServerApi::builder().version(ServerApiVersion::V1).build();
        client_options.server_api = Some(server_api);

        let client = Client::with_options(client_options)?;
        let database = client.database(&config.database);
        let connection = Self { client, database };
        connection.ping().await?;

        tracing::debug!(database = %config.database, "Connected to MongoDB");
        Ok(connection)
    }

    /// Get a reference to the database
    pub fn database(&self) -> &Database {
        &self.database
    }

    /// Get a reference to the client
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Get a collection by name (returns untyped BsonDocument collection)
    pub fn collection(&self, name: &str) -> Collection<BsonDocument> {
        self.database.collection(name)
    }

    /// Typed `podcasts` collection
    pub fn podcasts(&self) -> Collection<Podcast> {
        self.database.collection(PODCASTS)
    }

    /// Typed `episodes` collection
    pub fn episodes(&self) -> Collection<Episode> {
        self.database.collection(EPISODES)
    }

    /// Check the deployment is reachable
    ///
    /// Server selection running out of time maps to `Timeout`, other
    /// failures keep their driver classification.
    pub async fn ping(&self) -> Result<()> {
        self.database.run_command(doc! { "ping": 1 }).await?;
        Ok(())
    }

    /// Drop the working database (tests use a throwaway one)
    pub async fn drop_database(&self) -> Result<()> {
        self.database.drop().await?;
        Ok(())
    }

    /// Close the client, waiting for in-flight operations and sessions to end
    pub async fn shutdown(self) {
        self.client.shutdown().await;
        tracing::debug!("Disconnected from MongoDB");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ConnectionConfig::new("mongodb://localhost:27017");
        assert_eq!(config.database, "quickstart");
        assert_eq!(config.connect_timeout, Duration::from_secs(10));
        assert_eq!(config.app_name, Some("quickstart".to_string()));
    }

    #[test]
    fn test_config_overrides() {
        let config = ConnectionConfig::new("mongodb://localhost:27017")
            .database("scratch")
            .connect_timeout(Duration::from_secs(2));
        assert_eq!(config.database, "scratch");
        assert_eq!(config.connect_timeout, Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_empty_uri_is_config_error() {
        let err = Connection::connect(ConnectionConfig::new("  ")).await.unwrap_err();
        assert!(matches!(err, QuickstartError::Config(_)));
    }

    #[tokio::test]
    async fn test_malformed_uri_is_rejected() {
        let err = Connection::connect(ConnectionConfig::new("not-a-mongodb-uri"))
            .await
            .unwrap_err();
        assert!(!matches!(err, QuickstartError::Timeout(_)));
    }

    #[tokio::test]
    async fn test_unreachable_server_times_out() {
        let config = ConnectionConfig::new("mongodb://127.0.0.1:1/?directConnection=true")
            .connect_timeout(Duration::from_millis(300));
        let started = std::time::Instant::now();
        let err = Connection::connect(config).await.unwrap_err();
        assert!(matches!(err, QuickstartError::Timeout(_)), "got {:?}", err);
        assert!(started.elapsed() < Duration::from_secs(5));
    }
}

//! Error types for quickstart

use thiserror::Error;

/// Result type alias for quickstart operations
pub type Result<T> = std::result::Result<T, QuickstartError>;

/// Unified error type for all quickstart operations
#[derive(Error, Debug, Clone)]
pub enum QuickstartError {
    #[error("MongoDB error: {0}")]
    MongoDB(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),

    #[error("Query error: {0}")]
    Query(String),

    #[error("Validation error: {0}")]
    Validation(String),

    /// Connection deadline or server selection ran out of time
    #[error("Timeout: {0}")]
    Timeout(String),

    /// Error labelled transient by the server inside a transaction
    #[error("Transaction error: {0}")]
    Transaction(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<serde_json::Error> for QuickstartError {
    fn from(err: serde_json::Error) -> Self {
        QuickstartError::Serialization(err.to_string())
    }
}

// MongoDB-specific error conversions (when mongodb-errors feature is enabled)
#[cfg(feature = "mongodb-errors")]
impl From<mongodb::error::Error> for QuickstartError {
    fn from(err: mongodb::error::Error) -> Self {
        use mongodb::error::{ErrorKind, TRANSIENT_TRANSACTION_ERROR};

        if err.contains_label(TRANSIENT_TRANSACTION_ERROR) {
            return QuickstartError::Transaction(err.to_string());
        }

        match err.kind.as_ref() {
            ErrorKind::ServerSelection { .. } => QuickstartError::Timeout(err.to_string()),
            ErrorKind::InvalidArgument { .. } => QuickstartError::Query(err.to_string()),
            ErrorKind::BsonSerialization(_) => QuickstartError::Serialization(err.to_string()),
            ErrorKind::BsonDeserialization(_) => {
                QuickstartError::Deserialization(err.to_string())
            }
            ErrorKind::Io(_) | ErrorKind::DnsResolve { .. } => {
                QuickstartError::Connection(err.to_string())
            }
            _ => QuickstartError::MongoDB(err.to_string()),
        }
    }
}

#[cfg(feature = "mongodb-errors")]
impl From<bson::ser::Error> for QuickstartError {
    fn from(err: bson::ser::Error) -> Self {
        QuickstartError::Serialization(format!("BSON serialization error: {}", err))
    }
}

#[cfg(feature = "mongodb-errors")]
impl From<bson::de::Error> for QuickstartError {
    fn from(err: bson::de::Error) -> Self {
        QuickstartError::Deserialization(format!("BSON deserialization error: {}", err))
    }
}

#[cfg(feature = "mongodb-errors")]
impl From<bson::oid::Error> for QuickstartError {
    fn from(err: bson::oid::Error) -> Self {
        QuickstartError::Query(format!("Invalid ObjectId: {}", err))
    }
}

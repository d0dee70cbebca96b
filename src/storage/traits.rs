//! Entity Storage Traits
//!
//! Defines the contract every entity storage backend satisfies, the error
//! taxonomy shared by all backends, and the value types that cross the
//! engine/backend boundary.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Database selected when the caller supplies no namespace.
pub const DEFAULT_DATABASE_NAME: &str = "goworld";

/// Default bound applied to connecting and to every storage operation.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Server error code reported when `maxTimeMS` expires.
pub(crate) const MAX_TIME_MS_EXPIRED: i32 = 50;

/// Canonical entity state.
///
/// Scalars, ordered sequences and string-keyed mappings
/// (`serde_json::Map`, the canonical mapping type). Every read returns this
/// shape regardless of the backend that produced it.
pub type GenericValue = serde_json::Value;

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Error types for storage operations
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Cannot establish or use the store connection
    #[error("Connection error: {0}")]
    Connection(String),

    /// No document for the given type and id
    #[error("Entity not found: {type_name}/{id}")]
    NotFound {
        /// Entity type (collection) that was searched
        type_name: String,
        /// Entity id that was missing
        id: EntityId,
    },

    /// Operation exceeded its bound
    #[error("Timeout: {operation} did not complete within {after:?}")]
    Timeout {
        /// Operation that was cut off ("connect", "read", ...)
        operation: String,
        /// Bound that elapsed
        after: Duration,
    },

    /// Stored document does not have the expected shape
    #[error("Decode error: {0}")]
    Decode(String),

    /// Value could not be converted into a storable document
    #[error("Encode error: {0}")]
    Encode(String),

    /// Iteration exhausted
    #[error("End of data")]
    EndOfData,

    /// Backend used after close
    #[error("Storage backend is closed")]
    Closed,

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// IO error during storage operation
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic backend error
    #[error("Backend error: {0}")]
    Backend(String),
}

impl StorageError {
    /// Create a not found error for an entity
    pub fn not_found(type_name: &str, id: &EntityId) -> Self {
        Self::NotFound {
            type_name: type_name.to_string(),
            id: id.clone(),
        }
    }

    /// Whether this is the document-level "missing" condition
    pub fn is_not_found(&self) -> bool {
        matches!(self, StorageError::NotFound { .. })
    }

    /// Whether the caller may reasonably retry the same operation
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            StorageError::Connection(_) | StorageError::Timeout { .. }
        )
    }

    /// Whether this error marks a naturally exhausted stream
    pub fn is_end_of_data(&self) -> bool {
        match self {
            StorageError::EndOfData => true,
            StorageError::Io(e) => e.kind() == std::io::ErrorKind::UnexpectedEof,
            _ => false,
        }
    }

    /// Create a timeout error for an operation
    pub fn timed_out(operation: &str, after: Duration) -> Self {
        Self::Timeout {
            operation: operation.to_string(),
            after,
        }
    }

    /// Classify a driver error raised by `operation`, which was bounded by `after`.
    ///
    /// A dropped socket, even mid-reply, is a connection failure and never
    /// the end-of-data sentinel.
    pub fn from_driver(err: mongodb::error::Error, operation: &str, after: Duration) -> Self {
        use mongodb::error::ErrorKind;

        match err.kind.as_ref() {
            ErrorKind::Io(io) if io.kind() == std::io::ErrorKind::TimedOut => {
                Self::timed_out(operation, after)
            }
            ErrorKind::Command(cmd) if cmd.code == MAX_TIME_MS_EXPIRED => {
                Self::timed_out(operation, after)
            }
            ErrorKind::Io(_)
            | ErrorKind::ServerSelection { .. }
            | ErrorKind::ConnectionPoolCleared { .. }
            | ErrorKind::DnsResolve { .. }
            | ErrorKind::Authentication { .. }
            | ErrorKind::InvalidTlsConfig { .. } => StorageError::Connection(err.to_string()),
            ErrorKind::BsonDeserialization(_) | ErrorKind::InvalidResponse { .. } => {
                StorageError::Decode(err.to_string())
            }
            ErrorKind::BsonSerialization(_) => StorageError::Encode(err.to_string()),
            ErrorKind::Shutdown => StorageError::Closed,
            _ => StorageError::Backend(err.to_string()),
        }
    }
}

/// Unique identifier of an entity within its type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(String);

impl EntityId {
    /// Wrap a raw id
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the id as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume the id, returning the inner string
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for EntityId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for EntityId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for EntityId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Connection and operation bounds for a backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageOptions {
    /// Bound for establishing the connection and selecting a server
    pub connect_timeout: Duration,
    /// Bound for each write/read/list/exists/delete
    pub operation_timeout: Duration,
    /// Application name reported to the server
    pub app_name: Option<String>,
}

impl Default for StorageOptions {
    fn default() -> Self {
        Self {
            connect_timeout: DEFAULT_TIMEOUT,
            operation_timeout: DEFAULT_TIMEOUT,
            app_name: None,
        }
    }
}

impl StorageOptions {
    /// Reject bounds that would fail every operation immediately.
    pub fn validate(&self) -> StorageResult<()> {
        if self.connect_timeout.is_zero() {
            return Err(StorageError::Configuration(
                "connect timeout must be greater than zero".into(),
            ));
        }
        if self.operation_timeout.is_zero() {
            return Err(StorageError::Configuration(
                "operation timeout must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}

/// Core trait for entity storage backends
///
/// Entities are grouped by type name (one collection per type) and keyed by
/// [`EntityId`]. Implementations are shared across tasks, so every method
/// takes `&self`.
#[async_trait]
pub trait EntityStorage: Send + Sync {
    /// Get the backend type name (e.g., "mongodb", "memory")
    fn backend_type(&self) -> &'static str;

    /// Check if the backend is available/connected
    async fn is_available(&self) -> bool;

    /// Insert or fully replace the state of one entity
    async fn write(&self, type_name: &str, id: &EntityId, value: &GenericValue)
        -> StorageResult<()>;

    /// Read the normalized state of one entity
    ///
    /// Fails with [`StorageError::NotFound`] when no document exists.
    async fn read(&self, type_name: &str, id: &EntityId) -> StorageResult<GenericValue>;

    /// List every entity id stored under a type, in no particular order
    async fn list(&self, type_name: &str) -> StorageResult<Vec<EntityId>>;

    /// Check whether an entity is stored
    async fn exists(&self, type_name: &str, id: &EntityId) -> StorageResult<bool>;

    /// Remove one entity; removing a missing entity succeeds
    async fn delete(&self, type_name: &str, id: &EntityId) -> StorageResult<()>;

    /// Release the connection. Later operations fail with [`StorageError::Closed`].
    async fn close(&self);

    /// Classify an error as the end-of-data sentinel
    fn is_end_of_data(&self, err: &StorageError) -> bool {
        err.is_end_of_data()
    }
}

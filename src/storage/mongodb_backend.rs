//! MongoDB/DocumentDB Entity Storage Backend
//!
//! Stores each entity type in its own collection of one database. Documents
//! are laid out as `{_id: <entity id>, data: <entity state>}`.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use entity_storage::storage::{EntityId, EntityStorage, MongoEntityStorage};
//! use serde_json::json;
//!
//! async fn example() -> anyhow::Result<()> {
//!     let storage = MongoEntityStorage::open("mongodb://localhost:27017", "").await?;
//!
//!     let id = EntityId::from("p1");
//!     storage.write("Player", &id, &json!({"hp": 100})).await?;
//!     let state = storage.read("Player", &id).await?;
//!     assert_eq!(state["hp"], 100);
//!
//!     storage.close().await;
//!     Ok(())
//! }
//! ```

use async_trait::async_trait;
use futures_util::TryStreamExt;
use mongodb::{
    bson::{doc, Document, RawDocumentBuf},
    options::ClientOptions,
    Client, Collection, Database,
};
use std::future::IntoFuture;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::{debug, info, warn};

use super::normalize::{entity_data, entity_document, entity_id, ID_FIELD};
use super::traits::{
    EntityId, EntityStorage, GenericValue, StorageError, StorageOptions, StorageResult,
    DEFAULT_DATABASE_NAME,
};

/// MongoDB/DocumentDB entity storage backend
///
/// The client is internally pooled and safe to share; this type adds no
/// locking of its own. Wrap it in an `Arc` to use it from many tasks.
pub struct MongoEntityStorage {
    client: Client,
    database: Database,
    database_name: String,
    operation_timeout: Duration,
    closed: AtomicBool,
}

impl MongoEntityStorage {
    /// Connect with default options (10 second bounds).
    ///
    /// # Arguments
    /// * `connection_string` - MongoDB/DocumentDB connection string
    /// * `database` - Database name; empty selects `"goworld"`
    pub async fn open(connection_string: &str, database: &str) -> StorageResult<Self> {
        Self::open_with_options(connection_string, database, StorageOptions::default()).await
    }

    /// Connect and verify the server answers a ping within `connect_timeout`.
    ///
    /// Parsing the connection string (including SRV/TXT lookups) and the
    /// ping share that bound. Fails with [`StorageError::Connection`] or
    /// [`StorageError::Timeout`]; no half-initialized backend is ever
    /// returned. Zero bounds are rejected with
    /// [`StorageError::Configuration`].
    pub async fn open_with_options(
        connection_string: &str,
        database: &str,
        options: StorageOptions,
    ) -> StorageResult<Self> {
        options.validate()?;
        debug!("Connecting to MongoDB ...");

        let mut client_options = bounded(
            "connect",
            options.connect_timeout,
            ClientOptions::parse(connection_string),
        )
        .await
        .map_err(connect_error)?;
        client_options.connect_timeout = Some(options.connect_timeout);
        client_options.server_selection_timeout = Some(options.connect_timeout);
        if options.app_name.is_some() {
            client_options.app_name = options.app_name.clone();
        }

        let client = Client::with_options(client_options)
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        let database_name = if database.is_empty() {
            DEFAULT_DATABASE_NAME.to_string()
        } else {
            database.to_string()
        };
        let db = client.database(&database_name);

        bounded(
            "connect",
            options.connect_timeout,
            db.run_command(doc! { "ping": 1 }),
        )
        .await
        .map_err(connect_error)?;

        info!(database = %database_name, "Connected to MongoDB");

        Ok(Self {
            client,
            database: db,
            database_name,
            operation_timeout: options.operation_timeout,
            closed: AtomicBool::new(false),
        })
    }

    /// Name of the selected database
    pub fn database_name(&self) -> &str {
        &self.database_name
    }

    /// Get the MongoDB client (for advanced operations)
    pub fn client(&self) -> &Client {
        &self.client
    }

    fn collection(&self, type_name: &str) -> Collection<Document> {
        self.database.collection::<Document>(type_name)
    }

    fn raw_collection(&self, type_name: &str) -> Collection<RawDocumentBuf> {
        self.database.collection::<RawDocumentBuf>(type_name)
    }

    fn ensure_open(&self) -> StorageResult<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(StorageError::Closed);
        }
        Ok(())
    }
}

/// Run a driver operation, failing with a timeout once `after` elapses.
async fn bounded<T, F>(operation: &str, after: Duration, op: F) -> StorageResult<T>
where
    F: IntoFuture<Output = mongodb::error::Result<T>>,
{
    match tokio::time::timeout(after, op.into_future()).await {
        Ok(result) => result.map_err(|e| StorageError::from_driver(e, operation, after)),
        Err(_) => Err(StorageError::timed_out(operation, after)),
    }
}

/// Any failure while opening, other than running out of time, is a
/// connection failure.
fn connect_error(err: StorageError) -> StorageError {
    match err {
        StorageError::Timeout { .. } | StorageError::Connection(_) => err,
        other => StorageError::Connection(other.to_string()),
    }
}

#[async_trait]
impl EntityStorage for MongoEntityStorage {
    fn backend_type(&self) -> &'static str {
        "mongodb"
    }

    async fn is_available(&self) -> bool {
        if self.ensure_open().is_err() {
            return false;
        }
        bounded(
            "ping",
            self.operation_timeout,
            self.database.run_command(doc! { "ping": 1 }),
        )
        .await
        .is_ok()
    }

    async fn write(
        &self,
        type_name: &str,
        id: &EntityId,
        value: &GenericValue,
    ) -> StorageResult<()> {
        self.ensure_open()?;
        debug!(type_name, %id, "Writing entity");

        let doc = entity_document(id, value)?;

        // Full replace, never a field-level merge
        bounded(
            "write",
            self.operation_timeout,
            self.collection(type_name)
                .replace_one(doc! { ID_FIELD: id.as_str() }, doc)
                .upsert(true),
        )
        .await?;

        Ok(())
    }

    async fn read(&self, type_name: &str, id: &EntityId) -> StorageResult<GenericValue> {
        self.ensure_open()?;
        debug!(type_name, %id, "Reading entity");

        let doc = bounded(
            "read",
            self.operation_timeout,
            self.raw_collection(type_name)
                .find_one(doc! { ID_FIELD: id.as_str() })
                .max_time(self.operation_timeout),
        )
        .await?
        .ok_or_else(|| StorageError::not_found(type_name, id))?;

        entity_data(&doc)
    }

    async fn list(&self, type_name: &str) -> StorageResult<Vec<EntityId>> {
        self.ensure_open()?;
        debug!(type_name, "Listing entities");

        // Full scan; the whole id set is materialized for the caller
        let collection = self.raw_collection(type_name);
        let docs = bounded("list", self.operation_timeout, async {
            let mut cursor = collection
                .find(doc! {})
                .projection(doc! { ID_FIELD: 1 })
                .max_time(self.operation_timeout)
                .await?;

            let mut docs = Vec::new();
            while let Some(doc) = cursor.try_next().await? {
                docs.push(doc);
            }
            Ok::<_, mongodb::error::Error>(docs)
        })
        .await?;

        docs.iter().map(|doc| entity_id(doc)).collect()
    }

    async fn exists(&self, type_name: &str, id: &EntityId) -> StorageResult<bool> {
        self.ensure_open()?;
        debug!(type_name, %id, "Checking entity existence");

        let found = bounded(
            "exists",
            self.operation_timeout,
            self.raw_collection(type_name)
                .find_one(doc! { ID_FIELD: id.as_str() })
                .projection(doc! { ID_FIELD: 1 })
                .max_time(self.operation_timeout),
        )
        .await?;

        Ok(found.is_some())
    }

    async fn delete(&self, type_name: &str, id: &EntityId) -> StorageResult<()> {
        self.ensure_open()?;
        debug!(type_name, %id, "Deleting entity");

        bounded(
            "delete",
            self.operation_timeout,
            self.collection(type_name)
                .delete_one(doc! { ID_FIELD: id.as_str() }),
        )
        .await?;

        Ok(())
    }

    async fn close(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            warn!(database = %self.database_name, "MongoDB storage already closed");
            return;
        }
        self.client.clone().shutdown().await;
        info!(database = %self.database_name, "MongoDB storage closed");
    }
}

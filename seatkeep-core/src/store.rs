//! Document store capability.
//!
//! The reconciler and archiver only ever need two things from persistence: an
//! equality query over one top-level field and an all-or-nothing batch of field
//! updates. Backends implement [`DocumentStore`]; [`MemoryStore`] is the
//! in-process implementation used by tests and the `memory` backend.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::RwLock;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::{CoreError, CoreResult};

/// Top-level field names used in queries and updates.
pub mod fields {
    pub const ID: &str = "id";
    pub const STATUS: &str = "status";
    pub const TRIP_ID: &str = "tripId";
    pub const VEHICLE_ID: &str = "vehicleId";
    pub const SEATS: &str = "seats";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Collection {
    Bookings,
    Trips,
    Vehicles,
}

impl Collection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Bookings => "bookings",
            Collection::Trips => "trips",
            Collection::Vehicles => "vehicles",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A stored document: its key plus the raw JSON body.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub data: Value,
}

impl Document {
    pub fn new(id: impl Into<String>, data: Value) -> Self {
        Self {
            id: id.into(),
            data,
        }
    }

    /// Decodes the body into a model. A body without an `id` field takes the
    /// document key as its identifier.
    pub fn decode<T: DeserializeOwned>(&self, collection: Collection) -> CoreResult<T> {
        let mut data = self.data.clone();
        if let Value::Object(map) = &mut data {
            map.entry(fields::ID)
                .or_insert_with(|| Value::String(self.id.clone()));
        }
        serde_json::from_value(data).map_err(|e| CoreError::InvalidDocument {
            collection,
            id: self.id.clone(),
            reason: e.to_string(),
        })
    }

    /// Whether `field` equals `value`, treating a missing `id` as the key.
    pub fn matches(&self, field: &str, value: &Value) -> bool {
        match self.data.get(field) {
            Some(current) => current == value,
            None if field == fields::ID => value.as_str() == Some(self.id.as_str()),
            None => false,
        }
    }
}

/// Field changes for one document inside a batch.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentUpdate {
    pub collection: Collection,
    pub id: String,
    pub changes: Map<String, Value>,
}

impl DocumentUpdate {
    pub fn new(collection: Collection, id: impl Into<String>) -> Self {
        Self {
            collection,
            id: id.into(),
            changes: Map::new(),
        }
    }

    pub fn set(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.changes.insert(field.to_string(), value.into());
        self
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Store backend error: {0}")]
    Backend(String),
    #[error("Document {collection}/{id} does not exist")]
    MissingDocument { collection: Collection, id: String },
    #[error("Document encoding error: {0}")]
    Encoding(#[from] serde_json::Error),
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// All documents in `collection` whose top-level `field` equals `value`.
    async fn query(
        &self,
        collection: Collection,
        field: &str,
        value: &Value,
    ) -> Result<Vec<Document>, StoreError>;

    /// Applies every update or none of them. Updating a document that does
    /// not exist fails the whole batch.
    async fn atomic_batch(&self, updates: Vec<DocumentUpdate>) -> Result<(), StoreError>;
}

/// In-memory document store.
///
/// Thread-safe via `RwLock`. Documents are kept ordered by key so queries are
/// deterministic.
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<Collection, BTreeMap<String, Value>>>,
    commits: AtomicUsize,
    unavailable: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, collection: Collection, id: impl Into<String>, data: Value) {
        if let Ok(mut collections) = self.collections.write() {
            collections
                .entry(collection)
                .or_default()
                .insert(id.into(), data);
        }
    }

    pub fn get(&self, collection: Collection, id: &str) -> Option<Value> {
        let collections = self.collections.read().ok()?;
        collections.get(&collection)?.get(id).cloned()
    }

    /// Number of batches committed so far.
    pub fn commits(&self) -> usize {
        self.commits.load(Ordering::SeqCst)
    }

    /// Makes every subsequent call fail with a backend error.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("memory store marked unavailable".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn query(
        &self,
        collection: Collection,
        field: &str,
        value: &Value,
    ) -> Result<Vec<Document>, StoreError> {
        self.check_available()?;
        let collections = self
            .collections
            .read()
            .map_err(|_| StoreError::Backend("lock poisoned".into()))?;

        let Some(docs) = collections.get(&collection) else {
            return Ok(Vec::new());
        };

        Ok(docs
            .iter()
            .map(|(id, data)| Document::new(id.clone(), data.clone()))
            .filter(|doc| doc.matches(field, value))
            .collect())
    }

    async fn atomic_batch(&self, updates: Vec<DocumentUpdate>) -> Result<(), StoreError> {
        self.check_available()?;
        let mut collections = self
            .collections
            .write()
            .map_err(|_| StoreError::Backend("lock poisoned".into()))?;

        // Validate every target before touching anything.
        for update in &updates {
            let exists = collections
                .get(&update.collection)
                .is_some_and(|docs| docs.contains_key(&update.id));
            if !exists {
                return Err(StoreError::MissingDocument {
                    collection: update.collection,
                    id: update.id.clone(),
                });
            }
        }

        for update in updates {
            let body = collections
                .get_mut(&update.collection)
                .and_then(|docs| docs.get_mut(&update.id));
            match body {
                Some(Value::Object(map)) => map.extend(update.changes),
                Some(other) => *other = Value::Object(update.changes),
                None => {}
            }
        }
        drop(collections);

        self.commits.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use uuid::Uuid;

/// A stored document: a JSON object whose `_id` is assigned by the store.
pub type Document = Map<String, Value>;

pub const ID_FIELD: &str = "_id";

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("'{0}' is not a valid document id")]
    InvalidId(String),
    #[error("document does not match record shape: {0}")]
    Shape(#[from] serde_json::Error),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Users,
    Classes,
    BookedClasses,
    Payments,
}

impl Collection {
    pub fn name(&self) -> &'static str {
        match self {
            Collection::Users => "users",
            Collection::Classes => "classes",
            Collection::BookedClasses => "bookedClass",
            Collection::Payments => "payments",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Store-assigned identifier. Parsing is the only place a malformed id is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(Uuid);

impl DocumentId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for DocumentId {
    fn default() -> Self {
        Self::new()
    }
}

impl FromStr for DocumentId {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim())
            .map(Self)
            .map_err(|_| StoreError::InvalidId(s.to_string()))
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Which documents a read touches.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    All,
    /// Top-level `field` equals `value`.
    Eq(&'static str, Value),
}

impl Filter {
    pub fn eq(field: &'static str, value: impl Into<Value>) -> Self {
        Filter::Eq(field, value.into())
    }

    pub fn matches(&self, doc: &Document) -> bool {
        match self {
            Filter::All => true,
            Filter::Eq(field, value) => doc.get(*field) == Some(value),
        }
    }
}

/// Descending sort on a top-level field; documents missing the field go last.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortDesc(pub &'static str);

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertOneResult {
    pub acknowledged: bool,
    pub inserted_id: DocumentId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateResult {
    pub acknowledged: bool,
    pub matched_count: u64,
    pub modified_count: u64,
    pub upserted_id: Option<DocumentId>,
    pub upserted_count: u64,
}

impl UpdateResult {
    pub fn new(matched_count: u64, modified_count: u64) -> Self {
        Self {
            acknowledged: true,
            matched_count,
            modified_count,
            upserted_id: None,
            upserted_count: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteResult {
    pub acknowledged: bool,
    pub deleted_count: u64,
}

/// Persistence seam for every handler and guard. Each method is a single
/// atomic operation on one collection.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Stores `doc` under a fresh id. Any `_id` in `doc` is replaced.
    async fn insert_one(&self, collection: Collection, doc: Document) -> StoreResult<InsertOneResult>;

    /// Matching documents in insertion order, or ordered by `sort` when given.
    async fn find(
        &self,
        collection: Collection,
        filter: &Filter,
        sort: Option<SortDesc>,
    ) -> StoreResult<Vec<Document>>;

    async fn find_one(&self, collection: Collection, filter: &Filter) -> StoreResult<Option<Document>>;

    /// Sets the top-level fields of `set` on the document with `id`.
    async fn update_by_id(&self, collection: Collection, id: &str, set: Document) -> StoreResult<UpdateResult>;

    async fn delete_by_id(&self, collection: Collection, id: &str) -> StoreResult<DeleteResult>;
}

pub mod documents;
pub mod jsonl;
pub mod mongo;

pub use documents::{Item, ItemFilter, Location, Price, Store};
pub use jsonl::JsonlStorage;
pub use mongo::MongoStorage;

use async_trait::async_trait;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed document: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("{0}")]
    Mongo(#[from] mongodb::error::Error),

    #[error("Undecodable document: {0}")]
    Decode(#[from] mongodb::bson::de::Error),

    #[error("Encoding document failed: {0}")]
    Encode(#[from] mongodb::bson::ser::Error),

    #[error("Date out of range: {0} ms")]
    DateOutOfRange(i64),
}

pub type Result<T> = std::result::Result<T, StorageError>;

/// Document store holding Item documents
#[async_trait]
pub trait ItemStore: Send + Sync + 'static {
    /// Short name of the backend, reported by the health route
    fn backend(&self) -> &'static str;

    /// Insert a new top-level document. Never merges with an existing UPC.
    async fn insert(&self, item: &Item) -> Result<()>;

    /// All documents whose field equals the filter value, in insertion order
    async fn find(&self, filter: &ItemFilter) -> Result<Vec<Item>>;

    async fn count(&self) -> Result<usize>;
}

//! Persistence for the harvested collection
//!
//! The collection is one JSON array file, replaced wholesale on every save.
//! A small trait seam keeps the pagination logic independent of the on-disk
//! format, and an optional page archive writes raw fetched documents to a
//! side directory for offline inspection.

mod archive;
mod json_store;

pub use archive::PageArchive;
pub use json_store::JsonStore;

use crate::model::Post;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for collection storage backends
///
/// Saving replaces the previous persisted state wholesale; ordering is the
/// caller's responsibility.
pub trait PostStore {
    /// Loads the persisted collection; an absent store yields an empty one
    fn load(&self) -> StorageResult<Vec<Post>>;

    /// Persists the collection, replacing the previous state
    fn save(&self, posts: &[Post]) -> StorageResult<()>;
}

//! Link store client boundary.
//!
//! The storage engine behind directory lookups is an external collaborator;
//! this module only defines the contract the core requires from it, plus an
//! in-memory implementation for development and tests.

mod memory;

use async_trait::async_trait;
pub use memory::MemoryLinkStore;
use uuid::Uuid;

use crate::models::IdentityLink;

/// Result type for link store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors surfaced by the link store transport.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The storage transport returned an HTTP-style failure.
    #[error("storage returned an HTTP {status}")]
    Http { status: u16, body: String },

    /// The store could not be reached at all.
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// Queries over persisted identity-link records.
///
/// Implementations are shared, stateless collaborators safe for concurrent
/// use; the core never writes through this interface.
#[async_trait]
pub trait LinkStore: Send + Sync {
    /// All links recorded for one directory identity. More than one result
    /// is a duplicate-link condition the caller must surface.
    async fn find_links_by_directory_id(&self, object_id: Uuid)
    -> StoreResult<Vec<IdentityLink>>;

    /// All links whose platform user id appears in `ids`. Ids with no link
    /// are silently absent from the result.
    async fn find_links_by_platform_ids(&self, ids: &[String]) -> StoreResult<Vec<IdentityLink>>;
}

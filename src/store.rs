//! Persistence collaborator seam.
//!
//! The database is an external collaborator: it owns document shape,
//! indexing, and query execution. This crate only calls the black-box
//! operations below, so the whole pipeline is store-agnostic — production
//! wires in a real database adapter, the test suite wires in
//! [`tests::MemoryStore`].

use thiserror::Error;

use crate::records::{AlbumRecord, MediaRecord};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("store backend error: {0}")]
    Backend(String),
}

/// Black-box persistence operations the pipeline depends on.
///
/// `Sync` because derivative generation fans file writes out across threads
/// and the orchestrators hold the store by reference.
pub trait MediaStore: Sync {
    fn media(&self, media_id: &str) -> Result<Option<MediaRecord>, StoreError>;

    /// All media of an album. Order is the store's natural order; callers
    /// sort when ordering matters.
    fn media_for_album(&self, album_id: &str) -> Result<Vec<MediaRecord>, StoreError>;

    /// Every media record, for whole-collection maintenance passes.
    fn all_media(&self) -> Result<Vec<MediaRecord>, StoreError>;

    /// Authoritative media count for an album, by counting records.
    fn count_media(&self, album_id: &str) -> Result<u64, StoreError>;

    fn insert_media(&self, record: &MediaRecord) -> Result<(), StoreError>;

    /// Replace a record wholesale (used by legacy-path migration).
    fn update_media(&self, record: &MediaRecord) -> Result<(), StoreError>;

    /// Returns `false` when no such record existed.
    fn delete_media(&self, media_id: &str) -> Result<bool, StoreError>;

    /// Bulk-delete all media of an album, returning how many went away.
    fn delete_media_by_album(&self, album_id: &str) -> Result<u64, StoreError>;

    fn album(&self, album_id: &str) -> Result<Option<AlbumRecord>, StoreError>;

    /// Returns `false` when no such album existed.
    fn delete_album(&self, album_id: &str) -> Result<bool, StoreError>;

    fn set_album_cover(&self, album_id: &str, path: Option<&str>) -> Result<(), StoreError>;

    fn set_album_media_count(&self, album_id: &str, count: u64) -> Result<(), StoreError>;
}

//! Media lifecycle: create, delete, cascade-delete, and path migration.
//!
//! This module ties the pieces together: [`DerivativeGenerator`] for files,
//! a [`MediaStore`] for records, [`StorageLayout`] for where everything
//! lives. Creation is fail-fast (any error aborts and cleans up); deletion
//! is the opposite — every step runs regardless of earlier failures, and
//! the caller gets an aggregate report instead of the first error.

use chrono::Utc;
use log::{debug, info, warn};
use std::io;
use thiserror::Error;
use uuid::Uuid;

use crate::generate::{DerivativeGenerator, GenerateError};
use crate::imaging::Quality;
use crate::layout::{MigrationReport, StorageLayout, migrate_legacy_paths};
use crate::records::{MediaKind, MediaRecord};
use crate::store::{MediaStore, StoreError};

#[derive(Error, Debug)]
pub enum LifecycleError {
    #[error("album not found: {0}")]
    AlbumNotFound(String),
    #[error(transparent)]
    Generate(#[from] GenerateError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Result of a successful upload: the persisted record, plus whether this
/// upload became the album's first cover.
#[derive(Debug, Clone)]
pub struct CreatedMedia {
    pub record: MediaRecord,
    pub cover_assigned: bool,
}

/// Outcome of a cascade delete. Deleting an album that does not exist is
/// reported, not treated as an error — the end state is the same.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CascadeOutcome {
    AlbumNotFound,
    Deleted(CascadeReport),
}

/// Aggregate tally of one cascade delete. Individual file failures are
/// counted and logged; they never abort the cascade.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CascadeReport {
    pub media_deleted: u64,
    pub files_deleted: u64,
    pub file_errors: u64,
    pub directory_removed: bool,
}

pub struct LifecycleManager<'a, S: MediaStore> {
    layout: &'a StorageLayout,
    store: &'a S,
    quality: Quality,
}

impl<'a, S: MediaStore> LifecycleManager<'a, S> {
    pub fn new(layout: &'a StorageLayout, store: &'a S) -> Self {
        Self {
            layout,
            store,
            quality: Quality::default(),
        }
    }

    pub fn with_quality(layout: &'a StorageLayout, store: &'a S, quality: Quality) -> Self {
        Self {
            layout,
            store,
            quality,
        }
    }

    /// Ingest one upload: generate the derivative set, persist the record,
    /// recompute the album's media count, and bootstrap the album cover if
    /// it has none.
    ///
    /// If persisting fails after generation succeeded, the freshly written
    /// files are removed so the filesystem never holds orphans.
    pub fn create_artifacts(
        &self,
        raw: &[u8],
        original_filename: &str,
        album_id: &str,
    ) -> Result<CreatedMedia, LifecycleError> {
        let album = self
            .store
            .album(album_id)?
            .ok_or_else(|| LifecycleError::AlbumNotFound(album_id.to_string()))?;

        let generator = DerivativeGenerator::with_quality(self.layout, self.quality);
        let set = generator.generate(raw, original_filename, album_id)?;

        let order = self.store.count_media(album_id)? as u32;
        let record = MediaRecord {
            id: Uuid::new_v4().simple().to_string(),
            album_id: album_id.to_string(),
            kind: MediaKind::Image,
            caption: None,
            tags: Vec::new(),
            order,
            uploaded_at: Utc::now(),
            file_sizes: Some(set.file_sizes),
            metadata: Some(set.metadata),
            url: None,
            optimized: None,
            thumbnail: None,
        };

        if let Err(e) = self.store.insert_media(&record) {
            warn!(
                "persisting media {} failed, removing {} generated files",
                record.id,
                record.all_file_paths().len()
            );
            self.remove_files(&record);
            return Err(e.into());
        }
        info!(
            "created media {} in album {album_id} (order {order})",
            record.id
        );

        let count = self.store.count_media(album_id)?;
        self.store.set_album_media_count(album_id, count)?;

        let mut cover_assigned = false;
        if album.cover_image_path.is_none() && record.kind == MediaKind::Image {
            if let Some(sizes) = &record.file_sizes {
                self.store
                    .set_album_cover(album_id, Some(&sizes.medium.path))?;
                cover_assigned = true;
            }
        }

        Ok(CreatedMedia {
            record,
            cover_assigned,
        })
    }

    /// Delete one media item: its files, then its record, then the album
    /// count. Returns `Ok(false)` if no such record exists.
    ///
    /// Missing files are tolerated silently (the goal state is "gone");
    /// other file errors are logged and do not block record deletion.
    pub fn delete_one(&self, media_id: &str) -> Result<bool, LifecycleError> {
        let Some(record) = self.store.media(media_id)? else {
            return Ok(false);
        };

        let (deleted, errors) = self.remove_files(&record);
        debug!("deleted media {media_id}: {deleted} files removed, {errors} errors");

        self.store.delete_media(media_id)?;
        let count = self.store.count_media(&record.album_id)?;
        self.store.set_album_media_count(&record.album_id, count)?;
        Ok(true)
    }

    /// Delete an album and everything under it. Every media item's files
    /// are attempted; failures are tallied, never fatal. The album
    /// directory is removed only if it ends up empty — files another
    /// process put there are left untouched.
    pub fn delete_album_cascade(&self, album_id: &str) -> Result<CascadeOutcome, LifecycleError> {
        if self.store.album(album_id)?.is_none() {
            info!("cascade delete of {album_id}: album not found");
            return Ok(CascadeOutcome::AlbumNotFound);
        }

        let media = self.store.media_for_album(album_id)?;
        let mut files_deleted = 0;
        let mut file_errors = 0;
        for record in &media {
            let (deleted, errors) = self.remove_files(record);
            files_deleted += deleted;
            file_errors += errors;
        }

        let media_deleted = self.store.delete_media_by_album(album_id)?;

        let directory_removed = match self.layout.remove_album_dir_if_empty(album_id) {
            Ok(removed) => removed,
            Err(e) => {
                warn!("could not remove album directory for {album_id}: {e}");
                false
            }
        };

        self.store.delete_album(album_id)?;
        info!(
            "cascade-deleted album {album_id}: {media_deleted} records, \
             {files_deleted} files, {file_errors} file errors"
        );

        Ok(CascadeOutcome::Deleted(CascadeReport {
            media_deleted,
            files_deleted,
            file_errors,
            directory_removed,
        }))
    }

    /// Rewrite any stored `public/`-prefixed paths to canonical web paths
    /// and persist the records that changed.
    pub fn migrate_store_paths(&self) -> Result<MigrationReport, LifecycleError> {
        let mut records = self.store.all_media()?;
        let mut report = MigrationReport::default();
        for record in &mut records {
            let one = migrate_legacy_paths(std::slice::from_mut(record));
            report.total += one.total;
            report.already_correct += one.already_correct;
            if one.fixed > 0 {
                self.store.update_media(record)?;
                report.fixed += one.fixed;
            }
        }
        if report.fixed > 0 {
            info!(
                "path migration: {} of {} records rewritten",
                report.fixed, report.total
            );
        }
        Ok(report)
    }

    /// Best-effort removal of every file a record references. Returns
    /// (deleted, errors); already-missing files count as neither.
    fn remove_files(&self, record: &MediaRecord) -> (u64, u64) {
        let mut deleted = 0;
        let mut errors = 0;
        for web in record.all_file_paths() {
            let path = self.layout.fs_path(web);
            match std::fs::remove_file(&path) {
                Ok(()) => deleted += 1,
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => {
                    errors += 1;
                    warn!("failed to delete {}: {e}", path.display());
                }
            }
        }
        (deleted, errors)
    }
}

//! Path and namespace rules for stored media.
//!
//! Three path representations exist and only two are this crate's business:
//!
//! - **Web path** — what the database stores and URLs are built from. Always
//!   leading-`/`, never contains a literal `public/` segment.
//!   Example: `/uploads/albums/42/medium-1709298000000-ab…cd.jpg`.
//! - **Filesystem path** — derived from a web path by joining under the
//!   public root. Used for I/O, never persisted.
//! - **Browser URL** — the caller's concern entirely.
//!
//! Older deployments persisted paths with a `public/` prefix; [`normalize`]
//! is the single bit-exact correction rule, and [`migrate_legacy_paths`]
//! applies it across whole record sets.

use log::warn;
use serde::{Deserialize, Serialize};
use std::io;
use std::path::{Path, PathBuf};

use crate::records::MediaRecord;

/// Directory (under the public root) holding per-album uploads.
const ALBUMS_DIR: &str = "uploads/albums";
/// Flat directory holding synthesized square covers, one file per album.
const COVERS_DIR: &str = "uploads/album-covers";

/// Filesystem layout rooted at the public static-file directory.
#[derive(Debug, Clone)]
pub struct StorageLayout {
    root: PathBuf,
}

impl StorageLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute directory for an album's uploads.
    pub fn album_dir(&self, album_id: &str) -> PathBuf {
        self.root.join(ALBUMS_DIR).join(album_id)
    }

    /// Absolute directory for synthesized album covers.
    pub fn covers_dir(&self) -> PathBuf {
        self.root.join(COVERS_DIR)
    }

    /// Create an album's directory if missing. Idempotent and safe under
    /// concurrent uploads to the same album.
    pub fn ensure_album_dir(&self, album_id: &str) -> io::Result<PathBuf> {
        let dir = self.album_dir(album_id);
        std::fs::create_dir_all(&dir)?;
        Ok(dir)
    }

    /// Create the covers directory if missing.
    pub fn ensure_covers_dir(&self) -> io::Result<PathBuf> {
        let dir = self.covers_dir();
        std::fs::create_dir_all(&dir)?;
        Ok(dir)
    }

    /// Web path for a file inside an album's directory.
    pub fn album_file_web_path(&self, album_id: &str, file_name: &str) -> String {
        format!("/{ALBUMS_DIR}/{album_id}/{file_name}")
    }

    /// Web path of an album's upload directory (the stored
    /// `storage_directory` field).
    pub fn album_dir_web_path(&self, album_id: &str) -> String {
        format!("/{ALBUMS_DIR}/{album_id}")
    }

    /// Web path of an album's synthesized square cover. Deterministic: one
    /// file per album, overwritten on regeneration.
    pub fn cover_web_path(&self, album_id: &str) -> String {
        format!("/{COVERS_DIR}/{album_id}.jpg")
    }

    /// Derive the filesystem path for a stored web path.
    ///
    /// Legacy `public/`-prefixed values are normalized on the way through, so
    /// stale records still resolve to the right file.
    pub fn fs_path(&self, web_path: &str) -> PathBuf {
        let normalized = normalize(web_path);
        self.root.join(normalized.trim_start_matches('/'))
    }

    /// Remove an album's directory only if it is verifiably empty.
    ///
    /// Returns `true` when the directory is gone afterwards (removed now, or
    /// already absent). A non-empty directory is left in place: a cascade
    /// delete can race an upload in flight to the same album, and files the
    /// system does not know about yet must never be destroyed.
    pub fn remove_album_dir_if_empty(&self, album_id: &str) -> io::Result<bool> {
        let dir = self.album_dir(album_id);
        let mut entries = match std::fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(true),
            Err(e) => return Err(e),
        };
        if entries.next().is_some() {
            warn!(
                "album directory {} not empty after cascade, leaving in place",
                dir.display()
            );
            return Ok(false);
        }
        std::fs::remove_dir(&dir)?;
        Ok(true)
    }
}

/// Normalize a stored path to web-path form.
///
/// The rule is bit-exact: a path beginning with the literal `public/` has
/// that prefix removed and a leading `/` ensured; everything else passes
/// through unchanged. Idempotent.
pub fn normalize(path: &str) -> String {
    match path.strip_prefix("public/") {
        Some(rest) => format!("/{rest}"),
        None => path.to_string(),
    }
}

/// Outcome of a legacy-path migration pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationReport {
    /// Records scanned.
    pub total: usize,
    /// Records with at least one rewritten path field.
    pub fixed: usize,
    /// Records whose paths were already in web-path form.
    pub already_correct: usize,
}

/// Rewrite every `public/`-prefixed path field across a set of records.
///
/// Covers both shapes: the flat legacy fields (`url`, `optimized`,
/// `thumbnail`) and every nested `file_sizes` path / WebP sibling. Pure over
/// the given slice — persisting the rewritten records is the caller's job.
/// Already-correct records are never an error.
pub fn migrate_legacy_paths(records: &mut [MediaRecord]) -> MigrationReport {
    let mut report = MigrationReport {
        total: records.len(),
        ..MigrationReport::default()
    };

    for record in records.iter_mut() {
        let mut changed = false;

        for field in [&mut record.url, &mut record.optimized, &mut record.thumbnail] {
            changed |= fix_field(field, &record.id);
        }
        if let Some(sizes) = &mut record.file_sizes {
            for entry in [
                &mut sizes.original,
                &mut sizes.thumbnail,
                &mut sizes.medium,
                &mut sizes.full,
            ] {
                changed |= fix_path(&mut entry.path, &record.id);
                if let Some(webp) = &mut entry.webp_path {
                    changed |= fix_path(webp, &record.id);
                }
            }
        }

        if changed {
            report.fixed += 1;
        } else {
            report.already_correct += 1;
        }
    }

    report
}

fn fix_field(field: &mut Option<String>, record_id: &str) -> bool {
    match field {
        Some(path) => fix_path(path, record_id),
        None => false,
    }
}

fn fix_path(path: &mut String, record_id: &str) -> bool {
    let normalized = normalize(path);
    if normalized != *path {
        warn!("record {record_id}: corrected legacy path {path:?} -> {normalized:?}");
        *path = normalized;
        true
    } else {
        false
    }
}

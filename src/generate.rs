//! Derivative generation — the all-or-nothing heart of the pipeline.
//!
//! One upload becomes exactly seven files, all sharing one token:
//!
//! ```text
//! uploads/albums/{album}/original-{token}.jpg     upright, EXIF-free
//! uploads/albums/{album}/thumbnail-{token}.jpg    300x300 cover-crop
//! uploads/albums/{album}/thumbnail-{token}.webp
//! uploads/albums/{album}/medium-{token}.jpg       fits 800x600, shrink-only
//! uploads/albums/{album}/medium-{token}.webp
//! uploads/albums/{album}/full-{token}.jpg         fits 1920x1080, shrink-only
//! uploads/albums/{album}/full-{token}.webp
//! ```
//!
//! The three presets are encoded in parallel with [rayon](https://docs.rs/rayon);
//! each targets a distinct file, so no coordination is needed beyond
//! collecting results.
//!
//! ## Failure semantics
//!
//! Input is validated before any file I/O, so bad uploads cost nothing. Once
//! writing has started, any failure aborts the whole operation and every file
//! already written for this token is deleted best-effort — cleanup problems
//! are logged, never allowed to mask the original error. The caller sees one
//! error and a filesystem with no trace of the upload. No database write
//! happens here at all; persisting the returned [`ArtifactSet`] after success
//! is what makes the upload atomic from the outside.

use chrono::Utc;
use image::DynamicImage;
use image::imageops::FilterType;
use log::{debug, warn};
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use thiserror::Error;
use uuid::Uuid;

use crate::imaging::encode::EncodeError;
use crate::imaging::{
    FitMode, PRESETS, Probe, ProbeError, Quality, SizePreset, apply_orientation, encode_jpeg,
    encode_webp, fit_inside, probe,
};
use crate::layout::StorageLayout;
use crate::records::{FileSizes, MediaMetadata, SizeEntry};

#[derive(Error, Debug)]
pub enum GenerateError {
    /// Unsupported or corrupt source bytes; rejected before any file I/O.
    #[error("invalid upload: {0}")]
    Input(#[from] ProbeError),
    #[error(transparent)]
    Encode(#[from] EncodeError),
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// The complete result of one successful generation run: seven files on
/// disk and everything the store needs to persist about them.
#[derive(Debug, Clone, PartialEq)]
pub struct ArtifactSet {
    pub album_id: String,
    pub token: UploadToken,
    pub file_sizes: FileSizes,
    pub metadata: MediaMetadata,
}

/// Per-invocation token shared by every file of one upload:
/// `{millis-timestamp}-{32 hex chars}` (16 random bytes).
///
/// Files of one upload are associated by filename convention alone, and the
/// random half keeps concurrent uploads collision-free.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadToken(String);

impl UploadToken {
    pub fn new() -> Self {
        Self(format!(
            "{}-{}",
            Utc::now().timestamp_millis(),
            Uuid::new_v4().simple()
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for UploadToken {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for UploadToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Filesystem seam for artifact writes.
///
/// Production uses [`FsWriter`]; tests inject failures at a chosen write to
/// exercise cleanup. `Sync` because preset encodes fan out across threads.
pub trait ArtifactWriter: Sync {
    fn write(&self, path: &Path, bytes: &[u8]) -> io::Result<()>;
}

/// Writes straight to disk.
pub struct FsWriter;

impl ArtifactWriter for FsWriter {
    fn write(&self, path: &Path, bytes: &[u8]) -> io::Result<()> {
        std::fs::write(path, bytes)
    }
}

/// Turns uploaded bytes into the canonical derivative set.
pub struct DerivativeGenerator<'a> {
    layout: &'a StorageLayout,
    quality: Quality,
}

impl<'a> DerivativeGenerator<'a> {
    pub fn new(layout: &'a StorageLayout) -> Self {
        Self {
            layout,
            quality: Quality::default(),
        }
    }

    pub fn with_quality(layout: &'a StorageLayout, quality: Quality) -> Self {
        Self { layout, quality }
    }

    /// Generate the full derivative set for one upload.
    pub fn generate(
        &self,
        raw: &[u8],
        original_filename: &str,
        album_id: &str,
    ) -> Result<ArtifactSet, GenerateError> {
        self.generate_with_writer(&FsWriter, raw, original_filename, album_id)
    }

    /// Generate using a specific writer (allows testing failure cleanup).
    pub fn generate_with_writer(
        &self,
        writer: &impl ArtifactWriter,
        raw: &[u8],
        original_filename: &str,
        album_id: &str,
    ) -> Result<ArtifactSet, GenerateError> {
        // Reject bad input before anything touches the filesystem
        let probe = probe(raw)?;
        debug!(
            "generating derivatives for {original_filename}: {}x{} {}, orientation {}",
            probe.width, probe.height, probe.format, probe.orientation
        );

        self.layout.ensure_album_dir(album_id)?;
        let token = UploadToken::new();
        let written: Mutex<Vec<PathBuf>> = Mutex::new(Vec::with_capacity(7));

        match self.render_all(writer, probe, &token, album_id, &written) {
            Ok(set) => Ok(set),
            Err(e) => {
                let paths = match written.into_inner() {
                    Ok(paths) => paths,
                    Err(poisoned) => poisoned.into_inner(),
                };
                cleanup_partial(&paths);
                Err(e)
            }
        }
    }

    fn render_all(
        &self,
        writer: &impl ArtifactWriter,
        probe: Probe,
        token: &UploadToken,
        album_id: &str,
        written: &Mutex<Vec<PathBuf>>,
    ) -> Result<ArtifactSet, GenerateError> {
        let exif = probe.exif_summary();
        let (format, has_alpha, orientation) = (probe.format, probe.has_alpha, probe.orientation);

        // All downstream consumers see upright pixels; EXIF rotation is
        // applied once, here, and never re-interpreted.
        let upright = apply_orientation(probe.image, orientation);

        let jpeg = encode_jpeg(&upright, self.quality)?;
        let original_web = self.write_file(
            writer,
            album_id,
            &format!("original-{token}.jpg"),
            &jpeg,
            written,
        )?;
        let original = SizeEntry {
            path: original_web,
            webp_path: None,
            width: upright.width(),
            height: upright.height(),
            size: jpeg.len() as u64,
        };

        // The six derivative writes target distinct files and are fanned out
        // across the pool.
        let (thumbnail, (medium, full)) = rayon::join(
            || self.render_preset(writer, &upright, &PRESETS[0], token, album_id, written),
            || {
                rayon::join(
                    || self.render_preset(writer, &upright, &PRESETS[1], token, album_id, written),
                    || self.render_preset(writer, &upright, &PRESETS[2], token, album_id, written),
                )
            },
        );

        let file_sizes = FileSizes {
            thumbnail: thumbnail?,
            medium: medium?,
            full: full?,
            original,
        };

        Ok(ArtifactSet {
            album_id: album_id.to_string(),
            token: token.clone(),
            metadata: MediaMetadata {
                format: format.to_string(),
                width: upright.width(),
                height: upright.height(),
                has_alpha,
                orientation,
                exif,
            },
            file_sizes,
        })
    }

    fn render_preset(
        &self,
        writer: &impl ArtifactWriter,
        upright: &DynamicImage,
        preset: &SizePreset,
        token: &UploadToken,
        album_id: &str,
        written: &Mutex<Vec<PathBuf>>,
    ) -> Result<SizeEntry, GenerateError> {
        let source = (upright.width(), upright.height());
        let resized = match preset.fit {
            FitMode::Inside => {
                let (w, h) = fit_inside(source, (preset.max_width, preset.max_height));
                if (w, h) == source {
                    upright.clone()
                } else {
                    upright.resize(w, h, FilterType::Lanczos3)
                }
            }
            FitMode::Cover => {
                upright.resize_to_fill(preset.max_width, preset.max_height, FilterType::Lanczos3)
            }
        };

        let jpeg = encode_jpeg(&resized, self.quality)?;
        let jpeg_web = self.write_file(
            writer,
            album_id,
            &format!("{}-{token}.jpg", preset.name),
            &jpeg,
            written,
        )?;

        let webp = encode_webp(&resized, self.quality)?;
        let webp_web = self.write_file(
            writer,
            album_id,
            &format!("{}-{token}.webp", preset.name),
            &webp,
            written,
        )?;

        Ok(SizeEntry {
            path: jpeg_web,
            webp_path: Some(webp_web),
            width: resized.width(),
            height: resized.height(),
            size: jpeg.len() as u64,
        })
    }

    /// Write one artifact, returning its web path and recording the
    /// filesystem path for potential cleanup.
    fn write_file(
        &self,
        writer: &impl ArtifactWriter,
        album_id: &str,
        file_name: &str,
        bytes: &[u8],
        written: &Mutex<Vec<PathBuf>>,
    ) -> Result<String, GenerateError> {
        let web = self.layout.album_file_web_path(album_id, file_name);
        let path = self.layout.fs_path(&web);
        writer
            .write(&path, bytes)
            .map_err(|source| GenerateError::Write {
                path: path.clone(),
                source,
            })?;
        match written.lock() {
            Ok(mut paths) => paths.push(path),
            Err(poisoned) => poisoned.into_inner().push(path),
        }
        Ok(web)
    }
}

/// Best-effort removal of a failed upload's partial files. Never masks the
/// original error: failures here are logged and swallowed.
fn cleanup_partial(paths: &[PathBuf]) {
    for path in paths {
        match std::fs::remove_file(path) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => warn!(
                "cleanup left partial file {} behind: {e}",
                path.display()
            ),
        }
    }
}

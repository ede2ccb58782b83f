//! Album cover selection and rendering.
//!
//! Two concerns live here. [`CoverSelector::select_cover`] picks a
//! representative path for an album that has none, preferring the earliest
//! item's medium derivative and falling back through smaller sizes.
//! [`CoverSelector::generate_square_cover`] renders a dedicated 800x800
//! cover-cropped JPEG under `uploads/album-covers/`, separate from the
//! album's own files so it survives reordering and deletion of individual
//! media.
//!
//! Both are forgiving by design: a missing album or missing source yields
//! `Ok(None)`, not an error, so callers can run them opportunistically.

use image::imageops::FilterType;
use log::{debug, warn};
use std::io;
use thiserror::Error;

use crate::imaging::encode::EncodeError;
use crate::imaging::{Quality, SizeName, encode_jpeg};
use crate::layout::{StorageLayout, normalize};
use crate::records::MediaRecord;
use crate::store::{MediaStore, StoreError};

/// Edge length of the rendered square cover.
pub const SQUARE_COVER_EDGE: u32 = 800;

#[derive(Error, Debug)]
pub enum CoverError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Encode(#[from] EncodeError),
    #[error("cover source unreadable: {0}")]
    Decode(String),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// The preferred-to-least-preferred sizes consulted when picking a
/// representative path. Legacy records map their flat fields onto the same
/// names (`optimized` → medium, `thumbnail` → thumbnail, `url` → original),
/// so one chain serves both shapes — which means a legacy `optimized`
/// rendition outranks the legacy `thumbnail`.
const COVER_CHAIN: [SizeName; 3] = [SizeName::Medium, SizeName::Thumbnail, SizeName::Original];

/// Best displayable path for a record, walking the preference chain.
pub fn representative_path(record: &MediaRecord) -> Option<&str> {
    let paths = record.paths_by_size();
    COVER_CHAIN.iter().find_map(|size| paths.get(size).copied())
}

pub struct CoverSelector<'a, S: MediaStore> {
    layout: &'a StorageLayout,
    store: &'a S,
    quality: Quality,
}

impl<'a, S: MediaStore> CoverSelector<'a, S> {
    pub fn new(layout: &'a StorageLayout, store: &'a S) -> Self {
        Self {
            layout,
            store,
            quality: Quality::default(),
        }
    }

    /// Ensure the album has a cover path, choosing one from its media if
    /// needed. Returns the cover in effect afterwards, or `None` for an
    /// empty (or unknown) album. Idempotent: an existing cover is kept.
    pub fn select_cover(&self, album_id: &str) -> Result<Option<String>, CoverError> {
        let Some(album) = self.store.album(album_id)? else {
            debug!("select_cover: album {album_id} not found");
            return Ok(None);
        };
        if let Some(existing) = album.cover_image_path {
            return Ok(Some(existing));
        }

        let Some(record) = self.earliest_media(album_id)? else {
            return Ok(None);
        };
        let Some(path) = representative_path(&record) else {
            return Ok(None);
        };
        let path = normalize(path);

        self.store.set_album_cover(album_id, Some(&path))?;
        debug!("album {album_id}: cover set to {path} from media {}", record.id);
        Ok(Some(path))
    }

    /// Render the album's dedicated square cover JPEG and return its web
    /// path. The source is the album's cover path, or a freshly chosen
    /// representative for albums without one.
    ///
    /// Returns `Ok(None)` when there is nothing to render from: unknown
    /// album, empty album, or a source path whose file is gone from disk.
    /// Overwrites any previous render at the same path.
    pub fn generate_square_cover(&self, album_id: &str) -> Result<Option<String>, CoverError> {
        let Some(album) = self.store.album(album_id)? else {
            debug!("generate_square_cover: album {album_id} not found");
            return Ok(None);
        };

        let source_web = match album.cover_image_path {
            Some(path) => normalize(&path),
            None => {
                let Some(record) = self.earliest_media(album_id)? else {
                    return Ok(None);
                };
                match representative_path(&record) {
                    Some(path) => normalize(path),
                    None => return Ok(None),
                }
            }
        };

        let source_fs = self.layout.fs_path(&source_web);
        if !source_fs.is_file() {
            warn!(
                "square cover for {album_id} skipped: source {} missing on disk",
                source_fs.display()
            );
            return Ok(None);
        }

        let source = image::open(&source_fs)
            .map_err(|e| CoverError::Decode(format!("{}: {e}", source_fs.display())))?;
        let square = source.resize_to_fill(SQUARE_COVER_EDGE, SQUARE_COVER_EDGE, FilterType::Lanczos3);
        let bytes = encode_jpeg(&square, self.quality)?;

        self.layout.ensure_covers_dir()?;
        let web = self.layout.cover_web_path(album_id);
        std::fs::write(self.layout.fs_path(&web), &bytes)?;
        debug!("album {album_id}: square cover rendered to {web}");
        Ok(Some(web))
    }

    /// Earliest media item by display order, upload time as tie-break.
    fn earliest_media(&self, album_id: &str) -> Result<Option<MediaRecord>, CoverError> {
        let mut media = self.store.media_for_album(album_id)?;
        media.sort_by(|a, b| {
            a.order
                .cmp(&b.order)
                .then_with(|| a.uploaded_at.cmp(&b.uploaded_at))
        });
        Ok(media.into_iter().next())
    }
}

//! Persisted record shapes shared with the storage collaborator.
//!
//! Two generations of media records coexist in the wild:
//!
//! - **Current**: a nested `file_sizes` map — one entry per size, each with a
//!   JPEG path, an optional WebP sibling, dimensions, and byte size.
//! - **Legacy**: three flat fields (`url`, `optimized`, `thumbnail`) written
//!   before the derivative pipeline existed.
//!
//! Every consumer that needs "the files of this record" goes through a single
//! tagged view, [`MediaPathView`], collapsed by [`MediaRecord::paths_by_size`]
//! and [`MediaRecord::all_file_paths`]. Nothing else in the crate branches on
//! the record shape.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::imaging::SizeName;

/// One stored file of a derivative set: where it lives and what it measures.
///
/// `path` and `webp_path` are web paths (leading `/`, rooted at the public
/// directory) — never absolute filesystem paths.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizeEntry {
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub webp_path: Option<String>,
    pub width: u32,
    pub height: u32,
    /// Byte size of the JPEG file.
    pub size: u64,
}

/// The full derivative set of one upload, as handed to the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileSizes {
    pub original: SizeEntry,
    pub thumbnail: SizeEntry,
    pub medium: SizeEntry,
    pub full: SizeEntry,
}

/// EXIF fields captured from the upload before the stored copies are
/// re-encoded (and therefore stripped).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExifSummary {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub make: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_time: Option<String>,
}

impl ExifSummary {
    pub fn is_empty(&self) -> bool {
        self.make.is_none() && self.model.is_none() && self.date_time.is_none()
    }
}

/// Probed facts about the uploaded source image.
///
/// `width`/`height` are the upright dimensions — after the EXIF rotation has
/// been physically applied — so consumers never re-interpret orientation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaMetadata {
    pub format: String,
    pub width: u32,
    pub height: u32,
    pub has_alpha: bool,
    /// EXIF orientation of the *source* bytes (1–8). Stored files are always
    /// upright; this records what the upload looked like.
    pub orientation: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exif: Option<ExifSummary>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
}

/// A media document as the store sees it.
///
/// Content fields (`caption`, `tags`, `order`) are the only mutable parts.
/// Derivatives are immutable: replacing an image is delete-then-recreate,
/// never regeneration in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaRecord {
    pub id: String,
    pub album_id: String,
    pub kind: MediaKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    pub order: u32,
    pub uploaded_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_sizes: Option<FileSizes>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<MediaMetadata>,
    // Legacy flat shape, still present on old documents.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub optimized: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
}

/// Tagged view over the two record shapes.
#[derive(Debug, Clone, Copy)]
pub enum MediaPathView<'a> {
    Current(&'a FileSizes),
    Legacy {
        url: Option<&'a str>,
        optimized: Option<&'a str>,
        thumbnail: Option<&'a str>,
    },
}

impl MediaRecord {
    /// Classify this record's shape. A record with `file_sizes` is current
    /// regardless of whatever legacy fields it also carries.
    pub fn path_view(&self) -> MediaPathView<'_> {
        match &self.file_sizes {
            Some(sizes) => MediaPathView::Current(sizes),
            None => MediaPathView::Legacy {
                url: self.url.as_deref(),
                optimized: self.optimized.as_deref(),
                thumbnail: self.thumbnail.as_deref(),
            },
        }
    }

    /// Collapse the record into a uniform size → JPEG-path map.
    ///
    /// Legacy fields map onto their closest size: `url` → original,
    /// `optimized` → medium, `thumbnail` → thumbnail. This is what makes the
    /// cover fallback chain a single lookup over both shapes.
    pub fn paths_by_size(&self) -> BTreeMap<SizeName, &str> {
        let mut map = BTreeMap::new();
        match self.path_view() {
            MediaPathView::Current(sizes) => {
                map.insert(SizeName::Original, sizes.original.path.as_str());
                map.insert(SizeName::Thumbnail, sizes.thumbnail.path.as_str());
                map.insert(SizeName::Medium, sizes.medium.path.as_str());
                map.insert(SizeName::Full, sizes.full.path.as_str());
            }
            MediaPathView::Legacy {
                url,
                optimized,
                thumbnail,
            } => {
                if let Some(p) = url {
                    map.insert(SizeName::Original, p);
                }
                if let Some(p) = optimized {
                    map.insert(SizeName::Medium, p);
                }
                if let Some(p) = thumbnail {
                    map.insert(SizeName::Thumbnail, p);
                }
            }
        }
        map
    }

    /// Every file this record owns on disk, WebP siblings included.
    /// This is the deletion list.
    pub fn all_file_paths(&self) -> Vec<&str> {
        match self.path_view() {
            MediaPathView::Current(sizes) => {
                let mut paths = Vec::with_capacity(7);
                for entry in [
                    &sizes.original,
                    &sizes.thumbnail,
                    &sizes.medium,
                    &sizes.full,
                ] {
                    paths.push(entry.path.as_str());
                    if let Some(webp) = &entry.webp_path {
                        paths.push(webp.as_str());
                    }
                }
                paths
            }
            MediaPathView::Legacy {
                url,
                optimized,
                thumbnail,
            } => [url, optimized, thumbnail].into_iter().flatten().collect(),
        }
    }
}

/// Album aggregate as the store sees it.
///
/// `media_count` is always recomputed by counting media records; it is never
/// incremented or decremented in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlbumRecord {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_image_path: Option<String>,
    #[serde(default)]
    pub media_count: u64,
    /// Web path of the album's upload directory.
    pub storage_directory: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{current_media_record, legacy_media_record};

    #[test]
    fn current_record_collapses_all_four_sizes() {
        let record = current_media_record("m1", "a1", "tok");
        let paths = record.paths_by_size();
        assert_eq!(
            paths[&SizeName::Original],
            "/uploads/albums/a1/original-tok.jpg"
        );
        assert_eq!(paths[&SizeName::Thumbnail], "/uploads/albums/a1/thumbnail-tok.jpg");
        assert_eq!(paths[&SizeName::Medium], "/uploads/albums/a1/medium-tok.jpg");
        assert_eq!(paths[&SizeName::Full], "/uploads/albums/a1/full-tok.jpg");
    }

    #[test]
    fn current_record_lists_seven_files() {
        let record = current_media_record("m1", "a1", "tok");
        let files = record.all_file_paths();
        assert_eq!(files.len(), 7);
        assert!(files.contains(&"/uploads/albums/a1/thumbnail-tok.webp"));
        assert!(files.contains(&"/uploads/albums/a1/original-tok.jpg"));
    }

    #[test]
    fn legacy_record_maps_flat_fields_onto_sizes() {
        let record = legacy_media_record("m2", "a1");
        let paths = record.paths_by_size();
        assert_eq!(paths[&SizeName::Original], "/uploads/albums/a1/img.jpg");
        assert_eq!(paths[&SizeName::Medium], "/uploads/albums/a1/img-opt.jpg");
        assert_eq!(paths[&SizeName::Thumbnail], "/uploads/albums/a1/img-thumb.jpg");
        assert!(!paths.contains_key(&SizeName::Full));
    }

    #[test]
    fn legacy_record_with_only_url() {
        let mut record = legacy_media_record("m3", "a1");
        record.optimized = None;
        record.thumbnail = None;
        let paths = record.paths_by_size();
        assert_eq!(paths.len(), 1);
        assert_eq!(paths[&SizeName::Original], "/uploads/albums/a1/img.jpg");
        assert_eq!(record.all_file_paths(), vec!["/uploads/albums/a1/img.jpg"]);
    }

    #[test]
    fn record_with_file_sizes_ignores_stale_legacy_fields() {
        let mut record = current_media_record("m4", "a1", "tok");
        record.url = Some("/uploads/albums/a1/old.jpg".to_string());
        assert!(matches!(record.path_view(), MediaPathView::Current(_)));
        assert!(!record.all_file_paths().contains(&"/uploads/albums/a1/old.jpg"));
    }

    #[test]
    fn media_record_roundtrips_through_json() {
        let record = current_media_record("m5", "a9", "tok");
        let json = serde_json::to_string(&record).unwrap();
        let back: MediaRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
        // Legacy fields are absent from current-shape JSON entirely.
        assert!(!json.contains("\"url\""));
    }

    #[test]
    fn legacy_record_parses_without_nested_fields() {
        let json = r#"{
            "id": "m6",
            "album_id": "a1",
            "kind": "image",
            "order": 0,
            "uploaded_at": "2024-03-01T12:00:00Z",
            "url": "public/uploads/albums/a1/img.jpg",
            "thumbnail": "/uploads/albums/a1/img-thumb.jpg"
        }"#;
        let record: MediaRecord = serde_json::from_str(json).unwrap();
        assert!(record.file_sizes.is_none());
        assert!(matches!(record.path_view(), MediaPathView::Legacy { .. }));
    }
}

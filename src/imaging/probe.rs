//! Upload probing: format sniffing, decode, and metadata capture.
//!
//! Probing happens before any file is written. Corrupt or unsupported bytes
//! are rejected here, so a failed upload can never leave files behind.

use image::{DynamicImage, ImageFormat};
use thiserror::Error;

use super::exif::{self, ExifData};
use crate::records::ExifSummary;

#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("could not identify image format")]
    Unrecognized(#[source] image::ImageError),
    #[error("unsupported image format: {0}")]
    UnsupportedFormat(&'static str),
    #[error("failed to decode image: {0}")]
    Decode(#[source] image::ImageError),
}

/// Formats whose decoders are compiled in and accepted as uploads.
const SUPPORTED: &[(ImageFormat, &str)] = &[
    (ImageFormat::Jpeg, "jpeg"),
    (ImageFormat::Png, "png"),
    (ImageFormat::Tiff, "tiff"),
    (ImageFormat::WebP, "webp"),
];

/// A decoded upload with everything generation needs to know about it.
#[derive(Debug)]
pub struct Probe {
    /// Decoded pixels, still in stored (pre-rotation) orientation.
    pub image: DynamicImage,
    /// Canonical format name ("jpeg", "png", "tiff", "webp").
    pub format: &'static str,
    /// Stored (pre-rotation) dimensions.
    pub width: u32,
    pub height: u32,
    pub has_alpha: bool,
    /// EXIF orientation, defaulting to 1 (upright) when absent.
    pub orientation: u16,
    pub exif: ExifData,
}

impl Probe {
    /// EXIF fields worth persisting, or `None` when nothing was captured.
    pub fn exif_summary(&self) -> Option<ExifSummary> {
        let summary = ExifSummary {
            make: self.exif.make.clone(),
            model: self.exif.model.clone(),
            date_time: self.exif.date_time.clone(),
        };
        if summary.is_empty() { None } else { Some(summary) }
    }
}

/// Probe raw upload bytes: sniff the format, decode, and read EXIF.
///
/// This is the only place input is validated; everything downstream may
/// assume a well-formed image.
pub fn probe(bytes: &[u8]) -> Result<Probe, ProbeError> {
    let guessed = image::guess_format(bytes).map_err(ProbeError::Unrecognized)?;
    let format = SUPPORTED
        .iter()
        .find(|(f, _)| *f == guessed)
        .map(|(_, name)| *name)
        .ok_or_else(|| {
            ProbeError::UnsupportedFormat(guessed.extensions_str().first().copied().unwrap_or("?"))
        })?;

    let image =
        image::load_from_memory_with_format(bytes, guessed).map_err(ProbeError::Decode)?;

    let exif = exif::read_exif(bytes);
    Ok(Probe {
        width: image.width(),
        height: image.height(),
        has_alpha: image.color().has_alpha(),
        orientation: exif.orientation.unwrap_or(1),
        format,
        exif,
        image,
    })
}

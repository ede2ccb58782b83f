//! Pixel transforms and lossy encoding.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Upright rotation | `image` rotate/flip combinations per EXIF value |
//! | Resize | `image::DynamicImage::resize` with `Lanczos3` |
//! | Cover crop | `image::DynamicImage::resize_to_fill` |
//! | Encode → JPEG | `image::codecs::jpeg::JpegEncoder` (quality 85) |
//! | Encode → WebP | `webp::Encoder` (lossy, quality 85) |
//!
//! Every encode starts from decoded pixels, so the outputs carry no EXIF —
//! stripping is a property of the pipeline, not an extra step.

use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ExtendedColorType, ImageEncoder};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EncodeError {
    #[error("JPEG encode failed: {0}")]
    Jpeg(#[source] image::ImageError),
    #[error("WebP encode failed: {0}")]
    WebP(String),
}

/// Quality setting for lossy image encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(pub u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(85)
    }
}

/// Physically rotate/flip pixels upright according to an EXIF orientation
/// value (1–8). Unknown values pass the image through untouched.
///
/// Value 5 is a transpose (rotate 90° CW then mirror) and 7 a transverse
/// (rotate 270° CW then mirror) — the same mapping the `image` crate uses for
/// its orientation variants.
pub fn apply_orientation(img: DynamicImage, orientation: u16) -> DynamicImage {
    match orientation {
        2 => img.fliph(),
        3 => img.rotate180(),
        4 => img.flipv(),
        5 => img.rotate90().fliph(),
        6 => img.rotate90(),
        7 => img.rotate270().fliph(),
        8 => img.rotate270(),
        _ => img,
    }
}

/// Encode to baseline JPEG at the given quality.
///
/// JPEG has no alpha channel; transparent sources are flattened via RGB
/// conversion. The persisted metadata still records `has_alpha` from the
/// source.
pub fn encode_jpeg(img: &DynamicImage, quality: Quality) -> Result<Vec<u8>, EncodeError> {
    let rgb = img.to_rgb8();
    let mut buf = Vec::new();
    JpegEncoder::new_with_quality(&mut buf, quality.value() as u8)
        .write_image(
            rgb.as_raw(),
            rgb.width(),
            rgb.height(),
            ExtendedColorType::Rgb8,
        )
        .map_err(EncodeError::Jpeg)?;
    Ok(buf)
}

/// Encode to lossy WebP at the given quality, preserving alpha when the
/// source has it.
pub fn encode_webp(img: &DynamicImage, quality: Quality) -> Result<Vec<u8>, EncodeError> {
    let quality = quality.value() as f32;
    let encoded = if img.color().has_alpha() {
        let rgba = img.to_rgba8();
        webp::Encoder::from_rgba(rgba.as_raw(), rgba.width(), rgba.height())
            .encode_simple(false, quality)
    } else {
        let rgb = img.to_rgb8();
        webp::Encoder::from_rgb(rgb.as_raw(), rgb.width(), rgb.height())
            .encode_simple(false, quality)
    }
    .map_err(|e| EncodeError::WebP(format!("{e:?}")))?;
    Ok(encoded.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::gradient_image;

    #[test]
    fn quality_clamps_to_valid_range() {
        assert_eq!(Quality::new(0).value(), 1);
        assert_eq!(Quality::new(85).value(), 85);
        assert_eq!(Quality::new(150).value(), 100);
    }

    #[test]
    fn quality_default_is_85() {
        assert_eq!(Quality::default().value(), 85);
    }

    #[test]
    fn orientation_1_is_identity() {
        let img = gradient_image(40, 30);
        let out = apply_orientation(img, 1);
        assert_eq!((out.width(), out.height()), (40, 30));
    }

    #[test]
    fn rotating_orientations_swap_dimensions() {
        for orientation in [5, 6, 7, 8] {
            let out = apply_orientation(gradient_image(40, 30), orientation);
            assert_eq!(
                (out.width(), out.height()),
                (30, 40),
                "orientation {orientation}"
            );
        }
    }

    #[test]
    fn mirroring_orientations_keep_dimensions() {
        for orientation in [2, 3, 4] {
            let out = apply_orientation(gradient_image(40, 30), orientation);
            assert_eq!((out.width(), out.height()), (40, 30));
        }
    }

    #[test]
    fn orientation_6_moves_top_left_pixel() {
        // A 90° CW rotation sends the top-left corner to the top-right.
        let img = gradient_image(4, 2);
        let corner = img.to_rgb8().get_pixel(0, 0).0;
        let rotated = apply_orientation(img, 6).to_rgb8();
        assert_eq!(rotated.get_pixel(rotated.width() - 1, 0).0, corner);
    }

    #[test]
    fn jpeg_roundtrip_keeps_dimensions() {
        let bytes = encode_jpeg(&gradient_image(64, 48), Quality::default()).unwrap();
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (64, 48));
    }

    #[test]
    fn webp_roundtrip_keeps_dimensions() {
        let bytes = encode_webp(&gradient_image(64, 48), Quality::default()).unwrap();
        assert!(bytes.starts_with(b"RIFF"));
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (64, 48));
    }

    #[test]
    fn webp_encodes_alpha_sources() {
        let rgba = image::RgbaImage::from_fn(16, 16, |x, _| image::Rgba([x as u8 * 10, 0, 0, 128]));
        let bytes = encode_webp(&DynamicImage::ImageRgba8(rgba), Quality::default()).unwrap();
        assert!(!bytes.is_empty());
    }
}

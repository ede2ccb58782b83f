//! Size presets and pure dimension math.
//!
//! All functions here are pure and testable without any I/O or images.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Canonical size names. `Original` never appears in [`PRESETS`] — it is the
/// untouched-resolution copy, not a resize target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SizeName {
    Original,
    Thumbnail,
    Medium,
    Full,
}

impl SizeName {
    pub fn as_str(self) -> &'static str {
        match self {
            SizeName::Original => "original",
            SizeName::Thumbnail => "thumbnail",
            SizeName::Medium => "medium",
            SizeName::Full => "full",
        }
    }
}

impl fmt::Display for SizeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a preset maps source pixels into its target box.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FitMode {
    /// Exactly the target box: fill-resize, then center-crop the longer
    /// dimension.
    Cover,
    /// Within the target box: aspect ratio preserved, shrink-only.
    Inside,
}

/// A named target box for derivative generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizePreset {
    pub name: SizeName,
    pub max_width: u32,
    pub max_height: u32,
    pub fit: FitMode,
}

/// The fixed derivative set: every upload gets exactly these three, each in
/// JPEG and WebP.
pub const PRESETS: [SizePreset; 3] = [
    SizePreset {
        name: SizeName::Thumbnail,
        max_width: 300,
        max_height: 300,
        fit: FitMode::Cover,
    },
    SizePreset {
        name: SizeName::Medium,
        max_width: 800,
        max_height: 600,
        fit: FitMode::Inside,
    },
    SizePreset {
        name: SizeName::Full,
        max_width: 1920,
        max_height: 1080,
        fit: FitMode::Inside,
    },
];

/// Calculate `inside`-fit output dimensions.
///
/// Preserves aspect ratio, shrinks to fit within the box, and never enlarges:
/// a source smaller than the box keeps its own size.
///
/// # Examples
/// ```
/// # use darkroom::imaging::fit_inside;
/// // 4000x3000 into 800x600 → 800x600
/// assert_eq!(fit_inside((4000, 3000), (800, 600)), (800, 600));
/// // 640x480 into 800x600 → unchanged
/// assert_eq!(fit_inside((640, 480), (800, 600)), (640, 480));
/// ```
pub fn fit_inside(source: (u32, u32), target: (u32, u32)) -> (u32, u32) {
    let (src_w, src_h) = source;
    let (max_w, max_h) = target;

    if src_w <= max_w && src_h <= max_h {
        return (src_w, src_h);
    }

    let scale = (max_w as f64 / src_w as f64).min(max_h as f64 / src_h as f64);
    let w = ((src_w as f64 * scale).round() as u32).max(1);
    let h = ((src_h as f64 * scale).round() as u32).max(1);
    (w, h)
}

/// Calculate dimensions needed to fill a target area (resize before crop).
///
/// Returns dimensions that completely cover the target while maintaining the
/// source aspect ratio. One dimension matches exactly, the other may exceed
/// and gets center-cropped away.
pub fn fill_dimensions(source: (u32, u32), target: (u32, u32)) -> (u32, u32) {
    let (src_w, src_h) = source;
    let (tgt_w, tgt_h) = target;

    let src_aspect = src_w as f64 / src_h as f64;
    let tgt_aspect = tgt_w as f64 / tgt_h as f64;

    if src_aspect > tgt_aspect {
        // Source is wider: height matches, width exceeds
        let h = tgt_h;
        let w = (h as f64 * src_aspect).round() as u32;
        (w, h)
    } else {
        // Source is taller: width matches, height exceeds
        let w = tgt_w;
        let h = (w as f64 / src_aspect).round() as u32;
        (w, h)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preset_table_matches_contract() {
        assert_eq!(PRESETS.len(), 3);
        let thumb = &PRESETS[0];
        assert_eq!(thumb.name, SizeName::Thumbnail);
        assert_eq!((thumb.max_width, thumb.max_height), (300, 300));
        assert_eq!(thumb.fit, FitMode::Cover);

        let medium = &PRESETS[1];
        assert_eq!((medium.max_width, medium.max_height), (800, 600));
        assert_eq!(medium.fit, FitMode::Inside);

        let full = &PRESETS[2];
        assert_eq!((full.max_width, full.max_height), (1920, 1080));
        assert_eq!(full.fit, FitMode::Inside);
    }

    #[test]
    fn inside_shrinks_landscape_to_box() {
        // 4000x3000 (4:3) into 800x600 (4:3) — exact fit
        assert_eq!(fit_inside((4000, 3000), (800, 600)), (800, 600));
    }

    #[test]
    fn inside_constrains_on_the_tighter_axis() {
        // 4000x2000 (2:1) into 800x600: width is the tighter axis
        assert_eq!(fit_inside((4000, 2000), (800, 600)), (800, 400));
        // 2000x4000 (1:2) into 800x600: height is the tighter axis
        assert_eq!(fit_inside((2000, 4000), (800, 600)), (300, 600));
    }

    #[test]
    fn inside_never_enlarges() {
        assert_eq!(fit_inside((640, 480), (800, 600)), (640, 480));
        assert_eq!(fit_inside((1, 1), (1920, 1080)), (1, 1));
    }

    #[test]
    fn inside_shrinks_when_one_axis_exceeds() {
        // Width fits, height doesn't
        assert_eq!(fit_inside((500, 1200), (800, 600)), (250, 600));
    }

    #[test]
    fn inside_preserves_aspect_within_one_pixel() {
        for source in [(3456, 2304), (1131, 777), (999, 1001)] {
            let (w, h) = fit_inside(source, (800, 600));
            let src_aspect = source.0 as f64 / source.1 as f64;
            let out_aspect = w as f64 / h as f64;
            // Rounding to whole pixels may shift the ratio slightly
            assert!(
                (src_aspect - out_aspect).abs() * h as f64 <= 1.0,
                "aspect drifted more than 1px for {source:?}: got {w}x{h}"
            );
        }
    }

    #[test]
    fn fill_wider_source_exceeds_horizontally() {
        // 800x600 into 300x300: height matches, width overflows for cropping
        assert_eq!(fill_dimensions((800, 600), (300, 300)), (400, 300));
    }

    #[test]
    fn fill_taller_source_exceeds_vertically() {
        assert_eq!(fill_dimensions((600, 800), (300, 300)), (300, 400));
    }

    #[test]
    fn fill_same_aspect_is_exact() {
        assert_eq!(fill_dimensions((900, 900), (300, 300)), (300, 300));
    }

    #[test]
    fn size_name_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&SizeName::Thumbnail).unwrap(), "\"thumbnail\"");
        assert_eq!(SizeName::Full.to_string(), "full");
    }
}

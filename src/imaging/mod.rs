//! Image probing, dimension math, and encoding. Everything runs in-process;
//! no ImageMagick, no shelling out.
//!
//! | Operation | Module |
//! |---|---|
//! | **Probe** (format, dimensions, alpha, EXIF) | [`probe`] |
//! | **EXIF parsing** (JPEG APP1 + TIFF IFD) | [`exif`] |
//! | **Size presets + fit math** | [`presets`] |
//! | **Rotate / encode** (JPEG + WebP) | [`encode`] |
//!
//! The split mirrors the pipeline: everything in [`presets`] is pure and
//! I/O-free, [`exif`] never fails, and only [`probe`]/[`encode`] touch real
//! pixel data.

pub mod encode;
pub(crate) mod exif;
pub mod presets;
pub mod probe;

pub use encode::{Quality, apply_orientation, encode_jpeg, encode_webp};
pub use presets::{FitMode, PRESETS, SizeName, SizePreset, fill_dimensions, fit_inside};
pub use probe::{Probe, ProbeError, probe};

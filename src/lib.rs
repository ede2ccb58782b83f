//! # Darkroom
//!
//! The imaging and storage engine behind an album-based media manager:
//! every upload becomes a fixed set of web-ready derivatives, and every
//! record of those files can be created, migrated, and torn down again
//! without leaving orphans behind.
//!
//! # Architecture: One Upload, Seven Files
//!
//! An accepted image is decoded once, rotated upright per its EXIF
//! orientation, and fanned out into the canonical derivative set:
//!
//! ```text
//! original   — upright re-encode of the source        (JPEG)
//! thumbnail  — 300x300 center cover-crop              (JPEG + WebP)
//! medium     — fits 800x600, shrink-only              (JPEG + WebP)
//! full       — fits 1920x1080, shrink-only            (JPEG + WebP)
//! ```
//!
//! Generation is all-or-nothing: either all seven files land on disk and a
//! record describing them is persisted, or nothing of the upload remains.
//! There is no partial state to reconcile later.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`imaging`] | Pure image work: size presets, fit math, EXIF reading, rotation, JPEG/WebP encoding |
//! | [`layout`] | Directory and path scheme — web paths, filesystem paths, legacy path migration |
//! | [`records`] | Persisted record shapes and the tagged view over legacy and current media documents |
//! | [`store`] | The persistence seam ([`store::MediaStore`]) the lifecycle operations run against |
//! | [`generate`] | The derivative generator: token naming, parallel encoding, failure cleanup |
//! | [`lifecycle`] | Create / delete / cascade-delete / migrate, tying files and records together |
//! | [`cover`] | Album cover selection fallback chain and the square cover renderer |
//!
//! # Design Decisions
//!
//! ## Web Paths as the Stored Currency
//!
//! Every persisted path is a *web path*: leading slash, rooted at the public
//! directory (`/uploads/albums/{album}/...`). Filesystem paths are derived
//! at the moment of I/O and never stored, so records stay valid when the
//! public root moves. [`layout::normalize`] rewrites the historical
//! `public/`-prefixed form and is idempotent, which makes the migration in
//! [`lifecycle::LifecycleManager::migrate_store_paths`] safe to re-run.
//!
//! ## Fail-Fast Creation, Never-Abort Deletion
//!
//! The two directions have opposite error philosophies. Creating media
//! aborts on the first problem and deletes whatever it already wrote.
//! Deleting media pushes through every step regardless of individual
//! failures and reports an aggregate tally — a half-deleted album you can
//! retry beats a cascade that stops at the first unreadable file.
//!
//! ## No Locks, Just Emptiness Checks
//!
//! Concurrent uploads to one album are safe because every file name embeds
//! a per-upload token (millisecond timestamp plus 16 random bytes). The one
//! cross-upload touch point — removing an album directory during cascade
//! delete — is guarded by an emptiness check instead of a lock: a directory
//! holding files the cascade doesn't know about is simply left in place.
//!
//! ## In-Process Imaging
//!
//! Decoding, rotation, resampling (Lanczos3), and both encoders run inside
//! the process via the `image` crate and bundled libwebp. No ImageMagick,
//! no system packages, no subprocess; the engine is fully self-contained
//! and the same bytes come out on every platform.
//!
//! ## EXIF Is Applied, Then Dropped
//!
//! Rotation is applied to pixels exactly once, at ingest. Every stored file
//! is re-encoded from those upright pixels, so no derivative carries EXIF —
//! GPS coordinates and camera serial numbers never reach the public
//! directory. The few fields worth keeping (camera make/model, capture
//! time) are captured into the record's metadata before the strip.

pub mod cover;
pub mod generate;
pub mod imaging;
pub mod layout;
pub mod lifecycle;
pub mod records;
pub mod store;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use cover::CoverSelector;
pub use generate::{ArtifactSet, DerivativeGenerator, GenerateError, UploadToken};
pub use layout::StorageLayout;
pub use lifecycle::{CascadeOutcome, CascadeReport, LifecycleManager};
pub use records::{AlbumRecord, MediaRecord};
pub use store::MediaStore;

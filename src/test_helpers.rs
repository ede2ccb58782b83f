//! Shared test fixtures: synthetic images, hand-built EXIF/TIFF structures,
//! and canned store records. Everything here is deterministic.

use chrono::{TimeZone, Utc};
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{DynamicImage, ExtendedColorType, ImageEncoder, Rgb, RgbImage, Rgba, RgbaImage};

use crate::layout::StorageLayout;
use crate::records::{AlbumRecord, FileSizes, MediaKind, MediaRecord, SizeEntry};

/// An RGB gradient with distinct corners, so rotations and crops are
/// detectable in pixel assertions.
pub fn gradient_image(width: u32, height: u32) -> DynamicImage {
    let img = RgbImage::from_fn(width, height, |x, y| {
        Rgb([
            (x * 255 / width.max(1)) as u8,
            (y * 255 / height.max(1)) as u8,
            128,
        ])
    });
    DynamicImage::ImageRgb8(img)
}

/// A baseline JPEG of the gradient, no EXIF.
pub fn jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = gradient_image(width, height);
    let mut buf = Vec::new();
    JpegEncoder::new_with_quality(&mut buf, 85)
        .write_image(
            img.to_rgb8().as_raw(),
            width,
            height,
            ExtendedColorType::Rgb8,
        )
        .unwrap();
    buf
}

/// A JPEG with an EXIF APP1 segment spliced in right after SOI.
pub fn jpeg_bytes_with_orientation(width: u32, height: u32, orientation: u16) -> Vec<u8> {
    let jpeg = jpeg_bytes(width, height);
    let mut out = Vec::with_capacity(jpeg.len() + 64);
    out.extend_from_slice(&jpeg[..2]);
    out.extend_from_slice(&exif_app1_segment(orientation));
    out.extend_from_slice(&jpeg[2..]);
    out
}

/// A PNG with a non-opaque alpha channel.
pub fn png_bytes_with_alpha(width: u32, height: u32) -> Vec<u8> {
    let img = RgbaImage::from_fn(width, height, |x, y| {
        Rgba([
            (x * 255 / width.max(1)) as u8,
            (y * 255 / height.max(1)) as u8,
            128,
            200,
        ])
    });
    let mut buf = Vec::new();
    PngEncoder::new(&mut buf)
        .write_image(img.as_raw(), width, height, ExtendedColorType::Rgba8)
        .unwrap();
    buf
}

/// A complete JPEG APP1 segment (marker, length, "Exif\0\0", TIFF body)
/// carrying the given orientation.
pub fn exif_app1_segment(orientation: u16) -> Vec<u8> {
    let tiff = tiff_with_ifd0(true, orientation, None, None, None);
    let mut payload = b"Exif\0\0".to_vec();
    payload.extend_from_slice(&tiff);

    let mut segment = vec![0xFF, 0xE1];
    segment.extend_from_slice(&((payload.len() + 2) as u16).to_be_bytes());
    segment.extend_from_slice(&payload);
    segment
}

/// A minimal TIFF structure with a single IFD0 holding the given tags.
/// ASCII values longer than four bytes are placed after the IFD with a
/// pointed-to offset, shorter ones inline.
pub fn tiff_with_ifd0(
    big_endian: bool,
    orientation: u16,
    make: Option<&str>,
    model: Option<&str>,
    date_time: Option<&str>,
) -> Vec<u8> {
    let u16b = |v: u16| -> [u8; 2] {
        if big_endian {
            v.to_be_bytes()
        } else {
            v.to_le_bytes()
        }
    };
    let u32b = |v: u32| -> [u8; 4] {
        if big_endian {
            v.to_be_bytes()
        } else {
            v.to_le_bytes()
        }
    };

    struct Entry {
        tag: u16,
        typ: u16,
        count: u32,
        // Exactly one of these is set
        inline: Option<[u8; 4]>,
        heap: Option<Vec<u8>>,
    }

    let mut entries = Vec::new();
    for (tag, value) in [
        (0x010F_u16, make),
        (0x0110, model),
        (0x0132, date_time),
    ] {
        let Some(text) = value else { continue };
        let mut bytes = text.as_bytes().to_vec();
        bytes.push(0);
        let count = bytes.len() as u32;
        if bytes.len() <= 4 {
            let mut inline = [0u8; 4];
            inline[..bytes.len()].copy_from_slice(&bytes);
            entries.push(Entry {
                tag,
                typ: 2,
                count,
                inline: Some(inline),
                heap: None,
            });
        } else {
            entries.push(Entry {
                tag,
                typ: 2,
                count,
                inline: None,
                heap: Some(bytes),
            });
        }
    }
    let mut orientation_inline = [0u8; 4];
    orientation_inline[..2].copy_from_slice(&u16b(orientation));
    entries.push(Entry {
        tag: 0x0112,
        typ: 3,
        count: 1,
        inline: Some(orientation_inline),
        heap: None,
    });
    entries.sort_by_key(|e| e.tag);

    // Header (8) + entry count (2) + entries (12 each) + next-IFD link (4),
    // then the out-of-line value heap.
    let heap_start = 8 + 2 + entries.len() * 12 + 4;

    let mut out = Vec::new();
    out.extend_from_slice(if big_endian { b"MM" } else { b"II" });
    out.extend_from_slice(&u16b(42));
    out.extend_from_slice(&u32b(8));
    out.extend_from_slice(&u16b(entries.len() as u16));

    let mut heap: Vec<u8> = Vec::new();
    for entry in &entries {
        out.extend_from_slice(&u16b(entry.tag));
        out.extend_from_slice(&u16b(entry.typ));
        out.extend_from_slice(&u32b(entry.count));
        match (&entry.inline, &entry.heap) {
            (Some(inline), _) => out.extend_from_slice(inline),
            (None, Some(data)) => {
                out.extend_from_slice(&u32b((heap_start + heap.len()) as u32));
                heap.extend_from_slice(data);
            }
            (None, None) => unreachable!(),
        }
    }
    out.extend_from_slice(&u32b(0));
    out.extend_from_slice(&heap);
    out
}

/// A current-shape record whose seven paths follow the generator's naming.
pub fn current_media_record(id: &str, album_id: &str, token: &str) -> MediaRecord {
    let entry = |size: &str, width: u32, height: u32, webp: bool| SizeEntry {
        path: format!("/uploads/albums/{album_id}/{size}-{token}.jpg"),
        webp_path: webp.then(|| format!("/uploads/albums/{album_id}/{size}-{token}.webp")),
        width,
        height,
        size: 10_000,
    };
    MediaRecord {
        id: id.to_string(),
        album_id: album_id.to_string(),
        kind: MediaKind::Image,
        caption: None,
        tags: Vec::new(),
        order: 0,
        uploaded_at: Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap(),
        file_sizes: Some(FileSizes {
            original: entry("original", 2000, 1500, false),
            thumbnail: entry("thumbnail", 300, 300, true),
            medium: entry("medium", 800, 600, true),
            full: entry("full", 1440, 1080, true),
        }),
        metadata: None,
        url: None,
        optimized: None,
        thumbnail: None,
    }
}

/// A legacy-shape record with the three flat path fields and no
/// `file_sizes`.
pub fn legacy_media_record(id: &str, album_id: &str) -> MediaRecord {
    MediaRecord {
        id: id.to_string(),
        album_id: album_id.to_string(),
        kind: MediaKind::Image,
        caption: None,
        tags: Vec::new(),
        order: 0,
        uploaded_at: Utc.with_ymd_and_hms(2022, 6, 15, 9, 30, 0).unwrap(),
        file_sizes: None,
        metadata: None,
        url: Some(format!("/uploads/albums/{album_id}/img.jpg")),
        optimized: Some(format!("/uploads/albums/{album_id}/img-opt.jpg")),
        thumbnail: Some(format!("/uploads/albums/{album_id}/img-thumb.jpg")),
    }
}

/// A bare album with no cover and no media yet.
pub fn album_record(id: &str) -> AlbumRecord {
    AlbumRecord {
        id: id.to_string(),
        title: format!("Album {id}"),
        cover_image_path: None,
        media_count: 0,
        storage_directory: format!("/uploads/albums/{id}"),
    }
}

/// Write a stub file at every path a record references, creating parent
/// directories as needed.
pub fn materialize_record_files(layout: &StorageLayout, record: &MediaRecord) {
    for web in record.all_file_paths() {
        let path = layout.fs_path(web);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(&path, b"stub").unwrap();
    }
}

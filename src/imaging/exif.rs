//! Minimal EXIF parser for JPEG and TIFF bytes.
//!
//! Extracts four IFD0 fields:
//! - Orientation (0x0112) — needed to physically rotate pixels upright
//! - Make (0x010F) / Model (0x0110) — camera identification
//! - DateTime (0x0132) — capture/modify timestamp string
//!
//! For JPEG: reads from the APP1 marker ("Exif\0\0" header + embedded TIFF).
//! For TIFF: reads the IFD chain directly.
//!
//! Zero external dependencies — pure Rust. Parse failures of any kind yield
//! default (empty) data, never an error: metadata is best-effort, pixels are
//! not.

/// EXIF fields extracted from an image, all optional.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExifData {
    /// Raw orientation value 1–8; `None` when absent or out of range.
    pub orientation: Option<u16>,
    pub make: Option<String>,
    pub model: Option<String>,
    pub date_time: Option<String>,
}

impl ExifData {
    pub fn is_empty(&self) -> bool {
        self.orientation.is_none()
            && self.make.is_none()
            && self.model.is_none()
            && self.date_time.is_none()
    }
}

/// Read EXIF data from raw image bytes, dispatching on the container.
///
/// JPEG (SOI marker) and TIFF (byte-order marker) are recognized; anything
/// else returns default data.
pub fn read_exif(bytes: &[u8]) -> ExifData {
    if bytes.starts_with(&[0xFF, 0xD8]) {
        return read_exif_from_jpeg(bytes);
    }
    if bytes.starts_with(b"MM") || bytes.starts_with(b"II") {
        return parse_tiff(bytes);
    }
    ExifData::default()
}

// ---------------------------------------------------------------------------
// JPEG: locate the APP1 Exif segment
// ---------------------------------------------------------------------------

const EXIF_HEADER: &[u8] = b"Exif\0\0";

/// Scan JPEG markers for APP1 (0xFF 0xE1) carrying an "Exif\0\0" payload and
/// parse the embedded TIFF structure.
fn read_exif_from_jpeg(data: &[u8]) -> ExifData {
    let mut pos = 0;
    while pos + 4 < data.len() {
        if data[pos] == 0xFF && data[pos + 1] == 0xE1 {
            let seg_len = u16::from_be_bytes([data[pos + 2], data[pos + 3]]) as usize;
            let seg_start = pos + 4;
            let seg_end = (pos + 2 + seg_len).min(data.len());
            let segment = &data[seg_start..seg_end.max(seg_start)];

            if segment.starts_with(EXIF_HEADER) {
                return parse_tiff(&segment[EXIF_HEADER.len()..]);
            }
        }

        // Advance: if at a marker, skip marker + length; otherwise byte-by-byte
        if data[pos] == 0xFF && pos + 3 < data.len() && data[pos + 1] != 0x00 {
            let marker = data[pos + 1];
            // SOS (0xDA) means image data starts — stop scanning
            if marker == 0xDA {
                break;
            }
            // Markers without length field
            if marker == 0xD8 || marker == 0xD9 || (0xD0..=0xD7).contains(&marker) {
                pos += 2;
            } else {
                let len = u16::from_be_bytes([data[pos + 2], data[pos + 3]]) as usize;
                pos += 2 + len;
            }
        } else {
            pos += 1;
        }
    }
    ExifData::default()
}

// ---------------------------------------------------------------------------
// TIFF IFD walk
// ---------------------------------------------------------------------------

const TAG_MAKE: u16 = 0x010F;
const TAG_MODEL: u16 = 0x0110;
const TAG_ORIENTATION: u16 = 0x0112;
const TAG_DATE_TIME: u16 = 0x0132;

/// Parse a TIFF structure (standalone file or the payload of a JPEG APP1
/// segment). Offsets in entries are relative to the start of `data`.
fn parse_tiff(data: &[u8]) -> ExifData {
    if data.len() < 8 {
        return ExifData::default();
    }

    let big_endian = match &data[0..2] {
        b"MM" => true,
        b"II" => false,
        _ => return ExifData::default(),
    };

    let read_u16 = |offset: usize| -> u16 {
        if big_endian {
            u16::from_be_bytes([data[offset], data[offset + 1]])
        } else {
            u16::from_le_bytes([data[offset], data[offset + 1]])
        }
    };

    let read_u32 = |offset: usize| -> u32 {
        if big_endian {
            u32::from_be_bytes([
                data[offset],
                data[offset + 1],
                data[offset + 2],
                data[offset + 3],
            ])
        } else {
            u32::from_le_bytes([
                data[offset],
                data[offset + 1],
                data[offset + 2],
                data[offset + 3],
            ])
        }
    };

    // Verify TIFF magic (42)
    if read_u16(2) != 42 {
        return ExifData::default();
    }

    let type_size = |typ: u16| -> usize {
        match typ {
            1 | 2 | 6 | 7 => 1, // BYTE, ASCII, SBYTE, UNDEFINED
            3 | 8 => 2,         // SHORT, SSHORT
            4 | 9 | 11 => 4,    // LONG, SLONG, FLOAT
            5 | 10 | 12 => 8,   // RATIONAL, SRATIONAL, DOUBLE
            _ => 1,
        }
    };

    let mut result = ExifData::default();
    let mut ifd_offset = read_u32(4) as usize;

    // Walk the IFD chain (IFD0 + linked IFDs). The next-IFD pointers come
    // from untrusted upload bytes, so a revisited offset (a cycle) ends the
    // walk with whatever was parsed so far.
    let mut visited: Vec<usize> = Vec::new();
    while ifd_offset > 0 && ifd_offset + 2 < data.len() {
        if visited.contains(&ifd_offset) {
            return result;
        }
        visited.push(ifd_offset);
        let entry_count = read_u16(ifd_offset) as usize;
        let entries_start = ifd_offset + 2;

        for i in 0..entry_count {
            let entry_offset = entries_start + i * 12;
            if entry_offset + 12 > data.len() {
                return result;
            }

            let tag = read_u16(entry_offset);
            let typ = read_u16(entry_offset + 2);
            let count = read_u32(entry_offset + 4) as usize;
            let byte_len = count.saturating_mul(type_size(typ));

            // Values of 4 bytes or fewer are stored inline in the value field;
            // larger values live at the pointed-to offset.
            let value_start = if byte_len <= 4 {
                entry_offset + 8
            } else {
                read_u32(entry_offset + 8) as usize
            };
            if value_start + byte_len > data.len() {
                continue;
            }

            match tag {
                TAG_ORIENTATION if typ == 3 && count >= 1 => {
                    let value = read_u16(value_start);
                    if (1..=8).contains(&value) {
                        result.orientation = Some(value);
                    }
                }
                TAG_MAKE => {
                    result.make = read_ascii(&data[value_start..value_start + byte_len]);
                }
                TAG_MODEL => {
                    result.model = read_ascii(&data[value_start..value_start + byte_len]);
                }
                TAG_DATE_TIME => {
                    result.date_time = read_ascii(&data[value_start..value_start + byte_len]);
                }
                _ => {}
            }
        }

        // Next IFD offset
        let next_offset_pos = entries_start + entry_count * 12;
        if next_offset_pos + 4 <= data.len() {
            ifd_offset = read_u32(next_offset_pos) as usize;
        } else {
            break;
        }
    }

    result
}

/// Decode a NUL-terminated ASCII value, trimming padding. Empty → None.
fn read_ascii(bytes: &[u8]) -> Option<String> {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    let value = String::from_utf8_lossy(&bytes[..end]).trim().to_string();
    if value.is_empty() { None } else { Some(value) }
}

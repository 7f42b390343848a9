//! Minimal classic-TIFF directory reader
//!
//! Reads the header and the first Image File Directory (IFD) of a TIFF file
//! and decodes each entry into a [`TagValue`]. Later IFDs are never visited;
//! pixel decoding is left to the `image` crate.

use byteorder::{BigEndian, ByteOrder, LittleEndian, ReadBytesExt};
use log::{debug, trace, warn};
use std::io::{self, Read, Seek, SeekFrom};

use crate::types::TagValue;

pub const TIFF_VERSION: u16 = 42;
pub const BIG_TIFF_VERSION: u16 = 43;

/// TIFF field type codes
pub mod field_types {
    pub const BYTE: u16 = 1;
    pub const ASCII: u16 = 2;
    pub const SHORT: u16 = 3;
    pub const LONG: u16 = 4;
    pub const RATIONAL: u16 = 5;
    pub const SBYTE: u16 = 6;
    pub const UNDEFINED: u16 = 7;
    pub const SSHORT: u16 = 8;
    pub const SLONG: u16 = 9;
    pub const SRATIONAL: u16 = 10;
    pub const FLOAT: u16 = 11;
    pub const DOUBLE: u16 = 12;
    pub const IFD: u16 = 13;
}

/// Byte order declared in the TIFF header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endianness {
    /// "II"
    Little,
    /// "MM"
    Big,
}

impl Endianness {
    fn detect(marker: [u8; 2]) -> Option<Self> {
        match &marker {
            b"II" => Some(Endianness::Little),
            b"MM" => Some(Endianness::Big),
            _ => None,
        }
    }

    fn read_u16<R: Read>(self, reader: &mut R) -> io::Result<u16> {
        match self {
            Endianness::Little => reader.read_u16::<LittleEndian>(),
            Endianness::Big => reader.read_u16::<BigEndian>(),
        }
    }

    fn read_u32<R: Read>(self, reader: &mut R) -> io::Result<u32> {
        match self {
            Endianness::Little => reader.read_u32::<LittleEndian>(),
            Endianness::Big => reader.read_u32::<BigEndian>(),
        }
    }

    fn u16(self, buf: &[u8]) -> u16 {
        match self {
            Endianness::Little => LittleEndian::read_u16(buf),
            Endianness::Big => BigEndian::read_u16(buf),
        }
    }

    fn u32(self, buf: &[u8]) -> u32 {
        match self {
            Endianness::Little => LittleEndian::read_u32(buf),
            Endianness::Big => BigEndian::read_u32(buf),
        }
    }

    fn i16(self, buf: &[u8]) -> i16 {
        match self {
            Endianness::Little => LittleEndian::read_i16(buf),
            Endianness::Big => BigEndian::read_i16(buf),
        }
    }

    fn i32(self, buf: &[u8]) -> i32 {
        match self {
            Endianness::Little => LittleEndian::read_i32(buf),
            Endianness::Big => BigEndian::read_i32(buf),
        }
    }

    fn f32(self, buf: &[u8]) -> f32 {
        match self {
            Endianness::Little => LittleEndian::read_f32(buf),
            Endianness::Big => BigEndian::read_f32(buf),
        }
    }

    fn f64(self, buf: &[u8]) -> f64 {
        match self {
            Endianness::Little => LittleEndian::read_f64(buf),
            Endianness::Big => BigEndian::read_f64(buf),
        }
    }
}

/// Entry as laid out in the directory, before its value is resolved
struct DirectoryEntry {
    tag: u16,
    field_type: u16,
    count: u32,
    value_field: [u8; 4],
}

/// Size in bytes of one value of `field_type`, `None` for unknown types
fn field_type_size(field_type: u16) -> Option<u64> {
    use field_types::*;
    match field_type {
        BYTE | ASCII | SBYTE | UNDEFINED => Some(1),
        SHORT | SSHORT => Some(2),
        LONG | SLONG | FLOAT | IFD => Some(4),
        RATIONAL | SRATIONAL | DOUBLE => Some(8),
        _ => None,
    }
}

fn invalid_data(message: impl Into<String>) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, message.into())
}

/// Reads every entry of the first IFD
///
/// Entries with an unknown field type, or whose data lies outside the file,
/// are skipped. A malformed header or directory is reported as
/// [`io::ErrorKind::InvalidData`].
pub fn read_first_ifd<R: Read + Seek>(reader: &mut R) -> io::Result<Vec<(u16, TagValue)>> {
    let file_size = reader.seek(SeekFrom::End(0))?;
    reader.seek(SeekFrom::Start(0))?;

    let mut marker = [0u8; 2];
    reader.read_exact(&mut marker)?;
    let order = Endianness::detect(marker)
        .ok_or_else(|| invalid_data(format!("invalid byte order marker {:02x?}", marker)))?;

    match order.read_u16(reader)? {
        TIFF_VERSION => debug!("Detected classic TIFF ({:?} endian)", order),
        BIG_TIFF_VERSION => return Err(invalid_data("BigTIFF is not supported")),
        other => return Err(invalid_data(format!("unsupported TIFF version {}", other))),
    }

    let ifd_offset = order.read_u32(reader)? as u64;
    if ifd_offset < 8 || ifd_offset >= file_size {
        return Err(invalid_data(format!(
            "first IFD offset {} outside file of {} bytes",
            ifd_offset, file_size
        )));
    }

    reader.seek(SeekFrom::Start(ifd_offset))?;
    let entry_count = order.read_u16(reader)?;
    debug!("IFD 0 at offset {} has {} entries", ifd_offset, entry_count);

    let mut directory = Vec::with_capacity(entry_count as usize);
    for _ in 0..entry_count {
        let tag = order.read_u16(reader)?;
        let field_type = order.read_u16(reader)?;
        let count = order.read_u32(reader)?;
        let mut value_field = [0u8; 4];
        reader.read_exact(&mut value_field)?;
        directory.push(DirectoryEntry {
            tag,
            field_type,
            count,
            value_field,
        });
    }

    let mut values = Vec::with_capacity(directory.len());
    for entry in directory {
        let Some(type_size) = field_type_size(entry.field_type) else {
            debug!(
                "Skipping tag {} with unknown field type {}",
                entry.tag, entry.field_type
            );
            continue;
        };

        let total = type_size * entry.count as u64;
        let data = if total <= 4 {
            entry.value_field[..total as usize].to_vec()
        } else {
            let offset = order.u32(&entry.value_field) as u64;
            if offset.checked_add(total).map_or(true, |end| end > file_size) {
                warn!(
                    "Tag {} data ({} bytes at offset {}) exceeds file size {}, skipping",
                    entry.tag, total, offset, file_size
                );
                continue;
            }
            reader.seek(SeekFrom::Start(offset))?;
            let mut buf = vec![0u8; total as usize];
            reader.read_exact(&mut buf)?;
            buf
        };

        trace!(
            "Tag {}: type={}, count={}, {} bytes",
            entry.tag,
            entry.field_type,
            entry.count,
            data.len()
        );
        values.push((entry.tag, decode_value(order, entry.field_type, &data)));
    }

    Ok(values)
}

fn decode_value(order: Endianness, field_type: u16, data: &[u8]) -> TagValue {
    use field_types::*;
    match field_type {
        ASCII => TagValue::Ascii(data.to_vec()),
        SBYTE => TagValue::Signed(data.iter().map(|&b| b as i8 as i64).collect()),
        SHORT => TagValue::Unsigned(data.chunks_exact(2).map(|c| order.u16(c) as u64).collect()),
        LONG | IFD => {
            TagValue::Unsigned(data.chunks_exact(4).map(|c| order.u32(c) as u64).collect())
        }
        SSHORT => TagValue::Signed(data.chunks_exact(2).map(|c| order.i16(c) as i64).collect()),
        SLONG => TagValue::Signed(data.chunks_exact(4).map(|c| order.i32(c) as i64).collect()),
        RATIONAL => TagValue::Rational(
            data.chunks_exact(8)
                .map(|c| (order.u32(&c[..4]), order.u32(&c[4..])))
                .collect(),
        ),
        SRATIONAL => TagValue::SignedRational(
            data.chunks_exact(8)
                .map(|c| (order.i32(&c[..4]), order.i32(&c[4..])))
                .collect(),
        ),
        FLOAT => TagValue::Float(data.chunks_exact(4).map(|c| order.f32(c) as f64).collect()),
        DOUBLE => TagValue::Float(data.chunks_exact(8).map(|c| order.f64(c)).collect()),
        // BYTE, UNDEFINED
        _ => TagValue::Bytes(data.to_vec()),
    }
}

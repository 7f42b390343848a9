use crate::error::{FibresemError, Result};
use crate::types::RawTagMap;
use image::{DynamicImage, ImageFormat};
use log::debug;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use super::tiff_reader::read_first_ifd;

// Baseline Image Tags
pub const IMAGE_WIDTH: u16 = 256;
pub const IMAGE_LENGTH: u16 = 257;
pub const BITS_PER_SAMPLE: u16 = 258;
pub const COMPRESSION: u16 = 259;
pub const PHOTOMETRIC_INTERPRETATION: u16 = 262;
pub const STRIP_OFFSETS: u16 = 273;
pub const SAMPLES_PER_PIXEL: u16 = 277;
pub const ROWS_PER_STRIP: u16 = 278;
pub const STRIP_BYTE_COUNTS: u16 = 279;
pub const X_RESOLUTION: u16 = 282;
pub const Y_RESOLUTION: u16 = 283;
pub const RESOLUTION_UNIT: u16 = 296;

// Descriptive Tags
pub const IMAGE_DESCRIPTION: u16 = 270;
pub const MAKE: u16 = 271;
pub const MODEL: u16 = 272;
pub const SOFTWARE: u16 = 305;
pub const DATE_TIME: u16 = 306;

// ZEISS SEM Tags
pub const CZ_SEM: u16 = 34118;
pub const ZEISS_SEM_METADATA: u16 = 34119;

/// Returns a human-readable name for a tag id
pub fn tag_name(tag: u16) -> &'static str {
    match tag {
        IMAGE_WIDTH => "ImageWidth",
        IMAGE_LENGTH => "ImageLength",
        BITS_PER_SAMPLE => "BitsPerSample",
        COMPRESSION => "Compression",
        PHOTOMETRIC_INTERPRETATION => "PhotometricInterpretation",
        IMAGE_DESCRIPTION => "ImageDescription",
        MAKE => "Make",
        MODEL => "Model",
        STRIP_OFFSETS => "StripOffsets",
        SAMPLES_PER_PIXEL => "SamplesPerPixel",
        ROWS_PER_STRIP => "RowsPerStrip",
        STRIP_BYTE_COUNTS => "StripByteCounts",
        X_RESOLUTION => "XResolution",
        Y_RESOLUTION => "YResolution",
        RESOLUTION_UNIT => "ResolutionUnit",
        SOFTWARE => "Software",
        DATE_TIME => "DateTime",
        CZ_SEM => "CZ_SEM",
        ZEISS_SEM_METADATA => "ZeissSemMetadata",
        _ => "Unknown",
    }
}

/// Reads all tags of the first page of a TIFF file
///
/// # Errors
///
/// Returns [`FibresemError::FileRead`] if the file cannot be opened or is not
/// a valid classic TIFF.
pub fn read_tags(path: &Path) -> Result<RawTagMap> {
    let file = File::open(path).map_err(|e| FibresemError::file_read(path, e))?;
    let mut reader = BufReader::new(file);

    let entries = read_first_ifd(&mut reader).map_err(|e| FibresemError::file_read(path, e))?;
    let tags: RawTagMap = entries.into_iter().collect();

    debug!("Read {} tags from {}", tags.len(), path.display());
    Ok(tags)
}

/// Reads the tags and decodes the pixels of the first page
///
/// # Errors
///
/// Returns [`FibresemError::FileRead`] if either the tag directory or the
/// pixel data cannot be read.
pub fn read_image(path: &Path) -> Result<(RawTagMap, DynamicImage)> {
    let tags = read_tags(path)?;

    let file = File::open(path).map_err(|e| FibresemError::file_read(path, e))?;
    let image = image::load(BufReader::new(file), ImageFormat::Tiff)
        .map_err(|e| FibresemError::file_read(path, e))?;

    debug!(
        "Decoded {}x{} pixels from {}",
        image.width(),
        image.height(),
        path.display()
    );
    Ok((tags, image))
}

/// Helper to get a text value from a tag
///
/// NULs are removed and surrounding whitespace trimmed. Returns `None` if the
/// tag is absent or not textual.
pub fn get_text_value(tags: &RawTagMap, tag: u16) -> Option<String> {
    tags.get(tag)
        .and_then(|value| value.as_text())
        .map(|s| s.replace('\0', "").trim().to_string())
}

/// Helper to get an unsigned integer value from a tag
pub fn get_unsigned_value(tags: &RawTagMap, tag: u16) -> Option<u64> {
    tags.get(tag).and_then(|value| value.as_unsigned())
}

/// Helper to get `(width, height)` from the baseline tags
pub fn get_dimensions(tags: &RawTagMap) -> Option<(u32, u32)> {
    let width = get_unsigned_value(tags, IMAGE_WIDTH)?;
    let height = get_unsigned_value(tags, IMAGE_LENGTH)?;
    Some((u32::try_from(width).ok()?, u32::try_from(height).ok()?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TagValue;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_tag_values() {
        assert_eq!(ZEISS_SEM_METADATA, 34119);
        assert_eq!(tag_name(ZEISS_SEM_METADATA), "ZeissSemMetadata");
        assert_eq!(tag_name(IMAGE_WIDTH), "ImageWidth");
        assert_eq!(tag_name(1), "Unknown");
    }

    #[test]
    fn test_helpers() {
        let tags: RawTagMap = vec![
            (IMAGE_WIDTH, TagValue::Unsigned(vec![1024])),
            (IMAGE_LENGTH, TagValue::Unsigned(vec![768])),
            (MAKE, TagValue::Ascii(b" Carl Zeiss \0".to_vec())),
        ]
        .into_iter()
        .collect();

        assert_eq!(get_dimensions(&tags), Some((1024, 768)));
        assert_eq!(get_text_value(&tags, MAKE).as_deref(), Some("Carl Zeiss"));
        assert_eq!(get_text_value(&tags, IMAGE_WIDTH), None);
        assert_eq!(get_unsigned_value(&tags, MODEL), None);
    }

    #[test]
    fn test_read_tags_missing_file() {
        let err = read_tags(Path::new("/nonexistent/image.tif")).unwrap_err();
        assert!(matches!(err, FibresemError::FileRead { .. }));
    }

    #[test]
    fn test_read_tags_not_a_tiff() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"This is not a TIFF file").unwrap();

        let err = read_tags(file.path()).unwrap_err();
        match err {
            FibresemError::FileRead { path, .. } => assert_eq!(path, file.path()),
            other => panic!("unexpected error: {other}"),
        }
    }
}

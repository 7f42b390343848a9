use crate::error::Result;
use crate::extraction::tags::{
    get_dimensions, get_text_value, read_tags, MAKE, MODEL, SOFTWARE,
};
use crate::extraction::{calibration_or_missing, metadata_block_or_empty};
use crate::types::{
    conversion_factor_or_nan, Calibration, CropRectangle, LengthUnit, MetadataBlock, RawTagMap,
};
use std::path::Path;

/// Main extractor for SEM image metadata
///
/// Runs the tag map through the metadata block parser and the calibration
/// extractor. Extraction never fails once the tags have been read: a missing
/// or malformed vendor block degrades to an empty block and the
/// missing-calibration sentinel.
///
/// # Example
///
/// ```
/// use fibresem_core::{SemExtractor, RawTagMap, TagValue};
///
/// let block = b"AP_PIXEL_SIZE\r\nImage Pixel Size = 2.500 nm\r\n\0".to_vec();
/// let tags: RawTagMap = vec![
///     (256, TagValue::Unsigned(vec![1024])),
///     (257, TagValue::Unsigned(vec![768])),
///     (34119, TagValue::Ascii(block)),
/// ]
/// .into_iter()
/// .collect();
///
/// let metadata = SemExtractor::extract(&tags);
///
/// assert_eq!(metadata.calibration.value, 2.5);
/// assert_eq!(metadata.calibration.unit.as_deref(), Some("nm"));
/// assert_eq!(metadata.calibration.raw, "2.500 nm");
/// assert_eq!(metadata.width, Some(1024));
/// ```
pub struct SemExtractor;

impl SemExtractor {
    /// Extracts all SEM metadata from a tag map
    pub fn extract(tags: &RawTagMap) -> SemMetadata {
        Self::extract_with_source(tags, "image")
    }

    /// Extracts metadata, naming `source` in any warning
    pub fn extract_with_source(tags: &RawTagMap, source: &str) -> SemMetadata {
        let block = metadata_block_or_empty(tags);
        let calibration = calibration_or_missing(&block, source);
        let (width, height) = match get_dimensions(tags) {
            Some((w, h)) => (Some(w), Some(h)),
            None => (None, None),
        };

        SemMetadata {
            width,
            height,
            manufacturer: get_text_value(tags, MAKE),
            model: get_text_value(tags, MODEL),
            software: get_text_value(tags, SOFTWARE),
            calibration,
            block,
        }
    }

    /// Reads the tags of `path` and extracts its metadata
    ///
    /// # Errors
    ///
    /// Returns [`crate::FibresemError::FileRead`] if the file cannot be read.
    pub fn from_file(path: &Path) -> Result<SemMetadata> {
        let tags = read_tags(path)?;
        Ok(Self::extract_with_source(&tags, &path.display().to_string()))
    }
}

/// Extracted SEM image metadata
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "json", derive(serde::Serialize))]
pub struct SemMetadata {
    /// Image width in pixels
    pub width: Option<u32>,

    /// Image height in pixels
    pub height: Option<u32>,

    /// Manufacturer name
    pub manufacturer: Option<String>,

    /// Instrument model name
    pub model: Option<String>,

    /// Acquisition software
    pub software: Option<String>,

    /// Pixel calibration (or the missing sentinel)
    pub calibration: Calibration,

    /// Vendor metadata block
    pub block: MetadataBlock,
}

impl SemMetadata {
    /// Whether a usable pixel calibration was found
    pub fn has_calibration(&self) -> bool {
        self.calibration.is_valid()
    }

    /// Crop window for these dimensions, if dimensions are known
    pub fn crop_rectangle(&self, bar_height: f64) -> Option<Result<CropRectangle>> {
        match (self.height, self.width) {
            (Some(h), Some(w)) => Some(CropRectangle::compute(h, w, bar_height)),
            _ => None,
        }
    }

    /// Factor from pixels to `unit`, NaN without calibration
    pub fn conversion_factor(&self, unit: LengthUnit) -> f64 {
        conversion_factor_or_nan(&self.calibration, unit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extraction::ZEISS_SEM_METADATA;
    use crate::types::TagValue;

    #[test]
    fn test_extract_without_vendor_block() {
        let tags: RawTagMap = vec![
            (256, TagValue::Unsigned(vec![640])),
            (257, TagValue::Unsigned(vec![480])),
            (271, TagValue::Ascii(b"Other Vendor\0".to_vec())),
        ]
        .into_iter()
        .collect();

        let metadata = SemExtractor::extract(&tags);
        assert!(metadata.block.is_empty());
        assert!(!metadata.has_calibration());
        assert_eq!(metadata.calibration, Calibration::missing());
        assert_eq!(metadata.manufacturer.as_deref(), Some("Other Vendor"));
        assert!(metadata.conversion_factor(LengthUnit::Micrometre).is_nan());
    }

    #[test]
    fn test_extract_with_numeric_vendor_tag() {
        let tags: RawTagMap = vec![(ZEISS_SEM_METADATA, TagValue::Float(vec![1.0]))]
            .into_iter()
            .collect();

        let metadata = SemExtractor::extract(&tags);
        assert!(metadata.block.is_empty());
        assert!(!metadata.has_calibration());
        assert!(metadata.crop_rectangle(0.11).is_none());
    }

    #[test]
    fn test_extract_with_malformed_pixel_size() {
        let tags: RawTagMap = vec![(
            ZEISS_SEM_METADATA,
            TagValue::Ascii(b"Image Pixel Size = wide\r\nMag = 5 K X\r\n".to_vec()),
        )]
        .into_iter()
        .collect();

        let metadata = SemExtractor::extract_with_source(&tags, "bad.tif");
        assert_eq!(metadata.block.get("Mag"), Some("5 K X"));
        assert_eq!(metadata.calibration, Calibration::missing());
    }

    #[test]
    fn test_conversion_and_crop() {
        let tags: RawTagMap = vec![
            (256, TagValue::Unsigned(vec![1200])),
            (257, TagValue::Unsigned(vec![1000])),
            (
                ZEISS_SEM_METADATA,
                TagValue::Ascii(b"Image Pixel Size = 10.0 nm\r\n".to_vec()),
            ),
        ]
        .into_iter()
        .collect();

        let metadata = SemExtractor::extract(&tags);
        let factor = metadata.conversion_factor(LengthUnit::Micrometre);
        assert!((factor - 0.01).abs() < 1e-15);

        let crop = metadata.crop_rectangle(0.11).unwrap().unwrap();
        assert_eq!((crop.bottom, crop.left, crop.right), (890, 155, 1045));
    }
}

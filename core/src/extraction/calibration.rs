use crate::error::{FibresemError, Result};
use crate::types::{Calibration, MetadataBlock};
use log::{debug, warn};

/// Metadata key holding the pixel size
pub const IMAGE_PIXEL_SIZE: &str = "Image Pixel Size";

/// Extracts the pixel calibration from a metadata block
///
/// A missing "Image Pixel Size" entry yields [`Calibration::missing`].
/// Otherwise the value must be `"<number> <unit>"` with a single space.
///
/// # Errors
///
/// Returns [`FibresemError::CalibrationFormat`] if the value does not split
/// into exactly two tokens or the first token is not a number.
pub fn extract_calibration(block: &MetadataBlock) -> Result<Calibration> {
    let Some(raw) = block.get(IMAGE_PIXEL_SIZE) else {
        debug!("No '{}' entry, calibration missing", IMAGE_PIXEL_SIZE);
        return Ok(Calibration::missing());
    };

    let tokens: Vec<&str> = raw.split(' ').collect();
    let [number, unit] = tokens.as_slice() else {
        return Err(FibresemError::CalibrationFormat(format!(
            "expected '<number> <unit>', got '{}'",
            raw
        )));
    };

    let value: f64 = number.parse().map_err(|e| {
        FibresemError::CalibrationFormat(format!("invalid pixel size '{}': {}", number, e))
    })?;
    if !value.is_finite() {
        return Err(FibresemError::CalibrationFormat(format!(
            "pixel size '{}' is not finite",
            number
        )));
    }

    if unit.is_empty() {
        return Err(FibresemError::CalibrationFormat(format!(
            "missing unit in '{}'",
            raw
        )));
    }

    Ok(Calibration::new(value, *unit, raw))
}

/// Like [`extract_calibration`], falling back to the sentinel on format errors
///
/// `source` names the offending file in the warning.
pub fn calibration_or_missing(block: &MetadataBlock, source: &str) -> Calibration {
    extract_calibration(block).unwrap_or_else(|e| {
        warn!("{}: {}; using missing calibration", source, e);
        Calibration::missing()
    })
}

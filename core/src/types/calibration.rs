use std::fmt;

/// Physical size of one pixel, as written by the instrument
///
/// A calibration that could not be determined is represented by the sentinel
/// returned from [`Calibration::missing`]: raw text `"NaN"`, value `0` and no
/// unit. Consumers must test [`Calibration::is_valid`] rather than checking
/// for a zero value.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "json", derive(serde::Serialize))]
pub struct Calibration {
    /// Numeric pixel size
    pub value: f64,

    /// Unit of `value`, `None` for the sentinel
    pub unit: Option<String>,

    /// Original text of the pixel size entry, e.g. "2.500 nm"
    pub raw: String,
}

impl Calibration {
    /// Raw text marker of the sentinel record
    pub const MISSING_MARKER: &'static str = "NaN";

    /// Creates a parsed calibration
    pub fn new(value: f64, unit: impl Into<String>, raw: impl Into<String>) -> Self {
        Self {
            value,
            unit: Some(unit.into()),
            raw: raw.into(),
        }
    }

    /// Sentinel for images without a usable calibration
    pub fn missing() -> Self {
        Self {
            value: 0.0,
            unit: None,
            raw: Self::MISSING_MARKER.to_string(),
        }
    }

    /// Returns true unless this is the sentinel record
    pub fn is_valid(&self) -> bool {
        self.unit.is_some() && self.raw != Self::MISSING_MARKER
    }
}

impl Default for Calibration {
    fn default() -> Self {
        Self::missing()
    }
}

impl fmt::Display for Calibration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.unit {
            Some(unit) if self.is_valid() => write!(f, "{} {}", self.value, unit),
            _ => write!(f, "unknown"),
        }
    }
}

use crate::error::{FibresemError, Result};
use crate::types::Calibration;
use log::debug;
use std::fmt;
use std::str::FromStr;

/// Length units understood by the conversion table
///
/// Each unit maps to its power-of-ten exponent relative to metres.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "json", derive(serde::Serialize, serde::Deserialize))]
pub enum LengthUnit {
    Nanometre,
    #[default]
    Micrometre,
    Millimetre,
    Metre,
}

impl LengthUnit {
    pub const ALL: [LengthUnit; 4] = [
        LengthUnit::Nanometre,
        LengthUnit::Micrometre,
        LengthUnit::Millimetre,
        LengthUnit::Metre,
    ];

    /// Power of ten relative to metres
    pub fn exponent(&self) -> i32 {
        match self {
            LengthUnit::Nanometre => -9,
            LengthUnit::Micrometre => -6,
            LengthUnit::Millimetre => -3,
            LengthUnit::Metre => 0,
        }
    }

    /// Display symbol
    pub fn symbol(&self) -> &'static str {
        match self {
            LengthUnit::Nanometre => "nm",
            LengthUnit::Micrometre => "µm",
            LengthUnit::Millimetre => "mm",
            LengthUnit::Metre => "m",
        }
    }

    /// Parses a unit name as written by the instrument
    ///
    /// Accepts `nm`, `um`, `µm` (micro sign), `μm` (Greek mu), `mm` and `m`.
    ///
    /// # Errors
    ///
    /// Returns [`FibresemError::UnsupportedUnit`] for anything else.
    pub fn parse(s: &str) -> Result<Self> {
        match s.trim() {
            "nm" => Ok(LengthUnit::Nanometre),
            "um" | "\u{b5}m" | "\u{3bc}m" => Ok(LengthUnit::Micrometre),
            "mm" => Ok(LengthUnit::Millimetre),
            "m" => Ok(LengthUnit::Metre),
            other => Err(FibresemError::UnsupportedUnit(other.to_string())),
        }
    }
}

impl FromStr for LengthUnit {
    type Err = FibresemError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for LengthUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// Factor converting a length in `from` units into `to` units
pub fn unit_scale(from: LengthUnit, to: LengthUnit) -> f64 {
    let diff = from.exponent() - to.exponent();
    if diff >= 0 {
        10f64.powi(diff)
    } else {
        1.0 / 10f64.powi(-diff)
    }
}

/// Factor turning a length in pixels into `target` units
///
/// `factor = value * 10^(exponent[source] - exponent[target])`
///
/// # Errors
///
/// Returns [`FibresemError::UnsupportedUnit`] for the missing-calibration
/// sentinel or a unit outside the table.
///
/// # Example
///
/// ```
/// use fibresem_core::{conversion_factor, Calibration, LengthUnit};
///
/// let calibration = Calibration::new(10.0, "nm", "10.0 nm");
/// let factor = conversion_factor(&calibration, LengthUnit::Micrometre).unwrap();
/// assert!((factor - 0.01).abs() < 1e-15);
/// ```
pub fn conversion_factor(calibration: &Calibration, target: LengthUnit) -> Result<f64> {
    let unit = match &calibration.unit {
        Some(unit) if calibration.is_valid() => unit,
        _ => {
            return Err(FibresemError::UnsupportedUnit(
                "no pixel calibration".to_string(),
            ))
        }
    };

    let source = LengthUnit::parse(unit)?;
    Ok(calibration.value * unit_scale(source, target))
}

/// Like [`conversion_factor`], with NaN standing in for any failure
pub fn conversion_factor_or_nan(calibration: &Calibration, target: LengthUnit) -> f64 {
    conversion_factor(calibration, target).unwrap_or_else(|e| {
        debug!("No conversion factor for '{}': {}", calibration.raw, e);
        f64::NAN
    })
}

use crate::types::{conversion_factor_or_nan, Calibration, LengthUnit};
use std::fmt;

/// Diameter statistics in pixels, as returned by a diameter engine
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "json", derive(serde::Serialize))]
pub struct PixelMeasurement {
    pub pixel_average: f64,
    pub pixel_sdev: f64,
    pub pixel_diameters: Vec<f64>,
}

/// Pixel measurement together with its conversion to physical units
///
/// The factor is NaN when the image has no calibration, so every converted
/// value is NaN rather than a fabricated number.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "json", derive(serde::Serialize))]
pub struct Measurement {
    pub pixels: PixelMeasurement,
    pub factor: f64,
    pub unit: LengthUnit,
}

impl Measurement {
    /// Converts `pixels` using `calibration` into `unit`
    pub fn new(pixels: PixelMeasurement, calibration: &Calibration, unit: LengthUnit) -> Self {
        Self {
            pixels,
            factor: conversion_factor_or_nan(calibration, unit),
            unit,
        }
    }

    /// Average diameter in `unit`
    pub fn average(&self) -> f64 {
        self.pixels.pixel_average * self.factor
    }

    /// Standard deviation in `unit`
    pub fn sdev(&self) -> f64 {
        self.pixels.pixel_sdev * self.factor
    }

    /// Every measured diameter in `unit`
    pub fn diameters(&self) -> Vec<f64> {
        self.pixels
            .pixel_diameters
            .iter()
            .map(|d| d * self.factor)
            .collect()
    }

    /// Whether the physical values are meaningful
    pub fn is_calibrated(&self) -> bool {
        self.factor.is_finite()
    }
}

impl fmt::Display for Measurement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "avgp: {:.3} px \tsdevp: {:.3} px \tavg: {:.3} {} \tsdev: {:.3} {}",
            self.pixels.pixel_average,
            self.pixels.pixel_sdev,
            self.average(),
            self.unit,
            self.sdev(),
            self.unit
        )
    }
}

use crate::error::{FibresemError, Result};
use image::DynamicImage;
use std::fmt;

/// Default height of the instrument information bar, as a fraction of the image height
pub const DEFAULT_BAR_HEIGHT: f64 = 0.11;

/// Crop window that removes the information bar and centres the remaining square
///
/// Rows `[top, bottom)` and columns `[left, right)` of the source image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "json", derive(serde::Serialize))]
pub struct CropRectangle {
    pub top: u32,
    pub bottom: u32,
    pub left: u32,
    pub right: u32,
}

impl CropRectangle {
    /// Computes the crop window for an image of `height` x `width` pixels
    ///
    /// ```text
    /// new_height = round(height * (1 - bar_height))
    /// left       = round((width - new_height) / 2)
    /// right      = width - left
    /// ```
    ///
    /// Rounding is half-to-even. The result is square up to one pixel when
    /// `width - new_height` is odd.
    ///
    /// # Errors
    ///
    /// Returns [`FibresemError::CropBounds`] if `bar_height` is outside
    /// `[0, 1)`, if `new_height` is zero, or if the image is narrower than
    /// `new_height`.
    ///
    /// # Example
    ///
    /// ```
    /// use fibresem_core::CropRectangle;
    ///
    /// let crop = CropRectangle::compute(1000, 1200, 0.11).unwrap();
    /// assert_eq!((crop.bottom, crop.left, crop.right), (890, 155, 1045));
    /// ```
    pub fn compute(height: u32, width: u32, bar_height: f64) -> Result<Self> {
        let bounds_error = || FibresemError::CropBounds {
            height,
            width,
            bar_height,
        };

        if !bar_height.is_finite() || !(0.0..1.0).contains(&bar_height) {
            return Err(bounds_error());
        }

        let new_height = (height as f64 * (1.0 - bar_height)).round_ties_even();
        if new_height <= 0.0 || (width as f64) < new_height {
            return Err(bounds_error());
        }
        let new_height = new_height as u32;

        let left = ((width - new_height) as f64 / 2.0).round_ties_even() as u32;
        let right = width - left;

        Ok(Self {
            top: 0,
            bottom: new_height,
            left,
            right,
        })
    }

    pub fn height(&self) -> u32 {
        self.bottom - self.top
    }

    pub fn width(&self) -> u32 {
        self.right - self.left
    }

    /// Whether the window is exactly square
    pub fn is_square(&self) -> bool {
        self.height() == self.width()
    }

    /// Returns the cropped copy of `image`
    pub fn apply(&self, image: &DynamicImage) -> DynamicImage {
        image.crop_imm(self.left, self.top, self.width(), self.height())
    }
}

impl fmt::Display for CropRectangle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "rows {}..{}, columns {}..{} ({}x{})",
            self.top,
            self.bottom,
            self.left,
            self.right,
            self.width(),
            self.height()
        )
    }
}

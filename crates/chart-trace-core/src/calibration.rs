//! Pixel-space calibration of a cropped balance chart.

use serde::{Deserialize, Serialize};

/// Magnitude of the value represented by the top and bottom gridlines.
pub const FULL_SCALE: f64 = 30000.0;

/// Calibration frame errors.
///
/// These describe caller-supplied geometry that can never produce a valid
/// series, so they are reported before any pixel is scanned.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CalibrationError {
    #[error("start_x ({start_x}) must be < end_x ({end_x})")]
    HorizontalSpan { start_x: i32, end_x: i32 },
    #[error("expected top_y < zero_y < bottom_y, got top_y={top_y} zero_y={zero_y} bottom_y={bottom_y}")]
    VerticalOrder {
        top_y: i32,
        zero_y: i32,
        bottom_y: i32,
    },
    #[error("calibration coordinates must be non-negative")]
    Negative,
    #[error("calibration rectangle exceeds the {width}x{height} image")]
    OutsideImage { width: usize, height: usize },
}

/// Five pixel coordinates that map chart pixels to values.
///
/// Columns are scanned over `[start_x, end_x)` and rows over
/// `[top_y, bottom_y)`. `top_y` maps to `+FULL_SCALE`, `zero_y` to `0` and
/// `bottom_y` to `-FULL_SCALE`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CalibrationFrame {
    pub start_x: i32,
    pub end_x: i32,
    pub top_y: i32,
    pub bottom_y: i32,
    pub zero_y: i32,
}

impl CalibrationFrame {
    /// Validate the ordering invariants of the frame.
    pub fn validate(&self) -> Result<(), CalibrationError> {
        if self.start_x < 0 || self.top_y < 0 {
            return Err(CalibrationError::Negative);
        }
        if self.start_x >= self.end_x {
            return Err(CalibrationError::HorizontalSpan {
                start_x: self.start_x,
                end_x: self.end_x,
            });
        }
        if !(self.top_y < self.zero_y && self.zero_y < self.bottom_y) {
            return Err(CalibrationError::VerticalOrder {
                top_y: self.top_y,
                zero_y: self.zero_y,
                bottom_y: self.bottom_y,
            });
        }
        Ok(())
    }

    /// Validate the frame and check that its rectangle fits inside an image.
    pub fn validate_for_image(&self, width: usize, height: usize) -> Result<(), CalibrationError> {
        self.validate()?;
        if self.end_x as usize > width || self.bottom_y as usize > height {
            return Err(CalibrationError::OutsideImage { width, height });
        }
        Ok(())
    }

    /// Number of scanned columns.
    #[inline]
    pub fn width(&self) -> usize {
        (self.end_x - self.start_x).max(0) as usize
    }

    /// Number of scanned rows.
    #[inline]
    pub fn height(&self) -> usize {
        (self.bottom_y - self.top_y).max(0) as usize
    }

    /// Pixel distance from the zero-line up to the top gridline.
    #[inline]
    pub fn upper_span(&self) -> f64 {
        f64::from(self.zero_y - self.top_y)
    }

    /// Pixel distance from the zero-line down to the bottom gridline.
    #[inline]
    pub fn lower_span(&self) -> f64 {
        f64::from(self.bottom_y - self.zero_y)
    }

    /// Rescale a column index onto the rotation-count axis.
    ///
    /// `start_x` maps to `0` and `end_x` maps to `max_rotation`.
    pub fn x_to_rotation(&self, x: i32, max_rotation: u32) -> f64 {
        let span = f64::from(self.end_x - self.start_x);
        if span <= 0.0 {
            return 0.0;
        }
        f64::from(x - self.start_x) * f64::from(max_rotation) / span
    }
}

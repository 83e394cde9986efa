//! Core types for balance-chart trace extraction.
//!
//! This crate is intentionally small: calibration geometry, borrowed RGB
//! views, binary masks and the series records passed between pipeline
//! stages. It does *not* depend on any image codec.

mod calibration;
mod image;
mod logger;
mod series;

pub use calibration::{CalibrationError, CalibrationFrame, FULL_SCALE};
pub use image::{Hsv, Mask, RgbImageView};
pub use series::{CalibratedPoint, CalibratedSeries, Extrema, RawPoint, RawSeries};

#[cfg(feature = "tracing")]
pub use logger::init_tracing;

pub use logger::{init_with_level, LogFormat, LOG_FORMAT_ENV};

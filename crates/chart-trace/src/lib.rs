//! Calibrated series extraction from cropped slot-machine balance charts.
//!
//! A chart image plus its [`CalibrationFrame`](chart_trace_core::CalibrationFrame)
//! goes through five stages:
//! - [`color`]: pick the plotted line color near the zero-line and build its mask,
//! - [`trace`]: one subpixel row per populated column ([`subpixel`]),
//! - [`mapper`]: linear row to value mapping with stroke correction at the extrema,
//! - [`smooth`]: outlier rejection and edge/peak-protected smoothing,
//! - [`quality`]: validity verdict and anomaly count.
//!
//! [`ChartExtractor`] runs them in order for one image; [`batch::BatchRunner`]
//! runs many images on a bounded worker pool.
//!
//! ## Quickstart
//!
//! ```no_run
//! use chart_trace::core::CalibrationFrame;
//! use chart_trace::{detect, ChartExtractor};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let frame = CalibrationFrame { start_x: 36, end_x: 620, top_y: 29, bottom_y: 520, zero_y: 274 };
//! let extractor = ChartExtractor::default();
//! let out = detect::extract_from_path(&extractor, "chart.png", &frame)?;
//! println!("{} points, valid: {}", out.series.len(), out.report.is_valid);
//! # Ok(())
//! # }
//! ```
//!
//! ## API map
//! - `chart_trace::core`: calibration frame, image views, masks, series records.
//! - `chart_trace::io`: JSON batch config and report.
//! - `chart_trace::detect` (feature `image`): helpers from `image::RgbImage` and files.

pub use chart_trace_core as core;

pub mod batch;
pub mod color;
pub mod extractor;
pub mod io;
pub mod mapper;
pub mod quality;
pub mod smooth;
pub mod subpixel;
pub mod trace;

#[cfg(feature = "image")]
pub mod detect;

pub use color::{ClassifierParams, ColorClassifier, ColorMatch, ColorProfile};
pub use extractor::{
    rgb_view_from_slice, ChartExtraction, ChartExtractor, ExtractError, ExtractorParams,
    SeriesRecord, SeriesSummary,
};
pub use mapper::{MapperParams, ValueMapper};
pub use quality::{QualityIssue, QualityParams, QualityReport, QualityValidator};
pub use smooth::{Smoother, SmoothingMode, SmoothingParams};
pub use trace::{LineTracer, TraceParams};

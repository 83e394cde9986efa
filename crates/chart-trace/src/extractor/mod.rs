//! End-to-end chart extraction pipeline.
//!
//! This module wires together color classification, column tracing, value
//! mapping, smoothing and quality validation for one chart image.

mod error;
mod params;
mod pipeline;
mod result;

pub use error::ExtractError;
pub use params::ExtractorParams;
pub use pipeline::{rgb_view_from_slice, ChartExtractor};
pub use result::{ChartExtraction, SeriesRecord, SeriesSummary};

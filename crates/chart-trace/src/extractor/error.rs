use chart_trace_core::CalibrationError;

/// Errors returned by the chart extractor. Data-quality problems are not
/// errors; they are reported in the extraction's `QualityReport`.
#[derive(thiserror::Error, Debug)]
pub enum ExtractError {
    #[error(transparent)]
    Calibration(#[from] CalibrationError),
    #[error("image buffer holds {got} bytes, expected {expected}")]
    InvalidImageBuffer { expected: usize, got: usize },
    #[error("image dimensions {width}x{height} are not usable")]
    InvalidImageDimensions { width: usize, height: usize },
}

//! Helpers that bridge `image` crate buffers into the extractor.

use crate::extractor::{ChartExtraction, ChartExtractor};
use crate::io::ChartIoError;
use chart_trace_core::{CalibrationFrame, RgbImageView};
use std::path::Path;

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Convert an `image::RgbImage` into the lightweight core view type.
pub fn rgb_view(img: &::image::RgbImage) -> RgbImageView<'_> {
    RgbImageView {
        width: img.width() as usize,
        height: img.height() as usize,
        data: img.as_raw(),
    }
}

/// Decode an image file and convert it to 8-bit RGB.
pub fn load_rgb(path: impl AsRef<Path>) -> Result<::image::RgbImage, ChartIoError> {
    Ok(::image::open(path)?.to_rgb8())
}

/// Run the extractor on a decoded image.
pub fn extract_from_image(
    extractor: &ChartExtractor,
    img: &::image::RgbImage,
    frame: &CalibrationFrame,
) -> Result<ChartExtraction, ChartIoError> {
    Ok(extractor.extract(&rgb_view(img), frame)?)
}

/// Decode `path` and run the extractor on it.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "info", skip(extractor, path, frame))
)]
pub fn extract_from_path(
    extractor: &ChartExtractor,
    path: impl AsRef<Path>,
    frame: &CalibrationFrame,
) -> Result<ChartExtraction, ChartIoError> {
    let img = load_rgb(path)?;
    extract_from_image(extractor, &img, frame)
}

use super::{ChartExtraction, ExtractError, ExtractorParams};
use crate::color::ColorClassifier;
use crate::mapper::ValueMapper;
use crate::quality::{QualityIssue, QualityValidator};
use crate::smooth::Smoother;
use crate::trace::LineTracer;
use chart_trace_core::{CalibrationFrame, RgbImageView};
use log::debug;

#[cfg(feature = "tracing")]
use tracing::instrument;

/// View a raw interleaved RGB buffer after checking its size.
pub fn rgb_view_from_slice(
    width: usize,
    height: usize,
    data: &[u8],
) -> Result<RgbImageView<'_>, ExtractError> {
    if width == 0 || height == 0 {
        return Err(ExtractError::InvalidImageDimensions { width, height });
    }
    let expected = width
        .checked_mul(height)
        .and_then(|n| n.checked_mul(3))
        .ok_or(ExtractError::InvalidImageDimensions { width, height })?;
    if data.len() != expected {
        return Err(ExtractError::InvalidImageBuffer {
            expected,
            got: data.len(),
        });
    }
    Ok(RgbImageView {
        width,
        height,
        data,
    })
}

/// Single-image extraction pipeline.
#[derive(Clone, Debug, Default)]
pub struct ChartExtractor {
    params: ExtractorParams,
    classifier: ColorClassifier,
    tracer: LineTracer,
    mapper: ValueMapper,
    smoother: Smoother,
    validator: QualityValidator,
}

impl ChartExtractor {
    pub fn new(params: ExtractorParams) -> Self {
        Self {
            classifier: ColorClassifier::new(params.classifier.clone()),
            tracer: LineTracer::new(params.trace),
            mapper: ValueMapper::new(params.mapper),
            smoother: Smoother::new(params.smoothing),
            validator: QualityValidator::new(params.quality),
            params,
        }
    }

    #[inline]
    pub fn params(&self) -> &ExtractorParams {
        &self.params
    }

    /// Extract the calibrated series of one chart.
    ///
    /// The frame is validated against the image before any pixel is read.
    /// Only configuration and buffer problems are errors; everything about
    /// the traced data ends up in the returned report.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "info", skip(self, image, frame), fields(width = image.width, height = image.height))
    )]
    pub fn extract(
        &self,
        image: &RgbImageView<'_>,
        frame: &CalibrationFrame,
    ) -> Result<ChartExtraction, ExtractError> {
        let dims = ExtractError::InvalidImageDimensions {
            width: image.width,
            height: image.height,
        };
        if image.width == 0 || image.height == 0 {
            return Err(dims);
        }
        let expected = image
            .width
            .checked_mul(image.height)
            .and_then(|n| n.checked_mul(3))
            .ok_or(dims)?;
        if image.data.len() < expected {
            return Err(ExtractError::InvalidImageBuffer {
                expected,
                got: image.data.len(),
            });
        }
        frame.validate_for_image(image.width, image.height)?;

        let color = self.classifier.classify(image, frame);
        let mut issues = Vec::new();
        if !color.matched {
            issues.push(QualityIssue::NoColorMatch);
        }

        let raw = self.tracer.trace(image, &color.mask, frame);
        let calibrated = self.mapper.map(&raw, frame);
        let series = self.smoother.smooth(&calibrated, frame);
        let report = self.validator.validate_with(&series, issues);

        debug!(
            "extracted {} points, color={}, valid={}",
            series.len(),
            color.color,
            report.is_valid
        );

        Ok(ChartExtraction {
            frame: *frame,
            color: color.color,
            matched: color.matched,
            scores: color.scores,
            raw,
            calibrated,
            series,
            report,
        })
    }
}

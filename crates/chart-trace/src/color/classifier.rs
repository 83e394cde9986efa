use super::morphology::{self, MorphologyParams};
use super::profile::ColorProfile;
use chart_trace_core::{CalibrationFrame, Hsv, Mask, RgbImageView};
use log::{debug, warn};
use serde::{Deserialize, Serialize};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Color name reported when no profile entry scores above zero.
pub const UNKNOWN_COLOR: &str = "unknown";

/// Parameters for line-color classification.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierParams {
    /// Candidate line colors.
    pub profile: ColorProfile,
    /// Half height of the scoring band centered on the zero-line (pixels).
    pub band_half_height: usize,
    /// Extra weight for band pixels in the middle third of the chart span.
    pub center_weight: usize,
    /// Close-then-open clean-up of the winning mask.
    pub morphology: MorphologyParams,
    /// Colors whose thin strokes get an additional 2x2 close after clean-up.
    pub thin_line_colors: Vec<String>,
}

impl Default for ClassifierParams {
    fn default() -> Self {
        Self {
            profile: ColorProfile::standard(),
            band_half_height: 50,
            center_weight: 2,
            morphology: MorphologyParams::default(),
            thin_line_colors: vec!["blue".to_string()],
        }
    }
}

/// Score of one profile entry inside the sampling band.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorScore {
    pub name: String,
    pub band_pixels: usize,
    pub center_pixels: usize,
    pub score: usize,
}

/// Result of color classification.
#[derive(Clone, Debug)]
pub struct ColorMatch {
    /// Winning color name, or [`UNKNOWN_COLOR`].
    pub color: String,
    /// `false` when every profile entry scored zero.
    pub matched: bool,
    /// Full-image mask. For an unmatched image this is the union of all
    /// profile masks, which may have no set pixels but always spans the image.
    pub mask: Mask,
    /// Per-entry scores in declaration order.
    pub scores: Vec<ColorScore>,
}

/// Picks the dominant line color around the zero-line and returns its mask.
#[derive(Clone, Debug, Default)]
pub struct ColorClassifier {
    params: ClassifierParams,
}

impl ColorClassifier {
    pub fn new(params: ClassifierParams) -> Self {
        Self { params }
    }

    #[inline]
    pub fn params(&self) -> &ClassifierParams {
        &self.params
    }

    /// Classify the plotted line color.
    ///
    /// The frame is assumed validated against the image dimensions.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "debug", skip(self, image, frame), fields(width = image.width, height = image.height))
    )]
    pub fn classify(&self, image: &RgbImageView<'_>, frame: &CalibrationFrame) -> ColorMatch {
        let hsv = hsv_plane(image);
        let (w, h) = (image.width, image.height);

        let zero = frame.zero_y.max(0) as usize;
        let band_y0 = zero.saturating_sub(self.params.band_half_height).min(h);
        let band_y1 = zero.saturating_add(self.params.band_half_height).min(h);

        let span = frame.width();
        let center_x0 = (frame.start_x as usize + span / 3).min(w);
        let center_x1 = (frame.start_x as usize + 2 * span / 3).min(w);

        let mut masks = Vec::with_capacity(self.params.profile.colors.len());
        let mut scores = Vec::with_capacity(self.params.profile.colors.len());
        let mut best: Option<(usize, usize)> = None; // (entry index, score)

        for (idx, color) in self.params.profile.colors.iter().enumerate() {
            let mut mask = Mask::new(w, h);
            for (px, out) in hsv.iter().zip(mask.data.iter_mut()) {
                if color.matches(*px) {
                    *out = 255;
                }
            }

            let band_pixels = mask.count_in(0, w, band_y0, band_y1);
            let center_pixels = mask.count_in(center_x0, center_x1, band_y0, band_y1);
            let score = band_pixels + self.params.center_weight * center_pixels;
            debug!(
                "color {}: band={} center={} score={}",
                color.name, band_pixels, center_pixels, score
            );

            if score > 0 && best.map(|(_, s)| score > s).unwrap_or(true) {
                best = Some((idx, score));
            }
            scores.push(ColorScore {
                name: color.name.clone(),
                band_pixels,
                center_pixels,
                score,
            });
            masks.push(mask);
        }

        let Some((idx, _)) = best else {
            warn!("no line color matched near zero_y={}", frame.zero_y);
            let mut union = Mask::new(w, h);
            for m in &masks {
                union.union_with(m);
            }
            return ColorMatch {
                color: UNKNOWN_COLOR.to_string(),
                matched: false,
                mask: union,
                scores,
            };
        };

        let name = self.params.profile.colors[idx].name.clone();
        let mut mask = morphology::clean(&masks.swap_remove(idx), &self.params.morphology);
        if self.params.thin_line_colors.iter().any(|c| *c == name) {
            mask = morphology::close(&mask, 2);
        }

        ColorMatch {
            color: name,
            matched: true,
            mask,
            scores,
        }
    }
}

fn hsv_plane(image: &RgbImageView<'_>) -> Vec<Hsv> {
    image
        .data
        .chunks_exact(3)
        .take(image.width * image.height)
        .map(|px| Hsv::from_rgb([px[0], px[1], px[2]]))
        .collect()
}

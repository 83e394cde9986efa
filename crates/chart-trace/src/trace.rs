//! Column-wise line tracing.
//!
//! Every column of the calibrated span is scanned top to bottom inside
//! `[top_y, bottom_y)`. Set mask pixels are grouped into runs (gaps up to
//! `max_gap` rows are tolerated) and the most populated run is refined to a
//! single subpixel row. Columns with no set pixels produce no point.

use crate::subpixel::{self, RefineMethod};
use chart_trace_core::{CalibrationFrame, Hsv, Mask, RawPoint, RawSeries, RgbImageView};
use log::debug;
use serde::{Deserialize, Serialize};

#[cfg(feature = "tracing")]
use tracing::instrument;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TraceParams {
    /// Largest row gap (in pixels) still joining two set pixels into one run.
    pub max_gap: usize,
    /// Subpixel refinement applied to the chosen run.
    pub refine: RefineMethod,
    /// Weight runs by line strength (saturation x value) instead of the
    /// binary mask.
    pub use_response: bool,
}

impl Default for TraceParams {
    fn default() -> Self {
        Self {
            max_gap: 3,
            refine: RefineMethod::Parabolic,
            use_response: true,
        }
    }
}

/// A group of set rows within one column.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Run {
    pub rows: Vec<usize>,
}

impl Run {
    #[inline]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Split ascending row indices into runs separated by gaps wider than `max_gap`.
pub fn group_runs(rows: &[usize], max_gap: usize) -> Vec<Run> {
    let mut runs: Vec<Run> = Vec::new();
    for &r in rows {
        match runs.last_mut() {
            Some(run) if run.rows.last().is_some_and(|&prev| r - prev <= max_gap) => {
                run.rows.push(r)
            }
            _ => runs.push(Run { rows: vec![r] }),
        }
    }
    runs
}

/// Most populated run; the topmost one wins a tie.
pub fn largest_run(runs: &[Run]) -> Option<&Run> {
    let mut best: Option<&Run> = None;
    for run in runs {
        if best.map(|b| run.len() > b.len()).unwrap_or(true) {
            best = Some(run);
        }
    }
    best
}

/// Per-pixel line strength in `[0, 255]`; zero wherever the mask is unset.
#[derive(Clone, Debug)]
pub struct ResponseMap {
    pub width: usize,
    pub height: usize,
    pub data: Vec<f32>,
}

impl ResponseMap {
    pub fn from_image(image: &RgbImageView<'_>, mask: &Mask) -> Self {
        let (w, h) = (mask.width, mask.height);
        let mut data = vec![0.0f32; w * h];
        for y in 0..h.min(image.height) {
            for x in 0..w.min(image.width) {
                if mask.get(x, y) {
                    let Hsv { s, v, .. } = image.hsv(x, y);
                    data[y * w + x] = f32::from(s) * f32::from(v) / 255.0;
                }
            }
        }
        Self {
            width: w,
            height: h,
            data,
        }
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> f32 {
        self.data[y * self.width + x]
    }
}

/// Traces the plotted line, one sample per populated column.
#[derive(Clone, Debug, Default)]
pub struct LineTracer {
    params: TraceParams,
}

impl LineTracer {
    pub fn new(params: TraceParams) -> Self {
        Self { params }
    }

    #[inline]
    pub fn params(&self) -> &TraceParams {
        &self.params
    }

    /// Trace `mask` over the frame. The frame must fit inside the mask.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "debug", skip(self, image, mask, frame), fields(columns = frame.width()))
    )]
    pub fn trace(&self, image: &RgbImageView<'_>, mask: &Mask, frame: &CalibrationFrame) -> RawSeries {
        let response = self
            .params
            .use_response
            .then(|| ResponseMap::from_image(image, mask));

        let x0 = frame.start_x.max(0) as usize;
        let x1 = (frame.end_x.max(0) as usize).min(mask.width);
        let y0 = frame.top_y.max(0) as usize;
        let y1 = (frame.bottom_y.max(0) as usize).min(mask.height);

        let mut points = Vec::with_capacity(x1.saturating_sub(x0));
        let mut skipped = 0usize;
        for x in x0..x1 {
            match self.trace_column(mask, response.as_ref(), x, y0, y1) {
                Some(y) => points.push(RawPoint { x: x as i32, y }),
                None => skipped += 1,
            }
        }
        debug!(
            "traced {} columns, {} without line pixels",
            points.len(),
            skipped
        );
        RawSeries { points }
    }

    /// Absolute subpixel row of the line in column `x`, if any pixel is set
    /// inside `[y0, y1)`.
    pub fn trace_column(
        &self,
        mask: &Mask,
        response: Option<&ResponseMap>,
        x: usize,
        y0: usize,
        y1: usize,
    ) -> Option<f64> {
        let rows: Vec<usize> = (y0..y1).filter(|&y| mask.get(x, y)).collect();
        if rows.is_empty() {
            return None;
        }
        let runs = group_runs(&rows, self.params.max_gap);
        let run = largest_run(&runs)?;

        let weights: Vec<f32> = match response {
            Some(r) => run.rows.iter().map(|&y| r.get(x, y)).collect(),
            None => run.rows.iter().map(|&y| f32::from(mask.value(x, y))).collect(),
        };
        subpixel::refine(&run.rows, &weights, self.params.refine)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn frame() -> CalibrationFrame {
        CalibrationFrame {
            start_x: 2,
            end_x: 8,
            top_y: 1,
            bottom_y: 30,
            zero_y: 15,
        }
    }

    fn blank_view(w: usize, h: usize, buf: &mut Vec<u8>) -> RgbImageView<'_> {
        *buf = vec![255; w * h * 3];
        RgbImageView {
            width: w,
            height: h,
            data: buf.as_slice(),
        }
    }

    #[test]
    fn groups_runs_with_small_gaps() {
        let runs = group_runs(&[1, 2, 5, 9, 10, 11, 20], 3);
        let lens: Vec<usize> = runs.iter().map(Run::len).collect();
        assert_eq!(lens, [3, 3, 1]);
        assert_eq!(largest_run(&runs).unwrap().rows, [1, 2, 5]);
    }

    #[test]
    fn picks_dominant_run_and_ignores_artifacts() {
        let mut mask = Mask::new(10, 32);
        for x in 0..10 {
            for y in 20..23 {
                mask.set(x, y, true);
            }
        }
        mask.set(4, 3, true);
        let mut buf = Vec::new();
        let view = blank_view(10, 32, &mut buf);
        let tracer = LineTracer::new(TraceParams {
            use_response: false,
            ..TraceParams::default()
        });
        let raw = tracer.trace(&view, &mask, &frame());
        assert_eq!(raw.len(), 6);
        for p in &raw.points {
            assert_abs_diff_eq!(p.y, 21.0);
        }
    }

    #[test]
    fn empty_columns_are_skipped_not_filled() {
        let mut mask = Mask::new(10, 32);
        for x in [2usize, 3, 6] {
            mask.set(x, 10, true);
        }
        let mut buf = Vec::new();
        let view = blank_view(10, 32, &mut buf);
        let raw = LineTracer::default().trace(&view, &mask, &frame());
        let xs: Vec<i32> = raw.points.iter().map(|p| p.x).collect();
        assert_eq!(xs, [2, 3, 6]);
    }

    #[test]
    fn rows_outside_the_frame_are_ignored() {
        let mut mask = Mask::new(10, 32);
        mask.set(5, 0, true);
        mask.set(5, 31, true);
        let mut buf = Vec::new();
        let view = blank_view(10, 32, &mut buf);
        let raw = LineTracer::default().trace(&view, &mask, &frame());
        assert!(raw.is_empty());
    }

    #[test]
    fn response_peak_refines_to_subpixel() {
        // Anti-aliased stroke: faint, strong, medium.
        let (w, h) = (10usize, 32usize);
        let mut data = vec![255u8; w * h * 3];
        let mut mask = Mask::new(w, h);
        let shades: [(usize, [u8; 3]); 3] =
            [(11, [255, 200, 230]), (12, [255, 80, 180]), (13, [255, 140, 205])];
        for x in 0..w {
            for (y, rgb) in shades {
                let i = (y * w + x) * 3;
                data[i..i + 3].copy_from_slice(&rgb);
                mask.set(x, y, true);
            }
        }
        let view = RgbImageView {
            width: w,
            height: h,
            data: &data,
        };
        let raw = LineTracer::default().trace(&view, &mask, &frame());
        assert_eq!(raw.len(), 6);
        let y = raw.points[0].y;
        assert!(y > 12.0 && y < 12.5, "expected shift toward row 13, got {y}");
    }
}

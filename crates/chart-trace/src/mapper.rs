//! Pixel row to chart value conversion.
//!
//! The zero-line maps to `0`, `top_y` to `+FULL_SCALE` and `bottom_y` to
//! `-FULL_SCALE`, linearly on each side. Output is clamped to the full scale.

use chart_trace_core::{
    CalibratedPoint, CalibratedSeries, CalibrationFrame, Extrema, RawSeries, FULL_SCALE,
};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapperParams {
    /// Stroke-width compensation applied at the global max/min (pixels).
    pub extremum_correction_px: f64,
}

impl Default for MapperParams {
    fn default() -> Self {
        Self {
            extremum_correction_px: 2.0,
        }
    }
}

/// Which global extremum a sample is, if any.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtremumKind {
    Max,
    Min,
}

/// Base linear mapping, clamped to `[-FULL_SCALE, FULL_SCALE]`.
pub fn y_to_value(y: f64, frame: &CalibrationFrame) -> f64 {
    let zero = f64::from(frame.zero_y);
    let value = if y < zero {
        (zero - y) / frame.upper_span() * FULL_SCALE
    } else {
        -(y - zero) / frame.lower_span() * FULL_SCALE
    };
    value.clamp(-FULL_SCALE, FULL_SCALE)
}

/// Inverse of [`y_to_value`] for values inside the full scale.
pub fn value_to_y(value: f64, frame: &CalibrationFrame) -> f64 {
    let zero = f64::from(frame.zero_y);
    let value = value.clamp(-FULL_SCALE, FULL_SCALE);
    if value >= 0.0 {
        zero - value / FULL_SCALE * frame.upper_span()
    } else {
        zero - value / FULL_SCALE * frame.lower_span()
    }
}

/// Converts traced rows to values and applies the extremum correction.
#[derive(Clone, Debug, Default)]
pub struct ValueMapper {
    params: MapperParams,
}

impl ValueMapper {
    pub fn new(params: MapperParams) -> Self {
        Self { params }
    }

    #[inline]
    pub fn params(&self) -> &MapperParams {
        &self.params
    }

    /// Row actually mapped for a sample: extrema are moved by the correction
    /// (up for the maximum, down for the minimum).
    pub fn corrected_y(&self, y: f64, extremum: Option<ExtremumKind>) -> f64 {
        match extremum {
            Some(ExtremumKind::Max) => y - self.params.extremum_correction_px,
            Some(ExtremumKind::Min) => y + self.params.extremum_correction_px,
            None => y,
        }
    }

    pub fn to_value(
        &self,
        y: f64,
        frame: &CalibrationFrame,
        extremum: Option<ExtremumKind>,
    ) -> f64 {
        y_to_value(self.corrected_y(y, extremum), frame)
    }

    /// Map a raw series.
    ///
    /// The first global maximum and first global minimum are re-mapped with
    /// the correction and recorded in `extrema`. A series whose max equals
    /// its min has no extrema and is left uncorrected.
    pub fn map(&self, raw: &RawSeries, frame: &CalibrationFrame) -> CalibratedSeries {
        let mut points: Vec<CalibratedPoint> = raw
            .points
            .iter()
            .map(|p| CalibratedPoint {
                x: p.x,
                y: p.y,
                value: y_to_value(p.y, frame),
            })
            .collect();

        let extrema = find_extrema(&points);
        if let Some(e) = extrema {
            for (idx, kind) in [(e.max_index, ExtremumKind::Max), (e.min_index, ExtremumKind::Min)] {
                let p = &mut points[idx];
                p.y = self.corrected_y(p.y, Some(kind));
                p.value = y_to_value(p.y, frame);
                // Keep y on the clamped value so value == y_to_value(y).
                p.y = value_to_y(p.value, frame);
            }
        }

        CalibratedSeries { points, extrema }
    }
}

/// First index of the global maximum and of the global minimum, or `None`
/// when the series is empty or all values are equal.
pub fn find_extrema(points: &[CalibratedPoint]) -> Option<Extrema> {
    let first = points.first()?;
    let (mut max_index, mut min_index) = (0usize, 0usize);
    let (mut max_v, mut min_v) = (first.value, first.value);
    for (i, p) in points.iter().enumerate().skip(1) {
        if p.value > max_v {
            max_v = p.value;
            max_index = i;
        }
        if p.value < min_v {
            min_v = p.value;
            min_index = i;
        }
    }
    (max_v > min_v).then_some(Extrema {
        max_index,
        min_index,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::{assert_abs_diff_eq, assert_relative_eq};
    use chart_trace_core::RawPoint;

    fn frame() -> CalibrationFrame {
        CalibrationFrame {
            start_x: 36,
            end_x: 620,
            top_y: 29,
            bottom_y: 520,
            zero_y: 274,
        }
    }

    #[test]
    fn reference_rows_hit_reference_values() {
        let f = frame();
        assert_eq!(y_to_value(274.0, &f), 0.0);
        assert_relative_eq!(y_to_value(29.0, &f), 30000.0);
        assert_relative_eq!(y_to_value(520.0, &f), -30000.0);
    }

    #[test]
    fn linear_map_roundtrips_inside_frame() {
        let f = frame();
        let mut y = 29.0;
        while y <= 520.0 {
            assert_abs_diff_eq!(value_to_y(y_to_value(y, &f), &f), y, epsilon = 1e-6);
            y += 0.37;
        }
    }

    #[test]
    fn values_are_clamped_far_outside_frame() {
        let f = frame();
        assert_eq!(y_to_value(-5000.0, &f), 30000.0);
        assert_eq!(y_to_value(1e9, &f), -30000.0);
    }

    #[test]
    fn correction_moves_max_up_and_min_down() {
        let f = frame();
        let m = ValueMapper::default();
        assert_relative_eq!(
            m.to_value(100.0, &f, Some(ExtremumKind::Max)),
            y_to_value(98.0, &f)
        );
        assert_relative_eq!(
            m.to_value(400.0, &f, Some(ExtremumKind::Min)),
            y_to_value(402.0, &f)
        );
        assert_relative_eq!(m.to_value(400.0, &f, None), y_to_value(400.0, &f));
    }

    #[test]
    fn map_corrects_only_the_two_extrema() {
        let f = frame();
        let raw = RawSeries {
            points: vec![
                RawPoint { x: 36, y: 274.0 },
                RawPoint { x: 37, y: 200.0 },
                RawPoint { x: 38, y: 150.0 },
                RawPoint { x: 39, y: 300.0 },
                RawPoint { x: 40, y: 250.0 },
            ],
        };
        let s = ValueMapper::default().map(&raw, &f);
        let e = s.extrema.unwrap();
        assert_eq!((e.max_index, e.min_index), (2, 3));
        assert_relative_eq!(s.points[2].value, y_to_value(148.0, &f));
        assert_relative_eq!(s.points[3].value, y_to_value(302.0, &f));
        assert_relative_eq!(s.points[1].value, y_to_value(200.0, &f));
        assert_relative_eq!(s.points[2].y, 148.0, epsilon = 1e-9);
    }

    #[test]
    fn flat_series_has_no_extrema() {
        let f = frame();
        let raw = RawSeries {
            points: (0..5).map(|x| RawPoint { x, y: 224.0 }).collect(),
        };
        let s = ValueMapper::default().map(&raw, &f);
        assert!(s.extrema.is_none());
        assert!(s.points.iter().all(|p| p.value == y_to_value(224.0, &f)));
    }

    #[test]
    fn corrected_extremum_stays_clamped() {
        let f = frame();
        let raw = RawSeries {
            points: vec![RawPoint { x: 0, y: 30.0 }, RawPoint { x: 1, y: 274.0 }],
        };
        let s = ValueMapper::default().map(&raw, &f);
        assert_eq!(s.points[0].value, 30000.0);
        assert_relative_eq!(s.points[0].y, 29.0);
    }
}

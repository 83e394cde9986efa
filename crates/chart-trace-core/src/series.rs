//! Per-column samples produced by the extraction stages.

use serde::{Deserialize, Serialize};

/// One traced column: line center `y` (possibly subpixel) at column `x`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RawPoint {
    pub x: i32,
    pub y: f64,
}

/// Traced columns in strictly increasing `x`. Columns without a line are
/// absent; nothing is interpolated.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RawSeries {
    pub points: Vec<RawPoint>,
}

/// A traced column together with its calibrated value.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CalibratedPoint {
    pub x: i32,
    pub y: f64,
    pub value: f64,
}

/// Indices of the global maximum and minimum of a calibrated series.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Extrema {
    pub max_index: usize,
    pub min_index: usize,
}

impl Extrema {
    #[inline]
    pub fn contains(&self, index: usize) -> bool {
        index == self.max_index || index == self.min_index
    }
}

/// Calibrated samples. `extrema` is set by the value mapper when the
/// series has distinct max/min points whose values were stroke-corrected.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CalibratedSeries {
    pub points: Vec<CalibratedPoint>,
    #[serde(default)]
    pub extrema: Option<Extrema>,
}

impl CalibratedSeries {
    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.value).collect()
    }

    /// True iff `x` is strictly increasing over the series.
    pub fn has_strictly_increasing_x(&self) -> bool {
        self.points.windows(2).all(|w| w[0].x < w[1].x)
    }
}

impl RawSeries {
    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

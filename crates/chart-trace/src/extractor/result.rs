use crate::color::ColorScore;
use crate::quality::QualityReport;
use chart_trace_core::{CalibratedSeries, CalibrationFrame, RawSeries};
use serde::{Deserialize, Serialize};

/// One exported sample of the final series.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SeriesRecord {
    pub x: i32,
    pub y: f64,
    pub value: f64,
    /// Position on the rotation-count axis, when a max rotation is known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotation: Option<f64>,
}

/// Headline numbers of a final series.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SeriesSummary {
    pub max_value: f64,
    pub min_value: f64,
    pub final_value: f64,
    /// Column of the first maximum.
    pub max_x: i32,
    /// Column of the first minimum.
    pub min_x: i32,
    /// Last traced column.
    pub data_end_x: i32,
    pub points: usize,
}

/// Output of one chart extraction run.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChartExtraction {
    pub frame: CalibrationFrame,
    /// Detected line color name (`"unknown"` when nothing matched).
    pub color: String,
    pub matched: bool,
    pub scores: Vec<ColorScore>,
    /// Traced rows before calibration.
    pub raw: RawSeries,
    /// Mapped and extremum-corrected values before smoothing.
    pub calibrated: CalibratedSeries,
    /// Final smoothed series.
    pub series: CalibratedSeries,
    pub report: QualityReport,
}

impl ChartExtraction {
    /// Summary of the final series, or `None` when it is empty.
    pub fn summary(&self) -> Option<SeriesSummary> {
        let points = &self.series.points;
        let first = points.first()?;
        let last = points.last()?;
        let mut max = first;
        let mut min = first;
        for p in points {
            if p.value > max.value {
                max = p;
            }
            if p.value < min.value {
                min = p;
            }
        }
        Some(SeriesSummary {
            max_value: max.value,
            min_value: min.value,
            final_value: last.value,
            max_x: max.x,
            min_x: min.x,
            data_end_x: last.x,
            points: points.len(),
        })
    }

    /// Final series as export records, with the rotation axis filled in
    /// when `max_rotation` is given.
    pub fn records(&self, max_rotation: Option<u32>) -> Vec<SeriesRecord> {
        self.series
            .points
            .iter()
            .map(|p| SeriesRecord {
                x: p.x,
                y: p.y,
                value: p.value,
                rotation: max_rotation.map(|m| self.frame.x_to_rotation(p.x, m)),
            })
            .collect()
    }
}

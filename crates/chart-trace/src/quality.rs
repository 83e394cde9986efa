//! Post-hoc sanity checks on a final series.

use chart_trace_core::CalibratedSeries;
use log::debug;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QualityParams {
    /// Fewer retained columns than this rejects the series.
    pub min_points: usize,
    /// Minimal `|last - first|` of an accepted series.
    pub min_variation: f64,
    /// Adjacent-column jumps above this are counted as anomalies.
    pub max_plausible_delta: f64,
}

impl Default for QualityParams {
    fn default() -> Self {
        Self {
            min_points: 10,
            min_variation: 100.0,
            max_plausible_delta: 20000.0,
        }
    }
}

/// One irregularity found while extracting or validating a series.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum QualityIssue {
    /// No profile color was found; the union mask was traced instead.
    NoColorMatch,
    Empty,
    InsufficientData { points: usize, min: usize },
    AllIdentical,
    LowVariation { diff: f64, min: f64 },
    ImplausibleJumps { count: usize },
}

impl QualityIssue {
    /// Whether this issue alone marks the series invalid.
    pub fn is_rejecting(&self) -> bool {
        matches!(
            self,
            Self::Empty
                | Self::InsufficientData { .. }
                | Self::AllIdentical
                | Self::LowVariation { .. }
        )
    }
}

impl fmt::Display for QualityIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoColorMatch => write!(f, "no line color matched, traced union mask"),
            Self::Empty => write!(f, "series is empty"),
            Self::InsufficientData { points, min } => {
                write!(f, "only {points} points extracted (need {min})")
            }
            Self::AllIdentical => write!(f, "all values are identical"),
            Self::LowVariation { diff, min } => {
                write!(f, "first/last difference {diff:.1} below {min:.1}")
            }
            Self::ImplausibleJumps { count } => {
                write!(f, "{count} implausible adjacent jumps")
            }
        }
    }
}

/// Verdict on a final series.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct QualityReport {
    pub is_valid: bool,
    pub message: String,
    pub anomaly_count: usize,
    #[serde(default)]
    pub issues: Vec<QualityIssue>,
}

impl QualityReport {
    fn from_issues(issues: Vec<QualityIssue>, anomaly_count: usize) -> Self {
        let is_valid = !issues.iter().any(QualityIssue::is_rejecting);
        let message = if issues.is_empty() {
            "ok".to_string()
        } else {
            issues
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("; ")
        };
        Self {
            is_valid,
            message,
            anomaly_count,
            issues,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct QualityValidator {
    params: QualityParams,
}

impl QualityValidator {
    pub fn new(params: QualityParams) -> Self {
        Self { params }
    }

    #[inline]
    pub fn params(&self) -> &QualityParams {
        &self.params
    }

    pub fn validate(&self, series: &CalibratedSeries) -> QualityReport {
        self.validate_with(series, Vec::new())
    }

    /// Validate, keeping irregularities already recorded by earlier stages.
    pub fn validate_with(
        &self,
        series: &CalibratedSeries,
        mut issues: Vec<QualityIssue>,
    ) -> QualityReport {
        let values = series.values();
        let p = &self.params;

        let (Some(&first), Some(&last)) = (values.first(), values.last()) else {
            issues.push(QualityIssue::Empty);
            return QualityReport::from_issues(issues, 0);
        };

        if values.len() < p.min_points {
            issues.push(QualityIssue::InsufficientData {
                points: values.len(),
                min: p.min_points,
            });
        }
        if values.iter().all(|&v| v == first) {
            issues.push(QualityIssue::AllIdentical);
        } else {
            let diff = (last - first).abs();
            if diff < p.min_variation {
                issues.push(QualityIssue::LowVariation {
                    diff,
                    min: p.min_variation,
                });
            }
        }

        let anomaly_count = count_jumps(&values, p.max_plausible_delta);
        if anomaly_count > 0 {
            issues.push(QualityIssue::ImplausibleJumps {
                count: anomaly_count,
            });
        }

        let report = QualityReport::from_issues(issues, anomaly_count);
        debug!(
            "quality: valid={} anomalies={} ({})",
            report.is_valid, report.anomaly_count, report.message
        );
        report
    }
}

/// Number of adjacent pairs whose absolute difference exceeds `max_delta`.
pub fn count_jumps(values: &[f64], max_delta: f64) -> usize {
    values
        .windows(2)
        .filter(|w| (w[1] - w[0]).abs() > max_delta)
        .count()
}

//! JSON configuration and report helpers for batch extraction.

use crate::extractor::{ChartExtraction, ExtractError, ExtractorParams, SeriesRecord, SeriesSummary};
use crate::quality::QualityReport;
use chart_trace_core::CalibrationFrame;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

#[derive(thiserror::Error, Debug)]
pub enum ChartIoError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[cfg(feature = "image")]
    #[error("failed to decode image: {0}")]
    ImageDecode(#[from] ::image::ImageError),
    #[error(transparent)]
    Extract(#[from] ExtractError),
}

/// One chart image together with its calibration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageJob {
    pub image_path: String,
    pub frame: CalibrationFrame,
    /// Rotation count at `end_x`, when known.
    #[serde(default)]
    pub max_rotation: Option<u32>,
}

/// Configuration for a batch extraction run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractConfig {
    pub images: Vec<ImageJob>,
    #[serde(default)]
    pub params: Option<ExtractorParams>,
    /// Worker threads; defaults to the available parallelism.
    #[serde(default)]
    pub threads: Option<usize>,
    #[serde(default)]
    pub output_path: Option<String>,
}

impl ExtractConfig {
    /// Load a JSON config from disk.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, ChartIoError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Write this config to disk as pretty JSON.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), ChartIoError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Resolve the output report path.
    pub fn output_path(&self) -> PathBuf {
        self.output_path
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("chart_trace_report.json"))
    }

    pub fn params(&self) -> ExtractorParams {
        self.params.clone().unwrap_or_default()
    }
}

/// Per-image entry of an extraction report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportEntry {
    pub image_path: String,
    pub frame: CalibrationFrame,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub summary: Option<SeriesSummary>,
    #[serde(default)]
    pub quality: Option<QualityReport>,
    #[serde(default)]
    pub series: Vec<SeriesRecord>,
    #[serde(default)]
    pub error: Option<String>,
}

impl ReportEntry {
    pub fn from_outcome(job: &ImageJob, outcome: &Result<ChartExtraction, ChartIoError>) -> Self {
        match outcome {
            Ok(ex) => Self {
                image_path: job.image_path.clone(),
                frame: job.frame,
                color: Some(ex.color.clone()),
                summary: ex.summary(),
                quality: Some(ex.report.clone()),
                series: ex.records(job.max_rotation),
                error: None,
            },
            Err(err) => Self {
                image_path: job.image_path.clone(),
                frame: job.frame,
                color: None,
                summary: None,
                quality: None,
                series: Vec::new(),
                error: Some(err.to_string()),
            },
        }
    }

    /// True when extraction ran and the series passed validation.
    pub fn is_valid(&self) -> bool {
        self.quality.as_ref().is_some_and(|q| q.is_valid)
    }
}

/// Report written after a batch run, one entry per configured image in
/// configuration order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractionReport {
    pub entries: Vec<ReportEntry>,
}

impl ExtractionReport {
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, ChartIoError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), ChartIoError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    pub fn failed(&self) -> usize {
        self.entries.iter().filter(|e| e.error.is_some()).count()
    }

    pub fn valid(&self) -> usize {
        self.entries.iter().filter(|e| e.is_valid()).count()
    }
}

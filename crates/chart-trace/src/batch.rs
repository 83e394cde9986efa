//! Bounded parallel extraction over many chart images.
//!
//! Images share nothing, so each one runs the full pipeline on its own
//! worker. A failing image only produces a failed outcome; results come back
//! in input order.

use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuildError, ThreadPoolBuilder};

#[cfg(feature = "image")]
use crate::extractor::{ChartExtraction, ChartExtractor};
#[cfg(feature = "image")]
use crate::io::{ChartIoError, ExtractionReport, ImageJob, ReportEntry};
#[cfg(feature = "image")]
use log::{info, warn};

#[derive(thiserror::Error, Debug)]
pub enum BatchError {
    #[error("failed to build worker pool: {0}")]
    Pool(#[from] ThreadPoolBuildError),
}

/// Result of one image in a batch.
#[cfg(feature = "image")]
#[derive(Debug)]
pub struct BatchOutcome {
    pub job: ImageJob,
    pub result: Result<ChartExtraction, ChartIoError>,
}

#[cfg(feature = "image")]
impl BatchOutcome {
    pub fn entry(&self) -> ReportEntry {
        ReportEntry::from_outcome(&self.job, &self.result)
    }
}

/// Runs independent per-image work on a fixed-size pool.
#[derive(Clone, Copy, Debug, Default)]
pub struct BatchRunner {
    threads: Option<usize>,
}

impl BatchRunner {
    /// `None` (or `Some(0)`) sizes the pool to the available parallelism.
    pub fn new(threads: Option<usize>) -> Self {
        Self { threads }
    }

    pub fn threads(&self) -> usize {
        match self.threads {
            Some(n) if n > 0 => n,
            _ => std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
        }
    }

    fn pool(&self) -> Result<ThreadPool, BatchError> {
        Ok(ThreadPoolBuilder::new()
            .num_threads(self.threads())
            .thread_name(|i| format!("chart-trace-{i}"))
            .build()?)
    }

    /// Apply `f` to every item on the pool, keeping input order.
    pub fn map<T, R, F>(&self, items: &[T], f: F) -> Result<Vec<R>, BatchError>
    where
        T: Sync,
        R: Send,
        F: Fn(&T) -> R + Sync,
    {
        let pool = self.pool()?;
        Ok(pool.install(|| items.par_iter().map(&f).collect()))
    }

    /// Decode and extract every job.
    #[cfg(feature = "image")]
    pub fn run(
        &self,
        extractor: &ChartExtractor,
        jobs: &[ImageJob],
    ) -> Result<Vec<BatchOutcome>, BatchError> {
        info!("extracting {} images on {} threads", jobs.len(), self.threads());
        self.map(jobs, |job| {
            let result = crate::detect::extract_from_path(extractor, &job.image_path, &job.frame);
            if let Err(err) = &result {
                warn!("{}: {err}", job.image_path);
            }
            BatchOutcome {
                job: job.clone(),
                result,
            }
        })
    }

    /// Run every job and collect the outcomes into a report.
    #[cfg(feature = "image")]
    pub fn run_report(
        &self,
        extractor: &ChartExtractor,
        jobs: &[ImageJob],
    ) -> Result<ExtractionReport, BatchError> {
        let outcomes = self.run(extractor, jobs)?;
        Ok(ExtractionReport {
            entries: outcomes.iter().map(BatchOutcome::entry).collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn map_keeps_input_order() {
        let items: Vec<u64> = (0..200).collect();
        let out = BatchRunner::new(Some(4))
            .map(&items, |&i| {
                // Uneven work so completion order differs from input order.
                (0..(200 - i) * 50).fold(i, |acc, _| acc)
            })
            .unwrap();
        assert_eq!(out, items);
    }

    #[test]
    fn zero_threads_means_auto() {
        assert!(BatchRunner::new(Some(0)).threads() >= 1);
        assert_eq!(BatchRunner::new(Some(3)).threads(), 3);
    }
}

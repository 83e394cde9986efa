use crate::color::ClassifierParams;
use crate::mapper::MapperParams;
use crate::quality::QualityParams;
use crate::smooth::SmoothingParams;
use crate::trace::TraceParams;
use serde::{Deserialize, Serialize};

/// Configuration for the whole extraction pipeline.
///
/// Every section falls back to its defaults when omitted from JSON, so a
/// config only needs to name what it changes.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorParams {
    pub classifier: ClassifierParams,
    pub trace: TraceParams,
    pub mapper: MapperParams,
    pub smoothing: SmoothingParams,
    pub quality: QualityParams,
}

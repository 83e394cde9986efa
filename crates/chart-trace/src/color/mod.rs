//! Line-color segmentation.
//!
//! Each profile entry is scored inside a band around the zero-line; the
//! winner's full-image mask is cleaned with a small close/open pass.

mod classifier;
pub mod morphology;
mod profile;

pub use classifier::{ClassifierParams, ColorClassifier, ColorMatch, ColorScore, UNKNOWN_COLOR};
pub use morphology::MorphologyParams;
pub use profile::{ColorProfile, HsvRange, LineColor};

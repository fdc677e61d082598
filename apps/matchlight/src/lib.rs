//! Matchlight — lossless document annotation, resilient LLM extraction,
//! and highlight re-application for CVs and job postings.
//!
//! The pipeline runs in two provider stages. Stage one turns each document
//! into an [`markup::AnnotatedDocument`] (every line addressed and
//! classified) plus a typed extraction record; stage two compares the two
//! records and returns address-based highlight instructions that render
//! back onto the original text. Provider replies are repaired rather than
//! trusted, and a missing credential degrades to heuristic extraction
//! instead of failing.

pub mod analysis;
pub mod budget;
pub mod config;
pub mod extraction;
pub mod highlight;
pub mod markup;
pub mod pipeline;
pub mod records;

pub use analysis::{GapReport, MatchScore};
pub use config::{Config, RetryPolicy};
pub use extraction::{DocumentInput, ExtractError, ExtractionClient};
pub use highlight::{Classification, HighlightInstruction};
pub use markup::{annotate, AnnotatedDocument, Region, RegionKind};
pub use pipeline::{ComparisonResult, DocumentPipeline};
pub use records::{CvRecord, EducationEntry, ExperienceEntry, JobRecord};

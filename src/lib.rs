//! utr_extract
//!
//! Re-classify the generic `UTR` rows of a GTF annotation as 5' or 3' UTRs
//! against each transcript's CDS span, then concatenate the classified regions
//! from a reference genome in transcription order.
//!
//! Coordinates are 1-based and inclusive throughout.

pub mod types;
pub mod model;
pub mod annotation;
pub mod catalog;
pub mod genome;
pub mod assemble;
pub mod emit;
pub mod pipeline;

pub use catalog::{AttributeKeys, LoadStats, TranscriptCatalog};

pub use annotation::AnnotationBuilder;

pub use types::{Interval, Strand};

pub use model::transcript::{ClassifiedUtr, Transcript};
pub use model::{classify_interval, Classification, UtrClass};

pub use genome::{reverse_complement, GenomeStore};
pub use assemble::{UtrGroup, UtrRecord};
pub use pipeline::{extract_utrs, process_annotation, run_pipeline, ExtractStats, PipelineStats, ProcessStats};

pub mod types;
pub mod transcript;
pub mod classify;

pub use classify::classify_interval;
pub use types::{Classification, FeatureKind, GenomicFeature, UtrClass};

use std::fmt;

use serde::{Serialize, Deserialize};

use crate::types::Interval;

/// Post-classification UTR identity, in transcription order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum UtrClass {
    /// Upstream of the coding span on the mature transcript.
    FivePrime,
    /// Downstream of the coding span on the mature transcript.
    ThreePrime,
}

impl UtrClass {
    /// Feature column value used in classified annotation rows.
    pub fn feature_type(self) -> &'static str {
        match self {
            UtrClass::FivePrime => "five_prime_utr",
            UtrClass::ThreePrime => "three_prime_utr",
        }
    }

    /// Inverse of [`UtrClass::feature_type`].
    pub fn from_feature_type(s: &str) -> Option<Self> {
        match s {
            "five_prime_utr" => Some(UtrClass::FivePrime),
            "three_prime_utr" => Some(UtrClass::ThreePrime),
            _ => None,
        }
    }

    /// Suffix appended to the transcript id in sequence record headers.
    pub fn record_suffix(self) -> &'static str {
        match self {
            UtrClass::FivePrime => "_5UTR",
            UtrClass::ThreePrime => "_3UTR",
        }
    }
}

impl fmt::Display for UtrClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            UtrClass::FivePrime => "5'UTR",
            UtrClass::ThreePrime => "3'UTR",
        };
        write!(f, "{s}")
    }
}

/// What a genomic feature row represents inside a transcript.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeatureKind {
    Exon,
    /// UTR as annotated, before classification. Keeps the original feature label.
    RawUtr(String),
    Cds,
}

/// An interval tagged with its kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenomicFeature {
    pub interval: Interval,
    pub kind: FeatureKind,
    /// Reading frame; only meaningful for CDS rows.
    pub phase: Option<u8>,
}

impl GenomicFeature {
    pub fn new(kind: FeatureKind, interval: Interval) -> Self {
        Self {
            interval,
            kind,
            phase: None,
        }
    }

    pub fn with_phase(mut self, phase: Option<u8>) -> Self {
        self.phase = phase;
        self
    }
}

/// Outcome of classifying one raw UTR against a CDS span.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// Interval kept (possibly clipped) with its UTR identity.
    Kept(UtrClass, Interval),
    /// Interval lies within the coding span, or clipped to nothing.
    Dropped,
}

impl Classification {
    pub fn kept(self) -> Option<(UtrClass, Interval)> {
        match self {
            Classification::Kept(c, iv) => Some((c, iv)),
            Classification::Dropped => None,
        }
    }
}

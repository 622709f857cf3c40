//! UTR classification against a transcript's bounding CDS span.
//!
//! Raw UTR rows are relabelled as 5' or 3' by their position relative to the
//! coding span and clipped so they never share a base with it. Orientation
//! follows transcription: on the minus strand the genomically downstream UTR
//! is the 5' one.

use crate::model::types::{Classification, UtrClass};
use crate::types::{Interval, Strand};

/// Classify one raw UTR interval.
///
/// `cds` is the bounding span `[cds_min, cds_max]` of all CDS segments of the
/// transcript. Returns `Dropped` for intervals fully inside the span, and for
/// clips that would leave `start > end`. `Strand::Unknown` has no transcription
/// direction, so everything is dropped.
pub fn classify_interval(strand: Strand, cds: Interval, utr: Interval) -> Classification {
    let (upstream, downstream) = match strand {
        Strand::Plus => (UtrClass::FivePrime, UtrClass::ThreePrime),
        Strand::Minus => (UtrClass::ThreePrime, UtrClass::FivePrime),
        Strand::Unknown => return Classification::Dropped,
    };

    if utr.end < cds.start {
        return Classification::Kept(upstream, utr);
    }
    if utr.start > cds.end {
        return Classification::Kept(downstream, utr);
    }

    let straddles_min = utr.start < cds.start;
    let straddles_max = utr.end > cds.end;

    // A UTR spanning the whole CDS straddles both ends; the 5' side wins.
    let (class, start, end) = match (strand, straddles_min, straddles_max) {
        (Strand::Plus, true, _) | (Strand::Minus, true, false) => {
            (upstream, utr.start, cds.start.saturating_sub(1))
        }
        (Strand::Minus, _, true) | (Strand::Plus, false, true) => {
            (downstream, cds.end.saturating_add(1), utr.end)
        }
        _ => return Classification::Dropped,
    };

    match Interval::try_new(start, end) {
        Some(iv) => Classification::Kept(class, iv),
        None => Classification::Dropped,
    }
}

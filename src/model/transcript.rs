use crate::model::classify::classify_interval;
use crate::model::types::{Classification, FeatureKind, GenomicFeature, UtrClass};
use crate::types::{Interval, Strand};


#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transcript {
    pub id: String,
    pub gene_id: String,
    pub gene_name: String,
    pub gene_type: String,
    pub transcript_type: String,
    pub chrom: String,
    pub strand: Strand,
    exons: Vec<GenomicFeature>,
    utrs: Vec<GenomicFeature>,
    cds: Vec<GenomicFeature>,
}

/// A UTR after classification.
///
/// Borrows the owning transcript for chromosome/strand/gene metadata and
/// never aliases the raw UTR it was derived from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassifiedUtr<'a> {
    pub transcript: &'a Transcript,
    pub class: UtrClass,
    pub interval: Interval,
}

impl Transcript {
    pub fn new(
        id: impl Into<String>,
        gene_id: impl Into<String>,
        chrom: impl Into<String>,
        strand: Strand,
    ) -> Self {
        Self {
            id: id.into(),
            gene_id: gene_id.into(),
            gene_name: String::new(),
            gene_type: String::new(),
            transcript_type: String::new(),
            chrom: chrom.into(),
            strand,
            exons: Vec::new(),
            utrs: Vec::new(),
            cds: Vec::new(),
        }
    }

    /// Append a feature to the list its kind belongs to.
    pub fn add_feature(&mut self, feature: GenomicFeature) {
        match &feature.kind {
            FeatureKind::Exon => self.exons.push(feature),
            FeatureKind::Cds => self.cds.push(feature),
            FeatureKind::RawUtr(_) => self.utrs.push(feature),
        }
    }

    pub fn exons(&self) -> &[GenomicFeature] {
        &self.exons
    }

    pub fn raw_utrs(&self) -> &[GenomicFeature] {
        &self.utrs
    }

    pub fn cds(&self) -> &[GenomicFeature] {
        &self.cds
    }

    pub fn has_cds(&self) -> bool {
        !self.cds.is_empty()
    }

    pub fn has_utrs(&self) -> bool {
        !self.utrs.is_empty()
    }

    /// Bounding span `[cds_min, cds_max]` over all CDS segments.
    pub fn cds_span(&self) -> Option<Interval> {
        Interval::bounding(self.cds.iter().map(|f| f.interval))
    }

    /// CDS segments ordered by start.
    pub fn sorted_cds(&self) -> Vec<&GenomicFeature> {
        let mut out: Vec<&GenomicFeature> = self.cds.iter().collect();
        out.sort_by_key(|f| f.interval.start);
        out
    }

    /// Per-UTR classification outcome, in raw UTR order.
    ///
    /// Empty when the transcript has no CDS.
    pub fn classifications(&self) -> Vec<Classification> {
        let Some(span) = self.cds_span() else {
            return Vec::new();
        };
        self.utrs
            .iter()
            .map(|u| classify_interval(self.strand, span, u.interval))
            .collect()
    }

    /// Reclassify every raw UTR against the CDS span, sorted by start.
    ///
    /// Dropped intervals (inside the CDS span or clipped to nothing) do not
    /// appear. A transcript without CDS or without UTRs yields nothing.
    pub fn classify_utrs(&self) -> Vec<ClassifiedUtr<'_>> {
        let mut out: Vec<ClassifiedUtr<'_>> = self
            .classifications()
            .into_iter()
            .filter_map(Classification::kept)
            .map(|(class, interval)| ClassifiedUtr {
                transcript: self,
                class,
                interval,
            })
            .collect();
        out.sort_by_key(|c| c.interval.start);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feat(kind: FeatureKind, s: u64, e: u64) -> GenomicFeature {
        GenomicFeature::new(kind, Interval::new(s, e))
    }

    fn utr(s: u64, e: u64) -> GenomicFeature {
        feat(FeatureKind::RawUtr("UTR".into()), s, e)
    }

    fn tx_multi_cds(strand: Strand) -> Transcript {
        let mut tx = Transcript::new("T1", "G1", "chr1", strand);
        tx.add_feature(feat(FeatureKind::Cds, 2500, 2800).with_phase(Some(2)));
        tx.add_feature(feat(FeatureKind::Cds, 1100, 1200).with_phase(Some(0)));
        tx
    }

    #[test]
    fn cds_span_collapses_segments() {
        let tx = tx_multi_cds(Strand::Plus);
        assert_eq!(tx.cds_span(), Some(Interval::new(1100, 2800)));
        let starts: Vec<u64> = tx.sorted_cds().iter().map(|f| f.interval.start).collect();
        assert_eq!(starts, vec![1100, 2500]);
    }

    #[test]
    fn plus_strand_scenario_keeps_flanking_utrs_unmodified() {
        let mut tx = tx_multi_cds(Strand::Plus);
        tx.add_feature(utr(2801, 3000));
        tx.add_feature(utr(1000, 1099));
        tx.add_feature(utr(1500, 1700)); // intronic to the span: dropped

        let got: Vec<(UtrClass, Interval)> = tx
            .classify_utrs()
            .iter()
            .map(|c| (c.class, c.interval))
            .collect();
        assert_eq!(
            got,
            vec![
                (UtrClass::FivePrime, Interval::new(1000, 1099)),
                (UtrClass::ThreePrime, Interval::new(2801, 3000)),
            ]
        );
        assert_eq!(tx.classifications()[2], Classification::Dropped);
    }

    #[test]
    fn classification_does_not_touch_raw_utrs() {
        let mut tx = Transcript::new("T2", "G2", "chr1", Strand::Plus);
        tx.add_feature(feat(FeatureKind::Cds, 1100, 1200));
        tx.add_feature(utr(1050, 1150));

        let classified = tx.classify_utrs();
        assert_eq!(classified[0].interval, Interval::new(1050, 1099));
        assert_eq!(tx.raw_utrs()[0].interval, Interval::new(1050, 1150));
        assert_eq!(classified[0].transcript.id, "T2");
    }

    #[test]
    fn cds_without_utrs_yields_nothing() {
        let tx = tx_multi_cds(Strand::Minus);
        assert!(tx.has_cds());
        assert!(tx.classify_utrs().is_empty());
    }

    #[test]
    fn utrs_without_cds_yield_nothing() {
        let mut tx = Transcript::new("T3", "G3", "chr1", Strand::Plus);
        tx.add_feature(utr(10, 20));
        assert!(tx.has_utrs());
        assert_eq!(tx.cds_span(), None);
        assert!(tx.classify_utrs().is_empty());
    }

    #[test]
    fn labelled_utrs_are_reclassified() {
        // Upstream minus-strand row wrongly labelled as 5'.
        let mut tx = Transcript::new("T4", "G4", "chr1", Strand::Minus);
        tx.add_feature(feat(FeatureKind::Cds, 100, 200));
        tx.add_feature(feat(FeatureKind::RawUtr("five_prime_utr".into()), 50, 99));

        assert_eq!(
            tx.raw_utrs()[0].kind,
            FeatureKind::RawUtr("five_prime_utr".into())
        );
        let classified = tx.classify_utrs();
        assert_eq!(classified.len(), 1);
        assert_eq!(classified[0].class, UtrClass::ThreePrime);
    }
}

use std::collections::HashMap;
use std::fmt;
use std::io::BufRead;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::annotation::io::{open_bufread, AnnotationReader, AnnotationRecord, ParseError};
use crate::model::transcript::Transcript;
use crate::model::types::{FeatureKind, GenomicFeature};

/// Configure which attribute keys and feature types drive the catalog build.
///
/// Notes:
/// - We allow multiple keys per category; first present wins.
/// - A row is only used when both its gene type and its transcript type are
///   listed in `coding_types`.
#[derive(Debug, Clone)]
pub struct AttributeKeys {
    pub gene_id_keys: Vec<String>,
    pub gene_name_keys: Vec<String>,
    pub transcript_id_keys: Vec<String>,

    pub gene_type_keys: Vec<String>,
    pub transcript_type_keys: Vec<String>,

    /// Accepted gene/transcript types (default: ["protein_coding"])
    pub coding_types: Vec<String>,

    pub exon_feature_types: Vec<String>,
    /// Feature types treated as unclassified UTRs
    pub utr_feature_types: Vec<String>,
    pub cds_feature_types: Vec<String>,
}

impl Default for AttributeKeys {
    fn default() -> Self {
        Self {
            // GENCODE names first, Ensembl fallbacks after
            gene_id_keys: vec!["gene_id".into()],
            gene_name_keys: vec!["gene_name".into(), "Name".into()],
            transcript_id_keys: vec!["transcript_id".into()],

            gene_type_keys: vec!["gene_type".into(), "gene_biotype".into()],
            transcript_type_keys: vec!["transcript_type".into(), "transcript_biotype".into()],

            coding_types: vec!["protein_coding".into()],

            exon_feature_types: vec!["exon".into()],
            utr_feature_types: vec![
                "UTR".into(),
                "five_prime_utr".into(),
                "three_prime_utr".into(),
            ],
            cds_feature_types: vec!["CDS".into()],
        }
    }
}

impl AttributeKeys {
    /// Map a row's feature column onto a transcript feature kind.
    pub fn feature_kind(&self, rec: &AnnotationRecord) -> Option<FeatureKind> {
        if rec.is_feature_in(&self.cds_feature_types) {
            Some(FeatureKind::Cds)
        } else if rec.is_feature_in(&self.utr_feature_types) {
            Some(FeatureKind::RawUtr(rec.feature_type.clone()))
        } else if rec.is_feature_in(&self.exon_feature_types) {
            Some(FeatureKind::Exon)
        } else {
            None
        }
    }

    fn is_coding(&self, value: Option<String>) -> bool {
        value.is_some_and(|v| self.coding_types.iter().any(|t| *t == v))
    }
}

/// Row-level accounting for one catalog build.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LoadStats {
    /// Data rows that parsed as 9-column annotation records
    pub rows_read: u64,
    /// Rows rejected by the line parser (field count, coordinates, strand, ...)
    pub rows_malformed: u64,
    /// Rows whose gene or transcript type is not a coding type
    pub rows_non_coding: u64,
    /// Rows lacking a transcript id
    pub rows_missing_transcript: u64,
    /// Rows on a different chromosome than their transcript
    pub rows_chrom_conflict: u64,
    /// Rows stored as exon/UTR/CDS features
    pub features_stored: u64,
}

/// The owning transcript collection:
/// - chromosome dictionary in first-seen order
/// - coding transcripts in first-seen order, addressable by transcript id
#[derive(Debug, Clone, Default)]
pub struct TranscriptCatalog {
    pub chr_names: Vec<String>,
    chr_to_id: HashMap<String, usize>,

    pub transcripts: Vec<Transcript>,
    tx_key_to_id: HashMap<String, usize>,

    pub stats: LoadStats,
}

/// Human-readable summary of the `TranscriptCatalog`.
///
/// Global line: transcripts, chromosomes, transcripts with CDS/UTRs.
/// Then one line per chromosome in first-seen order.
impl fmt::Display for TranscriptCatalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let with_cds = self.transcripts.iter().filter(|t| t.has_cds()).count();
        let with_utrs = self.transcripts.iter().filter(|t| t.has_utrs()).count();

        writeln!(
            f,
            "TranscriptCatalog: {} transcripts, {} chromosomes, {} with CDS, {} with UTRs",
            self.transcripts.len(),
            self.chr_names.len(),
            with_cds,
            with_utrs
        )?;

        let mut per_chr: Vec<(usize, usize, usize)> = vec![(0, 0, 0); self.chr_names.len()];
        for tx in &self.transcripts {
            let Some(&cid) = self.chr_to_id.get(&tx.chrom) else {
                continue;
            };
            per_chr[cid].0 += 1;
            per_chr[cid].1 += tx.has_cds() as usize;
            per_chr[cid].2 += tx.has_utrs() as usize;
        }

        for (name, (n, c, u)) in self.chr_names.iter().zip(per_chr) {
            writeln!(f, "  - {}: transcripts={}, with_cds={}, with_utrs={}", name, n, c, u)?;
        }

        Ok(())
    }
}

impl TranscriptCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a catalog from a GTF path (plain or `.gz`).
    pub fn from_path<P: AsRef<Path>>(path: P, keys: AttributeKeys) -> Result<Self> {
        let path = path.as_ref();
        log::info!("Loading GTF file: {}", path.display());

        let reader = open_bufread(path)
            .with_context(|| format!("open annotation file {}", path.display()))?;

        let catalog = Self::new()
            .from_reader(reader, keys)
            .with_context(|| format!("build transcript catalog from {}", path.display()))?;

        log::info!(
            "GTF file loading completed, {} coding transcripts",
            catalog.transcripts.len()
        );
        Ok(catalog)
    }

    /// Build a catalog directly from a GTF reader.
    ///
    /// Malformed rows are counted and skipped; only I/O failures abort.
    ///
    /// # Example
    /// ```
    /// use std::io::Cursor;
    /// use utr_extract::catalog::{TranscriptCatalog, AttributeKeys};
    ///
    /// let gtf = "\
    /// chr1\tsrc\tCDS\t101\t150\t.\t+\t0\tgene_id \"G1\"; transcript_id \"T1\"; gene_type \"protein_coding\"; transcript_type \"protein_coding\";\n\
    /// chr1\tsrc\tUTR\t51\t100\t.\t+\t.\tgene_id \"G1\"; transcript_id \"T1\"; gene_type \"protein_coding\"; transcript_type \"protein_coding\";\n";
    ///
    /// let cat = TranscriptCatalog::new()
    ///     .from_reader(Cursor::new(gtf.as_bytes()), AttributeKeys::default())
    ///     .unwrap();
    ///
    /// assert_eq!(cat.transcripts.len(), 1);
    /// assert_eq!(cat.transcripts[0].classify_utrs().len(), 1);
    /// ```
    pub fn from_reader<R: BufRead>(
        mut self,
        reader: R,
        keys: AttributeKeys,
    ) -> Result<Self, ParseError> {
        for rec in AnnotationReader::new(reader).records() {
            let rec = match rec {
                Ok(rec) => rec,
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    log::debug!("skipping row: {e}");
                    self.stats.rows_malformed += 1;
                    continue;
                }
            };
            self.stats.rows_read += 1;
            self.add_record(&rec, &keys);
        }

        Ok(self)
    }

    /// Route one parsed row into its transcript.
    fn add_record(&mut self, rec: &AnnotationRecord, keys: &AttributeKeys) {
        if !keys.is_coding(rec.pick_first_attr(&keys.gene_type_keys)) {
            self.stats.rows_non_coding += 1;
            return;
        }

        let Some(tx_key) = rec.pick_first_attr(&keys.transcript_id_keys) else {
            self.stats.rows_missing_transcript += 1;
            return;
        };

        if !keys.is_coding(rec.pick_first_attr(&keys.transcript_type_keys)) {
            self.stats.rows_non_coding += 1;
            return;
        }

        self.intern_chr(&rec.seqname);

        let tx = self.get_or_create(&tx_key, || {
            let mut tx = Transcript::new(
                tx_key.clone(),
                rec.pick_first_attr(&keys.gene_id_keys).unwrap_or_default(),
                rec.seqname.clone(),
                rec.strand,
            );
            tx.gene_name = rec.pick_first_attr(&keys.gene_name_keys).unwrap_or_default();
            tx.gene_type = rec.pick_first_attr(&keys.gene_type_keys).unwrap_or_default();
            tx.transcript_type = rec
                .pick_first_attr(&keys.transcript_type_keys)
                .unwrap_or_default();
            tx
        });

        if tx.chrom != rec.seqname {
            log::debug!(
                "skipping row on {} for transcript {} on {}",
                rec.seqname,
                tx.id,
                tx.chrom
            );
            self.stats.rows_chrom_conflict += 1;
            return;
        }

        let Some(kind) = keys.feature_kind(rec) else {
            return;
        };
        tx.add_feature(GenomicFeature::new(kind, rec.interval).with_phase(rec.phase));
        self.stats.features_stored += 1;
    }

    /// Transcript for `id`, created with `init` on first sight.
    ///
    /// Creation order is preserved in `transcripts`.
    pub fn get_or_create(
        &mut self,
        id: &str,
        init: impl FnOnce() -> Transcript,
    ) -> &mut Transcript {
        let tid = match self.tx_key_to_id.get(id) {
            Some(&tid) => tid,
            None => {
                let tid = self.transcripts.len();
                self.transcripts.push(init());
                self.tx_key_to_id.insert(id.to_string(), tid);
                tid
            }
        };
        &mut self.transcripts[tid]
    }

    pub fn get(&self, id: &str) -> Option<&Transcript> {
        self.tx_key_to_id.get(id).map(|&tid| &self.transcripts[tid])
    }

    /// Transcripts that reach the output: those with at least one CDS.
    pub fn coding(&self) -> impl Iterator<Item = &Transcript> {
        self.transcripts.iter().filter(|t| t.has_cds())
    }

    fn intern_chr(&mut self, chr: &str) -> usize {
        if let Some(&id) = self.chr_to_id.get(chr) {
            return id;
        }
        let id = self.chr_names.len();
        self.chr_names.push(chr.to_string());
        self.chr_to_id.insert(chr.to_string(), id);
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::types::UtrClass;
    use crate::types::{Interval, Strand};
    use std::io::Cursor;

    const PC: &str = "gene_type \"protein_coding\"; transcript_type \"protein_coding\";";

    fn row(chr: &str, feature: &str, s: u64, e: u64, strand: char, tx: &str) -> String {
        format!(
            "{chr}\tHAVANA\t{feature}\t{s}\t{e}\t.\t{strand}\t.\tgene_id \"G_{tx}\"; transcript_id \"{tx}\"; gene_name \"N_{tx}\"; {PC}\n"
        )
    }

    fn build(gtf: &str) -> TranscriptCatalog {
        TranscriptCatalog::new()
            .from_reader(Cursor::new(gtf.as_bytes()), AttributeKeys::default())
            .unwrap()
    }

    #[test]
    fn groups_rows_by_transcript_in_first_seen_order() {
        let gtf = [
            row("chr1", "transcript", 1000, 3000, '+', "T2"),
            row("chr1", "exon", 1000, 1200, '+', "T2"),
            row("chr1", "CDS", 1100, 1200, '+', "T2"),
            row("chr2", "CDS", 10, 20, '-', "T1"),
            row("chr1", "UTR", 1000, 1099, '+', "T2"),
        ]
        .concat();
        let cat = build(&gtf);

        let ids: Vec<&str> = cat.transcripts.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["T2", "T1"]);
        assert_eq!(cat.chr_names, vec!["chr1".to_string(), "chr2".to_string()]);

        let t2 = cat.get("T2").unwrap();
        assert_eq!(t2.gene_id, "G_T2");
        assert_eq!(t2.gene_name, "N_T2");
        assert_eq!(t2.gene_type, "protein_coding");
        assert_eq!(t2.exons().len(), 1);
        assert_eq!(t2.cds().len(), 1);
        assert_eq!(t2.raw_utrs().len(), 1);
        assert_eq!(cat.get("T1").unwrap().strand, Strand::Minus);
        assert_eq!(cat.stats.features_stored, 4);
    }

    #[test]
    fn non_coding_rows_are_skipped() {
        let gtf = "\
chr1\tsrc\tCDS\t10\t20\t.\t+\t0\tgene_id \"G1\"; transcript_id \"T1\"; gene_type \"lncRNA\"; transcript_type \"protein_coding\";
chr1\tsrc\tCDS\t10\t20\t.\t+\t0\tgene_id \"G1\"; transcript_id \"T2\"; gene_type \"protein_coding\"; transcript_type \"nonsense_mediated_decay\";
chr1\tsrc\tCDS\t10\t20\t.\t+\t0\tgene_id \"G1\"; gene_type \"protein_coding\"; transcript_type \"protein_coding\";
";
        let cat = build(gtf);
        assert!(cat.transcripts.is_empty());
        assert_eq!(cat.stats.rows_non_coding, 2);
        assert_eq!(cat.stats.rows_missing_transcript, 1);
    }

    #[test]
    fn ensembl_biotype_keys_are_accepted() {
        let gtf = "chr1\tensembl\tCDS\t10\t20\t.\t+\t0\tgene_id \"G1\"; transcript_id \"T1\"; gene_biotype \"protein_coding\"; transcript_biotype \"protein_coding\";\n";
        let cat = build(gtf);
        assert_eq!(cat.transcripts.len(), 1);
        assert_eq!(cat.transcripts[0].transcript_type, "protein_coding");
    }

    #[test]
    fn malformed_rows_are_counted_not_fatal() {
        let gtf = [
            "chr1\tsrc\tCDS\t10\n".to_string(),
            "chr1\tsrc\tUTR\t50\t40\t.\t+\t.\tgene_id \"G\"; transcript_id \"T1\";\n".to_string(),
            row("chr1", "CDS", 100, 200, '+', "T1"),
        ]
        .concat();
        let cat = build(&gtf);
        assert_eq!(cat.stats.rows_malformed, 2);
        assert_eq!(cat.stats.rows_read, 1);
        assert_eq!(cat.transcripts.len(), 1);
    }

    #[test]
    fn equals_in_quoted_values_and_trailing_tabs_keep_the_row() {
        let gtf = "\
chr1\tsrc\tCDS\t100\t200\t.\t+\t0\tgene_id \"G1\"; transcript_id \"T1\"; gene_type \"protein_coding\"; transcript_type \"protein_coding\"; note \"ratio=2\";
chr1\tsrc\tUTR\t50\t99\tNA\t+\t.\tgene_id \"G1\"; transcript_id \"T1\"; gene_type \"protein_coding\"; transcript_type \"protein_coding\";\t
";
        let cat = build(gtf);
        assert_eq!(cat.transcripts.len(), 1);
        assert_eq!(cat.stats.rows_non_coding, 0);
        assert_eq!(cat.stats.rows_malformed, 0);
        assert_eq!(cat.transcripts[0].classify_utrs().len(), 1);
    }

    #[test]
    fn rows_on_a_foreign_chromosome_are_dropped() {
        let gtf = [
            row("chr1", "CDS", 100, 200, '+', "T1"),
            row("chr9", "UTR", 50, 99, '+', "T1"),
        ]
        .concat();
        let cat = build(&gtf);
        assert_eq!(cat.stats.rows_chrom_conflict, 1);
        assert!(cat.transcripts[0].raw_utrs().is_empty());
    }

    #[test]
    fn utr_only_transcript_is_not_coding() {
        let gtf = [
            row("chr1", "UTR", 50, 99, '+', "T1"),
            row("chr1", "CDS", 100, 200, '+', "T2"),
        ]
        .concat();
        let cat = build(&gtf);
        let coding: Vec<&str> = cat.coding().map(|t| t.id.as_str()).collect();
        assert_eq!(coding, vec!["T2"]);
    }

    #[test]
    fn straddling_utr_is_clipped_after_build() {
        let gtf = [
            row("chr1", "CDS", 1100, 1200, '+', "T1"),
            row("chr1", "UTR", 1050, 1150, '+', "T1"),
        ]
        .concat();
        let cat = build(&gtf);
        let utrs = cat.transcripts[0].classify_utrs();
        assert_eq!(utrs.len(), 1);
        assert_eq!(utrs[0].class, UtrClass::FivePrime);
        assert_eq!(utrs[0].interval, Interval::new(1050, 1099));
    }

    #[test]
    fn display_lists_chromosomes() {
        let gtf = row("chr1", "CDS", 100, 200, '+', "T1");
        let s = build(&gtf).to_string();
        assert!(s.starts_with("TranscriptCatalog: 1 transcripts, 1 chromosomes"));
        assert!(s.contains("  - chr1: transcripts=1, with_cds=1, with_utrs=0"));
    }
}

//! Strand-aware concatenation of UTR fragments into one sequence per
//! transcript and UTR class.

use std::collections::HashMap;
use std::io::BufRead;

use serde::Serialize;

use crate::annotation::io::{AnnotationReader, ParseError};
use crate::genome::{reverse_complement, GenomeStore};
use crate::model::types::UtrClass;
use crate::types::{Interval, Strand};

/// One classified UTR row as re-read from a processed annotation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UtrRegion {
    pub chrom: String,
    pub interval: Interval,
    pub strand: Strand,
}

/// All classified UTR rows of one transcript, split by class.
///
/// Gene metadata comes from the first row seen for the transcript.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UtrGroup {
    pub transcript_id: String,
    pub gene_id: String,
    pub gene_name: String,
    pub five_prime: Vec<UtrRegion>,
    pub three_prime: Vec<UtrRegion>,
}

impl UtrGroup {
    pub fn regions(&self, class: UtrClass) -> &[UtrRegion] {
        match class {
            UtrClass::FivePrime => &self.five_prime,
            UtrClass::ThreePrime => &self.three_prime,
        }
    }
}

/// Assembled sequence for one (transcript, class) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UtrRecord {
    pub transcript_id: String,
    pub class: UtrClass,
    pub strand: Strand,
    pub gene_id: String,
    pub gene_name: String,
    /// `chrom:start-end` per contributing fragment, in assembly order
    pub ranges: Vec<String>,
    pub length: usize,
    #[serde(skip)]
    pub sequence: Vec<u8>,
}

/// Counts gathered while reading classified UTR rows.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GroupStats {
    pub five_utr_regions: u64,
    pub three_utr_regions: u64,
    pub rows_malformed: u64,
    pub rows_missing_transcript: u64,
}

/// Collect `five_prime_utr` / `three_prime_utr` rows by transcript id.
///
/// Transcripts keep first-seen order. Other feature types are ignored, rows
/// without a `transcript_id` are skipped, and no biotype filter applies.
pub fn read_utr_groups<R: BufRead>(reader: R) -> Result<(Vec<UtrGroup>, GroupStats), ParseError> {
    let mut groups: Vec<UtrGroup> = Vec::new();
    let mut by_id: HashMap<String, usize> = HashMap::new();
    let mut stats = GroupStats::default();

    for rec in AnnotationReader::new(reader).records() {
        let rec = match rec {
            Ok(rec) => rec,
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                log::debug!("skipping row: {e}");
                stats.rows_malformed += 1;
                continue;
            }
        };

        let Some(class) = UtrClass::from_feature_type(&rec.feature_type) else {
            continue;
        };
        let Some(tx_id) = rec.attr("transcript_id").filter(|s| !s.is_empty()) else {
            stats.rows_missing_transcript += 1;
            continue;
        };

        let gid = *by_id.entry(tx_id.to_string()).or_insert_with(|| {
            groups.push(UtrGroup {
                transcript_id: tx_id.to_string(),
                gene_id: rec.attr("gene_id").unwrap_or_default().to_string(),
                gene_name: rec.attr("gene_name").unwrap_or_default().to_string(),
                five_prime: Vec::new(),
                three_prime: Vec::new(),
            });
            groups.len() - 1
        });

        let region = UtrRegion {
            chrom: rec.seqname.clone(),
            interval: rec.interval,
            strand: rec.strand,
        };
        match class {
            UtrClass::FivePrime => {
                groups[gid].five_prime.push(region);
                stats.five_utr_regions += 1;
            }
            UtrClass::ThreePrime => {
                groups[gid].three_prime.push(region);
                stats.three_utr_regions += 1;
            }
        }
    }

    Ok((groups, stats))
}

/// Regions in transcription order: ascending start on `+`, descending on `-`.
///
/// Stable, so regions sharing a start keep their input order.
pub fn assembly_order(regions: &[UtrRegion], strand: Strand) -> Vec<&UtrRegion> {
    let mut ordered: Vec<&UtrRegion> = regions.iter().collect();
    match strand {
        Strand::Minus => ordered.sort_by(|a, b| b.interval.start.cmp(&a.interval.start)),
        _ => ordered.sort_by_key(|r| r.interval.start),
    }
    ordered
}

/// Assemble one class of one transcript.
///
/// Unobtainable fragments are left out of both the sequence and the ranges.
/// Returns `None` when the group has no regions of this class or none could
/// be sliced. Also returns the number of fragments skipped.
pub fn assemble(group: &UtrGroup, class: UtrClass, genome: &GenomeStore) -> (Option<UtrRecord>, u64) {
    let regions = group.regions(class);
    let Some(first) = regions.first() else {
        return (None, 0);
    };
    let strand = first.strand;

    let mut sequence: Vec<u8> = Vec::new();
    let mut ranges: Vec<String> = Vec::new();
    let mut skipped = 0u64;

    for region in assembly_order(regions, strand) {
        let Some(bases) = genome.slice(&region.chrom, region.interval.start, region.interval.end) else {
            skipped += 1;
            continue;
        };
        if strand == Strand::Minus {
            sequence.extend(reverse_complement(bases));
        } else {
            sequence.extend_from_slice(bases);
        }
        ranges.push(format!("{}:{}", region.chrom, region.interval));
    }

    if ranges.is_empty() {
        return (None, skipped);
    }

    let record = UtrRecord {
        transcript_id: group.transcript_id.clone(),
        class,
        strand,
        gene_id: group.gene_id.clone(),
        gene_name: group.gene_name.clone(),
        ranges,
        length: sequence.len(),
        sequence,
    };
    (Some(record), skipped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn genome() -> GenomeStore {
        // chr1: 1..=20 = AAAAACCCCCGGGGGTTTTT
        GenomeStore::from_reader(Cursor::new(&b">chr1\nAAAAACCCCC\nGGGGGTTTTT\n>chr2\nACGT\n"[..])).unwrap()
    }

    fn region(chrom: &str, s: u64, e: u64, strand: Strand) -> UtrRegion {
        UtrRegion {
            chrom: chrom.to_string(),
            interval: Interval::new(s, e),
            strand,
        }
    }

    fn group(five: Vec<UtrRegion>, three: Vec<UtrRegion>) -> UtrGroup {
        UtrGroup {
            transcript_id: "T1".into(),
            gene_id: "G1".into(),
            gene_name: "GENE1".into(),
            five_prime: five,
            three_prime: three,
        }
    }

    #[test]
    fn plus_strand_concatenates_in_ascending_order() {
        let g = group(
            vec![region("chr1", 11, 12, Strand::Plus), region("chr1", 1, 2, Strand::Plus)],
            vec![],
        );
        let (rec, skipped) = assemble(&g, UtrClass::FivePrime, &genome());
        let rec = rec.unwrap();
        assert_eq!(skipped, 0);
        assert_eq!(rec.sequence, b"AAGG".to_vec());
        assert_eq!(rec.ranges, vec!["chr1:1-2".to_string(), "chr1:11-12".to_string()]);
        assert_eq!(rec.length, rec.sequence.len());
        assert_eq!(rec.strand, Strand::Plus);
    }

    #[test]
    fn minus_strand_descends_and_reverse_complements() {
        let g = group(
            vec![],
            vec![region("chr1", 4, 6, Strand::Minus), region("chr1", 14, 16, Strand::Minus)],
        );
        let (rec, _) = assemble(&g, UtrClass::ThreePrime, &genome());
        let rec = rec.unwrap();
        // 14..16 = GGT -> ACC ; 4..6 = AAC -> GTT
        assert_eq!(rec.sequence, b"ACCGTT".to_vec());
        assert_eq!(rec.ranges, vec!["chr1:14-16".to_string(), "chr1:4-6".to_string()]);
        assert_eq!(rec.length, 6);
    }

    #[test]
    fn unobtainable_fragments_are_omitted() {
        let g = group(
            vec![
                region("chr1", 1, 3, Strand::Plus),
                region("chrUn", 1, 3, Strand::Plus),
                region("chr2", 3, 9, Strand::Plus),
            ],
            vec![],
        );
        let (rec, skipped) = assemble(&g, UtrClass::FivePrime, &genome());
        let rec = rec.unwrap();
        assert_eq!(skipped, 2);
        assert_eq!(rec.sequence, b"AAA".to_vec());
        assert_eq!(rec.ranges, vec!["chr1:1-3".to_string()]);
        assert_eq!(rec.length, 3);
    }

    #[test]
    fn nothing_retained_means_no_record() {
        let g = group(vec![region("chrUn", 1, 3, Strand::Plus)], vec![]);
        assert_eq!(assemble(&g, UtrClass::FivePrime, &genome()), (None, 1));
        assert_eq!(assemble(&g, UtrClass::ThreePrime, &genome()), (None, 0));
    }

    #[test]
    fn equal_starts_keep_input_order() {
        let regions = vec![
            region("chr1", 5, 6, Strand::Minus),
            region("chr1", 5, 9, Strand::Minus),
            region("chr1", 8, 9, Strand::Minus),
        ];
        let ends: Vec<u64> = assembly_order(&regions, Strand::Minus)
            .iter()
            .map(|r| r.interval.end)
            .collect();
        assert_eq!(ends, vec![9, 6, 9]);
    }

    #[test]
    fn groups_are_read_in_first_seen_order() {
        let gtf = "\
##gff-version 2
chr1\tprocessed\tCDS\t100\t200\t.\t+\t0\tgene_id \"G2\"; transcript_id \"T2\";
chr1\tprocessed\tthree_prime_utr\t201\t300\t.\t+\t.\tgene_id \"G2\"; transcript_id \"T2\"; gene_name \"B\";
chr1\tprocessed\tfive_prime_utr\t10\t20\t.\t-\t.\tgene_id \"G1\"; transcript_id \"T1\";
chr1\tprocessed\tfive_prime_utr\t50\t99\t.\t+\t.\tgene_id G2; transcript_id T2; gene_name B;
chr1\tprocessed\tthree_prime_utr\t5\t9\t.\t+\t.\tgene_id \"G3\";
";
        let (groups, stats) = read_utr_groups(Cursor::new(gtf.as_bytes())).unwrap();
        let ids: Vec<&str> = groups.iter().map(|g| g.transcript_id.as_str()).collect();
        assert_eq!(ids, vec!["T2", "T1"]);
        assert_eq!(groups[0].gene_name, "B");
        assert_eq!(groups[0].five_prime.len(), 1);
        assert_eq!(groups[0].three_prime.len(), 1);
        assert_eq!(groups[1].gene_name, "");
        assert_eq!(stats.five_utr_regions, 2);
        assert_eq!(stats.three_utr_regions, 1);
        assert_eq!(stats.rows_missing_transcript, 1);
    }
}

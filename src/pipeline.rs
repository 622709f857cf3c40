//! End-to-end runs: classify a GTF, extract UTR sequences, or both.
//!
//! The two phases only communicate through the classified GTF written by
//! [`process_annotation`].

use std::collections::BTreeSet;
use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rayon::prelude::*;
use serde::Serialize;

use crate::annotation::io::open_bufread;
use crate::assemble::{assemble, read_utr_groups, UtrGroup, UtrRecord};
use crate::catalog::{AttributeKeys, LoadStats, TranscriptCatalog};
use crate::emit::{write_fasta_record, write_gtf_header, write_transcript_rows};
use crate::genome::GenomeStore;
use crate::model::types::{Classification, UtrClass};

/// Summary of a `process` run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProcessStats {
    pub rows: LoadStats,
    pub total_transcripts: usize,
    pub transcripts_with_cds: usize,
    pub transcripts_with_utrs: usize,
    pub transcripts_with_classified_utrs: usize,
    pub five_prime_utrs: usize,
    pub three_prime_utrs: usize,
    /// Raw UTRs inside the CDS span (on CDS-bearing transcripts)
    pub utrs_dropped: usize,
    pub output_transcripts: usize,
}

impl ProcessStats {
    /// Classification counts over a built catalog.
    pub fn from_catalog(catalog: &TranscriptCatalog) -> Self {
        let mut stats = ProcessStats {
            rows: catalog.stats.clone(),
            total_transcripts: catalog.transcripts.len(),
            ..Default::default()
        };

        for tx in &catalog.transcripts {
            stats.transcripts_with_cds += tx.has_cds() as usize;
            stats.transcripts_with_utrs += tx.has_utrs() as usize;

            let mut kept = 0usize;
            for c in tx.classifications() {
                match c {
                    Classification::Kept(UtrClass::FivePrime, _) => stats.five_prime_utrs += 1,
                    Classification::Kept(UtrClass::ThreePrime, _) => stats.three_prime_utrs += 1,
                    Classification::Dropped => {
                        stats.utrs_dropped += 1;
                        continue;
                    }
                }
                kept += 1;
            }
            stats.transcripts_with_classified_utrs += (kept > 0) as usize;
        }
        stats
    }
}

impl fmt::Display for ProcessStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Processing Statistics ===")?;
        writeln!(f, "Total input transcripts: {}", self.total_transcripts)?;
        writeln!(f, "Transcripts with CDS: {}", self.transcripts_with_cds)?;
        writeln!(f, "Transcripts with UTRs: {}", self.transcripts_with_utrs)?;
        writeln!(
            f,
            "Transcripts with classified UTRs: {}",
            self.transcripts_with_classified_utrs
        )?;
        writeln!(
            f,
            "Classified UTRs: 5'={}, 3'={}, dropped={}",
            self.five_prime_utrs, self.three_prime_utrs, self.utrs_dropped
        )?;
        writeln!(
            f,
            "Skipped rows: malformed={}, non_coding={}, no_transcript_id={}, chrom_conflict={}",
            self.rows.rows_malformed,
            self.rows.rows_non_coding,
            self.rows.rows_missing_transcript,
            self.rows.rows_chrom_conflict
        )?;
        writeln!(f, "Output transcripts: {}", self.output_transcripts)
    }
}

/// Summary of an `extract` run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExtractStats {
    pub contigs_loaded: usize,
    pub transcripts_processed: usize,
    pub five_utr_regions: u64,
    pub three_utr_regions: u64,
    pub sequences_extracted: usize,
    pub fragments_skipped: u64,
    /// Contigs named by UTR rows but absent from the reference
    pub missing_contigs: Vec<String>,
}

impl fmt::Display for ExtractStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Extraction Statistics ===")?;
        writeln!(f, "Chromosomes loaded: {}", self.contigs_loaded)?;
        writeln!(
            f,
            "UTR regions: 5'={}, 3'={}",
            self.five_utr_regions, self.three_utr_regions
        )?;
        writeln!(f, "Transcripts processed: {}", self.transcripts_processed)?;
        writeln!(f, "Sequences extracted: {}", self.sequences_extracted)?;
        writeln!(f, "Fragments skipped: {}", self.fragments_skipped)?;
        if !self.missing_contigs.is_empty() {
            writeln!(f, "Missing contigs: {}", self.missing_contigs.join(", "))?;
        }
        Ok(())
    }
}

/// Both phases of a `pipeline` run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PipelineStats {
    pub process: ProcessStats,
    pub extract: ExtractStats,
}

impl fmt::Display for PipelineStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.process, self.extract)
    }
}

fn create_output(path: &Path) -> Result<BufWriter<File>> {
    let f = File::create(path).with_context(|| format!("create output {}", path.display()))?;
    Ok(BufWriter::new(f))
}

/// Write every CDS-bearing transcript of `catalog` as classified GTF rows.
///
/// Returns the number of transcripts written.
pub fn write_classified<W: Write>(writer: &mut W, catalog: &TranscriptCatalog) -> std::io::Result<usize> {
    write_gtf_header(writer)?;
    let mut n = 0;
    for tx in catalog.coding() {
        write_transcript_rows(writer, tx)?;
        n += 1;
    }
    Ok(n)
}

/// Classify the UTRs of `input` and write the processed GTF to `output`.
pub fn process_annotation(input: &Path, output: &Path, keys: AttributeKeys) -> Result<ProcessStats> {
    log::info!("Starting GTF UTR processing...");
    let catalog = TranscriptCatalog::from_path(input, keys)?;
    log::debug!("{catalog}");

    log::info!("Re-classifying UTRs...");
    let mut stats = ProcessStats::from_catalog(&catalog);

    log::info!("Writing output file: {}", output.display());
    let mut out = create_output(output)?;
    stats.output_transcripts = write_classified(&mut out, &catalog)
        .and_then(|n| out.flush().map(|_| n))
        .with_context(|| format!("write {}", output.display()))?;

    log::info!("GTF UTR processing completed!");
    Ok(stats)
}

/// Assemble 5' then 3' records for one transcript.
fn assemble_group(group: &UtrGroup, genome: &GenomeStore) -> (Vec<UtrRecord>, u64) {
    let mut records = Vec::with_capacity(2);
    let mut skipped = 0;
    for class in [UtrClass::FivePrime, UtrClass::ThreePrime] {
        let (rec, s) = assemble(group, class, genome);
        skipped += s;
        records.extend(rec);
    }
    (records, skipped)
}

/// Assemble and write FASTA records for classified UTR rows read from `gtf`.
///
/// Transcripts are assembled in parallel against the shared genome; output
/// keeps first-seen transcript order.
pub fn extract_from_reader<R: BufRead, W: Write>(
    gtf: R,
    genome: &GenomeStore,
    writer: &mut W,
) -> Result<ExtractStats> {
    let (groups, group_stats) = read_utr_groups(gtf).context("read classified UTR rows")?;
    log::info!("Loaded UTR data for {} transcripts", groups.len());
    log::info!("5'UTR regions: {}", group_stats.five_utr_regions);
    log::info!("3'UTR regions: {}", group_stats.three_utr_regions);

    let missing: BTreeSet<&str> = groups
        .iter()
        .flat_map(|g| g.five_prime.iter().chain(g.three_prime.iter()))
        .map(|r| r.chrom.as_str())
        .filter(|c| !genome.contains(c))
        .collect();
    for chrom in &missing {
        log::warn!("contig '{}' not found in reference; its UTRs are skipped", chrom);
    }

    let assembled: Vec<(Vec<UtrRecord>, u64)> = groups
        .par_iter()
        .map(|g| assemble_group(g, genome))
        .collect();

    let mut stats = ExtractStats {
        contigs_loaded: genome.len(),
        five_utr_regions: group_stats.five_utr_regions,
        three_utr_regions: group_stats.three_utr_regions,
        missing_contigs: missing.into_iter().map(str::to_string).collect(),
        ..Default::default()
    };

    for (records, skipped) in assembled {
        stats.transcripts_processed += 1;
        stats.fragments_skipped += skipped;
        for rec in &records {
            write_fasta_record(writer, rec).context("write FASTA record")?;
            stats.sequences_extracted += 1;
        }
        if stats.transcripts_processed % 1000 == 0 {
            log::info!("Processed {} transcripts...", stats.transcripts_processed);
        }
    }

    log::info!("Extraction completed!");
    Ok(stats)
}

/// Load `fasta`, then extract every classified UTR of `gtf` into `output`.
pub fn extract_utrs(gtf: &Path, fasta: &Path, output: &Path) -> Result<ExtractStats> {
    let genome = GenomeStore::from_path(fasta)?;

    log::info!("Loading GTF file: {}", gtf.display());
    let reader = open_bufread(gtf).with_context(|| format!("open annotation file {}", gtf.display()))?;

    log::info!("Extracting UTR sequences to: {}", output.display());
    let mut out = create_output(output)?;
    let stats = extract_from_reader(reader, &genome, &mut out)
        .with_context(|| format!("extract UTRs from {}", gtf.display()))?;
    out.flush().with_context(|| format!("write {}", output.display()))?;
    Ok(stats)
}

/// Run both phases. The intermediate GTF goes to `temp_gtf` when given
/// (and is kept), otherwise to a temporary file removed afterwards.
pub fn run_pipeline(
    input: &Path,
    fasta: &Path,
    output: &Path,
    temp_gtf: Option<&Path>,
    keys: AttributeKeys,
) -> Result<PipelineStats> {
    let (intermediate, scratch): (PathBuf, _) = match temp_gtf {
        Some(p) => (p.to_path_buf(), None),
        None => {
            let tmp = tempfile::Builder::new()
                .prefix("utr_extract_")
                .suffix(".gtf")
                .tempfile()
                .context("create temporary GTF")?;
            (tmp.path().to_path_buf(), Some(tmp))
        }
    };

    log::info!("Step 1: Processing GTF file...");
    let process = process_annotation(input, &intermediate, keys)?;

    log::info!("Step 2: Extracting UTR sequences...");
    let extract = extract_utrs(&intermediate, fasta, output)?;

    if let Some(tmp) = scratch {
        log::info!("Cleaning up temporary file: {}", tmp.path().display());
        tmp.close().context("remove temporary GTF")?;
    }

    Ok(PipelineStats { process, extract })
}

/// Dump run statistics as pretty JSON.
pub fn write_stats_json<T: Serialize>(path: &Path, stats: &T) -> Result<()> {
    let mut out = create_output(path)?;
    serde_json::to_writer_pretty(&mut out, stats)
        .with_context(|| format!("serialize statistics to {}", path.display()))?;
    writeln!(out)?;
    out.flush()?;
    Ok(())
}

//! Output formats: classified GTF rows and FASTA UTR records.

use std::io::{self, Write};

use crate::assemble::UtrRecord;
use crate::model::transcript::Transcript;

pub const GTF_SOURCE: &str = "processed";

/// Header comment block for classified annotations.
pub fn write_gtf_header<W: Write>(writer: &mut W) -> io::Result<()> {
    writeln!(writer, "##gff-version 2")?;
    writeln!(writer, "##source: utr_extract")?;
    writeln!(writer, "##description: Processed GTF with classified UTRs")?;
    Ok(())
}

fn base_attributes(tx: &Transcript) -> String {
    format!(
        "gene_id \"{}\"; transcript_id \"{}\"; gene_type \"{}\"; gene_name \"{}\"; transcript_type \"{}\";",
        tx.gene_id, tx.id, tx.gene_type, tx.gene_name, tx.transcript_type
    )
}

/// Write the CDS rows, then the classified UTR rows, of one transcript.
///
/// Both groups are sorted by start. Returns the number of UTR rows written.
/// Transcripts without CDS write nothing.
pub fn write_transcript_rows<W: Write>(writer: &mut W, tx: &Transcript) -> io::Result<usize> {
    if !tx.has_cds() {
        return Ok(0);
    }
    let attrs = base_attributes(tx);

    for cds in tx.sorted_cds() {
        let frame = cds.phase.map(|p| p.to_string()).unwrap_or_else(|| ".".to_string());
        writeln!(
            writer,
            "{}\t{}\tCDS\t{}\t{}\t.\t{}\t{}\t{}",
            tx.chrom, GTF_SOURCE, cds.interval.start, cds.interval.end, tx.strand, frame, attrs
        )?;
    }

    let utrs = tx.classify_utrs();
    for utr in &utrs {
        writeln!(
            writer,
            "{}\t{}\t{}\t{}\t{}\t.\t{}\t.\t{}",
            tx.chrom,
            GTF_SOURCE,
            utr.class.feature_type(),
            utr.interval.start,
            utr.interval.end,
            tx.strand,
            attrs
        )?;
    }

    Ok(utrs.len())
}

/// FASTA header line (without the leading `>`) for an assembled record.
pub fn fasta_header(rec: &UtrRecord) -> String {
    let mut gene = rec.gene_id.clone();
    if !rec.gene_name.is_empty() {
        gene.push('|');
        gene.push_str(&rec.gene_name);
    }
    format!(
        "{}{} length={} strand={} gene={} range={}",
        rec.transcript_id,
        rec.class.record_suffix(),
        rec.length,
        rec.strand,
        gene,
        rec.ranges.join(";")
    )
}

/// Header line followed by the whole sequence on one line.
pub fn write_fasta_record<W: Write>(writer: &mut W, rec: &UtrRecord) -> io::Result<()> {
    writeln!(writer, ">{}", fasta_header(rec))?;
    writer.write_all(&rec.sequence)?;
    writer.write_all(b"\n")
}

#![allow(dead_code)]

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use flate2::write::GzEncoder;
use flate2::Compression;

pub const CHR1_LEN: usize = 3200;

/// chr1 is `ACGT` repeated; base at 1-based `p` is `ACGT[(p - 1) % 4]`.
pub fn chr1() -> String {
    "ACGT".repeat(CHR1_LEN / 4)
}

/// 1-based inclusive slice of [`chr1`].
pub fn chr1_slice(start: usize, end: usize) -> String {
    chr1()[start - 1..end].to_string()
}

fn attrs(tx: &str, gene: &str, biotype: &str) -> String {
    format!(
        "gene_id \"{gene}\"; transcript_id \"{tx}\"; gene_type \"{biotype}\"; gene_name \"{gene}_NAME\"; transcript_type \"{biotype}\";"
    )
}

fn row(feature: &str, start: u64, end: u64, strand: char, frame: &str, attrs: &str) -> String {
    format!("chr1\tHAVANA\t{feature}\t{start}\t{end}\t.\t{strand}\t{frame}\t{attrs}\n")
}

/// GENCODE-style annotation covering:
/// - T1 (+): two CDS blocks, one UTR on each side
/// - T2 (-): one CDS, UTRs straddling both CDS ends
/// - T3 (+): CDS only
/// - T4 (+): UTR only
/// - T5: lncRNA
/// - one truncated row
pub fn annotation() -> String {
    let t1 = attrs("T1", "G1", "protein_coding");
    let t2 = attrs("T2", "G2", "protein_coding");
    let t3 = attrs("T3", "G3", "protein_coding");
    let t4 = attrs("T4", "G4", "protein_coding");
    let t5 = attrs("T5", "G5", "lncRNA");

    let mut gtf = String::from("##description: test annotation\n");
    gtf += &row("gene", 1000, 3000, '+', ".", &t1);
    gtf += &row("exon", 1000, 1200, '+', ".", &t1);
    gtf += &row("CDS", 2500, 2800, '+', "2", &t1);
    gtf += &row("CDS", 1100, 1200, '+', "0", &t1);
    gtf += &row("UTR", 2801, 3000, '+', ".", &t1);
    gtf += &row("UTR", 1000, 1099, '+', ".", &t1);

    gtf += &row("CDS", 1500, 1600, '-', "0", &t2);
    gtf += &row("UTR", 1450, 1510, '-', ".", &t2);
    gtf += &row("UTR", 1590, 1650, '-', ".", &t2);

    gtf += &row("CDS", 100, 200, '+', "0", &t3);

    gtf += &row("UTR", 400, 450, '+', ".", &t4);

    gtf += &row("CDS", 700, 800, '+', "0", &t5);
    gtf += &row("UTR", 600, 699, '+', ".", &t5);

    gtf += "chr1\tHAVANA\tCDS\t10\n";
    gtf
}

pub fn genome_fasta() -> String {
    let seq = chr1();
    let mut fa = String::from(">chr1 test contig\n");
    for chunk in seq.as_bytes().chunks(60) {
        fa += std::str::from_utf8(chunk).unwrap();
        fa.push('\n');
    }
    fa += ">chr2\nNNNN\n";
    fa
}

pub fn write_plain(dir: &Path, name: &str, text: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, text).unwrap();
    path
}

pub fn write_gz(dir: &Path, name: &str, text: &str) -> PathBuf {
    let path = dir.join(name);
    let mut enc = GzEncoder::new(fs::File::create(&path).unwrap(), Compression::default());
    enc.write_all(text.as_bytes()).unwrap();
    enc.finish().unwrap();
    path
}

/// (header, sequence) pairs of a FASTA file written with one sequence line.
pub fn fasta_records(text: &str) -> Vec<(String, String)> {
    let lines: Vec<&str> = text.lines().collect();
    lines
        .chunks(2)
        .map(|c| (c[0].trim_start_matches('>').to_string(), c[1].to_string()))
        .collect()
}

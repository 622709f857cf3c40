//! In-memory reference genome.
//!
//! Built once from a FASTA stream and read-only afterwards, so it can be
//! shared across threads by reference.

use std::collections::HashMap;
use std::io::BufRead;
use std::path::Path;

use anyhow::{Context, Result};

use crate::annotation::io::open_bufread;

/// Contig name -> full sequence, as loaded (case preserved, no validation).
#[derive(Debug, Clone, Default)]
pub struct GenomeStore {
    names: Vec<String>,
    seqs: HashMap<String, Vec<u8>>,
}

impl GenomeStore {
    /// Load a FASTA file (plain or `.gz`).
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        log::info!("Loading FASTA file: {}", path.display());
        let reader = open_bufread(path)
            .with_context(|| format!("open reference {}", path.display()))?;
        Self::from_reader(reader).with_context(|| format!("read reference {}", path.display()))
    }

    /// Scan FASTA records from `reader`.
    ///
    /// - The name is the first whitespace token after `>`; the rest is ignored.
    /// - Sequence lines are concatenated verbatim, surrounding whitespace removed.
    /// - Lines before the first header and records without sequence are dropped.
    /// - A later record with the same name replaces the earlier one.
    pub fn from_reader<R: BufRead>(mut reader: R) -> Result<Self> {
        let mut store = Self::default();
        let mut current: Option<(String, Vec<u8>)> = None;
        let mut line = String::new();

        loop {
            line.clear();
            let n = reader.read_line(&mut line).context("read FASTA line")?;
            if n == 0 {
                break;
            }

            let s = line.trim();
            if let Some(header) = s.strip_prefix('>') {
                if let Some((name, seq)) = current.take() {
                    store.insert(name, seq);
                }
                let name = header.split_whitespace().next().unwrap_or("").to_string();
                current = Some((name, Vec::new()));
            } else if let Some((_, seq)) = current.as_mut() {
                seq.extend_from_slice(s.as_bytes());
            }
        }
        if let Some((name, seq)) = current.take() {
            store.insert(name, seq);
        }

        log::info!("Total chromosomes loaded: {}", store.len());
        Ok(store)
    }

    fn insert(&mut self, name: String, seq: Vec<u8>) {
        if seq.is_empty() {
            log::debug!("FASTA record '{}' has no sequence, ignored", name);
            return;
        }
        log::info!("Loaded chromosome: {} ({} bp)", name, seq.len());
        if !self.seqs.contains_key(&name) {
            self.names.push(name.clone());
        }
        self.seqs.insert(name, seq);
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Contig names in file order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn contains(&self, chrom: &str) -> bool {
        self.seqs.contains_key(chrom)
    }

    pub fn seq_len(&self, chrom: &str) -> Option<usize> {
        self.seqs.get(chrom).map(|s| s.len())
    }

    /// Bases `start..=end` (1-based, inclusive) of `chrom`.
    ///
    /// `None` when the contig is unknown, `start < 1`, `start > end`, or `end`
    /// runs past the contig.
    pub fn slice(&self, chrom: &str, start: u64, end: u64) -> Option<&[u8]> {
        let seq = self.seqs.get(chrom)?;
        if start < 1 || start > end {
            return None;
        }
        let s = usize::try_from(start - 1).ok()?;
        let e = usize::try_from(end).ok()?;
        seq.get(s..e)
    }
}

/// Reverse complement a DNA sequence.
///
/// A↔T and G↔C, case-insensitively; output is upper case and any other byte
/// (N, IUPAC ambiguity codes, gaps) becomes `N`.
pub fn reverse_complement(seq: &[u8]) -> Vec<u8> {
    seq.iter()
        .rev()
        .map(|b| match b.to_ascii_uppercase() {
            b'A' => b'T',
            b'T' => b'A',
            b'G' => b'C',
            b'C' => b'G',
            _ => b'N',
        })
        .collect()
}

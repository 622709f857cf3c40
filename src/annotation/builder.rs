use std::io::BufRead;
use std::path::Path;

use anyhow::Result;

use crate::annotation::io::ParseError;
use crate::catalog::{AttributeKeys, TranscriptCatalog};

/// High-level builder for creating a `TranscriptCatalog` from a GTF file.
///
/// - parses the whole file (optionally gzipped)
/// - configurable attribute keys for ids, names and biotypes
/// - configurable feature types for exon / UTR / CDS rows
#[derive(Debug, Clone, Default)]
pub struct AnnotationBuilder {
    pub keys: AttributeKeys,
}

fn owned(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl AnnotationBuilder {
    /// Start with defaults that work for GENCODE and Ensembl GTFs.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_keys(keys: AttributeKeys) -> Self {
        Self { keys }
    }

    /// Convenience: set a single key (or first-preference key) for gene id.
    pub fn gene_id_key(mut self, key: &str) -> Self {
        self.keys.gene_id_keys = vec![key.to_string()];
        self
    }

    pub fn gene_name_keys(mut self, keys: &[&str]) -> Self {
        self.keys.gene_name_keys = owned(keys);
        self
    }

    pub fn transcript_id_keys(mut self, keys: &[&str]) -> Self {
        self.keys.transcript_id_keys = owned(keys);
        self
    }

    pub fn gene_type_keys(mut self, keys: &[&str]) -> Self {
        self.keys.gene_type_keys = owned(keys);
        self
    }

    pub fn transcript_type_keys(mut self, keys: &[&str]) -> Self {
        self.keys.transcript_type_keys = owned(keys);
        self
    }

    /// Gene/transcript types that are kept (default: protein_coding).
    pub fn coding_types(mut self, types: &[&str]) -> Self {
        self.keys.coding_types = owned(types);
        self
    }

    /// Feature types that count as unclassified UTR rows.
    /// Typical:
    /// - GENCODE: ["UTR"]
    /// - Ensembl: ["five_prime_utr", "three_prime_utr"]
    pub fn utr_feature_types(mut self, types: &[&str]) -> Self {
        self.keys.utr_feature_types = owned(types);
        self
    }

    pub fn cds_feature_types(mut self, types: &[&str]) -> Self {
        self.keys.cds_feature_types = owned(types);
        self
    }

    pub fn exon_feature_types(mut self, types: &[&str]) -> Self {
        self.keys.exon_feature_types = owned(types);
        self
    }

    /// Build the catalog from anything implementing `BufRead`.
    pub fn build_from_reader<R: BufRead>(&self, reader: R) -> Result<TranscriptCatalog, ParseError> {
        TranscriptCatalog::new().from_reader(reader, self.keys.clone())
    }

    /// Build the catalog from a file path.
    ///
    /// - If path ends with `.gz`, the stream is gunzipped.
    /// - Otherwise reads as plain text.
    pub fn build_from_path<P: AsRef<Path>>(&self, path: P) -> Result<TranscriptCatalog> {
        TranscriptCatalog::from_path(path, self.keys.clone())
    }
}

// -------------------- tests --------------------

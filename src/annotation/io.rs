use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use anyhow::{Context, Result};
use flate2::read::MultiGzDecoder;

use crate::types::{Interval, Strand};

/// File dialect detected from attribute syntax.
///
/// - GFF3 typically uses: key=value;key2=value2
/// - GTF typically uses: key "value"; key2 "value2";
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    Gff3,
    Gtf,
    Unknown,
}

/// A single parsed record line from GTF/GFF3.
///
/// Coordinates are kept exactly as written: 1-based, inclusive.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotationRecord {
    pub seqname: String,      // chromosome / contig
    pub source: String,       // column 2
    pub feature_type: String, // column 3
    pub interval: Interval,   // columns 4 + 5
    pub score: Option<f32>,   // '.' or non-numeric => None
    pub strand: Strand,       // + / - / . / ?
    pub phase: Option<u8>,    // '.' => None, else 0/1/2
    pub attrs: HashMap<String, String>,
    pub dialect: Dialect,
}

impl AnnotationRecord {
    /// Convenience: get an attribute value.
    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attrs.get(key).map(|s| s.as_str())
    }

    pub fn is_feature_in(&self, types: &[String]) -> bool {
        types.iter().any(|t| t == &self.feature_type)
    }

    pub fn pick_first_attr(&self, keys: &[String]) -> Option<String> {
        for k in keys {
            if let Some(v) = self.attr(k) {
                let v = v.trim();
                if !v.is_empty() {
                    return Some(v.to_string());
                }
            }
        }
        None
    }
}

/// Parsing errors for GTF/GFF3.
///
/// Only `IoPath` is fatal; the other variants describe a single bad row and
/// callers skip it.
#[derive(Debug)]
pub enum ParseError {
    IoPath { path: String, source: std::io::Error },
    MalformedLine { line: String },
    BadCoordinates { line: String },
}

impl ParseError {
    pub fn is_fatal(&self) -> bool {
        matches!(self, ParseError::IoPath { .. })
    }
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseError::IoPath { path, source } => {
                write!(f, "I/O error while reading '{}': {}", path, source)
            }
            ParseError::MalformedLine { line } => write!(f, "Malformed GTF/GFF line: {}", line),
            ParseError::BadCoordinates { line } => write!(f, "Bad coordinates in line: {}", line),
        }
    }
}

impl std::error::Error for ParseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ParseError::IoPath { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Open a text input, decompressing it on the fly when the name ends in `.gz`.
///
/// Multi-member streams (bgzip) are read to the end.
pub fn open_bufread(path: &Path) -> Result<Box<dyn BufRead + Send>> {
    let is_gz = path
        .extension()
        .and_then(|s| s.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("gz"))
        .unwrap_or(false);

    let f = File::open(path).with_context(|| format!("open {}", path.display()))?;

    if is_gz {
        Ok(Box::new(BufReader::new(MultiGzDecoder::new(f))))
    } else {
        Ok(Box::new(BufReader::new(f)))
    }
}

/// Low-level streaming parser for GTF/GFF3 files.
///
/// Most users should **not** use this directly.
/// Instead, use [`crate::annotation::AnnotationBuilder`] to build a full
/// `TranscriptCatalog` from a file in one step.
///
/// # Example
/// ```no_run
/// use std::fs::File;
/// use std::io::BufReader;
/// use utr_extract::annotation::io::AnnotationReader;
///
/// let file = File::open("genes.gtf").unwrap();
/// let reader = BufReader::new(file);
///
/// let rdr = AnnotationReader::new(reader);
/// for rec in rdr.records() {
///     let rec = rec.unwrap();
///     println!("{} {}", rec.seqname, rec.interval);
/// }
/// ```
pub struct AnnotationReader<R: BufRead> {
    reader: R,
    buf: String,
    lines_read: u64,
}

impl<R: BufRead> AnnotationReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buf: String::new(),
            lines_read: 0,
        }
    }

    /// Returns an iterator over parsed records.
    ///
    /// - Skips blank lines
    /// - Skips comment lines starting with '#'
    /// - Logs progress every 100000 physical lines
    pub fn records(mut self) -> impl Iterator<Item = Result<AnnotationRecord, ParseError>> {
        std::iter::from_fn(move || loop {
            self.buf.clear();
            match self.reader.read_line(&mut self.buf) {
                Ok(0) => return None,
                Ok(_) => {}
                Err(e) => {
                    return Some(Err(ParseError::IoPath {
                        path: "<reader>".to_string(),
                        source: e,
                    }))
                },
            }

            self.lines_read += 1;
            if self.lines_read % 100_000 == 0 {
                log::info!("Processed {} lines...", self.lines_read);
            }

            let line = self.buf.trim_end_matches(&['\n', '\r'][..]);
            if line.trim().is_empty() || line.starts_with('#') {
                continue;
            }

            return Some(parse_record_line(line));
        })
    }
}

/// Parse a single non-comment line into an `AnnotationRecord`.
pub fn parse_record_line(line: &str) -> Result<AnnotationRecord, ParseError> {
    let malformed = || ParseError::MalformedLine {
        line: line.to_string(),
    };
    let bad_coords = || ParseError::BadCoordinates {
        line: line.to_string(),
    };

    // seqname source feature start end score strand phase attributes
    let fields: Vec<&str> = line.trim_end().split('\t').collect();
    let [seqname, source, feature_type, start_s, end_s, score_s, strand_s, phase_s, attrs_s] =
        fields[..]
    else {
        return Err(malformed());
    };

    let start: u64 = start_s.trim().parse().map_err(|_| bad_coords())?;
    let end: u64 = end_s.trim().parse().map_err(|_| bad_coords())?;

    if start == 0 {
        return Err(bad_coords());
    }
    let interval = Interval::try_new(start, end).ok_or_else(bad_coords)?;

    // Scores are informational; anything non-numeric reads as missing.
    let score = score_s.trim().parse::<f32>().ok();

    let strand = Strand::from_column(strand_s).ok_or_else(malformed)?;

    let phase = if phase_s == "." {
        None
    } else {
        let p: u8 = phase_s.parse().map_err(|_| malformed())?;
        if p > 2 {
            return Err(malformed());
        }
        Some(p)
    };

    let (dialect, attrs) = parse_attributes(attrs_s);

    Ok(AnnotationRecord {
        seqname: seqname.to_string(),
        source: source.to_string(),
        feature_type: feature_type.to_string(),
        interval,
        score,
        strand,
        phase,
        attrs,
        dialect,
    })
}

/// Parse the attributes field for either GFF3 or GTF.
///
/// Returns (Dialect, map).
///
/// Heuristics, decided on the first attribute so that values never count:
/// - If its key token contains '=' => treat as GFF3
/// - Else if the column contains quotes => treat as GTF
/// - Else Unknown: `key value` pairs, parsed best-effort
///
/// GTF values may be quoted or bare; quotes are stripped either way.
pub fn parse_attributes(s: &str) -> (Dialect, HashMap<String, String>) {
    let s = s.trim();

    let first_token = s
        .split(';')
        .map(str::trim)
        .find(|p| !p.is_empty())
        .and_then(|p| p.split_whitespace().next())
        .unwrap_or("");

    let dialect = if first_token.contains('=') {
        Dialect::Gff3
    } else if s.contains('"') {
        Dialect::Gtf
    } else {
        Dialect::Unknown
    };

    let mut map = HashMap::new();

    for part in s.split(';') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }

        let (key, value) = match dialect {
            Dialect::Gff3 => match part.split_once('=') {
                Some((k, v)) => (k, v),
                None => continue,
            },
            Dialect::Gtf | Dialect::Unknown => match part.split_once(char::is_whitespace) {
                Some((k, v)) => (k, v),
                None => continue,
            },
        };

        let key = key.trim();
        let value = unquote(value);
        if !key.is_empty() && !value.is_empty() {
            map.insert(key.to_string(), value);
        }
    }

    (dialect, map)
}

fn unquote(v: &str) -> String {
    let v = v.trim();
    let v = v.strip_prefix('"').unwrap_or(v);
    let v = v.strip_suffix('"').unwrap_or(v);
    v.to_string()
}

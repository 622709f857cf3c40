use std::fmt;

use serde::{Serialize, Deserialize};

/// Genomic strand/orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize )]
pub enum Strand {
    Plus,
    Minus,
    Unknown,
}

impl Strand {
    /// Parse the GTF strand column. Returns `None` for anything but `+ - . ?`.
    pub fn from_column(s: &str) -> Option<Self> {
        match s {
            "+" => Some(Strand::Plus),
            "-" => Some(Strand::Minus),
            "." | "?" => Some(Strand::Unknown),
            _ => None,
        }
    }

    pub fn as_char(self) -> char {
        match self {
            Strand::Plus => '+',
            Strand::Minus => '-',
            Strand::Unknown => '.',
        }
    }
}

impl fmt::Display for Strand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// A contiguous genomic interval.
/// Coordinates are 1-based, inclusive: [start, end]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize )]
pub struct Interval {
    pub start: u64,
    pub end: u64,
}

impl Interval {
    /// Create a new interval. Panics if start > end.
    pub fn new(start: u64, end: u64) -> Self {
        assert!(start <= end, "Interval requires start <= end");
        Self { start, end }
    }

    /// Checked constructor: `None` when the bounds are inverted.
    pub fn try_new(start: u64, end: u64) -> Option<Self> {
        (start <= end).then_some(Self { start, end })
    }

    #[inline]
    pub fn len(self) -> u64 {
        self.end - self.start + 1
    }

    #[inline]
    pub fn overlaps(self, other: Interval) -> bool {
        self.start <= other.end && other.start <= self.end
    }

    #[inline]
    pub fn contains(self, other: Interval) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    /// Smallest interval covering every interval in `it`.
    pub fn bounding<I: IntoIterator<Item = Interval>>(it: I) -> Option<Interval> {
        it.into_iter().fold(None, |acc, iv| match acc {
            None => Some(iv),
            Some(b) => Some(Interval {
                start: b.start.min(iv.start),
                end: b.end.max(iv.end),
            }),
        })
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

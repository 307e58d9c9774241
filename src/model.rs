//! Data model for pairwise alignment blocks.
//!
//! This module contains the value types flowing through the splitter:
//! - `Strand`: query orientation relative to the reference
//! - `AlignmentRecord`: one validated alignment block as read from input
//! - `SubAlignment`: one slice of a record, as written to output

use std::fmt;
use std::ops::Range;
use std::str::FromStr;

use thiserror::Error;

/// Default gap symbol in aligned sequences.
pub const GAP: u8 = b'-';

/// Orientation of the query sequence relative to the reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strand {
    /// `+`: query coordinates increase with alignment columns
    Forward,
    /// `-`: query coordinates decrease with alignment columns
    Reverse,
}

impl fmt::Display for Strand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strand::Forward => write!(f, "+"),
            Strand::Reverse => write!(f, "-"),
        }
    }
}

impl FromStr for Strand {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "+" => Ok(Strand::Forward),
            "-" => Ok(Strand::Reverse),
            other => Err(other.to_string()),
        }
    }
}

/// Which row of the pairwise alignment a value refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Reference,
    Query,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Reference => write!(f, "reference"),
            Side::Query => write!(f, "query"),
        }
    }
}

/// A record whose aligned sequences disagree with its declared coordinates.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InvariantViolation {
    #[error("{side} has {found} residues but coordinates span {expected}")]
    NonGapCount {
        side: Side,
        expected: i64,
        found: i64,
    },

    #[error("{side} coordinates {start}..{end} are out of range")]
    SpanOutOfRange { side: Side, start: i64, end: i64 },

    #[error("aligned sequences differ in length (reference {reference}, query {query})")]
    LengthMismatch { reference: usize, query: usize },
}

/// Counts the non-gap characters of an aligned slice.
pub fn residue_count(aligned: &[u8], gap: u8) -> usize {
    aligned.iter().filter(|&&b| b != gap).count()
}

/// One pairwise alignment block.
///
/// Coordinates are inclusive. The reference is always on the forward strand;
/// `strand` describes the query. Instances are only built through
/// [`AlignmentRecord::new`], so the residue counts of both aligned sequences
/// always agree with the declared spans.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlignmentRecord {
    item_id: String,
    ref_chrom: String,
    ref_start: i64,
    ref_end: i64,
    query_chrom: String,
    query_start: i64,
    query_end: i64,
    strand: Strand,
    ref_aligned: Vec<u8>,
    query_aligned: Vec<u8>,
}

impl AlignmentRecord {
    /// Builds a record, checking it against the alignment invariants.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        item_id: impl Into<String>,
        ref_chrom: impl Into<String>,
        ref_start: i64,
        ref_end: i64,
        query_chrom: impl Into<String>,
        query_start: i64,
        query_end: i64,
        strand: Strand,
        ref_aligned: impl Into<Vec<u8>>,
        query_aligned: impl Into<Vec<u8>>,
        gap: u8,
    ) -> Result<Self, InvariantViolation> {
        let record = Self {
            item_id: item_id.into(),
            ref_chrom: ref_chrom.into(),
            ref_start,
            ref_end,
            query_chrom: query_chrom.into(),
            query_start,
            query_end,
            strand,
            ref_aligned: ref_aligned.into(),
            query_aligned: query_aligned.into(),
        };
        record.validate(gap)?;
        Ok(record)
    }

    fn validate(&self, gap: u8) -> Result<(), InvariantViolation> {
        if self.ref_aligned.len() != self.query_aligned.len() {
            return Err(InvariantViolation::LengthMismatch {
                reference: self.ref_aligned.len(),
                query: self.query_aligned.len(),
            });
        }

        let sides = [
            (Side::Reference, &self.ref_aligned, self.ref_start, self.ref_end),
            (Side::Query, &self.query_aligned, self.query_start, self.query_end),
        ];
        for (side, aligned, start, end) in sides {
            // Slices may sit one past either end of the span (empty segments).
            let expected = end
                .checked_sub(start)
                .and_then(|d| d.checked_add(1))
                .filter(|_| start > i64::MIN && end < i64::MAX)
                .ok_or(InvariantViolation::SpanOutOfRange { side, start, end })?;
            let found = residue_count(aligned, gap) as i64;
            if found != expected {
                return Err(InvariantViolation::NonGapCount {
                    side,
                    expected,
                    found,
                });
            }
        }
        Ok(())
    }

    pub fn item_id(&self) -> &str {
        &self.item_id
    }

    pub fn ref_chrom(&self) -> &str {
        &self.ref_chrom
    }

    pub fn ref_start(&self) -> i64 {
        self.ref_start
    }

    pub fn ref_end(&self) -> i64 {
        self.ref_end
    }

    pub fn query_chrom(&self) -> &str {
        &self.query_chrom
    }

    pub fn query_start(&self) -> i64 {
        self.query_start
    }

    pub fn query_end(&self) -> i64 {
        self.query_end
    }

    pub fn strand(&self) -> Strand {
        self.strand
    }

    pub fn ref_aligned(&self) -> &[u8] {
        &self.ref_aligned
    }

    pub fn query_aligned(&self) -> &[u8] {
        &self.query_aligned
    }

    /// Returns the number of alignment columns.
    pub fn len(&self) -> usize {
        self.ref_aligned.len()
    }

    /// Returns true if the record has no alignment columns.
    pub fn is_empty(&self) -> bool {
        self.ref_aligned.is_empty()
    }
}

/// A slice of an [`AlignmentRecord`] cut at the column range `columns`.
///
/// Owns copies of its sequences and names; nothing is shared with the parent.
/// A side without residues has `end == start - 1`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubAlignment {
    pub ref_chrom: String,
    pub ref_start: i64,
    pub ref_end: i64,
    pub query_chrom: String,
    pub query_start: i64,
    pub query_end: i64,
    pub strand: Strand,
    pub ref_aligned: Vec<u8>,
    pub query_aligned: Vec<u8>,
    /// Half-open column range within the parent record
    pub columns: Range<usize>,
}

impl SubAlignment {
    /// Returns the number of alignment columns.
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Returns true if the slice covers no columns.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

//! Column-to-genome coordinate translation.
//!
//! Slicing a record at columns `[c0, c1)` needs the number of residues each
//! row holds before `c0` (the offset of the slice into the declared span) and
//! inside `[c0, c1)` (the length of the slice on the genome).
//!
//! The reference is always read on the forward strand. On a `-` query the
//! genome coordinates run against the alignment columns, so the offset is
//! taken from `query_end` downwards:
//!
//! ```text
//! columns      0 1 2 3 4 5
//! query        A C - - G T      query_start = 10, query_end = 13
//! + strand     10 11 . . 12 13
//! - strand     13 12 . . 11 10
//! ```

use std::ops::{Bound, Range, RangeBounds};

use crate::model::{residue_count, AlignmentRecord, Strand, SubAlignment};

/// Resolves any range expression against an alignment of `len` columns.
///
/// Out-of-range bounds are clamped, and a start past the end yields an empty
/// range at the end.
fn resolve_columns(columns: impl RangeBounds<usize>, len: usize) -> Range<usize> {
    let end = match columns.end_bound() {
        Bound::Included(&e) => e.saturating_add(1),
        Bound::Excluded(&e) => e,
        Bound::Unbounded => len,
    }
    .min(len);
    let start = match columns.start_bound() {
        Bound::Included(&s) => s,
        Bound::Excluded(&s) => s.saturating_add(1),
        Bound::Unbounded => 0,
    }
    .min(end);
    start..end
}

/// Cuts sub-alignments out of one record.
///
/// Keeps running residue counts for the columns it has already walked, so a
/// left-to-right sequence of slices costs one pass over the record. Slicing
/// behind the cursor is allowed; it restarts the count from column 0.
#[derive(Debug)]
pub struct Translator<'a> {
    record: &'a AlignmentRecord,
    gap: u8,
    col: usize,
    ref_residues: usize,
    query_residues: usize,
}

impl<'a> Translator<'a> {
    pub fn new(record: &'a AlignmentRecord, gap: u8) -> Self {
        Self {
            record,
            gap,
            col: 0,
            ref_residues: 0,
            query_residues: 0,
        }
    }

    fn advance_to(&mut self, col: usize) {
        if col < self.col {
            self.col = 0;
            self.ref_residues = 0;
            self.query_residues = 0;
        }
        let span = self.col..col;
        self.ref_residues += residue_count(&self.record.ref_aligned()[span.clone()], self.gap);
        self.query_residues += residue_count(&self.record.query_aligned()[span], self.gap);
        self.col = col;
    }

    /// Returns the sub-alignment covering `columns` with its genome coordinates.
    ///
    /// `..` and `c0..` select through the end of the record.
    pub fn slice(&mut self, columns: impl RangeBounds<usize>) -> SubAlignment {
        let record = self.record;
        let columns = resolve_columns(columns, record.len());
        self.advance_to(columns.start);

        let ref_aligned = record.ref_aligned()[columns.clone()].to_vec();
        let query_aligned = record.query_aligned()[columns.clone()].to_vec();
        let ref_count = residue_count(&ref_aligned, self.gap);
        let query_count = residue_count(&query_aligned, self.gap);

        let ref_start = record.ref_start() + self.ref_residues as i64;
        let ref_end = ref_start + ref_count as i64 - 1;

        let (query_start, query_end) = match record.strand() {
            Strand::Forward => {
                let start = record.query_start() + self.query_residues as i64;
                (start, start + query_count as i64 - 1)
            }
            Strand::Reverse => {
                let end = record.query_end() - self.query_residues as i64;
                (end - query_count as i64 + 1, end)
            }
        };

        self.col = columns.end;
        self.ref_residues += ref_count;
        self.query_residues += query_count;

        SubAlignment {
            ref_chrom: record.ref_chrom().to_string(),
            ref_start,
            ref_end,
            query_chrom: record.query_chrom().to_string(),
            query_start,
            query_end,
            strand: record.strand(),
            ref_aligned,
            query_aligned,
            columns,
        }
    }
}

/// Slices a single column range out of `record`.
pub fn sub_alignment(
    record: &AlignmentRecord,
    columns: impl RangeBounds<usize>,
    gap: u8,
) -> SubAlignment {
    Translator::new(record, gap).slice(columns)
}

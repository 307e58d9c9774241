//! Gap run detection.
//!
//! A gap run is a maximal stretch of the gap character in one aligned
//! sequence. Runs are reported as half-open column ranges; both rows of a
//! record share the same column space, so runs from either side can be
//! merged directly.

use std::num::NonZeroUsize;
use std::ops::Range;

use crate::model::AlignmentRecord;

/// Returns the maximal gap runs of `aligned` that are at least `min_len` long.
///
/// Single pass: the start of the current run is tracked and the run is
/// closed on the first non-gap character (or at the end of the sequence).
pub fn gap_runs(aligned: &[u8], gap: u8, min_len: NonZeroUsize) -> Vec<Range<usize>> {
    let mut runs = Vec::new();
    let mut run_start: Option<usize> = None;

    for (col, &b) in aligned.iter().enumerate() {
        match (b == gap, run_start) {
            (true, None) => run_start = Some(col),
            (false, Some(start)) => {
                if col - start >= min_len.get() {
                    runs.push(start..col);
                }
                run_start = None;
            }
            _ => {}
        }
    }

    if let Some(start) = run_start {
        if aligned.len() - start >= min_len.get() {
            runs.push(start..aligned.len());
        }
    }

    runs
}

/// Collects the qualifying gap runs of both rows of `record`, ordered by start column.
///
/// Reference runs come before query runs in the input to the (stable) sort,
/// so a tie on the start column keeps the reference run first.
pub fn split_points(record: &AlignmentRecord, gap: u8, min_len: NonZeroUsize) -> Vec<Range<usize>> {
    let mut runs = gap_runs(record.ref_aligned(), gap, min_len);
    runs.extend(gap_runs(record.query_aligned(), gap, min_len));
    runs.sort_by_key(|run| run.start);
    runs
}

/// Counts columns holding the gap character in both rows.
pub fn double_gap_columns(record: &AlignmentRecord, gap: u8) -> usize {
    record
        .ref_aligned()
        .iter()
        .zip(record.query_aligned())
        .filter(|&(&r, &q)| r == gap && q == gap)
        .count()
}

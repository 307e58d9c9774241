//! Splitting records at long gap runs.
//!
//! The splitter walks the gap runs of both rows in column order. Every run
//! closes the segment that started after the previous run, and the columns of
//! the run itself are excised. One last segment always runs from the end of
//! the final run to the end of the record.

use std::num::NonZeroUsize;
use std::ops::Range;

use crate::gaps::{double_gap_columns, split_points};
use crate::model::{AlignmentRecord, SubAlignment, GAP};
use crate::translate::Translator;

/// Run-time settings of the splitter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SplitOptions {
    /// Shortest gap run that triggers a split
    pub min_gap: NonZeroUsize,
    /// Gap symbol in aligned sequences
    pub gap: u8,
}

impl SplitOptions {
    pub fn new(min_gap: NonZeroUsize) -> Self {
        Self { min_gap, gap: GAP }
    }

    pub fn with_gap(mut self, gap: u8) -> Self {
        self.gap = gap;
        self
    }
}

/// Column layout of a split: kept segments and excised gap runs.
///
/// Together the two lists partition `0..len` of the record.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SplitPlan {
    pub segments: Vec<Range<usize>>,
    pub excised: Vec<Range<usize>>,
}

impl SplitPlan {
    /// Plans the split of `record`.
    ///
    /// A run starting inside columns that were already excised (a reference
    /// run overlapping a query run) closes no segment; it only extends the
    /// excised stretch when it reaches further.
    pub fn for_record(record: &AlignmentRecord, options: &SplitOptions) -> Self {
        let mut plan = SplitPlan::default();
        let mut relative_start = 0;

        for run in split_points(record, options.gap, options.min_gap) {
            if run.start < relative_start {
                if run.end > relative_start {
                    if let Some(last) = plan.excised.last_mut() {
                        last.end = run.end;
                    }
                    relative_start = run.end;
                }
                continue;
            }
            plan.segments.push(relative_start..run.start);
            relative_start = run.end;
            plan.excised.push(run);
        }

        plan.segments.push(relative_start..record.len());
        plan
    }
}

/// Splits `record` into sub-alignments, left to right in column order.
///
/// A record without qualifying gap runs comes back as a single sub-alignment
/// spanning the whole record.
pub fn split_record(record: &AlignmentRecord, options: &SplitOptions) -> Vec<SubAlignment> {
    let plan = SplitPlan::for_record(record, options);

    let double_gaps = double_gap_columns(record, options.gap);
    if double_gaps > 0 {
        log::warn!(
            "Record {}: {} column(s) are gaps on both sides",
            record.item_id(),
            double_gaps
        );
    }

    let mut translator = Translator::new(record, options.gap);
    let subs: Vec<SubAlignment> = plan
        .segments
        .into_iter()
        .map(|segment| translator.slice(segment))
        .collect();

    log::debug!(
        "Record {}: {} column(s) split into {} sub-alignment(s)",
        record.item_id(),
        record.len(),
        subs.len()
    );
    subs
}

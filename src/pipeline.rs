//! Streaming split pipeline: AXT reader, splitter, AXT writer.
//!
//! Records are independent, so the parallel variant only has to keep the
//! output in input order; it splits a batch of records on the rayon pool and
//! writes the results in the order the records were read.

use std::io::{BufRead, Write};
use std::num::NonZeroUsize;
use std::path::Path;

use rayon::prelude::*;

use crate::formats::{create_output, open_input, AxtError, AxtReader, AxtResult, AxtWriter};
use crate::model::{AlignmentRecord, SubAlignment};
use crate::split::{split_record, SplitOptions};

/// Counts reported at the end of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RunSummary {
    /// Alignment records read
    pub records: usize,
    /// Sub-alignments written
    pub sub_alignments: usize,
}

/// Splits every record of `input` and writes the pieces to `output`, one record at a time.
pub fn split_stream<R: BufRead, W: Write>(
    input: R,
    output: W,
    options: &SplitOptions,
) -> AxtResult<RunSummary> {
    let reader = AxtReader::with_gap(input, options.gap);
    let mut writer = AxtWriter::new(output);
    let mut summary = RunSummary::default();

    for record in reader {
        let subs = split_record(&record?, options);
        writer.write_batch(&subs).map_err(AxtError::Write)?;
        summary.records += 1;
    }

    writer.flush().map_err(AxtError::Write)?;
    summary.sub_alignments = writer.written() as usize;
    Ok(summary)
}

/// Like [`split_stream`], splitting up to `batch_size` records at a time in parallel.
///
/// Output is identical to the sequential pipeline: records read before a
/// parse error are still written before the error is returned.
pub fn split_stream_parallel<R: BufRead, W: Write>(
    input: R,
    output: W,
    options: &SplitOptions,
    batch_size: NonZeroUsize,
) -> AxtResult<RunSummary> {
    let mut reader = AxtReader::with_gap(input, options.gap);
    let mut writer = AxtWriter::new(output);
    let mut summary = RunSummary::default();

    loop {
        let mut batch: Vec<AlignmentRecord> = Vec::with_capacity(batch_size.get());
        let mut failure = None;
        for record in reader.by_ref().take(batch_size.get()) {
            match record {
                Ok(record) => batch.push(record),
                Err(e) => {
                    failure = Some(e);
                    break;
                }
            }
        }
        if batch.is_empty() && failure.is_none() {
            break;
        }

        let splits: Vec<Vec<SubAlignment>> = batch
            .par_iter()
            .map(|record| split_record(record, options))
            .collect();

        for subs in &splits {
            writer.write_batch(subs).map_err(AxtError::Write)?;
            summary.records += 1;
        }
        log::debug!("Wrote batch of {} record(s)", splits.len());

        if let Some(e) = failure {
            writer.flush().map_err(AxtError::Write)?;
            return Err(e);
        }
    }

    writer.flush().map_err(AxtError::Write)?;
    summary.sub_alignments = writer.written() as usize;
    Ok(summary)
}

/// Splits the AXT file at `input` into `output` (either may be `-`).
///
/// With more than one thread the parallel pipeline runs on the global rayon
/// pool, which the caller is expected to have sized.
pub fn split_file<P: AsRef<Path>, Q: AsRef<Path>>(
    input: P,
    output: Q,
    options: &SplitOptions,
    threads: usize,
    batch_size: NonZeroUsize,
) -> AxtResult<RunSummary> {
    let reader = open_input(&input)?;
    let writer = create_output(&output).map_err(AxtError::Write)?;

    if threads > 1 {
        split_stream_parallel(reader, writer, options, batch_size)
    } else {
        split_stream(reader, writer, options)
    }
}

//! AXT pairwise alignment reader and writer.
//!
//! ## AXT Format
//!
//! Each block is a header line followed by the aligned reference and the
//! aligned query, one token per line:
//! ```text
//! # comment
//! 0 chr19 3001012 3001075 chr11 70568380 70568443 - 3500
//! TCAGCTCATAAATCACCTCCTGCCACAAGCCTGGCCTGGTCCCAGGAGAGTGTCCAGGCTCAGA
//! TCTGTTCATAAACCACCTGCCATGACAAGCCTGGCCTGTTCCCAAGACAATGTCCAGGCTCAGA
//! ```
//!
//! Header fields are `item_id ref_chrom ref_start ref_end query_chrom
//! query_start query_end strand`; anything after the eighth field (such as
//! the score) is ignored.
//!
//! The writer emits the same layout with a running index in place of the
//! item id and a blank line after every block.

use std::io::{self, BufRead, Write};

use thiserror::Error;

use crate::model::{AlignmentRecord, InvariantViolation, Strand, SubAlignment, GAP};

/// Minimum number of whitespace-separated fields of a header line.
pub const HEADER_FIELDS: usize = 8;

/// Errors that can occur while reading or writing AXT.
#[derive(Error, Debug)]
pub enum AxtError {
    #[error("Failed to read input: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to write output: {0}")]
    Write(#[source] io::Error),

    #[error("Line {line}: input is not valid UTF-8 text")]
    InvalidText { line: usize },

    #[error("Line {line}: header has {found} fields, expected at least 8")]
    MalformedHeader { line: usize, found: usize },

    #[error("Line {line}: {field} '{value}' is not an integer")]
    InvalidCoordinate {
        line: usize,
        field: &'static str,
        value: String,
    },

    #[error("Line {line}: strand must be '+' or '-', got '{value}'")]
    InvalidStrand { line: usize, value: String },

    #[error("Line {line}: new header while record '{item}' is missing its {missing} sequence line")]
    UnexpectedHeader {
        line: usize,
        item: String,
        missing: &'static str,
    },

    #[error("Line {line}: sequence line without a preceding header")]
    SequenceWithoutHeader { line: usize },

    #[error("Record '{item}' ends before its {missing} sequence line")]
    TruncatedRecord { item: String, missing: &'static str },

    #[error("Record '{item}' (line {line}): {source}")]
    Invariant {
        line: usize,
        item: String,
        source: InvariantViolation,
    },
}

impl AxtError {
    /// Returns true for malformed input, as opposed to I/O or invariant failures.
    pub fn is_parse_error(&self) -> bool {
        !matches!(self, AxtError::Io(_) | AxtError::Write(_) | AxtError::Invariant { .. })
    }
}

/// Result type for AXT operations.
pub type AxtResult<T> = Result<T, AxtError>;

/// Header fields of a block still waiting for its sequence lines.
#[derive(Debug)]
struct PendingHeader {
    line: usize,
    item_id: String,
    ref_chrom: String,
    ref_start: i64,
    ref_end: i64,
    query_chrom: String,
    query_start: i64,
    query_end: i64,
    strand: Strand,
    ref_aligned: Option<Vec<u8>>,
}

impl PendingHeader {
    fn missing(&self) -> &'static str {
        if self.ref_aligned.is_none() {
            "reference"
        } else {
            "query"
        }
    }
}

fn parse_coordinate(line: usize, field: &'static str, value: &str) -> AxtResult<i64> {
    value.parse().map_err(|_| AxtError::InvalidCoordinate {
        line,
        field,
        value: value.to_string(),
    })
}

fn parse_header(line: usize, fields: &[&str]) -> AxtResult<PendingHeader> {
    let strand = fields[7]
        .parse::<Strand>()
        .map_err(|value| AxtError::InvalidStrand { line, value })?;

    Ok(PendingHeader {
        line,
        item_id: fields[0].to_string(),
        ref_chrom: fields[1].to_string(),
        ref_start: parse_coordinate(line, "ref_start", fields[2])?,
        ref_end: parse_coordinate(line, "ref_end", fields[3])?,
        query_chrom: fields[4].to_string(),
        query_start: parse_coordinate(line, "query_start", fields[5])?,
        query_end: parse_coordinate(line, "query_end", fields[6])?,
        strand,
        ref_aligned: None,
    })
}

/// Streaming AXT reader.
///
/// Yields one record as soon as its query line has been read, so only the
/// block in progress is held in memory. Stops after the first error.
pub struct AxtReader<R> {
    reader: R,
    gap: u8,
    line_number: usize,
    buf: String,
    pending: Option<PendingHeader>,
    done: bool,
}

impl<R: BufRead> AxtReader<R> {
    pub fn new(reader: R) -> Self {
        Self::with_gap(reader, GAP)
    }

    /// Creates a reader validating residue counts against a custom gap symbol.
    pub fn with_gap(reader: R, gap: u8) -> Self {
        Self {
            reader,
            gap,
            line_number: 0,
            buf: String::new(),
            pending: None,
            done: false,
        }
    }

    fn read_record(&mut self) -> AxtResult<Option<AlignmentRecord>> {
        loop {
            self.buf.clear();
            let read = self.reader.read_line(&mut self.buf).map_err(|e| {
                if e.kind() == io::ErrorKind::InvalidData {
                    AxtError::InvalidText {
                        line: self.line_number + 1,
                    }
                } else {
                    AxtError::Io(e)
                }
            })?;
            if read == 0 {
                return match self.pending.take() {
                    Some(header) => Err(AxtError::TruncatedRecord {
                        missing: header.missing(),
                        item: header.item_id,
                    }),
                    None => Ok(None),
                };
            }
            self.line_number += 1;
            let line = self.line_number;

            let trimmed = self.buf.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }

            let fields: Vec<&str> = trimmed.split_whitespace().collect();
            match fields.len() {
                1 => {
                    let Some(mut header) = self.pending.take() else {
                        return Err(AxtError::SequenceWithoutHeader { line });
                    };
                    let aligned = fields[0].as_bytes().to_vec();
                    match header.ref_aligned.take() {
                        None => {
                            header.ref_aligned = Some(aligned);
                            self.pending = Some(header);
                        }
                        Some(ref_aligned) => {
                            return self.finish(header, ref_aligned, aligned).map(Some);
                        }
                    }
                }
                n if n >= HEADER_FIELDS => {
                    if let Some(header) = self.pending.take() {
                        return Err(AxtError::UnexpectedHeader {
                            line,
                            missing: header.missing(),
                            item: header.item_id,
                        });
                    }
                    self.pending = Some(parse_header(line, &fields)?);
                }
                found => return Err(AxtError::MalformedHeader { line, found }),
            }
        }
    }

    fn finish(
        &self,
        header: PendingHeader,
        ref_aligned: Vec<u8>,
        query_aligned: Vec<u8>,
    ) -> AxtResult<AlignmentRecord> {
        let PendingHeader {
            line,
            item_id,
            ref_chrom,
            ref_start,
            ref_end,
            query_chrom,
            query_start,
            query_end,
            strand,
            ..
        } = header;

        AlignmentRecord::new(
            item_id.clone(),
            ref_chrom,
            ref_start,
            ref_end,
            query_chrom,
            query_start,
            query_end,
            strand,
            ref_aligned,
            query_aligned,
            self.gap,
        )
        .map_err(|source| AxtError::Invariant {
            line,
            item: item_id,
            source,
        })
    }
}

impl<R: BufRead> Iterator for AxtReader<R> {
    type Item = AxtResult<AlignmentRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.read_record() {
            Ok(Some(record)) => Some(Ok(record)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

/// AXT writer numbering sub-alignments across everything it writes.
pub struct AxtWriter<W> {
    writer: W,
    next_index: u64,
    buf: Vec<u8>,
}

impl<W: Write> AxtWriter<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            next_index: 0,
            buf: Vec::new(),
        }
    }

    /// Returns how many sub-alignments have been written.
    pub fn written(&self) -> u64 {
        self.next_index
    }

    /// Writes the sub-alignments of one record as a single unit.
    ///
    /// The blocks are rendered into a buffer first and handed to the sink
    /// with one `write_all`, so nothing of the batch reaches the sink if
    /// rendering is interrupted.
    pub fn write_batch(&mut self, subs: &[SubAlignment]) -> io::Result<()> {
        self.buf.clear();
        let mut index = self.next_index;
        for sub in subs {
            writeln!(
                self.buf,
                "{} {} {} {} {} {} {} {}",
                index,
                sub.ref_chrom,
                sub.ref_start,
                sub.ref_end,
                sub.query_chrom,
                sub.query_start,
                sub.query_end,
                sub.strand
            )?;
            self.buf.extend_from_slice(&sub.ref_aligned);
            self.buf.push(b'\n');
            self.buf.extend_from_slice(&sub.query_aligned);
            self.buf.extend_from_slice(b"\n\n");
            index += 1;
        }
        self.writer.write_all(&self.buf)?;
        self.next_index = index;
        Ok(())
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }

    /// Returns the underlying sink.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Side;

    fn parse_axt_str(content: &str) -> AxtResult<Vec<AlignmentRecord>> {
        AxtReader::new(content.as_bytes()).collect()
    }

    const SAMPLE: &str = "\
##matrix=axtChain 16 91,-114,-31,-123,-114,100,-125,-31,-31,-125,100,-114,-123,-31,-114,91
# second comment
0 chr1 100 107 chrA 500 511 + 3500
AACC------GGTT
AACCGGTTGGTT--

1 chr2 10 13 chrB 20 23 - 120
ACGT
ACGT
";

    #[test]
    fn test_parse_two_records() {
        let records = parse_axt_str(SAMPLE).unwrap();
        assert_eq!(records.len(), 2);

        let first = &records[0];
        assert_eq!(first.item_id(), "0");
        assert_eq!(first.ref_chrom(), "chr1");
        assert_eq!((first.ref_start(), first.ref_end()), (100, 107));
        assert_eq!(first.query_chrom(), "chrA");
        assert_eq!((first.query_start(), first.query_end()), (500, 511));
        assert_eq!(first.strand(), Strand::Forward);
        assert_eq!(first.ref_aligned(), b"AACC------GGTT");
        assert_eq!(first.query_aligned(), b"AACCGGTTGGTT--");

        assert_eq!(records[1].strand(), Strand::Reverse);
        assert_eq!(records[1].item_id(), "1");
    }

    #[test]
    fn test_empty_input() {
        assert!(parse_axt_str("").unwrap().is_empty());
        assert!(parse_axt_str("# only a comment\n\n").unwrap().is_empty());
    }

    #[test]
    fn test_record_yielded_before_next_header() {
        let mut reader = AxtReader::new(SAMPLE.as_bytes());
        assert!(reader.next().unwrap().is_ok());
        assert_eq!(reader.line_number, 5);
    }

    #[test]
    fn test_short_header() {
        let content = "0 chr1 100 107 chrA 500 511\nACGT\nACGT\n";
        let err = parse_axt_str(content).unwrap_err();
        assert!(matches!(err, AxtError::MalformedHeader { line: 1, found: 7 }));
        assert!(err.is_parse_error());
    }

    #[test]
    fn test_non_integer_coordinate() {
        let content = "0 chr1 100 1O7 chrA 500 511 +\nACGT\nACGT\n";
        let err = parse_axt_str(content).unwrap_err();
        match err {
            AxtError::InvalidCoordinate { line, field, value } => {
                assert_eq!(line, 1);
                assert_eq!(field, "ref_end");
                assert_eq!(value, "1O7");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_invalid_strand() {
        let content = "0 chr1 1 4 chrA 1 4 ?\nACGT\nACGT\n";
        assert!(matches!(
            parse_axt_str(content),
            Err(AxtError::InvalidStrand { line: 1, .. })
        ));
    }

    #[test]
    fn test_header_after_header() {
        let content = "0 chr1 1 4 chrA 1 4 +\n1 chr1 1 4 chrA 1 4 +\nACGT\nACGT\n";
        let err = parse_axt_str(content).unwrap_err();
        assert!(matches!(
            err,
            AxtError::UnexpectedHeader { line: 2, missing: "reference", .. }
        ));
    }

    #[test]
    fn test_header_after_one_sequence() {
        let content = "0 chr1 1 4 chrA 1 4 +\nACGT\n1 chr1 1 4 chrA 1 4 +\nACGT\nACGT\n";
        assert!(matches!(
            parse_axt_str(content),
            Err(AxtError::UnexpectedHeader { line: 3, missing: "query", .. })
        ));
    }

    #[test]
    fn test_truncated_record() {
        let content = "0 chr1 1 4 chrA 1 4 +\nACGT\n";
        let err = parse_axt_str(content).unwrap_err();
        match err {
            AxtError::TruncatedRecord { item, missing } => {
                assert_eq!(item, "0");
                assert_eq!(missing, "query");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_extra_sequence_line() {
        let content = "0 chr1 1 4 chrA 1 4 +\nACGT\nACGT\nACGT\n";
        assert!(matches!(
            parse_axt_str(content),
            Err(AxtError::SequenceWithoutHeader { line: 4 })
        ));
    }

    #[test]
    fn test_invariant_violation_is_reported() {
        let content = "0 chr1 1 5 chrA 1 4 +\nACGT\nACGT\n";
        let err = parse_axt_str(content).unwrap_err();
        assert!(!err.is_parse_error());
        match err {
            AxtError::Invariant { line, item, source } => {
                assert_eq!(line, 1);
                assert_eq!(item, "0");
                assert_eq!(
                    source,
                    InvariantViolation::NonGapCount { side: Side::Reference, expected: 5, found: 4 }
                );
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_coordinates_near_integer_limits() {
        let content = "0 chr1 0 9223372036854775807 chrA 1 4 +\nACGT\nACGT\n";
        let err = parse_axt_str(content).unwrap_err();
        assert!(!err.is_parse_error());
        assert!(matches!(
            err,
            AxtError::Invariant {
                line: 1,
                source: InvariantViolation::SpanOutOfRange { side: Side::Reference, .. },
                ..
            }
        ));

        let content =
            "0 chr1 1 4 chrA -9223372036854775808 9223372036854775807 -\nACGT\nACGT\n";
        assert!(matches!(
            parse_axt_str(content),
            Err(AxtError::Invariant {
                source: InvariantViolation::SpanOutOfRange { side: Side::Query, .. },
                ..
            })
        ));
    }

    #[test]
    fn test_coordinate_beyond_i64() {
        let content = "0 chr1 1 99999999999999999999 chrA 1 4 +\nACGT\nACGT\n";
        let err = parse_axt_str(content).unwrap_err();
        assert!(err.is_parse_error());
        assert!(matches!(err, AxtError::InvalidCoordinate { field: "ref_end", .. }));
    }

    #[test]
    fn test_invalid_utf8_is_a_parse_error() {
        let content: &[u8] = b"# comment\n0 chr1 1 4 chrA 1 4 +\nAC\xffT\nACGT\n";
        let err = AxtReader::new(content)
            .collect::<AxtResult<Vec<_>>>()
            .unwrap_err();
        assert!(err.is_parse_error());
        assert!(matches!(err, AxtError::InvalidText { line: 3 }));
    }

    #[test]
    fn test_reader_stops_after_error() {
        let content = "0 chr1 1 4 chrA 1 4 +\nACGT\nACGT\nACGT\n\
                       1 chr1 1 4 chrA 1 4 +\nACGT\nACGT\n";
        let mut reader = AxtReader::new(content.as_bytes());
        assert!(reader.next().unwrap().is_ok());
        assert!(reader.next().unwrap().is_err());
        assert!(reader.next().is_none());
    }

    #[test]
    fn test_custom_gap_validation() {
        let content = "0 chr1 1 2 chrA 1 4 +\nA..T\nACGT\n";
        assert!(parse_axt_str(content).is_err());
        let records: Vec<_> = AxtReader::with_gap(content.as_bytes(), b'.')
            .collect::<AxtResult<_>>()
            .unwrap();
        assert_eq!(records.len(), 1);
    }

    fn sub(strand: Strand) -> SubAlignment {
        SubAlignment {
            ref_chrom: "chr1".to_string(),
            ref_start: 104,
            ref_end: 107,
            query_chrom: "chrA".to_string(),
            query_start: 510,
            query_end: 511,
            strand,
            ref_aligned: b"GGTT".to_vec(),
            query_aligned: b"GT--".to_vec(),
            columns: 10..14,
        }
    }

    #[test]
    fn test_write_batch_format() {
        let mut writer = AxtWriter::new(Vec::new());
        writer.write_batch(&[sub(Strand::Forward), sub(Strand::Reverse)]).unwrap();
        let out = String::from_utf8(writer.into_inner()).unwrap();
        assert_eq!(
            out,
            "0 chr1 104 107 chrA 510 511 +\nGGTT\nGT--\n\n\
             1 chr1 104 107 chrA 510 511 -\nGGTT\nGT--\n\n"
        );
    }

    #[test]
    fn test_index_continues_across_batches() {
        let mut writer = AxtWriter::new(Vec::new());
        writer.write_batch(&[sub(Strand::Forward)]).unwrap();
        writer.write_batch(&[]).unwrap();
        writer.write_batch(&[sub(Strand::Forward), sub(Strand::Forward)]).unwrap();
        assert_eq!(writer.written(), 3);
        let out = String::from_utf8(writer.into_inner()).unwrap();
        let headers: Vec<&str> = out
            .lines()
            .filter(|l| l.contains("chr1"))
            .map(|l| l.split(' ').next().unwrap())
            .collect();
        assert_eq!(headers, vec!["0", "1", "2"]);
    }

    #[test]
    fn test_empty_sub_alignment_is_written() {
        let mut empty = sub(Strand::Forward);
        empty.ref_aligned.clear();
        empty.query_aligned.clear();
        empty.ref_end = empty.ref_start - 1;
        empty.columns = 14..14;
        let mut writer = AxtWriter::new(Vec::new());
        writer.write_batch(&[empty]).unwrap();
        let out = String::from_utf8(writer.into_inner()).unwrap();
        assert_eq!(out, "0 chr1 104 103 chrA 510 511 +\n\n\n\n");
    }

    struct FailingSink;

    impl Write for FailingSink {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_failed_write_keeps_index() {
        let mut writer = AxtWriter::new(FailingSink);
        assert!(writer.write_batch(&[sub(Strand::Forward)]).is_err());
        assert_eq!(writer.written(), 0);
    }
}

//! # axtsplit - AXT Gap Splitter
//!
//! Splits pairwise genome alignments (AXT) at internal gap runs and
//! recomputes the genome coordinates of every piece.
//!
//! ## Architecture
//!
//! The crate is a streaming pipeline, one alignment block at a time:
//! - `model`: Alignment records, sub-alignments and their invariants
//! - `formats`: AXT reading and writing
//! - `gaps`: Gap run detection on each aligned row
//! - `translate`: Column range to genome coordinate translation
//! - `split`: Cutting a record at its gap runs
//! - `pipeline`: Reader -> splitter -> writer, sequential or batched in parallel

pub mod formats;
pub mod gaps;
pub mod model;
pub mod pipeline;
pub mod split;
pub mod translate;

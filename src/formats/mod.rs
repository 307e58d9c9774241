//! Alignment file formats.
//!
//! Only AXT is supported. Paths given as `-` refer to the standard streams.

pub mod axt;

use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::Path;

pub use axt::{AxtError, AxtReader, AxtResult, AxtWriter};

const BUFFER_SIZE: usize = 1024 * 1024;

/// Returns true if `path` names a standard stream.
pub fn is_stdio<P: AsRef<Path>>(path: P) -> bool {
    path.as_ref().as_os_str() == "-"
}

/// Opens `path` for buffered reading, or stdin for `-`.
pub fn open_input<P: AsRef<Path>>(path: P) -> io::Result<Box<dyn BufRead>> {
    if is_stdio(&path) {
        return Ok(Box::new(BufReader::with_capacity(BUFFER_SIZE, io::stdin())));
    }
    let file = File::open(path)?;
    Ok(Box::new(BufReader::with_capacity(BUFFER_SIZE, file)))
}

/// Creates `path` for buffered writing, or stdout for `-`.
pub fn create_output<P: AsRef<Path>>(path: P) -> io::Result<Box<dyn Write>> {
    if is_stdio(&path) {
        return Ok(Box::new(BufWriter::with_capacity(BUFFER_SIZE, io::stdout().lock())));
    }
    let file = File::create(path)?;
    Ok(Box::new(BufWriter::with_capacity(BUFFER_SIZE, file)))
}

//! # Codec — snapshot persistence for the hash table
//!
//! Serializes a [`HashTable`] to the Hashline text format and parses it back,
//! with a closed set of load error codes for malformed input.
//!
//! ## Snapshot Format
//!
//! ```text
//! hashline v1           fixed header
//! <count>               decimal entry count
//! <key>\t<value>        one line per entry, × count
//! ```
//!
//! Entries are written in traversal order, which is not semantically
//! meaningful and does not round-trip identically; the loaded table compares
//! equal to the saved one regardless. Content after the declared count of
//! data lines is ignored (lenient policy).
//!
//! The codec goes through the table's public `iter`/`insert` surface only —
//! it holds no privileged view of bucket layout, so hash values and capacity
//! are never persisted.
//!
//! ## Example
//!
//! ```rust,no_run
//! use table::HashTable;
//!
//! let mut t = HashTable::new().unwrap();
//! t.insert("name", "Alice");
//! codec::save_to_path(&t, "table.snap").unwrap();
//!
//! let loaded = codec::load_from_path("table.snap").unwrap();
//! assert_eq!(t, loaded);
//! ```
//!
//! ## Load failure model
//!
//! [`load`] is a strict state machine: each stage of the parse has its own
//! [`LoadError`] code, so a failure pinpoints exactly where the input went
//! wrong. On any failure the partially built table is dropped before the
//! error is returned — callers receive a whole table or none. The underlying
//! file handle is released on every exit path.

pub mod format;

use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use table::{HashTable, InsertOutcome};
use thiserror::Error;

pub use format::{is_clean, DELIMITER, HEADER};

/// Errors that can occur while writing a snapshot.
#[derive(Debug, Error)]
pub enum SaveError {
    /// An underlying I/O error.
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    /// A key or value contains the delimiter or a line break, which the
    /// snapshot format cannot represent. Nothing is written to the sink.
    #[error("key or value contains a tab or line break and cannot be written")]
    UnencodableText,
}

/// Errors that can occur while reading a snapshot, one per parse stage.
///
/// The set is closed: every way a load can fail maps to exactly one of these
/// codes, and the `Display` text of each is stable, human-readable wording.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LoadError {
    /// The snapshot file could not be opened.
    #[error("could not open the snapshot file")]
    FileOpen,

    /// The input yielded no content at all.
    #[error("snapshot is empty")]
    Empty,

    /// The first line is not the expected header token.
    #[error("invalid snapshot header")]
    InvalidHeader,

    /// The input ended before the entry count line.
    #[error("entry count line is missing")]
    MissingCount,

    /// The entry count line is not a valid non-negative decimal integer.
    #[error("entry count is not a valid number")]
    MalformedCount,

    /// The table for the declared entry count could not be allocated.
    #[error("failed to allocate a table for the declared entry count")]
    AllocFailed,

    /// The input ended before all declared entries were read.
    #[error("snapshot ended before all entries were read")]
    PrematureEof,

    /// A data line does not parse as a delimited key/value pair, or declares
    /// a key that already appeared (so the entry count cannot match).
    #[error("malformed key-value pair on line {line}")]
    MalformedLine {
        /// 1-based line number of the offending line.
        line: usize,
    },
}

/// Writes `table` as a snapshot to `sink`.
///
/// Every key and value is validated up front, so a table containing
/// unencodable text is refused before a single byte reaches the sink.
///
/// # Errors
///
/// [`SaveError::UnencodableText`] if any key or value contains the delimiter
/// or a line break; [`SaveError::Io`] on any write failure.
pub fn save<W: Write>(table: &HashTable, mut sink: W) -> Result<(), SaveError> {
    if table
        .iter()
        .any(|(key, value)| !is_clean(key) || !is_clean(value))
    {
        return Err(SaveError::UnencodableText);
    }

    writeln!(sink, "{}", HEADER)?;
    writeln!(sink, "{}", table.len())?;
    for (key, value) in table.iter() {
        writeln!(sink, "{}{}{}", key, DELIMITER, value)?;
    }
    sink.flush()?;
    Ok(())
}

/// Writes `table` as a snapshot file at `path`, creating or truncating it.
///
/// The write is buffered and the file is fsynced before returning, so a
/// successful call means the snapshot is durable.
///
/// # Errors
///
/// Same as [`save`], plus I/O errors from creating or syncing the file.
pub fn save_to_path<P: AsRef<Path>>(table: &HashTable, path: P) -> Result<(), SaveError> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    save(table, &mut writer)?;
    let file = writer.into_inner().map_err(|e| SaveError::Io(e.into_error()))?;
    file.sync_all()?;
    Ok(())
}

/// Parses a snapshot from `source` into a freshly allocated table.
///
/// The parse is a strict state machine over the line stream; see the stage
/// list on [`LoadError`]. The new table is sized so that inserting the
/// declared count of entries stays under the default load threshold — the
/// load itself never triggers growth.
///
/// The source is consumed through a read-a-line / end-of-input abstraction: a
/// mid-stream read error (including invalid UTF-8) is indistinguishable from
/// end of input at that stage.
///
/// # Errors
///
/// Any [`LoadError`] except [`LoadError::FileOpen`], which only the path
/// variant [`load_from_path`] can produce.
pub fn load<R: BufRead>(mut source: R) -> Result<HashTable, LoadError> {
    let mut line = String::new();

    if !next_line(&mut source, &mut line) {
        return Err(LoadError::Empty);
    }
    if line != HEADER {
        return Err(LoadError::InvalidHeader);
    }

    if !next_line(&mut source, &mut line) {
        return Err(LoadError::MissingCount);
    }
    let count: usize = line.trim().parse().map_err(|_| LoadError::MalformedCount)?;

    let mut table =
        HashTable::with_capacity(capacity_for(count)).map_err(|_| LoadError::AllocFailed)?;

    for i in 0..count {
        let line_no = format::FIRST_DATA_LINE + i;
        if !next_line(&mut source, &mut line) {
            return Err(LoadError::PrematureEof);
        }
        let (key, value) =
            format::parse_line(&line).ok_or(LoadError::MalformedLine { line: line_no })?;
        if table.insert(key, value) == InsertOutcome::Updated {
            // Duplicate key: the declared count can no longer match the
            // entry set.
            return Err(LoadError::MalformedLine { line: line_no });
        }
    }

    Ok(table)
}

/// Opens the snapshot file at `path` and parses it with [`load`].
///
/// # Errors
///
/// [`LoadError::FileOpen`] if the file cannot be opened, otherwise any error
/// [`load`] can return.
pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<HashTable, LoadError> {
    let file = File::open(path).map_err(|_| LoadError::FileOpen)?;
    load(BufReader::new(file))
}

/// Reads the next line into `buf` (line terminator stripped). Returns `false`
/// at end of input; a read error is folded into end-of-input, per the
/// line-reader abstraction the parser is specified against.
fn next_line<R: BufRead>(source: &mut R, buf: &mut String) -> bool {
    buf.clear();
    match source.read_line(buf) {
        Ok(0) | Err(_) => false,
        Ok(_) => {
            if buf.ends_with('\n') {
                buf.pop();
                if buf.ends_with('\r') {
                    buf.pop();
                }
            }
            true
        }
    }
}

/// Smallest capacity that keeps `count` entries at or under the default load
/// threshold, so loading never grows the table mid-parse.
fn capacity_for(count: usize) -> usize {
    let needed = count.saturating_mul(4) / 3 + 1;
    needed.max(table::DEFAULT_CAPACITY)
}

//! Snapshot text format constants and line-level helpers.
//!
//! A snapshot is a UTF-8, line-oriented text stream:
//!
//! ```text
//! hashline v1
//! <count: decimal>
//! <key>\t<value>        repeated `count` times
//! ```
//!
//! The delimiter is a single TAB, so TAB, LF, and CR are forbidden inside
//! keys and values. `save` refuses such text up front and `load` reports the
//! offending line; nothing is escaped.

/// Fixed first line of every snapshot. Any other first line is an invalid
/// header.
pub const HEADER: &str = "hashline v1";

/// Separator between the key and the value on a data line.
pub const DELIMITER: char = '\t';

/// 1-based line number of the first data line (header and count come first).
pub(crate) const FIRST_DATA_LINE: usize = 3;

/// Returns `true` if `text` can appear verbatim on a snapshot line, i.e. it
/// contains no delimiter and no line break.
#[must_use]
pub fn is_clean(text: &str) -> bool {
    !text
        .chars()
        .any(|c| c == DELIMITER || c == '\n' || c == '\r')
}

/// Splits a data line into `(key, value)`. Returns `None` if the delimiter is
/// missing or appears more than once (the value must be delimiter-free).
pub(crate) fn parse_line(line: &str) -> Option<(&str, &str)> {
    let (key, value) = line.split_once(DELIMITER)?;
    if value.contains(DELIMITER) {
        return None;
    }
    Some((key, value))
}

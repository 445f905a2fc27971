//! Field framing for the line protocol
//!
//! A record is a list of fields joined by [`DELIMITER`]. Field contents may
//! hold any text: the delimiter, the escape character and line breaks are
//! backslash-escaped so a record always fits on one line.

use crate::ProtocolError;

/// Separates the fields of one record
pub const DELIMITER: char = '|';

const ESCAPE: char = '\\';

/// Escapes a single field so it can be embedded in a record
pub fn escape_field(field: &str) -> String {
    let mut escaped = String::with_capacity(field.len());
    for c in field.chars() {
        match c {
            ESCAPE => escaped.push_str("\\\\"),
            DELIMITER => escaped.push_str("\\|"),
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            other => escaped.push(other),
        }
    }
    escaped
}

/// Escapes every field and joins them into one record (without line terminator)
pub fn join_fields<I, S>(fields: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut line = String::new();
    for (i, field) in fields.into_iter().enumerate() {
        if i > 0 {
            line.push(DELIMITER);
        }
        line.push_str(&escape_field(field.as_ref()));
    }
    line
}

/// Splits a record into its unescaped fields
///
/// A trailing `\r` left over from CRLF line endings is ignored. Unknown escape
/// sequences and a dangling backslash are rejected rather than guessed at.
pub fn split_fields(line: &str) -> Result<Vec<String>, ProtocolError> {
    let line = line.strip_suffix('\r').unwrap_or(line);
    if line.is_empty() {
        return Err(ProtocolError::Empty);
    }

    let mut fields = Vec::new();
    let mut current = String::new();
    let mut chars = line.chars();

    while let Some(c) = chars.next() {
        match c {
            ESCAPE => match chars.next() {
                Some(ESCAPE) => current.push(ESCAPE),
                Some(DELIMITER) => current.push(DELIMITER),
                Some('n') => current.push('\n'),
                Some('r') => current.push('\r'),
                Some(other) => return Err(ProtocolError::InvalidEscape(other)),
                None => return Err(ProtocolError::DanglingEscape),
            },
            DELIMITER => fields.push(std::mem::take(&mut current)),
            other => current.push(other),
        }
    }
    fields.push(current);

    Ok(fields)
}

//! Tab-separated line codec for the local cache files.
//!
//! Each record is a single line:
//!
//! ```text
//! shift:  <start>\t<end>\t<title>
//! person: <query>\t<email|None>\t<phone|None>
//! ```
//!
//! Timestamps are RFC 3339. Decoding also accepts a space instead of the `T`
//! separator, which is what older cache files contain
//! (`2024-01-01 00:00:00+00:00`).
//!
//! Absent person fields are written as the literal text `None`, so a real
//! email or phone value spelled `None` cannot be stored. Tabs and newlines
//! inside text fields are not escaped; records containing them do not survive
//! a round trip.

use chrono::{DateTime, SecondsFormat, Utc};
use thiserror::Error;

use crate::person::Person;
use crate::shift::Shift;

/// Text written in place of an absent optional field.
pub const NONE_SENTINEL: &str = "None";

const FIELD_SEPARATOR: char = '\t';
const FIELDS_PER_RECORD: usize = 3;

/// Errors raised while decoding a cache line.
#[derive(Debug, Clone, Error)]
pub enum CodecError {
    /// The line does not have the expected number of fields.
    #[error("{kind} record has {found} tab-separated fields, expected {expected}")]
    FieldCount {
        kind: &'static str,
        expected: usize,
        found: usize,
    },

    /// A timestamp field is not valid RFC 3339.
    #[error("invalid {field} timestamp {value:?}: {source}")]
    Timestamp {
        field: &'static str,
        value: String,
        #[source]
        source: chrono::ParseError,
    },
}

/// Encodes a shift as `<start>\t<end>\t<title>`.
pub fn encode_shift(shift: &Shift) -> String {
    format!(
        "{}\t{}\t{}",
        format_timestamp(&shift.start),
        format_timestamp(&shift.end),
        shift.title
    )
}

/// Decodes a shift record. A trailing line terminator is ignored; the title
/// is kept byte for byte, so it matches the people file key written with it.
pub fn decode_shift(line: &str) -> Result<Shift, CodecError> {
    let [start, end, title] = split_record("shift", line)?;
    Ok(Shift::new(
        title,
        parse_timestamp("start", start)?,
        parse_timestamp("end", end)?,
    ))
}

/// Encodes a person as `<query>\t<email|None>\t<phone|None>`.
pub fn encode_person(person: &Person) -> String {
    format!(
        "{}\t{}\t{}",
        person.query,
        person.email.as_deref().unwrap_or(NONE_SENTINEL),
        person.phone.as_deref().unwrap_or(NONE_SENTINEL)
    )
}

/// Decodes a person record. The `None` sentinel becomes an absent value.
pub fn decode_person(line: &str) -> Result<Person, CodecError> {
    let [query, email, phone] = split_record("person", line)?;
    Ok(Person::new(query, optional_field(email), optional_field(phone)))
}

fn split_record<'a>(kind: &'static str, line: &'a str) -> Result<[&'a str; 3], CodecError> {
    let line = line.trim_end_matches(['\r', '\n']);
    let fields: Vec<&str> = line.split(FIELD_SEPARATOR).collect();
    match fields.as_slice() {
        [a, b, c] => Ok([*a, *b, *c]),
        _ => Err(CodecError::FieldCount {
            kind,
            expected: FIELDS_PER_RECORD,
            found: fields.len(),
        }),
    }
}

fn optional_field(value: &str) -> Option<String> {
    (value != NONE_SENTINEL).then(|| value.to_string())
}

fn format_timestamp(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::AutoSi, false)
}

fn parse_timestamp(field: &'static str, value: &str) -> Result<DateTime<Utc>, CodecError> {
    DateTime::parse_from_rfc3339(value)
        .or_else(|err| match value.split_once(' ') {
            Some((date, time)) => DateTime::parse_from_rfc3339(&format!("{date}T{time}")),
            None => Err(err),
        })
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|source| CodecError::Timestamp {
            field,
            value: value.to_string(),
            source,
        })
}

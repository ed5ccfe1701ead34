//! Parser for ADIF (Amateur Data Interchange Format) contact logs.
//!
//! This module uses the `nom` parsing library to recognize ADIF tags. Parsing
//! never fails as a whole: records that are missing one of the required fields
//! are dropped and parsing continues with the next record.
//!
//! # Record Format
//!
//! A log is a sequence of tags terminated by an end-of-record marker:
//! ```text
//! <NAME:LENGTH>VALUE <NAME>VALUE ... <EOR>
//! ```
//!
//! Example:
//! ```text
//! <call:4>W1AW<band:3>20m<mode:3>SSB<qso_date:8>20230101<time_on:4>1200<station_callsign:5>K1ABC<EOR>
//! ```
//!
//! Tag names and the `<EOR>` marker are case-insensitive. The optional length
//! is not used to bound the value: a value always runs up to the next `<`, so
//! values containing a literal `<` cannot be represented.

use std::collections::HashMap;

use nom::{
    IResult, Parser,
    bytes::complete::{take_till1, take_while1},
    character::complete::{char, digit1},
    combinator::{map, opt},
    sequence::preceded,
};
use thiserror::Error;
use tracing::trace;

use crate::contact::ContactRecord;

/// End-of-record marker, matched case-insensitively.
const EOR: &str = "<eor>";

/// Tags a block must contain to produce a [`ContactRecord`].
pub const REQUIRED_FIELDS: [&str; 6] = [
    "station_callsign",
    "call",
    "band",
    "mode",
    "qso_date",
    "time_on",
];

/// Errors that can occur while building a record from extracted fields.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("Missing required field: {0}")]
    MissingField(&'static str),
}

/// Result type for parsing operations.
pub type ParseResult<T> = Result<T, ParseError>;

/// Check if a character is valid in a tag name.
fn is_tag_name_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Parse a tag name.
fn parse_tag_name(input: &str) -> IResult<&str, &str> {
    take_while1(is_tag_name_char).parse(input)
}

/// Parse the optional `:LENGTH` suffix of a tag. The length is discarded.
fn parse_length(input: &str) -> IResult<&str, Option<&str>> {
    opt(preceded(char(':'), digit1)).parse(input)
}

/// Parse the value run following a tag, up to the next `<` or end of input.
fn parse_value(input: &str) -> IResult<&str, &str> {
    take_till1(|c: char| c == '<').parse(input)
}

/// Parse a single `<NAME>VALUE` or `<NAME:LENGTH>VALUE` field.
fn parse_field(input: &str) -> IResult<&str, (&str, &str)> {
    map(
        (char('<'), parse_tag_name, parse_length, char('>'), parse_value),
        |(_, name, _, _, value)| (name, value),
    )
    .parse(input)
}

/// Byte offset of the next end-of-record marker in `input`.
fn find_eor(input: &str) -> Option<usize> {
    input
        .as_bytes()
        .windows(EOR.len())
        .position(|w| w.eq_ignore_ascii_case(EOR.as_bytes()))
}

/// Iterator over the raw record blocks of a log. See [`split_records`].
#[derive(Debug, Clone)]
pub struct RecordBlocks<'a> {
    rest: Option<&'a str>,
}

impl<'a> Iterator for RecordBlocks<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        let rest = self.rest?;
        match find_eor(rest) {
            Some(pos) => {
                self.rest = Some(&rest[pos + EOR.len()..]);
                Some(&rest[..pos])
            }
            None => {
                self.rest = None;
                Some(rest)
            }
        }
    }
}

/// Split a log into the blocks between `<EOR>` markers, in source order.
///
/// Text after the last marker is yielded as a final block, so an input
/// without any marker is a single block.
pub fn split_records(text: &str) -> RecordBlocks<'_> {
    RecordBlocks { rest: Some(text) }
}

/// Extract all tags from one block into a map keyed by lowercase tag name.
///
/// Later occurrences of a tag overwrite earlier ones. Values are trimmed.
/// Text that is not a well-formed tag is skipped.
pub fn extract_fields(block: &str) -> HashMap<String, String> {
    let mut fields = HashMap::new();
    let mut rest = block;

    while let Some(start) = rest.find('<') {
        match parse_field(&rest[start..]) {
            Ok((remaining, (name, value))) => {
                fields.insert(name.to_lowercase(), value.trim().to_string());
                rest = remaining;
            }
            Err(_) => rest = &rest[start + 1..],
        }
    }

    fields
}

impl TryFrom<HashMap<String, String>> for ContactRecord {
    type Error = ParseError;

    fn try_from(mut fields: HashMap<String, String>) -> ParseResult<Self> {
        let mut take = |name: &'static str| {
            fields
                .remove(name)
                .ok_or(ParseError::MissingField(name))
        };

        Ok(ContactRecord {
            station_callsign: take("station_callsign")?,
            contact_callsign: take("call")?,
            band: take("band")?,
            mode: take("mode")?,
            qso_date: take("qso_date")?,
            time_on: take("time_on")?,
        })
    }
}

/// Parse an ADIF log into contact records.
///
/// The returned iterator is lazy and yields records in source order. Blocks
/// that lack any of [`REQUIRED_FIELDS`] produce nothing.
///
/// # Example
///
/// ```
/// use adif_logbook::parser::parse;
///
/// let log = "<call:4>W1AW<band:3>20m<mode:3>SSB<qso_date:8>20230101\
///            <time_on:4>1200<station_callsign:5>K1ABC<EOR>";
/// let records: Vec<_> = parse(log).collect();
/// assert_eq!(records.len(), 1);
/// assert_eq!(records[0].contact_callsign, "W1AW");
/// ```
pub fn parse(text: &str) -> impl Iterator<Item = ContactRecord> + '_ {
    split_records(text)
        .filter(|block| !block.trim().is_empty())
        .filter_map(|block| match ContactRecord::try_from(extract_fields(block)) {
            Ok(record) => Some(record),
            Err(e) => {
                trace!("Skipping ADIF block: {}", e);
                None
            }
        })
}

/// Check if text looks like an ADIF log (quick pre-filter).
///
/// True when the text contains at least one end-of-record marker.
#[inline]
pub fn looks_like_adif(text: &str) -> bool {
    find_eor(text).is_some()
}

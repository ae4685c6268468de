//! Line protocol parsing.
//!
//! A payload carries one metric per line, in the form:
//!
//! ```text
//! <bucket>:<value>|<type>[|<modifier>...]
//! ```
use crate::{data::MetricKind, key::sanitize};
use std::iter::FusedIterator;
use thiserror::Error;

/// Errors for a single line of a payload.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum LineError {
    /// The line does not have the `bucket:value|type` structure.
    #[error("malformed metric {0:?}")]
    Malformed(String),

    /// The type code is not one we aggregate.
    #[error("unknown metric type {0:?}")]
    UnknownType(String),
}

/// A structurally valid line, borrowed from the payload it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct Line<'a> {
    /// Sanitized metric key.
    pub key: String,
    pub value: &'a str,
    pub kind: MetricKind,
    pub args: Vec<&'a str>,
}

/// Parses a single line.
pub fn parse_line(line: &str) -> Result<Line<'_>, LineError> {
    let malformed = || LineError::Malformed(line.to_owned());

    let (bucket, rest) = line.split_once(':').ok_or_else(malformed)?;
    let (value, rest) = rest.split_once('|').ok_or_else(malformed)?;
    if bucket.is_empty() || rest.is_empty() {
        return Err(malformed());
    }

    let mut components = rest.split('|');
    let code = components.next().unwrap_or_default();
    let kind = MetricKind::from_type_code(code).ok_or_else(|| LineError::UnknownType(code.to_owned()))?;

    Ok(Line {
        key: sanitize(bucket),
        value,
        kind,
        args: components.collect(),
    })
}

/// Parses every line in `payload`.
///
/// Empty lines are skipped, and both `\n` and `\r\n` line endings are accepted.  An error on one
/// line does not stop the iterator; the next call moves on to the following line.
pub fn parse_all(payload: &str) -> ParseLines<'_> { ParseLines { remaining: payload } }

/// Iterator returned by [`parse_all`].
#[derive(Clone, Debug, Default)]
pub struct ParseLines<'a> {
    remaining: &'a str,
}

impl<'a> Iterator for ParseLines<'a> {
    type Item = Result<Line<'a>, LineError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.remaining.is_empty() {
                return None;
            }

            let (current, rest) = self.remaining.split_once('\n').unwrap_or((self.remaining, ""));
            self.remaining = rest;

            let current = current.strip_suffix('\r').unwrap_or(current);
            if !current.is_empty() {
                return Some(parse_line(current));
            }
        }
    }
}

impl FusedIterator for ParseLines<'_> {}

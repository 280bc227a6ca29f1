//! Line parsers
//!
//! A parser turns one raw line into document bytes for the write path.
//! Parse failures are never fatal: the ingest service logs and skips them.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use auditkv_core::ParserKind;

/// Why a line could not be turned into a document
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// Line is not valid JSON
    #[error("invalid JSON: {0}")]
    InvalidJson(String),

    /// Line does not start with the expected log line prefix
    #[error("invalid log line prefix: {0}")]
    InvalidPrefix(&'static str),

    /// Prefix timestamp could not be parsed
    #[error("could not parse timestamp: {0}")]
    Timestamp(String),

    /// No `AUDIT: ` marker after the prefix
    #[error("not a pgaudit line")]
    NotAudit,

    /// Audit record is not valid CSV
    #[error("invalid csv record")]
    Csv,

    /// Audit record has too few fields
    #[error("invalid csv fields length: {0}")]
    FieldCount(usize),

    /// A numeric audit field is not an integer
    #[error("could not parse {field}: '{value}'")]
    Number {
        /// Audit field name
        field: &'static str,
        /// Raw value
        value: String,
    },

    /// Parsed entry could not be serialized
    #[error("could not serialize entry: {0}")]
    Serialize(String),
}

/// Result type for line parsing
pub type ParseResult<T> = std::result::Result<T, ParseError>;

/// Supported line formats, resolved once per collection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineParser {
    /// Line is a JSON document, stored unchanged
    Json,
    /// PostgreSQL pgaudit log line with `log_line_prefix = '%m [%p] '`
    PgAudit,
    /// Any line, wrapped into `{uid, timestamp, message}`
    Wrap,
}

impl From<ParserKind> for LineParser {
    fn from(kind: ParserKind) -> Self {
        match kind {
            ParserKind::Json => LineParser::Json,
            ParserKind::PgAudit => LineParser::PgAudit,
            ParserKind::Wrap => LineParser::Wrap,
        }
    }
}

impl LineParser {
    /// Parse one line using the current time as ingest timestamp
    pub fn parse(&self, line: &str) -> ParseResult<Vec<u8>> {
        self.parse_at(line, Utc::now())
    }

    /// Parse one line with an explicit ingest timestamp
    pub fn parse_at(&self, line: &str, now: DateTime<Utc>) -> ParseResult<Vec<u8>> {
        match self {
            LineParser::Json => parse_json(line),
            LineParser::PgAudit => parse_pgaudit(line, now),
            LineParser::Wrap => parse_wrap(line, now),
        }
    }
}

fn parse_json(line: &str) -> ParseResult<Vec<u8>> {
    serde_json::from_str::<serde::de::IgnoredAny>(line)
        .map_err(|e| ParseError::InvalidJson(e.to_string()))?;
    Ok(line.as_bytes().to_vec())
}

#[derive(Debug, Serialize)]
struct WrapEntry<'a> {
    uid: String,
    timestamp: DateTime<Utc>,
    message: &'a str,
}

fn parse_wrap(line: &str, now: DateTime<Utc>) -> ParseResult<Vec<u8>> {
    let entry = WrapEntry {
        uid: Uuid::new_v4().to_string(),
        timestamp: now,
        message: line,
    };
    serde_json::to_vec(&entry).map_err(|e| ParseError::Serialize(e.to_string()))
}

fn is_zero(n: &i64) -> bool {
    *n == 0
}

#[derive(Debug, Serialize)]
struct PgAuditEntry {
    timestamp: DateTime<Utc>,
    log_timestamp: DateTime<Utc>,
    audit_type: String,
    statement_id: i64,
    #[serde(skip_serializing_if = "is_zero")]
    substatement_id: i64,
    #[serde(skip_serializing_if = "String::is_empty")]
    class: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    command: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    object_type: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    object_name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    statement: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    parameter: String,
}

/// `YYYY-MM-DD HH:MM:SS.mmm`
const PREFIX_TIMESTAMP_LEN: usize = 23;
const PREFIX_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";
const AUDIT_MARKER: &str = "AUDIT: ";
const AUDIT_MIN_FIELDS: usize = 9;

/// Split the `%m ` prefix into its timestamp and the rest of the line.
///
/// The zone abbreviation is required but not interpreted; log timestamps
/// are taken as UTC.
fn split_prefix(line: &str) -> ParseResult<(DateTime<Utc>, &str)> {
    let stamp = line
        .get(..PREFIX_TIMESTAMP_LEN)
        .ok_or(ParseError::InvalidPrefix("too short"))?;
    let rest = line[PREFIX_TIMESTAMP_LEN..]
        .strip_prefix(' ')
        .ok_or(ParseError::InvalidPrefix("missing time zone"))?;
    let (zone, rest) = rest
        .split_once(' ')
        .ok_or(ParseError::InvalidPrefix("missing time zone"))?;
    if zone.is_empty() {
        return Err(ParseError::InvalidPrefix("missing time zone"));
    }

    let naive = NaiveDateTime::parse_from_str(stamp, PREFIX_TIMESTAMP_FORMAT)
        .map_err(|e| ParseError::Timestamp(format!("{} ({})", stamp, e)))?;
    Ok((DateTime::from_naive_utc_and_offset(naive, Utc), rest))
}

fn parse_pgaudit(line: &str, now: DateTime<Utc>) -> ParseResult<Vec<u8>> {
    let (log_timestamp, rest) = split_prefix(line)?;
    let start = rest.find(AUDIT_MARKER).ok_or(ParseError::NotAudit)?;
    let record = &rest[start + AUDIT_MARKER.len()..];

    let fields = split_csv(record).ok_or(ParseError::Csv)?;
    if fields.len() < AUDIT_MIN_FIELDS {
        return Err(ParseError::FieldCount(fields.len()));
    }
    let mut fields = fields.into_iter();
    let mut next = || fields.next().unwrap_or_default();

    let audit_type = next();
    let statement_id = parse_int("statement_id", next())?;
    let substatement_id = parse_int("substatement_id", next())?;

    let entry = PgAuditEntry {
        timestamp: now,
        log_timestamp,
        audit_type,
        statement_id,
        substatement_id,
        class: next(),
        command: next(),
        object_type: next(),
        object_name: next(),
        statement: next(),
        parameter: next(),
    };
    serde_json::to_vec(&entry).map_err(|e| ParseError::Serialize(e.to_string()))
}

fn parse_int(field: &'static str, value: String) -> ParseResult<i64> {
    value
        .trim()
        .parse()
        .map_err(|_| ParseError::Number { field, value })
}

/// Split one CSV record with `,` separators and `"` quoting.
///
/// Doubled quotes inside a quoted field stand for one quote. Returns `None`
/// on an unterminated quoted field or junk after a closing quote.
pub fn split_csv(record: &str) -> Option<Vec<String>> {
    const DELIMITER: char = ',';
    const QUOTE: char = '"';

    let mut fields = Vec::new();
    let mut chars = record.chars().peekable();

    loop {
        if chars.peek() == Some(&QUOTE) {
            chars.next();
            let mut field = String::new();
            let mut closed = false;
            while let Some(c) = chars.next() {
                if c == QUOTE {
                    if chars.peek() == Some(&QUOTE) {
                        chars.next();
                        field.push(QUOTE);
                    } else {
                        closed = true;
                        break;
                    }
                } else {
                    field.push(c);
                }
            }
            if !closed {
                return None;
            }
            fields.push(field);
            match chars.next() {
                Some(DELIMITER) => {}
                None => break,
                Some(_) => return None,
            }
        } else {
            let mut field = String::new();
            loop {
                match chars.next() {
                    Some(DELIMITER) => break,
                    Some(c) => field.push(c),
                    None => {
                        fields.push(field);
                        return Some(fields);
                    }
                }
            }
            fields.push(field);
        }
    }

    Some(fields)
}

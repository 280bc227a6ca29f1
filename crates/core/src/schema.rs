//! Collection schema model
//!
//! A collection's schema is an ordered list of indexed field paths. The
//! first entry is the primary key specification, possibly composite
//! (`field1+field2` means "concatenate these field values"); the remaining
//! entries are secondary key fields.
//!
//! Key namespaces are separated by literal string prefixes, so names that
//! contain the reserved delimiters (`.`, `{`, `}`) are rejected here, before
//! they can make the encoding ambiguous.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, NameKind, Result};

/// Joins the parts of a composite primary key specification
pub const COMPOSITION_OPERATOR: char = '+';

/// Characters that delimit key segments
pub const RESERVED_DELIMITERS: [char; 3] = ['.', '{', '}'];

/// Key segment that marks payload entries
pub const PAYLOAD_SEGMENT: &str = "payload";

/// Prefix of collection names reserved for control keys
pub const RESERVED_COLLECTION_PREFIX: char = '_';

fn check_delimiters(kind: NameKind, name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::InvalidName {
            kind,
            name: name.to_string(),
            reason: "name is empty",
        });
    }
    if name.contains(&RESERVED_DELIMITERS[..]) {
        return Err(Error::InvalidName {
            kind,
            name: name.to_string(),
            reason: "contains a reserved delimiter ('.', '{' or '}')",
        });
    }
    Ok(())
}

/// Validate a collection name.
pub fn validate_collection_name(name: &str) -> Result<()> {
    check_delimiters(NameKind::Collection, name)?;
    if name.starts_with(RESERVED_COLLECTION_PREFIX) {
        return Err(Error::InvalidName {
            kind: NameKind::Collection,
            name: name.to_string(),
            reason: "names starting with '_' are reserved",
        });
    }
    Ok(())
}

/// Validate a single (non-composite) field name.
pub fn validate_field_name(name: &str) -> Result<()> {
    check_delimiters(NameKind::Field, name)?;
    if name.contains(COMPOSITION_OPERATOR) {
        return Err(Error::InvalidName {
            kind: NameKind::Field,
            name: name.to_string(),
            reason: "contains the composition operator '+'",
        });
    }
    if name == PAYLOAD_SEGMENT {
        return Err(Error::InvalidName {
            kind: NameKind::Field,
            name: name.to_string(),
            reason: "'payload' is reserved",
        });
    }
    Ok(())
}

/// Primary key specification: one or more field paths joined by `+`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrimaryKeySpec {
    spec: String,
    fields: Vec<String>,
}

impl PrimaryKeySpec {
    /// Parse `field` or `field1+field2+...`.
    pub fn parse(spec: &str) -> Result<Self> {
        let fields: Vec<String> = spec
            .split(COMPOSITION_OPERATOR)
            .map(str::to_string)
            .collect();
        for field in &fields {
            if field.is_empty() {
                return Err(Error::InvalidSchema(format!(
                    "primary key specification '{}' has an empty part",
                    spec
                )));
            }
            validate_field_name(field)?;
        }
        Ok(Self {
            spec: spec.to_string(),
            fields,
        })
    }

    /// The specification as written; this is the field name used in keys.
    pub fn name(&self) -> &str {
        &self.spec
    }

    /// Component field paths, in concatenation order
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// True if more than one field makes up the key
    pub fn is_composite(&self) -> bool {
        self.fields.len() > 1
    }
}

impl fmt::Display for PrimaryKeySpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.spec)
    }
}

/// Ordered indexed-field list of a collection.
///
/// Always has a primary key; construction fails on an empty list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    primary: PrimaryKeySpec,
    secondary: Vec<String>,
}

impl Schema {
    /// Build a schema from the persisted field list.
    ///
    /// The first entry is the primary key specification.
    pub fn new<I, S>(fields: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut iter = fields.into_iter();
        let primary = match iter.next() {
            Some(spec) => PrimaryKeySpec::parse(spec.as_ref())?,
            None => {
                return Err(Error::InvalidSchema(
                    "at least a primary key needs to be specified".to_string(),
                ))
            }
        };

        let mut secondary: Vec<String> = Vec::new();
        for field in iter {
            let field = field.as_ref();
            validate_field_name(field)?;
            if field == primary.name() || secondary.iter().any(|f| f == field) {
                return Err(Error::InvalidSchema(format!(
                    "field '{}' is indexed more than once",
                    field
                )));
            }
            secondary.push(field.to_string());
        }

        Ok(Self { primary, secondary })
    }

    /// Primary key specification
    pub fn primary(&self) -> &PrimaryKeySpec {
        &self.primary
    }

    /// Secondary key fields, in schema order
    pub fn secondary(&self) -> &[String] {
        &self.secondary
    }

    /// The persisted form: primary specification first, then secondaries.
    pub fn fields(&self) -> Vec<String> {
        std::iter::once(self.primary.name().to_string())
            .chain(self.secondary.iter().cloned())
            .collect()
    }

    /// True if `field` is the primary specification or a secondary field
    pub fn is_indexed(&self, field: &str) -> bool {
        field == self.primary.name() || self.secondary.iter().any(|f| f == field)
    }
}

/// Storage layout a collection uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepositoryKind {
    /// Index entries and payloads as plain versioned keys
    #[default]
    Kv,
}

impl fmt::Display for RepositoryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RepositoryKind::Kv => f.write_str("kv"),
        }
    }
}

/// Line format a collection ingests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParserKind {
    /// One JSON document per line
    #[default]
    Json,
    /// PostgreSQL pgaudit log lines
    PgAudit,
    /// Any line, wrapped into `{uid, timestamp, message}`
    Wrap,
}

impl ParserKind {
    /// Indexes used when a collection is created without explicit ones
    pub fn default_indexes(self) -> &'static [&'static str] {
        match self {
            ParserKind::Json => &[],
            ParserKind::PgAudit => &[
                "statement_id",
                "log_timestamp",
                "timestamp",
                "audit_type",
                "class",
                "command",
            ],
            ParserKind::Wrap => &["uid", "timestamp"],
        }
    }

    /// Name as used in configuration and on the command line
    pub fn as_str(self) -> &'static str {
        match self {
            ParserKind::Json => "json",
            ParserKind::PgAudit => "pgaudit",
            ParserKind::Wrap => "wrap",
        }
    }
}

impl fmt::Display for ParserKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ParserKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "" | "json" => Ok(ParserKind::Json),
            "pgaudit" => Ok(ParserKind::PgAudit),
            "wrap" => Ok(ParserKind::Wrap),
            other => Err(Error::Config(format!(
                "unknown parser '{}', expected json, pgaudit or wrap",
                other
            ))),
        }
    }
}

/// Per-collection settings persisted next to the schema
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CollectionSettings {
    /// Repository layout
    #[serde(default)]
    pub kind: RepositoryKind,
    /// Line parser used by ingestion
    #[serde(default)]
    pub parser: ParserKind,
}

impl CollectionSettings {
    /// Settings for a collection fed by `parser`
    pub fn with_parser(parser: ParserKind) -> Self {
        Self {
            kind: RepositoryKind::Kv,
            parser,
        }
    }
}

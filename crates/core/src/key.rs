//! Key encoding protocol (version 1)
//!
//! Every document maps deterministically to one primary index key, one
//! secondary index key per secondary field, and one payload key:
//!
//! ```text
//! primary index    <collection>.<primaryspec>.{<pk>}                 -> payload key
//! secondary index  <collection>.<field>.{<value>}.{<pk>}             -> payload key
//! payload          <collection>.payload.<primaryspec>.{<pk>}         -> document bytes
//! control          _collection.{<collection>}.<item>                 -> metadata blob
//! ```
//!
//! Field values are rendered as text: strings unquoted, numbers and
//! booleans as their JSON text, `null` as the empty string, arrays and
//! objects as compact JSON. Composite primary keys concatenate their part
//! values with no separator, so `"ab"+"c"` and `"a"+"bc"` both encode as
//! `abc`. Existing key strings depend on this, so it is kept as is.
//!
//! The payload key does not change between revisions of a document; a
//! rewrite adds a revision to the same key, which is what makes history a
//! single-key lookup.

use serde_json::{Map, Value as JsonValue};

use crate::error::{Error, Result};
use crate::schema::{validate_collection_name, Schema, PAYLOAD_SEGMENT};
use crate::types::KeyValue;

/// Namespace of collection control keys
pub const CONTROL_NAMESPACE: &str = "_collection";

/// Control item holding the indexed-field list
pub const CONTROL_INDEXES: &str = "indexes";

/// Control item holding the collection settings
pub const CONTROL_SETTINGS: &str = "settings";

/// `<collection>.<primaryspec>.{<pk>}`
pub fn primary_index_key(collection: &str, primary: &str, pk: &str) -> String {
    format!("{}.{}.{{{}}}", collection, primary, pk)
}

/// `<collection>.<field>.{<value>}.{<pk>}`
pub fn secondary_index_key(collection: &str, field: &str, value: &str, pk: &str) -> String {
    format!("{}.{}.{{{}}}.{{{}}}", collection, field, value, pk)
}

/// `<collection>.payload.<primaryspec>.{<pk>}`
pub fn payload_key(collection: &str, primary: &str, pk: &str) -> String {
    format!("{}.{}.{}.{{{}}}", collection, PAYLOAD_SEGMENT, primary, pk)
}

/// `<collection>.<field>.{<condition>`
///
/// The condition is matched as a string prefix of the field value.
pub fn scan_prefix(collection: &str, field: &str, condition: &str) -> String {
    format!("{}.{}.{{{}", collection, field, condition)
}

/// `_collection.{<collection>}.<item>`
pub fn control_key(collection: &str, item: &str) -> String {
    format!("{}.{{{}}}.{}", CONTROL_NAMESPACE, collection, item)
}

/// Prefix shared by every control key
pub fn control_prefix() -> String {
    format!("{}.{{", CONTROL_NAMESPACE)
}

/// Collection name embedded in a control key, if `key` is one for `item`
pub fn collection_from_control_key<'a>(key: &'a str, item: &str) -> Option<&'a str> {
    let rest = key.strip_prefix(CONTROL_NAMESPACE)?.strip_prefix(".{")?;
    let (name, tail) = rest.split_once('}')?;
    (tail.strip_prefix('.')? == item).then_some(name)
}

/// Render a field value as it appears inside key braces.
pub fn field_string(value: &JsonValue) -> String {
    match value {
        JsonValue::Null => String::new(),
        JsonValue::String(s) => s.clone(),
        JsonValue::Bool(b) => b.to_string(),
        JsonValue::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

/// Keys derived from one document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedKeys {
    /// Resolved primary key value
    pub primary_value: String,
    /// Primary index key
    pub primary_index: String,
    /// Secondary index keys, in schema order
    pub secondary_index: Vec<String>,
    /// Payload key
    pub payload_key: String,
}

impl EncodedKeys {
    /// Build the multi-key write: primary index, secondary indexes, then
    /// the payload entry carrying `document`.
    pub fn into_entries(self, document: Vec<u8>) -> Vec<KeyValue> {
        let mut entries = Vec::with_capacity(self.secondary_index.len() + 2);
        entries.push(KeyValue::new(self.primary_index, self.payload_key.clone()));
        for key in self.secondary_index {
            entries.push(KeyValue::new(key, self.payload_key.clone()));
        }
        entries.push(KeyValue::new(self.payload_key, document));
        entries
    }
}

/// Derives index and payload keys for one collection.
#[derive(Debug, Clone, Copy)]
pub struct KeyEncoder<'a> {
    collection: &'a str,
    schema: &'a Schema,
}

impl<'a> KeyEncoder<'a> {
    /// Encoder for `collection` under `schema`
    pub fn new(collection: &'a str, schema: &'a Schema) -> Result<Self> {
        validate_collection_name(collection)?;
        Ok(Self { collection, schema })
    }

    /// Encode raw document bytes.
    ///
    /// # Errors
    ///
    /// `InvalidDocument` if the bytes are not a JSON object,
    /// `MissingPrimaryKeyField` / `MissingSecondaryKeyField` naming the
    /// first absent field.
    pub fn encode(&self, document: &[u8]) -> Result<EncodedKeys> {
        let parsed: JsonValue = serde_json::from_slice(document)
            .map_err(|e| Error::InvalidDocument(e.to_string()))?;
        self.encode_value(&parsed)
    }

    /// Encode an already parsed document.
    pub fn encode_value(&self, document: &JsonValue) -> Result<EncodedKeys> {
        let object = document.as_object().ok_or_else(|| {
            Error::InvalidDocument("document must be a JSON object".to_string())
        })?;

        let pk = self.primary_key_value(object)?;
        let primary = self.schema.primary().name();

        let mut secondary_index = Vec::with_capacity(self.schema.secondary().len());
        for field in self.schema.secondary() {
            let value = object
                .get(field)
                .ok_or_else(|| Error::MissingSecondaryKeyField {
                    field: field.clone(),
                })?;
            secondary_index.push(secondary_index_key(
                self.collection,
                field,
                &field_string(value),
                &pk,
            ));
        }

        Ok(EncodedKeys {
            primary_index: primary_index_key(self.collection, primary, &pk),
            payload_key: payload_key(self.collection, primary, &pk),
            secondary_index,
            primary_value: pk,
        })
    }

    /// Resolve the (possibly composite) primary key value.
    pub fn primary_key_value(&self, document: &Map<String, JsonValue>) -> Result<String> {
        let mut pk = String::new();
        for field in self.schema.primary().fields() {
            let value = document
                .get(field)
                .ok_or_else(|| Error::MissingPrimaryKeyField {
                    field: field.clone(),
                })?;
            pk.push_str(&field_string(value));
        }
        Ok(pk)
    }

    /// Payload key for a known primary key value
    pub fn payload_key(&self, pk: &str) -> String {
        payload_key(self.collection, self.schema.primary().name(), pk)
    }

    /// Scan prefix for `field` values starting with `condition`
    pub fn scan_prefix(&self, field: &str, condition: &str) -> String {
        scan_prefix(self.collection, field, condition)
    }
}

//! Core domain types for crawl result sets.
//!
//! A parse stage (external) writes crawl output as *blocks* — JSON objects
//! keyed by `{fingerprint}-{page}-{block}` — into a key-value store. The
//! export side reads them back, resolves nested detail chains, and encodes
//! the resulting records. The types here are that shared vocabulary.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::ResultForgeError;

/// Field-name substring that marks a detail-chain reference.
///
/// A field whose name contains this marker and whose value is a string holds
/// the fingerprint of a separately stored block sequence.
pub const DETAIL_FIELD_MARKER: &str = "details";

/// Whether a block field refers to (or holds) nested detail records.
pub fn is_detail_field(name: &str) -> bool {
    name.contains(DETAIL_FIELD_MARKER)
}

// ---------------------------------------------------------------------------
// Fingerprint
// ---------------------------------------------------------------------------

/// Opaque content hash identifying one crawl result set.
///
/// Stable for the lifetime of a result set and used as the storage key
/// prefix for every block belonging to it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Wrap an existing hash string (e.g. received from the parse stage).
    pub fn new(hash: impl Into<String>) -> Self {
        Self(hash.into())
    }

    /// Derive a fingerprint from a scraping job payload (lowercase SHA-256 hex).
    pub fn from_payload(payload: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(payload);
        Self(format!("{:x}", hasher.finalize()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for Fingerprint {
    type Err = ResultForgeError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(ResultForgeError::config("empty fingerprint"));
        }
        Ok(Self(s.to_string()))
    }
}

/// Derive the storage key for one block of a result set.
///
/// `{fingerprint}-{page}-{block}`, indices zero-based. This is the only
/// coupling between the parse-stage writer and the export-stage reader, so
/// it must stay byte-identical across every call site.
pub fn storage_key(fingerprint: &Fingerprint, page: u64, block: u64) -> String {
    format!("{}-{page}-{block}", fingerprint.as_str())
}

// ---------------------------------------------------------------------------
// Value / Record
// ---------------------------------------------------------------------------

/// A single field value inside a record.
///
/// Scalars and scalar arrays come straight from stored blocks; `Record` and
/// `Records` only appear after detail-chain resolution has replaced a
/// chain fingerprint with the sub-records it pointed at.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    String(String),
    Integer(i64),
    Float(f64),
    /// Homogeneous array of scalars.
    Array(Vec<Value>),
    /// A detail chain that resolved to exactly one sub-record.
    Record(Record),
    /// A detail chain that resolved to more than one sub-record, in read order.
    Records(Vec<Record>),
}

impl Value {
    /// Convert decoded JSON into the explicit value model.
    ///
    /// Integers stay integers (`i64`), all other numbers become floats.
    /// An array of objects maps to `Records` so already-resolved detail
    /// blocks survive a round trip through the store.
    pub fn from_json(json: serde_json::Value) -> Value {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::String(b.to_string()),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Integer(i),
                None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                if !items.is_empty() && items.iter().all(serde_json::Value::is_object) {
                    Value::Records(
                        items
                            .into_iter()
                            .filter_map(|item| match item {
                                serde_json::Value::Object(map) => {
                                    Some(Record::from_json_map(map))
                                }
                                _ => None,
                            })
                            .collect(),
                    )
                } else {
                    Value::Array(items.into_iter().map(Value::from_json).collect())
                }
            }
            serde_json::Value::Object(map) => Value::Record(Record::from_json_map(map)),
        }
    }

    /// The string content, if this is a string value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }
}

/// A decoded block, and — once detail fields are resolved — an output-facing
/// record ready for encoding.
///
/// Field order within a block carries no meaning; a `BTreeMap` keeps
/// iteration deterministic for the encoders.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Record(BTreeMap<String, Value>);

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a record from a decoded JSON object.
    pub fn from_json_map(map: serde_json::Map<String, serde_json::Value>) -> Self {
        Self(
            map.into_iter()
                .map(|(field, value)| (field, Value::from_json(value)))
                .collect(),
        )
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    pub fn insert(&mut self, field: impl Into<String>, value: Value) {
        self.0.insert(field.into(), value);
    }

    pub fn remove(&mut self, field: &str) -> Option<Value> {
        self.0.remove(field)
    }

    /// Iterate fields in deterministic (lexicographic) order.
    pub fn fields(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// Names of fields that reference or hold detail records.
    pub fn detail_fields(&self) -> Vec<String> {
        self.0
            .keys()
            .filter(|name| is_detail_field(name))
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fingerprint_from_payload_is_stable() {
        let a = Fingerprint::from_payload(b"{\"url\":\"https://example.com\"}");
        let b = Fingerprint::from_payload(b"{\"url\":\"https://example.com\"}");
        assert_eq!(a, b);
        assert_eq!(a.as_str().len(), 64);
        assert!(a.as_str().chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn storage_key_format_and_idempotence() {
        let fp = Fingerprint::new("abc123");
        assert_eq!(storage_key(&fp, 0, 0), "abc123-0-0");
        assert_eq!(storage_key(&fp, 3, 17), "abc123-3-17");
        assert_eq!(storage_key(&fp, 3, 17), storage_key(&fp, 3, 17));
    }

    #[test]
    fn value_from_json_scalars() {
        assert_eq!(Value::from_json(serde_json::json!(42)), Value::Integer(42));
        assert_eq!(Value::from_json(serde_json::json!(1.5)), Value::Float(1.5));
        assert_eq!(
            Value::from_json(serde_json::json!("hi")),
            Value::String("hi".into())
        );
        assert_eq!(Value::from_json(serde_json::json!(null)), Value::Null);
    }

    #[test]
    fn value_from_json_arrays() {
        let scalars = Value::from_json(serde_json::json!(["x", "y"]));
        assert_eq!(
            scalars,
            Value::Array(vec![Value::String("x".into()), Value::String("y".into())])
        );

        let objects = Value::from_json(serde_json::json!([{"a": 1}, {"a": 2}]));
        match objects {
            Value::Records(records) => {
                assert_eq!(records.len(), 2);
                assert_eq!(records[0].get("a"), Some(&Value::Integer(1)));
            }
            other => panic!("expected Records, got {other:?}"),
        }
    }

    #[test]
    fn record_serializes_to_plain_json() {
        let mut record = Record::new();
        record.insert("name", Value::String("widget".into()));
        record.insert("price", Value::Float(9.99));
        record.insert("qty", Value::Integer(3));

        let json = serde_json::to_string(&record).expect("serialize");
        assert_eq!(json, r#"{"name":"widget","price":9.99,"qty":3}"#);
    }

    #[test]
    fn detail_field_detection() {
        assert!(is_detail_field("details"));
        assert!(is_detail_field("product_details"));
        assert!(!is_detail_field("description"));

        let mut record = Record::new();
        record.insert("title", Value::String("t".into()));
        record.insert("offer_details", Value::String("deadbeef".into()));
        assert_eq!(record.detail_fields(), vec!["offer_details".to_string()]);
    }
}

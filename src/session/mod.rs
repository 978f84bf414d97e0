//! # Session snapshot data
//!
//! The simulator publishes session metadata (track, car, weekend setup) as an
//! ad-hoc text blob that only resembles YAML. This module owns the data model
//! for the parsed result and the two codecs that build it:
//!
//! - [`scalar::classify`] turns one raw token into a typed scalar
//! - [`parser::parse_session`] turns the whole blob into a [`SessionValue`]
//!   tree, best-effort, without a formal grammar
//!
//! The tree is deliberately generic (no typed `WeekendInfo`/`DriverInfo`
//! structs): the blob's shape drifts between simulator builds, and consumers
//! pick out the paths they care about. `SessionValue` serializes to the JSON
//! shape downstream consumers expect.

use serde::Serialize;
use serde::ser::{SerializeMap, SerializeSeq};

pub mod parser;
pub mod scalar;

pub use parser::parse_session;
pub use scalar::classify;

/// One node of a parsed session snapshot.
///
/// Objects preserve insertion order; session consumers rely on the
/// declaration order of keys when re-serializing, so the mapping is a plain
/// ordered list rather than a hash map. Lookups are linear, which is fine for
/// the small objects the simulator emits.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Array(Vec<SessionValue>),
    Object(Vec<(String, SessionValue)>),
}

impl SessionValue {
    /// Look up a key in an object node. Returns `None` for non-objects.
    pub fn get(&self, key: &str) -> Option<&SessionValue> {
        match self {
            SessionValue::Object(entries) => {
                entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
            }
            _ => None,
        }
    }

    /// Index into an array node. Returns `None` for non-arrays.
    pub fn at(&self, index: usize) -> Option<&SessionValue> {
        match self {
            SessionValue::Array(items) => items.get(index),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            SessionValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            SessionValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Numeric view: integers widen to `f64`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            SessionValue::Float(f) => Some(*f),
            SessionValue::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            SessionValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, SessionValue::Null)
    }
}

impl Serialize for SessionValue {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        match self {
            SessionValue::Null => serializer.serialize_unit(),
            SessionValue::Bool(b) => serializer.serialize_bool(*b),
            SessionValue::Int(i) => serializer.serialize_i64(*i),
            SessionValue::Float(f) => serializer.serialize_f64(*f),
            SessionValue::String(s) => serializer.serialize_str(s),
            SessionValue::Array(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            SessionValue::Object(entries) => {
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (key, value) in entries {
                    map.serialize_entry(key, value)?;
                }
                map.end()
            }
        }
    }
}

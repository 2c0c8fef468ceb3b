//! Records searched by the aggregator.
//!
//! A [`Record`] is an arbitrarily shaped JSON object. The search path never
//! inspects it beyond the configured field names and the identity field.
//! The model tag a record carries is supplied by whoever fetched it; it is
//! never inferred from the record's contents.
//!
//! # Examples
//!
//! ```
//! use fuzzyrank::record::{Record, RecordId};
//!
//! let record = Record::builder()
//!     .add_integer("id", 7)
//!     .add_text("name", "Alpine Lodge")
//!     .model("Hotel")
//!     .build();
//!
//! assert_eq!(record.id("id"), Some(RecordId::Integer(7)));
//! assert_eq!(record.model(), Some("Hotel"));
//! ```

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::error::{FuzzyRankError, Result};

/// A single record: a JSON object plus an optional model tag.
#[derive(Clone, Serialize, Deserialize, Debug, Default, PartialEq)]
pub struct Record {
    /// The record's fields, serialized flat.
    #[serde(flatten)]
    fields: Map<String, Value>,
    /// Model/type tag supplied by the fetch layer.
    #[serde(skip)]
    model: Option<String>,
}

impl Record {
    /// Create a new empty record.
    pub fn new() -> Self {
        Record::default()
    }

    /// Wrap an already-built JSON object.
    pub fn from_map(fields: Map<String, Value>) -> Self {
        Record {
            fields,
            model: None,
        }
    }

    /// Convert a JSON value into a record. Only objects are accepted.
    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Object(fields) => Ok(Record::from_map(fields)),
            other => Err(FuzzyRankError::invalid_argument(format!(
                "expected a JSON object for a record, got {}",
                json_kind(&other)
            ))),
        }
    }

    /// Attach a model tag.
    pub fn with_model<S: Into<String>>(mut self, model: S) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Set or replace the model tag.
    pub fn set_model<S: Into<String>>(&mut self, model: S) {
        self.model = Some(model.into());
    }

    /// The model tag, if the caller supplied one.
    pub fn model(&self) -> Option<&str> {
        self.model.as_deref()
    }

    /// Add a field value to the record.
    pub fn add_field<S: Into<String>>(&mut self, name: S, value: Value) {
        self.fields.insert(name.into(), value);
    }

    /// Get a field value from the record.
    pub fn get_field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Get all field values.
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// Get the number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Check if the record is empty.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Read the record identity from `identity_field`.
    ///
    /// Returns `None` when the field is absent or holds something that cannot
    /// serve as a stable key (null, array, object).
    pub fn id(&self, identity_field: &str) -> Option<RecordId> {
        RecordId::from_value(self.fields.get(identity_field)?)
    }

    /// Searchable texts held by `field`.
    ///
    /// Scalars are stringified; arrays contribute one entry per scalar
    /// element, tagged with the element index. Nulls and nested objects are
    /// not searchable.
    pub fn searchable_values(&self, field: &str) -> Vec<FieldText> {
        let Some(value) = self.fields.get(field) else {
            return Vec::new();
        };

        match value {
            Value::Array(items) => items
                .iter()
                .enumerate()
                .filter_map(|(index, item)| {
                    scalar_text(item).map(|text| FieldText {
                        text,
                        array_index: Some(index),
                    })
                })
                .collect(),
            other => scalar_text(other)
                .map(|text| FieldText {
                    text,
                    array_index: None,
                })
                .into_iter()
                .collect(),
        }
    }

    /// Create a builder for constructing records.
    pub fn builder() -> RecordBuilder {
        RecordBuilder::new()
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// One searchable text taken from a record field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldText {
    /// The text to match against.
    pub text: String,
    /// Index of the element when the field holds an array.
    pub array_index: Option<usize>,
}

/// Stable identity of a record, used to merge per-term results.
///
/// Numbers are kept by value: `1` and `1.0` are the same identity. Every
/// integral number that fits `i64` is an [`RecordId::Integer`]; larger
/// integers are [`RecordId::Unsigned`]; anything else is a [`RecordId::Float`]
/// holding the bit pattern of the value. Strings never equal numbers.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RecordId {
    /// String identity.
    Text(String),
    /// Integral numeric identity.
    Integer(i64),
    /// Integral numeric identity above `i64::MAX`.
    Unsigned(u64),
    /// Non-integral numeric identity, as `f64` bits.
    Float(u64),
    /// Boolean identity.
    Bool(bool),
}

impl RecordId {
    /// Read an identity from a JSON value.
    ///
    /// Null, arrays and objects cannot serve as a stable key.
    pub fn from_value(value: &Value) -> Option<RecordId> {
        match value {
            Value::String(s) => Some(RecordId::Text(s.clone())),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Some(RecordId::Integer(i))
                } else if let Some(u) = n.as_u64() {
                    Some(RecordId::Unsigned(u))
                } else {
                    n.as_f64().map(RecordId::from_f64)
                }
            }
            Value::Bool(b) => Some(RecordId::Bool(*b)),
            Value::Null | Value::Array(_) | Value::Object(_) => None,
        }
    }

    /// Canonical identity of a float.
    pub fn from_f64(value: f64) -> RecordId {
        const TWO_POW_63: f64 = 9_223_372_036_854_775_808.0;
        const TWO_POW_64: f64 = 18_446_744_073_709_551_616.0;

        if value.is_finite() && value.fract() == 0.0 {
            if (-TWO_POW_63..TWO_POW_63).contains(&value) {
                return RecordId::Integer(value as i64);
            }
            if (0.0..TWO_POW_64).contains(&value) {
                return RecordId::Unsigned(value as u64);
            }
        }
        RecordId::Float(value.to_bits())
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordId::Text(s) => f.write_str(s),
            RecordId::Integer(i) => write!(f, "{i}"),
            RecordId::Unsigned(u) => write!(f, "{u}"),
            RecordId::Float(bits) => write!(f, "{}", f64::from_bits(*bits)),
            RecordId::Bool(b) => write!(f, "{b}"),
        }
    }
}

impl Serialize for RecordId {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            RecordId::Text(s) => serializer.serialize_str(s),
            RecordId::Integer(i) => serializer.serialize_i64(*i),
            RecordId::Unsigned(u) => serializer.serialize_u64(*u),
            RecordId::Float(bits) => serializer.serialize_f64(f64::from_bits(*bits)),
            RecordId::Bool(b) => serializer.serialize_bool(*b),
        }
    }
}

impl<'de> Deserialize<'de> for RecordId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        RecordId::from_value(&value).ok_or_else(|| {
            serde::de::Error::custom(format!(
                "expected a string, number or boolean identity, got {}",
                json_kind(&value)
            ))
        })
    }
}

/// Resolve the identity of every record, failing on the first one without.
///
/// Runs once per search call so the merge step never has to handle a record
/// without a key.
pub fn resolve_identities(records: &[Record], identity_field: &str) -> Result<Vec<RecordId>> {
    records
        .iter()
        .enumerate()
        .map(|(position, record)| {
            record
                .id(identity_field)
                .ok_or_else(|| FuzzyRankError::missing_identity(identity_field, position))
        })
        .collect()
}

/// Discover the field names to search from a sample record.
///
/// Computed once per call from the first record, never per record. Names are
/// returned in sorted order.
pub fn discover_fields(sample: &Record) -> Vec<String> {
    let mut names: Vec<String> = sample.fields.keys().cloned().collect();
    names.sort();
    names
}

/// The records of one model, as handed over by the fetch layer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecordSet {
    /// Model name shared by every record in the set.
    pub model: String,
    /// The records.
    pub records: Vec<Record>,
}

impl RecordSet {
    /// Create a record set, tagging every record with `model`.
    pub fn new<S: Into<String>>(model: S, records: Vec<Record>) -> Self {
        let model = model.into();
        let records = records
            .into_iter()
            .map(|record| record.with_model(model.clone()))
            .collect();
        RecordSet { model, records }
    }

    /// Number of records in the set.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if the set holds no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// A builder for constructing records in a fluent manner.
#[derive(Debug, Default)]
pub struct RecordBuilder {
    record: Record,
}

impl RecordBuilder {
    /// Create a new record builder.
    pub fn new() -> Self {
        RecordBuilder::default()
    }

    /// Add a text field.
    pub fn add_text<S: Into<String>, T: Into<String>>(mut self, name: S, value: T) -> Self {
        self.record.add_field(name, Value::String(value.into()));
        self
    }

    /// Add an integer field.
    pub fn add_integer<S: Into<String>>(mut self, name: S, value: i64) -> Self {
        self.record.add_field(name, Value::from(value));
        self
    }

    /// Add an arbitrary JSON value.
    pub fn add_value<S: Into<String>>(mut self, name: S, value: Value) -> Self {
        self.record.add_field(name, value);
        self
    }

    /// Set the model tag.
    pub fn model<S: Into<String>>(mut self, model: S) -> Self {
        self.record.set_model(model);
        self
    }

    /// Build the record.
    pub fn build(self) -> Record {
        self.record
    }
}

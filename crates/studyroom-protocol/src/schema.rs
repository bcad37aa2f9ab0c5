//! Explicit serialization descriptors for synchronized entities.
//!
//! An entity that travels inside a state patch is described by a
//! [`SchemaDescriptor`]: an ordered list of field names with type tags.
//! The entity itself stays a plain Rust struct; it only implements
//! [`Schema`] to convert to and from a positional [`Record`].
//!
//! Both directions are checked against the descriptor:
//!
//! ```text
//! Tile ──to_fields──→ [Str, Str, Str] ──check──→ Record ──wire──→
//!      ←─from_fields── [Str, Str, Str] ←─check── Record ←─wire───
//! ```
//!
//! so a record with a missing field or a number where a string belongs is
//! rejected before any domain constructor runs.

use serde::{Deserialize, Serialize};

use crate::ProtocolError;

/// The type tag of a single field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    /// UTF-8 text. Enum-like fields (tile kind, direction) use this too.
    String,
    /// Signed integer.
    Int,
}

/// One named, typed field in a [`SchemaDescriptor`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub name: &'static str,
    pub ty: FieldType,
}

impl FieldDescriptor {
    /// A string field.
    pub const fn string(name: &'static str) -> Self {
        Self {
            name,
            ty: FieldType::String,
        }
    }

    /// An integer field.
    pub const fn int(name: &'static str) -> Self {
        Self {
            name,
            ty: FieldType::Int,
        }
    }
}

/// The ordered field list of a synchronized entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchemaDescriptor {
    /// Entity name, used in error messages.
    pub name: &'static str,
    pub fields: &'static [FieldDescriptor],
}

impl SchemaDescriptor {
    /// Verifies that `values` has exactly one value per field, each with
    /// the declared type.
    ///
    /// # Errors
    /// Returns [`ProtocolError::Schema`] naming the first mismatch.
    pub fn check(&self, values: &[FieldValue]) -> Result<(), ProtocolError> {
        if values.len() != self.fields.len() {
            return Err(ProtocolError::schema(
                self.name,
                format!(
                    "expected {} fields, got {}",
                    self.fields.len(),
                    values.len()
                ),
            ));
        }
        for (field, value) in self.fields.iter().zip(values) {
            if value.field_type() != field.ty {
                return Err(ProtocolError::schema(
                    self.name,
                    format!(
                        "field `{}` expected {:?}, got {:?}",
                        field.name,
                        field.ty,
                        value.field_type()
                    ),
                ));
            }
        }
        Ok(())
    }
}

/// A single field value on the wire.
///
/// `#[serde(untagged)]` keeps the JSON flat: `3` for an int, `"wall"` for
/// a string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Int(i64),
    Str(String),
}

impl FieldValue {
    /// The type tag this value carries.
    pub fn field_type(&self) -> FieldType {
        match self {
            Self::Int(_) => FieldType::Int,
            Self::Str(_) => FieldType::String,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            Self::Str(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            Self::Int(_) => None,
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Str(value.to_owned())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

/// A positional, schema-checked encoding of one entity.
///
/// Serializes as a plain JSON array: `["wall-0-0", "#8B4513", "wall"]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(Vec<FieldValue>);

impl Record {
    /// Wraps raw values without checking them. Decoding still checks.
    pub fn from_values(values: Vec<FieldValue>) -> Self {
        Self(values)
    }

    pub fn values(&self) -> &[FieldValue] {
        &self.0
    }

    pub fn into_values(self) -> Vec<FieldValue> {
        self.0
    }
}

/// Implemented by every entity that is synchronized field-by-field.
pub trait Schema: Sized {
    /// The descriptor both encode and decode are checked against.
    const DESCRIPTOR: &'static SchemaDescriptor;

    /// Field values in descriptor order.
    fn to_fields(&self) -> Vec<FieldValue>;

    /// Rebuilds the entity from values already checked against
    /// [`Self::DESCRIPTOR`]. Use [`FieldReader`] to consume them in order.
    ///
    /// # Errors
    /// Returns a [`ProtocolError`] when a value is well-typed but not a
    /// legal value for the domain (e.g. an unknown tile kind).
    fn from_fields(fields: Vec<FieldValue>) -> Result<Self, ProtocolError>;
}

/// Encodes an entity into a descriptor-checked [`Record`].
///
/// # Errors
/// Returns [`ProtocolError::Schema`] if `to_fields` disagrees with the
/// descriptor, which means the `Schema` impl itself is wrong.
pub fn encode_record<S: Schema>(value: &S) -> Result<Record, ProtocolError> {
    let values = value.to_fields();
    S::DESCRIPTOR.check(&values)?;
    Ok(Record(values))
}

/// Decodes a [`Record`] into an entity after checking it against the
/// descriptor.
///
/// # Errors
/// Returns [`ProtocolError::Schema`] for a shape mismatch, or whatever
/// `from_fields` reports for illegal values.
pub fn decode_record<S: Schema>(record: Record) -> Result<S, ProtocolError> {
    S::DESCRIPTOR.check(&record.0)?;
    S::from_fields(record.0)
}

/// Sequential typed access to a record's values, for `from_fields` impls.
pub struct FieldReader {
    descriptor: &'static SchemaDescriptor,
    values: std::vec::IntoIter<FieldValue>,
    position: usize,
}

impl FieldReader {
    pub fn new(descriptor: &'static SchemaDescriptor, values: Vec<FieldValue>) -> Self {
        Self {
            descriptor,
            values: values.into_iter(),
            position: 0,
        }
    }

    /// Takes the next value as a string.
    pub fn string(&mut self) -> Result<String, ProtocolError> {
        match self.next_value()? {
            FieldValue::Str(s) => Ok(s),
            FieldValue::Int(_) => Err(self.mismatch("string")),
        }
    }

    /// Takes the next value as an integer.
    pub fn int(&mut self) -> Result<i64, ProtocolError> {
        match self.next_value()? {
            FieldValue::Int(v) => Ok(v),
            FieldValue::Str(_) => Err(self.mismatch("int")),
        }
    }

    /// Takes the next value as a string and parses it.
    pub fn parse<T: std::str::FromStr>(&mut self) -> Result<T, ProtocolError> {
        let raw = self.string()?;
        raw.parse().map_err(|_| {
            ProtocolError::schema(
                self.descriptor.name,
                format!("field `{}` has illegal value {raw:?}", self.current_name()),
            )
        })
    }

    fn next_value(&mut self) -> Result<FieldValue, ProtocolError> {
        let value = self.values.next().ok_or_else(|| {
            ProtocolError::schema(self.descriptor.name, "record ended early")
        })?;
        self.position += 1;
        Ok(value)
    }

    fn current_name(&self) -> &'static str {
        self.position
            .checked_sub(1)
            .and_then(|i| self.descriptor.fields.get(i))
            .map_or("?", |f| f.name)
    }

    fn mismatch(&self, expected: &str) -> ProtocolError {
        ProtocolError::schema(
            self.descriptor.name,
            format!("field `{}` is not {expected}", self.current_name()),
        )
    }
}

//! Structured-output schema validator.
//!
//! Stage outputs (typically JSON produced by an external generation service)
//! are checked against a [`SchemaDescriptor`] before the next stage may
//! consume them. Validation is pure: the input is never mutated and no I/O
//! is performed.
//!
//! Unknown object fields are ignored; required fields must be present and
//! non-null; optional fields may be absent or `null`.

use serde::de::DeserializeOwned;
use serde_json::Value;

// ---------------------------------------------------------------------------
// Descriptors
// ---------------------------------------------------------------------------

/// Expected shape of a structured value.
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaDescriptor {
    /// Any JSON value, including `null`.
    Any,
    String,
    Bool,
    Integer,
    Number,
    Array {
        items: Box<SchemaDescriptor>,
        min_items: usize,
    },
    Object(Vec<FieldSchema>),
}

/// One named field of an object schema.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSchema {
    pub name: String,
    pub shape: SchemaDescriptor,
    pub required: bool,
}

impl FieldSchema {
    pub fn required(name: impl Into<String>, shape: SchemaDescriptor) -> Self {
        Self {
            name: name.into(),
            shape,
            required: true,
        }
    }

    pub fn optional(name: impl Into<String>, shape: SchemaDescriptor) -> Self {
        Self {
            name: name.into(),
            shape,
            required: false,
        }
    }
}

impl SchemaDescriptor {
    pub fn object(fields: impl IntoIterator<Item = FieldSchema>) -> Self {
        SchemaDescriptor::Object(fields.into_iter().collect())
    }

    /// An array of `items` with no length constraint.
    pub fn array_of(items: SchemaDescriptor) -> Self {
        SchemaDescriptor::Array {
            items: Box::new(items),
            min_items: 0,
        }
    }

    /// An array of `items` that must contain at least one element.
    pub fn non_empty_array_of(items: SchemaDescriptor) -> Self {
        SchemaDescriptor::Array {
            items: Box::new(items),
            min_items: 1,
        }
    }

    fn expected(&self) -> &'static str {
        match self {
            SchemaDescriptor::Any => "any value",
            SchemaDescriptor::String => "string",
            SchemaDescriptor::Bool => "boolean",
            SchemaDescriptor::Integer => "integer",
            SchemaDescriptor::Number => "number",
            SchemaDescriptor::Array { .. } => "array",
            SchemaDescriptor::Object(_) => "object",
        }
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Why a value failed validation. `path` uses `$.field[index]` notation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaViolation {
    /// The raw input could not be parsed as structured data at all.
    #[error("malformed input: {0}")]
    Malformed(String),

    #[error("{path}: missing required field `{field}`")]
    MissingField { path: String, field: String },

    #[error("{path}: expected {expected}, found {found}")]
    WrongType {
        path: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("{path}: expected at least {min} item(s), found {found}")]
    TooFewItems {
        path: String,
        min: usize,
        found: usize,
    },
}

// ---------------------------------------------------------------------------
// Validated values
// ---------------------------------------------------------------------------

/// A value that has passed validation against some schema.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedValue(Value);

impl ValidatedValue {
    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn into_inner(self) -> Value {
        self.0
    }

    /// Decode into a typed stage output.
    pub fn deserialize<T: DeserializeOwned>(&self) -> Result<T, SchemaViolation> {
        serde_json::from_value(self.0.clone()).map_err(|e| SchemaViolation::Malformed(e.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Validate an already-parsed value against `shape`.
pub fn validate(raw: &Value, shape: &SchemaDescriptor) -> Result<ValidatedValue, SchemaViolation> {
    check(raw, shape, "$")?;
    Ok(ValidatedValue(raw.clone()))
}

/// Parse `raw` as JSON, then validate it against `shape`.
///
/// Generation services return text; anything that does not parse is
/// reported as [`SchemaViolation::Malformed`].
pub fn validate_str(raw: &str, shape: &SchemaDescriptor) -> Result<ValidatedValue, SchemaViolation> {
    let value: Value = serde_json::from_str(raw.trim())
        .map_err(|e| SchemaViolation::Malformed(e.to_string()))?;
    validate(&value, shape)
}

fn check(value: &Value, shape: &SchemaDescriptor, path: &str) -> Result<(), SchemaViolation> {
    let matches = match shape {
        SchemaDescriptor::Any => true,
        SchemaDescriptor::String => value.is_string(),
        SchemaDescriptor::Bool => value.is_boolean(),
        SchemaDescriptor::Integer => value.is_i64() || value.is_u64(),
        SchemaDescriptor::Number => value.is_number(),
        SchemaDescriptor::Array { .. } => value.is_array(),
        SchemaDescriptor::Object(_) => value.is_object(),
    };
    if !matches {
        return Err(SchemaViolation::WrongType {
            path: path.to_string(),
            expected: shape.expected(),
            found: type_name(value),
        });
    }

    match (shape, value) {
        (SchemaDescriptor::Array { items, min_items }, Value::Array(elements)) => {
            if elements.len() < *min_items {
                return Err(SchemaViolation::TooFewItems {
                    path: path.to_string(),
                    min: *min_items,
                    found: elements.len(),
                });
            }
            for (i, element) in elements.iter().enumerate() {
                check(element, items, &format!("{path}[{i}]"))?;
            }
        }
        (SchemaDescriptor::Object(fields), Value::Object(map)) => {
            for field in fields {
                let field_path = format!("{path}.{}", field.name);
                match map.get(&field.name) {
                    None | Some(Value::Null) if field.required => {
                        if map.contains_key(&field.name) {
                            return Err(SchemaViolation::WrongType {
                                path: field_path,
                                expected: field.shape.expected(),
                                found: "null",
                            });
                        }
                        return Err(SchemaViolation::MissingField {
                            path: path.to_string(),
                            field: field.name.clone(),
                        });
                    }
                    None | Some(Value::Null) => {}
                    Some(inner) => check(inner, &field.shape, &field_path)?,
                }
            }
        }
        _ => {}
    }

    Ok(())
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_f64() => "number",
        Value::Number(_) => "integer",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

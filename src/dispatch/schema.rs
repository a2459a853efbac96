//! Declarative action input schemas and the validator that enforces them.
//!
//! A schema is an ordered list of [`FieldSpec`]s, each carrying one
//! [`FieldKind`]. Validation is a pure function from raw JSON arguments to an
//! [`ActionInput`] holding only the declared fields.

use serde::de::DeserializeOwned;
use serde_json::{Map, Number, Value};
use thiserror::Error;

/// Accepted shape of a single argument.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    String,
    Number,
    Boolean,
    /// A string restricted to the listed members.
    Enum(Vec<&'static str>),
    Object,
    /// An array, optionally constraining every item to one kind.
    Array(Option<Box<FieldKind>>),
}

impl FieldKind {
    pub fn one_of(members: &[&'static str]) -> Self {
        FieldKind::Enum(members.to_vec())
    }

    pub fn array_of(item: FieldKind) -> Self {
        FieldKind::Array(Some(Box::new(item)))
    }

    /// JSON Schema `type` keyword for this kind.
    pub fn json_type(&self) -> &'static str {
        match self {
            FieldKind::String | FieldKind::Enum(_) => "string",
            FieldKind::Number => "number",
            FieldKind::Boolean => "boolean",
            FieldKind::Object => "object",
            FieldKind::Array(_) => "array",
        }
    }
}

/// One declared argument.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
    pub required: bool,
    pub description: &'static str,
    /// Filled in when the argument is absent.
    pub default: Option<Value>,
    /// Accept string renderings of numbers and booleans.
    pub coerce: bool,
}

impl FieldSpec {
    pub fn required(name: &'static str, kind: FieldKind, description: &'static str) -> Self {
        Self {
            name,
            kind,
            required: true,
            description,
            default: None,
            coerce: false,
        }
    }

    pub fn optional(name: &'static str, kind: FieldKind, description: &'static str) -> Self {
        Self {
            required: false,
            ..Self::required(name, kind, description)
        }
    }

    pub fn with_default(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }

    pub fn coercible(mut self) -> Self {
        self.coerce = true;
        self
    }
}

/// Input constraint violated during validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("field {field}: {reason}")]
pub struct ValidationError {
    /// Path of the offending value, e.g. `amount` or `tokens[2]`; `$` is the root.
    pub field: String,
    pub reason: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Ordered set of argument declarations for one action.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InputSchema {
    fields: Vec<FieldSpec>,
}

impl InputSchema {
    /// Schema with no arguments.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, spec: FieldSpec) -> Self {
        self.fields.push(spec);
        self
    }

    pub fn required(self, name: &'static str, kind: FieldKind, description: &'static str) -> Self {
        self.field(FieldSpec::required(name, kind, description))
    }

    pub fn optional(self, name: &'static str, kind: FieldKind, description: &'static str) -> Self {
        self.field(FieldSpec::optional(name, kind, description))
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn get(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Check `raw` against every declared field.
    ///
    /// `null` stands for "no arguments" at the root and for "absent" at field
    /// level. Undeclared fields are dropped silently.
    pub fn validate(&self, raw: &Value) -> Result<ActionInput, ValidationError> {
        let empty = Map::new();
        let args = match raw {
            Value::Null => &empty,
            Value::Object(map) => map,
            other => {
                return Err(ValidationError::new(
                    "$",
                    format!("expected an object of named arguments, got {}", type_name(other)),
                ))
            }
        };

        let mut validated = Map::new();
        for spec in &self.fields {
            match args.get(spec.name).filter(|v| !v.is_null()) {
                Some(value) => {
                    let value = check_value(spec.name, &spec.kind, spec.coerce, value)?;
                    validated.insert(spec.name.to_string(), value);
                }
                None => {
                    if let Some(default) = &spec.default {
                        validated.insert(spec.name.to_string(), default.clone());
                    } else if spec.required {
                        return Err(ValidationError::new(spec.name, "required field is missing"));
                    }
                }
            }
        }

        Ok(ActionInput(validated))
    }
}

fn check_value(
    path: &str,
    kind: &FieldKind,
    coerce: bool,
    value: &Value,
) -> Result<Value, ValidationError> {
    match (kind, value) {
        (FieldKind::String, Value::String(_))
        | (FieldKind::Number, Value::Number(_))
        | (FieldKind::Boolean, Value::Bool(_))
        | (FieldKind::Object, Value::Object(_)) => Ok(value.clone()),

        (FieldKind::Number, Value::String(s)) if coerce => parse_number(s)
            .map(Value::Number)
            .ok_or_else(|| ValidationError::new(path, format!("expected number, got '{}'", s))),

        (FieldKind::Boolean, Value::String(s)) if coerce => match s.trim() {
            "true" => Ok(Value::Bool(true)),
            "false" => Ok(Value::Bool(false)),
            _ => Err(ValidationError::new(
                path,
                format!("expected boolean, got '{}'", s),
            )),
        },

        (FieldKind::Enum(members), Value::String(s)) => {
            if members.contains(&s.as_str()) {
                Ok(value.clone())
            } else {
                Err(ValidationError::new(
                    path,
                    format!(
                        "expected enum member of {{{}}}, got '{}'",
                        members.join(","),
                        s
                    ),
                ))
            }
        }

        (FieldKind::Array(item_kind), Value::Array(items)) => match item_kind {
            Some(item_kind) => items
                .iter()
                .enumerate()
                .map(|(i, item)| check_value(&format!("{}[{}]", path, i), item_kind, coerce, item))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array),
            None => Ok(value.clone()),
        },

        (FieldKind::Enum(members), other) => Err(ValidationError::new(
            path,
            format!(
                "expected enum member of {{{}}}, got {}",
                members.join(","),
                type_name(other)
            ),
        )),

        (kind, other) => Err(ValidationError::new(
            path,
            format!("expected {}, got {}", kind.json_type(), type_name(other)),
        )),
    }
}

fn parse_number(s: &str) -> Option<Number> {
    let s = s.trim();
    if let Ok(i) = s.parse::<i64>() {
        return Some(Number::from(i));
    }
    s.parse::<f64>().ok().and_then(Number::from_f64)
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Arguments that passed validation. Holds declared fields only.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActionInput(Map<String, Value>);

impl ActionInput {
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    pub fn str(&self, name: &str) -> Option<&str> {
        self.0.get(name).and_then(Value::as_str)
    }

    pub fn f64(&self, name: &str) -> Option<f64> {
        self.0.get(name).and_then(Value::as_f64)
    }

    pub fn bool(&self, name: &str) -> Option<bool> {
        self.0.get(name).and_then(Value::as_bool)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Deserialize the validated arguments into a typed struct.
    pub fn parse<T: DeserializeOwned>(&self) -> crate::Result<T> {
        serde_json::from_value(Value::Object(self.0.clone()))
            .map_err(|e| crate::Error::InvalidArgument(e.to_string()))
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

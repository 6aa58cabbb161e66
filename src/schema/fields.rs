//! Declared stream schemas and record validation

use super::types::{JsonSchema, JsonType, SchemaProperty};
use crate::error::{Error, Result};
use crate::types::{is_integer_number, JsonObject, JsonValue};
use std::collections::BTreeMap;

/// Declared type of a field
#[derive(Debug, Clone, PartialEq)]
pub enum FieldType {
    String,
    Integer,
    Number,
    Boolean,
    Object(Vec<Field>),
    Array(Box<FieldType>),
}

impl FieldType {
    fn json_type(&self) -> JsonType {
        match self {
            FieldType::String => JsonType::String,
            FieldType::Integer => JsonType::Integer,
            FieldType::Number => JsonType::Number,
            FieldType::Boolean => JsonType::Boolean,
            FieldType::Object(_) => JsonType::Object,
            FieldType::Array(_) => JsonType::Array,
        }
    }

    fn to_property(&self, nullable: bool) -> SchemaProperty {
        let mut property = SchemaProperty::scalar(self.json_type(), nullable);
        match self {
            FieldType::Object(fields) => {
                property.properties = Some(properties_of(fields));
                property.required = required_of(fields);
            }
            FieldType::Array(item) => property.items = Some(Box::new(item.to_property(true))),
            _ => {}
        }
        property
    }

    fn check(&self, path: &str, value: &JsonValue) -> Result<()> {
        let matches = match (self, value) {
            (_, JsonValue::Null) => true,
            (FieldType::String, JsonValue::String(_)) => true,
            (FieldType::Boolean, JsonValue::Bool(_)) => true,
            (FieldType::Number, JsonValue::Number(_)) => true,
            (FieldType::Integer, JsonValue::Number(n)) => is_integer_number(n),
            (FieldType::Object(fields), JsonValue::Object(map)) => {
                return validate_fields(fields, map, path);
            }
            (FieldType::Array(item), JsonValue::Array(values)) => {
                for (i, v) in values.iter().enumerate() {
                    item.check(&format!("{path}[{i}]"), v)?;
                }
                true
            }
            _ => false,
        };

        if matches {
            Ok(())
        } else {
            Err(Error::schema(format!(
                "'{path}' expected {}, found {}",
                self.json_type(),
                type_name(value)
            )))
        }
    }
}

fn type_name(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "boolean",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}

/// A named field in a stream schema
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: &'static str,
    pub field_type: FieldType,
    pub required: bool,
}

impl Field {
    pub fn new(name: &'static str, field_type: FieldType) -> Self {
        Self {
            name,
            field_type,
            required: false,
        }
    }

    pub fn string(name: &'static str) -> Self {
        Self::new(name, FieldType::String)
    }

    pub fn integer(name: &'static str) -> Self {
        Self::new(name, FieldType::Integer)
    }

    pub fn boolean(name: &'static str) -> Self {
        Self::new(name, FieldType::Boolean)
    }

    pub fn object(name: &'static str, fields: Vec<Field>) -> Self {
        Self::new(name, FieldType::Object(fields))
    }

    /// An array of strings
    pub fn strings(name: &'static str) -> Self {
        Self::new(name, FieldType::Array(Box::new(FieldType::String)))
    }

    /// Mark the field required: present and non-null
    #[must_use]
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }
}

fn properties_of(fields: &[Field]) -> BTreeMap<String, SchemaProperty> {
    fields
        .iter()
        .map(|f| (f.name.to_string(), f.field_type.to_property(!f.required)))
        .collect()
}

fn required_of(fields: &[Field]) -> Vec<String> {
    fields
        .iter()
        .filter(|f| f.required)
        .map(|f| f.name.to_string())
        .collect()
}

fn validate_fields(fields: &[Field], record: &JsonObject, prefix: &str) -> Result<()> {
    for field in fields {
        let path = if prefix.is_empty() {
            field.name.to_string()
        } else {
            format!("{prefix}.{}", field.name)
        };
        match record.get(field.name) {
            None | Some(JsonValue::Null) if field.required => {
                return Err(Error::schema(format!("required field '{path}' is missing")));
            }
            None => {}
            Some(value) => field.field_type.check(&path, value)?,
        }
    }
    Ok(())
}

/// Declared shape of a stream's records
///
/// Undeclared fields are allowed through; declared fields must match their
/// type when present, and required fields must be present and non-null.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StreamSchema {
    fields: Vec<Field>,
}

impl StreamSchema {
    pub fn new(fields: Vec<Field>) -> Self {
        Self { fields }
    }

    /// Declared top-level fields
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Look up a top-level field
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Validate a post-processed record
    pub fn validate(&self, record: &JsonObject) -> Result<()> {
        validate_fields(&self.fields, record, "")
    }

    /// JSON Schema document for SCHEMA messages and discovery
    pub fn to_json_schema(&self) -> JsonSchema {
        JsonSchema {
            json_type: JsonType::Object,
            properties: properties_of(&self.fields),
            required: required_of(&self.fields),
        }
    }
}

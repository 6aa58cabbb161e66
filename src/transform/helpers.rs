//! Post-processing helpers

use super::paths::{get_path, get_path_mut, parent_object_mut};
use crate::dedup::KEY_SEPARATOR;
use crate::error::{Error, Result};
use crate::streams::StreamContext;
use crate::types::{is_integer_number, JsonObject, JsonValue};
use serde_json::Number;

/// Field holding a synthesized composite row identifier
pub const ROW_ID_FIELD: &str = "rowId";

/// Longest numeric string coerced by [`to_bounded_integer`]
pub const MAX_INTEGER_STRING_CHARS: usize = 32;

/// Derived flag for the `BaseMale` body shape
pub const BODY_SHAPE_MALE: &str = "bodyShapeMale";

/// Derived flag for the `BaseFemale` body shape
pub const BODY_SHAPE_FEMALE: &str = "bodyShapeFemale";

const BODY_SHAPES_FIELD: &str = "bodyShapes";

// ============================================================================
// Integer Coercion
// ============================================================================

fn parse_integer(path: &str, raw: &str) -> Result<JsonValue> {
    let trimmed = raw.trim();
    if let Ok(i) = trimmed.parse::<i64>() {
        return Ok(JsonValue::from(i));
    }
    if let Ok(u) = trimmed.parse::<u64>() {
        return Ok(JsonValue::from(u));
    }
    // Wider than 64 bits: keep every digit
    let (sign, digits) = match trimmed.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", trimmed),
    };
    if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
        let canonical = format!("{sign}{}", digits.trim_start_matches('0'));
        if let Ok(n) = canonical.parse::<Number>() {
            return Ok(JsonValue::Number(n));
        }
    }
    Err(Error::post_processing(format!(
        "'{path}' is not an integer: \"{raw}\""
    )))
}

fn coerce(path: &str, value: &JsonValue) -> Result<JsonValue> {
    match value {
        JsonValue::String(s) => parse_integer(path, s),
        JsonValue::Number(n) if is_integer_number(n) => Ok(value.clone()),
        other => Err(Error::post_processing(format!(
            "'{path}' is not an integer: {other}"
        ))),
    }
}

/// Replace a big-integer string with a JSON integer
pub fn to_integer(row: &mut JsonObject, path: &str) -> Result<()> {
    let slot = get_path_mut(row, path)
        .ok_or_else(|| Error::post_processing(format!("'{path}' missing from row")))?;
    let coerced = coerce(path, slot)?;
    *slot = coerced;
    Ok(())
}

/// Like [`to_integer`], but absent or null fields are left alone
pub fn to_integer_if_present(row: &mut JsonObject, path: &str) -> Result<()> {
    match get_path_mut(row, path) {
        None | Some(JsonValue::Null) => Ok(()),
        Some(slot) => {
            let coerced = coerce(path, slot)?;
            *slot = coerced;
            Ok(())
        }
    }
}

/// Coerce to an integer, nulling values longer than
/// [`MAX_INTEGER_STRING_CHARS`] characters
pub fn to_bounded_integer(row: &mut JsonObject, path: &str) -> Result<()> {
    let slot = get_path_mut(row, path)
        .ok_or_else(|| Error::post_processing(format!("'{path}' missing from row")))?;
    let coerced = match &*slot {
        JsonValue::String(s) if s.len() > MAX_INTEGER_STRING_CHARS => JsonValue::Null,
        other => coerce(path, other)?,
    };
    *slot = coerced;
    Ok(())
}

// ============================================================================
// Derived Fields
// ============================================================================

fn scalar_text(path: &str, value: &JsonValue) -> Result<String> {
    match value {
        JsonValue::String(s) => Ok(s.clone()),
        JsonValue::Number(n) => Ok(n.to_string()),
        other => Err(Error::post_processing(format!(
            "'{path}' cannot be part of a composite id: {other}"
        ))),
    }
}

/// Set `rowId` to the listed fields joined with `|`
pub fn composite_row_id(row: &mut JsonObject, fields: &[&str]) -> Result<()> {
    let mut parts = Vec::with_capacity(fields.len());
    for field in fields {
        let value = get_path(row, field)
            .ok_or_else(|| Error::post_processing(format!("'{field}' missing from row")))?;
        parts.push(scalar_text(field, value)?);
    }
    row.insert(
        ROW_ID_FIELD.to_string(),
        JsonValue::String(parts.join(KEY_SEPARATOR)),
    );
    Ok(())
}

/// Flatten a list of `{x, y}` objects into `"x1,y1|x2,y2"`.
///
/// A null or empty list becomes the empty string.
pub fn flatten_pairs(row: &mut JsonObject, path: &str, first: &str, second: &str) -> Result<()> {
    let slot = get_path_mut(row, path)
        .ok_or_else(|| Error::post_processing(format!("'{path}' missing from row")))?;

    let flattened = match &*slot {
        JsonValue::Null => String::new(),
        JsonValue::Array(items) => {
            let mut pairs = Vec::with_capacity(items.len());
            for item in items.iter() {
                let a = item
                    .get(first)
                    .ok_or_else(|| Error::post_processing(format!("'{path}[].{first}' missing")))?;
                let b = item
                    .get(second)
                    .ok_or_else(|| Error::post_processing(format!("'{path}[].{second}' missing")))?;
                pairs.push(format!("{},{}", scalar_text(first, a)?, scalar_text(second, b)?));
            }
            pairs.join(KEY_SEPARATOR)
        }
        other => {
            return Err(Error::post_processing(format!(
                "'{path}' is not a list: {other}"
            )))
        }
    };

    *slot = JsonValue::String(flattened);
    Ok(())
}

fn apply_body_shape_flags(object: &mut JsonObject, path: &str) -> Result<()> {
    let shapes = match object.remove(BODY_SHAPES_FIELD) {
        Some(JsonValue::Array(shapes)) => shapes,
        Some(other) => {
            return Err(Error::post_processing(format!(
                "'{path}.{BODY_SHAPES_FIELD}' is not a list: {other}"
            )))
        }
        None => {
            return Err(Error::post_processing(format!(
                "'{path}.{BODY_SHAPES_FIELD}' missing from row"
            )))
        }
    };

    let has = |tag: &str| shapes.iter().any(|s| s.as_str() == Some(tag));
    let male = has("BaseMale");
    let female = has("BaseFemale");
    object.insert(BODY_SHAPE_MALE.to_string(), JsonValue::Bool(male));
    object.insert(BODY_SHAPE_FEMALE.to_string(), JsonValue::Bool(female));
    Ok(())
}

/// Replace `<path>.bodyShapes` with `bodyShapeMale` / `bodyShapeFemale` flags
pub fn derive_body_shape_flags(row: &mut JsonObject, path: &str) -> Result<()> {
    match get_path_mut(row, path) {
        Some(JsonValue::Object(object)) => apply_body_shape_flags(object, path),
        Some(other) => Err(Error::post_processing(format!(
            "'{path}' is not an object: {other}"
        ))),
        None => Err(Error::post_processing(format!("'{path}' missing from row"))),
    }
}

/// Lenient variant for optional metadata: a missing object or a null
/// `bodyShapes` list leaves the row unchanged
pub fn derive_body_shape_flags_if_present(row: &mut JsonObject, path: &str) -> Result<()> {
    match get_path_mut(row, path) {
        Some(JsonValue::Object(object)) => match object.get(BODY_SHAPES_FIELD) {
            None | Some(JsonValue::Null) => Ok(()),
            Some(_) => apply_body_shape_flags(object, path),
        },
        _ => Ok(()),
    }
}

/// Ensure `path` holds an object, inserting `{}` when absent or null.
///
/// Returns true if an object was already there.
pub fn default_object(row: &mut JsonObject, path: &str) -> Result<bool> {
    let (parent, leaf) = parent_object_mut(row, path)?;
    match parent.get(leaf) {
        Some(JsonValue::Object(_)) => Ok(true),
        None | Some(JsonValue::Null) => {
            parent.insert(leaf.to_string(), JsonValue::Object(JsonObject::new()));
            Ok(false)
        }
        Some(other) => Err(Error::post_processing(format!(
            "'{path}' is not an object: {other}"
        ))),
    }
}

/// Copy a parent-supplied context value into the row
pub fn context_field(row: &mut JsonObject, ctx: &StreamContext, key: &str) -> Result<()> {
    let value = ctx
        .get(key)
        .ok_or_else(|| Error::post_processing(format!("context missing '{key}'")))?;
    row.insert(key.to_string(), value.clone());
    Ok(())
}

/// Double every backslash in a string field; non-strings are left alone
pub fn escape_backslashes(row: &mut JsonObject, path: &str) -> Result<()> {
    if let Some(JsonValue::String(s)) = get_path_mut(row, path) {
        if s.contains('\\') {
            *s = s.replace('\\', "\\\\");
        }
    }
    Ok(())
}

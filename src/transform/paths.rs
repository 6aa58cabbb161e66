//! Dotted-path access into JSON objects

use crate::error::{Error, Result};
use crate::types::{JsonObject, JsonValue};

/// Look up a dotted path, returning None when any segment is missing
pub fn get_path<'a>(row: &'a JsonObject, path: &str) -> Option<&'a JsonValue> {
    let mut segments = path.split('.');
    let mut current = row.get(segments.next()?)?;
    for segment in segments {
        current = current.as_object()?.get(segment)?;
    }
    Some(current)
}

/// Mutable lookup of a dotted path
pub fn get_path_mut<'a>(row: &'a mut JsonObject, path: &str) -> Option<&'a mut JsonValue> {
    let mut segments = path.split('.');
    let mut current = row.get_mut(segments.next()?)?;
    for segment in segments {
        current = current.as_object_mut()?.get_mut(segment)?;
    }
    Some(current)
}

/// Resolve the object that holds the last segment of `path`.
///
/// Every intermediate segment must exist and be an object.
pub fn parent_object_mut<'a, 'p>(
    row: &'a mut JsonObject,
    path: &'p str,
) -> Result<(&'a mut JsonObject, &'p str)> {
    let (parent, leaf) = match path.rsplit_once('.') {
        Some((parent, leaf)) => (Some(parent), leaf),
        None => (None, path),
    };

    let Some(parent) = parent else {
        return Ok((row, leaf));
    };

    match get_path_mut(row, parent) {
        Some(JsonValue::Object(map)) => Ok((map, leaf)),
        Some(other) => Err(Error::post_processing(format!(
            "'{parent}' is not an object: {other}"
        ))),
        None => Err(Error::post_processing(format!("'{parent}' missing from row"))),
    }
}

//! Stream schemas
//!
//! Each stream declares the shape of its post-processed records with a
//! [`StreamSchema`]. Records are validated before emission so upstream shape
//! drift is caught at the row that introduced it, and the same declaration
//! renders the JSON Schema carried by SCHEMA messages.

mod fields;
mod types;

pub use fields::{Field, FieldType, StreamSchema};
pub use types::{JsonSchema, JsonType, JsonTypeOrArray, SchemaProperty};

#[cfg(test)]
mod tests;

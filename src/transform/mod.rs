//! Row post-processing
//!
//! Pure helpers that per-stream post-process functions compose. Every helper
//! addresses fields by dotted path (`nft.wearable.bodyShapes`) and fails with
//! [`Error::PostProcessing`](crate::error::Error::PostProcessing) when an
//! expected field is absent or has the wrong shape, so upstream schema drift
//! aborts the stream instead of producing silently wrong rows.

mod helpers;
mod paths;

pub use helpers::{
    composite_row_id, context_field, default_object, derive_body_shape_flags,
    derive_body_shape_flags_if_present, escape_backslashes, flatten_pairs, to_bounded_integer,
    to_integer, to_integer_if_present, BODY_SHAPE_FEMALE, BODY_SHAPE_MALE,
    MAX_INTEGER_STRING_CHARS, ROW_ID_FIELD,
};
pub use paths::{get_path, get_path_mut, parent_object_mut};

//! Schema validation tests

use super::*;
use crate::error::Error;
use crate::types::JsonObject;
use serde_json::{json, Value};

fn obj(value: Value) -> JsonObject {
    value.as_object().cloned().unwrap()
}

fn parcel_schema() -> StreamSchema {
    StreamSchema::new(vec![
        Field::string("id").required(),
        Field::string("rowId").required(),
        Field::string("updatedAt"),
        Field::object(
            "parcel",
            vec![
                Field::integer("x"),
                Field::integer("y"),
                Field::object("estate", vec![Field::string("id")]),
            ],
        ),
        Field::strings("managers"),
        Field::boolean("isActive"),
    ])
}

#[test]
fn test_valid_record() {
    let record = obj(json!({
        "id": "0x1",
        "rowId": "0x1|10",
        "updatedAt": "10",
        "parcel": {"x": -10, "y": 4, "estate": null},
        "managers": ["0xa", "0xb"],
        "isActive": true
    }));
    parcel_schema().validate(&record).unwrap();
}

#[test]
fn test_optional_fields_may_be_absent_or_null() {
    let record = obj(json!({"id": "0x1", "rowId": "0x1|10", "updatedAt": null}));
    parcel_schema().validate(&record).unwrap();
}

#[test]
fn test_undeclared_fields_pass_through() {
    let record = obj(json!({"id": "0x1", "rowId": "r", "extra": {"a": 1}}));
    parcel_schema().validate(&record).unwrap();
}

#[test]
fn test_missing_required_field() {
    let record = obj(json!({"id": "0x1"}));
    let err = parcel_schema().validate(&record).unwrap_err();

    assert!(matches!(err, Error::SchemaValidation { .. }));
    assert!(err.to_string().contains("'rowId'"));
}

#[test]
fn test_null_required_field() {
    let record = obj(json!({"id": null, "rowId": "r"}));
    assert!(parcel_schema().validate(&record).is_err());
}

#[test]
fn test_type_mismatch_reports_path() {
    let record = obj(json!({
        "id": "0x1",
        "rowId": "r",
        "parcel": {"x": "-10", "y": 4}
    }));
    let err = parcel_schema().validate(&record).unwrap_err();
    assert!(err.to_string().contains("'parcel.x' expected integer, found string"));
}

#[test]
fn test_array_item_mismatch() {
    let record = obj(json!({"id": "0x1", "rowId": "r", "managers": ["0xa", 5]}));
    let err = parcel_schema().validate(&record).unwrap_err();
    assert!(err.to_string().contains("managers[1]"));
}

#[test]
fn test_wide_integer_accepted() {
    let schema = StreamSchema::new(vec![Field::integer("price")]);
    let wide: serde_json::Number = "1000000000000000000000000000000".parse().unwrap();
    let record = obj(json!({ "price": wide }));
    schema.validate(&record).unwrap();

    let record = obj(json!({"price": 1.5}));
    assert!(schema.validate(&record).is_err());
}

#[test]
fn test_to_json_schema() {
    let doc = parcel_schema().to_json_schema();

    assert_eq!(doc.required, vec!["id".to_string(), "rowId".to_string()]);
    assert!(doc.is_required("id"));
    assert!(!doc.is_required("updatedAt"));

    let id = doc.get_property("id").unwrap();
    assert!(!id.json_type.is_nullable());

    let updated = doc.get_property("updatedAt").unwrap();
    assert!(updated.json_type.is_nullable());
    assert_eq!(updated.json_type.primary_type(), Some(JsonType::String));

    let json = doc.to_json();
    assert_eq!(json["type"], "object");
    assert_eq!(json["properties"]["updatedAt"]["type"], json!(["string", "null"]));
    assert_eq!(
        json["properties"]["parcel"]["properties"]["x"]["type"],
        json!(["integer", "null"])
    );
    assert_eq!(json["properties"]["managers"]["items"]["type"], json!(["string", "null"]));
}

#[test]
fn test_field_lookup() {
    let schema = parcel_schema();
    assert_eq!(schema.fields().len(), 6);
    assert!(schema.field("parcel").is_some());
    assert!(schema.field("nope").is_none());
}

//! Collections and items
//!
//! The Ethereum streams read the Ethereum collections subgraph; the Polygon
//! streams in [`super::polygon`] reuse the same shapes.

use super::context::StreamContext;
use super::definition::{GraphQlVariables, RequestTemplate, StreamDefinition};
use crate::config::Endpoint;
use crate::error::Result;
use crate::pagination::PaginationStrategy;
use crate::schema::{Field, StreamSchema};
use crate::transform::{composite_row_id, to_bounded_integer, to_integer, to_integer_if_present};
use crate::types::JsonObject;

pub(super) fn collection_fields() -> Vec<Field> {
    vec![
        Field::string("id").required(),
        Field::string("rowId").required(),
        Field::string("owner"),
        Field::string("creator"),
        Field::string("name"),
        Field::string("symbol"),
        Field::boolean("isCompleted"),
        Field::boolean("isApproved"),
        Field::boolean("isEditable"),
        Field::strings("minters"),
        Field::strings("managers"),
        Field::string("urn"),
        Field::integer("itemsCount"),
        Field::string("createdAt"),
        Field::string("updatedAt"),
        Field::string("reviewedAt"),
    ]
}

pub(super) fn item_fields() -> Vec<Field> {
    vec![
        Field::string("id").required(),
        Field::string("rowId").required(),
        Field::object("collection", vec![Field::string("id")]),
        Field::string("blockchainId"),
        Field::string("creator"),
        Field::string("itemType"),
        Field::integer("totalSupply"),
        Field::integer("maxSupply"),
        Field::string("rarity"),
        Field::integer("available"),
        Field::integer("price"),
        Field::string("beneficiary"),
        Field::string("contentHash"),
        Field::string("URI"),
        Field::string("image"),
        Field::strings("minters"),
        Field::strings("managers"),
        Field::string("urn"),
        Field::string("createdAt"),
        Field::string("updatedAt"),
        Field::string("creationFee"),
    ]
}

pub(super) fn collections_schema() -> StreamSchema {
    StreamSchema::new(collection_fields())
}

pub(super) fn items_schema() -> StreamSchema {
    StreamSchema::new(item_fields())
}

fn ethereum_collections_schema() -> StreamSchema {
    let mut fields = collection_fields();
    fields.push(Field::boolean("searchIsStoreMinter"));
    fields.push(Field::string("searchText"));
    StreamSchema::new(fields)
}

fn unique_items_schema() -> StreamSchema {
    let shape = |extra: Vec<Field>| {
        let mut fields = vec![
            Field::strings("bodyShapes"),
            Field::string("category"),
            Field::string("description"),
        ];
        fields.extend(extra);
        fields.push(Field::string("name"));
        fields
    };

    let mut fields = item_fields();
    fields.extend([
        Field::integer("uniqueCollectorsTotal"),
        Field::string("firstListedAt"),
        Field::string("volume"),
        Field::object(
            "metadata",
            vec![
                Field::object("wearable", shape(Vec::new())),
                Field::object(
                    "emote",
                    shape(vec![
                        Field::boolean("hasGeometry"),
                        Field::boolean("hasSound"),
                        Field::boolean("loop"),
                    ]),
                ),
            ],
        ),
    ]);
    StreamSchema::new(fields)
}

/// `id|updatedAt` row id
pub(super) fn snapshot_row(mut row: JsonObject, _ctx: &StreamContext) -> Result<JsonObject> {
    composite_row_id(&mut row, &["id", "updatedAt"])?;
    Ok(row)
}

/// Supply counters become integers; an oversized price is nulled
pub(super) fn item_row(mut row: JsonObject, ctx: &StreamContext) -> Result<JsonObject> {
    row = snapshot_row(row, ctx)?;
    to_integer(&mut row, "totalSupply")?;
    to_integer(&mut row, "maxSupply")?;
    to_integer(&mut row, "available")?;
    to_bounded_integer(&mut row, "price")?;
    Ok(row)
}

fn unique_item_row(row: JsonObject, ctx: &StreamContext) -> Result<JsonObject> {
    let mut row = item_row(row, ctx)?;
    to_integer_if_present(&mut row, "uniqueCollectorsTotal")?;
    Ok(row)
}

const ITEMS_QUERY: &str = r#"
query ($updatedAt: Int!) {
    items(first: 1000, orderBy: updatedAt, orderDirection: asc,
          where: {updatedAt_gte: $updatedAt}) {
        id collection { id } blockchainId creator itemType totalSupply maxSupply rarity
        available price beneficiary contentHash URI image minters managers urn
        createdAt updatedAt creationFee
    }
}
"#;

const COLLECTIONS_QUERY: &str = r#"
query ($updatedAt: Int!) {
    collections(first: 1000, orderBy: updatedAt, orderDirection: asc,
                where: {updatedAt_gte: $updatedAt}) {
        id owner creator name symbol isCompleted isApproved isEditable minters managers
        urn itemsCount createdAt updatedAt reviewedAt searchIsStoreMinter searchText
    }
}
"#;

const UNIQUE_ITEMS_QUERY: &str = r#"
query ($updatedAt: Int!) {
    items(first: 1000, orderBy: updatedAt, orderDirection: asc,
          where: {updatedAt_gte: $updatedAt}) {
        id collection { id } blockchainId creator itemType totalSupply maxSupply rarity
        available price beneficiary contentHash URI image minters managers urn
        createdAt updatedAt creationFee uniqueCollectorsTotal firstListedAt volume
        metadata {
            wearable { bodyShapes category description name }
            emote { bodyShapes category description hasGeometry hasSound loop name }
        }
    }
}
"#;

pub static ITEMS_ETHEREUM: StreamDefinition = StreamDefinition {
    name: "items_ethereum",
    endpoint: Endpoint::EthCollections,
    request: RequestTemplate::GraphQl {
        query: ITEMS_QUERY,
        variables: GraphQlVariables::Token("updatedAt"),
    },
    records_path: "data.items",
    pagination: PaginationStrategy::timestamp("updatedAt"),
    primary_keys: &["rowId"],
    dedupe: true,
    schema: items_schema,
    post_process: item_row,
    child: None,
};

pub static COLLECTIONS_ETHEREUM: StreamDefinition = StreamDefinition {
    name: "collections_ethereum",
    endpoint: Endpoint::EthCollections,
    request: RequestTemplate::GraphQl {
        query: COLLECTIONS_QUERY,
        variables: GraphQlVariables::Token("updatedAt"),
    },
    records_path: "data.collections",
    pagination: PaginationStrategy::timestamp("updatedAt"),
    primary_keys: &["rowId"],
    dedupe: true,
    schema: ethereum_collections_schema,
    post_process: snapshot_row,
    child: None,
};

/// Latest state per item, keyed by id alone
pub static ITEMS_ETHEREUM_UNIQUE: StreamDefinition = StreamDefinition {
    name: "items_ethereum_unique",
    endpoint: Endpoint::EthCollections,
    request: RequestTemplate::GraphQl {
        query: UNIQUE_ITEMS_QUERY,
        variables: GraphQlVariables::Token("updatedAt"),
    },
    records_path: "data.items",
    pagination: PaginationStrategy::timestamp("updatedAt"),
    primary_keys: &["id"],
    dedupe: true,
    schema: unique_items_schema,
    post_process: unique_item_row,
    child: None,
};

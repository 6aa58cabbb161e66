//! Sold marketplace orders on Ethereum

use super::context::StreamContext;
use super::definition::{
    passthrough, GraphQlVariables, PostProcessFn, RequestTemplate, StreamDefinition,
};
use super::snapshots::ORDERS_ESTATES_LINK;
use crate::config::Endpoint;
use crate::error::Result;
use crate::pagination::PaginationStrategy;
use crate::schema::{Field, StreamSchema};
use crate::transform::{derive_body_shape_flags, to_integer};
use crate::types::JsonObject;

/// Columns shared by every order stream, with the category-specific `nft`
/// fields appended
pub(super) fn order_fields(nft: Vec<Field>) -> Vec<Field> {
    let mut nft_fields = vec![
        Field::string("id"),
        Field::string("tokenId"),
        Field::string("contractAddress"),
    ];
    nft_fields.extend(nft);

    vec![
        Field::string("id").required(),
        Field::string("owner"),
        Field::string("price"),
        Field::string("txHash"),
        Field::string("buyer"),
        Field::string("blockNumber"),
        Field::string("updatedAt"),
        Field::object("nft", nft_fields),
    ]
}

pub(super) fn wearable_fields() -> Vec<Field> {
    vec![
        Field::string("name"),
        Field::string("representationId"),
        Field::string("collection"),
        Field::string("rarity"),
        Field::string("description"),
        Field::boolean("bodyShapeMale"),
        Field::boolean("bodyShapeFemale"),
    ]
}

pub(super) fn ens_fields() -> Vec<Field> {
    vec![
        Field::string("id"),
        Field::string("tokenId"),
        Field::string("caller"),
        Field::string("beneficiary"),
        Field::string("labelHash"),
        Field::string("subdomain"),
        Field::string("createdAt"),
    ]
}

pub(super) fn parcel_fields() -> Vec<Field> {
    vec![Field::integer("x"), Field::integer("y")]
}

pub(super) fn wearable_nft(mut row: JsonObject, _ctx: &StreamContext) -> Result<JsonObject> {
    derive_body_shape_flags(&mut row, "nft.wearable")?;
    Ok(row)
}

pub(super) fn parcel_nft(mut row: JsonObject, _ctx: &StreamContext) -> Result<JsonObject> {
    to_integer(&mut row, "nft.parcel.x")?;
    to_integer(&mut row, "nft.parcel.y")?;
    Ok(row)
}

fn wearables_schema() -> StreamSchema {
    StreamSchema::new(order_fields(vec![Field::object("wearable", wearable_fields())]))
}

fn parcels_schema() -> StreamSchema {
    StreamSchema::new(order_fields(vec![Field::object("parcel", parcel_fields())]))
}

fn estates_schema() -> StreamSchema {
    StreamSchema::new(order_fields(Vec::new()))
}

fn names_schema() -> StreamSchema {
    StreamSchema::new(order_fields(vec![Field::object("ens", ens_fields())]))
}

// ============================================================================
// Definitions
// ============================================================================

const WEARABLES_QUERY: &str = r#"
query ($updatedAt: Int!) {
    orders(first: 1000, orderBy: updatedAt, orderDirection: asc,
           where: {category: wearable, status: sold, updatedAt_gte: $updatedAt}) {
        id owner price txHash buyer blockNumber updatedAt
        nft {
            id tokenId contractAddress
            wearable { name representationId collection rarity description bodyShapes }
        }
    }
}
"#;

const PARCELS_QUERY: &str = r#"
query ($updatedAt: Int!) {
    orders(first: 1000, orderBy: updatedAt, orderDirection: asc,
           where: {category: parcel, status: sold, updatedAt_gte: $updatedAt}) {
        id owner price txHash buyer blockNumber updatedAt
        nft { id tokenId contractAddress parcel { x y } }
    }
}
"#;

const ESTATES_QUERY: &str = r#"
query ($updatedAt: Int!) {
    orders(first: 1000, orderBy: updatedAt, orderDirection: asc,
           where: {category: estate, status: sold, updatedAt_gte: $updatedAt}) {
        id owner price txHash buyer blockNumber updatedAt
        nft { id tokenId contractAddress }
    }
}
"#;

const NAMES_QUERY: &str = r#"
query ($updatedAt: Int!) {
    orders(first: 1000, orderBy: updatedAt, orderDirection: asc,
           where: {category: ens, status: sold, updatedAt_gte: $updatedAt}) {
        id owner price txHash buyer blockNumber updatedAt
        nft {
            id tokenId contractAddress
            ens { id tokenId caller beneficiary labelHash subdomain createdAt }
        }
    }
}
"#;

const fn marketplace_orders(
    name: &'static str,
    query: &'static str,
    schema: fn() -> StreamSchema,
    post_process: PostProcessFn,
) -> StreamDefinition {
    StreamDefinition {
        name,
        endpoint: Endpoint::Marketplace,
        request: RequestTemplate::GraphQl {
            query,
            variables: GraphQlVariables::Token("updatedAt"),
        },
        records_path: "data.orders",
        pagination: PaginationStrategy::timestamp("updatedAt"),
        primary_keys: &["id"],
        dedupe: true,
        schema,
        post_process,
        child: None,
    }
}

pub static ORDERS_WEARABLES: StreamDefinition = marketplace_orders(
    "orders_wearables",
    WEARABLES_QUERY,
    wearables_schema,
    wearable_nft,
);

pub static ORDERS_PARCELS: StreamDefinition = marketplace_orders(
    "orders_parcels",
    PARCELS_QUERY,
    parcels_schema,
    parcel_nft,
);

pub static ORDERS_ESTATES: StreamDefinition = StreamDefinition {
    child: Some(&ORDERS_ESTATES_LINK),
    ..marketplace_orders(
        "orders_estates",
        ESTATES_QUERY,
        estates_schema,
        passthrough,
    )
};

pub static ORDERS_NAMES: StreamDefinition = marketplace_orders(
    "orders_names",
    NAMES_QUERY,
    names_schema,
    passthrough,
);

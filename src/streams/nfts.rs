//! NFT snapshots on the Ethereum marketplace subgraph
//!
//! An NFT's id repeats every time it changes, so each row is keyed by
//! `id|updatedAt`.

use super::context::StreamContext;
use super::definition::{GraphQlVariables, PostProcessFn, RequestTemplate, StreamDefinition};
use crate::config::Endpoint;
use crate::error::Result;
use crate::pagination::PaginationStrategy;
use crate::schema::{Field, StreamSchema};
use crate::transform::{
    composite_row_id, derive_body_shape_flags, escape_backslashes, flatten_pairs, to_integer,
};
use crate::types::JsonObject;

fn nft_fields(category: Field) -> Vec<Field> {
    vec![
        Field::string("id").required(),
        Field::string("rowId").required(),
        Field::string("tokenId"),
        Field::object("owner", vec![Field::string("id")]),
        Field::string("tokenURI"),
        Field::string("name"),
        Field::string("image"),
        Field::string("createdAt"),
        Field::string("updatedAt"),
        category,
    ]
}

fn wearables_schema() -> StreamSchema {
    StreamSchema::new(nft_fields(Field::object(
        "wearable",
        vec![
            Field::string("name"),
            Field::string("representationId"),
            Field::string("category"),
            Field::string("collection"),
            Field::string("rarity"),
            Field::string("description"),
            Field::boolean("bodyShapeMale"),
            Field::boolean("bodyShapeFemale"),
        ],
    )))
}

fn names_schema() -> StreamSchema {
    StreamSchema::new(nft_fields(Field::object(
        "ens",
        vec![
            Field::string("caller"),
            Field::string("beneficiary"),
            Field::string("labelHash"),
            Field::string("subdomain"),
        ],
    )))
}

fn parcels_schema() -> StreamSchema {
    StreamSchema::new(nft_fields(Field::object(
        "parcel",
        vec![
            Field::integer("x"),
            Field::integer("y"),
            Field::object("estate", vec![Field::string("id")]),
        ],
    )))
}

fn estates_schema() -> StreamSchema {
    StreamSchema::new(nft_fields(Field::object(
        "estate",
        vec![Field::integer("size"), Field::string("parcels")],
    )))
}

fn row_id(row: &mut JsonObject) -> Result<()> {
    composite_row_id(row, &["id", "updatedAt"])
}

fn wearables(mut row: JsonObject, _ctx: &StreamContext) -> Result<JsonObject> {
    derive_body_shape_flags(&mut row, "wearable")?;
    row_id(&mut row)?;
    Ok(row)
}

fn names(mut row: JsonObject, _ctx: &StreamContext) -> Result<JsonObject> {
    row_id(&mut row)?;
    Ok(row)
}

fn parcels(mut row: JsonObject, _ctx: &StreamContext) -> Result<JsonObject> {
    row_id(&mut row)?;
    to_integer(&mut row, "parcel.x")?;
    to_integer(&mut row, "parcel.y")?;
    escape_backslashes(&mut row, "name")?;
    Ok(row)
}

fn estates(mut row: JsonObject, _ctx: &StreamContext) -> Result<JsonObject> {
    row_id(&mut row)?;
    flatten_pairs(&mut row, "estate.parcels", "x", "y")?;
    escape_backslashes(&mut row, "name")?;
    Ok(row)
}

const WEARABLES_QUERY: &str = r#"
query ($updatedAt: Int!) {
    nfts(first: 1000, orderBy: updatedAt, orderDirection: asc,
         where: {category: wearable, updatedAt_gte: $updatedAt}) {
        id tokenId owner { id } tokenURI name image createdAt updatedAt
        wearable { representationId collection name description category rarity bodyShapes }
    }
}
"#;

const NAMES_QUERY: &str = r#"
query ($updatedAt: Int!) {
    nfts(first: 1000, orderBy: updatedAt, orderDirection: asc,
         where: {category: ens, updatedAt_gte: $updatedAt}) {
        id tokenId owner { id } tokenURI name image createdAt updatedAt
        ens { caller beneficiary labelHash subdomain }
    }
}
"#;

const PARCELS_QUERY: &str = r#"
query ($updatedAt: Int!) {
    nfts(first: 1000, orderBy: updatedAt, orderDirection: asc,
         where: {category: parcel, updatedAt_gte: $updatedAt}) {
        id tokenId owner { id } tokenURI name image createdAt updatedAt
        parcel { x y estate { id } }
    }
}
"#;

const ESTATES_QUERY: &str = r#"
query ($updatedAt: Int!) {
    nfts(first: 1000, orderBy: updatedAt, orderDirection: asc,
         where: {category: estate, updatedAt_gte: $updatedAt}) {
        id tokenId owner { id } tokenURI name image createdAt updatedAt
        estate { size parcels { x y } }
    }
}
"#;

const fn marketplace_nfts(
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
        records_path: "data.nfts",
        pagination: PaginationStrategy::timestamp("updatedAt"),
        primary_keys: &["rowId"],
        dedupe: true,
        schema,
        post_process,
        child: None,
    }
}

pub static NFTS_WEARABLES: StreamDefinition =
    marketplace_nfts("nfts_wearables", WEARABLES_QUERY, wearables_schema, wearables);

pub static NFTS_NAMES: StreamDefinition =
    marketplace_nfts("nfts_names", NAMES_QUERY, names_schema, names);

pub static NFTS_PARCELS: StreamDefinition =
    marketplace_nfts("nfts_parcels", PARCELS_QUERY, parcels_schema, parcels);

pub static NFTS_ESTATES: StreamDefinition =
    marketplace_nfts("nfts_estates", ESTATES_QUERY, estates_schema, estates);

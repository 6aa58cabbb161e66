//! Streams on the Polygon collections subgraph

use super::collections::{collections_schema, item_row, items_schema, snapshot_row};
use super::context::StreamContext;
use super::definition::{GraphQlVariables, RequestTemplate, StreamDefinition};
use crate::config::Endpoint;
use crate::error::Result;
use crate::pagination::PaginationStrategy;
use crate::schema::{Field, StreamSchema};
use crate::transform::{
    composite_row_id, default_object, derive_body_shape_flags,
    derive_body_shape_flags_if_present, to_integer,
};
use crate::types::JsonObject;

fn metadata_entry_fields(with_category: bool) -> Vec<Field> {
    let mut fields = vec![Field::string("id"), Field::string("name")];
    if with_category {
        fields.push(Field::string("category"));
    }
    fields.extend([
        Field::string("collection"),
        Field::string("rarity"),
        Field::string("description"),
        Field::boolean("bodyShapeMale"),
        Field::boolean("bodyShapeFemale"),
    ]);
    fields
}

fn metadata_field() -> Field {
    Field::object(
        "metadata",
        vec![
            Field::string("itemType"),
            Field::object("wearable", metadata_entry_fields(true)),
            Field::object("emote", metadata_entry_fields(true)),
        ],
    )
}

fn nfts_wearables_schema() -> StreamSchema {
    StreamSchema::new(vec![
        Field::string("id").required(),
        Field::string("rowId").required(),
        Field::string("tokenId"),
        Field::object("owner", vec![Field::string("id")]),
        Field::string("tokenURI"),
        Field::string("image"),
        Field::string("createdAt"),
        Field::string("updatedAt"),
        metadata_field(),
    ])
}

fn orders_wearables_schema() -> StreamSchema {
    StreamSchema::new(vec![
        Field::string("id").required(),
        Field::string("owner"),
        Field::string("price"),
        Field::string("txHash"),
        Field::string("buyer"),
        Field::string("blockNumber"),
        Field::string("updatedAt"),
        Field::object(
            "nft",
            vec![
                Field::string("id"),
                Field::string("tokenId"),
                Field::string("contractAddress"),
                Field::object(
                    "metadata",
                    vec![Field::object("wearable", metadata_entry_fields(false))],
                ),
            ],
        ),
    ])
}

fn bids_wearables_schema() -> StreamSchema {
    StreamSchema::new(vec![
        Field::string("id").required(),
        Field::string("seller"),
        Field::string("price"),
        Field::string("bidder"),
        Field::string("blockNumber"),
        Field::string("updatedAt"),
        Field::object(
            "nft",
            vec![
                Field::string("id"),
                Field::string("tokenId"),
                Field::string("contractAddress"),
                metadata_field(),
            ],
        ),
    ])
}

fn primary_sales_schema() -> StreamSchema {
    StreamSchema::new(vec![
        Field::string("id").required(),
        Field::string("beneficiary"),
        Field::string("minter"),
        Field::string("timestamp"),
        Field::string("searchPrimarySalePrice"),
        Field::string("searchContractAddress"),
        Field::string("searchItemId"),
        Field::string("searchTokenId"),
        Field::integer("searchIssuedId"),
        Field::boolean("searchIsStoreMinter"),
    ])
}

fn mints_schema() -> StreamSchema {
    StreamSchema::new(vec![
        Field::string("rowId").required(),
        Field::string("id").required(),
        Field::string("creator"),
        Field::string("beneficiary"),
        Field::string("minter"),
        Field::string("timestamp"),
        Field::object(
            "item",
            vec![
                Field::string("id"),
                Field::string("creator"),
                Field::string("itemType"),
                Field::string("available"),
                Field::string("totalSupply"),
                Field::string("maxSupply"),
                Field::string("rarity"),
                Field::string("creationFee"),
                Field::string("image"),
                Field::string("createdAt"),
                Field::string("reviewedAt"),
                Field::boolean("searchIsCollectionApproved"),
            ],
        ),
    ])
}

/// A missing or null wearable/emote becomes `{}`; present ones get body
/// shape flags when they carry a `bodyShapes` list
fn optional_metadata_flags(row: &mut JsonObject, metadata: &str) -> Result<()> {
    for entry in ["wearable", "emote"] {
        let path = format!("{metadata}.{entry}");
        if default_object(row, &path)? {
            derive_body_shape_flags_if_present(row, &path)?;
        }
    }
    Ok(())
}

fn nft_wearable_row(mut row: JsonObject, _ctx: &StreamContext) -> Result<JsonObject> {
    optional_metadata_flags(&mut row, "metadata")?;
    composite_row_id(&mut row, &["id", "updatedAt"])?;
    Ok(row)
}

fn order_wearable_row(mut row: JsonObject, _ctx: &StreamContext) -> Result<JsonObject> {
    derive_body_shape_flags(&mut row, "nft.metadata.wearable")?;
    Ok(row)
}

fn bid_wearable_row(mut row: JsonObject, _ctx: &StreamContext) -> Result<JsonObject> {
    optional_metadata_flags(&mut row, "nft.metadata")?;
    Ok(row)
}

fn primary_sale_row(mut row: JsonObject, _ctx: &StreamContext) -> Result<JsonObject> {
    to_integer(&mut row, "searchIssuedId")?;
    Ok(row)
}

fn mint_row(mut row: JsonObject, _ctx: &StreamContext) -> Result<JsonObject> {
    composite_row_id(&mut row, &["id", "timestamp"])?;
    Ok(row)
}

// ============================================================================
// Queries
// ============================================================================

const COLLECTIONS_QUERY: &str = r#"
query ($updatedAt: Int!) {
    collections(first: 1000, orderBy: updatedAt, orderDirection: asc,
                where: {updatedAt_gte: $updatedAt}) {
        id owner creator name symbol isCompleted isApproved isEditable minters managers
        urn itemsCount createdAt updatedAt reviewedAt
    }
}
"#;

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

const NFTS_WEARABLES_QUERY: &str = r#"
query ($updatedAt: Int!) {
    nfts(first: 1000, orderBy: updatedAt, orderDirection: asc,
         where: {updatedAt_gte: $updatedAt}) {
        id tokenId owner { id } tokenURI image createdAt updatedAt
        metadata {
            itemType
            wearable { id collection name description category rarity bodyShapes }
            emote { id name description collection category rarity bodyShapes }
        }
    }
}
"#;

const ORDERS_WEARABLES_QUERY: &str = r#"
query ($updatedAt: Int!) {
    orders(first: 1000, orderBy: updatedAt, orderDirection: asc,
           where: {status: sold, updatedAt_gte: $updatedAt}) {
        id owner price txHash buyer blockNumber updatedAt
        nft {
            id tokenId contractAddress
            metadata { wearable { id name collection rarity description bodyShapes } }
        }
    }
}
"#;

const BIDS_WEARABLES_QUERY: &str = r#"
query ($updatedAt: Int!) {
    bids(first: 1000, orderBy: updatedAt, orderDirection: asc,
         where: {status: sold, updatedAt_gte: $updatedAt}) {
        id seller price bidder blockNumber updatedAt
        nft {
            id tokenId contractAddress
            metadata {
                itemType
                wearable { id name description collection category rarity bodyShapes }
                emote { id name description collection category rarity bodyShapes }
            }
        }
    }
}
"#;

const PRIMARY_SALES_QUERY: &str = r#"
query ($timestamp: Int!) {
    mints(first: 1000, orderBy: timestamp, orderDirection: asc,
          where: {timestamp_gte: $timestamp}) {
        id beneficiary minter timestamp searchPrimarySalePrice searchContractAddress
        searchItemId searchTokenId searchIssuedId searchIsStoreMinter
    }
}
"#;

const MINTS_QUERY: &str = r#"
query ($updatedAt: Int!) {
    mints(first: 1000, orderBy: timestamp, orderDirection: asc,
          where: {timestamp_gte: $updatedAt}) {
        id
        item {
            id creator itemType available totalSupply maxSupply rarity creationFee image
            createdAt reviewedAt searchIsCollectionApproved
        }
        creator beneficiary minter timestamp
    }
}
"#;

// ============================================================================
// Definitions
// ============================================================================

pub static COLLECTIONS_POLYGON: StreamDefinition = StreamDefinition {
    name: "collections_polygon",
    endpoint: Endpoint::Polygon,
    request: RequestTemplate::GraphQl {
        query: COLLECTIONS_QUERY,
        variables: GraphQlVariables::Token("updatedAt"),
    },
    records_path: "data.collections",
    pagination: PaginationStrategy::timestamp("updatedAt"),
    primary_keys: &["rowId"],
    dedupe: true,
    schema: collections_schema,
    post_process: snapshot_row,
    child: None,
};

pub static ITEMS_POLYGON: StreamDefinition = StreamDefinition {
    name: "items_polygon",
    endpoint: Endpoint::Polygon,
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

pub static NFTS_WEARABLES_POLYGON: StreamDefinition = StreamDefinition {
    name: "nfts_wearables_polygon",
    endpoint: Endpoint::Polygon,
    request: RequestTemplate::GraphQl {
        query: NFTS_WEARABLES_QUERY,
        variables: GraphQlVariables::Token("updatedAt"),
    },
    records_path: "data.nfts",
    pagination: PaginationStrategy::timestamp("updatedAt"),
    primary_keys: &["rowId"],
    dedupe: true,
    schema: nfts_wearables_schema,
    post_process: nft_wearable_row,
    child: None,
};

pub static ORDERS_POLYGON_WEARABLES: StreamDefinition = StreamDefinition {
    name: "orders_polygon_wearables",
    endpoint: Endpoint::Polygon,
    request: RequestTemplate::GraphQl {
        query: ORDERS_WEARABLES_QUERY,
        variables: GraphQlVariables::Token("updatedAt"),
    },
    records_path: "data.orders",
    pagination: PaginationStrategy::timestamp("updatedAt"),
    primary_keys: &["id"],
    dedupe: true,
    schema: orders_wearables_schema,
    post_process: order_wearable_row,
    child: None,
};

pub static BIDS_POLYGON_WEARABLES: StreamDefinition = StreamDefinition {
    name: "bids_polygon_wearables",
    endpoint: Endpoint::Polygon,
    request: RequestTemplate::GraphQl {
        query: BIDS_WEARABLES_QUERY,
        variables: GraphQlVariables::Token("updatedAt"),
    },
    records_path: "data.bids",
    pagination: PaginationStrategy::timestamp("updatedAt"),
    primary_keys: &["id"],
    dedupe: true,
    schema: bids_wearables_schema,
    post_process: bid_wearable_row,
    child: None,
};

pub static PRIMARY_SALES_POLYGON_WEARABLES: StreamDefinition = StreamDefinition {
    name: "primary_sales_polygon_wearables",
    endpoint: Endpoint::Polygon,
    request: RequestTemplate::GraphQl {
        query: PRIMARY_SALES_QUERY,
        variables: GraphQlVariables::Token("timestamp"),
    },
    records_path: "data.mints",
    pagination: PaginationStrategy::timestamp("timestamp"),
    primary_keys: &["id"],
    dedupe: true,
    schema: primary_sales_schema,
    post_process: primary_sale_row,
    child: None,
};

pub static NFTS_MINTS_POLYGON: StreamDefinition = StreamDefinition {
    name: "nfts_mints_polygon",
    endpoint: Endpoint::Polygon,
    request: RequestTemplate::GraphQl {
        query: MINTS_QUERY,
        variables: GraphQlVariables::Token("updatedAt"),
    },
    records_path: "data.mints",
    pagination: PaginationStrategy::timestamp("timestamp"),
    primary_keys: &["rowId"],
    dedupe: true,
    schema: mints_schema,
    post_process: mint_row,
    child: None,
};

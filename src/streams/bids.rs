//! Accepted bids on Ethereum

use super::definition::{
    passthrough, GraphQlVariables, PostProcessFn, RequestTemplate, StreamDefinition,
};
use super::orders::{ens_fields, parcel_fields, parcel_nft, wearable_fields, wearable_nft};
use super::snapshots::BIDS_ESTATES_LINK;
use crate::config::Endpoint;
use crate::pagination::PaginationStrategy;
use crate::schema::{Field, StreamSchema};

pub(super) fn bid_fields(nft: Vec<Field>) -> Vec<Field> {
    let mut nft_fields = vec![
        Field::string("id"),
        Field::string("tokenId"),
        Field::string("contractAddress"),
    ];
    nft_fields.extend(nft);

    vec![
        Field::string("id").required(),
        Field::string("seller"),
        Field::string("price"),
        Field::string("bidder"),
        Field::string("blockNumber"),
        Field::string("updatedAt"),
        Field::object("nft", nft_fields),
    ]
}

fn wearables_schema() -> StreamSchema {
    StreamSchema::new(bid_fields(vec![Field::object("wearable", wearable_fields())]))
}

fn parcels_schema() -> StreamSchema {
    StreamSchema::new(bid_fields(vec![Field::object("parcel", parcel_fields())]))
}

fn estates_schema() -> StreamSchema {
    StreamSchema::new(bid_fields(Vec::new()))
}

fn names_schema() -> StreamSchema {
    StreamSchema::new(bid_fields(vec![Field::object("ens", ens_fields())]))
}

const WEARABLES_QUERY: &str = r#"
query ($updatedAt: Int!) {
    bids(first: 1000, orderBy: updatedAt, orderDirection: asc,
         where: {category: wearable, status: sold, updatedAt_gte: $updatedAt}) {
        id seller price bidder blockNumber updatedAt
        nft {
            id tokenId contractAddress
            wearable { name representationId collection rarity description bodyShapes }
        }
    }
}
"#;

const PARCELS_QUERY: &str = r#"
query ($updatedAt: Int!) {
    bids(first: 1000, orderBy: updatedAt, orderDirection: asc,
         where: {category: parcel, status: sold, updatedAt_gte: $updatedAt}) {
        id seller price bidder blockNumber updatedAt
        nft { id tokenId contractAddress parcel { x y } }
    }
}
"#;

const ESTATES_QUERY: &str = r#"
query ($updatedAt: Int!) {
    bids(first: 1000, orderBy: updatedAt, orderDirection: asc,
         where: {category: estate, status: sold, updatedAt_gte: $updatedAt}) {
        id seller price bidder blockNumber updatedAt
        nft { id tokenId contractAddress }
    }
}
"#;

const NAMES_QUERY: &str = r#"
query ($updatedAt: Int!) {
    bids(first: 1000, orderBy: updatedAt, orderDirection: asc,
         where: {category: ens, status: sold, updatedAt_gte: $updatedAt}) {
        id seller price bidder blockNumber updatedAt
        nft {
            id tokenId contractAddress
            ens { id tokenId caller beneficiary labelHash subdomain createdAt }
        }
    }
}
"#;

const fn marketplace_bids(
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
        records_path: "data.bids",
        pagination: PaginationStrategy::timestamp("updatedAt"),
        primary_keys: &["id"],
        dedupe: true,
        schema,
        post_process,
        child: None,
    }
}

pub static BIDS_WEARABLES: StreamDefinition =
    marketplace_bids("bids_wearables", WEARABLES_QUERY, wearables_schema, wearable_nft);

pub static BIDS_PARCELS: StreamDefinition =
    marketplace_bids("bids_parcels", PARCELS_QUERY, parcels_schema, parcel_nft);

pub static BIDS_ESTATES: StreamDefinition = StreamDefinition {
    child: Some(&BIDS_ESTATES_LINK),
    ..marketplace_bids("bids_estates", ESTATES_QUERY, estates_schema, passthrough)
};

pub static BIDS_NAMES: StreamDefinition =
    marketplace_bids("bids_names", NAMES_QUERY, names_schema, passthrough);

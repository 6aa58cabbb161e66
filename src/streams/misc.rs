//! Rentals, DAO earnings and POAP events

use super::context::StreamContext;
use super::definition::{passthrough, GraphQlVariables, RequestTemplate, StreamDefinition};
use crate::config::Endpoint;
use crate::error::Result;
use crate::pagination::PaginationStrategy;
use crate::schema::{Field, StreamSchema};
use crate::transform::to_integer_if_present;
use crate::types::JsonObject;

fn rentals_schema() -> StreamSchema {
    StreamSchema::new(vec![
        Field::string("id").required(),
        Field::string("contractAddress"),
        Field::string("rentalContractAddress"),
        Field::string("tokenId"),
        Field::string("lessor"),
        Field::string("tenant"),
        Field::string("operator"),
        Field::integer("rentalDays"),
        // Unix seconds
        Field::integer("startedAt"),
        Field::integer("endsAt"),
        Field::string("updatedAt"),
        Field::string("pricePerDay"),
        Field::string("sender"),
        Field::boolean("ownerHasClaimedAsset"),
        Field::boolean("isExtension"),
        // Latest executed rental for the NFT
        Field::boolean("isActive"),
    ])
}

fn dao_earnings_schema() -> StreamSchema {
    StreamSchema::new(vec![
        Field::string("id").required(),
        Field::string("daoEarnings"),
        Field::integer("date"),
        Field::string("volume"),
        Field::integer("sales"),
    ])
}

fn poaps_schema() -> StreamSchema {
    StreamSchema::new(vec![
        Field::string("id").required(),
        Field::string("tokenCount"),
        Field::string("transferCount"),
        Field::string("created"),
    ])
}

fn rental_row(mut row: JsonObject, _ctx: &StreamContext) -> Result<JsonObject> {
    for field in ["rentalDays", "startedAt", "endsAt"] {
        to_integer_if_present(&mut row, field)?;
    }
    Ok(row)
}

const RENTALS_QUERY: &str = r#"
query ($updatedAt: Int!) {
    rentals(first: 1000, orderBy: updatedAt, orderDirection: asc,
            where: {updatedAt_gte: $updatedAt}) {
        id contractAddress tokenId lessor tenant operator rentalDays startedAt endsAt
        updatedAt pricePerDay sender ownerHasClaimedAsset isExtension isActive
        rentalContractAddress
    }
}
"#;

// Strict `date_gt`: one row per day, so no boundary rows to re-read
const DAO_EARNINGS_QUERY: &str = r#"
query ($updatedAt: Int!) {
    analyticsDayDatas(orderBy: id, orderDirection: asc,
                      where: {daoEarnings_gt: "0", date_gt: $updatedAt}) {
        id daoEarnings date volume sales
    }
}
"#;

const POAPS_QUERY: &str = r#"
query ($updatedAt: Int!) {
    events(first: 1000, orderBy: created, orderDirection: asc,
           where: {created_gte: $updatedAt}) {
        id tokenCount transferCount created
    }
}
"#;

pub static RENTALS: StreamDefinition = StreamDefinition {
    name: "rentals",
    endpoint: Endpoint::Rentals,
    request: RequestTemplate::GraphQl {
        query: RENTALS_QUERY,
        variables: GraphQlVariables::Token("updatedAt"),
    },
    records_path: "data.rentals",
    pagination: PaginationStrategy::timestamp("updatedAt"),
    primary_keys: &["id"],
    dedupe: true,
    schema: rentals_schema,
    post_process: rental_row,
    child: None,
};

pub static DAO_EARNINGS: StreamDefinition = StreamDefinition {
    name: "dao_earnings",
    endpoint: Endpoint::Marketplace,
    request: RequestTemplate::GraphQl {
        query: DAO_EARNINGS_QUERY,
        variables: GraphQlVariables::Token("updatedAt"),
    },
    records_path: "data.analyticsDayDatas",
    pagination: PaginationStrategy::timestamp("date"),
    primary_keys: &["id"],
    dedupe: true,
    schema: dao_earnings_schema,
    post_process: passthrough,
    child: None,
};

pub static POAPS_XDAI: StreamDefinition = StreamDefinition {
    name: "poaps_xdai",
    endpoint: Endpoint::PoapsXdai,
    request: RequestTemplate::GraphQl {
        query: POAPS_QUERY,
        variables: GraphQlVariables::Token("updatedAt"),
    },
    records_path: "data.events",
    pagination: PaginationStrategy::timestamp("created"),
    primary_keys: &["id"],
    dedupe: true,
    schema: poaps_schema,
    post_process: passthrough,
    child: None,
};

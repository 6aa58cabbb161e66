//! Point-in-time estate snapshots
//!
//! Sold estate orders and bids each drive one lookup of the estate as it was
//! at the sale's block, so parcel composition is captured per sale.

use super::context::StreamContext;
use super::definition::{ChildLink, GraphQlVariables, RequestTemplate, StreamDefinition};
use crate::config::Endpoint;
use crate::error::{Error, Result};
use crate::pagination::PaginationStrategy;
use crate::schema::{Field, StreamSchema};
use crate::transform::{composite_row_id, context_field, flatten_pairs, get_path};
use crate::types::{JsonObject, JsonValue};

const ESTATE_ID: &str = "estateId";
const BLOCK_NUMBER: &str = "blockNumber";

const QUERY: &str = r#"
query ($estateId: ID!, $blockNumber: Int!) {
    estates(first: 1, where: {id: $estateId}, block: {number: $blockNumber}) {
        id
        tokenId
        parcels { x y }
        size
    }
}
"#;

fn schema() -> StreamSchema {
    StreamSchema::new(vec![
        Field::string("rowId").required(),
        Field::string("id").required(),
        Field::string("blockNumber"),
        Field::string("tokenId"),
        Field::integer("size"),
        Field::string("parcels"),
    ])
}

/// Query variables: the estate id and the block number as an integer
fn variables(ctx: &StreamContext) -> Result<JsonObject> {
    let estate_id = ctx
        .get_str(ESTATE_ID)
        .ok_or_else(|| Error::config(format!("context missing '{ESTATE_ID}'")))?;
    let block = match ctx.get(BLOCK_NUMBER) {
        Some(JsonValue::String(s)) => s.trim().parse::<i64>().ok(),
        Some(JsonValue::Number(n)) => n.as_i64(),
        _ => None,
    }
    .ok_or_else(|| Error::config(format!("context '{BLOCK_NUMBER}' is not a block number")))?;

    let mut vars = JsonObject::new();
    vars.insert(ESTATE_ID.to_string(), JsonValue::from(estate_id));
    vars.insert(BLOCK_NUMBER.to_string(), JsonValue::from(block));
    Ok(vars)
}

fn post_process(mut row: JsonObject, ctx: &StreamContext) -> Result<JsonObject> {
    flatten_pairs(&mut row, "parcels", "x", "y")?;
    context_field(&mut row, ctx, BLOCK_NUMBER)?;
    composite_row_id(&mut row, &["id", BLOCK_NUMBER])?;
    Ok(row)
}

/// Child context from a sold estate order or bid
pub fn estate_context(record: &JsonObject) -> Result<StreamContext> {
    let estate_id = get_path(record, "nft.id")
        .cloned()
        .ok_or_else(|| Error::post_processing("'nft.id' missing from parent record"))?;
    let block_number = get_path(record, BLOCK_NUMBER)
        .cloned()
        .ok_or_else(|| Error::post_processing("'blockNumber' missing from parent record"))?;
    Ok(StreamContext::from_pairs([
        (ESTATE_ID, estate_id),
        (BLOCK_NUMBER, block_number),
    ]))
}

const fn snapshot(name: &'static str) -> StreamDefinition {
    StreamDefinition {
        name,
        endpoint: Endpoint::Marketplace,
        request: RequestTemplate::GraphQl {
            query: QUERY,
            variables: GraphQlVariables::Context(variables),
        },
        records_path: "data.estates",
        pagination: PaginationStrategy::single_row(),
        primary_keys: &["rowId"],
        dedupe: false,
        schema,
        post_process,
        child: None,
    }
}

pub static HISTORICAL_SNAPSHOT_ESTATES: StreamDefinition = snapshot("historical_snapshot_estates");

pub static HISTORICAL_SNAPSHOT_ESTATES_BIDS: StreamDefinition =
    snapshot("historical_snapshot_estates_bids");

pub static ORDERS_ESTATES_LINK: ChildLink = ChildLink {
    stream: &HISTORICAL_SNAPSHOT_ESTATES,
    context: estate_context,
};

pub static BIDS_ESTATES_LINK: ChildLink = ChildLink {
    stream: &HISTORICAL_SNAPSHOT_ESTATES_BIDS,
    context: estate_context,
};

//! Item catalog from the REST NFT metadata service

use super::definition::{passthrough, RequestTemplate, StreamDefinition};
use crate::config::Endpoint;
use crate::pagination::PaginationStrategy;
use crate::schema::{Field, StreamSchema};

fn items_schema() -> StreamSchema {
    StreamSchema::new(vec![
        Field::string("id").required(),
        Field::string("name"),
        Field::string("thumbnail"),
        Field::string("url"),
        Field::string("category"),
        Field::string("contractAddress"),
        Field::string("itemId"),
        Field::string("rarity"),
        Field::string("price"),
        Field::integer("available"),
        Field::boolean("isOnSale"),
        Field::string("creator"),
        Field::string("beneficiary"),
        // Milliseconds since epoch
        Field::integer("createdAt"),
        Field::integer("updatedAt"),
        Field::integer("reviewedAt"),
        Field::integer("soldAt"),
        Field::integer("firstListedAt"),
        Field::string("network"),
        Field::integer("chainId"),
        Field::string("urn"),
    ])
}

pub static ITEMS_METADATA: StreamDefinition = StreamDefinition {
    name: "items_metadata",
    endpoint: Endpoint::MetadataApi,
    request: RequestTemplate::Rest {
        path: "/v1/items",
        params: &[("first", "{{ page.first }}"), ("skip", "{{ page.offset }}")],
    },
    records_path: "data",
    pagination: PaginationStrategy::offset(),
    primary_keys: &["id"],
    dedupe: false,
    schema: items_schema,
    post_process: passthrough,
    child: None,
};

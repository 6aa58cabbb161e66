//! Complete-object listings
//!
//! These entities have no usable replication key, so every run pages the
//! whole listing by offset. Pages never overlap, so dedup is off.

use super::definition::{passthrough, GraphQlVariables, RequestTemplate, StreamDefinition};
use crate::config::Endpoint;
use crate::pagination::PaginationStrategy;
use crate::schema::{Field, StreamSchema};

fn accounts_schema() -> StreamSchema {
    StreamSchema::new(vec![
        Field::string("id").required(),
        Field::string("address"),
        Field::string("isCommitteeMember"),
        Field::string("totalCurations"),
        Field::string("sales"),
        Field::string("purchases"),
        Field::string("spent"),
        Field::string("earned"),
        Field::string("royalties"),
    ])
}

fn mana_schema() -> StreamSchema {
    StreamSchema::new(vec![
        Field::string("id").required(),
        Field::string("mana").required(),
    ])
}

fn sales_schema() -> StreamSchema {
    StreamSchema::new(vec![
        Field::string("id").required(),
        Field::string("type"),
        Field::string("buyer"),
        Field::string("seller"),
        Field::string("price"),
        Field::string("feesCollectorCut"),
        Field::string("feesCollector"),
        Field::string("royaltiesCut"),
        Field::string("royaltiesCollector"),
        Field::string("item"),
        Field::string("nft"),
        Field::string("timestamp"),
        Field::string("txHash"),
        Field::string("searchTokenId"),
        Field::string("searchItemId"),
        Field::string("searchContractAddress"),
    ])
}

const ACCOUNTS_QUERY: &str = r#"
query ($offset: Int!) {
    accounts(first: 1000, skip: $offset, orderBy: spent, orderDirection: desc) {
        id address isCommitteeMember totalCurations sales purchases spent earned royalties
    }
}
"#;

const MANA_QUERY: &str = r#"
query ($offset: Int!) {
    accounts(first: 1000, skip: $offset, orderBy: mana, orderDirection: desc) {
        id mana
    }
}
"#;

const SALES_QUERY: &str = r#"
query ($offset: Int!) {
    sales(first: 1000, skip: $offset, orderBy: timestamp, orderDirection: desc) {
        id type buyer seller price feesCollectorCut feesCollector royaltiesCut
        royaltiesCollector item nft timestamp txHash searchTokenId searchItemId
        searchContractAddress
    }
}
"#;

const fn listing(
    name: &'static str,
    endpoint: Endpoint,
    query: &'static str,
    records_path: &'static str,
    schema: fn() -> StreamSchema,
) -> StreamDefinition {
    StreamDefinition {
        name,
        endpoint,
        request: RequestTemplate::GraphQl {
            query,
            variables: GraphQlVariables::Token("offset"),
        },
        records_path,
        pagination: PaginationStrategy::offset(),
        primary_keys: &["id"],
        dedupe: false,
        schema,
        post_process: passthrough,
        child: None,
    }
}

pub static ACCOUNTS_ETH: StreamDefinition = listing(
    "accounts_eth",
    Endpoint::EthAccounts,
    ACCOUNTS_QUERY,
    "data.accounts",
    accounts_schema,
);

pub static ACCOUNTS_POLYGON: StreamDefinition = listing(
    "accounts_polygon",
    Endpoint::PolygonAccounts,
    ACCOUNTS_QUERY,
    "data.accounts",
    accounts_schema,
);

pub static MANA_HOLDERS_ETH: StreamDefinition = listing(
    "mana_holders_eth",
    Endpoint::EthManaHolders,
    MANA_QUERY,
    "data.accounts",
    mana_schema,
);

pub static MANA_HOLDERS_POLYGON: StreamDefinition = listing(
    "mana_holders_polygon",
    Endpoint::PolygonManaHolders,
    MANA_QUERY,
    "data.accounts",
    mana_schema,
);

pub static SALES_ETHEREUM: StreamDefinition = listing(
    "sales_ethereum",
    Endpoint::EthCollections,
    SALES_QUERY,
    "data.sales",
    sales_schema,
);

pub static SALES_POLYGON: StreamDefinition = listing(
    "sales_polygon",
    Endpoint::Polygon,
    SALES_QUERY,
    "data.sales",
    sales_schema,
);

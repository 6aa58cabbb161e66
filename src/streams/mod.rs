//! Stream catalog
//!
//! Every stream the tap can extract, declared as static
//! [`StreamDefinition`] values. Child streams (historical estate snapshots)
//! are reached through their parent's [`ChildLink`] and also listed here so
//! discovery reports their schemas.

mod bids;
mod collections;
mod complete;
mod context;
mod definition;
mod metadata;
mod misc;
mod nfts;
mod orders;
mod polygon;
mod snapshots;


pub use context::StreamContext;
pub use definition::{
    passthrough, ChildContextFn, ChildLink, ContextVariablesFn, GraphQlVariables, PostProcessFn,
    RequestTemplate, StreamDefinition,
};

use crate::config::TapConfig;
use crate::error::{Error, Result};
use std::collections::HashMap;
use std::sync::LazyLock;
use tracing::info;

/// All streams, in the order a full run extracts them
static CATALOG: [&StreamDefinition; 34] = [
    &orders::ORDERS_WEARABLES,
    &orders::ORDERS_PARCELS,
    &orders::ORDERS_ESTATES,
    &snapshots::HISTORICAL_SNAPSHOT_ESTATES,
    &orders::ORDERS_NAMES,
    &nfts::NFTS_WEARABLES,
    &nfts::NFTS_ESTATES,
    &nfts::NFTS_PARCELS,
    &nfts::NFTS_NAMES,
    &polygon::NFTS_WEARABLES_POLYGON,
    &bids::BIDS_WEARABLES,
    &bids::BIDS_PARCELS,
    &bids::BIDS_ESTATES,
    &snapshots::HISTORICAL_SNAPSHOT_ESTATES_BIDS,
    &bids::BIDS_NAMES,
    &polygon::ORDERS_POLYGON_WEARABLES,
    &polygon::BIDS_POLYGON_WEARABLES,
    &polygon::PRIMARY_SALES_POLYGON_WEARABLES,
    &polygon::NFTS_MINTS_POLYGON,
    &polygon::COLLECTIONS_POLYGON,
    &polygon::ITEMS_POLYGON,
    &collections::ITEMS_ETHEREUM,
    &collections::COLLECTIONS_ETHEREUM,
    &collections::ITEMS_ETHEREUM_UNIQUE,
    &complete::ACCOUNTS_ETH,
    &complete::ACCOUNTS_POLYGON,
    &complete::MANA_HOLDERS_ETH,
    &complete::MANA_HOLDERS_POLYGON,
    &complete::SALES_ETHEREUM,
    &complete::SALES_POLYGON,
    &misc::RENTALS,
    &misc::DAO_EARNINGS,
    &misc::POAPS_XDAI,
    &metadata::ITEMS_METADATA,
];

static BY_NAME: LazyLock<HashMap<&'static str, &'static StreamDefinition>> =
    LazyLock::new(|| CATALOG.iter().map(|def| (def.name, *def)).collect());

/// Every stream definition, children included
pub fn catalog() -> &'static [&'static StreamDefinition] {
    &CATALOG
}

/// Streams that run on their own; children run under their parent
pub fn top_level() -> impl Iterator<Item = &'static StreamDefinition> {
    CATALOG.iter().copied().filter(|def| !def.is_child())
}

/// Look up a stream by name
pub fn find(name: &str) -> Result<&'static StreamDefinition> {
    BY_NAME
        .get(name)
        .copied()
        .ok_or_else(|| Error::StreamNotFound {
            stream: name.to_string(),
        })
}

/// The parent whose records drive `child`
pub fn parent_of(child: &StreamDefinition) -> Option<&'static StreamDefinition> {
    CATALOG.iter().copied().find(|def| {
        def.child
            .is_some_and(|link| std::ptr::eq(link.stream, child))
    })
}

/// Resolve a stream selection into the top-level streams to run.
///
/// An empty selection means every top-level stream. Selecting a child runs
/// its parent, which drives the child. Catalog order is kept and each
/// stream appears once.
pub fn select(names: &[String]) -> Result<Vec<&'static StreamDefinition>> {
    if names.is_empty() {
        return Ok(top_level().collect());
    }

    let mut wanted = Vec::with_capacity(names.len());
    for name in names {
        let def = find(name)?;
        let runnable = match parent_of(def) {
            Some(parent) if def.is_child() => {
                info!(
                    stream = def.name,
                    parent = parent.name,
                    "Child stream selected, running its parent"
                );
                parent
            }
            _ => def,
        };
        wanted.push(runnable.name);
    }

    Ok(top_level()
        .filter(|def| wanted.contains(&def.name))
        .collect())
}

/// Resolve a selection against a configuration.
///
/// An empty selection leaves out streams whose endpoint is not configured.
/// Streams named explicitly are always kept, so an unset endpoint still
/// fails them with a missing-field error.
pub fn select_for(names: &[String], config: &TapConfig) -> Result<Vec<&'static StreamDefinition>> {
    let selected = select(names)?;
    if !names.is_empty() {
        return Ok(selected);
    }

    Ok(selected
        .into_iter()
        .filter(|def| {
            let configured = config.has_endpoint(def.endpoint);
            if !configured {
                info!(
                    stream = def.name,
                    endpoint = %def.endpoint,
                    "Endpoint not configured, skipping stream"
                );
            }
            configured
        })
        .collect())
}

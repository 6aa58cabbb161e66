//! Tap configuration
//!
//! Loaded from a JSON or YAML file, or from inline JSON. Every field has a
//! default or is optional; streams whose endpoint is not configured fail
//! with [`Error::MissingConfigField`] when selected.

use crate::error::{Error, Result};
use crate::http::{HttpClientConfig, RateLimiterConfig};
use crate::types::{JsonValue, ReplicationKeyKind, ReplicationValue};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::time::Duration;
use url::Url;

// ============================================================================
// Endpoints
// ============================================================================

/// Which configured base URL a stream calls
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    /// Ethereum marketplace subgraph
    Marketplace,
    /// Polygon collections subgraph
    Polygon,
    EthAccounts,
    PolygonAccounts,
    EthManaHolders,
    PolygonManaHolders,
    /// Ethereum collections subgraph
    EthCollections,
    Rentals,
    PoapsXdai,
    /// REST NFT metadata service
    MetadataApi,
}

impl Endpoint {
    /// Name of the config field holding this endpoint's URL
    pub fn config_field(&self) -> &'static str {
        match self {
            Endpoint::Marketplace => "api_url",
            Endpoint::Polygon => "polygon_api_url",
            Endpoint::EthAccounts => "eth_accounts_url",
            Endpoint::PolygonAccounts => "polygon_accounts_url",
            Endpoint::EthManaHolders => "eth_mana_holder_url",
            Endpoint::PolygonManaHolders => "polygon_mana_holder_url",
            Endpoint::EthCollections => "eth_collections_url",
            Endpoint::Rentals => "rentals_url",
            Endpoint::PoapsXdai => "poaps_xdai_url",
            Endpoint::MetadataApi => "metadata_api_url",
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.config_field())
    }
}

// ============================================================================
// Tap Config
// ============================================================================

/// Complete tap configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TapConfig {
    /// Ethereum marketplace subgraph
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Polygon collections subgraph
    #[serde(default = "default_polygon_api_url")]
    pub polygon_api_url: String,

    #[serde(default)]
    pub eth_accounts_url: Option<String>,

    #[serde(default)]
    pub polygon_accounts_url: Option<String>,

    #[serde(default)]
    pub eth_mana_holder_url: Option<String>,

    #[serde(default)]
    pub polygon_mana_holder_url: Option<String>,

    #[serde(default)]
    pub eth_collections_url: Option<String>,

    #[serde(default)]
    pub rentals_url: Option<String>,

    #[serde(default)]
    pub poaps_xdai_url: Option<String>,

    /// REST NFT metadata service
    #[serde(default = "default_metadata_api_url")]
    pub metadata_api_url: String,

    /// Replication start for streams without a checkpoint
    #[serde(default = "default_start_updated_at")]
    pub start_updated_at: i64,

    /// Rows one stream run may pull before stopping (0 = unlimited)
    #[serde(default = "default_incremental_limit")]
    pub incremental_limit: u64,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Delay before the first retry, in milliseconds
    #[serde(default = "default_backoff_initial_ms")]
    pub backoff_initial_ms: u64,

    /// Client-side request rate cap
    #[serde(default)]
    pub requests_per_second: Option<u32>,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_api_url() -> String {
    "https://api.thegraph.com/subgraphs/name/decentraland/marketplace".to_string()
}

fn default_polygon_api_url() -> String {
    "https://api.thegraph.com/subgraphs/name/decentraland/collections-matic-mainnet".to_string()
}

fn default_metadata_api_url() -> String {
    "https://nft-api.decentraland.org".to_string()
}

fn default_start_updated_at() -> i64 {
    1
}

fn default_incremental_limit() -> u64 {
    20_000
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_backoff_initial_ms() -> u64 {
    1000
}

fn default_user_agent() -> String {
    format!("subgraph-tap/{}", env!("CARGO_PKG_VERSION"))
}

impl Default for TapConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            polygon_api_url: default_polygon_api_url(),
            eth_accounts_url: None,
            polygon_accounts_url: None,
            eth_mana_holder_url: None,
            polygon_mana_holder_url: None,
            eth_collections_url: None,
            rentals_url: None,
            poaps_xdai_url: None,
            metadata_api_url: default_metadata_api_url(),
            start_updated_at: default_start_updated_at(),
            incremental_limit: default_incremental_limit(),
            timeout_secs: default_timeout_secs(),
            backoff_initial_ms: default_backoff_initial_ms(),
            requests_per_second: None,
            user_agent: default_user_agent(),
        }
    }
}

impl TapConfig {
    /// Parse and validate inline JSON
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: TapConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate YAML
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: TapConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a config file; `.yaml` / `.yml` are read as YAML, anything else
    /// as JSON
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!(
                "Failed to read config file '{}': {e}",
                path.display()
            ))
        })?;

        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml" | "yml") => Self::from_yaml_str(&content),
            _ => Self::from_json_str(&content),
        }
    }

    /// Check URLs and numeric bounds
    pub fn validate(&self) -> Result<()> {
        let fields = [
            ("api_url", Some(&self.api_url)),
            ("polygon_api_url", Some(&self.polygon_api_url)),
            ("eth_accounts_url", self.eth_accounts_url.as_ref()),
            ("polygon_accounts_url", self.polygon_accounts_url.as_ref()),
            ("eth_mana_holder_url", self.eth_mana_holder_url.as_ref()),
            ("polygon_mana_holder_url", self.polygon_mana_holder_url.as_ref()),
            ("eth_collections_url", self.eth_collections_url.as_ref()),
            ("rentals_url", self.rentals_url.as_ref()),
            ("poaps_xdai_url", self.poaps_xdai_url.as_ref()),
            ("metadata_api_url", Some(&self.metadata_api_url)),
        ];
        for (field, value) in fields {
            if let Some(value) = value {
                parse_http_url(field, value)?;
            }
        }

        if self.timeout_secs == 0 {
            return Err(Error::config("timeout_secs must be greater than 0"));
        }
        if self.requests_per_second == Some(0) {
            return Err(Error::config("requests_per_second must be greater than 0"));
        }
        Ok(())
    }

    /// Whether a URL is configured for `endpoint`
    pub fn has_endpoint(&self, endpoint: Endpoint) -> bool {
        self.raw_endpoint(endpoint).is_some()
    }

    /// Resolve the URL a stream calls
    pub fn endpoint_url(&self, endpoint: Endpoint) -> Result<Url> {
        let raw = self
            .raw_endpoint(endpoint)
            .ok_or_else(|| Error::missing_field(endpoint.config_field()))?;
        parse_http_url(endpoint.config_field(), raw)
    }

    fn raw_endpoint(&self, endpoint: Endpoint) -> Option<&String> {
        match endpoint {
            Endpoint::Marketplace => Some(&self.api_url),
            Endpoint::Polygon => Some(&self.polygon_api_url),
            Endpoint::EthAccounts => self.eth_accounts_url.as_ref(),
            Endpoint::PolygonAccounts => self.polygon_accounts_url.as_ref(),
            Endpoint::EthManaHolders => self.eth_mana_holder_url.as_ref(),
            Endpoint::PolygonManaHolders => self.polygon_mana_holder_url.as_ref(),
            Endpoint::EthCollections => self.eth_collections_url.as_ref(),
            Endpoint::Rentals => self.rentals_url.as_ref(),
            Endpoint::PoapsXdai => self.poaps_xdai_url.as_ref(),
            Endpoint::MetadataApi => Some(&self.metadata_api_url),
        }
    }

    /// Replication start value when no checkpoint exists
    pub fn start_value(&self, kind: ReplicationKeyKind) -> ReplicationValue {
        match kind {
            ReplicationKeyKind::Integer => ReplicationValue::Integer(self.start_updated_at),
            ReplicationKeyKind::DateTime => ReplicationValue::DateTime(
                chrono::DateTime::from_timestamp(self.start_updated_at, 0).unwrap_or_default(),
            ),
        }
    }

    /// Transport settings derived from this config
    pub fn http_client_config(&self) -> HttpClientConfig {
        let mut config = HttpClientConfig::default()
            .timeout(Duration::from_secs(self.timeout_secs))
            .user_agent(self.user_agent.clone());
        if let Some(rps) = self.requests_per_second {
            config = config.rate_limit(RateLimiterConfig::per_second(rps));
        }
        config
    }

    /// Delay before the first retry
    pub fn initial_backoff(&self) -> Duration {
        Duration::from_millis(self.backoff_initial_ms)
    }

    /// Config as JSON, for template rendering
    pub fn to_value(&self) -> JsonValue {
        serde_json::to_value(self).unwrap_or_default()
    }
}

fn parse_http_url(field: &str, raw: &str) -> Result<Url> {
    let url = Url::parse(raw)
        .map_err(|e| Error::config(format!("{field} is not a valid URL ({raw}): {e}")))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(Error::config(format!(
            "{field} must use http or https, got '{other}'"
        ))),
    }
}

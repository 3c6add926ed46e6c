//! Configuration types for client construction.

use std::collections::BTreeMap;

pub const DEFAULT_CHARMSTORE_URL: &str = "https://api.jujucharms.com/charmstore/";
pub const DEFAULT_API_VERSION: &str = "v4";

/// Configuration for charmstore client construction.
#[derive(Debug, Clone)]
pub struct CharmstoreClientConfig {
    /// Base URL for the charmstore, including scheme, port and trailing slash.
    // Using a URL here would normalize away details the path builder
    // concatenates verbatim, so just use a String.
    pub charmstore_url: String,
    /// The api version segment, e.g. `v4`.
    pub api_version: String,
    /// Optional token handed to the authenticating transport.
    pub auth_token: Option<String>,
    /// Additional headers to include in requests.
    pub extra_headers: BTreeMap<String, String>,
    pub user_agent: Option<String>,
}

impl Default for CharmstoreClientConfig {
    fn default() -> Self {
        Self {
            charmstore_url: DEFAULT_CHARMSTORE_URL.to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
            auth_token: None,
            extra_headers: BTreeMap::new(),
            user_agent: None,
        }
    }
}

/// Configuration for the environment manager client.
#[derive(Debug, Clone, Default)]
pub struct EnvironmentClientConfig {
    /// Base URL of the environment manager, without the `/v1` suffix.
    pub jem_url: String,
    pub auth_token: Option<String>,
    pub extra_headers: BTreeMap<String, String>,
    pub user_agent: Option<String>,
}

/// The subset of configuration the HTTP transport needs,
/// shared by both clients.
#[derive(Debug, Clone, Default)]
pub struct TransportConfig {
    pub auth_token: Option<String>,
    pub extra_headers: BTreeMap<String, String>,
    pub user_agent: Option<String>,
}

impl From<&CharmstoreClientConfig> for TransportConfig {
    fn from(config: &CharmstoreClientConfig) -> Self {
        Self {
            auth_token: config.auth_token.clone(),
            extra_headers: config.extra_headers.clone(),
            user_agent: config.user_agent.clone(),
        }
    }
}

impl From<&EnvironmentClientConfig> for TransportConfig {
    fn from(config: &EnvironmentClientConfig) -> Self {
        Self {
            auth_token: config.auth_token.clone(),
            extra_headers: config.extra_headers.clone(),
            user_agent: config.user_agent.clone(),
        }
    }
}

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use charmstore_client::{
    CharmstoreClientConfig,
    DEFAULT_API_VERSION,
    DEFAULT_CHARMSTORE_URL,
    EnvironmentClientConfig,
    SearchLimit,
};
use config::{Config as HierarchicalConfig, Environment};
use serde::{Deserialize, Serialize};
use tracing::debug;
use xdg::BaseDirectories;

/// Name of the directory holding charmstore configuration
const CONFIG_DIR_NAME: &str = "charmstore";
pub const CONFIG_FILE: &str = "charmstore.toml";
const ENV_PREFIX: &str = "CHARMSTORE";

/// Describes the configuration of the charmstore CLI
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct Config {
    /// Base URL of the charmstore, including the trailing slash
    // Using a URL here would normalize the base,
    // so just use a String.
    pub charmstore_url: String,
    /// API version segment used in every charmstore path
    pub api_version: String,
    /// Base URL of the environment manager
    pub jem_url: Option<String>,
    /// Token handed to the authenticating transport
    pub auth_token: Option<String>,
    /// How many results `charmstore search` should show by default
    pub search_limit: SearchLimit,
}

impl Config {
    /// Creates a [Config] from defaults, config files and the environment
    pub fn parse() -> Result<Config> {
        let user_config = BaseDirectories::with_prefix(CONFIG_DIR_NAME).find_config_file(CONFIG_FILE);
        let system_config = PathBuf::from("/etc").join(CONFIG_DIR_NAME).join(CONFIG_FILE);
        Self::parse_from(&system_config, user_config.as_deref())
    }

    fn parse_from(system_config: &Path, user_config: Option<&Path>) -> Result<Config> {
        debug!(?system_config, ?user_config, "reading config");

        let mut builder = HierarchicalConfig::builder()
            .set_default("charmstore_url", DEFAULT_CHARMSTORE_URL)?
            .set_default("api_version", DEFAULT_API_VERSION)?;

        // read from /etc
        builder = builder.add_source(
            config::File::from(system_config)
                .format(config::FileFormat::Toml)
                .required(false),
        );

        if let Some(user_config) = user_config {
            builder = builder.add_source(
                config::File::from(user_config).format(config::FileFormat::Toml),
            );
        }

        // override via env variables
        let final_config = builder
            .add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()?;

        final_config
            .try_deserialize()
            .context("Could not parse config")
    }

    pub fn charmstore_client_config(&self) -> CharmstoreClientConfig {
        CharmstoreClientConfig {
            charmstore_url: self.charmstore_url.clone(),
            api_version: self.api_version.clone(),
            auth_token: self.auth_token.clone(),
            user_agent: Some(user_agent()),
            ..Default::default()
        }
    }

    /// Config for the environment manager client, if one is configured
    pub fn environment_client_config(&self) -> Option<EnvironmentClientConfig> {
        let jem_url = self.jem_url.clone()?;
        Some(EnvironmentClientConfig {
            jem_url,
            auth_token: self.auth_token.clone(),
            user_agent: Some(user_agent()),
            ..Default::default()
        })
    }
}

fn user_agent() -> String {
    format!("charmstore-cli/{}", env!("CARGO_PKG_VERSION"))
}

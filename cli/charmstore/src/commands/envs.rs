use anyhow::{Context, Result};
use bpaf::Bpaf;
use charmstore_client::EnvironmentClient;
use serde_json::Value;
use tracing::instrument;

use crate::utils::message;

// List environments on the environment manager
#[derive(Debug, Bpaf, Clone)]
pub struct Envs {
    /// Print the environments as JSON
    #[bpaf(long)]
    pub json: bool,
}

impl Envs {
    #[instrument(name = "envs", skip_all)]
    pub async fn handle(self, client: &EnvironmentClient) -> Result<()> {
        let environments = client
            .list_environments()
            .await
            .context("Could not list environments")?;
        print_listing(&environments, self.json, "No environments found")
    }
}

// List state servers known to the environment manager
#[derive(Debug, Bpaf, Clone)]
pub struct Servers {
    /// Print the state servers as JSON
    #[bpaf(long)]
    pub json: bool,
}

impl Servers {
    #[instrument(name = "servers", skip_all)]
    pub async fn handle(self, client: &EnvironmentClient) -> Result<()> {
        let servers = client
            .list_servers()
            .await
            .context("Could not list state servers")?;
        print_listing(&servers, self.json, "No state servers found")
    }
}

fn print_listing(items: &[Value], json: bool, empty_message: &str) -> Result<()> {
    if json {
        message::output(format_args!("{}\n", serde_json::to_string_pretty(items)?));
        return Ok(());
    }
    if items.is_empty() {
        message::plain(empty_message);
    }
    for item in items {
        message::output(format_args!("{}\n", describe(item)));
    }
    Ok(())
}

/// Environments and servers are identified by their `path`, e.g. `admin/prod`.
fn describe(item: &Value) -> String {
    match item.get("path").and_then(Value::as_str) {
        Some(path) => path.to_string(),
        None => item.to_string(),
    }
}

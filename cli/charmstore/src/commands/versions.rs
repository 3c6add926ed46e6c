use anyhow::{Context, Result};
use bpaf::Bpaf;
use charmstore_client::CharmstoreClient;
use tracing::instrument;

use crate::utils::message;

// List the revisions of a charm in the same series
#[derive(Debug, Bpaf, Clone)]
pub struct Versions {
    /// The charm to list revisions of, e.g. 'cs:trusty/mysql-5'
    #[bpaf(positional("charm-id"))]
    pub charm_id: String,
}

impl Versions {
    #[instrument(name = "versions", fields(charm_id = %self.charm_id), skip_all)]
    pub async fn handle(self, client: &CharmstoreClient) -> Result<()> {
        let versions = client
            .get_available_versions(&self.charm_id)
            .await
            .with_context(|| format!("Could not list versions of '{}'", self.charm_id))?;

        if versions.is_empty() {
            message::warning(format!("No revisions found for '{}'", self.charm_id));
        }
        for version in versions {
            message::output(format_args!("{version}\n"));
        }
        Ok(())
    }
}

use anyhow::{Context, Result};
use bpaf::Bpaf;
use charmstore_client::CharmstoreClient;
use tracing::instrument;

use crate::utils::message;

// Print a file from the archive of a charm or bundle
#[derive(Debug, Bpaf, Clone)]
pub struct File {
    /// The charm or bundle the file belongs to
    #[bpaf(positional("id"))]
    pub id: String,

    /// Path of the file within the archive, e.g. 'README.md'
    #[bpaf(positional("filename"))]
    pub filename: String,
}

impl File {
    #[instrument(name = "file", fields(id = %self.id, filename = %self.filename), skip_all)]
    pub async fn handle(self, client: &CharmstoreClient) -> Result<()> {
        let content = client
            .get_file(&self.id, &self.filename)
            .await
            .with_context(|| format!("Could not fetch '{}' of '{}'", self.filename, self.id))?;
        message::output(content);
        Ok(())
    }
}

// Print the URL of a bundle diagram
#[derive(Debug, Bpaf, Clone)]
pub struct DiagramUrl {
    /// The bundle to print the diagram URL for
    #[bpaf(positional("id"))]
    pub id: String,
}

impl DiagramUrl {
    pub fn handle(self, client: &CharmstoreClient) {
        message::output(format_args!("{}\n", client.get_diagram_url(&self.id)));
    }
}

// Print the deployer file of a bundle
#[derive(Debug, Bpaf, Clone)]
pub struct BundleYaml {
    /// The bundle to fetch the deployer file of
    #[bpaf(positional("id"))]
    pub id: String,
}

impl BundleYaml {
    #[instrument(name = "bundle-yaml", fields(id = %self.id), skip_all)]
    pub async fn handle(self, client: &CharmstoreClient) -> Result<()> {
        let yaml = client
            .get_bundle_yaml(&self.id)
            .await
            .with_context(|| format!("Could not fetch the deployer file of '{}'", self.id))?;
        message::output(yaml);
        Ok(())
    }
}

use std::fmt::Write;

use anyhow::{Context, Result};
use bpaf::Bpaf;
use charmstore_client::{CharmstoreClient, Entity, EntityKind};
use itertools::Itertools;
use tracing::instrument;

use crate::utils::message;

// Show details about a charm or bundle
#[derive(Debug, Bpaf, Clone)]
pub struct Show {
    /// Print the entity as JSON
    #[bpaf(long)]
    pub json: bool,

    /// The charm or bundle to show, e.g. 'cs:trusty/mysql-5'
    #[bpaf(positional("id"))]
    pub id: String,
}

impl Show {
    #[instrument(name = "show", fields(id = %self.id), skip_all)]
    pub async fn handle(self, client: &CharmstoreClient) -> Result<()> {
        let entity = client
            .get_entity(&self.id)
            .await
            .with_context(|| format!("Could not fetch '{}'", self.id))?;

        if self.json {
            message::output(format_args!("{}\n", serde_json::to_string_pretty(&entity)?));
        } else {
            message::output(render_entity(&entity)?);
        }
        Ok(())
    }
}

fn render_entity(entity: &Entity) -> Result<String> {
    let mut out = String::new();
    writeln!(out, "{} ({}) {}", entity.name, entity.entity_type(), entity.id)?;
    if let Some(summary) = entity.summary() {
        writeln!(out, "  {}", summary.replace('\n', " "))?;
    }

    let mut facts = vec![];
    if let Some(owner) = &entity.owner {
        facts.push(format!("owner: {owner}"));
    }
    if let Some(revisions) = entity.revisions {
        facts.push(format!("revisions: {revisions}"));
    }
    if let Some(downloads) = entity.downloads {
        facts.push(format!("downloads: {downloads}"));
    }
    facts.push(format!(
        "approved: {}",
        if entity.is_approved { "yes" } else { "no" }
    ));
    writeln!(out, "  {}", facts.join("  "))?;

    if let Some(location) = &entity.code_source.location {
        writeln!(out, "  source: {location}")?;
    }

    let tags = entity.tags();
    if !tags.is_empty() {
        writeln!(out, "  tags: {}", tags.join(", "))?;
    }

    match &entity.kind {
        EntityKind::Charm(charm) => {
            if charm.is_subordinate {
                writeln!(out, "  subordinate")?;
            }
            if !charm.relations.provides.is_empty() {
                writeln!(out, "  provides: {}", charm.relations.provides.keys().join(", "))?;
            }
            if !charm.relations.requires.is_empty() {
                writeln!(out, "  requires: {}", charm.relations.requires.keys().join(", "))?;
            }
            if let Some(options) = &charm.options {
                writeln!(out, "  options: {}", options.keys().join(", "))?;
            }
        },
        EntityKind::Bundle(bundle) => {
            writeln!(out, "  deployer file: {}", bundle.deployer_file_url)?;
        },
    }

    if let Some(files) = &entity.files {
        writeln!(out, "  files: {}", files.len())?;
    }
    Ok(out)
}

use std::fmt::Write;
use std::num::NonZeroU32;
use std::str::FromStr;

use anyhow::{Context, Result};
use bpaf::Bpaf;
use charmstore_client::{CharmstoreClient, Entity, SearchFilters};
use tracing::{debug, instrument};

use crate::config::Config;
use crate::utils::message;

/// A `key=value` search filter, or a bare `key`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterArg {
    key: String,
    value: Option<String>,
}

impl FromStr for FilterArg {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (key, value) = match s.split_once('=') {
            Some((key, value)) => (key, Some(value.to_string())),
            None => (s, None),
        };
        if key.is_empty() {
            return Err(format!("filter '{s}' has no key"));
        }
        Ok(FilterArg {
            key: key.to_string(),
            value,
        })
    }
}

// Search the charmstore
#[derive(Debug, Bpaf, Clone)]
pub struct Search {
    /// Display search results as a JSON array
    #[bpaf(long)]
    pub json: bool,

    /// Maximum number of results
    #[bpaf(long, short, argument("N"))]
    pub limit: Option<NonZeroU32>,

    /// Additional filter, e.g. 'type=bundle' or 'promulgated'
    #[bpaf(long("filter"), short('f'), argument("KEY[=VALUE]"))]
    pub filters: Vec<FilterArg>,

    /// Text to search for
    #[bpaf(positional("text"))]
    pub text: String,
}

impl Search {
    fn search_filters(&self) -> SearchFilters {
        self.filters
            .iter()
            .fold(SearchFilters::text(&self.text), |filters, filter| {
                match &filter.value {
                    Some(value) => filters.with(&filter.key, value),
                    None => filters.with_key(&filter.key),
                }
            })
    }

    #[instrument(name = "search", fields(text = %self.text, json = self.json), skip_all)]
    pub async fn handle(self, config: &Config, client: &CharmstoreClient) -> Result<()> {
        let limit = self.limit.or(config.search_limit);
        let filters = self.search_filters();
        debug!(?filters, ?limit, "searching");

        let results = client
            .search(&filters, limit)
            .await
            .context("Search failed")?;

        if self.json {
            message::output(format_args!("{}\n", serde_json::to_string_pretty(&results)?));
        } else if results.is_empty() {
            message::plain(format!("No charms or bundles matched '{}'", self.text));
        } else {
            message::output(render_results(&results)?);
        }
        Ok(())
    }
}

/// One line per result: id, type and summary, with ids aligned.
fn render_results(results: &[Entity]) -> Result<String> {
    let width = results
        .iter()
        .map(|entity| entity.id.len())
        .max()
        .unwrap_or_default();

    let mut out = String::new();
    for entity in results {
        let summary = entity
            .summary()
            .map(|summary| summary.replace('\n', " "))
            .unwrap_or_default();
        writeln!(
            out,
            "{:<width$}  {:<6}  {}",
            entity.id,
            entity.entity_type().to_string(),
            summary
        )?;
    }
    Ok(out.lines().map(str::trim_end).collect::<Vec<_>>().join("\n") + "\n")
}

//! Charmstore client composing transport, paths and entity processing.

use std::fmt::Debug;
use std::num::NonZeroU32;

use derive_more::{Deref, DerefMut};
use indexmap::IndexMap;
use tracing::{debug, instrument};
use url::form_urlencoded;

use crate::config::{CharmstoreClientConfig, TransportConfig};
use crate::entity::{Entity, EntityProcessor};
use crate::error::{CharmstoreClientError, ShapeError};
use crate::path::{PathBuilder, strip_scheme};
use crate::transform::{PostProcess, transform};
use crate::transport::{HttpTransport, Method, TransportClient, request_json, request_text};
use crate::versions::{filter_versions, parse_expanded_ids, series_of};

/// Maximum number of search results, [None] means [DEFAULT_SEARCH_LIMIT].
pub type SearchLimit = Option<NonZeroU32>;

pub const DEFAULT_SEARCH_LIMIT: NonZeroU32 = NonZeroU32::new(30).unwrap();

/// Metadata requested for a single entity.
const ENTITY_INCLUDES: &[&str] = &[
    "bundle-metadata",
    "charm-metadata",
    "charm-config",
    "manifest",
    "stats",
    "charm-related",
    "extra-info",
];

/// Metadata requested for every search result.
const SEARCH_INCLUDES: &[&str] = &[
    "charm-metadata",
    "charm-config",
    "bundle-metadata",
    "extra-info",
    "stats",
];

/// Ordered search filters.
///
/// A filter without a value (or with an empty one) is sent as a bare key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deref, DerefMut)]
pub struct SearchFilters(IndexMap<String, Option<String>>);

impl SearchFilters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Free text search, the most common filter.
    pub fn text(text: impl Into<String>) -> Self {
        Self::new().with("text", text)
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.insert(key.into(), Some(value.into()));
        self
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.0.insert(key.into(), None);
        self
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for SearchFilters {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self(
            iter.into_iter()
                .map(|(key, value)| (key.into(), Some(value.into())))
                .collect(),
        )
    }
}

/// A client for the charmstore.
///
/// Every call is an independent round trip, nothing is cached.
/// Requests can be cancelled by wrapping the returned futures in
/// [futures::future::abortable].
#[derive(Clone)]
pub struct CharmstoreClient {
    transport: TransportClient,
    paths: PathBuilder,
    processor: EntityProcessor,
    post_process: Option<PostProcess>,
    config: CharmstoreClientConfig,
}

impl Debug for CharmstoreClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CharmstoreClient")
            .field("charmstore_url", &self.config.charmstore_url)
            .field("api_version", &self.config.api_version)
            .field("post_process", &self.post_process.is_some())
            .finish_non_exhaustive()
    }
}

impl CharmstoreClient {
    /// Create a client talking HTTP to the configured charmstore.
    pub fn new(config: CharmstoreClientConfig) -> Result<Self, CharmstoreClientError> {
        let transport = HttpTransport::new(&TransportConfig::from(&config))?;
        Ok(Self::with_transport(config, transport))
    }

    /// Create a client sending requests through `transport`.
    pub fn with_transport(
        config: CharmstoreClientConfig,
        transport: impl Into<TransportClient>,
    ) -> Self {
        let paths = PathBuilder::new(&config.charmstore_url, &config.api_version);
        Self {
            transport: transport.into(),
            processor: EntityProcessor::new(paths.clone()),
            paths,
            post_process: None,
            config,
        }
    }

    /// Apply `hook` to every entity returned by [Self::get_entity] and
    /// [Self::search].
    pub fn with_post_process(mut self, hook: PostProcess) -> Self {
        self.post_process = Some(hook);
        self
    }

    pub fn charmstore_url(&self) -> &str {
        &self.config.charmstore_url
    }

    /// Fetch a charm or bundle with all of its metadata.
    #[instrument(skip(self))]
    pub async fn get_entity(&self, id: &str) -> Result<Entity, CharmstoreClientError> {
        let query = include_query(ENTITY_INCLUDES);
        let url = self.paths.build(id, Some(&query), Some("/meta/any"));

        let body = request_json(&self.transport, &url, Method::Get, None).await?;
        let entity = self
            .transform(&body)?
            .into_iter()
            .next()
            .ok_or(ShapeError::EmptyResult)?;

        debug!(entity_type = %entity.entity_type(), "fetched entity");
        Ok(entity)
    }

    /// Search the charmstore.
    #[instrument(skip(self))]
    pub async fn search(
        &self,
        filters: &SearchFilters,
        limit: SearchLimit,
    ) -> Result<Vec<Entity>, CharmstoreClientError> {
        let url = self
            .paths
            .build("search", Some(&search_query(filters, limit)), None);

        let body = request_json(&self.transport, &url, Method::Get, None).await?;
        let entities = self.transform(&body)?;

        debug!(results = entities.len(), "search complete");
        Ok(entities)
    }

    /// Fetch a file from the archive of a charm or bundle.
    #[instrument(skip(self))]
    pub async fn get_file(
        &self,
        entity_id: &str,
        filename: &str,
    ) -> Result<String, CharmstoreClientError> {
        let url = self.paths.build(
            &strip_scheme(entity_id),
            None,
            Some(&format!("/archive/{filename}")),
        );
        request_text(&self.transport, &url, Method::Get, None).await
    }

    /// The URL of the diagram of a bundle. Nothing is requested.
    pub fn get_diagram_url(&self, entity_id: &str) -> String {
        self.paths
            .build(&strip_scheme(entity_id), None, Some("/diagram.svg"))
    }

    /// Fetch the deployer file of a bundle.
    #[instrument(skip(self))]
    pub async fn get_bundle_yaml(&self, id: &str) -> Result<String, CharmstoreClientError> {
        let entity = self.get_entity(id).await?;
        let url = entity
            .deployer_file_url()
            .ok_or_else(|| ShapeError::NotABundle(entity.id.clone()))?;
        request_text(&self.transport, url, Method::Get, None).await
    }

    /// Ids of all revisions of a charm in the same series, in catalog order.
    #[instrument(skip(self))]
    pub async fn get_available_versions(
        &self,
        charm_id: &str,
    ) -> Result<Vec<String>, CharmstoreClientError> {
        let id = strip_scheme(charm_id);
        let series = series_of(&id);
        let url = self.paths.build(&id, None, Some("/expand-id"));

        let body = request_json(&self.transport, &url, Method::Get, None).await?;
        let versions = filter_versions(&series, &parse_expanded_ids(body)?);

        debug!(%series, versions = versions.len(), "resolved available versions");
        Ok(versions)
    }

    fn transform(&self, body: &serde_json::Value) -> Result<Vec<Entity>, ShapeError> {
        transform(body, &self.processor, self.post_process.as_ref())
    }
}

/// Query string for a search: filters in insertion order,
/// then the limit, then the metadata includes.
pub fn search_query(filters: &SearchFilters, limit: SearchLimit) -> String {
    let mut parts = filters
        .iter()
        .map(|(key, value)| {
            let key = encode(key);
            match value.as_deref().filter(|value| !value.is_empty()) {
                Some(value) => format!("{key}={}", encode(value)),
                None => key,
            }
        })
        .collect::<Vec<_>>();
    parts.push(format!("limit={}", limit.unwrap_or(DEFAULT_SEARCH_LIMIT)));
    parts.push(include_query(SEARCH_INCLUDES));
    parts.join("&")
}

fn include_query(includes: &[&str]) -> String {
    includes
        .iter()
        .map(|include| format!("include={include}"))
        .collect::<Vec<_>>()
        .join("&")
}

fn encode(component: &str) -> String {
    form_urlencoded::byte_serialize(component.as_bytes()).collect()
}

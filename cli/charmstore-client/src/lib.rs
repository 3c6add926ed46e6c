//! Client for the juju charmstore and environment manager APIs.
//!
//! This crate provides:
//! - an authenticating transport seam with an HTTP and a mock implementation
//! - normalization of raw catalog records into charm and bundle [Entity] values
//! - entity lookup, search, file retrieval and version listing via [CharmstoreClient]
//! - environment management via [EnvironmentClient]
//!
//! ## Usage
//!
//! ```ignore
//! use charmstore_client::{CharmstoreClient, CharmstoreClientConfig, SearchFilters};
//!
//! let client = CharmstoreClient::new(CharmstoreClientConfig::default())?;
//! let mysql = client.get_entity("cs:trusty/mysql-5").await?;
//! let results = client.search(&SearchFilters::text("apache"), None).await?;
//! ```

mod client;
mod config;
mod entity;
mod environment;
mod error;
pub mod normalize;
pub mod path;
mod transform;
mod transport;
mod versions;

#[cfg(any(test, feature = "tests"))]
pub mod test_helpers;

pub use client::{CharmstoreClient, DEFAULT_SEARCH_LIMIT, SearchFilters, SearchLimit, search_query};
pub use config::{
    CharmstoreClientConfig,
    DEFAULT_API_VERSION,
    DEFAULT_CHARMSTORE_URL,
    EnvironmentClientConfig,
    TransportConfig,
};
pub use entity::{
    BundleDetails,
    CharmDetails,
    CodeSource,
    Entity,
    EntityKind,
    EntityProcessor,
    EntityType,
    Relations,
    is_approved,
    name_from_id,
};
pub use environment::{EnvironmentClient, NewEnvironment};
pub use error::{CharmstoreClientError, MapTransportErrorExt, ShapeError};
// Cancellation of any client operation.
pub use futures::future::{AbortHandle, Aborted, abortable};
pub use transform::{PostProcess, transform};
pub use transport::{
    HttpTransport,
    Method,
    MockTransport,
    Transport,
    TransportClient,
    TransportFailure,
    TransportRequest,
    request_json,
    request_text,
};
pub use versions::{ExpandedId, filter_versions, parse_expanded_ids, series_of};

//! Error handling for charmstore and environment manager operations.

use serde_json::Value;
use thiserror::Error;

use crate::transport::TransportFailure;

/// Common error type for client operations.
#[derive(Debug, Error)]
pub enum CharmstoreClientError {
    /// The transport routed the request to its failure channel.
    ///
    /// `body` retains the parsed failure payload if it was JSON,
    /// so callers can inspect more than the message.
    #[error("{message}")]
    Transport { message: String, body: Option<Value> },
    /// A success response could not be parsed as JSON.
    #[error("failed to parse response as JSON")]
    Parse(#[source] serde_json::Error),
    #[error(transparent)]
    Shape(#[from] ShapeError),
    #[error("invalid client configuration: {0}")]
    InvalidConfig(String),
}

/// A response that does not have the structure the client relies on.
#[derive(Debug, Error)]
pub enum ShapeError {
    #[error("catalog record has no 'Meta' object")]
    MissingMeta,
    #[error("catalog record does not match the expected schema")]
    Malformed(#[source] serde_json::Error),
    #[error("'{0}' has both charm and bundle metadata")]
    AmbiguousEntityType(String),
    #[error("'{0}' has neither charm nor bundle metadata")]
    UnknownEntityType(String),
    #[error("'{0}' is not a bundle")]
    NotABundle(String),
    #[error("response did not contain any entities")]
    EmptyResult,
    #[error("'Results' is not a list of records")]
    InvalidResults,
    #[error("response has no '{0}' field")]
    MissingField(&'static str),
    #[error("'{0}' has an unexpected type")]
    InvalidField(&'static str),
    #[error("{0} is not an object")]
    NotAnObject(&'static str),
}

/// Extension trait for converting transport failures into client errors.
pub trait MapTransportErrorExt<T> {
    /// Maps a [TransportFailure] into [CharmstoreClientError::Transport],
    /// extracting a human readable message from the failure body.
    fn map_transport_error(self) -> Result<T, CharmstoreClientError>;
}

impl<T> MapTransportErrorExt<T> for Result<T, TransportFailure> {
    fn map_transport_error(self) -> Result<T, CharmstoreClientError> {
        self.map_err(CharmstoreClientError::from)
    }
}

impl From<TransportFailure> for CharmstoreClientError {
    fn from(failure: TransportFailure) -> Self {
        match failure {
            TransportFailure::Response { status, body } => {
                let parsed = serde_json::from_str::<Value>(&body).ok();
                let message = parsed
                    .as_ref()
                    .and_then(failure_message)
                    .map(ToString::to_string)
                    .unwrap_or_else(|| {
                        if body.is_empty() {
                            format!("HTTP {status}")
                        } else {
                            body.clone()
                        }
                    });
                CharmstoreClientError::Transport {
                    message,
                    body: parsed,
                }
            },
            TransportFailure::Network(message) => CharmstoreClientError::Transport {
                message,
                body: None,
            },
        }
    }
}

/// Failure bodies carry their message under `Message` (charmstore)
/// or `message` (environment manager).
fn failure_message(body: &Value) -> Option<&str> {
    body.get("Message")
        .and_then(Value::as_str)
        .or_else(|| body.get("message").and_then(Value::as_str))
}

//! Request dispatch through an authenticating transport.
//!
//! The [Transport] trait is the seam between the clients and whatever
//! actually signs and sends requests. [HttpTransport] talks to a real
//! service via `reqwest`, [MockTransport] replays canned responses.
//!
//! Success and failure are classified by the transport alone,
//! [request_json] and [request_text] only interpret the bodies.

use std::collections::VecDeque;
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use derive_more::Display;
use enum_dispatch::enum_dispatch;
use reqwest::header::{self, HeaderMap};
use serde_json::Value;
use tracing::{debug, instrument, trace};

use crate::config::TransportConfig;
use crate::error::{CharmstoreClientError, MapTransportErrorExt};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Method {
    #[display("GET")]
    Get,
    #[display("POST")]
    Post,
}

/// A fully built request handed to a [Transport].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportRequest {
    pub url: String,
    pub method: Method,
    /// Serialized JSON body, only ever set for [Method::Post].
    pub body: Option<String>,
}

/// The failure channel of a [Transport].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportFailure {
    /// The service answered, but the transport routed the answer to failure.
    Response { status: u16, body: String },
    /// No response was received.
    Network(String),
}

#[enum_dispatch]
#[allow(async_fn_in_trait)]
pub trait Transport {
    /// Send a request, resolving to the raw response text on success.
    async fn send(&self, request: TransportRequest) -> Result<String, TransportFailure>;
}

/// Either an HTTP transport or a mock transport for testing.
#[derive(Debug, Clone)]
#[enum_dispatch(Transport)]
pub enum TransportClient {
    Http(HttpTransport),
    Mock(MockTransport),
}

// ---------------------------------------------------------------------------
// JSON adapter
// ---------------------------------------------------------------------------

/// Send a request and parse the success body as JSON.
///
/// For [Method::Get] the body is ignored. Failure bodies are turned into
/// [CharmstoreClientError::Transport] with the message extracted from
/// a `Message` or `message` field.
pub async fn request_json(
    transport: &impl Transport,
    url: &str,
    method: Method,
    body: Option<&Value>,
) -> Result<Value, CharmstoreClientError> {
    let text = request_text(transport, url, method, body).await?;
    serde_json::from_str(&text).map_err(CharmstoreClientError::Parse)
}

/// Send a request and return the success body verbatim.
pub async fn request_text(
    transport: &impl Transport,
    url: &str,
    method: Method,
    body: Option<&Value>,
) -> Result<String, CharmstoreClientError> {
    let body = match method {
        Method::Get => None,
        Method::Post => Some(body.map(Value::to_string).unwrap_or_else(|| "null".to_string())),
    };
    trace!(%url, %method, has_body = body.is_some(), "dispatching request");

    transport
        .send(TransportRequest {
            url: url.to_string(),
            method,
            body,
        })
        .await
        .map_transport_error()
}

// ---------------------------------------------------------------------------
// HTTP transport
// ---------------------------------------------------------------------------

/// Transport backed by a `reqwest` client with authentication headers
/// applied to every request.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(config: &TransportConfig) -> Result<Self, CharmstoreClientError> {
        Ok(Self {
            client: build_http_client(config)?,
        })
    }
}

impl Transport for HttpTransport {
    #[instrument(skip_all, fields(method = %request.method, url = %request.url))]
    async fn send(&self, request: TransportRequest) -> Result<String, TransportFailure> {
        let builder = match request.method {
            Method::Get => self.client.get(&request.url),
            Method::Post => self
                .client
                .post(&request.url)
                .header(header::CONTENT_TYPE, "application/json")
                .body(request.body.unwrap_or_default()),
        };

        let response = builder
            .send()
            .await
            .map_err(|e| TransportFailure::Network(e.to_string()))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| TransportFailure::Network(e.to_string()))?;

        debug!(status = status.as_u16(), len = body.len(), "received response");

        if status.is_success() {
            Ok(body)
        } else {
            Err(TransportFailure::Response {
                status: status.as_u16(),
                body,
            })
        }
    }
}

/// Build HTTP client with token auth and extra headers.
fn build_http_client(config: &TransportConfig) -> Result<reqwest::Client, CharmstoreClientError> {
    let mut headers = HeaderMap::new();

    if let Some(token) = &config.auth_token {
        headers.insert(
            header::AUTHORIZATION,
            header::HeaderValue::from_str(&format!("bearer {token}"))
                .map_err(|e| CharmstoreClientError::InvalidConfig(e.to_string()))?,
        );
    }

    for (key, value) in &config.extra_headers {
        headers.insert(
            header::HeaderName::from_str(key)
                .map_err(|e| CharmstoreClientError::InvalidConfig(e.to_string()))?,
            header::HeaderValue::from_str(value)
                .map_err(|e| CharmstoreClientError::InvalidConfig(e.to_string()))?,
        );
    }

    debug!(
        has_token = config.auth_token.is_some(),
        extra_headers = config.extra_headers.len(),
        "building HTTP client"
    );

    let client_builder = reqwest::Client::builder()
        .default_headers(headers)
        .connect_timeout(Duration::from_secs(15))
        .timeout(Duration::from_secs(60));

    let client_builder = if let Some(ref user_agent) = config.user_agent {
        client_builder.user_agent(user_agent)
    } else {
        client_builder
    };

    client_builder
        .build()
        .map_err(|e| CharmstoreClientError::InvalidConfig(e.to_string()))
}

// ---------------------------------------------------------------------------
// Mock transport
// ---------------------------------------------------------------------------

// Arc allows you to push responses and inspect requests from outside the
// client, Mutex allows sharing across tokio worker threads.
type MockField<T> = Arc<Mutex<T>>;

/// A transport that can be seeded with responses.
///
/// Every request is recorded so tests can assert on the exact URL,
/// method and body that were sent.
#[derive(Debug, Clone, Default)]
pub struct MockTransport {
    responses: MockField<VecDeque<Result<String, TransportFailure>>>,
    requests: MockField<Vec<TransportRequest>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful response body.
    pub fn push_response(&self, body: impl Into<String>) {
        self.responses
            .lock()
            .expect("couldn't acquire mock lock")
            .push_back(Ok(body.into()));
    }

    /// Queue a JSON success response.
    pub fn push_json(&self, body: &Value) {
        self.push_response(body.to_string());
    }

    /// Queue a failure response.
    pub fn push_failure(&self, status: u16, body: impl Into<String>) {
        self.responses
            .lock()
            .expect("couldn't acquire mock lock")
            .push_back(Err(TransportFailure::Response {
                status,
                body: body.into(),
            }));
    }

    /// All requests sent through this transport so far, oldest first.
    pub fn requests(&self) -> Vec<TransportRequest> {
        self.requests
            .lock()
            .expect("couldn't acquire mock lock")
            .clone()
    }
}

impl Transport for MockTransport {
    async fn send(&self, request: TransportRequest) -> Result<String, TransportFailure> {
        self.requests
            .lock()
            .expect("couldn't acquire mock lock")
            .push(request.clone());
        let response = self
            .responses
            .lock()
            .expect("couldn't acquire mock lock")
            .pop_front();
        match response {
            Some(response) => response,
            None => Err(TransportFailure::Network(format!(
                "no mock response queued for {} {}",
                request.method, request.url
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use futures::future::{Aborted, abortable};
    use httpmock::Method::{GET, POST};
    use httpmock::MockServer;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[tokio::test]
    async fn get_parses_json_body() {
        let transport = MockTransport::new();
        transport.push_json(&json!({"Id": "cs:trusty/mysql-5"}));

        let value = request_json(&transport, "http://cs/v4/x", Method::Get, None)
            .await
            .unwrap();
        assert_eq!(value, json!({"Id": "cs:trusty/mysql-5"}));
    }

    #[tokio::test]
    async fn get_ignores_body() {
        let transport = MockTransport::new();
        transport.push_json(&json!({}));

        request_json(&transport, "http://cs/v4/x", Method::Get, Some(&json!({"a": 1})))
            .await
            .unwrap();
        assert_eq!(transport.requests()[0].body, None);
    }

    #[tokio::test]
    async fn post_serializes_body() {
        let transport = MockTransport::new();
        transport.push_json(&json!({}));

        request_json(&transport, "http://jem/v1/env", Method::Post, Some(&json!({"name": "e"})))
            .await
            .unwrap();
        assert_eq!(transport.requests(), vec![TransportRequest {
            url: "http://jem/v1/env".to_string(),
            method: Method::Post,
            body: Some(r#"{"name":"e"}"#.to_string()),
        }]);
    }

    #[tokio::test]
    async fn failure_surfaces_message() {
        let transport = MockTransport::new();
        transport.push_failure(404, r#"{"Message":"not found"}"#);

        let err = request_json(&transport, "http://cs/v4/x", Method::Get, None)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "not found");
    }

    #[tokio::test]
    async fn invalid_json_is_parse_error() {
        let transport = MockTransport::new();
        transport.push_response("definitely not json");

        let err = request_json(&transport, "http://cs/v4/x", Method::Get, None)
            .await
            .unwrap_err();
        assert!(matches!(err, CharmstoreClientError::Parse(_)), "{err:?}");
    }

    #[tokio::test]
    async fn empty_queue_is_transport_error() {
        let transport = MockTransport::new();
        let err = request_text(&transport, "http://cs/v4/x", Method::Get, None)
            .await
            .unwrap_err();
        assert!(matches!(err, CharmstoreClientError::Transport { body: None, .. }));
    }

    #[tokio::test]
    async fn http_success_and_failure_routing() {
        let server = MockServer::start_async().await;
        let ok = server.mock(|when, then| {
            when.method(GET).path("/v4/ok");
            then.status(200).body("fine");
        });
        let missing = server.mock(|when, then| {
            when.method(GET).path("/v4/missing");
            then.status(404).body(r#"{"Message":"no such entity"}"#);
        });

        let transport = HttpTransport::new(&TransportConfig::default()).unwrap();

        let body = request_text(&transport, &server.url("/v4/ok"), Method::Get, None)
            .await
            .unwrap();
        assert_eq!(body, "fine");

        let err = request_text(&transport, &server.url("/v4/missing"), Method::Get, None)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "no such entity");

        ok.assert();
        missing.assert();
    }

    #[tokio::test]
    async fn http_sends_auth_and_extra_headers() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/v1/env/admin")
                .header("authorization", "bearer s3cret")
                .header("x-juju-test", "yes")
                .header("content-type", "application/json")
                .json_body(json!({"name": "prod"}));
            then.status(200).json_body(json!({"ok": true}));
        });

        let config = TransportConfig {
            auth_token: Some("s3cret".to_string()),
            extra_headers: [("x-juju-test".to_string(), "yes".to_string())].into(),
            user_agent: None,
        };
        let transport = HttpTransport::new(&config).unwrap();
        let value = request_json(
            &transport,
            &server.url("/v1/env/admin"),
            Method::Post,
            Some(&json!({"name": "prod"})),
        )
        .await
        .unwrap();

        assert_eq!(value, json!({"ok": true}));
        mock.assert();
    }

    #[test]
    fn invalid_header_is_config_error() {
        let config = TransportConfig {
            extra_headers: [("bad header".to_string(), "v".to_string())].into(),
            ..Default::default()
        };
        assert!(matches!(
            HttpTransport::new(&config),
            Err(CharmstoreClientError::InvalidConfig(_))
        ));
    }

    #[tokio::test]
    async fn aborted_request_never_resolves() {
        let transport = MockTransport::new();
        transport.push_json(&json!({}));

        let (request, handle) =
            abortable(request_json(&transport, "http://cs/v4/x", Method::Get, None));
        handle.abort();
        assert_eq!(request.await.map(|_| ()), Err(Aborted));
    }
}

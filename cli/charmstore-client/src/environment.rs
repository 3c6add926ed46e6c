//! Client for the juju environment manager (JEM).
//!
//! Responses are returned as plain JSON, no key normalization is applied.

use std::fmt::Debug;

use serde_json::{Value, json};
use tracing::{debug, instrument};

use crate::config::{EnvironmentClientConfig, TransportConfig};
use crate::error::{CharmstoreClientError, ShapeError};
use crate::transport::{HttpTransport, Method, TransportClient, request_json};

const API_VERSION: &str = "v1";

/// Parameters of a new environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEnvironment {
    pub name: String,
    pub password: String,
    /// Name of the config template the environment is created from.
    pub template: String,
    /// Entity path of the state server hosting the environment.
    pub state_server: String,
}

impl NewEnvironment {
    fn to_request_body(&self) -> Value {
        json!({
            "name": self.name,
            "password": self.password,
            "templates": [self.template],
            "state-server": self.state_server,
        })
    }
}

#[derive(Clone)]
pub struct EnvironmentClient {
    transport: TransportClient,
    base_url: String,
}

impl Debug for EnvironmentClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnvironmentClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl EnvironmentClient {
    pub fn new(config: EnvironmentClientConfig) -> Result<Self, CharmstoreClientError> {
        let transport = HttpTransport::new(&TransportConfig::from(&config))?;
        Ok(Self::with_transport(&config, transport))
    }

    pub fn with_transport(
        config: &EnvironmentClientConfig,
        transport: impl Into<TransportClient>,
    ) -> Self {
        Self {
            transport: transport.into(),
            base_url: format!("{}/{API_VERSION}", config.jem_url.trim_end_matches('/')),
        }
    }

    /// All environments visible to the authenticated user.
    #[instrument(skip(self))]
    pub async fn list_environments(&self) -> Result<Vec<Value>, CharmstoreClientError> {
        let body = self.get(&self.url(&["env"])).await?;
        let environments = take_list(body, "environments")?;
        debug!(environments = environments.len(), "listed environments");
        Ok(environments)
    }

    /// All state servers known to the environment manager.
    #[instrument(skip(self))]
    pub async fn list_servers(&self) -> Result<Vec<Value>, CharmstoreClientError> {
        let body = self.get(&self.url(&["server"])).await?;
        let servers = take_list(body, "state-servers")?;
        debug!(servers = servers.len(), "listed state servers");
        Ok(servers)
    }

    #[instrument(skip(self))]
    pub async fn get_environment(
        &self,
        owner: &str,
        name: &str,
    ) -> Result<Value, CharmstoreClientError> {
        self.get(&self.url(&["env", owner, name])).await
    }

    #[instrument(skip(self, environment), fields(name = %environment.name))]
    pub async fn new_environment(
        &self,
        owner: &str,
        environment: &NewEnvironment,
    ) -> Result<Value, CharmstoreClientError> {
        request_json(
            &self.transport,
            &self.url(&["env", owner]),
            Method::Post,
            Some(&environment.to_request_body()),
        )
        .await
    }

    async fn get(&self, url: &str) -> Result<Value, CharmstoreClientError> {
        request_json(&self.transport, url, Method::Get, None).await
    }

    fn url(&self, segments: &[&str]) -> String {
        let mut url = self.base_url.clone();
        for segment in segments {
            url.push('/');
            url.push_str(segment);
        }
        url
    }
}

fn take_list(mut body: Value, field: &'static str) -> Result<Vec<Value>, ShapeError> {
    match body.get_mut(field).map(Value::take) {
        Some(Value::Array(items)) => Ok(items),
        _ => Err(ShapeError::MissingField(field)),
    }
}

#[cfg(test)]
mod tests {
    use httpmock::Method::POST;
    use httpmock::MockServer;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::transport::{MockTransport, TransportRequest};

    fn mock_client() -> (EnvironmentClient, MockTransport) {
        let transport = MockTransport::new();
        let config = EnvironmentClientConfig {
            jem_url: "https://jem.example.com".to_string(),
            ..Default::default()
        };
        (
            EnvironmentClient::with_transport(&config, transport.clone()),
            transport,
        )
    }

    fn new_environment() -> NewEnvironment {
        NewEnvironment {
            name: "staging".to_string(),
            password: "hunter2".to_string(),
            template: "aws-default".to_string(),
            state_server: "admin/aws".to_string(),
        }
    }

    #[tokio::test]
    async fn list_environments_unwraps_field() {
        let (client, transport) = mock_client();
        transport.push_json(&json!({
            "environments": [{"path": "admin/prod"}, {"path": "admin/dev"}]
        }));

        let environments = client.list_environments().await.unwrap();

        assert_eq!(environments, vec![
            json!({"path": "admin/prod"}),
            json!({"path": "admin/dev"})
        ]);
        assert_eq!(transport.requests()[0].url, "https://jem.example.com/v1/env");
    }

    #[tokio::test]
    async fn list_servers_unwraps_field() {
        let (client, transport) = mock_client();
        transport.push_json(&json!({"state-servers": [{"path": "admin/aws"}]}));

        let servers = client.list_servers().await.unwrap();

        assert_eq!(servers, vec![json!({"path": "admin/aws"})]);
        assert_eq!(transport.requests()[0].url, "https://jem.example.com/v1/server");
    }

    #[tokio::test]
    async fn missing_list_field_is_shape_error() {
        let (client, transport) = mock_client();
        transport.push_json(&json!({"servers": []}));

        let err = client.list_servers().await.unwrap_err();
        assert!(
            matches!(
                err,
                CharmstoreClientError::Shape(ShapeError::MissingField("state-servers"))
            ),
            "{err:?}"
        );
    }

    #[tokio::test]
    async fn get_environment_path() {
        let (client, transport) = mock_client();
        transport.push_json(&json!({"path": "admin/prod", "uuid": "1234"}));

        let environment = client.get_environment("admin", "prod").await.unwrap();

        assert_eq!(environment["uuid"], json!("1234"));
        assert_eq!(
            transport.requests()[0].url,
            "https://jem.example.com/v1/env/admin/prod"
        );
    }

    #[tokio::test]
    async fn new_environment_posts_body() {
        let (client, transport) = mock_client();
        transport.push_json(&json!({}));

        client
            .new_environment("admin", &new_environment())
            .await
            .unwrap();

        let TransportRequest { url, method, body } = transport.requests().remove(0);
        assert_eq!(url, "https://jem.example.com/v1/env/admin");
        assert_eq!(method, Method::Post);
        assert_eq!(
            serde_json::from_str::<Value>(&body.unwrap()).unwrap(),
            json!({
                "name": "staging",
                "password": "hunter2",
                "templates": ["aws-default"],
                "state-server": "admin/aws"
            })
        );
    }

    #[tokio::test]
    async fn failure_uses_lowercase_message() {
        let (client, transport) = mock_client();
        transport.push_failure(403, r#"{"message":"unauthorized"}"#);

        let err = client.list_environments().await.unwrap_err();
        assert_eq!(err.to_string(), "unauthorized");
    }

    #[test]
    fn trailing_slash_is_not_doubled() {
        let config = EnvironmentClientConfig {
            jem_url: "https://jem.example.com/".to_string(),
            ..Default::default()
        };
        let client = EnvironmentClient::with_transport(&config, MockTransport::new());
        assert_eq!(client.url(&["env"]), "https://jem.example.com/v1/env");
    }

    #[tokio::test]
    async fn http_new_environment() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/v1/env/admin")
                .header("authorization", "bearer t0ken")
                .json_body(json!({
                    "name": "staging",
                    "password": "hunter2",
                    "templates": ["aws-default"],
                    "state-server": "admin/aws"
                }));
            then.status(200).json_body(json!({"path": "admin/staging"}));
        });

        let client = EnvironmentClient::new(EnvironmentClientConfig {
            jem_url: server.base_url(),
            auth_token: Some("t0ken".to_string()),
            ..Default::default()
        })
        .unwrap();

        let created = client
            .new_environment("admin", &new_environment())
            .await
            .unwrap();
        assert_eq!(created, json!({"path": "admin/staging"}));
        mock.assert();
    }
}

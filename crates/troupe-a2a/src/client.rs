//! A2A HTTP client.
//!
//! The client fetches a remote agent's capability card from the
//! well-known discovery path and sends invocation requests. It does
//! **not** retry failed requests; retry policy belongs to the caller.
//!
//! # Error mapping
//!
//! | Failure | Error |
//! |---------|-------|
//! | Connect/transport failure, 5xx | [`A2aError::Unavailable`] |
//! | 4xx, undecodable body | [`A2aError::Protocol`] |

use std::sync::Arc;
use std::time::Duration;

use reqwest::{Client, StatusCode};
use tracing::{debug, info};
use url::Url;

use crate::card::{CAPABILITY_CARD_PATH, CapabilityCard};
use crate::error::{A2aError, A2aResult, ErrorResponse};
use crate::invocation::{InvokeRequest, InvokeResponse};

/// Default timeout for HTTP requests
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// A2A client for communicating with a network-hosted agent.
///
/// The client is `Clone`-able and safe to share across tasks; the
/// underlying connection pool is reused across requests.
#[derive(Clone)]
pub struct A2aClient {
    /// Base URL of the remote agent
    base_url: Url,
    /// HTTP client
    http: Client,
    /// Cached capability card
    card: Option<Arc<CapabilityCard>>,
}

impl std::fmt::Debug for A2aClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("A2aClient")
            .field("base_url", &self.base_url.as_str())
            .field("has_card", &self.card.is_some())
            .finish()
    }
}

impl A2aClient {
    /// Create a client for the agent at `base_url`.
    pub fn new(base_url: impl AsRef<str>) -> A2aResult<Self> {
        let base_url = Url::parse(base_url.as_ref())?;

        let http = Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .user_agent(format!("troupe-a2a/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| A2aError::internal_error(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            base_url,
            http,
            card: None,
        })
    }

    /// Create a client with a custom HTTP client.
    pub fn with_http_client(base_url: impl AsRef<str>, http: Client) -> A2aResult<Self> {
        let base_url = Url::parse(base_url.as_ref())?;
        Ok(Self {
            base_url,
            http,
            card: None,
        })
    }

    /// The remote agent's base URL
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// The cached capability card, if discovery has run
    pub fn card(&self) -> Option<Arc<CapabilityCard>> {
        self.card.clone()
    }

    fn endpoint(&self, path: &str) -> A2aResult<Url> {
        self.base_url
            .join(path)
            .map_err(|e| A2aError::protocol_error(format!("Invalid endpoint path: {}", e)))
    }

    /// Fetch the capability card from the well-known discovery path.
    pub async fn fetch_card(&self) -> A2aResult<CapabilityCard> {
        let url = self.endpoint(CAPABILITY_CARD_PATH)?;

        debug!(url = %url, "Fetching capability card");

        let response = self.http.get(url).send().await.map_err(|e| {
            A2aError::unavailable(format!("Failed to fetch capability card: {}", e))
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(error_from_response(status, response).await);
        }

        let card: CapabilityCard = response.json().await.map_err(|e| {
            A2aError::protocol_error(format!("Failed to parse capability card: {}", e))
        })?;

        info!(agent = %card.name, url = %card.url, "Fetched capability card");

        Ok(card)
    }

    /// Fetch and cache the capability card.
    pub async fn discover(&mut self) -> A2aResult<Arc<CapabilityCard>> {
        let card = Arc::new(self.fetch_card().await?);
        self.card = Some(Arc::clone(&card));
        Ok(card)
    }

    /// Execute the remote agent.
    pub async fn invoke(&self, request: InvokeRequest) -> A2aResult<InvokeResponse> {
        let url = self.endpoint("/invoke")?;

        debug!(url = %url, "Sending invocation request");

        let response = self
            .http
            .post(url)
            .json(&request)
            .send()
            .await
            .map_err(|e| A2aError::unavailable(format!("Failed to send invocation: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(error_from_response(status, response).await);
        }

        let invoke_response: InvokeResponse = response.json().await.map_err(|e| {
            A2aError::protocol_error(format!("Failed to parse invocation response: {}", e))
        })?;

        Ok(invoke_response)
    }
}

/// Map a non-success HTTP response to an A2A error, keeping the server's
/// error message when the body carries one.
async fn error_from_response(status: StatusCode, response: reqwest::Response) -> A2aError {
    let message = match response.json::<ErrorResponse>().await {
        Ok(body) => body.message,
        Err(_) => format!("HTTP {}", status),
    };

    if status.is_server_error() {
        A2aError::unavailable(message)
    } else {
        A2aError::protocol_error(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use troupe_core::Content;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn invalid_base_url_is_rejected() {
        assert!(matches!(
            A2aClient::new("not a url").unwrap_err(),
            A2aError::Url(_)
        ));
    }

    #[tokio::test]
    async fn fetch_card_parses_the_well_known_document() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/.well-known/agent.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "name": "MathHelper",
                "description": "Checks primes",
                "url": server.uri(),
            })))
            .mount(&server)
            .await;

        let client = A2aClient::new(server.uri()).unwrap();
        let card = client.fetch_card().await.unwrap();
        assert_eq!(card.name, "MathHelper");
        assert_eq!(card.description, "Checks primes");
    }

    #[tokio::test]
    async fn discover_caches_the_card() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/.well-known/agent.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "name": "MathHelper",
                "description": "Checks primes",
                "url": server.uri(),
            })))
            .expect(1)
            .mount(&server)
            .await;

        let mut client = A2aClient::new(server.uri()).unwrap();
        client.discover().await.unwrap();
        assert_eq!(client.card().unwrap().name, "MathHelper");
    }

    #[tokio::test]
    async fn unreachable_agent_is_unavailable() {
        // Nothing listens on this port.
        let client = A2aClient::new("http://127.0.0.1:1").unwrap();
        let err = client.fetch_card().await.unwrap_err();
        assert!(matches!(err, A2aError::Unavailable { .. }));
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn malformed_body_is_a_protocol_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/invoke"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let client = A2aClient::new(server.uri()).unwrap();
        let err = client
            .invoke(InvokeRequest::new(Content::user_text("hi")))
            .await
            .unwrap_err();
        assert!(matches!(err, A2aError::Protocol { .. }));
    }

    #[tokio::test]
    async fn server_error_maps_to_unavailable_with_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/invoke"))
            .respond_with(ResponseTemplate::new(500).set_body_json(json!({
                "code": 500,
                "message": "Agent execution failed: boom",
            })))
            .mount(&server)
            .await;

        let client = A2aClient::new(server.uri()).unwrap();
        let err = client
            .invoke(InvokeRequest::new(Content::user_text("hi")))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            A2aError::Unavailable { ref message } if message.contains("boom")
        ));
    }
}

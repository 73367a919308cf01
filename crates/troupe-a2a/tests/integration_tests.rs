//! Integration tests for A2A client/server interaction.
//!
//! These spin up a real server on an ephemeral port and drive it with the
//! client, covering discovery, invocation, context passing, and error
//! signaling.

#![cfg(all(feature = "client", feature = "server"))]

use async_trait::async_trait;
use troupe_a2a::{
    A2aClient, A2aError, A2aServer, CapabilityCard, InvocationError, InvocationHandler,
    InvokeRequest, InvokeResponse,
};
use troupe_core::Content;

/// An agent that echoes messages back
struct EchoHandler;

#[async_trait]
impl InvocationHandler for EchoHandler {
    fn capability_card(&self) -> CapabilityCard {
        CapabilityCard::new("echo-agent", "Echoes the input message", "http://localhost")
    }

    async fn invoke(&self, request: InvokeRequest) -> Result<InvokeResponse, InvocationError> {
        let text = request.input.text();
        Ok(InvokeResponse::new(Content::agent_text(format!(
            "Echo: {}",
            text
        ))))
    }
}

/// An agent that reports the context entries it was handed
struct StateReportingHandler;

#[async_trait]
impl InvocationHandler for StateReportingHandler {
    fn capability_card(&self) -> CapabilityCard {
        CapabilityCard::new("state-agent", "Reports received context", "http://localhost")
    }

    async fn invoke(&self, request: InvokeRequest) -> Result<InvokeResponse, InvocationError> {
        let mut keys: Vec<&str> = request.state.keys().map(|k| k.as_str()).collect();
        keys.sort_unstable();
        Ok(InvokeResponse::new(Content::agent_text(keys.join(","))))
    }
}

/// An agent whose runs always fail
struct FailingHandler;

#[async_trait]
impl InvocationHandler for FailingHandler {
    fn capability_card(&self) -> CapabilityCard {
        CapabilityCard::new("failing-agent", "Always fails", "http://localhost")
    }

    async fn invoke(&self, _request: InvokeRequest) -> Result<InvokeResponse, InvocationError> {
        Err(InvocationError::failed("model quota exhausted"))
    }
}

async fn spawn_server<H: InvocationHandler>(handler: H) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let router = A2aServer::new(handler).router();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

#[tokio::test]
async fn client_discovers_served_card() {
    let url = spawn_server(EchoHandler).await;
    let mut client = A2aClient::new(&url).unwrap();

    let card = client.discover().await.unwrap();
    assert_eq!(card.name, "echo-agent");
    assert_eq!(card.description, "Echoes the input message");
}

#[tokio::test]
async fn invoke_round_trips_content() {
    let url = spawn_server(EchoHandler).await;
    let client = A2aClient::new(&url).unwrap();

    let response = client
        .invoke(InvokeRequest::new(Content::user_text("is 7 prime?")))
        .await
        .unwrap();

    assert_eq!(response.content.text(), "Echo: is 7 prime?");
}

#[tokio::test]
async fn invoke_carries_context_entries() {
    let url = spawn_server(StateReportingHandler).await;
    let client = A2aClient::new(&url).unwrap();

    let state = [
        ("city".to_string(), "Tokyo".to_string()),
        ("budget".to_string(), "low".to_string()),
    ]
    .into_iter()
    .collect();

    let response = client
        .invoke(InvokeRequest::new(Content::user_text("plan")).with_state(state))
        .await
        .unwrap();

    assert_eq!(response.content.text(), "budget,city");
}

#[tokio::test]
async fn handler_failure_surfaces_as_unavailable_with_message() {
    let url = spawn_server(FailingHandler).await;
    let client = A2aClient::new(&url).unwrap();

    let err = client
        .invoke(InvokeRequest::new(Content::user_text("hi")))
        .await
        .unwrap_err();

    // A 500 from the remote side is a delegation failure the caller may
    // retry; the server's message is preserved for diagnosis.
    assert!(matches!(
        err,
        A2aError::Unavailable { ref message } if message.contains("model quota exhausted")
    ));
}

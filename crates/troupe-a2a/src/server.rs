//! A2A HTTP server.
//!
//! Publishes a local agent's capability card at the well-known discovery
//! path and accepts remote invocation requests. The server knows nothing
//! about agent execution; an [`InvocationHandler`] supplies the card and
//! runs each invocation.

use std::sync::Arc;

use async_trait::async_trait;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router, extract::State};
use tower_http::cors::{Any, CorsLayer};
use tracing::{debug, info};

use crate::card::{CAPABILITY_CARD_PATH, CapabilityCard};
use crate::error::{A2aError, A2aResult, ErrorResponse, InvocationError};
use crate::invocation::{InvokeRequest, InvokeResponse};

/// Behavior behind the A2A server endpoints.
///
/// The handler runs each invocation exactly as a local user turn would
/// run; how it scopes sessions and collects the resulting content is its
/// own concern.
#[async_trait]
pub trait InvocationHandler: Send + Sync + 'static {
    /// The capability card to publish
    fn capability_card(&self) -> CapabilityCard;

    /// Execute one remote invocation
    async fn invoke(&self, request: InvokeRequest) -> Result<InvokeResponse, InvocationError>;
}

/// A2A server exposing an [`InvocationHandler`] over HTTP.
pub struct A2aServer<H: InvocationHandler> {
    handler: Arc<H>,
}

impl<H: InvocationHandler> A2aServer<H> {
    /// Create a server around the given handler
    pub fn new(handler: H) -> Self {
        Self {
            handler: Arc::new(handler),
        }
    }

    /// Build the axum router for this server
    pub fn router(&self) -> Router {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);

        Router::new()
            .route(CAPABILITY_CARD_PATH, get(get_card::<H>))
            .route("/invoke", post(post_invoke::<H>))
            .with_state(Arc::clone(&self.handler))
            .layer(cors)
    }

    /// Serve on the given address until the task is dropped
    pub async fn serve(self, addr: &str) -> A2aResult<()> {
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| A2aError::internal_error(format!("Failed to bind to {}: {}", addr, e)))?;

        let card = self.handler.capability_card();
        info!(agent = %card.name, address = %addr, "A2A server starting");

        let router = self.router();
        axum::serve(listener, router)
            .await
            .map_err(|e| A2aError::internal_error(format!("Server error: {}", e)))?;

        Ok(())
    }
}

/// GET /.well-known/agent.json, capability discovery
async fn get_card<H: InvocationHandler>(State(handler): State<Arc<H>>) -> Json<CapabilityCard> {
    let card = handler.capability_card();
    debug!(agent = %card.name, "Serving capability card");
    Json(card)
}

/// POST /invoke, remote invocation
async fn post_invoke<H: InvocationHandler>(
    State(handler): State<Arc<H>>,
    Json(request): Json<InvokeRequest>,
) -> Result<Json<InvokeResponse>, ApiError> {
    debug!("Received invocation request");
    let response = handler.invoke(request).await.map_err(ApiError)?;
    Ok(Json(response))
}

/// Axum-facing wrapper mapping handler failures to JSON error bodies.
struct ApiError(InvocationError);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body: ErrorResponse = (&self.0).into();
        let status =
            StatusCode::from_u16(body.code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(body)).into_response()
    }
}

//! # Troupe A2A
//!
//! Agent-to-agent delegation: capability discovery and remote invocation.
//!
//! A local agent treats a network-hosted agent as a sub-agent by fetching
//! its [`CapabilityCard`] from `/.well-known/agent.json` and sending
//! invocation requests to `/invoke`. The `client` feature provides the
//! HTTP client, the `server` feature the axum server; transport framing
//! below request/response shape and failure signaling is out of scope.

pub mod card;
pub mod error;
pub mod invocation;

#[cfg(feature = "client")]
pub mod client;

#[cfg(feature = "server")]
pub mod server;

pub use card::{CAPABILITY_CARD_PATH, CapabilityCard};
pub use error::{A2aError, A2aResult, ErrorResponse, InvocationError};
pub use invocation::{InvokeRequest, InvokeResponse};

#[cfg(feature = "client")]
pub use client::A2aClient;

#[cfg(feature = "server")]
pub use server::{A2aServer, InvocationHandler};

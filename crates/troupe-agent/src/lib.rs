//! # Troupe Agent
//!
//! The agent tree and its runner: model-backed leaf agents, sequential
//! and parallel workflow composites, remote (A2A) proxies, and the
//! runner that drives a tree over a session while streaming events.
//!
//! ## Composition model
//!
//! Agents form a closed set of variants built once and never mutated;
//! all run state travels in a request-scoped context. A sequential
//! composite threads the context through its children in order; a
//! parallel composite hands each child a snapshot and merges their
//! writes only after the whole wave joins; a remote proxy forwards the
//! request to a network-hosted agent discovered through its capability
//! card.
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use troupe_agent::{Agent, LlmAgentConfig, Runner, RunnerConfig, WorkflowConfig};
//! use troupe_core::{Content, InMemorySessionStore, SessionKey};
//!
//! let scouts = Agent::parallel(
//!     WorkflowConfig::new("CityScouts")
//!         .with_description("Scouts for restaurants and activities in parallel.")
//!         .with_child(restaurant_scout)
//!         .with_child(activity_scout),
//! )?;
//! let pipeline = Agent::sequential(
//!     WorkflowConfig::new("TripPlannerPipeline")
//!         .with_description("Executes scouting and then planning.")
//!         .with_child(Arc::new(scouts))
//!         .with_child(planner),
//! )?;
//!
//! let store = Arc::new(InMemorySessionStore::new());
//! let runner = Runner::new(RunnerConfig::new("TripPlannerApp", Arc::new(pipeline), store.clone()))?;
//!
//! store.create(SessionKey::new("TripPlannerApp", "user1", "s1")).await?;
//! let mut stream = runner.run("user1", "s1", Content::user_text("Plan a trip to Tokyo")).await?;
//! while let Some(event) = stream.next_event().await {
//!     println!("{:?}", event?);
//! }
//! ```

pub mod agent;
pub mod bridge;
pub mod error;
pub mod llm;
pub mod remote;
pub mod runner;
pub mod workflow;

mod context;

pub use agent::Agent;
pub use bridge::{A2A_USER_ID, RunnerBridge};
pub use error::{AgentError, RunError};
pub use llm::{LlmAgentConfig, TRANSFER_TOOL_NAME};
pub use remote::RemoteAgentConfig;
pub use runner::{RunOptions, RunStream, Runner, RunnerConfig, USER_AUTHOR};
pub use workflow::WorkflowConfig;

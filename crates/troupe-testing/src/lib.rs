//! # Troupe Testing
//!
//! Mock implementations of the model and tool boundaries for reliable,
//! controlled agent tests: a scripted [`MockModel`] that records every
//! request, and a [`MockTool`] with per-argument responses and call
//! history.

pub mod mock_model;
pub mod mock_tools;

pub use mock_model::MockModel;
pub use mock_tools::MockTool;

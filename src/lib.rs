//! Workspace host for the Troupe runtime.
//!
//! The runtime lives in the member crates under `crates/`; this package
//! hosts the workspace-level integration tests and re-exports the facade
//! for them.

pub use troupe::*;

// src/exec/mod.rs

//! Run execution.
//!
//! - [`state`] holds the per-run bookkeeping types: node states, retry
//!   policy, failures, and the final [`state::RunResult`].
//! - [`executor`] drives a validated task graph to completion, layer by
//!   layer, with concurrent execution inside each layer.

pub mod executor;
pub mod state;

pub use executor::Executor;
pub use state::{NodeFailure, NodeState, RetryPolicy, RunOutcome, RunResult};

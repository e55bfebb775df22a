// src/exec/state.rs

use std::collections::BTreeMap;
use std::time::Duration;

use crate::errors::TaskError;

/// Per-run state of a single node.
///
/// `Pending -> Running -> {Succeeded | Failed}`; a failed attempt goes back
/// through the retry loop until retries are exhausted. Nodes still `Pending`
/// when the run ends were skipped (unsatisfied dependency, fail-fast abort,
/// or cancellation).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeState {
    Pending,
    Running,
    Succeeded,
    Failed,
}

/// Retry configuration for one run, decoupled from graph shape.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Additional attempts after the first failure.
    pub max_retries: u32,
    /// Fixed delay between attempts.
    pub retry_delay: Duration,
    /// If true, a terminal node failure aborts all later layers; if false,
    /// independent branches keep running and only dependents are skipped.
    pub fail_fast: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 1,
            retry_delay: Duration::from_secs(5),
            fail_fast: false,
        }
    }
}

/// Terminal outcome of a whole run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Succeeded,
    Failed,
    Cancelled,
}

/// Why a node ended up terminal-`Failed`.
#[derive(Debug)]
pub struct NodeFailure {
    pub error: TaskError,
    /// Attempts actually made, retries included.
    pub attempts: u32,
}

/// Everything a caller learns about one run. Created fresh per run and
/// returned by value; the executor keeps nothing behind.
#[derive(Debug)]
pub struct RunResult {
    pub outcome: RunOutcome,
    /// Terminal state of every node in the graph.
    pub states: BTreeMap<String, NodeState>,
    /// Last error and attempt count per failed node.
    pub failures: BTreeMap<String, NodeFailure>,
    /// Rows loaded per bulk-load node that succeeded.
    pub rows_loaded: BTreeMap<String, u64>,
}

impl RunResult {
    pub fn is_success(&self) -> bool {
        self.outcome == RunOutcome::Succeeded
    }

    pub fn state(&self, id: &str) -> Option<NodeState> {
        self.states.get(id).copied()
    }

    /// Nodes that never started: their state is still `Pending`.
    pub fn skipped(&self) -> Vec<&str> {
        self.states
            .iter()
            .filter(|(_, s)| **s == NodeState::Pending)
            .map(|(id, _)| id.as_str())
            .collect()
    }
}

// src/exec/executor.rs

use std::collections::BTreeMap;
use std::sync::Arc;

use tokio::task::JoinSet;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::actions::Action;
use crate::dag::TaskGraph;
use crate::errors::{GraphError, StoreError, TaskError};
use crate::exec::state::{NodeFailure, NodeState, RetryPolicy, RunOutcome, RunResult};
use crate::store::StagingStore;

/// Drives a task graph to completion against one staging store.
///
/// Scheduling model: layers run strictly in order; every node of a layer
/// whose dependencies all succeeded is launched concurrently, and the next
/// layer starts only once the whole layer is terminal. That barrier is what
/// turns a foreign-key dependency (items after orders) into a guarantee
/// instead of a race.
///
/// The executor holds no store state of its own; all mutation happens inside
/// node actions.
pub struct Executor {
    store: Arc<dyn StagingStore>,
}

/// Result of one node's attempt loop, reported back from its tokio task.
#[derive(Debug)]
enum NodeRun {
    Succeeded { rows: u64 },
    Failed { error: TaskError, attempts: u32 },
}

impl Executor {
    pub fn new(store: Arc<dyn StagingStore>) -> Self {
        Self { store }
    }

    /// Run the graph to a terminal [`RunResult`].
    ///
    /// Graph errors surface before any store mutation. Node errors are
    /// retried per `policy`, then recorded in the result; they never abort
    /// siblings in the same layer. On cancellation, in-flight attempts finish
    /// but no retries or new nodes start, and the outcome is `Cancelled`.
    pub async fn run(
        &self,
        graph: &TaskGraph,
        policy: &RetryPolicy,
        cancel: CancellationToken,
    ) -> Result<RunResult, GraphError> {
        let layers = graph.topological_layers()?;

        let mut states: BTreeMap<String, NodeState> = graph
            .ids()
            .map(|id| (id.to_string(), NodeState::Pending))
            .collect();
        let mut failures: BTreeMap<String, NodeFailure> = BTreeMap::new();
        let mut rows_loaded: BTreeMap<String, u64> = BTreeMap::new();
        let mut cancelled = false;

        info!(nodes = states.len(), layers = layers.len(), "run started");

        for (depth, layer) in layers.iter().enumerate() {
            if cancel.is_cancelled() {
                info!(layer = depth, "run cancelled; not starting further layers");
                cancelled = true;
                break;
            }

            let mut join_set: JoinSet<(String, NodeRun)> = JoinSet::new();

            for id in layer {
                let Some(node) = graph.node(id) else {
                    continue;
                };

                let blocked = node
                    .depends_on
                    .iter()
                    .any(|dep| states.get(dep) != Some(&NodeState::Succeeded));
                if blocked {
                    // Stays Pending: reported as skipped. Its own dependents
                    // will see a non-succeeded dependency and skip too.
                    warn!(task = %id, "skipping; a dependency did not succeed");
                    continue;
                }

                states.insert(id.clone(), NodeState::Running);
                debug!(task = %id, layer = depth, "dispatching");

                let task_id = id.clone();
                let action = node.action.clone();
                let store = Arc::clone(&self.store);
                let policy = policy.clone();
                let cancel = cancel.clone();
                join_set.spawn(async move {
                    let run = run_node(&task_id, &action, store.as_ref(), &policy, &cancel).await;
                    (task_id, run)
                });
            }

            let mut layer_failed = false;
            while let Some(joined) = join_set.join_next().await {
                match joined {
                    Ok((id, NodeRun::Succeeded { rows })) => {
                        states.insert(id.clone(), NodeState::Succeeded);
                        if rows > 0 {
                            rows_loaded.insert(id, rows);
                        }
                    }
                    Ok((id, NodeRun::Failed { error, attempts })) => {
                        states.insert(id.clone(), NodeState::Failed);
                        failures.insert(id, NodeFailure { error, attempts });
                        layer_failed = true;
                    }
                    Err(join_err) => {
                        error!(error = %join_err, "node task aborted");
                        layer_failed = true;
                    }
                }
            }

            // A join error leaves its node Running; close the bookkeeping.
            for id in layer {
                if states.get(id.as_str()) == Some(&NodeState::Running) {
                    states.insert(id.clone(), NodeState::Failed);
                    failures.insert(
                        id.clone(),
                        NodeFailure {
                            error: TaskError::Store(StoreError::Execute(
                                "task aborted unexpectedly".to_string(),
                            )),
                            attempts: 0,
                        },
                    );
                }
            }

            if cancel.is_cancelled() {
                info!(layer = depth, "run cancelled; in-flight layer finished");
                cancelled = true;
                break;
            }

            if policy.fail_fast && layer_failed {
                warn!(layer = depth, "fail-fast: aborting remaining layers");
                break;
            }
        }

        let outcome = if cancelled {
            RunOutcome::Cancelled
        } else if failures.is_empty() && states.values().all(|s| *s == NodeState::Succeeded) {
            RunOutcome::Succeeded
        } else {
            RunOutcome::Failed
        };

        let result = RunResult {
            outcome,
            states,
            failures,
            rows_loaded,
        };
        info!(
            outcome = ?result.outcome,
            failed = result.failures.len(),
            skipped = result.skipped().len(),
            "run finished"
        );
        Ok(result)
    }
}

/// Attempt loop for one node: run the action, retry with a fixed delay while
/// retries remain and the run is not cancelled.
async fn run_node(
    id: &str,
    action: &Action,
    store: &dyn StagingStore,
    policy: &RetryPolicy,
    cancel: &CancellationToken,
) -> NodeRun {
    let max_attempts = policy.max_retries.saturating_add(1);
    let mut attempt = 0u32;

    loop {
        attempt += 1;
        info!(task = %id, attempt, "starting attempt");

        match action.run(store).await {
            Ok(rows) => {
                info!(task = %id, attempt, rows, "attempt succeeded");
                return NodeRun::Succeeded { rows };
            }
            Err(error) => {
                if attempt >= max_attempts {
                    warn!(task = %id, attempt, error = %error, "retries exhausted");
                    return NodeRun::Failed { error, attempts: attempt };
                }
                if cancel.is_cancelled() {
                    warn!(task = %id, attempt, error = %error, "cancelled; not retrying");
                    return NodeRun::Failed { error, attempts: attempt };
                }

                warn!(
                    task = %id,
                    attempt,
                    delay = ?policy.retry_delay,
                    error = %error,
                    "attempt failed; retrying"
                );
                tokio::select! {
                    _ = cancel.cancelled() => {
                        return NodeRun::Failed { error, attempts: attempt };
                    }
                    _ = sleep(policy.retry_delay) => {}
                }
            }
        }
    }
}

// src/errors.rs

//! Error taxonomy for stagedag.
//!
//! Three families with different lifecycles:
//!
//! - [`GraphError`]: raised while building/validating a task graph, always
//!   before any store mutation. Fatal to the run, never retried.
//! - [`LoadError`] / [`StoreError`]: raised inside a node's action against the
//!   staging store. Retried per the run's retry policy, then terminal for that
//!   node (and, via dependency gating, its transitive dependents).
//! - Cancellation is not an error; it is reported as a run outcome.

use thiserror::Error;

/// Structural problems with a task graph.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GraphError {
    #[error("duplicate task id '{0}'")]
    DuplicateId(String),

    #[error("task '{node}' depends on unknown task '{dependency}'")]
    UnknownDependency { node: String, dependency: String },

    #[error("cycle detected in task graph involving '{0}'")]
    CycleDetected(String),
}

/// Failures of the staging store itself: statements, connectivity, io.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("statement failed: {0}")]
    Execute(String),

    #[error("store connection failed: {0}")]
    Connection(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// A bulk load into one staged record set failed.
///
/// Loads are atomic per target: when this error is returned, zero rows from
/// the offending extract were committed.
#[derive(Debug, Error)]
#[error("loading into '{target}': {cause}")]
pub struct LoadError {
    pub target: String,
    #[source]
    pub cause: LoadErrorKind,
}

#[derive(Debug, Error)]
pub enum LoadErrorKind {
    #[error("unknown target record set")]
    UnknownTarget,

    #[error("malformed row {line}: {detail}")]
    MalformedRow { line: u64, detail: String },

    #[error("duplicate primary key {key}")]
    DuplicateKey { key: i64 },

    #[error("row {line} references missing {referenced} {key}")]
    ForeignKey {
        line: u64,
        referenced: &'static str,
        key: i64,
    },

    #[error(transparent)]
    Csv(#[from] csv::Error),
}

/// Anything a single task node can fail with during execution.
#[derive(Debug, Error)]
pub enum TaskError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

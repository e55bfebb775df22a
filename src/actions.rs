// src/actions.rs

//! The store mutations a task node can perform.
//!
//! Every node in the graph carries exactly one [`Action`]; the executor never
//! touches the store itself, it only runs these. The four shapes cover the
//! statement groups of a staging run: truncate, DDL, bulk load, view rebuild.

use std::path::PathBuf;

use crate::errors::TaskError;
use crate::store::StagingStore;

#[derive(Debug, Clone)]
pub enum Action {
    /// Truncate the named record sets and restart their identity counters.
    /// Atomic relative to store readers.
    Reset { targets: Vec<String> },

    /// Create the staging tables if absent; never drops anything.
    EnsureSchema,

    /// Load one delimited, header-bearing extract into a record set.
    /// All-or-nothing per target.
    BulkLoad { target: String, source: PathBuf },

    /// Create or replace the denormalized join view.
    BuildView { name: String },
}

impl Action {
    /// Execute this action against the store.
    ///
    /// Returns the number of rows loaded; zero for everything but
    /// [`Action::BulkLoad`].
    pub async fn run(&self, store: &dyn StagingStore) -> Result<u64, TaskError> {
        match self {
            Action::Reset { targets } => {
                store.reset(targets).await?;
                Ok(0)
            }
            Action::EnsureSchema => {
                store.ensure_schema().await?;
                Ok(0)
            }
            Action::BulkLoad { target, source } => store.bulk_load(target, source).await,
            Action::BuildView { name } => {
                store.build_view(name).await?;
                Ok(0)
            }
        }
    }

    /// One-line description for logs and dry-run output.
    pub fn describe(&self) -> String {
        match self {
            Action::Reset { targets } => format!("reset {}", targets.join(", ")),
            Action::EnsureSchema => "ensure staging schema".to_string(),
            Action::BulkLoad { target, source } => {
                format!("bulk load {} from {}", target, source.display())
            }
            Action::BuildView { name } => format!("build view {name}"),
        }
    }
}

// src/lib.rs

pub mod actions;
pub mod cli;
pub mod config;
pub mod dag;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod pipeline;
pub mod store;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Result, anyhow};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::cli::CliArgs;
use crate::config::loader::load_and_validate;
use crate::dag::TaskGraph;
use crate::exec::{Executor, RunOutcome};
use crate::store::MemoryStore;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading
/// - graph construction for the product-status pipeline
/// - the staging store and executor
/// - Ctrl-C handling (mapped to run cancellation)
pub async fn run(args: CliArgs) -> Result<()> {
    let config_path = PathBuf::from(&args.config);
    let cfg = load_and_validate(&config_path)?;

    let logical_ts = args
        .logical_ts
        .clone()
        .unwrap_or_else(|| chrono::Utc::now().format("%Y-%m-%dT%H:%M:%S").to_string());

    let graph = pipeline::build_graph(&cfg, &logical_ts)?;

    if args.dry_run {
        print_dry_run(&graph, &logical_ts)?;
        return Ok(());
    }

    let mut policy = cfg.pipeline.retry_policy().map_err(|e| anyhow!(e))?;
    if args.fail_fast {
        policy.fail_fast = true;
    }

    let store = Arc::new(MemoryStore::new());

    // Ctrl-C: let in-flight attempts finish, start nothing new.
    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                eprintln!("failed to listen for Ctrl+C: {e}");
                return;
            }
            cancel.cancel();
        });
    }

    info!(
        pipeline = %cfg.pipeline.name,
        logical_ts = %logical_ts,
        "starting pipeline run"
    );

    let executor = Executor::new(store.clone());
    let result = executor.run(&graph, &policy, cancel).await?;

    for (id, rows) in &result.rows_loaded {
        info!(task = %id, rows, "rows loaded");
    }
    for (id, failure) in &result.failures {
        warn!(
            task = %id,
            attempts = failure.attempts,
            error = %failure.error,
            "node failed"
        );
    }

    match result.outcome {
        RunOutcome::Succeeded => {
            let view_rows = store.view_rows(&cfg.pipeline.view)?;
            info!(view = %cfg.pipeline.view, rows = view_rows.len(), "view rebuilt");
            Ok(())
        }
        RunOutcome::Failed => {
            let failed: Vec<&str> = result.failures.keys().map(|s| s.as_str()).collect();
            let skipped = result.skipped();
            Err(anyhow!(
                "pipeline run failed (failed: {failed:?}, skipped: {skipped:?})"
            ))
        }
        RunOutcome::Cancelled => Err(anyhow!("pipeline run cancelled")),
    }
}

/// Print layers and actions without executing anything.
fn print_dry_run(graph: &TaskGraph, logical_ts: &str) -> Result<()> {
    println!("stagedag dry-run (logical_ts = {logical_ts})");
    println!();

    let layers = graph.topological_layers()?;
    for (depth, layer) in layers.iter().enumerate() {
        println!("layer {depth}:");
        for id in layer {
            if let Some(node) = graph.node(id) {
                println!("  - {id}: {}", node.action.describe());
                if !node.depends_on.is_empty() {
                    println!("      after: {:?}", node.depends_on);
                }
            }
        }
    }

    Ok(())
}

// src/pipeline.rs

//! The product-status pipeline: graph wiring from configuration.
//!
//! Node ids are stable and exported so callers and tests can inspect
//! per-node results.

use std::path::PathBuf;

use crate::actions::Action;
use crate::config::model::ConfigFile;
use crate::dag::{TaskGraph, TaskNode};
use crate::errors::GraphError;
use crate::store::{ORDER_ITEMS, ORDERS, PRODUCTS, STAGED_TARGETS};

pub const TRUNCATE_STAGING: &str = "truncate_staging";
pub const CREATE_TABLES: &str = "create_tables";
pub const LOAD_ORDERS: &str = "load_orders";
pub const LOAD_ORDER_ITEMS: &str = "load_order_items";
pub const LOAD_PRODUCTS: &str = "load_products";
pub const CREATE_VIEW: &str = "create_view";

/// Build the staging task graph:
///
/// ```text
/// truncate_staging -> create_tables -> {load_orders, load_products}
/// load_order_items after load_orders        (FK: items reference orders)
/// create_view after all three loads
/// ```
///
/// Orders and products carry no ordering constraint between each other and
/// land in the same layer; order items must observe committed orders, so they
/// wait for `load_orders` explicitly.
///
/// `logical_ts` replaces the `{ts}` placeholder in source paths, letting a
/// scheduler point successive runs at successive extracts. The graph itself
/// is timestamp-agnostic beyond that substitution.
pub fn build_graph(cfg: &ConfigFile, logical_ts: &str) -> Result<TaskGraph, GraphError> {
    let mut graph = TaskGraph::new();

    graph.add_node(TaskNode::new(
        TRUNCATE_STAGING,
        Action::Reset {
            targets: STAGED_TARGETS.iter().map(|t| t.to_string()).collect(),
        },
    ))?;

    graph.add_node(TaskNode::new(CREATE_TABLES, Action::EnsureSchema).after(TRUNCATE_STAGING))?;

    graph.add_node(
        TaskNode::new(
            LOAD_ORDERS,
            Action::BulkLoad {
                target: ORDERS.to_string(),
                source: resolve_source(&cfg.source.orders, logical_ts),
            },
        )
        .after(CREATE_TABLES),
    )?;

    graph.add_node(
        TaskNode::new(
            LOAD_PRODUCTS,
            Action::BulkLoad {
                target: PRODUCTS.to_string(),
                source: resolve_source(&cfg.source.products, logical_ts),
            },
        )
        .after(CREATE_TABLES),
    )?;

    graph.add_node(
        TaskNode::new(
            LOAD_ORDER_ITEMS,
            Action::BulkLoad {
                target: ORDER_ITEMS.to_string(),
                source: resolve_source(&cfg.source.order_items, logical_ts),
            },
        )
        .after(LOAD_ORDERS),
    )?;

    graph.add_node(
        TaskNode::new(
            CREATE_VIEW,
            Action::BuildView {
                name: cfg.pipeline.view.clone(),
            },
        )
        .after(LOAD_ORDERS)
        .after(LOAD_ORDER_ITEMS)
        .after(LOAD_PRODUCTS),
    )?;

    graph.validate()?;
    Ok(graph)
}

/// Substitute the logical timestamp into a configured source path.
fn resolve_source(path: &str, logical_ts: &str) -> PathBuf {
    PathBuf::from(path.replace("{ts}", logical_ts))
}

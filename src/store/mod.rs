// src/store/mod.rs

//! Staging store contract and the in-process implementation.
//!
//! - [`StagingStore`] is the seam towards the relational backing store. The
//!   executor and actions only ever talk through this trait; connection and
//!   credential handling belong to implementors.
//! - [`records`] defines the staged record sets and the denormalized view row.
//! - [`memory`] is an in-process store used by the CLI and the tests. It
//!   enforces the same primary-key / foreign-key invariants a relational
//!   schema would.

pub mod memory;
pub mod records;

use std::path::Path;

use async_trait::async_trait;

use crate::errors::{StoreError, TaskError};

pub use memory::MemoryStore;
pub use records::{OrderItemRecord, OrderRecord, ProductRecord, ProductStatusRow};

/// Staged record set names, matching the extract schemas in [`records`].
pub const ORDERS: &str = "orders";
pub const ORDER_ITEMS: &str = "order_items";
pub const PRODUCTS: &str = "products";

/// All staged record sets, in no particular order.
pub const STAGED_TARGETS: [&str; 3] = [ORDERS, ORDER_ITEMS, PRODUCTS];

/// Contract consumed by the executor's actions.
///
/// All methods are safe to re-run: `ensure_schema` never drops anything,
/// `reset` always leaves the named record sets empty with identity counters
/// restarted, and `build_view` has create-or-replace semantics.
#[async_trait]
pub trait StagingStore: Send + Sync {
    /// Create the staging tables if absent. Never drops or alters data.
    async fn ensure_schema(&self) -> Result<(), StoreError>;

    /// Truncate the named record sets and restart their identity counters.
    ///
    /// Atomic relative to readers: no partial truncation is ever visible.
    async fn reset(&self, targets: &[String]) -> Result<(), StoreError>;

    /// Append all records from a delimited, header-bearing extract into
    /// `target`, returning the number of rows loaded.
    ///
    /// Loads are all-or-nothing per target: a malformed row, duplicate
    /// primary key or constraint violation commits zero rows.
    async fn bulk_load(&self, target: &str, source: &Path) -> Result<u64, TaskError>;

    /// Create or replace the denormalized join view. Never errors on
    /// "already exists"; the view always reflects current staged state.
    async fn build_view(&self, name: &str) -> Result<(), StoreError>;
}

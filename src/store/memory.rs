// src/store/memory.rs

//! In-process [`StagingStore`] backed by ordered maps.
//!
//! Used by the CLI and the integration tests. Behaves like the relational
//! schema it stands in for:
//!
//! - primary keys are unique per record set,
//! - `order_items.order_id` is foreign-key checked against `orders` at
//!   commit time,
//! - bulk loads are all-or-nothing per target (the whole extract is parsed
//!   and validated before the table is touched),
//! - the view is not materialized; [`MemoryStore::view_rows`] computes the
//!   join on demand so it always reflects current staged state.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::errors::{LoadError, LoadErrorKind, StoreError, TaskError};
use crate::store::records::{OrderItemRecord, OrderRecord, ProductRecord, ProductStatusRow};
use crate::store::{ORDER_ITEMS, ORDERS, PRODUCTS, StagingStore};

#[derive(Debug, Default)]
struct Tables {
    orders: BTreeMap<i64, OrderRecord>,
    order_items: BTreeMap<i64, OrderItemRecord>,
    products: BTreeMap<i64, ProductRecord>,
    views: BTreeSet<String>,
}

/// In-memory staging store. Cheap to clone handles via `Arc`.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of rows currently staged in `target`.
    pub fn row_count(&self, target: &str) -> Result<u64, StoreError> {
        let tables = self.lock();
        let n = match target {
            ORDERS => tables.orders.len(),
            ORDER_ITEMS => tables.order_items.len(),
            PRODUCTS => tables.products.len(),
            other => return Err(unknown_target(other)),
        };
        Ok(n as u64)
    }

    /// Rows of a previously built view, joined from current staged state.
    ///
    /// Inner join on `order_id` and `product_id`; items referencing a product
    /// that was never staged drop out, matching the view definition.
    pub fn view_rows(&self, name: &str) -> Result<Vec<ProductStatusRow>, StoreError> {
        let tables = self.lock();
        if !tables.views.contains(name) {
            return Err(StoreError::Execute(format!("unknown view '{name}'")));
        }

        let mut rows = Vec::new();
        for item in tables.order_items.values() {
            // order_id is FK-enforced at load time, so the order must exist.
            let Some(order) = tables.orders.get(&item.order_id) else {
                continue;
            };
            let Some(product) = tables.products.get(&item.product_id) else {
                continue;
            };
            rows.push(ProductStatusRow {
                order_id: order.order_id,
                order_date: order.order_date,
                product_id: item.product_id,
                product_name: product.product_name.clone(),
                product_category_id: product.product_category_id,
                quantity: item.quantity,
                subtotal: item.subtotal,
                total_price: item.total,
                order_status: order.order_status.clone(),
            });
        }
        Ok(rows)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Tables> {
        // Recover the inner state on poison; the tables themselves are only
        // mutated after full validation, so they stay consistent.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl StagingStore for MemoryStore {
    async fn ensure_schema(&self) -> Result<(), StoreError> {
        // The in-memory tables exist from construction; this is the
        // create-if-absent DDL slot for relational implementations.
        Ok(())
    }

    async fn reset(&self, targets: &[String]) -> Result<(), StoreError> {
        let mut tables = self.lock();
        // Validate every name before clearing anything, so a typo cannot
        // leave a partial truncation behind.
        for target in targets {
            match target.as_str() {
                ORDERS | ORDER_ITEMS | PRODUCTS => {}
                other => return Err(unknown_target(other)),
            }
        }
        for target in targets {
            match target.as_str() {
                ORDERS => tables.orders.clear(),
                ORDER_ITEMS => tables.order_items.clear(),
                PRODUCTS => tables.products.clear(),
                _ => unreachable!("validated above"),
            }
        }
        debug!(?targets, "record sets truncated");
        Ok(())
    }

    async fn bulk_load(&self, target: &str, source: &Path) -> Result<u64, TaskError> {
        let loaded = match target {
            ORDERS => {
                let rows = read_extract::<OrderRecord>(target, source)?;
                let mut tables = self.lock();
                let staged = validate_keys(target, &rows, |r| r.order_id, &tables.orders)?;
                tables.orders.extend(staged);
                rows.len()
            }
            ORDER_ITEMS => {
                let rows = read_extract::<OrderItemRecord>(target, source)?;
                let mut tables = self.lock();
                let staged =
                    validate_keys(target, &rows, |r| r.order_item_id, &tables.order_items)?;
                for (line, item) in &rows {
                    if !tables.orders.contains_key(&item.order_id) {
                        return Err(load_error(
                            target,
                            LoadErrorKind::ForeignKey {
                                line: *line,
                                referenced: "order",
                                key: item.order_id,
                            },
                        )
                        .into());
                    }
                }
                tables.order_items.extend(staged);
                rows.len()
            }
            PRODUCTS => {
                let rows = read_extract::<ProductRecord>(target, source)?;
                let mut tables = self.lock();
                let staged = validate_keys(target, &rows, |r| r.product_id, &tables.products)?;
                tables.products.extend(staged);
                rows.len()
            }
            other => return Err(load_error(other, LoadErrorKind::UnknownTarget).into()),
        };

        debug!(target, rows = loaded, "bulk load committed");
        Ok(loaded as u64)
    }

    async fn build_view(&self, name: &str) -> Result<(), StoreError> {
        let mut tables = self.lock();
        // Create-or-replace: re-defining an existing view is not an error.
        tables.views.insert(name.to_string());
        debug!(view = name, "view (re)built");
        Ok(())
    }
}

fn unknown_target(target: &str) -> StoreError {
    StoreError::Execute(format!("unknown record set '{target}'"))
}

fn load_error(target: &str, cause: LoadErrorKind) -> LoadError {
    LoadError {
        target: target.to_string(),
        cause,
    }
}

/// Parse a whole extract up front, pairing each record with its 1-based file
/// line (header is line 1). Nothing is committed from here.
fn read_extract<T: DeserializeOwned>(
    target: &str,
    source: &Path,
) -> Result<Vec<(u64, T)>, LoadError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(source)
        .map_err(|e| load_error(target, e.into()))?;

    let mut rows = Vec::new();
    for (idx, record) in reader.deserialize::<T>().enumerate() {
        let line = idx as u64 + 2;
        let record = record.map_err(|e| {
            load_error(
                target,
                LoadErrorKind::MalformedRow {
                    line,
                    detail: e.to_string(),
                },
            )
        })?;
        rows.push((line, record));
    }
    Ok(rows)
}

/// Check primary-key uniqueness of a batch against itself and the existing
/// table, returning the keyed rows ready to commit.
fn validate_keys<T: Clone>(
    target: &str,
    rows: &[(u64, T)],
    key: impl Fn(&T) -> i64,
    existing: &BTreeMap<i64, T>,
) -> Result<BTreeMap<i64, T>, LoadError> {
    let mut staged = BTreeMap::new();
    for (_, record) in rows {
        let k = key(record);
        if existing.contains_key(&k) || staged.insert(k, record.clone()).is_some() {
            return Err(load_error(target, LoadErrorKind::DuplicateKey { key: k }));
        }
    }
    Ok(staged)
}

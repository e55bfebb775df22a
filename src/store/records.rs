// src/store/records.rs

//! Staged record sets and the denormalized view row.
//!
//! Field order matches the column order of the source extracts, so the CSV
//! headers deserialize directly into these structs.

use chrono::NaiveDateTime;
use serde::{Deserialize, Deserializer};

/// One row of the `orders` record set.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct OrderRecord {
    pub order_id: i64,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub order_date: NaiveDateTime,
    pub customer_id: i64,
    pub order_status: String,
}

/// One row of the `order_items` record set.
///
/// `order_id` is foreign-key enforced against `orders` at load time;
/// `product_id` is not (dangling product references drop out of the view's
/// inner join instead).
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct OrderItemRecord {
    pub order_item_id: i64,
    pub order_id: i64,
    pub product_id: i64,
    pub quantity: i64,
    pub subtotal: f64,
    pub total: f64,
}

/// One row of the `products` record set.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ProductRecord {
    pub product_id: i64,
    pub product_category_id: i64,
    pub product_name: String,
}

/// One row of the product-status view: orders joined with order items and
/// products on their declared keys.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductStatusRow {
    pub order_id: i64,
    pub order_date: NaiveDateTime,
    pub product_id: i64,
    pub product_name: String,
    pub product_category_id: i64,
    pub quantity: i64,
    pub subtotal: f64,
    pub total_price: f64,
    pub order_status: String,
}

/// Timestamp formats accepted in extracts. Both the SQL-style space separator
/// and the ISO `T` separator occur in practice.
const TIMESTAMP_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

/// Parse an extract timestamp, trying each supported format in turn.
pub fn parse_timestamp(s: &str) -> Result<NaiveDateTime, String> {
    let s = s.trim();
    for fmt in TIMESTAMP_FORMATS {
        if let Ok(ts) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(ts);
        }
    }
    Err(format!("invalid timestamp '{s}'"))
}

fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw).map_err(serde::de::Error::custom)
}

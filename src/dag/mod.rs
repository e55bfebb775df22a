// src/dag/mod.rs

//! Task graph representation.
//!
//! - [`graph`] holds the validated DAG of task nodes and computes the
//!   topological layers the executor runs layer by layer.

pub mod graph;

pub use graph::{TaskGraph, TaskNode};

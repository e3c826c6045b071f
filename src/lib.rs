//! # mtdd: Multi-Terminal Decision Diagrams in Rust
//!
//! **`mtdd`** is a manager-centric library for **multi-terminal decision diagrams** (MTBDDs):
//! canonical, hash-consed graphs representing functions from boolean variables to arbitrary
//! leaf values. It is the symbolic substrate of a probabilistic model checker: transition
//! matrices, reward vectors and state sets are all diagrams, combined with `apply` and folded
//! with abstraction.
//!
//! ## Key Features
//!
//! - **Manager-Centric Architecture**: All operations go through a [`Context`][crate::context::Context],
//!   which owns the unique table, the leaf table and the operation cache.
//! - **Pluggable Leaves**: Leaves are [`Value`][crate::value::Value]s (booleans, big integers, rationals,
//!   reals, intervals). Evaluators come from an [`OperatorRegistry`][crate::registry::OperatorRegistry]
//!   that callers can extend, so the diagram algorithms never inspect leaf contents.
//! - **Reference Counting**: Every constructed diagram is handed out with one reference. Released
//!   nodes are reclaimed in batches by a collector that also purges the operation cache.
//! - **0-Based Variables**: Variables are dense indices in creation order, which is also the
//!   variable order.
//!
//! ## Basic Usage
//!
//! ```rust
//! use mtdd::context::Context;
//! use mtdd::operator::Operator;
//! use mtdd::value::{Value, ValueType};
//!
//! let ctx = Context::default();
//! let x0 = ctx.new_variable().unwrap();
//! let x1 = ctx.new_variable().unwrap();
//! let v0 = ctx.var_node(x0).unwrap();
//! let v1 = ctx.var_node(x1).unwrap();
//!
//! // f = x0 ? 3 : (x1 ? 5 : 7)
//! let c3 = ctx.new_constant(3).unwrap();
//! let c5 = ctx.new_constant(5).unwrap();
//! let c7 = ctx.new_constant(7).unwrap();
//! let g = ctx.apply(Operator::Ite, ValueType::Integer, &[v1, c5, c7]).unwrap();
//! let f = ctx.apply(Operator::Ite, ValueType::Integer, &[v0, c3, g]).unwrap();
//!
//! // Sum over all four assignments: 3 + 3 + 5 + 7
//! let cube = ctx.cube(&[x0, x1]).unwrap();
//! let total = ctx.abstract_sum(f, cube).unwrap();
//! assert_eq!(ctx.leaf_value(total), Some(Value::integer(18)));
//!
//! for h in [v0, v1, c3, c5, c7, g, f, cube, total] {
//!     ctx.release(h).unwrap();
//! }
//! ctx.check_consistent().unwrap();
//! ```
//!
//! ## Core Components
//!
//! - **[`context`]**: The [`Context`][crate::context::Context] manager, variables, constants and walkers.
//! - **[`apply`]**, **[`abstraction`]**, **[`permute`]**: The recursive algorithms.
//! - **[`sat`]**: Counting, finding and folding over satisfying assignments.
//! - **[`gc`]**: Collection and the `check_consistent` invariant checker.
//! - **[`registry`]**: Operator evaluators keyed by operand types.
//! - **[`backend`]**: The [`DdBackend`][crate::backend::DdBackend] trait that model-checking code targets.
//! - **[`dot`]**: Visualization with Graphviz.

pub mod abstraction;
pub mod apply;
pub mod backend;
pub mod cache;
pub mod config;
pub mod context;
pub mod debug;
pub mod dot;
pub mod error;
pub mod eval;
pub mod gc;
pub mod leaf;
pub mod node;
pub mod operator;
pub mod permute;
pub mod reference;
pub mod registry;
pub mod sat;
pub mod table;
pub mod types;
pub mod utils;
pub mod value;

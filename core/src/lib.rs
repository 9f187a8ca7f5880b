//! Fee determination engine for payment-processing analytics.
//!
//! DATA FLOW (one-way, fixed):
//!   reference data + rule model -> matcher -> specificity resolver
//!   -> pricing calculator -> query-layer reduction (sum, union,
//!   min/max).
//!
//! RULES:
//!   - The session snapshot is immutable; the engine never mutates
//!     reference data, only derives local overlay copies.
//!   - Per-transaction evaluation is stateless; all aggregation is an
//!     order-independent reduce.
//!   - The engine performs no I/O beyond loading a snapshot; text,
//!     HTTP, and report rendering belong to collaborators.

pub mod calendar;
pub mod dataset;
pub mod error;
pub mod matcher;
pub mod merchant;
pub mod overlay;
pub mod pricing;
pub mod query;
pub mod resolver;
pub mod rule;
pub mod snapshot;
pub mod stats;
pub mod transaction;
pub mod types;

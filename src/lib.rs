//! Cross-catalog playlist reconciliation: shared modules for the CLI.

pub mod catalog;
pub mod config;
pub mod error;
pub mod heuristic;
pub mod identity;
pub mod import;
pub mod local;
pub mod m3u;
pub mod matching;
pub mod models;
pub mod normalize;
pub mod progress;
pub mod reconcile;
pub mod safety;
pub mod sink;
pub mod snapshot;
pub mod store;

//! I/O helpers: policy files and JSON graph documents.

pub mod config;
pub mod json_graph;

//! Deterministic, pure logic: graph model, policy, paths and the traversal engine.
//!
//! Core modules must be free of I/O side effects. They operate on in-memory
//! data structures and return deterministic outputs suitable for tests.

pub mod engine;
pub mod graph;
pub mod introspect;
pub mod path;
pub mod policy;
pub mod report;

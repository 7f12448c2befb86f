//! Recursive predicate assertions over object graphs.
//!
//! Given an object graph and a predicate, the engine visits every reachable
//! field (including collection elements and map entries, subject to policy)
//! and reports the paths where the predicate failed. Cycles are collapsed by
//! identity, so each node is entered at most once per run.
//!
//! - **[`core`]**: Pure, deterministic logic (graph model, policy, paths,
//!   traversal). No I/O, fully testable in isolation.
//! - **[`io`]**: Policy files and JSON graph documents.
//!
//! [`check`] coordinates both for the `deepcheck` CLI.
//!
//! ```
//! use deepcheck::core::engine::RecursiveAssertion;
//! use deepcheck::core::graph::{Field, ObjectGraph, Slot};
//! use deepcheck::core::policy::AssertionPolicy;
//!
//! let mut graph = ObjectGraph::new();
//! let root = graph.object("demo::Person", vec![Field::new("name", "std::string::String", Slot::Null)]);
//!
//! let policy = AssertionPolicy::default();
//! let mut engine = RecursiveAssertion::new(&policy);
//! let failures = engine
//!     .assert_over_graph(&graph, root, |value| !value.is_null())
//!     .unwrap();
//! assert_eq!(failures[0].to_string(), "name");
//! ```

pub mod check;
pub mod core;
pub mod exit_codes;
pub mod io;
pub mod logging;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

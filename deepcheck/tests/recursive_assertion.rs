//! End-to-end traversal tests through the public API.
//!
//! Covers the authors/books graph (shared nodes and cycles through arrays and
//! collections) and a host-provided `Introspect` implementation whose field
//! enumeration can fail.

use std::cell::Cell;

use deepcheck::core::engine::RecursiveAssertion;
use deepcheck::core::graph::{Field, GraphError, NodeId, ObjectGraph, Slot};
use deepcheck::core::introspect::{Introspect, Subject};
use deepcheck::core::policy::{AssertionPolicy, CollectionPolicy};
use deepcheck::core::report::AssertionFailure;
use deepcheck::test_support::{authors_and_books, paths};

/// Author graph with cycles:
/// ```text
/// pramod ─books─> [NoSql Distilled] ─authors─> [pramod, martin]
/// martin ─books─> [NoSql Distilled, Refactoring]
/// Refactoring ─authors─> [martin, kent] ; kent ─books─> [Refactoring]
/// ```
#[test]
fn author_graph_visits_every_author_once() {
    let (graph, pramod) = authors_and_books();
    let policy = AssertionPolicy::default();
    let mut engine = RecursiveAssertion::new(&policy);

    let mut names = Vec::new();
    let failures = engine
        .assert_over_graph(&graph, pramod, |subject| {
            if let Some(text) = subject.as_str() {
                names.push(text.to_string());
            }
            !text_contains(subject, "Fowler")
        })
        .expect("traverse");

    let authors: Vec<&str> = names
        .iter()
        .map(String::as_str)
        .filter(|name| name.ends_with("Sadalage") || name.ends_with("Fowler") || name.ends_with("Beck"))
        .collect();
    assert_eq!(authors, vec!["Pramod Sadalage", "Martin Fowler", "Kent Beck"]);
    assert_eq!(
        failures.iter().map(ToString::to_string).collect::<Vec<_>>(),
        vec!["books[0].authors[1].name"]
    );
}

#[test]
fn elements_only_never_passes_containers_to_predicate() {
    let (graph, pramod) = authors_and_books();
    let policy = AssertionPolicy::builder()
        .collection_policy(CollectionPolicy::ElementsOnly)
        .build();
    let mut engine = RecursiveAssertion::new(&policy);

    let failures = engine
        .assert_over_graph(&graph, pramod, |subject| {
            !matches!(subject.type_name(), Some("std::vec::Vec" | "[library::Author]"))
        })
        .expect("traverse");

    assert!(failures.is_empty());
}

#[test]
fn has_no_null_fields_reports_every_null() {
    let mut graph = ObjectGraph::new();
    let address = graph.object(
        "crm::Address",
        vec![
            Field::new("street", "std::string::String", Slot::Null),
            Field::new("zip", "std::string::String", Slot::Null),
        ],
    );
    let customer = graph.object(
        "crm::Customer",
        vec![
            Field::new("address", "crm::Address", address),
            Field::new("email", "std::string::String", Slot::Null),
        ],
    );

    let policy = AssertionPolicy::default();
    let err = RecursiveAssertion::new(&policy)
        .has_no_null_fields(&graph, customer)
        .expect_err("nulls present");
    let failure = err.downcast_ref::<AssertionFailure>().expect("assertion failure");
    assert_eq!(
        failure.failures,
        paths(&["address.street", "address.zip", "email"])
    );
}

/// Host object model that refuses to expose one type's fields.
struct Guarded<'a> {
    inner: &'a ObjectGraph,
    sealed: NodeId,
    field_calls: Cell<usize>,
}

impl Introspect for Guarded<'_> {
    fn describe(&self, slot: Slot) -> Result<Subject<'_>, GraphError> {
        self.inner.describe(slot)
    }

    fn fields(&self, node: NodeId) -> Result<&[Field], GraphError> {
        self.field_calls.set(self.field_calls.get() + 1);
        if node == self.sealed {
            return Err(GraphError::Inaccessible {
                type_name: self.inner.node(node)?.type_name.clone(),
                field: "token".to_string(),
                reason: "sealed".to_string(),
            });
        }
        self.inner.fields(node)
    }

    fn elements(&self, node: NodeId) -> Result<&[Slot], GraphError> {
        self.inner.elements(node)
    }

    fn entries(&self, node: NodeId) -> Result<&[(Slot, Slot)], GraphError> {
        self.inner.entries(node)
    }
}

#[test]
fn inaccessible_field_aborts_traversal_unchanged() {
    let mut graph = ObjectGraph::new();
    let sealed = graph.object("vault::Secret", vec![Field::new("token", "i64", 1_i64)]);
    let root = graph.object(
        "vault::Holder",
        vec![
            Field::new("before", "i64", Slot::Null),
            Field::new("secret", "vault::Secret", sealed),
            Field::new("after", "i64", Slot::Null),
        ],
    );
    let host = Guarded {
        inner: &graph,
        sealed,
        field_calls: Cell::new(0),
    };

    let policy = AssertionPolicy::default();
    let mut engine = RecursiveAssertion::new(&policy);
    let err = engine
        .assert_over_graph(&host, root, |subject| !subject.is_null())
        .expect_err("sealed fields");

    assert!(matches!(
        err.downcast_ref::<GraphError>(),
        Some(GraphError::Inaccessible { field, .. }) if field == "token"
    ));
    assert_eq!(host.field_calls.get(), 2);

    let failures = engine
        .assert_over_graph(&graph, root, |subject| !subject.is_null())
        .expect("plain graph");
    assert_eq!(failures, paths(&["before", "after"]));
}

fn text_contains(subject: &Subject<'_>, needle: &str) -> bool {
    subject.as_str().is_some_and(|text| text.contains(needle))
}

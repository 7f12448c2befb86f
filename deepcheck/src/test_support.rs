//! Test-only helpers for constructing object graphs.

use crate::core::graph::{Field, NodeId, ObjectGraph, Slot};
use crate::core::path::FieldPath;

const AUTHOR: &str = "library::Author";
const BOOK: &str = "library::Book";
const TEXT: &str = crate::core::graph::TEXT_TYPE;

/// Parse dotted field paths, e.g. `"a.b.c"`, into [`FieldPath`]s.
pub fn paths(rendered: &[&str]) -> Vec<FieldPath> {
    rendered
        .iter()
        .map(|path| {
            if path.is_empty() {
                FieldPath::root()
            } else {
                path.split('.').collect()
            }
        })
        .collect()
}

/// A single `demo::Node` whose `next` field points back at itself.
pub fn self_loop() -> (ObjectGraph, NodeId) {
    let mut graph = ObjectGraph::new();
    let node = graph.declare_object("demo::Node");
    graph
        .add_field(node, Field::new("next", "demo::Node", node))
        .expect("self loop");
    (graph, node)
}

/// Two `demo::Node`s with `a.next = b` and `b.next = a`.
pub fn linked_pair() -> (ObjectGraph, NodeId, NodeId) {
    let mut graph = ObjectGraph::new();
    let a = graph.declare_object("demo::Node");
    let b = graph.declare_object("demo::Node");
    graph
        .add_field(a, Field::new("next", "demo::Node", b))
        .expect("a.next");
    graph
        .add_field(b, Field::new("next", "demo::Node", a))
        .expect("b.next");
    (graph, a, b)
}

fn author(graph: &mut ObjectGraph, name: &str, email: &str) -> (NodeId, NodeId) {
    let author = graph.declare_object(AUTHOR);
    let name = graph.text(name);
    let email = graph.text(email);
    let books = graph.collection("std::vec::Vec", Vec::new());
    graph
        .add_field(author, Field::new("name", TEXT, name))
        .expect("name");
    graph
        .add_field(author, Field::new("email", TEXT, email))
        .expect("email");
    graph
        .add_field(author, Field::new("books", "std::vec::Vec", books))
        .expect("books");
    (author, books)
}

fn book(graph: &mut ObjectGraph, title: &str, authors: &[NodeId]) -> NodeId {
    let title = graph.text(title);
    let authors = graph.array(
        "[library::Author]",
        authors.iter().map(|id| Slot::Ref(*id)).collect(),
    );
    graph.object(
        BOOK,
        vec![
            Field::new("title", TEXT, title),
            Field::new("authors", "[library::Author]", authors),
        ],
    )
}

/// Authors and books referencing each other; returns the graph and the first author.
pub fn authors_and_books() -> (ObjectGraph, NodeId) {
    let mut graph = ObjectGraph::new();
    let (pramod, pramod_books) = author(&mut graph, "Pramod Sadalage", "p.sadalage@recursive.test");
    let (martin, martin_books) = author(&mut graph, "Martin Fowler", "m.fowler@recursive.test");
    let (kent, kent_books) = author(&mut graph, "Kent Beck", "k.beck@recursive.test");

    let first = book(&mut graph, "NoSql Distilled", &[pramod, martin]);
    let other = book(&mut graph, "Refactoring", &[martin, kent]);

    graph.push_element(pramod_books, first).expect("pramod books");
    graph.push_element(martin_books, first).expect("martin books");
    graph.push_element(martin_books, other).expect("martin books");
    graph.push_element(kent_books, other).expect("kent books");

    (graph, pramod)
}

//! Introspection capability consumed by the traversal engine.
//!
//! The engine never looks at [`ObjectGraph`] internals directly. It asks an
//! [`Introspect`] implementation to classify a [`Slot`] and to enumerate the
//! fields, elements or entries of a node. Hosts with their own object model can
//! implement the trait instead of building an `ObjectGraph`.

use crate::core::graph::{Field, GraphError, NodeId, NodeShape, ObjectGraph, Primitive, Slot, TypeName};

/// Enumerate fields and classify runtime values of an object graph.
pub trait Introspect {
    /// Classify the value held by `slot`.
    fn describe(&self, slot: Slot) -> Result<Subject<'_>, GraphError>;

    /// Declared fields of an ordinary object, in declaration order.
    fn fields(&self, node: NodeId) -> Result<&[Field], GraphError>;

    /// Elements of an array or collection, in iteration order.
    fn elements(&self, node: NodeId) -> Result<&[Slot], GraphError>;

    /// Key/value entries of a map, in iteration order.
    fn entries(&self, node: NodeId) -> Result<&[(Slot, Slot)], GraphError>;
}

/// Value handed to predicates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Subject<'g> {
    Null,
    Primitive(Primitive),
    Node(NodeView<'g>),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodeView<'g> {
    pub id: NodeId,
    pub type_name: &'g TypeName,
    pub kind: NodeKind<'g>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NodeKind<'g> {
    Object,
    Array { len: usize },
    Collection { len: usize },
    Map { len: usize },
    Optional(Option<Slot>),
    Text(&'g str),
}

impl<'g> Subject<'g> {
    pub fn is_null(&self) -> bool {
        matches!(self, Subject::Null)
    }

    pub fn is_empty_optional(&self) -> bool {
        matches!(
            self,
            Subject::Node(NodeView {
                kind: NodeKind::Optional(None),
                ..
            })
        )
    }

    pub fn as_primitive(&self) -> Option<Primitive> {
        match self {
            Subject::Primitive(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Subject::Primitive(Primitive::Int(value)) => Some(*value),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Subject::Primitive(Primitive::Float(value)) => Some(*value),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Subject::Primitive(Primitive::Bool(value)) => Some(*value),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&'g str> {
        match self {
            Subject::Node(NodeView {
                kind: NodeKind::Text(text),
                ..
            }) => Some(*text),
            _ => None,
        }
    }

    pub fn node(&self) -> Option<&NodeView<'g>> {
        match self {
            Subject::Node(view) => Some(view),
            _ => None,
        }
    }

    /// Runtime type name; `None` for null.
    pub fn type_name(&self) -> Option<&'g str> {
        match self {
            Subject::Null => None,
            Subject::Primitive(value) => Some(value.type_name()),
            Subject::Node(view) => Some(view.type_name.as_str()),
        }
    }

    /// Short rendering used inside map key/value path segments.
    pub fn short_repr(&self) -> String {
        match self {
            Subject::Null => "null".to_string(),
            Subject::Primitive(value) => value.to_string(),
            Subject::Node(NodeView {
                kind: NodeKind::Text(text),
                ..
            }) => format!("{text:?}"),
            Subject::Node(view) => format!("{}{}", view.type_name, view.id),
        }
    }
}

/// Decides whether a type belongs to the standard library.
pub trait TypeClassifier {
    fn is_library_type(&self, type_name: &TypeName) -> bool;
}

/// Classifies qualified names by their root namespace (`std::...`, `core::...`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibraryNamespaces {
    roots: Vec<String>,
}

impl LibraryNamespaces {
    pub fn new<I, S>(roots: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            roots: roots.into_iter().map(Into::into).collect(),
        }
    }

    pub fn roots(&self) -> &[String] {
        &self.roots
    }
}

impl Default for LibraryNamespaces {
    fn default() -> Self {
        Self::new(["std", "core", "alloc"])
    }
}

impl TypeClassifier for LibraryNamespaces {
    fn is_library_type(&self, type_name: &TypeName) -> bool {
        let root = type_name.root_namespace();
        !root.is_empty() && self.roots.iter().any(|candidate| candidate == root)
    }
}

impl Introspect for ObjectGraph {
    fn describe(&self, slot: Slot) -> Result<Subject<'_>, GraphError> {
        let id = match slot {
            Slot::Null => return Ok(Subject::Null),
            Slot::Primitive(value) => return Ok(Subject::Primitive(value)),
            Slot::Ref(id) => id,
        };
        let node = self.node(id)?;
        let kind = match &node.shape {
            NodeShape::Object(_) => NodeKind::Object,
            NodeShape::Array(elements) => NodeKind::Array {
                len: elements.len(),
            },
            NodeShape::Collection(elements) => NodeKind::Collection {
                len: elements.len(),
            },
            NodeShape::Map(entries) => NodeKind::Map { len: entries.len() },
            NodeShape::Optional(value) => NodeKind::Optional(*value),
            NodeShape::Text(text) => NodeKind::Text(text.as_str()),
        };
        Ok(Subject::Node(NodeView {
            id,
            type_name: &node.type_name,
            kind,
        }))
    }

    fn fields(&self, node: NodeId) -> Result<&[Field], GraphError> {
        match &self.node(node)?.shape {
            NodeShape::Object(fields) => Ok(fields),
            _ => Err(self.shape_error(node, "object")),
        }
    }

    fn elements(&self, node: NodeId) -> Result<&[Slot], GraphError> {
        match &self.node(node)?.shape {
            NodeShape::Array(elements) | NodeShape::Collection(elements) => Ok(elements),
            _ => Err(self.shape_error(node, "collection")),
        }
    }

    fn entries(&self, node: NodeId) -> Result<&[(Slot, Slot)], GraphError> {
        match &self.node(node)?.shape {
            NodeShape::Map(entries) => Ok(entries),
            _ => Err(self.shape_error(node, "map")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn library_namespaces_match_root_component_only() {
        let classifier = LibraryNamespaces::default();
        assert!(classifier.is_library_type(&TypeName::new("std::time::Duration")));
        assert!(classifier.is_library_type(&TypeName::new("core::num::NonZeroU8")));
        assert!(!classifier.is_library_type(&TypeName::new("stdlib::Thing")));
        assert!(!classifier.is_library_type(&TypeName::new("shop::std::Order")));
        assert!(!classifier.is_library_type(&TypeName::new("i64")));
    }

    #[test]
    fn describe_classifies_slots() {
        let mut graph = ObjectGraph::new();
        let text = graph.text("hi");
        let list = graph.collection("std::vec::Vec", vec![Slot::Null, text.into()]);
        let empty = graph.optional("std::option::Option", None);

        assert_eq!(graph.describe(Slot::Null).expect("null"), Subject::Null);
        assert_eq!(
            graph.describe(5_i64.into()).expect("int").as_int(),
            Some(5)
        );
        assert_eq!(graph.describe(text.into()).expect("text").as_str(), Some("hi"));

        let described = graph.describe(list.into()).expect("list");
        let view = described.node().expect("node view");
        assert_eq!(view.kind, NodeKind::Collection { len: 2 });
        assert_eq!(described.type_name(), Some("std::vec::Vec"));

        assert!(graph.describe(empty.into()).expect("optional").is_empty_optional());
    }

    #[test]
    fn short_repr_quotes_text_and_names_objects() {
        let mut graph = ObjectGraph::new();
        let text = graph.text("Hello World!");
        let obj = graph.declare_object("shop::Key");

        let text_repr = graph.describe(text.into()).expect("text").short_repr();
        assert_eq!(text_repr, "\"Hello World!\"");
        let obj_repr = graph.describe(obj.into()).expect("obj").short_repr();
        assert_eq!(obj_repr, format!("shop::Key{obj}"));
        assert_eq!(Subject::Primitive(Primitive::Int(3)).short_repr(), "3");
    }

    #[test]
    fn enumerating_wrong_shape_is_an_error() {
        let mut graph = ObjectGraph::new();
        let text = graph.text("x");
        assert!(matches!(
            graph.fields(text),
            Err(GraphError::ShapeMismatch { expected: "object", .. })
        ));
        assert!(matches!(
            graph.entries(text),
            Err(GraphError::ShapeMismatch { expected: "map", .. })
        ));
    }
}

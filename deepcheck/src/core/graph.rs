//! Arena-backed object graphs.
//!
//! Rust has no runtime reflection, so the graphs the engine walks are described
//! explicitly: every object lives in an [`ObjectGraph`] arena and is addressed by
//! a [`NodeId`]. The handle is also the object's identity for cycle detection,
//! so two structurally equal objects are still distinct nodes.
//!
//! Nodes can be declared first and filled in later, which is how cyclic graphs
//! (`a.next = a`, `a.next = b; b.next = a`) are built.

use std::borrow::Borrow;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Type name used for text nodes.
pub const TEXT_TYPE: &str = "std::string::String";

/// Identity handle of a node inside one [`ObjectGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Fully qualified type name, e.g. `std::collections::BTreeMap` or `shop::Order`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypeName(String);

impl TypeName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Everything before the last `::`, or `""` for unqualified names.
    pub fn namespace(&self) -> &str {
        self.0.rsplit_once("::").map_or("", |(ns, _)| ns)
    }

    /// First path component of a qualified name, or `""` for unqualified names.
    pub fn root_namespace(&self) -> &str {
        self.0.split_once("::").map_or("", |(root, _)| root)
    }
}

impl Borrow<str> for TypeName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for TypeName {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for TypeName {
    fn from(name: String) -> Self {
        Self(name)
    }
}

impl fmt::Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Scalar values stored inline in a [`Slot`]. They have no identity and no fields.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Primitive {
    Bool(bool),
    Int(i64),
    Float(f64),
    Char(char),
}

impl Primitive {
    pub fn type_name(&self) -> &'static str {
        match self {
            Primitive::Bool(_) => "bool",
            Primitive::Int(_) => "i64",
            Primitive::Float(_) => "f64",
            Primitive::Char(_) => "char",
        }
    }
}

impl fmt::Display for Primitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Primitive::Bool(value) => write!(f, "{value}"),
            Primitive::Int(value) => write!(f, "{value}"),
            Primitive::Float(value) => write!(f, "{value}"),
            Primitive::Char(value) => write!(f, "{value:?}"),
        }
    }
}

/// A value position: a field, an element, a map key or a map value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Slot {
    Null,
    Primitive(Primitive),
    Ref(NodeId),
}

impl From<Primitive> for Slot {
    fn from(value: Primitive) -> Self {
        Slot::Primitive(value)
    }
}

impl From<NodeId> for Slot {
    fn from(id: NodeId) -> Self {
        Slot::Ref(id)
    }
}

impl From<bool> for Slot {
    fn from(value: bool) -> Self {
        Slot::Primitive(Primitive::Bool(value))
    }
}

impl From<i64> for Slot {
    fn from(value: i64) -> Self {
        Slot::Primitive(Primitive::Int(value))
    }
}

impl From<f64> for Slot {
    fn from(value: f64) -> Self {
        Slot::Primitive(Primitive::Float(value))
    }
}

impl From<char> for Slot {
    fn from(value: char) -> Self {
        Slot::Primitive(Primitive::Char(value))
    }
}

/// Named field of an ordinary object.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    pub declared_type: TypeName,
    pub value: Slot,
}

impl Field {
    pub fn new(name: impl Into<String>, declared_type: impl Into<TypeName>, value: impl Into<Slot>) -> Self {
        Self {
            name: name.into(),
            declared_type: declared_type.into(),
            value: value.into(),
        }
    }
}

/// Runtime shape of a node.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeShape {
    Object(Vec<Field>),
    Array(Vec<Slot>),
    Collection(Vec<Slot>),
    Map(Vec<(Slot, Slot)>),
    Optional(Option<Slot>),
    Text(String),
}

impl NodeShape {
    fn label(&self) -> &'static str {
        match self {
            NodeShape::Object(_) => "object",
            NodeShape::Array(_) => "array",
            NodeShape::Collection(_) => "collection",
            NodeShape::Map(_) => "map",
            NodeShape::Optional(_) => "optional",
            NodeShape::Text(_) => "text",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub type_name: TypeName,
    pub shape: NodeShape,
}

/// Errors raised while building or reading an object graph.
#[derive(Debug, Error, PartialEq)]
pub enum GraphError {
    /// The handle does not belong to this graph.
    #[error("unknown node {id}")]
    UnknownNode { id: NodeId },

    /// The node exists but has a different shape than the operation needs.
    #[error("node {id} ({type_name}) is a {actual}, expected {expected}")]
    ShapeMismatch {
        id: NodeId,
        type_name: TypeName,
        expected: &'static str,
        actual: &'static str,
    },

    /// A host refused to expose a field value.
    #[error("field `{field}` of {type_name} is not accessible: {reason}")]
    Inaccessible {
        type_name: TypeName,
        field: String,
        reason: String,
    },
}

/// Arena of nodes. Handles are only meaningful for the graph that issued them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjectGraph {
    nodes: Vec<Node>,
}

impl ObjectGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn insert(&mut self, type_name: impl Into<TypeName>, shape: NodeShape) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            type_name: type_name.into(),
            shape,
        });
        id
    }

    pub fn object(&mut self, type_name: impl Into<TypeName>, fields: Vec<Field>) -> NodeId {
        self.insert(type_name, NodeShape::Object(fields))
    }

    /// Declare an object with no fields yet; fill it with [`ObjectGraph::add_field`].
    pub fn declare_object(&mut self, type_name: impl Into<TypeName>) -> NodeId {
        self.object(type_name, Vec::new())
    }

    pub fn text(&mut self, value: impl Into<String>) -> NodeId {
        self.insert(TEXT_TYPE, NodeShape::Text(value.into()))
    }

    pub fn array(&mut self, type_name: impl Into<TypeName>, elements: Vec<Slot>) -> NodeId {
        self.insert(type_name, NodeShape::Array(elements))
    }

    pub fn collection(&mut self, type_name: impl Into<TypeName>, elements: Vec<Slot>) -> NodeId {
        self.insert(type_name, NodeShape::Collection(elements))
    }

    pub fn map(&mut self, type_name: impl Into<TypeName>, entries: Vec<(Slot, Slot)>) -> NodeId {
        self.insert(type_name, NodeShape::Map(entries))
    }

    pub fn optional(&mut self, type_name: impl Into<TypeName>, value: Option<Slot>) -> NodeId {
        self.insert(type_name, NodeShape::Optional(value))
    }

    pub fn node(&self, id: NodeId) -> Result<&Node, GraphError> {
        self.nodes.get(id.0).ok_or(GraphError::UnknownNode { id })
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut Node, GraphError> {
        self.nodes.get_mut(id.0).ok_or(GraphError::UnknownNode { id })
    }

    /// Append a field to a declared object.
    pub fn add_field(&mut self, owner: NodeId, field: Field) -> Result<(), GraphError> {
        let node = self.node_mut(owner)?;
        match &mut node.shape {
            NodeShape::Object(fields) => {
                fields.push(field);
                Ok(())
            }
            other => Err(mismatch(owner, &node.type_name, "object", other)),
        }
    }

    /// Append an element to an array or collection.
    pub fn push_element(&mut self, owner: NodeId, element: impl Into<Slot>) -> Result<(), GraphError> {
        let node = self.node_mut(owner)?;
        match &mut node.shape {
            NodeShape::Array(elements) | NodeShape::Collection(elements) => {
                elements.push(element.into());
                Ok(())
            }
            other => Err(mismatch(owner, &node.type_name, "collection", other)),
        }
    }

    /// Append an entry to a map. Entries keep insertion order.
    pub fn insert_entry(
        &mut self,
        owner: NodeId,
        key: impl Into<Slot>,
        value: impl Into<Slot>,
    ) -> Result<(), GraphError> {
        let node = self.node_mut(owner)?;
        match &mut node.shape {
            NodeShape::Map(entries) => {
                entries.push((key.into(), value.into()));
                Ok(())
            }
            other => Err(mismatch(owner, &node.type_name, "map", other)),
        }
    }

    pub(crate) fn shape_error(&self, id: NodeId, expected: &'static str) -> GraphError {
        match self.node(id) {
            Ok(node) => mismatch(id, &node.type_name, expected, &node.shape),
            Err(err) => err,
        }
    }
}

fn mismatch(id: NodeId, type_name: &TypeName, expected: &'static str, actual: &NodeShape) -> GraphError {
    GraphError::ShapeMismatch {
        id,
        type_name: type_name.clone(),
        expected,
        actual: actual.label(),
    }
}

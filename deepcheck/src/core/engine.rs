//! Recursive predicate assertion over an object graph.
//!
//! The engine walks the graph depth-first from a root, applies the
//! [`AssertionPolicy`] to decide which locations are visited, and records the
//! [`FieldPath`] of every location where the predicate returned `false`.
//!
//! Cycles collapse into a tree: a node is entered at most once per run, keyed by
//! identity ([`NodeId`]), never by value. Run state (`visited`, `failures`)
//! survives between calls until [`RecursiveAssertion::reset`] is called, so a
//! caller running several predicates over one engine must reset in between.

use std::collections::HashSet;

use anyhow::Result;
use tracing::{debug, instrument, trace};

use crate::core::graph::{NodeId, Slot, TypeName};
use crate::core::introspect::{Introspect, LibraryNamespaces, NodeKind, NodeView, Subject, TypeClassifier};
use crate::core::path::FieldPath;
use crate::core::policy::{AssertionPolicy, CollectionPolicy, MapPolicy};

/// Synthetic field name under which an optional's content is visited.
const OPTIONAL_VALUE_FIELD: &str = "value";

/// Stateful traversal engine bound to one policy.
///
/// Every run takes `&mut self`; use one engine per thread.
pub struct RecursiveAssertion<'p> {
    policy: &'p AssertionPolicy,
    classifier: Box<dyn TypeClassifier + 'p>,
    visited: HashSet<NodeId>,
    failures: Vec<FieldPath>,
}

/// Frontier entry: a value, where it was found, and the declared type of the
/// field holding it (named fields only).
struct Pending<'g> {
    slot: Slot,
    path: FieldPath,
    declared_type: Option<&'g TypeName>,
}

impl<'g> Pending<'g> {
    fn member(slot: Slot, path: FieldPath) -> Self {
        Self {
            slot,
            path,
            declared_type: None,
        }
    }

    fn field(slot: Slot, path: FieldPath, declared_type: &'g TypeName) -> Self {
        Self {
            slot,
            path,
            declared_type: Some(declared_type),
        }
    }
}

impl<'p> RecursiveAssertion<'p> {
    /// Engine using the default standard library classifier (`std`, `core`, `alloc`).
    pub fn new(policy: &'p AssertionPolicy) -> Self {
        Self::with_classifier(policy, LibraryNamespaces::default())
    }

    pub fn with_classifier(policy: &'p AssertionPolicy, classifier: impl TypeClassifier + 'p) -> Self {
        Self {
            policy,
            classifier: Box::new(classifier),
            visited: HashSet::new(),
            failures: Vec::new(),
        }
    }

    pub fn policy(&self) -> &'p AssertionPolicy {
        self.policy
    }

    /// Clear run state. Call before each independent traversal.
    pub fn reset(&mut self) {
        self.visited.clear();
        self.failures.clear();
    }

    /// Apply `predicate` to every included location reachable from `root`.
    ///
    /// Returns the paths where the predicate returned `false`, in depth-first,
    /// declaration order. Introspection errors abort the run.
    pub fn assert_over_graph<G, P>(&mut self, graph: &G, root: impl Into<Slot>, mut predicate: P) -> Result<Vec<FieldPath>>
    where
        G: Introspect + ?Sized,
        P: FnMut(&Subject<'_>) -> bool,
    {
        self.try_assert_over_graph(graph, root, |subject| Ok(predicate(subject)))
    }

    /// Like [`RecursiveAssertion::assert_over_graph`] with a fallible predicate.
    ///
    /// The first predicate or introspection error aborts the run and is
    /// returned unchanged; run state accumulated so far is discarded.
    #[instrument(skip_all)]
    pub fn try_assert_over_graph<G, P>(
        &mut self,
        graph: &G,
        root: impl Into<Slot>,
        mut predicate: P,
    ) -> Result<Vec<FieldPath>>
    where
        G: Introspect + ?Sized,
        P: FnMut(&Subject<'_>) -> Result<bool>,
    {
        if let Err(err) = self.walk(graph, root.into(), &mut predicate) {
            debug!(error = %err, "traversal aborted");
            self.reset();
            return Err(err);
        }
        debug!(
            visited = self.visited.len(),
            failures = self.failures.len(),
            "traversal finished"
        );
        Ok(self.failures.clone())
    }

    fn walk<'g, G, P>(&mut self, graph: &'g G, root: Slot, predicate: &mut P) -> Result<()>
    where
        G: Introspect + ?Sized,
        P: FnMut(&Subject<'_>) -> Result<bool>,
    {
        let mut frontier = vec![Pending::member(root, FieldPath::root())];

        while let Some(pending) = frontier.pop() {
            let subject = graph.describe(pending.slot)?;

            if !pending.path.is_root() && self.is_ignored(&pending, &subject) {
                trace!(path = %pending.path, "location ignored by policy");
                continue;
            }

            match subject {
                Subject::Null => self.evaluate(&subject, &pending.path, predicate)?,
                Subject::Primitive(_) => {
                    if self.policy.assert_over_primitive_fields() {
                        self.evaluate(&subject, &pending.path, predicate)?;
                    }
                }
                Subject::Node(view) => {
                    if !self.visited.insert(view.id) {
                        trace!(path = %pending.path, node = %view.id, "node already visited");
                        continue;
                    }
                    self.visit_node(graph, &subject, view, pending.path, &mut frontier, predicate)?;
                }
            }
        }

        Ok(())
    }

    fn visit_node<'g, G, P>(
        &mut self,
        graph: &'g G,
        subject: &Subject<'g>,
        view: NodeView<'g>,
        path: FieldPath,
        frontier: &mut Vec<Pending<'g>>,
        predicate: &mut P,
    ) -> Result<()>
    where
        G: Introspect + ?Sized,
        P: FnMut(&Subject<'_>) -> Result<bool>,
    {
        match view.kind {
            NodeKind::Array { .. } | NodeKind::Collection { .. } => {
                if !self.policy.should_ignore_collection_container() {
                    self.evaluate(subject, &path, predicate)?;
                }
                if self.policy.collection_policy() != CollectionPolicy::ContainerOnly {
                    let elements = graph.elements(view.id)?;
                    for (index, element) in elements.iter().enumerate().rev() {
                        frontier.push(Pending::member(*element, path.index(index)));
                    }
                }
            }
            NodeKind::Map { .. } => {
                if !self.policy.should_ignore_map_container() {
                    self.evaluate(subject, &path, predicate)?;
                }
                let include_keys = match self.policy.map_policy() {
                    MapPolicy::MapOnly => return Ok(()),
                    MapPolicy::ValuesOnly => false,
                    MapPolicy::MapAndEntries => true,
                };
                let entries = graph.entries(view.id)?;
                for (key, value) in entries.iter().rev() {
                    let repr = graph.describe(*key)?.short_repr();
                    frontier.push(Pending::member(*value, path.value(repr.clone())));
                    if include_keys {
                        frontier.push(Pending::member(*key, path.key(repr)));
                    }
                }
            }
            _ if self.is_skipped_library_type(view.type_name) => {
                trace!(path = %path, type_name = %view.type_name, "library type asserted as leaf");
                self.evaluate(subject, &path, predicate)?;
            }
            NodeKind::Text(_) => self.evaluate(subject, &path, predicate)?,
            NodeKind::Optional(content) => {
                self.evaluate(subject, &path, predicate)?;
                if let Some(slot) = content {
                    frontier.push(Pending::member(slot, path.field(OPTIONAL_VALUE_FIELD)));
                }
            }
            NodeKind::Object => {
                self.evaluate(subject, &path, predicate)?;
                let fields = graph.fields(view.id)?;
                for field in fields.iter().rev() {
                    frontier.push(Pending::field(
                        field.value,
                        path.field(field.name.as_str()),
                        &field.declared_type,
                    ));
                }
            }
        }
        Ok(())
    }

    fn evaluate<P>(&mut self, subject: &Subject<'_>, path: &FieldPath, predicate: &mut P) -> Result<()>
    where
        P: FnMut(&Subject<'_>) -> Result<bool>,
    {
        if !predicate(subject)? {
            debug!(path = %path, "predicate not satisfied");
            self.failures.push(path.clone());
        }
        Ok(())
    }

    /// Field-level inclusion filter, applied before kind dispatch.
    fn is_ignored(&self, pending: &Pending<'_>, subject: &Subject<'_>) -> bool {
        if subject.is_null() && self.policy.ignore_all_null_fields() {
            return true;
        }
        if subject.is_empty_optional() && self.policy.ignore_all_empty_optional_fields() {
            return true;
        }
        if self.policy.is_path_ignored(&pending.path.to_string()) {
            return true;
        }
        let type_name = pending
            .declared_type
            .map(TypeName::as_str)
            .or_else(|| subject.type_name());
        type_name.is_some_and(|name| self.policy.is_type_ignored(name))
    }

    fn is_skipped_library_type(&self, type_name: &TypeName) -> bool {
        self.policy.skip_library_type_objects() && self.classifier.is_library_type(type_name)
    }
}

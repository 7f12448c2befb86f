//! Turning failed locations into an assertion error.

use anyhow::Result;
use thiserror::Error;

use crate::core::engine::RecursiveAssertion;
use crate::core::graph::Slot;
use crate::core::introspect::{Introspect, Subject};
use crate::core::path::FieldPath;

/// Raised when at least one location did not satisfy the predicate.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", render(.failures, .description))]
pub struct AssertionFailure {
    /// Policy description (non-default options only).
    pub description: String,
    pub failures: Vec<FieldPath>,
}

fn render(failures: &[FieldPath], description: &str) -> String {
    let listed: Vec<String> = failures.iter().map(display_path).collect();
    let mut message = format!(
        "The following fields did not satisfy the predicate:\n[{}]\n",
        listed.join(", ")
    );
    if !description.is_empty() {
        message.push_str("The recursive assertion was performed with this configuration:\n");
        message.push_str(description);
    }
    message
}

/// Root renders as `<root>` in messages; elsewhere it is the empty string.
pub fn display_path(path: &FieldPath) -> String {
    if path.is_root() {
        "<root>".to_string()
    } else {
        path.to_string()
    }
}

impl RecursiveAssertion<'_> {
    /// Reset, run `predicate` over the graph, and fail with [`AssertionFailure`]
    /// if any location did not satisfy it.
    pub fn all_fields_satisfy<G, P>(&mut self, graph: &G, root: impl Into<Slot>, predicate: P) -> Result<()>
    where
        G: Introspect + ?Sized,
        P: FnMut(&Subject<'_>) -> bool,
    {
        self.reset();
        let failures = self.assert_over_graph(graph, root, predicate)?;
        if failures.is_empty() {
            return Ok(());
        }
        Err(AssertionFailure {
            description: self.policy().to_string(),
            failures,
        }
        .into())
    }

    /// Shorthand for `all_fields_satisfy(|value| !value.is_null())`.
    pub fn has_no_null_fields<G>(&mut self, graph: &G, root: impl Into<Slot>) -> Result<()>
    where
        G: Introspect + ?Sized,
    {
        self.all_fields_satisfy(graph, root, |subject| !subject.is_null())
    }
}

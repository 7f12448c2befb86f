//! Orchestration for `deepcheck check`: load policy and graph, run a rule.

use std::path::Path;

use anyhow::{Context, Result};
use clap::ValueEnum;
use tracing::{debug, info};

use crate::core::engine::RecursiveAssertion;
use crate::core::introspect::Subject;
use crate::core::path::FieldPath;
use crate::io::config::{PolicyConfig, load_config};
use crate::io::json_graph::load_graph;

/// Built-in predicates selectable from the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Rule {
    /// Every visited value is present.
    NotNull,
    /// Every text value has at least one non-whitespace character.
    NonEmptyText,
    /// Every numeric primitive is `>= 0`.
    NonNegative,
}

impl Rule {
    pub fn accepts(self, subject: &Subject<'_>) -> bool {
        match self {
            Rule::NotNull => !subject.is_null(),
            Rule::NonEmptyText => subject.as_str().is_none_or(|text| !text.trim().is_empty()),
            Rule::NonNegative => {
                subject.as_int().is_none_or(|value| value >= 0)
                    && subject.as_float().is_none_or(|value| value >= 0.0)
            }
        }
    }
}

/// Result of a single check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckOutcome {
    /// Every included location satisfied the rule.
    Satisfied,
    /// Paths that did not satisfy the rule, in traversal order.
    Failed(Vec<FieldPath>),
}

/// Check the JSON document at `input` against `rule`.
///
/// `policy_path` is optional; a missing path or file means the default policy.
pub fn run_check(input: &Path, policy_path: Option<&Path>, rule: Rule) -> Result<CheckOutcome> {
    let config = match policy_path {
        Some(path) => load_config(path).with_context(|| "load policy")?,
        None => PolicyConfig::default(),
    };
    let policy = config.to_policy()?;
    debug!(rule = ?rule, "policy loaded");

    let (graph, root) = load_graph(input).with_context(|| "load input graph")?;
    let mut engine = RecursiveAssertion::with_classifier(&policy, config.classifier());
    engine.reset();
    let failures = engine.assert_over_graph(&graph, root, |subject| rule.accepts(subject))?;

    info!(failures = failures.len(), "check finished");
    if failures.is_empty() {
        return Ok(CheckOutcome::Satisfied);
    }
    Ok(CheckOutcome::Failed(failures))
}

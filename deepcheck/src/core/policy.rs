//! Inclusion policy for recursive assertions.

use std::collections::BTreeSet;
use std::fmt;
use std::hash::{Hash, Hasher};

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::core::graph::TypeName;

/// How arrays and collections are asserted over.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CollectionPolicy {
    /// Only the elements (recursively), never the container itself.
    ElementsOnly,
    /// Only the container, never its elements.
    ContainerOnly,
    /// The container and (recursively) its elements.
    #[default]
    ContainerAndElements,
}

impl CollectionPolicy {
    pub fn as_str(self) -> &'static str {
        match self {
            CollectionPolicy::ElementsOnly => "elements-only",
            CollectionPolicy::ContainerOnly => "container-only",
            CollectionPolicy::ContainerAndElements => "container-and-elements",
        }
    }
}

/// How maps are asserted over.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MapPolicy {
    /// Only the map, never its keys or values.
    MapOnly,
    /// Only the values (recursively); never the keys or the map itself.
    ValuesOnly,
    /// The map, then (recursively) each key and value.
    #[default]
    MapAndEntries,
}

impl MapPolicy {
    pub fn as_str(self) -> &'static str {
        match self {
            MapPolicy::MapOnly => "map-only",
            MapPolicy::ValuesOnly => "values-only",
            MapPolicy::MapAndEntries => "map-and-entries",
        }
    }
}

/// Immutable set of options controlling what the engine visits.
///
/// Built with [`AssertionPolicy::builder`]; every combination of options is valid.
/// Equality and hashing are structural, regexes compare by pattern source.
#[derive(Debug, Clone)]
pub struct AssertionPolicy {
    ignore_all_null_fields: bool,
    ignore_all_empty_optional_fields: bool,
    ignored_field_names: BTreeSet<String>,
    ignored_field_regexes: Vec<Regex>,
    anchored_regexes: Vec<Regex>,
    ignored_types: BTreeSet<TypeName>,
    assert_over_primitive_fields: bool,
    skip_library_type_objects: bool,
    collection_policy: CollectionPolicy,
    map_policy: MapPolicy,
}

impl Default for AssertionPolicy {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl AssertionPolicy {
    pub fn builder() -> AssertionPolicyBuilder {
        AssertionPolicyBuilder::default()
    }

    pub fn ignore_all_null_fields(&self) -> bool {
        self.ignore_all_null_fields
    }

    pub fn ignore_all_empty_optional_fields(&self) -> bool {
        self.ignore_all_empty_optional_fields
    }

    pub fn ignored_field_names(&self) -> &BTreeSet<String> {
        &self.ignored_field_names
    }

    pub fn ignored_field_regexes(&self) -> &[Regex] {
        &self.ignored_field_regexes
    }

    pub fn ignored_types(&self) -> &BTreeSet<TypeName> {
        &self.ignored_types
    }

    pub fn assert_over_primitive_fields(&self) -> bool {
        self.assert_over_primitive_fields
    }

    pub fn skip_library_type_objects(&self) -> bool {
        self.skip_library_type_objects
    }

    pub fn collection_policy(&self) -> CollectionPolicy {
        self.collection_policy
    }

    pub fn map_policy(&self) -> MapPolicy {
        self.map_policy
    }

    /// True when the map object itself must not be asserted on.
    pub fn should_ignore_map_container(&self) -> bool {
        self.map_policy == MapPolicy::ValuesOnly
    }

    /// True when collection and array objects themselves must not be asserted on.
    pub fn should_ignore_collection_container(&self) -> bool {
        self.collection_policy == CollectionPolicy::ElementsOnly
    }

    /// True if the rendered path is listed by name or matched by any regex.
    pub fn is_path_ignored(&self, path: &str) -> bool {
        self.ignored_field_names.contains(path)
            || self.anchored_regexes.iter().any(|regex| regex.is_match(path))
    }

    pub fn is_type_ignored(&self, type_name: &str) -> bool {
        self.ignored_types.contains(type_name)
    }

    fn regex_sources(&self) -> impl Iterator<Item = &str> {
        self.ignored_field_regexes.iter().map(Regex::as_str)
    }
}

/// Wrap a pattern so it only matches whole paths.
///
/// A verbose-mode (`(?x)`) pattern ending in a `#` comment would swallow the
/// closing `)$`, so the group is closed after a newline in that case. A pattern
/// that cannot be anchored either way ignores nothing.
fn anchored(regex: &Regex) -> Option<Regex> {
    let source = regex.as_str();
    let anchored = Regex::new(&format!("^(?:{source})$"))
        .or_else(|_| Regex::new(&format!("^(?:{source}\n)$")));
    match anchored {
        Ok(anchored) => Some(anchored),
        Err(err) => {
            warn!(pattern = source, error = %err, "ignored field regex cannot be anchored, ignoring nothing");
            None
        }
    }
}

impl PartialEq for AssertionPolicy {
    fn eq(&self, other: &Self) -> bool {
        self.ignore_all_null_fields == other.ignore_all_null_fields
            && self.ignore_all_empty_optional_fields == other.ignore_all_empty_optional_fields
            && self.ignored_field_names == other.ignored_field_names
            && self.regex_sources().eq(other.regex_sources())
            && self.ignored_types == other.ignored_types
            && self.assert_over_primitive_fields == other.assert_over_primitive_fields
            && self.skip_library_type_objects == other.skip_library_type_objects
            && self.collection_policy == other.collection_policy
            && self.map_policy == other.map_policy
    }
}

impl Eq for AssertionPolicy {}

impl Hash for AssertionPolicy {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.ignore_all_null_fields.hash(state);
        self.ignore_all_empty_optional_fields.hash(state);
        self.ignored_field_names.hash(state);
        for source in self.regex_sources() {
            source.hash(state);
        }
        self.ignored_types.hash(state);
        self.assert_over_primitive_fields.hash(state);
        self.skip_library_type_objects.hash(state);
        self.collection_policy.hash(state);
        self.map_policy.hash(state);
    }
}

/// One `- ...` line per option that differs from the defaults.
impl fmt::Display for AssertionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.ignore_all_null_fields {
            writeln!(f, "- all null fields were ignored in the assertion")?;
        }
        if self.ignore_all_empty_optional_fields {
            writeln!(f, "- all empty optional fields were ignored in the assertion")?;
        }
        if !self.ignored_field_names.is_empty() {
            let names: Vec<&str> = self.ignored_field_names.iter().map(String::as_str).collect();
            writeln!(
                f,
                "- the following fields were ignored in the assertion: {}",
                names.join(", ")
            )?;
        }
        if !self.ignored_field_regexes.is_empty() {
            let sources: Vec<&str> = self.regex_sources().collect();
            writeln!(
                f,
                "- the fields matching the following regexes were ignored in the assertion: {}",
                sources.join(", ")
            )?;
        }
        if !self.ignored_types.is_empty() {
            let types: Vec<&str> = self.ignored_types.iter().map(TypeName::as_str).collect();
            writeln!(
                f,
                "- the following types were ignored in the assertion: {}",
                types.join(", ")
            )?;
        }
        if !self.assert_over_primitive_fields {
            writeln!(f, "- primitive fields were ignored in the recursive assertion")?;
        }
        if !self.skip_library_type_objects {
            writeln!(
                f,
                "- fields of standard library types were included in the recursive assertion"
            )?;
        }
        if self.collection_policy != CollectionPolicy::default() {
            writeln!(
                f,
                "- the collection assertion policy was {}",
                self.collection_policy.as_str()
            )?;
        }
        if self.map_policy != MapPolicy::default() {
            writeln!(f, "- the map assertion policy was {}", self.map_policy.as_str())?;
        }
        Ok(())
    }
}

/// Builder for [`AssertionPolicy`]. Defaults: primitives asserted, standard
/// library types not recursed into, containers and their members asserted.
#[derive(Debug, Clone)]
pub struct AssertionPolicyBuilder {
    policy: AssertionPolicy,
}

impl Default for AssertionPolicyBuilder {
    fn default() -> Self {
        Self {
            policy: AssertionPolicy {
                ignore_all_null_fields: false,
                ignore_all_empty_optional_fields: false,
                ignored_field_names: BTreeSet::new(),
                ignored_field_regexes: Vec::new(),
                anchored_regexes: Vec::new(),
                ignored_types: BTreeSet::new(),
                assert_over_primitive_fields: true,
                skip_library_type_objects: true,
                collection_policy: CollectionPolicy::default(),
                map_policy: MapPolicy::default(),
            },
        }
    }
}

impl AssertionPolicyBuilder {
    pub fn ignore_all_null_fields(mut self, ignore: bool) -> Self {
        self.policy.ignore_all_null_fields = ignore;
        self
    }

    pub fn ignore_all_empty_optional_fields(mut self, ignore: bool) -> Self {
        self.policy.ignore_all_empty_optional_fields = ignore;
        self
    }

    /// Ignore fields by their full rendered path, e.g. `"author.books[0].title"`.
    pub fn ignore_fields<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.policy
            .ignored_field_names
            .extend(paths.into_iter().map(Into::into));
        self
    }

    /// Ignore every path fully matched by any of the given regexes.
    pub fn ignore_fields_matching<I>(mut self, regexes: I) -> Self
    where
        I: IntoIterator<Item = Regex>,
    {
        self.policy.ignored_field_regexes.extend(regexes);
        self
    }

    pub fn ignore_types<I, T>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<TypeName>,
    {
        self.policy
            .ignored_types
            .extend(types.into_iter().map(Into::into));
        self
    }

    pub fn assert_over_primitive_fields(mut self, assert: bool) -> Self {
        self.policy.assert_over_primitive_fields = assert;
        self
    }

    /// Recurse into the fields of standard library types (off by default).
    pub fn recurse_into_library_types(mut self, recurse: bool) -> Self {
        self.policy.skip_library_type_objects = !recurse;
        self
    }

    pub fn collection_policy(mut self, policy: CollectionPolicy) -> Self {
        self.policy.collection_policy = policy;
        self
    }

    pub fn map_policy(mut self, policy: MapPolicy) -> Self {
        self.policy.map_policy = policy;
        self
    }

    pub fn build(mut self) -> AssertionPolicy {
        self.policy.anchored_regexes = self
            .policy
            .ignored_field_regexes
            .iter()
            .filter_map(anchored)
            .collect();
        self.policy
    }
}

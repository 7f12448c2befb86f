//! Assertion policy stored as TOML (e.g. `deepcheck.toml`).

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::introspect::LibraryNamespaces;
use crate::core::policy::{AssertionPolicy, CollectionPolicy, MapPolicy};

/// Policy file (TOML).
///
/// Intended to be edited by humans. Missing fields take the same defaults as
/// [`AssertionPolicy::builder`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PolicyConfig {
    pub ignore_all_null_fields: bool,

    pub ignore_all_empty_optional_fields: bool,

    /// Exact rendered paths to skip, e.g. `"author.books[0].title"`.
    pub ignored_fields: Vec<String>,

    /// Regexes matched against the whole rendered path.
    pub ignored_fields_regexes: Vec<String>,

    /// Fully qualified type names to skip.
    pub ignored_types: Vec<String>,

    pub assert_over_primitive_fields: bool,

    /// Recurse into the fields of standard library types.
    pub recurse_into_library_types: bool,

    pub collection_policy: CollectionPolicy,

    pub map_policy: MapPolicy,

    /// Root namespaces treated as the standard library.
    pub library_namespaces: Vec<String>,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            ignore_all_null_fields: false,
            ignore_all_empty_optional_fields: false,
            ignored_fields: Vec::new(),
            ignored_fields_regexes: Vec::new(),
            ignored_types: Vec::new(),
            assert_over_primitive_fields: true,
            recurse_into_library_types: false,
            collection_policy: CollectionPolicy::default(),
            map_policy: MapPolicy::default(),
            library_namespaces: LibraryNamespaces::default().roots().to_vec(),
        }
    }
}

impl PolicyConfig {
    pub fn validate(&self) -> Result<()> {
        if let Some(blank) = self.ignored_fields.iter().find(|name| name.trim().is_empty()) {
            return Err(anyhow!("ignored_fields must not contain blank entries ({blank:?})"));
        }
        if self.ignored_types.iter().any(|name| name.trim().is_empty()) {
            return Err(anyhow!("ignored_types must not contain blank entries"));
        }
        if self
            .library_namespaces
            .iter()
            .any(|name| name.trim().is_empty() || name.contains("::"))
        {
            return Err(anyhow!(
                "library_namespaces entries must be single non-empty path components"
            ));
        }
        self.compile_regexes()?;
        Ok(())
    }

    fn compile_regexes(&self) -> Result<Vec<Regex>> {
        self.ignored_fields_regexes
            .iter()
            .map(|pattern| {
                Regex::new(pattern).with_context(|| format!("invalid ignored_fields_regexes entry {pattern:?}"))
            })
            .collect()
    }

    pub fn to_policy(&self) -> Result<AssertionPolicy> {
        self.validate()?;
        Ok(AssertionPolicy::builder()
            .ignore_all_null_fields(self.ignore_all_null_fields)
            .ignore_all_empty_optional_fields(self.ignore_all_empty_optional_fields)
            .ignore_fields(self.ignored_fields.iter().cloned())
            .ignore_fields_matching(self.compile_regexes()?)
            .ignore_types(self.ignored_types.iter().map(String::as_str))
            .assert_over_primitive_fields(self.assert_over_primitive_fields)
            .recurse_into_library_types(self.recurse_into_library_types)
            .collection_policy(self.collection_policy)
            .map_policy(self.map_policy)
            .build())
    }

    pub fn classifier(&self) -> LibraryNamespaces {
        LibraryNamespaces::new(self.library_namespaces.iter().cloned())
    }
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `PolicyConfig::default()`.
pub fn load_config(path: &Path) -> Result<PolicyConfig> {
    if !path.exists() {
        debug!(path = %path.display(), "policy file missing, using defaults");
        let cfg = PolicyConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: PolicyConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()
        .with_context(|| format!("validate {}", path.display()))?;
    Ok(cfg)
}

/// Atomically write config to disk (temp file + rename).
pub fn write_config(path: &Path, cfg: &PolicyConfig) -> Result<()> {
    cfg.validate()?;
    let mut buf = toml::to_string_pretty(cfg).context("serialize config toml")?;
    buf.push('\n');
    write_atomic(path, &buf)
}

fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let parent = path
        .parent()
        .with_context(|| format!("config path missing parent {}", path.display()))?;
    if !parent.as_os_str().is_empty() {
        fs::create_dir_all(parent)
            .with_context(|| format!("create directory {}", parent.display()))?;
    }
    let tmp_path = path.with_extension("toml.tmp");
    fs::write(&tmp_path, contents)
        .with_context(|| format!("write temp config {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path).with_context(|| format!("replace config {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_missing_returns_default() {
        let temp = tempfile::tempdir().expect("tempdir");
        let cfg = load_config(&temp.path().join("missing.toml")).expect("load");
        assert_eq!(cfg, PolicyConfig::default());
        assert_eq!(cfg.to_policy().expect("policy"), AssertionPolicy::default());
    }

    #[test]
    fn write_then_load_round_trips() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("nested").join("deepcheck.toml");
        let cfg = PolicyConfig {
            ignored_fields_regexes: vec!["cache_.*".to_string()],
            map_policy: MapPolicy::ValuesOnly,
            ..PolicyConfig::default()
        };
        write_config(&path, &cfg).expect("write");
        let loaded = load_config(&path).expect("load");
        assert_eq!(loaded, cfg);
    }

    #[test]
    fn partial_file_uses_defaults_and_kebab_case_policies() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("deepcheck.toml");
        fs::write(
            &path,
            "collection_policy = \"elements-only\"\nignored_types = [\"shop::Secret\"]\n",
        )
        .expect("write");

        let policy = load_config(&path).expect("load").to_policy().expect("policy");
        let expected = AssertionPolicy::builder()
            .collection_policy(CollectionPolicy::ElementsOnly)
            .ignore_types(["shop::Secret"])
            .build();
        assert_eq!(policy, expected);
    }

    #[test]
    fn invalid_regex_is_rejected() {
        let cfg = PolicyConfig {
            ignored_fields_regexes: vec!["(".to_string()],
            ..PolicyConfig::default()
        };
        let err = cfg.validate().expect_err("invalid regex");
        assert!(err.to_string().contains("ignored_fields_regexes"));
    }

    #[test]
    fn qualified_library_namespace_is_rejected() {
        let cfg = PolicyConfig {
            library_namespaces: vec!["std::collections".to_string()],
            ..PolicyConfig::default()
        };
        assert!(cfg.validate().is_err());
    }
}

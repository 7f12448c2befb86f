//! Build an [`ObjectGraph`] from a JSON document.
//!
//! Plain JSON maps onto the graph model directly: objects become ordinary
//! objects (fields in document order), arrays become collections, strings
//! become text nodes and numbers/booleans become primitives. A few `$`-prefixed
//! keys describe what JSON cannot express on its own:
//!
//! - `"$type": "shop::Order"` sets an object's type name.
//! - `"$id": "name"` registers a node so later `{"$ref": "name"}` values point
//!   back at it, which is how cycles are written.
//! - `{"$entries": [[key, value], ...]}` is a map.
//! - `{"$optional": value}` is an optional; `null` means empty.
//!
//! `$entries` and `$optional` objects may only carry `$type` and `$id` beside
//! their directive. Map keys must have distinct reprs within one map so every
//! entry gets its own path.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow, bail};
use serde_json::{Map, Value};
use tracing::debug;

use crate::core::graph::{Field, NodeId, ObjectGraph, Slot};
use crate::core::introspect::Introspect;

/// Type of objects without a `$type` key.
pub const OBJECT_TYPE: &str = "json::Object";
/// Declared type of fields holding `null`.
pub const NULL_FIELD_TYPE: &str = "json::Value";
const ARRAY_TYPE: &str = "std::vec::Vec";
const MAP_TYPE: &str = "std::collections::BTreeMap";
const OPTIONAL_TYPE: &str = "std::option::Option";

/// Convert `document` into a graph; returns the graph and the root slot.
pub fn graph_from_json(document: &Value) -> Result<(ObjectGraph, Slot)> {
    let mut builder = JsonGraphBuilder::default();
    let root = builder.slot(document, "$")?;
    debug!(nodes = builder.graph.len(), anchors = builder.anchors.len(), "built graph from json");
    Ok((builder.graph, root))
}

/// Read and convert a JSON document from disk.
pub fn load_graph(path: &Path) -> Result<(ObjectGraph, Slot)> {
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let document: Value =
        serde_json::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    graph_from_json(&document).with_context(|| format!("build graph from {}", path.display()))
}

#[derive(Default)]
struct JsonGraphBuilder {
    graph: ObjectGraph,
    anchors: HashMap<String, NodeId>,
}

impl JsonGraphBuilder {
    fn slot(&mut self, value: &Value, at: &str) -> Result<Slot> {
        let slot = match value {
            Value::Null => Slot::Null,
            Value::Bool(value) => Slot::from(*value),
            Value::Number(number) => match number.as_i64() {
                Some(int) => Slot::from(int),
                None => number
                    .as_f64()
                    .map(Slot::from)
                    .ok_or_else(|| anyhow!("{at}: unsupported number {number}"))?,
            },
            Value::String(text) => self.graph.text(text.as_str()).into(),
            Value::Array(items) => {
                let id = self.graph.collection(ARRAY_TYPE, Vec::new());
                for (index, item) in items.iter().enumerate() {
                    let element = self.slot(item, &format!("{at}[{index}]"))?;
                    self.graph.push_element(id, element)?;
                }
                id.into()
            }
            Value::Object(map) => self.object(map, at)?,
        };
        Ok(slot)
    }

    fn object(&mut self, map: &Map<String, Value>, at: &str) -> Result<Slot> {
        if let Some(reference) = map.get("$ref") {
            if map.len() != 1 {
                bail!("{at}: $ref must be the only key");
            }
            let name = directive_str(reference, "$ref", at)?;
            let id = self
                .anchors
                .get(name)
                .copied()
                .ok_or_else(|| anyhow!("{at}: unknown $ref {name:?}"))?;
            return Ok(id.into());
        }

        let type_name = match map.get("$type") {
            Some(value) => Some(directive_str(value, "$type", at)?),
            None => None,
        };
        let anchor = match map.get("$id") {
            Some(value) => Some(directive_str(value, "$id", at)?),
            None => None,
        };

        if let Some(entries) = map.get("$entries") {
            reject_extra_keys(map, "$entries", at)?;
            let id = self.graph.map(type_name.unwrap_or(MAP_TYPE), Vec::new());
            self.register(anchor, id, at)?;
            self.fill_map(id, entries, at)?;
            return Ok(id.into());
        }

        if let Some(content) = map.get("$optional") {
            reject_extra_keys(map, "$optional", at)?;
            let value = match content {
                Value::Null => None,
                other => Some(self.slot(other, &format!("{at}.value"))?),
            };
            let id = self.graph.optional(type_name.unwrap_or(OPTIONAL_TYPE), value);
            self.register(anchor, id, at)?;
            return Ok(id.into());
        }

        let id = self.graph.declare_object(type_name.unwrap_or(OBJECT_TYPE));
        self.register(anchor, id, at)?;
        for (name, value) in map {
            if let Some(directive) = name.strip_prefix('$') {
                if matches!(directive, "type" | "id") {
                    continue;
                }
                bail!("{at}: unknown directive {name:?}");
            }
            let child_at = format!("{at}.{name}");
            let slot = self.slot(value, &child_at)?;
            let declared_type = self.runtime_type(slot)?;
            self.graph.add_field(id, Field::new(name.as_str(), declared_type, slot))?;
        }
        Ok(id.into())
    }

    fn fill_map(&mut self, id: NodeId, entries: &Value, at: &str) -> Result<()> {
        let Value::Array(entries) = entries else {
            bail!("{at}: $entries must be an array of [key, value] pairs");
        };
        let mut seen = HashSet::new();
        for (index, entry) in entries.iter().enumerate() {
            let entry_at = format!("{at}.$entries[{index}]");
            let pair = match entry {
                Value::Array(pair) if pair.len() == 2 => pair,
                _ => bail!("{entry_at}: expected a [key, value] pair"),
            };
            let key = self.slot(&pair[0], &format!("{entry_at}[0]"))?;
            let repr = self.graph.describe(key)?.short_repr();
            if !seen.insert(repr.clone()) {
                bail!("{entry_at}: duplicate map key {repr}");
            }
            let value = self.slot(&pair[1], &format!("{entry_at}[1]"))?;
            self.graph.insert_entry(id, key, value)?;
        }
        Ok(())
    }

    fn register(&mut self, anchor: Option<&str>, id: NodeId, at: &str) -> Result<()> {
        let Some(name) = anchor else {
            return Ok(());
        };
        if self.anchors.insert(name.to_string(), id).is_some() {
            bail!("{at}: duplicate $id {name:?}");
        }
        Ok(())
    }

    fn runtime_type(&self, slot: Slot) -> Result<String> {
        let name = match slot {
            Slot::Null => NULL_FIELD_TYPE.to_string(),
            Slot::Primitive(value) => value.type_name().to_string(),
            Slot::Ref(id) => self.graph.node(id)?.type_name.to_string(),
        };
        Ok(name)
    }
}

/// `$entries` and `$optional` objects only carry `$type` and `$id` besides their directive.
fn reject_extra_keys(map: &Map<String, Value>, directive: &str, at: &str) -> Result<()> {
    let extra = map
        .keys()
        .find(|key| !matches!(key.as_str(), "$type" | "$id") && key.as_str() != directive);
    if let Some(extra) = extra {
        bail!("{at}: unexpected key {extra:?} next to {directive}");
    }
    Ok(())
}

fn directive_str<'a>(value: &'a Value, directive: &str, at: &str) -> Result<&'a str> {
    value
        .as_str()
        .ok_or_else(|| anyhow!("{at}: {directive} must be a string"))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::core::graph::{NodeShape, TEXT_TYPE};

    #[test]
    fn plain_document_maps_to_objects_and_primitives() {
        let (graph, root) = graph_from_json(&json!({
            "$type": "shop::Order",
            "id": 7,
            "paid": true,
            "total": 12.5,
            "note": null,
            "tags": ["a"]
        }))
        .expect("graph");

        let Slot::Ref(root) = root else {
            panic!("root should be a node");
        };
        let fields = graph.fields(root).expect("fields");
        let names: Vec<&str> = fields.iter().map(|field| field.name.as_str()).collect();
        assert_eq!(names, vec!["id", "paid", "total", "note", "tags"]);
        assert_eq!(fields[0].value, Slot::from(7_i64));
        assert_eq!(fields[2].value, Slot::from(12.5_f64));
        assert_eq!(fields[3].declared_type.as_str(), NULL_FIELD_TYPE);
        assert_eq!(fields[4].declared_type.as_str(), ARRAY_TYPE);
        assert_eq!(graph.node(root).expect("root").type_name.as_str(), "shop::Order");
    }

    #[test]
    fn refs_build_cycles() {
        let (graph, root) = graph_from_json(&json!({
            "$id": "a",
            "next": { "next": { "$ref": "a" } }
        }))
        .expect("graph");

        let Slot::Ref(a) = root else {
            panic!("root should be a node");
        };
        let Slot::Ref(b) = graph.fields(a).expect("a")[0].value else {
            panic!("next should be a node");
        };
        assert_eq!(graph.fields(b).expect("b")[0].value, Slot::Ref(a));
    }

    #[test]
    fn entries_and_optionals_have_their_own_shapes() {
        let (graph, root) = graph_from_json(&json!({
            "stock": { "$entries": [["apples", 3]] },
            "nickname": { "$optional": null }
        }))
        .expect("graph");

        let Slot::Ref(root) = root else {
            panic!("root should be a node");
        };
        let fields = graph.fields(root).expect("fields");
        let Slot::Ref(stock) = fields[0].value else {
            panic!("stock should be a node");
        };
        assert_eq!(graph.entries(stock).expect("entries").len(), 1);
        assert_eq!(fields[0].declared_type.as_str(), MAP_TYPE);

        let Slot::Ref(nickname) = fields[1].value else {
            panic!("nickname should be a node");
        };
        assert_eq!(
            graph.node(nickname).expect("optional").shape,
            NodeShape::Optional(None)
        );
    }

    #[test]
    fn strings_are_text_nodes() {
        let (graph, root) = graph_from_json(&json!("hello")).expect("graph");
        let subject = graph.describe(root).expect("describe");
        assert_eq!(subject.as_str(), Some("hello"));
        assert_eq!(subject.type_name(), Some(TEXT_TYPE));
    }

    #[test]
    fn unknown_ref_is_an_error() {
        let err = graph_from_json(&json!({ "next": { "$ref": "nowhere" } })).expect_err("unknown ref");
        assert_eq!(err.to_string(), "$.next: unknown $ref \"nowhere\"");
    }

    #[test]
    fn unknown_directive_is_an_error() {
        let err = graph_from_json(&json!({ "$weird": 1 })).expect_err("directive");
        assert!(err.to_string().contains("unknown directive"));
    }

    #[test]
    fn entries_reject_sibling_fields() {
        let err = graph_from_json(&json!({ "m": { "$entries": [], "extra": null } })).expect_err("extra key");
        assert_eq!(err.to_string(), "$.m: unexpected key \"extra\" next to $entries");
    }

    #[test]
    fn optional_rejects_sibling_fields() {
        let err = graph_from_json(&json!({ "o": { "$optional": 1, "extra": true } })).expect_err("extra key");
        assert_eq!(err.to_string(), "$.o: unexpected key \"extra\" next to $optional");
    }

    #[test]
    fn entries_and_optionals_accept_type_and_id() {
        let (graph, root) = graph_from_json(&json!({
            "m": { "$type": "shop::Stock", "$id": "stock", "$entries": [] },
            "o": { "$type": "shop::Maybe", "$optional": { "$ref": "stock" } }
        }))
        .expect("graph");

        let Slot::Ref(root) = root else {
            panic!("root should be a node");
        };
        let fields = graph.fields(root).expect("fields");
        assert_eq!(fields[0].declared_type.as_str(), "shop::Stock");
        assert_eq!(fields[1].declared_type.as_str(), "shop::Maybe");
    }

    #[test]
    fn duplicate_map_keys_are_rejected() {
        let err = graph_from_json(&json!({ "m": { "$entries": [["a", 1], ["a", 2]] } })).expect_err("duplicate");
        assert_eq!(err.to_string(), "$.m.$entries[1]: duplicate map key \"a\"");

        let (graph, root) = graph_from_json(&json!({ "$entries": [["1", 1], [1, 2]] })).expect("distinct keys");
        let Slot::Ref(root) = root else {
            panic!("root should be a node");
        };
        assert_eq!(graph.entries(root).expect("entries").len(), 2);
    }
}

//! Helpers for rendering deterministic field paths.
//!
//! Field segments are joined with `.`, indices attach as `[i]`, and map
//! members render as `key(<repr>)` / `value(<repr>)`:
//!
//! ```text
//! author.books[0].title
//! inventory.value("apples")
//! ```
//!
//! Key reprs are inserted verbatim, so two keys with the same repr render the
//! same path, and a text key containing `.` or `)` can read like a field path
//! when compared against ignored names.

use std::fmt;

/// One step from a node to one of its children.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    Field(String),
    Index(usize),
    Key(String),
    Value(String),
}

/// Location of a node relative to the traversal root. The root path is empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct FieldPath {
    segments: Vec<Segment>,
}

impl FieldPath {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn child(&self, segment: Segment) -> Self {
        let mut segments = Vec::with_capacity(self.segments.len() + 1);
        segments.extend_from_slice(&self.segments);
        segments.push(segment);
        Self { segments }
    }

    pub fn field(&self, name: impl Into<String>) -> Self {
        self.child(Segment::Field(name.into()))
    }

    pub fn index(&self, index: usize) -> Self {
        self.child(Segment::Index(index))
    }

    pub fn key(&self, repr: impl Into<String>) -> Self {
        self.child(Segment::Key(repr.into()))
    }

    pub fn value(&self, repr: impl Into<String>) -> Self {
        self.child(Segment::Value(repr.into()))
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (position, segment) in self.segments.iter().enumerate() {
            if let Segment::Index(index) = segment {
                write!(f, "[{index}]")?;
                continue;
            }
            if position > 0 {
                f.write_str(".")?;
            }
            match segment {
                Segment::Field(name) => f.write_str(name)?,
                Segment::Key(repr) => write!(f, "key({repr})")?,
                Segment::Value(repr) => write!(f, "value({repr})")?,
                Segment::Index(_) => unreachable!("handled above"),
            }
        }
        Ok(())
    }
}

impl<S: Into<String>> FromIterator<S> for FieldPath {
    /// Build a path of plain field segments, e.g. `["a", "b", "c"]` for `a.b.c`.
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            segments: iter.into_iter().map(|name| Segment::Field(name.into())).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_renders_empty() {
        assert_eq!(FieldPath::root().to_string(), "");
        assert!(FieldPath::root().is_root());
    }

    #[test]
    fn nested_fields_join_with_dots() {
        let path = FieldPath::root().field("a").field("b").field("c");
        assert_eq!(path.to_string(), "a.b.c");
        assert_eq!(path, ["a", "b", "c"].into_iter().collect::<FieldPath>());
    }

    #[test]
    fn indices_attach_without_separator() {
        let path = FieldPath::root().field("books").index(2).field("title");
        assert_eq!(path.to_string(), "books[2].title");
        assert_eq!(FieldPath::root().index(0).to_string(), "[0]");
    }

    #[test]
    fn map_members_render_key_and_value() {
        let map = FieldPath::root().field("myMap");
        assert_eq!(map.key("\"k\"").to_string(), "myMap.key(\"k\")");
        assert_eq!(map.value("\"k\"").to_string(), "myMap.value(\"k\")");
    }
}

//! Structure builder
//!
//! Converts an element tree into a `Value`. The shape of every level is
//! decided by how often each child tag repeats:
//!
//! - no children: a scalar, or the attribute mapping when attributes exist
//! - all child tags distinct: a mapping of attributes and child values
//! - some child tag repeated: a mapping from each repeated tag to a list.
//!   Every member of a repeated tag receives a copy of each uniquely tagged
//!   sibling before conversion, and the unique tags are not emitted at this
//!   level.
//!
//! List members follow the same rules except that childless members
//! contribute only their text (or nothing), and members with repeated
//! children become lists themselves.

use indexmap::IndexMap;

use super::classify::{classify, Siblings};
use super::value::{Mapping, Value};
use crate::dom::Node;

/// Reserved key holding an element's text next to its attributes
pub const TEXT_KEY: &str = "_value";

/// Recursive element-to-value converter
#[derive(Debug, Clone)]
pub struct StructureBuilder {
    text_key: String,
}

impl StructureBuilder {
    /// Create a builder using `_value` as the text key
    pub fn new() -> Self {
        Self::with_text_key(TEXT_KEY)
    }

    /// Create a builder storing element text under `key`
    pub fn with_text_key(key: impl Into<String>) -> Self {
        StructureBuilder {
            text_key: key.into(),
        }
    }

    pub fn text_key(&self) -> &str {
        &self.text_key
    }

    /// Convert an element and its subtree
    pub fn convert(&self, node: &Node) -> Value {
        if !node.has_children() {
            if !node.has_attributes() {
                return Value::Scalar(node.trimmed_text().map(str::to_owned));
            }
            return Value::Mapping(self.attribute_entries(node));
        }

        let siblings = classify(&node.children);
        if !siblings.has_repeats() {
            return Value::Mapping(self.distinct_entries(node, &siblings));
        }

        let mut groups: IndexMap<&str, Vec<Value>> = siblings
            .repeated_tags
            .iter()
            .map(|tag| (*tag, Vec::new()))
            .collect();
        for member in with_common_siblings(&siblings) {
            if let Some(value) = self.convert_list_item(&member) {
                if let Some(items) = groups.get_mut(member.tag.as_str()) {
                    items.push(value);
                }
            }
        }

        Value::Mapping(
            groups
                .into_iter()
                .map(|(tag, items)| (tag.to_owned(), Value::List(items)))
                .collect(),
        )
    }

    /// Convert an element appearing as a member of a repeated tag.
    ///
    /// Returns `None` for a childless member with blank text.
    pub fn convert_list_item(&self, node: &Node) -> Option<Value> {
        if !node.has_children() {
            return node.trimmed_text().map(Value::text);
        }

        let siblings = classify(&node.children);
        if !siblings.has_repeats() {
            return Some(Value::Mapping(self.distinct_entries(node, &siblings)));
        }

        let items = with_common_siblings(&siblings)
            .iter()
            .filter_map(|member| self.convert_list_item(member))
            .collect();
        Some(Value::List(items))
    }

    /// Attributes plus the text key, or nothing for an element without attributes
    fn attribute_entries(&self, node: &Node) -> Mapping {
        let mut map = Mapping::with_capacity(node.attributes.len() + 1);
        if !node.has_attributes() {
            return map;
        }

        for (name, value) in &node.attributes {
            map.insert(name.clone(), Value::text(value.as_str()));
        }
        if let Some(text) = node.trimmed_text() {
            map.insert(self.text_key.clone(), Value::text(text));
        }
        map
    }

    /// Mapping for an element whose child tags are all distinct.
    /// Child entries are inserted after attributes and replace them on collision.
    fn distinct_entries(&self, node: &Node, siblings: &Siblings<'_>) -> Mapping {
        let mut map = self.attribute_entries(node);
        for (tag, child) in &siblings.unique {
            map.insert((*tag).to_owned(), self.convert(child));
        }
        map
    }
}

impl Default for StructureBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Convert an element with the default text key
pub fn convert(node: &Node) -> Value {
    StructureBuilder::new().convert(node)
}

/// Copy each repeated member and append deep copies of the unique siblings
/// to its children. The source tree is left untouched.
fn with_common_siblings(siblings: &Siblings<'_>) -> Vec<Node> {
    siblings
        .repeated
        .iter()
        .map(|member| {
            let mut member = (*member).clone();
            member
                .children
                .extend(siblings.unique.values().map(|common| (*common).clone()));
            member
        })
        .collect()
}

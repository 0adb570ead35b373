//! XML Node representation
//!
//! Owned element tree built from parser events. A node exclusively owns its
//! children; `Clone` produces an independent deep copy.

use indexmap::IndexMap;

/// An element with its attributes, leading text and child elements
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Node {
    /// Element name as written in the document (prefix included)
    pub tag: String,
    /// Attributes in document order
    pub attributes: IndexMap<String, String>,
    /// Character data before the first child element (entity-decoded, untrimmed)
    pub text: Option<String>,
    /// Child elements in document order
    pub children: Vec<Node>,
}

impl Node {
    /// Create an element with no attributes, text or children
    pub fn new(tag: impl Into<String>) -> Self {
        Node {
            tag: tag.into(),
            ..Node::default()
        }
    }

    /// Builder: add an attribute
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Builder: set the leading text
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Builder: append a child element
    pub fn with_child(mut self, child: Node) -> Self {
        self.children.push(child);
        self
    }

    /// Append character data. Text after the first child is not part of
    /// `text` and is ignored.
    pub fn push_text(&mut self, content: &str) {
        if !self.children.is_empty() || content.is_empty() {
            return;
        }
        match &mut self.text {
            Some(text) => text.push_str(content),
            None => self.text = Some(content.to_owned()),
        }
    }

    /// Leading text with surrounding whitespace removed, `None` if blank
    pub fn trimmed_text(&self) -> Option<&str> {
        self.text.as_deref().map(str::trim).filter(|t| !t.is_empty())
    }

    #[inline]
    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    #[inline]
    pub fn has_attributes(&self) -> bool {
        !self.attributes.is_empty()
    }

    /// Get an attribute value by name
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// Number of nodes in this subtree, including this one
    pub fn subtree_size(&self) -> usize {
        // Explicit stack to avoid recursion on deep documents
        let mut count = 0;
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            count += 1;
            stack.extend(node.children.iter());
        }
        count
    }
}

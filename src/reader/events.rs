//! XML Event Types
//!
//! Owned events produced by the event source, in document order.

use indexmap::IndexMap;

use crate::dom::Node;

/// XML parsing event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XmlEvent {
    /// Start of an element: <name attrs...> (also emitted for <name/>)
    Start(StartElement),
    /// Character data or CDATA content, entities decoded
    Text(String),
    /// End of an element: </name> (also emitted for <name/>)
    End(String),
    /// End of input
    Eof,
}

/// Start element event data
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartElement {
    /// Element name as written, prefix included
    pub tag: String,
    /// Attributes in document order, values decoded
    pub attributes: IndexMap<String, String>,
}

impl StartElement {
    pub fn new(tag: impl Into<String>) -> Self {
        StartElement {
            tag: tag.into(),
            attributes: IndexMap::new(),
        }
    }

    /// Turn into an empty tree node
    pub fn into_node(self) -> Node {
        Node {
            tag: self.tag,
            attributes: self.attributes,
            text: None,
            children: Vec::new(),
        }
    }
}

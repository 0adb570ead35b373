//! Sibling classification
//!
//! Splits the children of one element into tags that occur once and
//! members of tags that occur two or more times.

use indexmap::{IndexMap, IndexSet};

use crate::dom::Node;

/// Children of one element split by tag multiplicity
#[derive(Debug, Default)]
pub struct Siblings<'a> {
    /// Tags occurring exactly once, in first-occurrence order
    pub unique: IndexMap<&'a str, &'a Node>,
    /// Members of repeated tags. The first member of a tag is placed when
    /// its second occurrence is seen, so tags may interleave.
    pub repeated: Vec<&'a Node>,
    /// Distinct repeated tags in the order they first appear in `repeated`
    pub repeated_tags: IndexSet<&'a str>,
}

impl<'a> Siblings<'a> {
    /// Check if any child tag occurs more than once
    #[inline]
    pub fn has_repeats(&self) -> bool {
        !self.repeated.is_empty()
    }
}

/// Classify children by how often their tag occurs
pub fn classify(children: &[Node]) -> Siblings<'_> {
    let mut siblings = Siblings::default();

    for child in children {
        let tag = child.tag.as_str();
        if let Some(first) = siblings.unique.shift_remove(tag) {
            siblings.repeated.push(first);
            siblings.repeated.push(child);
            siblings.repeated_tags.insert(tag);
        } else if siblings.repeated_tags.contains(tag) {
            siblings.repeated.push(child);
        } else {
            siblings.unique.insert(tag, child);
        }
    }

    siblings
}

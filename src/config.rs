//! Extraction configuration
//!
//! `Targets` names the tags to extract and decides the output shape:
//! a single tag yields bare records, a set of tags yields records paired
//! with the tag that matched. `ExtractOptions` carries the remaining knobs.

use std::collections::HashSet;

use indexmap::IndexSet;

use crate::convert::TEXT_KEY;
use crate::error::{Result, XmlStreamError};
use crate::reader::DEFAULT_BUFFER_SIZE;

/// Tag names to extract
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Targets {
    /// One tag; records are yielded without their tag
    Single(String),
    /// A set of tags; records are yielded together with the matched tag
    Many(IndexSet<String>),
}

impl Targets {
    pub fn single(tag: impl Into<String>) -> Self {
        Targets::Single(tag.into())
    }

    pub fn many<I, S>(tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Targets::Many(tags.into_iter().map(Into::into).collect())
    }

    /// Check if `tag` is one of the targets
    #[inline]
    pub fn contains(&self, tag: &str) -> bool {
        match self {
            Targets::Single(t) => t == tag,
            Targets::Many(set) => set.contains(tag),
        }
    }

    #[inline]
    pub fn is_single(&self) -> bool {
        matches!(self, Targets::Single(_))
    }

    pub fn len(&self) -> usize {
        match self {
            Targets::Single(_) => 1,
            Targets::Many(set) => set.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        let (single, many) = match self {
            Targets::Single(t) => (Some(t.as_str()), None),
            Targets::Many(set) => (None, Some(set.iter().map(String::as_str))),
        };
        single.into_iter().chain(many.into_iter().flatten())
    }

    /// Reject an empty target set or an empty tag name
    pub fn validate(&self) -> Result<()> {
        if self.is_empty() {
            return Err(XmlStreamError::usage("at least one target tag is required"));
        }
        if self.iter().any(str::is_empty) {
            return Err(XmlStreamError::usage("target tag names must not be empty"));
        }
        Ok(())
    }
}

impl From<&str> for Targets {
    fn from(tag: &str) -> Self {
        Targets::single(tag)
    }
}

impl From<String> for Targets {
    fn from(tag: String) -> Self {
        Targets::Single(tag)
    }
}

impl From<&String> for Targets {
    fn from(tag: &String) -> Self {
        Targets::Single(tag.clone())
    }
}

impl From<&[&str]> for Targets {
    fn from(tags: &[&str]) -> Self {
        Targets::many(tags.iter().copied())
    }
}

impl<const N: usize> From<[&str; N]> for Targets {
    fn from(tags: [&str; N]) -> Self {
        Targets::many(tags)
    }
}

impl From<Vec<&str>> for Targets {
    fn from(tags: Vec<&str>) -> Self {
        Targets::many(tags)
    }
}

impl From<Vec<String>> for Targets {
    fn from(tags: Vec<String>) -> Self {
        Targets::many(tags)
    }
}

impl From<HashSet<String>> for Targets {
    fn from(tags: HashSet<String>) -> Self {
        Targets::many(tags)
    }
}

impl From<IndexSet<String>> for Targets {
    fn from(tags: IndexSet<String>) -> Self {
        Targets::Many(tags)
    }
}

/// Options for an extraction stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractOptions {
    /// Yield converted values instead of raw nodes
    pub structured: bool,
    /// Read buffer capacity for file input
    pub buffer_capacity: usize,
    /// Key holding element text next to attributes
    pub text_key: String,
}

impl ExtractOptions {
    pub fn new() -> Self {
        ExtractOptions {
            structured: false,
            buffer_capacity: DEFAULT_BUFFER_SIZE,
            text_key: TEXT_KEY.to_string(),
        }
    }

    pub fn structured(mut self, structured: bool) -> Self {
        self.structured = structured;
        self
    }

    pub fn buffer_capacity(mut self, capacity: usize) -> Self {
        self.buffer_capacity = capacity.max(1);
        self
    }

    pub fn text_key(mut self, key: impl Into<String>) -> Self {
        self.text_key = key.into();
        self
    }
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self::new()
    }
}

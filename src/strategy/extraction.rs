//! Caller-facing extraction stream
//!
//! Wraps a `SubtreeExtractor` and shapes each item by target arity: a
//! single target tag yields bare records, a set of tags yields records
//! paired with the tag that matched.

use std::io::BufRead;
use std::iter::FusedIterator;

use super::streaming::{Record, SubtreeExtractor};
use crate::convert::Value;
use crate::dom::Node;
use crate::error::Result;

/// One extracted element
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Emitted {
    /// Single-tag mode
    Record(Record),
    /// Multi-tag mode
    Tagged { record: Record, tag: String },
}

impl Emitted {
    pub fn record(&self) -> &Record {
        match self {
            Emitted::Record(record) | Emitted::Tagged { record, .. } => record,
        }
    }

    /// Matched tag, present in multi-tag mode only
    pub fn tag(&self) -> Option<&str> {
        match self {
            Emitted::Record(_) => None,
            Emitted::Tagged { tag, .. } => Some(tag),
        }
    }

    pub fn into_record(self) -> Record {
        match self {
            Emitted::Record(record) | Emitted::Tagged { record, .. } => record,
        }
    }

    pub fn into_parts(self) -> (Record, Option<String>) {
        match self {
            Emitted::Record(record) => (record, None),
            Emitted::Tagged { record, tag } => (record, Some(tag)),
        }
    }

    pub fn as_value(&self) -> Option<&Value> {
        self.record().as_value()
    }

    pub fn as_node(&self) -> Option<&Node> {
        self.record().as_node()
    }
}

/// Lazy stream of extracted elements
pub struct Extraction<R> {
    inner: SubtreeExtractor<R>,
    single: bool,
}

impl<R: BufRead> Extraction<R> {
    pub fn new(inner: SubtreeExtractor<R>) -> Self {
        let single = inner.targets().is_single();
        Extraction { inner, single }
    }

    /// The underlying extractor, for progress and memory statistics
    pub fn extractor(&self) -> &SubtreeExtractor<R> {
        &self.inner
    }

    /// Drop the tags and yield records only
    pub fn records(self) -> impl Iterator<Item = Result<Record>> {
        self.inner.map(|item| item.map(|(record, _)| record))
    }
}

impl<R: BufRead> Iterator for Extraction<R> {
    type Item = Result<Emitted>;

    fn next(&mut self) -> Option<Self::Item> {
        let single = self.single;
        self.inner.next().map(|item| {
            item.map(|(record, tag)| {
                if single {
                    Emitted::Record(record)
                } else {
                    Emitted::Tagged { record, tag }
                }
            })
        })
    }
}

impl<R: BufRead> FusedIterator for Extraction<R> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ExtractOptions, Targets};
    use crate::strategy::streaming::stream_text;

    const DOC: &str = "<r><a>1</a><b>2</b><a>3</a></r>";

    fn extraction(targets: Targets) -> Extraction<&'static [u8]> {
        let options = ExtractOptions::new().structured(true);
        Extraction::new(stream_text(DOC, targets, &options).unwrap())
    }

    #[test]
    fn test_single_tag_mode() {
        let items: Vec<Emitted> = extraction(Targets::from("a")).map(Result::unwrap).collect();
        assert_eq!(items.len(), 2);
        assert!(items.iter().all(|e| e.tag().is_none()));
        assert_eq!(items[1].as_value(), Some(&Value::text("3")));
    }

    #[test]
    fn test_multi_tag_mode() {
        let items: Vec<(Record, Option<String>)> = extraction(Targets::from(["a", "b"]))
            .map(|item| item.unwrap().into_parts())
            .collect();
        let tags: Vec<_> = items.iter().map(|(_, t)| t.as_deref()).collect();
        assert_eq!(tags, [Some("a"), Some("b"), Some("a")]);
        assert_eq!(items[1].0, Record::Value(Value::text("2")));
    }

    #[test]
    fn test_set_of_one_is_still_tagged() {
        let items: Vec<Emitted> = extraction(Targets::from(vec!["b"])).map(Result::unwrap).collect();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].tag(), Some("b"));
    }

    #[test]
    fn test_records_adapter() {
        let records: Vec<Record> = extraction(Targets::from(["a", "b"]))
            .records()
            .map(Result::unwrap)
            .collect();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].as_value().and_then(Value::as_str), Some("1"));
    }
}

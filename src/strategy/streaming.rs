//! Streaming subtree extractor
//!
//! Single-pass driver over an event source. Elements are assembled on a
//! stack of open nodes; every closing tag that matches a target yields the
//! element, converted or raw, together with its tag.
//!
//! Memory is bounded by what a future match can still need: a completed
//! element is kept (attached to its parent) only while some open ancestor
//! is itself a target. Everything else is dropped as soon as it closes, so
//! residency is O(depth + size of the outermost open target subtree) no
//! matter how many records the document holds.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::iter::FusedIterator;
use std::path::Path;

use tracing::{debug, trace};

use crate::config::{ExtractOptions, Targets};
use crate::convert::{StructureBuilder, Value};
use crate::dom::Node;
use crate::error::{Result, XmlStreamError};
use crate::reader::{EventSource, XmlEvent};

/// A matched element, converted or raw
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Record {
    Value(Value),
    Node(Node),
}

impl Record {
    /// Get the converted value if applicable
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Record::Value(v) => Some(v),
            Record::Node(_) => None,
        }
    }

    /// Get the raw node if applicable
    pub fn as_node(&self) -> Option<&Node> {
        match self {
            Record::Node(n) => Some(n),
            Record::Value(_) => None,
        }
    }

    pub fn into_value(self) -> Option<Value> {
        match self {
            Record::Value(v) => Some(v),
            Record::Node(_) => None,
        }
    }

    pub fn into_node(self) -> Option<Node> {
        match self {
            Record::Node(n) => Some(n),
            Record::Value(_) => None,
        }
    }
}

/// Lazy, single-pass extractor of target elements
///
/// Yields `(record, tag)` for every closing tag in the target set, in
/// document order. The stream is finished after the root element closes,
/// after end of input or after the first error; it cannot be rewound.
pub struct SubtreeExtractor<R> {
    /// Dropped once the stream finishes, which closes file input
    source: Option<EventSource<R>>,
    targets: Targets,
    structured: bool,
    builder: StructureBuilder,
    /// Open elements, root first
    stack: Vec<Node>,
    /// Number of open elements whose tag is a target
    open_targets: usize,
    /// Nodes currently held in `stack` and their attached subtrees
    resident: usize,
    peak_resident: usize,
    matched: usize,
    root_closed: bool,
}

/// Open a file and extract target elements from it
pub fn stream_file(
    path: &Path,
    targets: Targets,
    options: &ExtractOptions,
) -> Result<SubtreeExtractor<BufReader<File>>> {
    targets.validate()?;
    let source = EventSource::open(path, options.buffer_capacity)?;
    debug!(
        path = %path.display(),
        targets = targets.len(),
        structured = options.structured,
        "opened XML file stream"
    );
    Ok(SubtreeExtractor::unchecked(source, targets, options))
}

/// Extract target elements from in-memory text
pub fn stream_text<'a>(
    text: &'a str,
    targets: Targets,
    options: &ExtractOptions,
) -> Result<SubtreeExtractor<&'a [u8]>> {
    targets.validate()?;
    debug!(
        bytes = text.len(),
        targets = targets.len(),
        structured = options.structured,
        "opened XML text stream"
    );
    Ok(SubtreeExtractor::unchecked(EventSource::from_text(text), targets, options))
}

impl<R: BufRead> SubtreeExtractor<R> {
    /// Create an extractor over an event source
    pub fn new(source: EventSource<R>, targets: Targets, options: &ExtractOptions) -> Result<Self> {
        targets.validate()?;
        Ok(Self::unchecked(source, targets, options))
    }

    /// Build an extractor for targets that were already validated
    fn unchecked(source: EventSource<R>, targets: Targets, options: &ExtractOptions) -> Self {
        SubtreeExtractor {
            source: Some(source),
            targets,
            structured: options.structured,
            builder: StructureBuilder::with_text_key(options.text_key.as_str()),
            stack: Vec::with_capacity(32),
            open_targets: 0,
            resident: 0,
            peak_resident: 0,
            matched: 0,
            root_closed: false,
        }
    }

    pub fn targets(&self) -> &Targets {
        &self.targets
    }

    pub fn is_structured(&self) -> bool {
        self.structured
    }

    /// Number of records yielded so far
    pub fn matched(&self) -> usize {
        self.matched
    }

    /// Number of element nodes currently held in memory
    pub fn resident_nodes(&self) -> usize {
        self.resident
    }

    /// Highest `resident_nodes` reached so far, including between matches
    pub fn peak_resident_nodes(&self) -> usize {
        self.peak_resident
    }

    /// Current nesting depth
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Check if the stream has ended
    pub fn is_finished(&self) -> bool {
        self.source.is_none()
    }

    fn source_position(&self) -> u64 {
        self.source.as_ref().map_or(0, EventSource::position)
    }

    /// Consume events until the next match or the end of the document
    fn advance(&mut self) -> Result<Option<(Record, String)>> {
        loop {
            let event = match self.source.as_mut() {
                Some(source) => source.next_event()?,
                None => return Ok(None),
            };

            match event {
                XmlEvent::Start(start) => {
                    if self.root_closed {
                        return Err(XmlStreamError::parse(
                            self.source_position(),
                            format!("element <{}> after the root element", start.tag),
                        ));
                    }
                    if self.targets.contains(&start.tag) {
                        self.open_targets += 1;
                    }
                    self.resident += 1;
                    self.peak_resident = self.peak_resident.max(self.resident);
                    self.stack.push(start.into_node());
                }
                XmlEvent::Text(text) => {
                    if self.stack.is_empty() {
                        if !text.trim().is_empty() {
                            return Err(XmlStreamError::parse(
                                self.source_position(),
                                "text outside the root element",
                            ));
                        }
                    } else if self.open_targets > 0 {
                        // Text only matters inside a target
                        if let Some(node) = self.stack.last_mut() {
                            node.push_text(&text);
                        }
                    }
                }
                XmlEvent::End(tag) => {
                    let node = match self.stack.pop() {
                        Some(node) => node,
                        None => {
                            return Err(XmlStreamError::parse(
                                self.source_position(),
                                format!("unexpected end tag </{}>", tag),
                            ))
                        }
                    };
                    if let Some(found) = self.close(node) {
                        return Ok(Some(found));
                    }
                }
                XmlEvent::Eof => {
                    if let Some(open) = self.stack.last() {
                        return Err(XmlStreamError::parse(
                            self.source_position(),
                            format!("unexpected end of input, <{}> is not closed", open.tag),
                        ));
                    }
                    if !self.root_closed {
                        return Err(XmlStreamError::parse(self.source_position(), "no root element"));
                    }
                    return Ok(None);
                }
            }
        }
    }

    /// Handle a closed element: yield it if it matches, then keep it for an
    /// enclosing target or release it.
    fn close(&mut self, node: Node) -> Option<(Record, String)> {
        let is_match = self.targets.contains(&node.tag);
        if is_match {
            self.open_targets -= 1;
        }
        if self.stack.is_empty() {
            self.root_closed = true;
        }
        let retain = self.open_targets > 0;

        if !is_match {
            self.keep_or_release(node, retain);
            return None;
        }

        self.matched += 1;
        let tag = node.tag.clone();
        let record = if self.structured {
            let value = self.builder.convert(&node);
            self.keep_or_release(node, retain);
            Record::Value(value)
        } else if retain {
            // The enclosing target still needs the subtree; the caller gets a copy
            let copy = node.clone();
            self.keep_or_release(node, true);
            Record::Node(copy)
        } else {
            self.resident = self.resident.saturating_sub(node.subtree_size());
            Record::Node(node)
        };

        trace!(
            tag = %tag,
            matched = self.matched,
            resident = self.resident,
            "matched element"
        );
        Some((record, tag))
    }

    fn keep_or_release(&mut self, node: Node, retain: bool) {
        match self.stack.last_mut() {
            Some(parent) if retain => parent.children.push(node),
            _ => {
                let released = node.subtree_size();
                self.resident = self.resident.saturating_sub(released);
                trace!(tag = %node.tag, released, "released subtree");
            }
        }
    }

    /// End the stream, dropping the source and any partial tree
    fn finish(&mut self) {
        if self.source.take().is_some() {
            debug!(matched = self.matched, "XML stream finished");
        }
        self.stack.clear();
        self.open_targets = 0;
        self.resident = 0;
    }
}

impl<R: BufRead> Iterator for SubtreeExtractor<R> {
    type Item = Result<(Record, String)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.source.is_none() {
            return None;
        }

        let result = self.advance();
        match result {
            Ok(Some(found)) => {
                if self.root_closed {
                    // Nothing can match after the root
                    self.finish();
                }
                Some(Ok(found))
            }
            Ok(None) => {
                self.finish();
                None
            }
            Err(err) => {
                debug!(error = %err, matched = self.matched, "XML stream failed");
                self.finish();
                Some(Err(err))
            }
        }
    }
}

impl<R: BufRead> FusedIterator for SubtreeExtractor<R> {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn text_stream<'a>(text: &'a str, targets: impl Into<Targets>, structured: bool) -> SubtreeExtractor<&'a [u8]> {
        stream_text(text, targets.into(), &ExtractOptions::new().structured(structured)).unwrap()
    }

    fn values(text: &str, targets: impl Into<Targets>) -> Vec<(Value, String)> {
        text_stream(text, targets, true)
            .map(|item| {
                let (record, tag) = item.unwrap();
                (record.into_value().unwrap(), tag)
            })
            .collect()
    }

    fn mapping(entries: Vec<(&str, Value)>) -> Value {
        Value::Mapping(entries.into_iter().map(|(k, v)| (k.to_string(), v)).collect())
    }

    const COMPANY: &str = r#"
        <company>
        <staff>
            <operations_department>
                <employees>
                    <team>Marketing</team>
                    <location name="head office" address="Kampala, Uganda" />
                    <bio first_name="John" last_name="Doe">John Doe</bio>
                    <bio first_name="Jane" last_name="Doe">Jane Doe</bio>
                    <bio first_name="Peter" last_name="Doe">Peter Doe</bio>
                </employees>
                <employees>
                    <team>Customer Service</team>
                    <location name="Kampala branch" address="Kampala, Uganda" />
                    <bio first_name="Mary" last_name="Doe">Mary Doe</bio>
                    <bio first_name="Harry" last_name="Doe">Harry Doe</bio>
                    <bio first_name="Paul" last_name="Doe">Paul Doe</bio>
                </employees>
            </operations_department>
        </staff>
        </company>
        "#;

    fn bios(team: &str, location: &str, names: &[&str]) -> Vec<Value> {
        names
            .iter()
            .map(|name| {
                mapping(vec![
                    ("first_name", (*name).into()),
                    ("last_name", "Doe".into()),
                    ("_value", format!("{} Doe", name).into()),
                    ("team", team.into()),
                    (
                        "location",
                        mapping(vec![("name", location.into()), ("address", "Kampala, Uganda".into())]),
                    ),
                ])
            })
            .collect()
    }

    fn company_employees() -> Vec<Value> {
        vec![
            Value::List(bios("Marketing", "head office", &["John", "Jane", "Peter"])),
            Value::List(bios("Customer Service", "Kampala branch", &["Mary", "Harry", "Paul"])),
        ]
    }

    #[test]
    fn test_single_child_record() {
        let found = values("<a><b>1</b></a>", "a");
        assert_eq!(found, vec![(mapping(vec![("b", "1".into())]), "a".to_string())]);
    }

    #[test]
    fn test_repeated_record() {
        let found = values("<r><x>1</x><x>2</x><x>3</x></r>", "r");
        assert_eq!(
            found[0].0,
            mapping(vec![("x", Value::List(vec!["1".into(), "2".into(), "3".into()]))])
        );
    }

    #[test]
    fn test_common_sibling_record() {
        let found = values(
            r#"<r><team>Sales</team><bio name="John">John</bio><bio name="Jane">Jane</bio></r>"#,
            "r",
        );
        let bios = found[0].0.get("bio").and_then(Value::as_list).unwrap();
        assert_eq!(bios.len(), 2);
        assert_eq!(bios[1].get("team"), Some(&Value::text("Sales")));
        assert_eq!(bios[1].get("_value"), Some(&Value::text("Jane")));
    }

    #[test]
    fn test_missing_target_yields_nothing() {
        assert!(values("<r><x>1</x></r>", "nope").is_empty());
    }

    #[test]
    fn test_malformed_after_matches() {
        let mut stream = text_stream("<r><a>1</a><a>2</a><a>3", "a", true);

        assert_eq!(stream.next().unwrap().unwrap().0, Record::Value(Value::text("1")));
        assert_eq!(stream.next().unwrap().unwrap().0, Record::Value(Value::text("2")));
        let err = stream.next().unwrap().unwrap_err();
        assert!(err.is_parse());
        assert!(stream.next().is_none());
        assert!(stream.is_finished());
    }

    #[test]
    fn test_malformed_first() {
        let mut stream = text_stream("<r><a>1</b></r>", "a", true);
        assert!(stream.next().unwrap().unwrap_err().is_parse());
        assert!(stream.next().is_none());
    }

    #[test]
    fn test_empty_document() {
        let mut stream = text_stream("   ", "a", true);
        assert!(stream.next().unwrap().unwrap_err().is_parse());
    }

    #[test]
    fn test_content_after_root() {
        let mut stream = text_stream("<r><a>1</a></r><r/>", "a", true);
        assert!(stream.next().unwrap().is_ok());
        assert!(stream.next().unwrap().unwrap_err().is_parse());
    }

    #[test]
    fn test_root_target_ends_stream() {
        let mut stream = text_stream("<r><x>1</x></r>", "r", false);
        let (record, tag) = stream.next().unwrap().unwrap();
        assert_eq!(tag, "r");
        assert_eq!(record.as_node().map(|n| n.children.len()), Some(1));
        assert!(stream.is_finished());
        assert!(stream.next().is_none());
    }

    #[test]
    fn test_company_staff() {
        let found = values(COMPANY, "staff");
        assert_eq!(found.len(), 1);
        let expected = mapping(vec![(
            "operations_department",
            mapping(vec![("employees", Value::List(company_employees()))]),
        )]);
        assert_eq!(found[0].0, expected);
    }

    #[test]
    fn test_company_operations_department() {
        let found = values(COMPANY, "operations_department");
        assert_eq!(found.len(), 1);
        assert_eq!(
            found[0].0,
            mapping(vec![("employees", Value::List(company_employees()))])
        );
    }

    #[test]
    fn test_company_employees() {
        let lists: Vec<Value> = values(COMPANY, "employees")
            .into_iter()
            .map(|(value, _)| value.get("bio").cloned().unwrap())
            .collect();
        assert_eq!(lists, company_employees());

        let bio_keys: Vec<String> = lists
            .iter()
            .flat_map(|list| list.as_list().unwrap_or_default())
            .map(|bio| bio.as_mapping().unwrap().keys().cloned().collect::<Vec<_>>().join(","))
            .collect();
        assert_eq!(bio_keys.len(), 6);
        assert!(bio_keys
            .iter()
            .all(|keys| keys == "first_name,last_name,_value,team,location"));
    }

    #[test]
    fn test_raw_nodes() {
        let nodes: Vec<Node> = text_stream(COMPANY, "bio", false)
            .map(|item| item.unwrap().0.into_node().unwrap())
            .collect();
        assert_eq!(nodes.len(), 6);
        assert_eq!(nodes[0].attribute("first_name"), Some("John"));
        assert_eq!(nodes[5].text.as_deref(), Some("Paul Doe"));
        assert!(nodes.iter().all(|n| !n.has_children()));
    }

    #[test]
    fn test_nested_targets_keep_full_subtree() {
        let found: Vec<(Record, String)> = text_stream(COMPANY, ["bio", "employees"], false)
            .map(Result::unwrap)
            .collect();
        let tags: Vec<&str> = found.iter().map(|(_, tag)| tag.as_str()).collect();
        assert_eq!(
            tags,
            ["bio", "bio", "bio", "employees", "bio", "bio", "bio", "employees"]
        );

        let employees = found[3].0.as_node().unwrap();
        assert_eq!(employees.children.len(), 5);
        assert_eq!(
            employees.children[4].text.as_deref(),
            found[2].0.as_node().and_then(|n| n.text.as_deref())
        );
    }

    #[test]
    fn test_two_parses_convert_equal() {
        assert_eq!(values(COMPANY, "employees"), values(COMPANY, "employees"));
    }

    fn record_document(records: usize) -> String {
        let mut doc = String::from("<root>");
        for i in 0..records {
            doc.push_str(&format!("<record><id>{}</id><name>n{}</name></record>", i, i));
        }
        doc.push_str("</root>");
        doc
    }

    fn record_file(records: usize) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(record_document(records).as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_resident_nodes_bounded() {
        fn scan(records: usize) -> (usize, usize) {
            let doc = record_document(records);
            let mut stream = text_stream(&doc, "record", true);
            let count = stream.by_ref().map(Result::unwrap).count();
            (count, stream.peak_resident_nodes())
        }

        let (small_count, small_peak) = scan(10);
        let (large_count, large_peak) = scan(2000);
        assert_eq!(small_count, 10);
        assert_eq!(large_count, 2000);
        assert_eq!(small_peak, large_peak);
        // root, record, id, name
        assert_eq!(large_peak, 4);
    }

    #[test]
    fn test_file_resident_nodes_bounded() {
        fn scan(records: usize) -> (usize, usize) {
            let file = record_file(records);
            let options = ExtractOptions::new().structured(true).buffer_capacity(256);
            let mut stream = stream_file(file.path(), Targets::from("record"), &options).unwrap();
            let mut count = 0;
            while let Some(item) = stream.next() {
                item.unwrap();
                count += 1;
                assert_eq!(stream.resident_nodes(), stream.depth());
            }
            (count, stream.peak_resident_nodes())
        }

        let (small_count, small_peak) = scan(10);
        let (large_count, large_peak) = scan(2000);
        assert_eq!(small_count, 10);
        assert_eq!(large_count, 2000);
        assert_eq!(small_peak, large_peak);
        assert_eq!(large_peak, 4);
    }

    #[test]
    fn test_resident_nodes_inside_open_record() {
        let file = record_file(50);
        let options = ExtractOptions::new().structured(true);
        let mut stream = stream_file(file.path(), Targets::from(["record", "id"]), &options).unwrap();

        let mut ids = 0;
        while let Some(item) = stream.next() {
            let (_, tag) = item.unwrap();
            if tag == "id" {
                // <id> stays attached to the open <record>
                ids += 1;
                assert_eq!(stream.depth(), 2);
                assert_eq!(stream.resident_nodes(), stream.depth() + 1);
            } else {
                assert_eq!(stream.depth(), 1);
                assert_eq!(stream.resident_nodes(), 1);
            }
        }
        assert_eq!(ids, 50);
        assert_eq!(stream.peak_resident_nodes(), 4);
    }

    #[test]
    fn test_parse_error_branches() {
        fn failure(text: &str, target: &str) -> XmlStreamError {
            text_stream(text, target, true)
                .find_map(|item| item.err())
                .expect("stream should fail")
        }

        let after_root = failure("<r><a>1</a></r><r/>", "a");
        assert!(after_root.to_string().contains("after the root element"));

        let stray_text = failure("<r><a>1</a></r>junk", "a");
        assert!(stray_text.to_string().contains("text outside the root element"));

        let unclosed = failure("<r><a>1</a>", "a");
        assert!(unclosed.to_string().contains("<r> is not closed"));

        let no_root = failure("<!-- nothing -->", "a");
        assert!(no_root.to_string().contains("no root element"));

        let stray_end = failure("</r>", "a");
        assert!(stray_end.is_parse());
        assert!(stray_end.position().is_some());
    }

    #[test]
    fn test_file_stream() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(COMPANY.as_bytes()).unwrap();

        let options = ExtractOptions::new().structured(true).buffer_capacity(64);
        let stream = stream_file(file.path(), Targets::from("employees"), &options).unwrap();
        let found: Vec<_> = stream.map(Result::unwrap).collect();
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].0.as_value().and_then(|v| v.get("bio")), Some(&company_employees()[0]));
    }

    #[test]
    fn test_file_not_found() {
        let err = match stream_file(Path::new("/nonexistent/company.xml"), "a".into(), &ExtractOptions::new()) {
            Ok(_) => panic!("expected an error"),
            Err(err) => err,
        };
        assert!(err.is_io());
    }

    #[test]
    fn test_usage_checked_before_open() {
        let err = match stream_file(Path::new("/nonexistent/company.xml"), Vec::<String>::new().into(), &ExtractOptions::new()) {
            Ok(_) => panic!("expected an error"),
            Err(err) => err,
        };
        assert!(err.is_usage());
    }

    #[test]
    fn test_new_rejects_empty_tag() {
        let source = EventSource::from_text("<r/>");
        let err = match SubtreeExtractor::new(source, Targets::from(""), &ExtractOptions::new()) {
            Ok(_) => panic!("expected an error"),
            Err(err) => err,
        };
        assert!(err.is_usage());
    }
}

//! Event source
//!
//! Adapts the quick-xml pull parser into owned `XmlEvent`s. End tag names
//! are checked against the open element, empty elements are expanded into
//! a start and an end event, and markup that carries no element data
//! (comments, processing instructions, declarations) is skipped.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use super::events::{StartElement, XmlEvent};
use crate::error::{Result, XmlStreamError};

/// Buffer size for reading files
pub const DEFAULT_BUFFER_SIZE: usize = 8192;

/// Pull-based source of owned XML events
pub struct EventSource<R> {
    reader: Reader<R>,
    buf: Vec<u8>,
}

impl<R: BufRead> EventSource<R> {
    /// Create a source reading from any buffered input
    pub fn new(input: R) -> Self {
        let mut reader = Reader::from_reader(input);
        reader
            .trim_text(false)
            .check_end_names(true)
            .expand_empty_elements(true);
        EventSource {
            reader,
            buf: Vec::with_capacity(512),
        }
    }

    /// Byte offset of the parser in the input
    pub fn position(&self) -> u64 {
        self.reader.buffer_position() as u64
    }

    /// Read the next element, text or end-of-input event
    pub fn next_event(&mut self) -> Result<XmlEvent> {
        loop {
            self.buf.clear();
            let event = match self.reader.read_event_into(&mut self.buf) {
                Ok(event) => event,
                Err(err) => {
                    let position = self.reader.buffer_position() as u64;
                    return Err(XmlStreamError::parse(position, err.to_string()));
                }
            };
            let position = self.reader.buffer_position() as u64;

            match event {
                Event::Start(e) => return start_element(&e, position).map(XmlEvent::Start),
                Event::End(e) => {
                    return decode(e.name().as_ref(), position).map(XmlEvent::End);
                }
                Event::Text(e) => {
                    let text = e
                        .unescape()
                        .map_err(|err| XmlStreamError::parse(position, err.to_string()))?;
                    if !text.is_empty() {
                        return Ok(XmlEvent::Text(text.into_owned()));
                    }
                }
                Event::CData(e) => {
                    let text = decode(&e, position)?;
                    if !text.is_empty() {
                        return Ok(XmlEvent::Text(text));
                    }
                }
                Event::Eof => return Ok(XmlEvent::Eof),
                // Comments, processing instructions, declarations, DOCTYPE
                _ => {}
            }
        }
    }
}

impl EventSource<BufReader<File>> {
    /// Open a file with the given read buffer capacity
    pub fn open(path: &Path, capacity: usize) -> Result<Self> {
        let file = File::open(path).map_err(|err| XmlStreamError::io(path, err))?;
        Ok(Self::new(BufReader::with_capacity(capacity, file)))
    }
}

impl<'a> EventSource<&'a [u8]> {
    /// Create a source over in-memory text
    pub fn from_text(text: &'a str) -> Self {
        Self::new(text.as_bytes())
    }
}

fn start_element(e: &BytesStart<'_>, position: u64) -> Result<StartElement> {
    let mut element = StartElement::new(decode(e.name().as_ref(), position)?);
    for attr in e.attributes() {
        let attr = attr.map_err(|err| XmlStreamError::parse(position, err.to_string()))?;
        let name = decode(attr.key.as_ref(), position)?;
        let value = attr
            .unescape_value()
            .map_err(|err| XmlStreamError::parse(position, err.to_string()))?;
        element.attributes.insert(name, value.into_owned());
    }
    Ok(element)
}

fn decode(bytes: &[u8], position: u64) -> Result<String> {
    std::str::from_utf8(bytes)
        .map(str::to_owned)
        .map_err(|err| XmlStreamError::parse(position, format!("invalid UTF-8: {}", err)))
}

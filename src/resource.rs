//! Persistent stream state
//!
//! Owns an extraction stream between calls and hands out records in
//! batches. With the `nif` feature the state is wrapped in a `ResourceArc`
//! so the BEAM can hold it across NIF calls.

use std::fs::File;
use std::io::{BufReader, Cursor};
use std::path::Path;

use crate::config::{ExtractOptions, Targets};
use crate::error::{Result, XmlStreamError};
use crate::reader::EventSource;
use crate::strategy::{stream_file, Record, SubtreeExtractor};

/// An owned stream over a file or a private copy of some text
pub enum OwnedStream {
    File(SubtreeExtractor<BufReader<File>>),
    Text(SubtreeExtractor<Cursor<Vec<u8>>>),
}

impl OwnedStream {
    pub fn open_file(path: &Path, targets: Targets, options: &ExtractOptions) -> Result<Self> {
        stream_file(path, targets, options).map(OwnedStream::File)
    }

    pub fn from_bytes(bytes: Vec<u8>, targets: Targets, options: &ExtractOptions) -> Result<Self> {
        let source = EventSource::new(Cursor::new(bytes));
        SubtreeExtractor::new(source, targets, options).map(OwnedStream::Text)
    }

    fn next_item(&mut self) -> Option<Result<(Record, String)>> {
        match self {
            OwnedStream::File(stream) => stream.next(),
            OwnedStream::Text(stream) => stream.next(),
        }
    }

    pub fn is_finished(&self) -> bool {
        match self {
            OwnedStream::File(stream) => stream.is_finished(),
            OwnedStream::Text(stream) => stream.is_finished(),
        }
    }
}

/// Result of one batch request
#[derive(Debug)]
pub enum Batch {
    /// Records in document order; `done` once no more can follow
    Items {
        items: Vec<(Record, String)>,
        done: bool,
    },
    /// The stream failed; records from earlier batches stay valid
    Failed(XmlStreamError),
}

/// Stream plus the error held back while a partial batch is delivered
pub struct BatchedStream {
    stream: OwnedStream,
    pending_error: Option<XmlStreamError>,
}

impl BatchedStream {
    pub fn new(stream: OwnedStream) -> Self {
        BatchedStream {
            stream,
            pending_error: None,
        }
    }

    /// Take up to `max` records (at least one is requested).
    ///
    /// An error met after some records were collected is reported by the
    /// following call, so those records are never lost.
    pub fn take(&mut self, max: usize) -> Batch {
        if let Some(err) = self.pending_error.take() {
            return Batch::Failed(err);
        }

        let max = max.max(1);
        let mut items = Vec::with_capacity(max.min(64));
        while items.len() < max {
            match self.stream.next_item() {
                Some(Ok(item)) => items.push(item),
                Some(Err(err)) if items.is_empty() => return Batch::Failed(err),
                Some(Err(err)) => {
                    self.pending_error = Some(err);
                    return Batch::Items { items, done: false };
                }
                None => return Batch::Items { items, done: true },
            }
        }

        let done = self.stream.is_finished();
        Batch::Items { items, done }
    }
}

#[cfg(feature = "nif")]
pub use self::nif::{ExtractorRef, ExtractorResource};

#[cfg(feature = "nif")]
mod nif {
    use super::BatchedStream;
    use rustler::ResourceArc;
    use std::sync::Mutex;

    /// Wrapper for BatchedStream that can be stored in a ResourceArc
    pub struct ExtractorResource {
        pub inner: Mutex<BatchedStream>,
    }

    impl ExtractorResource {
        pub fn new(stream: BatchedStream) -> Self {
            ExtractorResource {
                inner: Mutex::new(stream),
            }
        }
    }

    #[rustler::resource_impl]
    impl rustler::Resource for ExtractorResource {}

    /// Type alias for the ResourceArc
    pub type ExtractorRef = ResourceArc<ExtractorResource>;
}

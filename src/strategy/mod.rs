//! Extraction Strategy Module
//!
//! - streaming: single-pass subtree extractor with bounded memory
//! - extraction: caller-facing stream shaped by target arity

pub mod extraction;
pub mod streaming;

pub use extraction::{Emitted, Extraction};
pub use streaming::{stream_file, stream_text, Record, SubtreeExtractor};

//! XML Reader Module
//!
//! - EventSource: pull parser adapter over files, buffers and text
//! - Events: owned XML event types

pub mod events;
pub mod source;

pub use events::{StartElement, XmlEvent};
pub use source::{EventSource, DEFAULT_BUFFER_SIZE};

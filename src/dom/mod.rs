//! DOM Module - owned element tree
//!
//! Nodes are built incrementally by the streaming extractor and handed to
//! the converter or to the caller. Only the part of the document that can
//! still belong to a match is kept in memory.

pub mod node;

pub use node::Node;

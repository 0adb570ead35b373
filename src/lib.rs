//! xmlstream - Streaming record extraction from large XML documents
//!
//! Scans a document once, collects the elements whose tag is in a target
//! set and yields each one as soon as it closes, either as a raw `Node` or
//! converted to a nested `Value` of mappings, lists and scalars. Only the
//! part of the tree that can still belong to a match is kept in memory.
//!
//! ```no_run
//! use xmlstream::extract_from_file;
//!
//! for item in extract_from_file("catalog.xml", "product", true)? {
//!     let record = item?.into_record();
//!     println!("{:?}", record.as_value());
//! }
//! # Ok::<(), xmlstream::XmlStreamError>(())
//! ```

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

pub mod config;
pub mod convert;
pub mod dom;
pub mod error;
pub mod reader;
pub mod resource;
pub mod strategy;

#[cfg(feature = "nif")]
mod nif;
#[cfg(feature = "nif")]
mod term;

pub use config::{ExtractOptions, Targets};
pub use convert::{convert, Mapping, StructureBuilder, Value, TEXT_KEY};
pub use dom::Node;
pub use error::{Result, XmlStreamError};
pub use strategy::{Emitted, Extraction, Record, SubtreeExtractor};

// ============================================================================
// Allocator Configuration
// ============================================================================

#[cfg(feature = "memory_tracking")]
mod tracking {
    use std::alloc::{GlobalAlloc, Layout};
    use std::sync::atomic::{AtomicUsize, Ordering};

    pub static ALLOCATED: AtomicUsize = AtomicUsize::new(0);
    pub static PEAK_ALLOCATED: AtomicUsize = AtomicUsize::new(0);

    pub struct TrackingAllocator;

    #[cfg(feature = "mimalloc")]
    static UNDERLYING: mimalloc::MiMalloc = mimalloc::MiMalloc;

    #[cfg(not(feature = "mimalloc"))]
    static UNDERLYING: std::alloc::System = std::alloc::System;

    fn raise_peak(current: usize) {
        let mut peak = PEAK_ALLOCATED.load(Ordering::Relaxed);
        while current > peak {
            match PEAK_ALLOCATED.compare_exchange_weak(peak, current, Ordering::Relaxed, Ordering::Relaxed) {
                Ok(_) => break,
                Err(p) => peak = p,
            }
        }
    }

    unsafe impl GlobalAlloc for TrackingAllocator {
        unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
            let ptr = UNDERLYING.alloc(layout);
            if !ptr.is_null() {
                raise_peak(ALLOCATED.fetch_add(layout.size(), Ordering::Relaxed) + layout.size());
            }
            ptr
        }

        unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
            ALLOCATED.fetch_sub(layout.size(), Ordering::Relaxed);
            UNDERLYING.dealloc(ptr, layout)
        }
    }
}

#[cfg(feature = "memory_tracking")]
#[global_allocator]
static GLOBAL: tracking::TrackingAllocator = tracking::TrackingAllocator;

#[cfg(all(feature = "mimalloc", not(feature = "memory_tracking")))]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

/// Bytes currently allocated (0 without the `memory_tracking` feature)
#[cfg(feature = "memory_tracking")]
pub fn allocated_bytes() -> usize {
    tracking::ALLOCATED.load(std::sync::atomic::Ordering::SeqCst)
}

/// Highest allocation seen since the last reset
#[cfg(feature = "memory_tracking")]
pub fn peak_allocated_bytes() -> usize {
    tracking::PEAK_ALLOCATED.load(std::sync::atomic::Ordering::SeqCst)
}

/// Reset the peak to the current value, returning `(current, old_peak)`
#[cfg(feature = "memory_tracking")]
pub fn reset_memory_stats() -> (usize, usize) {
    use std::sync::atomic::Ordering;
    let current = tracking::ALLOCATED.load(Ordering::SeqCst);
    let peak = tracking::PEAK_ALLOCATED.swap(current, Ordering::SeqCst);
    (current, peak)
}

#[cfg(not(feature = "memory_tracking"))]
pub fn allocated_bytes() -> usize {
    0
}

#[cfg(not(feature = "memory_tracking"))]
pub fn peak_allocated_bytes() -> usize {
    0
}

#[cfg(not(feature = "memory_tracking"))]
pub fn reset_memory_stats() -> (usize, usize) {
    (0, 0)
}

// ============================================================================
// Entry Points
// ============================================================================

/// Extract the elements tagged `targets` from the file at `path`.
///
/// A single tag yields `Emitted::Record`; a set of tags yields
/// `Emitted::Tagged`. The file is opened here, so a missing or unreadable
/// file fails before any element is produced.
pub fn extract_from_file(
    path: impl AsRef<Path>,
    targets: impl Into<Targets>,
    structured: bool,
) -> Result<Extraction<BufReader<File>>> {
    let options = ExtractOptions::new().structured(structured);
    extract_from_file_with_options(path, targets, &options)
}

pub fn extract_from_file_with_options(
    path: impl AsRef<Path>,
    targets: impl Into<Targets>,
    options: &ExtractOptions,
) -> Result<Extraction<BufReader<File>>> {
    strategy::stream_file(path.as_ref(), targets.into(), options).map(Extraction::new)
}

/// Extract the elements tagged `targets` from in-memory text
pub fn extract_from_text<'a>(
    text: &'a str,
    targets: impl Into<Targets>,
    structured: bool,
) -> Result<Extraction<&'a [u8]>> {
    let options = ExtractOptions::new().structured(structured);
    extract_from_text_with_options(text, targets, &options)
}

pub fn extract_from_text_with_options<'a>(
    text: &'a str,
    targets: impl Into<Targets>,
    options: &ExtractOptions,
) -> Result<Extraction<&'a [u8]>> {
    strategy::stream_text(text, targets.into(), options).map(Extraction::new)
}

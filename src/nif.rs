//! Elixir bindings
//!
//! Streams live in a `ResourceArc` between calls; `stream_next/2` hands
//! records over in batches so large documents never cross into the BEAM
//! at once.

use std::path::Path;

use rustler::{Atom, Encoder, Env, NifResult, Term};
use tracing::debug;

use crate::config::{ExtractOptions, Targets};
use crate::resource::{Batch, BatchedStream, ExtractorRef, ExtractorResource, OwnedStream};
use crate::term::{error_to_term, items_to_term};

mod atoms {
    rustler::atoms! {
        ok,
        error,
        cont,
        done,
    }
}

/// Items always carry their tag on the Elixir side
fn targets_from(tags: Vec<String>) -> Targets {
    Targets::many(tags)
}

fn open_result<'a>(env: Env<'a>, opened: crate::Result<OwnedStream>) -> Term<'a> {
    match opened {
        Ok(stream) => {
            let resource = ExtractorRef::new(ExtractorResource::new(BatchedStream::new(stream)));
            (atoms::ok(), resource).encode(env)
        }
        Err(err) => (atoms::error(), error_to_term(env, &err)).encode(env),
    }
}

// ============================================================================
// Stream NIFs
// ============================================================================

/// Open a stream over the file at `path`
#[rustler::nif(schedule = "DirtyIo")]
fn stream_file<'a>(env: Env<'a>, path: String, tags: Vec<String>, structured: bool) -> NifResult<Term<'a>> {
    let options = ExtractOptions::new().structured(structured);
    let opened = OwnedStream::open_file(Path::new(&path), targets_from(tags), &options);
    Ok(open_result(env, opened))
}

/// Open a stream over a private copy of `text`
#[rustler::nif]
fn stream_text<'a>(env: Env<'a>, text: String, tags: Vec<String>, structured: bool) -> NifResult<Term<'a>> {
    let options = ExtractOptions::new().structured(structured);
    let opened = OwnedStream::from_bytes(text.into_bytes(), targets_from(tags), &options);
    Ok(open_result(env, opened))
}

/// Pull up to `max` records
#[rustler::nif(schedule = "DirtyIo")]
fn stream_next<'a>(env: Env<'a>, stream: ExtractorRef, max: usize) -> NifResult<Term<'a>> {
    let mut inner = stream
        .inner
        .lock()
        .map_err(|_| rustler::Error::RaiseAtom("stream_lock_poisoned"))?;

    let term = match inner.take(max) {
        Batch::Items { items, done } => {
            let tag: Atom = if done { atoms::done() } else { atoms::cont() };
            (tag, items_to_term(env, &items)).encode(env)
        }
        Batch::Failed(err) => {
            debug!(error = %err, "stream_next failed");
            (atoms::error(), error_to_term(env, &err)).encode(env)
        }
    };
    Ok(term)
}

// ============================================================================
// Memory Tracking NIFs
// ============================================================================

#[rustler::nif]
fn get_rust_memory() -> usize {
    crate::allocated_bytes()
}

#[rustler::nif]
fn get_rust_memory_peak() -> usize {
    crate::peak_allocated_bytes()
}

#[rustler::nif]
fn reset_rust_memory_stats() -> (usize, usize) {
    crate::reset_memory_stats()
}

rustler::init!("Elixir.XmlStream.Native");

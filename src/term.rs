//! Elixir Term Conversion Utilities
//!
//! Converts extracted records and errors to Elixir terms.

use rustler::{Encoder, Env, NewBinary, Term};

use crate::convert::Value;
use crate::dom::Node;
use crate::error::XmlStreamError;
use crate::strategy::Record;

rustler::atoms! {
    element,
    io,
    parse,
    usage,
}

/// Convert a converted value: maps, lists, binaries and nil
pub fn value_to_term<'a>(env: Env<'a>, value: &Value) -> Term<'a> {
    match value {
        Value::Scalar(Some(text)) => str_to_binary(env, text),
        Value::Scalar(None) => rustler::types::atom::nil().encode(env),
        Value::List(items) => {
            let mut list = Term::list_new_empty(env);
            for item in items.iter().rev() {
                list = list.list_prepend(value_to_term(env, item));
            }
            list
        }
        Value::Mapping(mapping) => {
            let mut map = Term::map_new(env);
            for (key, entry) in mapping {
                // Keys are unique within a mapping, so map_put cannot fail
                if let Ok(updated) = map.map_put(str_to_binary(env, key), value_to_term(env, entry)) {
                    map = updated;
                }
            }
            map
        }
    }
}

/// Convert a raw node to `{:element, tag, attrs, text, children}`
pub fn node_to_term<'a>(env: Env<'a>, node: &Node) -> Term<'a> {
    let mut attrs = Term::list_new_empty(env);
    for (name, value) in node.attributes.iter().rev() {
        let attr_tuple = (str_to_binary(env, name), str_to_binary(env, value));
        attrs = attrs.list_prepend(attr_tuple.encode(env));
    }

    let text = match &node.text {
        Some(text) => str_to_binary(env, text),
        None => rustler::types::atom::nil().encode(env),
    };

    let mut children = Term::list_new_empty(env);
    for child in node.children.iter().rev() {
        children = children.list_prepend(node_to_term(env, child));
    }

    (element(), str_to_binary(env, &node.tag), attrs, text, children).encode(env)
}

pub fn record_to_term<'a>(env: Env<'a>, record: &Record) -> Term<'a> {
    match record {
        Record::Value(value) => value_to_term(env, value),
        Record::Node(node) => node_to_term(env, node),
    }
}

/// Convert a batch to a list of `{record, tag}` tuples
pub fn items_to_term<'a>(env: Env<'a>, items: &[(Record, String)]) -> Term<'a> {
    let mut list = Term::list_new_empty(env);
    for (record, tag) in items.iter().rev() {
        let item = (record_to_term(env, record), str_to_binary(env, tag));
        list = list.list_prepend(item.encode(env));
    }
    list
}

/// Convert an error to `{kind, message}`
pub fn error_to_term<'a>(env: Env<'a>, err: &XmlStreamError) -> Term<'a> {
    let kind = match err {
        XmlStreamError::Io { .. } => io(),
        XmlStreamError::Parse { .. } => parse(),
        XmlStreamError::Usage(_) => usage(),
    };
    (kind, str_to_binary(env, &err.to_string())).encode(env)
}

/// Convert a string to a binary term (more efficient than .encode())
#[inline]
fn str_to_binary<'a>(env: Env<'a>, s: &str) -> Term<'a> {
    let bytes = s.as_bytes();
    let mut binary = NewBinary::new(env, bytes.len());
    binary.as_mut_slice().copy_from_slice(bytes);
    binary.into()
}

//! Element to value conversion
//!
//! - `classify`: splits children into unique and repeated tags
//! - `builder`: recursive map/list/scalar conversion
//! - `value`: the converted value type

pub mod builder;
pub mod classify;
pub mod value;

pub use builder::{convert, StructureBuilder, TEXT_KEY};
pub use classify::{classify, Siblings};
pub use value::{Mapping, Value};

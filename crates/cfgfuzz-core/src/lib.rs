//! Core contracts shared across cfgfuzz crates.
//!
//! Defines the recursive schema model that drives generation and the tagged
//! value tree every generated configuration is expressed in.

pub mod error;
pub mod schema;
pub mod value;

pub use error::{Error, Result};
pub use schema::{SchemaKind, SchemaNode};
pub use value::GeneratedValue;

//! Schema detection for cfgfuzz.
//!
//! Builds a [`SchemaNode`] tree from an explicit JSON Schema document or by
//! inference over an example configuration, applying the user's ignore and
//! constraint overlay along the way.

pub mod engine;
pub mod errors;
mod explicit;
mod infer;
mod overlay;
pub mod source;

pub use engine::{DetectedSchema, SchemaEngine, SchemaOrigin};
pub use errors::SchemaError;
pub use source::{DEFAULT_EXAMPLE_FILE, DEFAULT_SCHEMA_FILE, SchemaSource};

pub use cfgfuzz_core::SchemaNode;

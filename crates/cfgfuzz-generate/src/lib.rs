//! Random value generation for cfgfuzz.
//!
//! [`ValueGenerator`] walks a [`SchemaNode`](cfgfuzz_core::SchemaNode) and
//! produces a [`GeneratedValue`](cfgfuzz_core::GeneratedValue), pulling every
//! random decision from a [`Draw`] source. [`RngDraw`] is the seeded source
//! used by the fuzz loop.

pub mod draw;
pub mod errors;
pub mod generator;

pub use draw::{Draw, RngDraw};
pub use errors::DrawError;
pub use generator::ValueGenerator;

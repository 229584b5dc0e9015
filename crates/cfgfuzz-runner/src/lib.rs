//! The fuzz loop and its collaborators.
//!
//! A [`FuzzSession`] generates candidates, renders each one behind a fault
//! barrier ([`render_guarded`]), classifies the outcome with the [`Oracle`],
//! collapses repeats with the [`Deduplicator`] and persists new crashes
//! through the [`ReproductionWriter`].

pub mod atomic;
pub mod dedup;
pub mod errors;
pub mod minimize;
pub mod model;
pub mod oracle;
pub mod render;
pub mod repro;
pub mod session;

pub use dedup::Deduplicator;
pub use errors::PersistenceError;
pub use minimize::{Minimized, Minimizer};
pub use model::{CrashRecord, SessionOptions, SessionReport};
pub use oracle::{DEFAULT_UNINTERESTING_PATTERNS, Oracle};
pub use render::{FaultPayload, RenderOutcome, RenderResponse, Renderer, render_guarded};
pub use repro::ReproductionWriter;
pub use session::{FuzzSession, SessionObserver};

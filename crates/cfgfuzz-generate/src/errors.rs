use thiserror::Error;

/// Failures of a single primitive draw. The generator recovers from these
/// locally and never returns them.
#[derive(Debug, Error)]
pub enum DrawError {
    #[error("unsupported pattern `{pattern}`: {reason}")]
    Pattern { pattern: String, reason: String },
    #[error("pattern `{pattern}` produced non UTF-8 output")]
    NotUtf8 { pattern: String },
}

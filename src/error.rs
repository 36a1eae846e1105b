use std::io;
use thiserror::Error;

/// Boxed error type used by the service.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// A filter pattern that failed to compile.
///
/// Returned when constructing the middleware, never while serving a request.
#[derive(Debug, Error)]
#[error("invalid filter pattern `{pattern}`: {source}")]
pub struct CompileError {
    /// The offending pattern as configured.
    pub pattern: String,
    /// Diagnostic from the regex engine.
    #[source]
    pub source: regex::Error,
}

/// Error raised while rewriting a single response.
#[derive(Debug, Error)]
pub enum RewriteError {
    /// The downstream body yielded an error while being captured.
    #[error("failed to read response body: {0}")]
    Body(#[source] BoxError),

    /// The body declared `Content-Encoding: gzip` but is not a valid gzip stream.
    #[error("failed to decode gzip response body: {0}")]
    Decode(#[source] io::Error),

    /// The rewritten body could not be re-encoded.
    #[error("failed to encode gzip response body: {0}")]
    Encode(#[source] io::Error),
}

//! HTTP response body rewriting middleware for Tower.
//!
//! This crate provides a Tower layer that buffers a downstream response, runs
//! an ordered list of regular-expression substitutions over its body and
//! forwards the result.
//!
//! # Example
//!
//! ```ignore
//! use http_body_rewrite::{Config, RewriteBodyLayer};
//! use tower::ServiceBuilder;
//!
//! let config = Config::new().filter("foo", "bar");
//! let service = ServiceBuilder::new()
//!     .layer(RewriteBodyLayer::new(&config, "subfilter")?)
//!     .service(my_service);
//! ```
//!
//! # Rewrite Rules
//!
//! - Filters run in the order they are configured, each over the whole output
//!   of the previous one.
//! - Replacements support `$1` and `${name}` capture group references.
//! - An invalid pattern fails construction, never a request.
//!
//! # Content Encoding
//!
//! - Bodies without `Content-Encoding`, or with `identity`, are rewritten as is.
//! - `gzip` bodies are decompressed, rewritten and compressed again. A body that
//!   is not a complete gzip stream fails the request.
//! - Bodies in any other encoding are forwarded byte for byte.
//!
//! # Response Modifications
//!
//! On every response, rewritten or not:
//! - `Content-Length` header is removed
//! - `Last-Modified` header is removed unless `lastModified` is configured
//! - Status, trailers and every other header are kept

#![deny(missing_docs)]

mod body;
mod capture;
mod codec;
mod config;
mod error;
mod filter;
mod finalize;
mod future;
mod layer;
mod rewrite;
mod service;

pub use body::RewrittenBody;
pub use capture::{CapturedResponse, ResponseWriter};
pub use codec::Codec;
pub use config::{Config, FilterConfig};
pub use error::{BoxError, CompileError, RewriteError};
pub use filter::{Filter, FilterSet};
pub use future::ResponseFuture;
pub use layer::RewriteBodyLayer;
pub use rewrite::RewriteBody;
pub use service::RewriteBodyService;

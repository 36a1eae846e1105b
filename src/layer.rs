use crate::config::Config;
use crate::error::CompileError;
use crate::rewrite::RewriteBody;
use crate::service::RewriteBodyService;
use tower::Layer;

/// A Tower layer that rewrites HTTP response bodies.
///
/// This layer wraps services and runs the configured filters over every
/// response body they produce.
#[derive(Debug, Clone)]
pub struct RewriteBodyLayer {
    rewriter: RewriteBody,
}

impl RewriteBodyLayer {
    /// Compiles `config` into a layer for the middleware instance `name`.
    ///
    /// Fails if any filter pattern is not a valid regular expression, so a
    /// misconfigured middleware is never installed.
    pub fn new(config: &Config, name: impl Into<String>) -> Result<Self, CompileError> {
        RewriteBody::new(config, name).map(Self::from)
    }

    /// Returns the rewriter shared by every wrapped service.
    pub fn rewriter(&self) -> &RewriteBody {
        &self.rewriter
    }
}

impl From<RewriteBody> for RewriteBodyLayer {
    fn from(rewriter: RewriteBody) -> Self {
        Self { rewriter }
    }
}

impl<S> Layer<S> for RewriteBodyLayer {
    type Service = RewriteBodyService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RewriteBodyService::new(inner, self.rewriter.clone())
    }
}

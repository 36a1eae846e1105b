use crate::body::RewrittenBody;
use crate::error::BoxError;
use crate::future::ResponseFuture;
use crate::rewrite::RewriteBody;
use http::{Request, Response};
use http_body::Body;
use std::task::{Context, Poll};
use tower::Service;

/// A Tower service that rewrites HTTP response bodies.
#[derive(Debug, Clone)]
pub struct RewriteBodyService<S> {
    inner: S,
    rewriter: RewriteBody,
}

impl<S> RewriteBodyService<S> {
    /// Creates a new rewrite service wrapping the given inner service.
    pub fn new(inner: S, rewriter: RewriteBody) -> Self {
        Self { inner, rewriter }
    }

    /// Returns the rewriter applied to every response.
    pub fn rewriter(&self) -> &RewriteBody {
        &self.rewriter
    }

    /// Returns a reference to the inner service.
    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Returns a mutable reference to the inner service.
    pub fn inner_mut(&mut self) -> &mut S {
        &mut self.inner
    }

    /// Consumes this service, returning the inner service.
    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S, ReqBody, ResBody> Service<Request<ReqBody>> for RewriteBodyService<S>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>>,
    S::Error: Into<BoxError>,
    ResBody: Body,
    ResBody::Error: Into<BoxError>,
{
    type Response = Response<RewrittenBody>;
    type Error = BoxError;
    type Future = ResponseFuture<S::Future, ResBody>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx).map_err(Into::into)
    }

    fn call(&mut self, req: Request<ReqBody>) -> Self::Future {
        let inner = self.inner.call(req);

        ResponseFuture::new(inner, self.rewriter.clone())
    }
}

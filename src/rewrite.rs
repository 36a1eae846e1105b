use crate::body::RewrittenBody;
use crate::capture::CapturedResponse;
use crate::codec::Codec;
use crate::config::Config;
use crate::error::{CompileError, RewriteError};
use crate::filter::FilterSet;
use crate::finalize::finalize;
use bytes::Bytes;
use http::{Response, header};
use std::borrow::Cow;
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// A compiled body rewriter.
///
/// Holds the filters and header policy of one middleware instance. Cloning is
/// cheap and clones share the compiled filters, so one instance can serve any
/// number of concurrent requests.
#[derive(Debug, Clone)]
pub struct RewriteBody {
    shared: Arc<Shared>,
}

#[derive(Debug)]
struct Shared {
    name: String,
    filters: FilterSet,
    retain_last_modified: bool,
}

impl RewriteBody {
    /// Compiles `config` into a rewriter named `name`.
    ///
    /// Fails on the first filter whose pattern is not a valid regular
    /// expression.
    pub fn new(config: &Config, name: impl Into<String>) -> Result<Self, CompileError> {
        let name = name.into();
        let filters = FilterSet::compile(&config.filters)?;

        debug!(
            middleware = %name,
            filters = filters.len(),
            retain_last_modified = config.last_modified,
            "compiled body rewrite filters"
        );

        Ok(Self {
            shared: Arc::new(Shared {
                name,
                filters,
                retain_last_modified: config.last_modified,
            }),
        })
    }

    /// The instance name given at construction.
    pub fn name(&self) -> &str {
        &self.shared.name
    }

    /// The compiled filters, in application order.
    pub fn filters(&self) -> &FilterSet {
        &self.shared.filters
    }

    /// Whether `Last-Modified` is kept on rewritten responses.
    pub fn retains_last_modified(&self) -> bool {
        self.shared.retain_last_modified
    }

    /// Rewrites a fully captured response.
    ///
    /// The body is decoded according to its `Content-Encoding`, run through
    /// every filter and encoded again. Bodies in an encoding other than
    /// identity or gzip are forwarded byte for byte. Stale headers are
    /// dropped in every case.
    pub fn rewrite(
        &self,
        captured: CapturedResponse,
    ) -> Result<Response<RewrittenBody>, RewriteError> {
        let retain_last_modified = self.retains_last_modified();
        let (parts, body, trailers) = captured.into_parts();
        let body = body.freeze();

        let Some(codec) = Codec::from_headers(&parts.headers) else {
            debug!(
                middleware = %self.name(),
                content_encoding = ?parts.headers.get(header::CONTENT_ENCODING),
                "unsupported content encoding, forwarding body unchanged"
            );
            return Ok(finalize(parts, body, trailers, retain_last_modified));
        };

        if body.is_empty() {
            trace!(middleware = %self.name(), "empty response body, nothing to rewrite");
            return Ok(finalize(parts, body, trailers, retain_last_modified));
        }

        let text = codec.decode(&body).inspect_err(|err| {
            warn!(middleware = %self.name(), error = %err, "cannot decode response body");
        })?;

        let body = match self.filters().apply(&text) {
            // Nothing matched, the captured bytes are already correct.
            Cow::Borrowed(_) => {
                trace!(
                    middleware = %self.name(),
                    codec = codec.content_encoding(),
                    "no filter matched"
                );
                body.clone()
            }
            rewritten => {
                trace!(
                    middleware = %self.name(),
                    codec = codec.content_encoding(),
                    len = rewritten.len(),
                    "rewrote response body"
                );
                Bytes::from(codec.encode(rewritten)?.into_owned())
            }
        };

        Ok(finalize(parts, body, trailers, retain_last_modified))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::ResponseWriter;
    use http::{HeaderValue, StatusCode};
    use http_body_util::BodyExt;

    const LAST_MODIFIED: &str = "Thu, 02 Jun 2016 06:01:08 GMT";

    fn captured(content_encoding: &'static str, body: &[u8]) -> CapturedResponse {
        let mut captured = CapturedResponse::new();
        let headers = captured.headers_mut();
        headers.insert(
            header::CONTENT_ENCODING,
            HeaderValue::from_static(content_encoding),
        );
        headers.insert(header::LAST_MODIFIED, HeaderValue::from_static(LAST_MODIFIED));
        headers.insert(header::CONTENT_LENGTH, HeaderValue::from(body.len()));
        captured.write(body);
        captured
    }

    async fn body_of(response: Response<RewrittenBody>) -> Bytes {
        response.into_body().collect().await.unwrap().to_bytes()
    }

    #[test]
    fn test_invalid_filter_fails_construction() {
        let config = Config::new().filter("foo", "bar").filter("*", "bar");
        let err = RewriteBody::new(&config, "subfilter").unwrap_err();
        assert_eq!(err.pattern, "*");
    }

    #[test]
    fn test_clones_share_filters() {
        let config = Config::new().filter("foo", "bar").filter("bar", "foo");
        let rewriter = RewriteBody::new(&config, "subfilter").unwrap();
        let clone = rewriter.clone();

        assert!(Arc::ptr_eq(&rewriter.shared, &clone.shared));
        assert_eq!(clone.name(), "subfilter");
        assert_eq!(clone.filters().len(), 2);
        assert!(!clone.retains_last_modified());
    }

    #[tokio::test]
    async fn test_rewrite_identity() {
        let rewriter = RewriteBody::new(&Config::new().filter("foo", "bar"), "test").unwrap();
        let response = rewriter
            .rewrite(captured("", b"foo is the new bar"))
            .unwrap();

        assert!(response.headers().get(header::CONTENT_LENGTH).is_none());
        assert!(response.headers().get(header::LAST_MODIFIED).is_none());
        assert_eq!(body_of(response).await, "bar is the new bar");
    }

    #[tokio::test]
    async fn test_rewrite_keeps_status() {
        let rewriter = RewriteBody::new(&Config::new().filter("foo", "bar"), "test").unwrap();
        let mut response = captured("identity", b"foo");
        response.set_status(StatusCode::IM_A_TEAPOT);

        let response = rewriter.rewrite(response).unwrap();
        assert_eq!(response.status(), StatusCode::IM_A_TEAPOT);
        assert_eq!(body_of(response).await, "bar");
    }

    #[tokio::test]
    async fn test_unsupported_encoding_headers_still_fixed() {
        let config = Config::new().filter("foo", "bar").last_modified(true);
        let rewriter = RewriteBody::new(&config, "test").unwrap();
        let response = rewriter
            .rewrite(captured("br", b"foo is the new bar"))
            .unwrap();

        assert!(response.headers().get(header::CONTENT_LENGTH).is_none());
        assert_eq!(response.headers()[header::LAST_MODIFIED], LAST_MODIFIED);
        assert_eq!(response.headers()[header::CONTENT_ENCODING], "br");
        assert_eq!(body_of(response).await, "foo is the new bar");
    }

    #[tokio::test]
    async fn test_gzip_without_match_forwards_original_bytes() {
        let original = Codec::Gzip
            .encode(Cow::Borrowed(&b"nothing to see"[..]))
            .unwrap()
            .into_owned();
        let rewriter = RewriteBody::new(&Config::new().filter("foo", "bar"), "test").unwrap();

        let response = rewriter.rewrite(captured("gzip", &original)).unwrap();
        assert_eq!(body_of(response).await, original);
    }

    #[tokio::test]
    async fn test_empty_body_is_not_rewritten() {
        let rewriter = RewriteBody::new(&Config::new().filter("^", "prefix"), "test").unwrap();

        for content_encoding in ["gzip", "identity", ""] {
            let response = rewriter.rewrite(captured(content_encoding, b"")).unwrap();
            assert!(response.headers().get(header::CONTENT_LENGTH).is_none());
            assert!(response.headers().get(header::LAST_MODIFIED).is_none());
            assert!(body_of(response).await.is_empty());
        }
    }

    #[test]
    fn test_corrupt_gzip_fails_request() {
        let rewriter = RewriteBody::new(&Config::new().filter("foo", "bar"), "test").unwrap();
        let err = rewriter
            .rewrite(captured("gzip", b"foo is the new bar"))
            .unwrap_err();
        assert!(matches!(err, RewriteError::Decode(_)));
    }
}

use crate::body::RewrittenBody;
use bytes::Bytes;
use http::Response;
use http::header::{self, HeaderMap};
use http::response::Parts;

/// Drops the headers a rewrite invalidates.
///
/// `Content-Length` is always removed so the transport frames the new body.
/// `Last-Modified` is removed unless `retain_last_modified` is set.
pub(crate) fn strip_stale_headers(headers: &mut HeaderMap, retain_last_modified: bool) {
    headers.remove(header::CONTENT_LENGTH);

    if !retain_last_modified {
        headers.remove(header::LAST_MODIFIED);
    }
}

/// Builds the client-facing response from the captured head and the final body.
///
/// Status, version, extensions, trailers and every other header pass through
/// untouched.
pub(crate) fn finalize(
    mut parts: Parts,
    body: Bytes,
    trailers: Option<HeaderMap>,
    retain_last_modified: bool,
) -> Response<RewrittenBody> {
    strip_stale_headers(&mut parts.headers, retain_last_modified);
    Response::from_parts(parts, RewrittenBody::new(body, trailers))
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::{HeaderValue, StatusCode};
    use http_body_util::BodyExt;

    fn parts() -> Parts {
        let response = Response::builder()
            .status(StatusCode::NOT_FOUND)
            .header(header::CONTENT_LENGTH, "18")
            .header(header::LAST_MODIFIED, "Thu, 02 Jun 2016 06:01:08 GMT")
            .header(header::CONTENT_ENCODING, "gzip")
            .header(header::SET_COOKIE, "a=1")
            .header(header::SET_COOKIE, "b=2")
            .body(())
            .unwrap();
        response.into_parts().0
    }

    #[test]
    fn test_strip_content_length_and_last_modified() {
        let mut headers = parts().headers;
        strip_stale_headers(&mut headers, false);

        assert!(headers.get(header::CONTENT_LENGTH).is_none());
        assert!(headers.get(header::LAST_MODIFIED).is_none());
        assert_eq!(headers[header::CONTENT_ENCODING], "gzip");
    }

    #[test]
    fn test_retain_last_modified() {
        let mut headers = parts().headers;
        strip_stale_headers(&mut headers, true);

        assert!(headers.get(header::CONTENT_LENGTH).is_none());
        assert_eq!(
            headers[header::LAST_MODIFIED],
            HeaderValue::from_static("Thu, 02 Jun 2016 06:01:08 GMT")
        );
    }

    #[tokio::test]
    async fn test_finalize_keeps_head() {
        let response = finalize(parts(), Bytes::from_static(b"rewritten"), None, false);

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let cookies: Vec<_> = response
            .headers()
            .get_all(header::SET_COOKIE)
            .iter()
            .map(|v| v.to_str().unwrap())
            .collect();
        assert_eq!(cookies, vec!["a=1", "b=2"]);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(body, Bytes::from_static(b"rewritten"));
    }
}

use crate::error::{BoxError, RewriteError};
use bytes::{Buf, BytesMut};
use http::response::Parts;
use http::{HeaderMap, Response, StatusCode};
use http_body::Body;
use std::pin::Pin;
use std::task::{Context, Poll};

/// The calls a handler makes to produce a response.
///
/// Calls may come in any order and `write` may be called any number of times.
pub trait ResponseWriter {
    /// Records the status code.
    fn set_status(&mut self, status: StatusCode);

    /// Mutable access to the response headers.
    fn headers_mut(&mut self) -> &mut HeaderMap;

    /// Appends a chunk to the body.
    fn write(&mut self, chunk: &[u8]);
}

/// A downstream response held entirely in memory.
///
/// Nothing recorded here reaches the client until the response has been
/// finalized.
#[derive(Debug)]
pub struct CapturedResponse {
    parts: Parts,
    body: BytesMut,
    trailers: Option<HeaderMap>,
}

impl CapturedResponse {
    /// Creates an empty `200 OK` response with no headers.
    pub fn new() -> Self {
        let (parts, ()) = Response::new(()).into_parts();
        Self::from_parts(parts)
    }

    /// Starts capturing a response whose head is already known.
    pub fn from_parts(parts: Parts) -> Self {
        Self {
            parts,
            body: BytesMut::new(),
            trailers: None,
        }
    }

    /// Buffers a whole response, draining every frame of its body.
    #[cfg(test)]
    pub(crate) async fn capture<B>(response: Response<B>) -> Result<Self, RewriteError>
    where
        B: Body,
        B::Error: Into<BoxError>,
    {
        let (parts, body) = response.into_parts();
        let mut captured = Self::from_parts(parts);
        let mut body = std::pin::pin!(body);

        std::future::poll_fn(|cx| captured.poll_capture(cx, body.as_mut())).await?;
        Ok(captured)
    }

    /// Pulls frames from `body` until it ends.
    ///
    /// Data frames are appended to the buffer and trailer frames are merged.
    /// Returns `Ready(Ok(()))` once the body is exhausted.
    pub fn poll_capture<B>(
        &mut self,
        cx: &mut Context<'_>,
        mut body: Pin<&mut B>,
    ) -> Poll<Result<(), RewriteError>>
    where
        B: Body,
        B::Error: Into<BoxError>,
    {
        loop {
            let frame = match body.as_mut().poll_frame(cx) {
                Poll::Pending => return Poll::Pending,
                Poll::Ready(None) => return Poll::Ready(Ok(())),
                Poll::Ready(Some(Err(e))) => {
                    return Poll::Ready(Err(RewriteError::Body(e.into())));
                }
                Poll::Ready(Some(Ok(frame))) => frame,
            };

            match frame.into_data() {
                Ok(mut data) => {
                    while data.has_remaining() {
                        let chunk = data.chunk();
                        let len = chunk.len();
                        self.write(chunk);
                        data.advance(len);
                    }
                }
                Err(frame) => {
                    if let Ok(trailers) = frame.into_trailers() {
                        self.trailers
                            .get_or_insert_with(HeaderMap::new)
                            .extend(trailers);
                    }
                }
            }
        }
    }

    /// The recorded status code.
    pub fn status(&self) -> StatusCode {
        self.parts.status
    }

    /// The recorded headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.parts.headers
    }

    /// The body bytes exactly as the handler wrote them.
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Trailers sent after the body, if any.
    pub fn trailers(&self) -> Option<&HeaderMap> {
        self.trailers.as_ref()
    }

    pub(crate) fn into_parts(self) -> (Parts, BytesMut, Option<HeaderMap>) {
        (self.parts, self.body, self.trailers)
    }
}

impl Default for CapturedResponse {
    fn default() -> Self {
        Self::new()
    }
}

impl ResponseWriter for CapturedResponse {
    fn set_status(&mut self, status: StatusCode) {
        self.parts.status = status;
    }

    fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.parts.headers
    }

    fn write(&mut self, chunk: &[u8]) {
        self.body.extend_from_slice(chunk);
    }
}

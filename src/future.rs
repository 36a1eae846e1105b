use crate::body::RewrittenBody;
use crate::capture::CapturedResponse;
use crate::error::BoxError;
use crate::rewrite::RewriteBody;
use http::Response;
use http_body::Body;
use pin_project_lite::pin_project;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll, ready};

pin_project! {
    /// Future for body rewrite service responses.
    ///
    /// Waits for the inner service, buffers its whole body, then rewrites it.
    pub struct ResponseFuture<F, B> {
        #[pin]
        state: State<F, B>,
        rewriter: RewriteBody,
    }
}

pin_project! {
    #[project = StateProj]
    enum State<F, B> {
        /// Waiting for the inner service to produce a response head.
        Inner {
            #[pin]
            future: F,
        },
        /// Draining the downstream body into memory.
        Capturing {
            #[pin]
            body: B,
            captured: CapturedResponse,
        },
        /// The rewritten response has been returned.
        Done,
    }
}

impl<F, B> ResponseFuture<F, B> {
    pub(crate) fn new(future: F, rewriter: RewriteBody) -> Self {
        Self {
            state: State::Inner { future },
            rewriter,
        }
    }
}

impl<F, B, E> Future for ResponseFuture<F, B>
where
    F: Future<Output = Result<Response<B>, E>>,
    E: Into<BoxError>,
    B: Body,
    B::Error: Into<BoxError>,
{
    type Output = Result<Response<RewrittenBody>, BoxError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        loop {
            let mut this = self.as_mut().project();

            match this.state.as_mut().project() {
                StateProj::Inner { future } => {
                    let response = ready!(future.poll(cx)).map_err(Into::<BoxError>::into)?;
                    let (parts, body) = response.into_parts();
                    this.state.set(State::Capturing {
                        body,
                        captured: CapturedResponse::from_parts(parts),
                    });
                }
                StateProj::Capturing { body, captured } => {
                    let result = ready!(captured.poll_capture(cx, body));
                    let captured = std::mem::take(captured);
                    this.state.set(State::Done);

                    if let Err(err) = result {
                        return Poll::Ready(Err(err.into()));
                    }
                    return Poll::Ready(this.rewriter.rewrite(captured).map_err(Into::into));
                }
                StateProj::Done => panic!("ResponseFuture polled after completion"),
            }
        }
    }
}

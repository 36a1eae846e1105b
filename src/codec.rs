use crate::error::RewriteError;
use compression_codecs::{DecodeV2, EncodeV2, gzip::GzipDecoder, gzip::GzipEncoder};
use compression_core::Level;
use compression_core::util::{PartialBuffer, WriteBuffer};
use http::header::{self, HeaderMap};
use std::borrow::Cow;
use std::io;

const OUTPUT_BUFFER_SIZE: usize = 8 * 1024; // 8KB output buffer

/// Content encodings the middleware knows how to rewrite.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Codec {
    /// No compression, the body is plain text.
    Identity,
    /// Gzip compression.
    Gzip,
}

impl Codec {
    /// Returns the canonical Content-Encoding value for this codec.
    pub fn content_encoding(&self) -> &'static str {
        match self {
            Codec::Identity => "identity",
            Codec::Gzip => "gzip",
        }
    }

    /// Picks the codec for a response from its `Content-Encoding` header.
    ///
    /// A missing or empty header means identity. Returns `None` for any other
    /// encoding, including stacked encodings such as `gzip, br`; such bodies
    /// are not rewritable.
    pub fn from_headers(headers: &HeaderMap) -> Option<Codec> {
        let mut values = headers.get_all(header::CONTENT_ENCODING).iter();

        let Some(value) = values.next() else {
            return Some(Codec::Identity);
        };
        if values.next().is_some() {
            return None;
        }

        Codec::from_content_encoding(value.to_str().ok()?)
    }

    /// Parses a single `Content-Encoding` value.
    pub fn from_content_encoding(value: &str) -> Option<Codec> {
        let value = value.trim();
        if value.is_empty() || value.eq_ignore_ascii_case("identity") {
            Some(Codec::Identity)
        } else if value.eq_ignore_ascii_case("gzip") {
            Some(Codec::Gzip)
        } else {
            None
        }
    }

    /// Turns the captured body into plain text.
    ///
    /// An empty gzip body decodes to an empty text; anything else that is not
    /// a complete gzip stream is an error.
    pub fn decode<'a>(&self, body: &'a [u8]) -> Result<Cow<'a, [u8]>, RewriteError> {
        match self {
            Codec::Identity => Ok(Cow::Borrowed(body)),
            Codec::Gzip if body.is_empty() => Ok(Cow::Borrowed(body)),
            Codec::Gzip => gunzip(body).map(Cow::Owned).map_err(RewriteError::Decode),
        }
    }

    /// Re-applies this codec to rewritten text.
    pub fn encode<'a>(&self, text: Cow<'a, [u8]>) -> Result<Cow<'a, [u8]>, RewriteError> {
        match self {
            Codec::Identity => Ok(text),
            Codec::Gzip => gzip(&text).map(Cow::Owned).map_err(RewriteError::Encode),
        }
    }
}

/// Decompresses a complete gzip stream, including concatenated members.
fn gunzip(input: &[u8]) -> io::Result<Vec<u8>> {
    let mut decoder = GzipDecoder::new();
    let mut chunk = vec![0u8; OUTPUT_BUFFER_SIZE];
    let mut decoded = Vec::with_capacity(input.len() * 2);
    let mut input_buf = PartialBuffer::new(input);
    let mut done;

    loop {
        let mut output = WriteBuffer::new_initialized(chunk.as_mut_slice());
        done = decoder.decode(&mut input_buf, &mut output)?;
        let written = output.written_len();
        decoded.extend_from_slice(&chunk[..written]);

        let exhausted = input_buf.written_len() >= input.len();
        if done {
            if exhausted {
                break;
            }
            // Another gzip member follows.
            decoder.reinit()?;
        } else if exhausted && written == 0 {
            break;
        }
    }

    if !done {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "gzip stream ended before its trailer",
        ));
    }

    Ok(decoded)
}

/// Compresses `input` into a single gzip member.
fn gzip(input: &[u8]) -> io::Result<Vec<u8>> {
    let mut encoder = GzipEncoder::new(Level::Default.into());
    let mut chunk = vec![0u8; OUTPUT_BUFFER_SIZE];
    let mut encoded = Vec::with_capacity(input.len() / 2);
    let mut input_buf = PartialBuffer::new(input);

    while input_buf.written_len() < input.len() {
        let mut output = WriteBuffer::new_initialized(chunk.as_mut_slice());
        encoder.encode(&mut input_buf, &mut output)?;
        let written = output.written_len();
        encoded.extend_from_slice(&chunk[..written]);
    }

    loop {
        let mut output = WriteBuffer::new_initialized(chunk.as_mut_slice());
        let done = encoder.finish(&mut output)?;
        let written = output.written_len();
        encoded.extend_from_slice(&chunk[..written]);
        if done {
            break;
        }
    }

    Ok(encoded)
}

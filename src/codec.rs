//! Inbound line framing
//!
//! Splits the byte stream on `\n` without requiring UTF-8. Invalid bytes
//! are replaced rather than rejected, and an over-long line is reported
//! as an item so the stream keeps going.

use std::io;

use bytes::{Bytes, BytesMut};
use tokio_util::codec::{AnyDelimiterCodec, AnyDelimiterCodecError, Decoder};

/// One framed line of client input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundLine {
    /// Line text with the terminator and any trailing `\r` removed
    Text(String),
    /// Line exceeded the length limit; its bytes were discarded
    TooLong,
}

#[derive(Debug)]
pub struct LineDecoder {
    inner: AnyDelimiterCodec,
}

impl LineDecoder {
    pub fn new(max_length: usize) -> Self {
        Self {
            inner: AnyDelimiterCodec::new_with_max_length(
                b"\n".to_vec(),
                b"\n".to_vec(),
                max_length,
            ),
        }
    }

    fn map(
        result: Result<Option<Bytes>, AnyDelimiterCodecError>,
    ) -> io::Result<Option<InboundLine>> {
        match result {
            Ok(Some(chunk)) => Ok(Some(InboundLine::Text(to_text(&chunk)))),
            Ok(None) => Ok(None),
            // The inner codec skips ahead to the next delimiter on its own
            Err(AnyDelimiterCodecError::MaxChunkLengthExceeded) => Ok(Some(InboundLine::TooLong)),
            Err(AnyDelimiterCodecError::Io(e)) => Err(e),
        }
    }
}

impl Decoder for LineDecoder {
    type Item = InboundLine;
    type Error = io::Error;

    fn decode(&mut self, buf: &mut BytesMut) -> io::Result<Option<InboundLine>> {
        Self::map(self.inner.decode(buf))
    }

    fn decode_eof(&mut self, buf: &mut BytesMut) -> io::Result<Option<InboundLine>> {
        Self::map(self.inner.decode_eof(buf))
    }
}

fn to_text(chunk: &[u8]) -> String {
    let chunk = chunk.strip_suffix(b"\r").unwrap_or(chunk);
    String::from_utf8_lossy(chunk).into_owned()
}

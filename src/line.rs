//! Line-based codec for tokio.
//!
//! This module provides the framing layer: reassembling raw byte chunks
//! into complete protocol lines on decode, and terminating outbound lines
//! on encode.

use bytes::{BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::error;

/// Maximum outbound line length in bytes, excluding the CRLF terminator
/// (RFC 1459).
pub const MAX_LINE_LEN: usize = 510;

/// Codec for CRLF-terminated protocol lines.
///
/// Decoding follows the wire contract of the listener this client talks to:
/// a line is complete only when terminated by CRLF. A segment ending in a
/// bare LF is not emitted; its content (minus the LF) is carried over and
/// concatenated with the next segment, so partial reads of any shape
/// reassemble transparently. Inbound lines have no length cap; the cap
/// applies to encoding only.
#[derive(Default)]
pub struct LineCodec {
    /// Partial line carried across reads.
    carry: BytesMut,
    /// Index of next byte to check for a line feed.
    next_index: usize,
}

impl LineCodec {
    /// Create a new codec with an empty carry-over buffer.
    pub fn new() -> Self {
        Self::default()
    }
}

impl Decoder for LineCodec {
    type Item = String;
    type Error = error::ProtocolError;

    fn decode(&mut self, src: &mut BytesMut) -> error::Result<Option<String>> {
        while let Some(offset) = src[self.next_index..].iter().position(|b| *b == b'\n') {
            let segment = src.split_to(self.next_index + offset + 1);
            self.next_index = 0;

            let ends_with_cr = segment.len() >= 2 && segment[segment.len() - 2] == b'\r';
            if ends_with_cr {
                self.carry.extend_from_slice(&segment[..segment.len() - 2]);
                let line = String::from_utf8(self.carry.split().to_vec())?;
                return Ok(Some(line.trim().to_owned()));
            }

            // Bare LF: keep the segment (minus the LF) buffered until a
            // CRLF-terminated segment completes the line.
            self.carry.extend_from_slice(&segment[..segment.len() - 1]);
        }

        self.next_index = src.len();
        Ok(None)
    }
}

impl Encoder<String> for LineCodec {
    type Error = error::ProtocolError;

    fn encode(&mut self, line: String, dst: &mut BytesMut) -> error::Result<()> {
        if line.len() > MAX_LINE_LEN {
            return Err(error::ProtocolError::LineTooLong {
                actual: line.len(),
                limit: MAX_LINE_LEN,
            });
        }

        dst.reserve(line.len() + 2);
        dst.put_slice(line.as_bytes());
        dst.put_slice(b"\r\n");
        Ok(())
    }
}

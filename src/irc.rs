//! IRC message codec for tokio.
//!
//! Wraps [`LineCodec`] and parses complete lines into [`Message`] values.

use bytes::BytesMut;
use tokio_util::codec::{Decoder, Encoder};
use tracing::trace;

use crate::error;
use crate::line::LineCodec;
use crate::message::Message;

/// Tokio codec for decoding framed lines into IRC [`Message`] values.
#[derive(Default)]
pub struct IrcCodec {
    inner: LineCodec,
}

impl IrcCodec {
    /// Create a new codec.
    pub fn new() -> Self {
        Self::default()
    }
}

impl Decoder for IrcCodec {
    type Item = Message;
    type Error = error::ProtocolError;

    fn decode(&mut self, src: &mut BytesMut) -> error::Result<Option<Message>> {
        // Empty lines are dropped here, before dispatch ever sees them.
        while let Some(line) = self.inner.decode(src)? {
            if line.is_empty() {
                continue;
            }
            trace!(target: "slirc_client::wire", "<- {}", line);
            return line.parse::<Message>().map(Some);
        }
        Ok(None)
    }
}

impl Encoder<Message> for IrcCodec {
    type Error = error::ProtocolError;

    fn encode(&mut self, msg: Message, dst: &mut BytesMut) -> error::Result<()> {
        self.inner.encode(msg.to_string(), dst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::Command;

    #[test]
    fn test_decode_parses_message() {
        let mut codec = IrcCodec::new();
        let mut buf = BytesMut::from("PING :server123\r\n");

        let msg = codec.decode(&mut buf).unwrap().unwrap();
        assert_eq!(msg.command, Command::PING("server123".into(), None));
    }

    #[test]
    fn test_decode_skips_empty_lines() {
        let mut codec = IrcCodec::new();
        let mut buf = BytesMut::from("\r\n  \r\nPING :x\r\n");

        let msg = codec.decode(&mut buf).unwrap().unwrap();
        assert_eq!(msg.command, Command::PING("x".into(), None));
        assert_eq!(codec.decode(&mut buf).unwrap(), None);
    }

    #[test]
    fn test_decode_surfaces_malformed_line() {
        let mut codec = IrcCodec::new();
        let mut buf = BytesMut::from(":prefix-only\r\n");

        let err = codec.decode(&mut buf).unwrap_err();
        assert!(err.is_malformed_line());
    }

    #[test]
    fn test_encode_terminates_message() {
        let mut codec = IrcCodec::new();
        let mut buf = BytesMut::new();

        codec
            .encode(Command::PONG("test".into(), None).into(), &mut buf)
            .unwrap();
        assert_eq!(&buf[..], b"PONG :test\r\n");
    }
}

//! Line-feed framing for the chat wire protocol.
//!
//! Reads are single UTF-8 lines terminated by `\n`; the terminator is
//! stripped before delivery. Writes depend on the frame kind: handshake
//! lines end with one feed, application messages with two (the blank line
//! is the explicit end-of-message marker, so an empty keep-alive stays
//! distinguishable from nothing at all).

use bytes::{Buf, BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::error::ChatError;
use crate::message::Outbound;

/// Longest line the decoder will buffer while waiting for a terminator.
pub const MAX_LINE_LENGTH: usize = 64 * 1024;

/// Codec for the chat server's line-oriented protocol.
#[derive(Debug, Default)]
pub struct LineCodec;

impl Decoder for LineCodec {
    type Item = String;
    type Error = ChatError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match src.iter().position(|&b| b == b'\n') {
            Some(pos) => {
                let line = src.split_to(pos);
                src.advance(1);
                Ok(Some(String::from_utf8(line.to_vec())?))
            }
            None if src.len() > MAX_LINE_LENGTH => Err(ChatError::LineTooLong {
                len: src.len(),
                max: MAX_LINE_LENGTH,
            }),
            None => Ok(None),
        }
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if let Some(line) = self.decode(src)? {
            return Ok(Some(line));
        }
        if src.is_empty() {
            // Clean end-of-stream, not an error.
            return Ok(None);
        }
        // The terminator never arrived; deliver the tail as-is.
        let rest = src.split();
        Ok(Some(String::from_utf8(rest.to_vec())?))
    }
}

impl Encoder<Outbound> for LineCodec {
    type Error = ChatError;

    fn encode(&mut self, item: Outbound, dst: &mut BytesMut) -> Result<(), Self::Error> {
        match item {
            Outbound::Line(text) => {
                dst.extend_from_slice(text.as_bytes());
                dst.put_u8(b'\n');
            }
            Outbound::Message(text) => {
                dst.extend_from_slice(text.as_bytes());
                dst.extend_from_slice(b"\n\n");
            }
            Outbound::KeepAlive => {
                dst.extend_from_slice(b"\n\n");
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode_all(codec: &mut LineCodec, buf: &mut BytesMut) -> Vec<String> {
        let mut out = Vec::new();
        while let Some(line) = codec.decode(buf).unwrap() {
            out.push(line);
        }
        out
    }

    #[test]
    fn decodes_single_line_and_strips_terminator() {
        let mut codec = LineCodec;
        let mut buf = BytesMut::from(&b"hello\n"[..]);
        assert_eq!(codec.decode(&mut buf).unwrap(), Some("hello".to_string()));
        assert!(buf.is_empty());
    }

    #[test]
    fn buffers_partial_line() {
        let mut codec = LineCodec;
        let mut buf = BytesMut::from(&b"hel"[..]);
        assert_eq!(codec.decode(&mut buf).unwrap(), None);

        buf.extend_from_slice(b"lo\nbye\n");
        assert_eq!(decode_all(&mut codec, &mut buf), vec!["hello", "bye"]);
    }

    #[test]
    fn empty_line_is_a_frame() {
        let mut codec = LineCodec;
        let mut buf = BytesMut::from(&b"\n"[..]);
        assert_eq!(codec.decode(&mut buf).unwrap(), Some(String::new()));
    }

    #[test]
    fn rejects_oversized_unterminated_line() {
        let mut codec = LineCodec;
        let mut buf = BytesMut::from(vec![b'a'; MAX_LINE_LENGTH + 1].as_slice());
        assert!(matches!(
            codec.decode(&mut buf),
            Err(ChatError::LineTooLong { .. })
        ));
    }

    #[test]
    fn rejects_invalid_utf8() {
        let mut codec = LineCodec;
        let mut buf = BytesMut::from(&[0xff, 0xfe, b'\n'][..]);
        assert!(matches!(
            codec.decode(&mut buf),
            Err(ChatError::InvalidUtf8(_))
        ));
    }

    #[test]
    fn eof_flushes_unterminated_tail() {
        let mut codec = LineCodec;
        let mut buf = BytesMut::from(&b"trailing"[..]);
        assert_eq!(
            codec.decode_eof(&mut buf).unwrap(),
            Some("trailing".to_string())
        );
        assert_eq!(codec.decode_eof(&mut buf).unwrap(), None);
    }

    #[test]
    fn encodes_handshake_line() {
        let mut codec = LineCodec;
        let mut buf = BytesMut::new();
        codec
            .encode(Outbound::Line("token-abc".to_string()), &mut buf)
            .unwrap();
        assert_eq!(&buf[..], b"token-abc\n");
    }

    #[test]
    fn encodes_message_with_blank_line_marker() {
        let mut codec = LineCodec;
        let mut buf = BytesMut::new();
        codec
            .encode(Outbound::Message("hi there".to_string()), &mut buf)
            .unwrap();
        assert_eq!(&buf[..], b"hi there\n\n");
    }

    #[test]
    fn encodes_keepalive_as_bare_marker() {
        let mut codec = LineCodec;
        let mut buf = BytesMut::new();
        codec.encode(Outbound::KeepAlive, &mut buf).unwrap();
        assert_eq!(&buf[..], b"\n\n");
    }
}

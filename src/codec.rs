//! Wire codec
//!
//! One frame on the wire is a big-endian u16 byte-length prefix followed by
//! that many UTF-8 bytes. A logical message is a payload frame immediately
//! followed by an empty terminator frame; the encoder writes both into the
//! same buffer so they flush as one unit and a decoder never observes a
//! partial message. The decoder yields frames one at a time - an empty frame
//! is the terminator, which the command interpreter classifies as `Ignore`.

use bytes::{Buf, BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::error::AppError;

/// Largest payload the u16 length prefix can carry
pub const MAX_FRAME_LEN: usize = u16::MAX as usize;

/// Codec for the length-prefixed UTF-8 text frames of the chat protocol
#[derive(Debug, Default, Clone, Copy)]
pub struct FrameCodec;

impl Decoder for FrameCodec {
    type Item = String;
    type Error = AppError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<String>, AppError> {
        if src.len() < 2 {
            src.reserve(2 - src.len());
            return Ok(None);
        }

        let len = u16::from_be_bytes([src[0], src[1]]) as usize;
        if src.len() < 2 + len {
            src.reserve(2 + len - src.len());
            return Ok(None);
        }

        src.advance(2);
        let payload = src.split_to(len);
        Ok(Some(String::from_utf8(payload.to_vec())?))
    }
}

impl Encoder<&str> for FrameCodec {
    type Error = AppError;

    /// Encode one logical message: payload frame plus empty terminator frame
    fn encode(&mut self, item: &str, dst: &mut BytesMut) -> Result<(), AppError> {
        let len = item.len();
        if len > MAX_FRAME_LEN {
            return Err(AppError::FrameTooLong(len));
        }

        dst.reserve(2 + len + 2);
        dst.put_u16(len as u16);
        dst.put_slice(item.as_bytes());
        // terminator frame: zero-length payload
        dst.put_u16(0);
        Ok(())
    }
}

impl Encoder<String> for FrameCodec {
    type Error = AppError;

    fn encode(&mut self, item: String, dst: &mut BytesMut) -> Result<(), AppError> {
        self.encode(item.as_str(), dst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_appends_terminator_frame() {
        let mut codec = FrameCodec;
        let mut buf = BytesMut::new();
        codec.encode("hi", &mut buf).unwrap();

        assert_eq!(&buf[..], &[0, 2, b'h', b'i', 0, 0]);
    }

    #[test]
    fn test_decode_yields_payload_then_terminator() {
        let mut codec = FrameCodec;
        let mut buf = BytesMut::new();
        codec.encode("hello", &mut buf).unwrap();

        assert_eq!(codec.decode(&mut buf).unwrap(), Some("hello".to_string()));
        assert_eq!(codec.decode(&mut buf).unwrap(), Some(String::new()));
        assert_eq!(codec.decode(&mut buf).unwrap(), None);
    }

    #[test]
    fn test_decode_waits_for_full_frame() {
        let mut codec = FrameCodec;
        let mut buf = BytesMut::new();

        // length prefix split across reads
        buf.put_u8(0);
        assert_eq!(codec.decode(&mut buf).unwrap(), None);
        buf.put_u8(5);
        assert_eq!(codec.decode(&mut buf).unwrap(), None);

        buf.put_slice(b"hel");
        assert_eq!(codec.decode(&mut buf).unwrap(), None);
        buf.put_slice(b"lo");
        assert_eq!(codec.decode(&mut buf).unwrap(), Some("hello".to_string()));
    }

    #[test]
    fn test_multibyte_payload_round_trip() {
        let mut codec = FrameCodec;
        let mut buf = BytesMut::new();
        codec.encode("héllo wörld ✓", &mut buf).unwrap();

        assert_eq!(
            codec.decode(&mut buf).unwrap(),
            Some("héllo wörld ✓".to_string())
        );
    }

    #[test]
    fn test_oversized_payload_rejected() {
        let mut codec = FrameCodec;
        let mut buf = BytesMut::new();
        let big = "x".repeat(MAX_FRAME_LEN + 1);

        match codec.encode(big.as_str(), &mut buf) {
            Err(AppError::FrameTooLong(n)) => assert_eq!(n, MAX_FRAME_LEN + 1),
            other => panic!("expected FrameTooLong, got {:?}", other),
        }
        assert!(buf.is_empty());
    }

    #[test]
    fn test_invalid_utf8_rejected() {
        let mut codec = FrameCodec;
        let mut buf = BytesMut::new();
        buf.put_u16(2);
        buf.put_slice(&[0xff, 0xfe]);

        assert!(matches!(
            codec.decode(&mut buf),
            Err(AppError::InvalidUtf8(_))
        ));
    }
}

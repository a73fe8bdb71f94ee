//! Length-prefixed record framing shared by both channels.
//!
//! ## Wire format
//!
//! ```text
//! length:  u32  (4 bytes, big-endian)
//! payload: [u8] (exactly `length` bytes)
//! ```
//!
//! The frame channel (server → client) carries JPEG bytes in each
//! record; the command channel (client → server) carries one JSON
//! command per record. Framing the command channel is deliberate:
//! unframed command bytes can split or merge across TCP reads, so
//! every message here is self-delimiting.
//!
//! A record whose payload fails to parse is the *consumer's* problem
//! (logged and discarded); the codec only enforces boundaries and the
//! size ceiling.

use bytes::{Buf, BufMut, Bytes, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::error::CastError;

/// Size of the length prefix on the wire.
pub const LEN_PREFIX: usize = 4;

/// Upper bound on a single record's payload. Generous enough for an
/// uncompressed-quality JPEG of a large display.
pub const MAX_FRAME_SIZE: usize = 64 * 1024 * 1024;

/// Codec for `[u32 BE length][payload]` records.
#[derive(Debug, Default)]
pub struct FrameCodec;

impl Decoder for FrameCodec {
    type Item = Bytes;
    type Error = CastError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if src.len() < LEN_PREFIX {
            return Ok(None);
        }

        let mut len_bytes = [0u8; LEN_PREFIX];
        len_bytes.copy_from_slice(&src[..LEN_PREFIX]);
        let len = u32::from_be_bytes(len_bytes) as usize;

        if len > MAX_FRAME_SIZE {
            return Err(CastError::FrameTooLarge {
                size: len,
                max: MAX_FRAME_SIZE,
            });
        }

        if src.len() < LEN_PREFIX + len {
            // Partial record — reserve what we still expect and wait.
            src.reserve(LEN_PREFIX + len - src.len());
            return Ok(None);
        }

        src.advance(LEN_PREFIX);
        Ok(Some(src.split_to(len).freeze()))
    }
}

impl Encoder<Bytes> for FrameCodec {
    type Error = CastError;

    fn encode(&mut self, item: Bytes, dst: &mut BytesMut) -> Result<(), Self::Error> {
        if item.len() > MAX_FRAME_SIZE {
            return Err(CastError::FrameTooLarge {
                size: item.len(),
                max: MAX_FRAME_SIZE,
            });
        }

        dst.reserve(LEN_PREFIX + item.len());
        dst.put_u32(item.len() as u32);
        dst.extend_from_slice(&item);
        Ok(())
    }
}

// ── Tests ────────────────────────────────────────────────────────

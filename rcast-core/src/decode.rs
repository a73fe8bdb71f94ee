//! Frame decoding — JPEG payload back to raw RGB pixels.

use std::io::Cursor;

use image::{ImageDecoder, codecs::jpeg::JpegDecoder};

use crate::error::CastError;

/// A decoded frame as tightly-packed RGB, ready for display.
#[derive(Debug, Clone)]
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    /// `width * height * 3` bytes, RGB order.
    pub data: Vec<u8>,
}

/// Decodes JPEG frame payloads received from the stream channel.
///
/// A decode failure never tears the session down; the caller logs it
/// and waits for the next frame.
#[derive(Debug, Default)]
pub struct FrameDecoder;

impl FrameDecoder {
    pub fn new() -> Self {
        Self
    }

    /// Decode one JPEG payload.
    pub fn decode(&self, payload: &[u8]) -> Result<DecodedImage, CastError> {
        let decoder = JpegDecoder::new(Cursor::new(payload))
            .map_err(|e| CastError::Decode(e.to_string()))?;
        let (width, height) = decoder.dimensions();

        if decoder.color_type() != image::ColorType::Rgb8 {
            return Err(CastError::Decode(format!(
                "unexpected color type {:?}",
                decoder.color_type()
            )));
        }

        let mut data = vec![0u8; decoder.total_bytes() as usize];
        decoder
            .read_image(&mut data)
            .map_err(|e| CastError::Decode(e.to_string()))?;

        Ok(DecodedImage {
            width,
            height,
            data,
        })
    }
}

// ── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::RawFrame;
    use crate::encode::FrameEncoder;

    #[test]
    fn decodes_an_encoded_frame() {
        let rgb = vec![200u8; 32 * 16 * 3];
        let frame = RawFrame::packed_rgb(32, 16, rgb);
        let encoded = FrameEncoder::new(85, 1.0).encode(&frame).unwrap();

        let img = FrameDecoder::new().decode(&encoded.data).unwrap();
        assert_eq!((img.width, img.height), (32, 16));
        assert_eq!(img.data.len(), 32 * 16 * 3);
        // Flat grey survives JPEG nearly untouched.
        assert!(img.data.iter().all(|&c| (195..=205).contains(&c)));
    }

    #[test]
    fn garbage_payload_is_a_typed_error() {
        let err = FrameDecoder::new().decode(b"definitely not a jpeg").unwrap_err();
        assert!(matches!(err, CastError::Decode(_)));
    }

    #[test]
    fn truncated_jpeg_is_a_typed_error() {
        let rgb = vec![50u8; 64 * 64 * 3];
        let frame = RawFrame::packed_rgb(64, 64, rgb);
        let encoded = FrameEncoder::new(85, 1.0).encode(&frame).unwrap();

        let cut = &encoded.data[..encoded.data.len() / 2];
        assert!(FrameDecoder::new().decode(cut).is_err());
    }

    #[test]
    fn empty_payload_is_a_typed_error() {
        assert!(matches!(
            FrameDecoder::new().decode(b""),
            Err(CastError::Decode(_))
        ));
    }
}

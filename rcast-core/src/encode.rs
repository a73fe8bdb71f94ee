//! Frame encoding — uniform downscale followed by JPEG compression.

use std::io::Cursor;
use std::time::Instant;

use image::{ImageBuffer, Rgb, codecs::jpeg::JpegEncoder};

use crate::capture::{RawFrame, scale_rgb, scaled_size, to_opaque_rgb};
use crate::error::CastError;

/// A compressed frame ready for the wire.
#[derive(Debug, Clone)]
pub struct EncodedFrame {
    /// Monotonic sequence number, starting at 1.
    pub frame_number: u64,
    /// Width after the capture scale was applied.
    pub width: u32,
    /// Height after the capture scale was applied.
    pub height: u32,
    /// JPEG bytes.
    pub data: Vec<u8>,
    /// Capture timestamp of the source frame.
    pub timestamp: Instant,
}

/// Scales raw captures and compresses them to JPEG.
///
/// One encoder per session; `frame_count` gives each session an
/// independent frame numbering.
pub struct FrameEncoder {
    quality: u8,
    scale: f64,
    frame_count: u64,
}

impl FrameEncoder {
    /// `quality` is the JPEG quality (1..=100), `scale` the uniform
    /// downscale factor in (0, 1].
    pub fn new(quality: u8, scale: f64) -> Self {
        Self {
            quality: quality.clamp(1, 100),
            scale,
            frame_count: 0,
        }
    }

    /// Current JPEG quality.
    pub fn quality(&self) -> u8 {
        self.quality
    }

    /// Frames encoded so far.
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Adjust the JPEG quality for subsequent frames, clamped to
    /// 1..=100. Nothing calls this on the hot path today; it exists
    /// for adaptive-quality control.
    pub fn set_quality(&mut self, quality: u8) {
        self.quality = quality.clamp(1, 100);
    }

    /// Scale and compress one raw frame.
    pub fn encode(&mut self, frame: &RawFrame) -> Result<EncodedFrame, CastError> {
        let rgb = to_opaque_rgb(frame);
        let (dst_w, dst_h) = scaled_size(frame.width, frame.height, self.scale);

        let rgb = if (dst_w, dst_h) == (frame.width, frame.height) {
            rgb
        } else {
            scale_rgb(&rgb, frame.width, frame.height, dst_w, dst_h)
        };

        let img: ImageBuffer<Rgb<u8>, Vec<u8>> = ImageBuffer::from_raw(dst_w, dst_h, rgb)
            .ok_or_else(|| CastError::Encode("pixel buffer does not match dimensions".into()))?;

        let mut jpeg = Vec::new();
        let mut cursor = Cursor::new(&mut jpeg);
        let encoder = JpegEncoder::new_with_quality(&mut cursor, self.quality);
        img.write_with_encoder(encoder)
            .map_err(|e| CastError::Encode(e.to_string()))?;

        self.frame_count += 1;
        Ok(EncodedFrame {
            frame_number: self.frame_count,
            width: dst_w,
            height: dst_h,
            data: jpeg,
            timestamp: frame.timestamp,
        })
    }
}

// ── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn solid_frame(width: u32, height: u32, rgb: [u8; 3]) -> RawFrame {
        let mut data = Vec::with_capacity((width * height * 3) as usize);
        for _ in 0..width * height {
            data.extend_from_slice(&rgb);
        }
        RawFrame::packed_rgb(width, height, data)
    }

    #[test]
    fn encode_halves_dimensions_at_half_scale() {
        let mut enc = FrameEncoder::new(50, 0.5);
        let out = enc.encode(&solid_frame(200, 100, [0, 128, 255])).unwrap();
        assert_eq!((out.width, out.height), (100, 50));
        assert!(!out.data.is_empty());
        // JPEG SOI marker.
        assert_eq!(&out.data[..2], &[0xFF, 0xD8]);
    }

    #[test]
    fn frame_numbers_are_monotonic_from_one() {
        let mut enc = FrameEncoder::new(50, 1.0);
        let frame = solid_frame(16, 16, [10, 20, 30]);
        assert_eq!(enc.encode(&frame).unwrap().frame_number, 1);
        assert_eq!(enc.encode(&frame).unwrap().frame_number, 2);
        assert_eq!(enc.encode(&frame).unwrap().frame_number, 3);
        assert_eq!(enc.frame_count(), 3);
    }

    #[test]
    fn quality_is_clamped() {
        let enc = FrameEncoder::new(0, 1.0);
        assert_eq!(enc.quality(), 1);

        let mut enc = FrameEncoder::new(50, 1.0);
        enc.set_quality(255);
        assert_eq!(enc.quality(), 100);
        enc.set_quality(0);
        assert_eq!(enc.quality(), 1);
    }

    #[test]
    fn tiny_scale_still_yields_a_valid_frame() {
        let mut enc = FrameEncoder::new(50, 0.001);
        let out = enc.encode(&solid_frame(64, 64, [1, 2, 3])).unwrap();
        assert_eq!((out.width, out.height), (1, 1));
        assert!(!out.data.is_empty());
    }

    #[test]
    fn lower_quality_compresses_smaller() {
        // Noise compresses poorly, so quality should dominate size.
        let mut data = Vec::with_capacity(128 * 128 * 3);
        let mut seed = 0x2545F491u32;
        for _ in 0..128 * 128 * 3 {
            seed = seed.wrapping_mul(1103515245).wrapping_add(12345);
            data.push((seed >> 16) as u8);
        }
        let frame = RawFrame::packed_rgb(128, 128, data);

        let hi = FrameEncoder::new(90, 1.0).encode(&frame).unwrap();
        let lo = FrameEncoder::new(10, 1.0).encode(&frame).unwrap();
        assert!(lo.data.len() < hi.data.len());
    }
}

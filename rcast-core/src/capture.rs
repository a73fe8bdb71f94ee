//! Screen capture — raw frame types, the capture seam, and pixel
//! conversion helpers.
//!
//! Production capture uses DXGI Desktop Duplication on Windows; the
//! [`FrameSource`] trait is the seam that lets the server run against
//! a synthetic source in tests and on headless platforms.

use std::time::Instant;

use crate::error::CastError;

// ── PixelFormat ──────────────────────────────────────────────────

/// Pixel layout for raw captured frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    /// 4 bytes per pixel: Blue, Green, Red, Alpha (DXGI default).
    Bgra8,
    /// 4 bytes per pixel: Red, Green, Blue, Alpha.
    Rgba8,
    /// 3 bytes per pixel: Red, Green, Blue.
    Rgb8,
}

impl PixelFormat {
    /// Bytes consumed by a single pixel in this format.
    pub const fn bytes_per_pixel(self) -> usize {
        match self {
            PixelFormat::Bgra8 | PixelFormat::Rgba8 => 4,
            PixelFormat::Rgb8 => 3,
        }
    }

    /// Whether the format carries an alpha channel.
    pub const fn has_alpha(self) -> bool {
        matches!(self, PixelFormat::Bgra8 | PixelFormat::Rgba8)
    }
}

// ── RawFrame ─────────────────────────────────────────────────────

/// A raw, uncompressed screen capture obtained from the OS.
///
/// The `data` buffer holds `height` rows of `stride` bytes each.
/// `stride` may exceed `width * bytes_per_pixel` due to GPU
/// row-alignment padding.
#[derive(Debug, Clone)]
pub struct RawFrame {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Row pitch in bytes (may exceed `width * bpp`).
    pub stride: u32,
    /// Pixel layout.
    pub format: PixelFormat,
    /// Raw pixel data — `stride * height` bytes.
    pub data: Vec<u8>,
    /// Monotonic capture timestamp.
    pub timestamp: Instant,
}

impl RawFrame {
    /// Build a tightly-packed RGB frame (stride = width × 3).
    pub fn packed_rgb(width: u32, height: u32, data: Vec<u8>) -> Self {
        Self {
            width,
            height,
            stride: width * 3,
            format: PixelFormat::Rgb8,
            data,
            timestamp: Instant::now(),
        }
    }
}

// ── FrameSource ──────────────────────────────────────────────────

/// The capture seam: anything that can produce the next display frame.
///
/// `next_frame` blocks briefly (bounded by the implementation's own
/// timeout) and returns [`CastError::CaptureNotReady`] when the OS has
/// no new frame yet — the producer retries; any other error is logged
/// and the capture is skipped.
pub trait FrameSource {
    fn next_frame(&mut self) -> Result<RawFrame, CastError>;
}

// ── Pixel conversion ─────────────────────────────────────────────

/// Convert a raw frame to tightly-packed opaque RGB bytes.
///
/// The wire format carries no alpha, so translucent pixels are
/// composited onto a white background (matching what a screenshot of
/// a transparent surface should look like). Stride padding is
/// stripped.
pub fn to_opaque_rgb(frame: &RawFrame) -> Vec<u8> {
    let w = frame.width as usize;
    let h = frame.height as usize;
    let stride = frame.stride as usize;
    let bpp = frame.format.bytes_per_pixel();
    let mut rgb = Vec::with_capacity(w * h * 3);

    for y in 0..h {
        let row = &frame.data[y * stride..];
        for x in 0..w {
            let px = &row[x * bpp..x * bpp + bpp];
            let (r, g, b, a) = match frame.format {
                PixelFormat::Bgra8 => (px[2], px[1], px[0], px[3]),
                PixelFormat::Rgba8 => (px[0], px[1], px[2], px[3]),
                PixelFormat::Rgb8 => (px[0], px[1], px[2], 255),
            };
            if a == 255 {
                rgb.extend_from_slice(&[r, g, b]);
            } else {
                // Composite over white: out = c·a/255 + 255·(255−a)/255.
                let blend = |c: u8| -> u8 {
                    ((c as u16 * a as u16 + 255 * (255 - a) as u16) / 255) as u8
                };
                rgb.extend_from_slice(&[blend(r), blend(g), blend(b)]);
            }
        }
    }

    rgb
}

/// Uniformly scaled output dimensions, never smaller than 1×1.
pub fn scaled_size(width: u32, height: u32, scale: f64) -> (u32, u32) {
    let w = ((width as f64 * scale) as u32).max(1);
    let h = ((height as f64 * scale) as u32).max(1);
    (w, h)
}

/// Nearest-neighbour resize of a tightly-packed RGB buffer.
pub fn scale_rgb(rgb: &[u8], src_w: u32, src_h: u32, dst_w: u32, dst_h: u32) -> Vec<u8> {
    let (src_w, src_h) = (src_w as usize, src_h as usize);
    let (dst_w, dst_h) = (dst_w as usize, dst_h as usize);
    let mut out = Vec::with_capacity(dst_w * dst_h * 3);

    for y in 0..dst_h {
        let src_y = y * src_h / dst_h;
        for x in 0..dst_w {
            let src_x = x * src_w / dst_w;
            let off = (src_y * src_w + src_x) * 3;
            out.extend_from_slice(&rgb[off..off + 3]);
        }
    }

    out
}

// ── DisplayCapturer ──────────────────────────────────────────────

/// DXGI Desktop Duplication capturer (Windows).
///
/// Wraps the `IDXGIOutputDuplication` pipeline: a D3D11 device, the
/// duplicated primary output, and a CPU-readable staging texture that
/// each acquired desktop frame is copied through.
///
/// On other platforms construction fails at runtime with a typed
/// error; the server then refuses to start sessions (tests inject a
/// synthetic [`FrameSource`] instead).
pub struct DisplayCapturer {
    width: u32,
    height: u32,
    /// DXGI acquire timeout per frame.
    timeout_ms: u32,

    #[cfg(target_os = "windows")]
    _device: windows::Win32::Graphics::Direct3D11::ID3D11Device,
    #[cfg(target_os = "windows")]
    context: windows::Win32::Graphics::Direct3D11::ID3D11DeviceContext,
    #[cfg(target_os = "windows")]
    duplication: windows::Win32::Graphics::Dxgi::IDXGIOutputDuplication,
    #[cfg(target_os = "windows")]
    staging_texture: windows::Win32::Graphics::Direct3D11::ID3D11Texture2D,
}

impl DisplayCapturer {
    /// Display width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Display height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }
}

// ── Windows implementation ───────────────────────────────────────

#[cfg(target_os = "windows")]
mod platform {
    use super::*;
    use windows::{
        Win32::Graphics::{
            Direct3D::D3D_DRIVER_TYPE_HARDWARE,
            Direct3D11::*,
            Dxgi::{Common::*, *},
        },
        core::Interface,
    };

    impl DisplayCapturer {
        /// Initialise capture of the primary display.
        pub fn new(timeout_ms: u32) -> Result<Self, CastError> {
            unsafe { Self::init_dxgi(timeout_ms) }
        }

        unsafe fn init_dxgi(timeout_ms: u32) -> Result<Self, CastError> {
            // 1. Create D3D11 device + immediate context.
            let mut device = None;
            let mut context = None;
            unsafe {
                D3D11CreateDevice(
                    None,
                    D3D_DRIVER_TYPE_HARDWARE,
                    None,
                    D3D11_CREATE_DEVICE_BGRA_SUPPORT,
                    None,
                    D3D11_SDK_VERSION,
                    Some(&mut device),
                    None,
                    Some(&mut context),
                )
                .map_err(|e| CastError::Capture(format!("D3D11CreateDevice failed: {e}")))?;
            }

            let device =
                device.ok_or_else(|| CastError::Capture("D3D11 device is None".into()))?;
            let context =
                context.ok_or_else(|| CastError::Capture("D3D11 context is None".into()))?;

            // 2. Traverse DXGI: Device → Adapter → primary Output.
            let dxgi_device: IDXGIDevice = device
                .cast()
                .map_err(|e| CastError::Capture(format!("cast to IDXGIDevice failed: {e}")))?;
            let adapter = unsafe {
                dxgi_device
                    .GetAdapter()
                    .map_err(|e| CastError::Capture(format!("GetAdapter failed: {e}")))?
            };
            let output: IDXGIOutput = unsafe {
                adapter
                    .EnumOutputs(0)
                    .map_err(|e| CastError::Capture(format!("EnumOutputs(0) failed: {e}")))?
            };

            // 3. Duplicate the output.
            let output1: IDXGIOutput1 = output
                .cast()
                .map_err(|e| CastError::Capture(format!("cast to IDXGIOutput1 failed: {e}")))?;
            let duplication = unsafe {
                output1
                    .DuplicateOutput(&device)
                    .map_err(|e| CastError::Capture(format!("DuplicateOutput failed: {e}")))?
            };

            let dup_desc = unsafe { duplication.GetDesc() };
            let width = dup_desc.ModeDesc.Width;
            let height = dup_desc.ModeDesc.Height;

            // 4. Create a CPU-readable staging texture.
            let staging_desc = D3D11_TEXTURE2D_DESC {
                Width: width,
                Height: height,
                MipLevels: 1,
                ArraySize: 1,
                Format: DXGI_FORMAT_B8G8R8A8_UNORM,
                SampleDesc: DXGI_SAMPLE_DESC {
                    Count: 1,
                    Quality: 0,
                },
                Usage: D3D11_USAGE_STAGING,
                BindFlags: 0,
                CPUAccessFlags: D3D11_CPU_ACCESS_READ.0 as u32,
                MiscFlags: 0,
            };

            let mut staging_texture = None;
            unsafe {
                device
                    .CreateTexture2D(&staging_desc, None, Some(&mut staging_texture))
                    .map_err(|e| {
                        CastError::Capture(format!("CreateTexture2D (staging) failed: {e}"))
                    })?;
            }
            let staging_texture = staging_texture
                .ok_or_else(|| CastError::Capture("staging texture is None".into()))?;

            Ok(Self {
                width,
                height,
                timeout_ms,
                _device: device,
                context,
                duplication,
                staging_texture,
            })
        }

        unsafe fn capture_inner(&mut self) -> Result<RawFrame, CastError> {
            let mut frame_info = DXGI_OUTDUPL_FRAME_INFO::default();
            let mut resource = None;

            match unsafe {
                self.duplication
                    .AcquireNextFrame(self.timeout_ms, &mut frame_info, &mut resource)
            } {
                Ok(()) => {}
                Err(e) if e.code() == DXGI_ERROR_WAIT_TIMEOUT => {
                    return Err(CastError::CaptureNotReady);
                }
                Err(e) => {
                    return Err(CastError::Capture(format!("AcquireNextFrame failed: {e}")));
                }
            }

            let resource =
                resource.ok_or_else(|| CastError::Capture("acquired resource is None".into()))?;

            let texture: ID3D11Texture2D = resource.cast().map_err(|e| {
                let _ = unsafe { self.duplication.ReleaseFrame() };
                CastError::Capture(format!("cast to ID3D11Texture2D failed: {e}"))
            })?;

            // Copy GPU texture → staging texture, then release the
            // DXGI frame as early as possible.
            unsafe {
                self.context.CopyResource(&self.staging_texture, &texture);
            }
            let _ = unsafe { self.duplication.ReleaseFrame() };

            // Map the staging texture for CPU read.
            let mut mapped = D3D11_MAPPED_SUBRESOURCE::default();
            unsafe {
                self.context
                    .Map(&self.staging_texture, 0, D3D11_MAP_READ, 0, Some(&mut mapped))
                    .map_err(|e| CastError::Capture(format!("Map failed: {e}")))?;
            }

            let stride = mapped.RowPitch;
            let total_bytes = stride as usize * self.height as usize;
            let src =
                unsafe { std::slice::from_raw_parts(mapped.pData as *const u8, total_bytes) };
            let data = src.to_vec();

            unsafe { self.context.Unmap(&self.staging_texture, 0) };

            Ok(RawFrame {
                width: self.width,
                height: self.height,
                stride,
                format: PixelFormat::Bgra8,
                data,
                timestamp: Instant::now(),
            })
        }
    }

    impl FrameSource for DisplayCapturer {
        fn next_frame(&mut self) -> Result<RawFrame, CastError> {
            unsafe { self.capture_inner() }
        }
    }
}

// ── Non-Windows stub ─────────────────────────────────────────────

#[cfg(not(target_os = "windows"))]
impl DisplayCapturer {
    /// DXGI Desktop Duplication is only available on Windows.
    pub fn new(_timeout_ms: u32) -> Result<Self, CastError> {
        Err(CastError::Capture(
            "display capture is only available on Windows".into(),
        ))
    }
}

#[cfg(not(target_os = "windows"))]
impl FrameSource for DisplayCapturer {
    fn next_frame(&mut self) -> Result<RawFrame, CastError> {
        Err(CastError::Capture("not supported on this platform".into()))
    }
}

// ── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn bgra_frame(width: u32, height: u32, px: [u8; 4], pad: u32) -> RawFrame {
        let stride = width * 4 + pad;
        let mut data = vec![0u8; (stride * height) as usize];
        for y in 0..height as usize {
            for x in 0..width as usize {
                let off = y * stride as usize + x * 4;
                data[off..off + 4].copy_from_slice(&px);
            }
        }
        RawFrame {
            width,
            height,
            stride,
            format: PixelFormat::Bgra8,
            data,
            timestamp: Instant::now(),
        }
    }

    #[test]
    fn bgra_to_rgb_swaps_channels_and_strips_padding() {
        // Blue-ish pixel: B=200, G=100, R=50, opaque. Padded stride.
        let frame = bgra_frame(3, 2, [200, 100, 50, 255], 16);
        let rgb = to_opaque_rgb(&frame);
        assert_eq!(rgb.len(), 3 * 2 * 3);
        for px in rgb.chunks(3) {
            assert_eq!(px, &[50, 100, 200]);
        }
    }

    #[test]
    fn transparent_pixels_composite_onto_white() {
        // Fully transparent black must become white.
        let frame = bgra_frame(2, 2, [0, 0, 0, 0], 0);
        let rgb = to_opaque_rgb(&frame);
        for px in rgb.chunks(3) {
            assert_eq!(px, &[255, 255, 255]);
        }

        // Half-transparent black lands mid-grey.
        let frame = bgra_frame(1, 1, [0, 0, 0, 128], 0);
        let rgb = to_opaque_rgb(&frame);
        assert!(rgb.iter().all(|&c| (126..=128).contains(&c)), "{rgb:?}");
    }

    #[test]
    fn scaled_size_clamps_to_one() {
        assert_eq!(scaled_size(200, 100, 0.5), (100, 50));
        assert_eq!(scaled_size(1, 1, 0.01), (1, 1));
        assert_eq!(scaled_size(200, 100, 1.0), (200, 100));
    }

    #[test]
    fn nearest_neighbour_downscale_samples_source() {
        // 2×2 image with distinct quadrant colours scaled to 1×1
        // picks the top-left sample.
        let rgb = vec![
            10, 10, 10, 20, 20, 20, //
            30, 30, 30, 40, 40, 40,
        ];
        let out = scale_rgb(&rgb, 2, 2, 1, 1);
        assert_eq!(out, vec![10, 10, 10]);
    }

    #[cfg(not(target_os = "windows"))]
    #[test]
    fn capturer_unavailable_off_windows() {
        assert!(matches!(
            DisplayCapturer::new(100),
            Err(CastError::Capture(_))
        ));
    }
}

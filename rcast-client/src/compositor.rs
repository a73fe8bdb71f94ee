//! Display compositing — letterbox placement and the GDI blit.
//!
//! The geometry (where the frame lands in the window) is computed by
//! [`DisplayTransform`] and recomputed every render, so window resizes
//! and remote resolution changes both take effect on the next frame.

use rcast_core::{DecodedImage, transform::DisplayTransform};

/// Expand tightly-packed RGB into the BGRA layout GDI blits from.
pub fn rgb_to_bgra(rgb: &[u8]) -> Vec<u8> {
    let mut bgra = Vec::with_capacity(rgb.len() / 3 * 4);
    for px in rgb.chunks_exact(3) {
        bgra.extend_from_slice(&[px[2], px[1], px[0], 255]);
    }
    bgra
}

/// Compute where `image` lands in a `window_w`×`window_h` window.
pub fn place(image: &DecodedImage, window_w: u32, window_h: u32) -> Option<DisplayTransform> {
    DisplayTransform::fit(image.width, image.height, window_w, window_h)
}

// ── Windows implementation ───────────────────────────────────────

#[cfg(target_os = "windows")]
mod platform {
    use super::*;
    use windows::Win32::Foundation::*;
    use windows::Win32::Graphics::Gdi::*;

    /// Renders decoded frames into an HWND using GDI `StretchDIBits`,
    /// letterboxed with black bars.
    pub struct DisplayRenderer {
        hwnd: HWND,
        width: u32,
        height: u32,
    }

    impl DisplayRenderer {
        /// Create a renderer targeting the given window.
        pub fn new(hwnd: HWND, width: u32, height: u32) -> Self {
            Self { hwnd, width, height }
        }

        /// Update the target size (call after a resize event).
        pub fn resize(&mut self, width: u32, height: u32) {
            self.width = width;
            self.height = height;
        }

        /// Current target size.
        pub fn size(&self) -> (u32, u32) {
            (self.width, self.height)
        }

        /// Render one decoded frame, letterboxed into the window.
        pub fn render(&self, image: &DecodedImage) -> Result<(), String> {
            let Some(t) = place(image, self.width, self.height) else {
                return Ok(());
            };

            let expected = (image.width * image.height * 3) as usize;
            if image.data.len() < expected {
                return Err(format!(
                    "frame buffer too small: {} < {}",
                    image.data.len(),
                    expected,
                ));
            }

            let bgra = rgb_to_bgra(&image.data);

            unsafe {
                let hdc = GetDC(self.hwnd);
                if hdc.is_invalid() {
                    return Err("GetDC failed".into());
                }

                // Black out the margin bars.
                let brush = GetStockObject(BLACK_BRUSH);
                let full = RECT {
                    left: 0,
                    top: 0,
                    right: self.width as i32,
                    bottom: self.height as i32,
                };
                FillRect(hdc, &full, HBRUSH(brush.0));

                let bmi = BITMAPINFO {
                    bmiHeader: BITMAPINFOHEADER {
                        biSize: std::mem::size_of::<BITMAPINFOHEADER>() as u32,
                        biWidth: image.width as i32,
                        // Negative height = top-down DIB (origin at top-left).
                        biHeight: -(image.height as i32),
                        biPlanes: 1,
                        biBitCount: 32,
                        biCompression: BI_RGB.0,
                        biSizeImage: 0,
                        biXPelsPerMeter: 0,
                        biYPelsPerMeter: 0,
                        biClrUsed: 0,
                        biClrImportant: 0,
                    },
                    bmiColors: [RGBQUAD::default(); 1],
                };

                StretchDIBits(
                    hdc,
                    t.origin_x as i32,
                    t.origin_y as i32,
                    t.rendered_w as i32,
                    t.rendered_h as i32,
                    0,
                    0,
                    image.width as i32,
                    image.height as i32,
                    Some(bgra.as_ptr() as *const _),
                    &bmi,
                    DIB_RGB_COLORS,
                    SRCCOPY,
                );

                ReleaseDC(self.hwnd, hdc);
            }

            Ok(())
        }
    }
}

#[cfg(target_os = "windows")]
pub use platform::DisplayRenderer;

// ── Non-Windows stub ─────────────────────────────────────────────

#[cfg(not(target_os = "windows"))]
mod stub {
    use super::*;

    pub struct DisplayRenderer {
        width: u32,
        height: u32,
    }

    impl DisplayRenderer {
        pub fn new(_hwnd: (), width: u32, height: u32) -> Self {
            Self { width, height }
        }

        pub fn resize(&mut self, width: u32, height: u32) {
            self.width = width;
            self.height = height;
        }

        pub fn size(&self) -> (u32, u32) {
            (self.width, self.height)
        }

        pub fn render(&self, _image: &DecodedImage) -> Result<(), String> {
            Err("display rendering is only supported on Windows".into())
        }
    }
}

#[cfg(not(target_os = "windows"))]
pub use stub::DisplayRenderer;

// ── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rgb_expands_to_opaque_bgra() {
        let rgb = [10u8, 20, 30, 40, 50, 60];
        let bgra = rgb_to_bgra(&rgb);
        assert_eq!(bgra, vec![30, 20, 10, 255, 60, 50, 40, 255]);
    }

    #[test]
    fn placement_follows_the_frame_dimensions() {
        let image = DecodedImage {
            width: 200,
            height: 100,
            data: vec![0; 200 * 100 * 3],
        };
        let t = place(&image, 1024, 768).unwrap();
        assert!((t.rendered_w - 1024.0).abs() < 1e-9);
        assert!((t.rendered_h - 512.0).abs() < 1e-9);

        // A degenerate window yields no placement.
        assert!(place(&image, 0, 768).is_none());
    }
}

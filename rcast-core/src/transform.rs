//! Letterboxed display geometry and coordinate mapping.
//!
//! The client fits each remote frame into its window preserving
//! aspect ratio, then maps window-space pointer events back into
//! remote-frame space. Both directions live here so they stay exact
//! inverses of each other.

/// Geometry of a frame letterboxed into a window.
///
/// `scale` is the uniform fit factor; `origin_x`/`origin_y` locate the
/// top-left corner of the rendered image inside the window, with the
/// unused margin split evenly on both sides.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplayTransform {
    pub origin_x: f64,
    pub origin_y: f64,
    pub rendered_w: f64,
    pub rendered_h: f64,
    pub scale: f64,
    pub image_w: u32,
    pub image_h: u32,
}

impl DisplayTransform {
    /// Compute the letterbox fit of an `image_w`×`image_h` frame into
    /// a `window_w`×`window_h` window. Returns `None` when either
    /// rectangle has a zero dimension.
    pub fn fit(image_w: u32, image_h: u32, window_w: u32, window_h: u32) -> Option<Self> {
        if image_w == 0 || image_h == 0 || window_w == 0 || window_h == 0 {
            return None;
        }

        let scale = f64::min(
            window_w as f64 / image_w as f64,
            window_h as f64 / image_h as f64,
        );
        let rendered_w = image_w as f64 * scale;
        let rendered_h = image_h as f64 * scale;

        Some(Self {
            origin_x: (window_w as f64 - rendered_w) / 2.0,
            origin_y: (window_h as f64 - rendered_h) / 2.0,
            rendered_w,
            rendered_h,
            scale,
            image_w,
            image_h,
        })
    }

    /// Whether a window-space point falls inside the rendered image.
    pub fn contains(&self, wx: f64, wy: f64) -> bool {
        wx >= self.origin_x
            && wx < self.origin_x + self.rendered_w
            && wy >= self.origin_y
            && wy < self.origin_y + self.rendered_h
    }

    /// Map a window-space point to remote-frame coordinates.
    ///
    /// Points over the letterbox margins map to `None`; input there is
    /// dropped rather than clamped onto the frame edge.
    pub fn window_to_remote(&self, wx: f64, wy: f64) -> Option<(f64, f64)> {
        if !self.contains(wx, wy) {
            return None;
        }
        Some((
            (wx - self.origin_x) / self.scale,
            (wy - self.origin_y) / self.scale,
        ))
    }

    /// Map a remote-frame point back to window space.
    pub fn remote_to_window(&self, rx: f64, ry: f64) -> (f64, f64) {
        (
            rx * self.scale + self.origin_x,
            ry * self.scale + self.origin_y,
        )
    }
}

// ── Tests ────────────────────────────────────────────────────────

//! Input injection — the backend seam and the Win32 `SendInput`
//! implementation.
//!
//! Coordinates are true screen pixels (the executor has already undone
//! the capture scale). All methods take `&self`; `SendInput` carries
//! no state worth mutating.

use std::time::Duration;

use crate::command::MouseButton;
use crate::error::CastError;

// ── InputBackend ─────────────────────────────────────────────────

/// Everything the command executor needs from the OS input layer.
///
/// Tests substitute a recording implementation; production uses
/// [`SystemInput`].
pub trait InputBackend: Send + Sync {
    /// Move the pointer to an absolute screen position.
    fn move_to(&self, x: i32, y: i32) -> Result<(), CastError>;

    /// Press and release a button at an absolute position.
    fn click(&self, x: i32, y: i32, button: MouseButton) -> Result<(), CastError>;

    /// Two rapid primary-button clicks at an absolute position.
    fn double_click(&self, x: i32, y: i32) -> Result<(), CastError>;

    /// Hold the primary button from `(x1, y1)` to `(x2, y2)` over
    /// roughly `duration`.
    fn drag(&self, x1: i32, y1: i32, x2: i32, y2: i32, duration: Duration)
    -> Result<(), CastError>;

    /// Scroll `clicks` wheel notches at a position (positive = up).
    fn scroll(&self, x: i32, y: i32, clicks: i32) -> Result<(), CastError>;

    /// Press and release one named key.
    fn key_press(&self, key: &str) -> Result<(), CastError>;

    /// Press keys down in order, then release in reverse order.
    fn key_chord(&self, keys: &[String]) -> Result<(), CastError>;

    /// Type text as Unicode character events.
    fn type_text(&self, text: &str) -> Result<(), CastError>;
}

impl<B: InputBackend + ?Sized> InputBackend for Box<B> {
    fn move_to(&self, x: i32, y: i32) -> Result<(), CastError> {
        (**self).move_to(x, y)
    }
    fn click(&self, x: i32, y: i32, button: MouseButton) -> Result<(), CastError> {
        (**self).click(x, y, button)
    }
    fn double_click(&self, x: i32, y: i32) -> Result<(), CastError> {
        (**self).double_click(x, y)
    }
    fn drag(
        &self,
        x1: i32,
        y1: i32,
        x2: i32,
        y2: i32,
        duration: Duration,
    ) -> Result<(), CastError> {
        (**self).drag(x1, y1, x2, y2, duration)
    }
    fn scroll(&self, x: i32, y: i32, clicks: i32) -> Result<(), CastError> {
        (**self).scroll(x, y, clicks)
    }
    fn key_press(&self, key: &str) -> Result<(), CastError> {
        (**self).key_press(key)
    }
    fn key_chord(&self, keys: &[String]) -> Result<(), CastError> {
        (**self).key_chord(keys)
    }
    fn type_text(&self, text: &str) -> Result<(), CastError> {
        (**self).type_text(text)
    }
}

// ── SystemInput ──────────────────────────────────────────────────

/// Injects events into the OS input stream via Win32 `SendInput`.
///
/// Requires the process to run in the interactive desktop session.
/// On other platforms every method returns [`CastError::Inject`].
pub struct SystemInput;

impl SystemInput {
    /// Create a new injector (no initialisation cost).
    pub fn new() -> Self {
        Self
    }
}

impl Default for SystemInput {
    fn default() -> Self {
        Self::new()
    }
}

/// Translate a wire key name to a Windows virtual-key code.
///
/// Single letters and digits map through their ASCII codes; the named
/// keys cover what clients actually send. Unknown names are rejected
/// so a typo'd key fails loudly instead of pressing nothing.
pub fn virtual_key(name: &str) -> Option<u16> {
    let lower = name.to_ascii_lowercase();

    if lower.len() == 1 {
        let c = lower.as_bytes()[0];
        return match c {
            b'a'..=b'z' => Some((c - b'a' + 0x41) as u16),
            b'0'..=b'9' => Some((c - b'0' + 0x30) as u16),
            b' ' => Some(0x20),
            _ => None,
        };
    }

    let vk = match lower.as_str() {
        "enter" | "return" => 0x0D,
        "esc" | "escape" => 0x1B,
        "tab" => 0x09,
        "backspace" => 0x08,
        "space" => 0x20,
        "delete" => 0x2E,
        "insert" => 0x2D,
        "home" => 0x24,
        "end" => 0x23,
        "pageup" | "page_up" => 0x21,
        "pagedown" | "page_down" => 0x22,
        "up" => 0x26,
        "down" => 0x28,
        "left" => 0x25,
        "right" => 0x27,
        "ctrl" | "control" => 0x11,
        "alt" => 0x12,
        "shift" => 0x10,
        "win" | "super" | "meta" => 0x5B,
        "capslock" => 0x14,
        "f1" => 0x70,
        "f2" => 0x71,
        "f3" => 0x72,
        "f4" => 0x73,
        "f5" => 0x74,
        "f6" => 0x75,
        "f7" => 0x76,
        "f8" => 0x77,
        "f9" => 0x78,
        "f10" => 0x79,
        "f11" => 0x7A,
        "f12" => 0x7B,
        _ => return None,
    };
    Some(vk)
}

// ── Windows implementation ───────────────────────────────────────

#[cfg(target_os = "windows")]
mod platform {
    use super::*;
    use windows::Win32::UI::Input::KeyboardAndMouse::*;
    use windows::Win32::UI::WindowsAndMessaging::{GetSystemMetrics, SM_CXSCREEN, SM_CYSCREEN};

    /// Steps a drag path is interpolated over.
    const DRAG_STEPS: u32 = 20;

    fn screen_size() -> Result<(i32, i32), CastError> {
        let (w, h) = unsafe { (GetSystemMetrics(SM_CXSCREEN), GetSystemMetrics(SM_CYSCREEN)) };
        if w == 0 || h == 0 {
            return Err(CastError::Inject("GetSystemMetrics returned 0".into()));
        }
        Ok((w, h))
    }

    fn send(inputs: &[INPUT]) -> Result<(), CastError> {
        let sent = unsafe { SendInput(inputs, std::mem::size_of::<INPUT>() as i32) };
        if sent as usize != inputs.len() {
            return Err(CastError::Inject(format!(
                "SendInput injected {sent} of {} events",
                inputs.len()
            )));
        }
        Ok(())
    }

    fn mouse_input(abs_x: i32, abs_y: i32, flags: MOUSE_EVENT_FLAGS, data: u32) -> INPUT {
        INPUT {
            r#type: INPUT_MOUSE,
            Anonymous: INPUT_0 {
                mi: MOUSEINPUT {
                    dx: abs_x,
                    dy: abs_y,
                    mouseData: data,
                    dwFlags: flags | MOUSEEVENTF_ABSOLUTE,
                    time: 0,
                    dwExtraInfo: 0,
                },
            },
        }
    }

    fn key_input(vk: u16, up: bool) -> INPUT {
        let mut flags = KEYBD_EVENT_FLAGS(0);
        if up {
            flags |= KEYEVENTF_KEYUP;
        }
        INPUT {
            r#type: INPUT_KEYBOARD,
            Anonymous: INPUT_0 {
                ki: KEYBDINPUT {
                    wVk: VIRTUAL_KEY(vk),
                    wScan: 0,
                    dwFlags: flags,
                    time: 0,
                    dwExtraInfo: 0,
                },
            },
        }
    }

    fn unicode_input(unit: u16, up: bool) -> INPUT {
        let mut flags = KEYEVENTF_UNICODE;
        if up {
            flags |= KEYEVENTF_KEYUP;
        }
        INPUT {
            r#type: INPUT_KEYBOARD,
            Anonymous: INPUT_0 {
                ki: KEYBDINPUT {
                    wVk: VIRTUAL_KEY(0),
                    wScan: unit,
                    dwFlags: flags,
                    time: 0,
                    dwExtraInfo: 0,
                },
            },
        }
    }

    /// Convert screen pixels to the 0..=65535 absolute space
    /// `MOUSEEVENTF_ABSOLUTE` expects.
    fn to_absolute(x: i32, y: i32) -> Result<(i32, i32), CastError> {
        let (w, h) = screen_size()?;
        Ok((
            (x as i64 * 65535 / w as i64) as i32,
            (y as i64 * 65535 / h as i64) as i32,
        ))
    }

    fn button_flags(button: MouseButton) -> (MOUSE_EVENT_FLAGS, MOUSE_EVENT_FLAGS) {
        match button {
            MouseButton::Left => (MOUSEEVENTF_LEFTDOWN, MOUSEEVENTF_LEFTUP),
            MouseButton::Right => (MOUSEEVENTF_RIGHTDOWN, MOUSEEVENTF_RIGHTUP),
        }
    }

    impl InputBackend for SystemInput {
        fn move_to(&self, x: i32, y: i32) -> Result<(), CastError> {
            let (ax, ay) = to_absolute(x, y)?;
            send(&[mouse_input(ax, ay, MOUSEEVENTF_MOVE, 0)])
        }

        fn click(&self, x: i32, y: i32, button: MouseButton) -> Result<(), CastError> {
            let (ax, ay) = to_absolute(x, y)?;
            let (down, up) = button_flags(button);
            send(&[
                mouse_input(ax, ay, MOUSEEVENTF_MOVE, 0),
                mouse_input(ax, ay, down, 0),
                mouse_input(ax, ay, up, 0),
            ])
        }

        fn double_click(&self, x: i32, y: i32) -> Result<(), CastError> {
            self.click(x, y, MouseButton::Left)?;
            self.click(x, y, MouseButton::Left)
        }

        fn drag(
            &self,
            x1: i32,
            y1: i32,
            x2: i32,
            y2: i32,
            duration: Duration,
        ) -> Result<(), CastError> {
            let (ax1, ay1) = to_absolute(x1, y1)?;
            send(&[
                mouse_input(ax1, ay1, MOUSEEVENTF_MOVE, 0),
                mouse_input(ax1, ay1, MOUSEEVENTF_LEFTDOWN, 0),
            ])?;

            let step_delay = duration / DRAG_STEPS;
            for i in 1..=DRAG_STEPS {
                let t = i as f64 / DRAG_STEPS as f64;
                let x = x1 + ((x2 - x1) as f64 * t) as i32;
                let y = y1 + ((y2 - y1) as f64 * t) as i32;
                let (ax, ay) = to_absolute(x, y)?;
                send(&[mouse_input(ax, ay, MOUSEEVENTF_MOVE, 0)])?;
                std::thread::sleep(step_delay);
            }

            let (ax2, ay2) = to_absolute(x2, y2)?;
            send(&[mouse_input(ax2, ay2, MOUSEEVENTF_LEFTUP, 0)])
        }

        fn scroll(&self, x: i32, y: i32, clicks: i32) -> Result<(), CastError> {
            let (ax, ay) = to_absolute(x, y)?;
            // One notch is WHEEL_DELTA (120) on Windows.
            let delta = clicks.saturating_mul(120);
            send(&[
                mouse_input(ax, ay, MOUSEEVENTF_MOVE, 0),
                mouse_input(ax, ay, MOUSEEVENTF_WHEEL, delta as u32),
            ])
        }

        fn key_press(&self, key: &str) -> Result<(), CastError> {
            let vk = virtual_key(key)
                .ok_or_else(|| CastError::Inject(format!("unknown key name {key:?}")))?;
            send(&[key_input(vk, false), key_input(vk, true)])
        }

        fn key_chord(&self, keys: &[String]) -> Result<(), CastError> {
            let mut vks = Vec::with_capacity(keys.len());
            for key in keys {
                vks.push(
                    virtual_key(key)
                        .ok_or_else(|| CastError::Inject(format!("unknown key name {key:?}")))?,
                );
            }

            let mut inputs = Vec::with_capacity(vks.len() * 2);
            for &vk in &vks {
                inputs.push(key_input(vk, false));
            }
            for &vk in vks.iter().rev() {
                inputs.push(key_input(vk, true));
            }
            send(&inputs)
        }

        fn type_text(&self, text: &str) -> Result<(), CastError> {
            let mut inputs = Vec::new();
            for unit in text.encode_utf16() {
                inputs.push(unicode_input(unit, false));
                inputs.push(unicode_input(unit, true));
            }
            if inputs.is_empty() {
                return Ok(());
            }
            send(&inputs)
        }
    }
}

// ── Non-Windows stub ─────────────────────────────────────────────

#[cfg(not(target_os = "windows"))]
impl InputBackend for SystemInput {
    fn move_to(&self, _x: i32, _y: i32) -> Result<(), CastError> {
        Err(unsupported())
    }
    fn click(&self, _x: i32, _y: i32, _button: MouseButton) -> Result<(), CastError> {
        Err(unsupported())
    }
    fn double_click(&self, _x: i32, _y: i32) -> Result<(), CastError> {
        Err(unsupported())
    }
    fn drag(
        &self,
        _x1: i32,
        _y1: i32,
        _x2: i32,
        _y2: i32,
        _duration: Duration,
    ) -> Result<(), CastError> {
        Err(unsupported())
    }
    fn scroll(&self, _x: i32, _y: i32, _clicks: i32) -> Result<(), CastError> {
        Err(unsupported())
    }
    fn key_press(&self, _key: &str) -> Result<(), CastError> {
        Err(unsupported())
    }
    fn key_chord(&self, _keys: &[String]) -> Result<(), CastError> {
        Err(unsupported())
    }
    fn type_text(&self, _text: &str) -> Result<(), CastError> {
        Err(unsupported())
    }
}

#[cfg(not(target_os = "windows"))]
fn unsupported() -> CastError {
    CastError::Inject("input injection is only available on Windows".into())
}

// ── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn letters_and_digits_map_through_ascii() {
        assert_eq!(virtual_key("a"), Some(0x41));
        assert_eq!(virtual_key("Z"), Some(0x5A));
        assert_eq!(virtual_key("0"), Some(0x30));
        assert_eq!(virtual_key("9"), Some(0x39));
    }

    #[test]
    fn named_keys_and_aliases() {
        assert_eq!(virtual_key("enter"), virtual_key("return"));
        assert_eq!(virtual_key("esc"), virtual_key("escape"));
        assert_eq!(virtual_key("ctrl"), Some(0x11));
        assert_eq!(virtual_key("page_up"), virtual_key("pageup"));
        assert_eq!(virtual_key("F12"), Some(0x7B));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert_eq!(virtual_key("hyperspace"), None);
        assert_eq!(virtual_key(""), None);
        assert_eq!(virtual_key("?"), None);
    }

    #[cfg(not(target_os = "windows"))]
    #[test]
    fn stub_reports_unsupported() {
        let inj = SystemInput::new();
        assert!(matches!(inj.move_to(1, 2), Err(CastError::Inject(_))));
        assert!(matches!(inj.type_text("hi"), Err(CastError::Inject(_))));
    }
}

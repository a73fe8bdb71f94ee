//! Win32 window creation and message loop.
//!
//! Creates a native HWND used by the display renderer. The window
//! produces [`WindowEvent`]s that the main loop feeds through the
//! input mapper and forwards to the server.

/// Events produced by the window message loop.
#[derive(Debug, Clone, PartialEq)]
pub enum WindowEvent {
    /// Window close requested (Alt-F4/X button).
    Close,
    /// Client area resized.
    Resize(u32, u32),
    /// Pointer moved (client-relative coordinates).
    MouseMove(f64, f64),
    /// Mouse button pressed or released.
    MouseButton(MouseBtn, bool),
    /// Wheel notches, positive = up.
    Wheel(i32),
    /// Key press with the control-key state at the time.
    Key { key: KeyInput, ctrl: bool },
}

/// Mouse button identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseBtn {
    Left,
    Right,
}

/// A key press, already classified for the command protocol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyInput {
    /// A key with a protocol name ("enter", "up", "f5", ...).
    Named(&'static str),
    /// A printable character.
    Char(char),
}

/// Translate a Windows virtual-key code into a [`KeyInput`].
///
/// Letters come back lowercase; modifier keys return `None` because
/// they only matter as part of a chord, which the ctrl flag covers.
pub fn classify_vk(vk: u16) -> Option<KeyInput> {
    match vk {
        0x41..=0x5A => Some(KeyInput::Char((b'a' + (vk - 0x41) as u8) as char)),
        0x30..=0x39 => Some(KeyInput::Char((b'0' + (vk - 0x30) as u8) as char)),
        0x0D => Some(KeyInput::Named("enter")),
        0x1B => Some(KeyInput::Named("esc")),
        0x09 => Some(KeyInput::Named("tab")),
        0x08 => Some(KeyInput::Named("backspace")),
        0x20 => Some(KeyInput::Named("space")),
        0x2E => Some(KeyInput::Named("delete")),
        0x2D => Some(KeyInput::Named("insert")),
        0x24 => Some(KeyInput::Named("home")),
        0x23 => Some(KeyInput::Named("end")),
        0x21 => Some(KeyInput::Named("pageup")),
        0x22 => Some(KeyInput::Named("pagedown")),
        0x26 => Some(KeyInput::Named("up")),
        0x28 => Some(KeyInput::Named("down")),
        0x25 => Some(KeyInput::Named("left")),
        0x27 => Some(KeyInput::Named("right")),
        0x70..=0x7B => Some(KeyInput::Named(
            ["f1", "f2", "f3", "f4", "f5", "f6", "f7", "f8", "f9", "f10", "f11", "f12"]
                [(vk - 0x70) as usize],
        )),
        // Modifiers and everything else.
        _ => None,
    }
}

// ── Windows implementation ───────────────────────────────────────

#[cfg(target_os = "windows")]
mod platform {
    use std::sync::mpsc;

    use windows::Win32::Foundation::*;
    use windows::Win32::System::LibraryLoader::GetModuleHandleW;
    use windows::Win32::UI::Input::KeyboardAndMouse::{GetKeyState, VK_CONTROL};
    use windows::Win32::UI::WindowsAndMessaging::*;
    use windows::core::PCWSTR;

    use super::{MouseBtn, WindowEvent, classify_vk};

    /// Handle to the native viewer window.
    pub struct NativeWindow {
        hwnd: HWND,
        event_rx: mpsc::Receiver<WindowEvent>,
    }

    // A raw pointer to the mpsc sender lives in GWLP_USERDATA for as
    // long as the window does.
    unsafe extern "system" fn wndproc(
        hwnd: HWND,
        msg: u32,
        wparam: WPARAM,
        lparam: LPARAM,
    ) -> LRESULT {
        let tx_ptr =
            unsafe { GetWindowLongPtrW(hwnd, GWLP_USERDATA) } as *const mpsc::Sender<WindowEvent>;

        if tx_ptr.is_null() {
            return unsafe { DefWindowProcW(hwnd, msg, wparam, lparam) };
        }

        let tx = unsafe { &*tx_ptr };

        match msg {
            WM_CLOSE => {
                let _ = tx.send(WindowEvent::Close);
                LRESULT(0)
            }
            WM_SIZE => {
                let w = (lparam.0 & 0xFFFF) as u32;
                let h = ((lparam.0 >> 16) & 0xFFFF) as u32;
                let _ = tx.send(WindowEvent::Resize(w, h));
                LRESULT(0)
            }
            WM_MOUSEMOVE => {
                let x = (lparam.0 & 0xFFFF) as i16 as f64;
                let y = ((lparam.0 >> 16) & 0xFFFF) as i16 as f64;
                let _ = tx.send(WindowEvent::MouseMove(x, y));
                LRESULT(0)
            }
            WM_LBUTTONDOWN => {
                let _ = tx.send(WindowEvent::MouseButton(MouseBtn::Left, true));
                LRESULT(0)
            }
            WM_LBUTTONUP => {
                let _ = tx.send(WindowEvent::MouseButton(MouseBtn::Left, false));
                LRESULT(0)
            }
            WM_RBUTTONDOWN => {
                let _ = tx.send(WindowEvent::MouseButton(MouseBtn::Right, true));
                LRESULT(0)
            }
            WM_RBUTTONUP => {
                let _ = tx.send(WindowEvent::MouseButton(MouseBtn::Right, false));
                LRESULT(0)
            }
            WM_MOUSEWHEEL => {
                // WHEEL_DELTA units per notch.
                let delta = ((wparam.0 >> 16) & 0xFFFF) as i16;
                let _ = tx.send(WindowEvent::Wheel((delta / 120) as i32));
                LRESULT(0)
            }
            WM_KEYDOWN | WM_SYSKEYDOWN => {
                let vk = (wparam.0 & 0xFFFF) as u16;
                if let Some(key) = classify_vk(vk) {
                    let ctrl = unsafe { GetKeyState(VK_CONTROL.0 as i32) } < 0;
                    let _ = tx.send(WindowEvent::Key { key, ctrl });
                }
                LRESULT(0)
            }
            WM_DESTROY => {
                unsafe { PostQuitMessage(0) };
                LRESULT(0)
            }
            _ => unsafe { DefWindowProcW(hwnd, msg, wparam, lparam) },
        }
    }

    impl NativeWindow {
        /// Create a new top-level window.
        pub fn create(title: &str, width: u32, height: u32) -> Result<Self, String> {
            let (event_tx, event_rx) = mpsc::channel();

            let hinstance =
                unsafe { GetModuleHandleW(None) }.map_err(|e| format!("GetModuleHandle: {e}"))?;

            let class_name_wide: Vec<u16> = "RcastViewerClass\0".encode_utf16().collect();

            let wc = WNDCLASSW {
                lpfnWndProc: Some(wndproc),
                hInstance: hinstance.into(),
                lpszClassName: PCWSTR(class_name_wide.as_ptr()),
                hCursor: unsafe { LoadCursorW(None, IDC_ARROW) }.unwrap_or_default(),
                ..Default::default()
            };

            let atom = unsafe { RegisterClassW(&wc) };
            if atom == 0 {
                return Err("RegisterClassW failed".into());
            }

            let title_wide: Vec<u16> = title.encode_utf16().chain(std::iter::once(0)).collect();

            let hwnd = unsafe {
                CreateWindowExW(
                    WINDOW_EX_STYLE(0),
                    PCWSTR(class_name_wide.as_ptr()),
                    PCWSTR(title_wide.as_ptr()),
                    WS_OVERLAPPEDWINDOW | WS_VISIBLE,
                    CW_USEDEFAULT,
                    CW_USEDEFAULT,
                    width as i32,
                    height as i32,
                    None,
                    None,
                    hinstance,
                    None,
                )
            }
            .map_err(|e| format!("CreateWindowExW failed: {e}"))?;

            if hwnd.is_invalid() {
                return Err("CreateWindowExW returned invalid HWND".into());
            }

            let tx_box = Box::new(event_tx);
            let tx_ptr = Box::into_raw(tx_box);
            unsafe {
                SetWindowLongPtrW(hwnd, GWLP_USERDATA, tx_ptr as isize);
            }

            Ok(Self { hwnd, event_rx })
        }

        /// Pump windows messages (non-blocking). Returns collected events.
        pub fn poll_events(&self) -> Vec<WindowEvent> {
            unsafe {
                let mut msg = MSG::default();
                while PeekMessageW(&mut msg, self.hwnd, 0, 0, PM_REMOVE).as_bool() {
                    let _ = TranslateMessage(&msg);
                    DispatchMessageW(&msg);
                }
            }
            let mut events = Vec::new();
            while let Ok(ev) = self.event_rx.try_recv() {
                events.push(ev);
            }
            events
        }

        /// Replace the window title.
        pub fn set_title(&self, title: &str) {
            let title_wide: Vec<u16> = title.encode_utf16().chain(std::iter::once(0)).collect();
            unsafe {
                let _ = SetWindowTextW(self.hwnd, PCWSTR(title_wide.as_ptr()));
            }
        }

        /// The raw window handle.
        pub fn hwnd(&self) -> HWND {
            self.hwnd
        }
    }

    impl Drop for NativeWindow {
        fn drop(&mut self) {
            unsafe {
                // Recover and drop the boxed sender.
                let ptr =
                    GetWindowLongPtrW(self.hwnd, GWLP_USERDATA) as *mut mpsc::Sender<WindowEvent>;
                if !ptr.is_null() {
                    drop(Box::from_raw(ptr));
                    SetWindowLongPtrW(self.hwnd, GWLP_USERDATA, 0);
                }
                let _ = DestroyWindow(self.hwnd);
            }
        }
    }
}

#[cfg(target_os = "windows")]
pub use platform::NativeWindow;

// ── Non-Windows stub ─────────────────────────────────────────────

#[cfg(not(target_os = "windows"))]
mod stub {
    use super::WindowEvent;

    pub struct NativeWindow;

    impl NativeWindow {
        pub fn create(_title: &str, _w: u32, _h: u32) -> Result<Self, String> {
            Err("window creation is only supported on Windows".into())
        }

        pub fn poll_events(&self) -> Vec<WindowEvent> {
            Vec::new()
        }

        pub fn set_title(&self, _title: &str) {}

        pub fn hwnd(&self) {}
    }
}

#[cfg(not(target_os = "windows"))]
pub use stub::NativeWindow;

// ── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn letters_classify_lowercase() {
        assert_eq!(classify_vk(0x41), Some(KeyInput::Char('a')));
        assert_eq!(classify_vk(0x5A), Some(KeyInput::Char('z')));
        assert_eq!(classify_vk(0x37), Some(KeyInput::Char('7')));
    }

    #[test]
    fn named_keys_use_protocol_names() {
        assert_eq!(classify_vk(0x0D), Some(KeyInput::Named("enter")));
        assert_eq!(classify_vk(0x21), Some(KeyInput::Named("pageup")));
        assert_eq!(classify_vk(0x74), Some(KeyInput::Named("f5")));
    }

    #[test]
    fn modifiers_are_not_standalone_keys() {
        // VK_CONTROL, VK_SHIFT, VK_MENU.
        assert_eq!(classify_vk(0x11), None);
        assert_eq!(classify_vk(0x10), None);
        assert_eq!(classify_vk(0x12), None);
    }
}

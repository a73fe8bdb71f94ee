//! Command channel protocol — structured input actions.
//!
//! # Wire Protocol
//!
//! One JSON object per framed record, tagged by `type`:
//!
//! ```text
//! Client ──[{"type":"mouse_click","x":40.0,"y":30.0,"button":"left"}]──► Server
//! ```
//!
//! Coordinates are floating point in **captured-frame pixel space**
//! (post capture-scale); the executor divides by the capture scale
//! before injecting. The channel is one-way and best-effort: the
//! server never acknowledges or reports errors back.

use serde::{Deserialize, Serialize};

use crate::error::CastError;

// ── MouseButton ──────────────────────────────────────────────────

/// Mouse buttons addressable over the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MouseButton {
    #[default]
    Left,
    Right,
}

// ── Command ──────────────────────────────────────────────────────

/// The exhaustive set of input actions a client can request.
///
/// Matching on this enum is checked by the compiler, so adding a
/// variant forces every dispatcher to handle it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Command {
    /// Move the pointer to `(x, y)`.
    MouseMove { x: f64, y: f64 },
    /// Click at `(x, y)`. A missing `button` field means left.
    MouseClick {
        x: f64,
        y: f64,
        #[serde(default)]
        button: MouseButton,
    },
    /// Drag the primary button from `(x1, y1)` to `(x2, y2)`.
    MouseDrag { x1: f64, y1: f64, x2: f64, y2: f64 },
    /// Scroll `clicks` wheel notches at `(x, y)` (positive = up).
    MouseScroll { x: f64, y: f64, clicks: i32 },
    /// Press and release a single named key.
    KeyPress { key: String },
    /// Press an ordered set of keys as one simultaneous chord.
    KeyCombination { keys: Vec<String> },
    /// Type text character by character.
    TypeText { text: String },
    /// Double-click the primary button at `(x, y)`.
    DoubleClick { x: f64, y: f64 },
}

impl Command {
    /// Serialize to JSON bytes for the wire.
    pub fn to_bytes(&self) -> Result<Vec<u8>, CastError> {
        serde_json::to_vec(self).map_err(|e| CastError::MalformedCommand(e.to_string()))
    }

    /// Deserialize from JSON bytes. Unknown `type` tags fail here and
    /// are discarded by the executor.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CastError> {
        serde_json::from_slice(bytes).map_err(|e| CastError::MalformedCommand(e.to_string()))
    }

    /// The wire tag of this command (for logging).
    pub fn name(&self) -> &'static str {
        match self {
            Command::MouseMove { .. } => "mouse_move",
            Command::MouseClick { .. } => "mouse_click",
            Command::MouseDrag { .. } => "mouse_drag",
            Command::MouseScroll { .. } => "mouse_scroll",
            Command::KeyPress { .. } => "key_press",
            Command::KeyCombination { .. } => "key_combination",
            Command::TypeText { .. } => "type_text",
            Command::DoubleClick { .. } => "double_click",
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_tags_are_snake_case() {
        let cmd = Command::MouseMove { x: 1.5, y: 2.5 };
        let json = String::from_utf8(cmd.to_bytes().unwrap()).unwrap();
        assert!(json.contains(r#""type":"mouse_move""#), "{json}");

        let cmd = Command::KeyCombination {
            keys: vec!["ctrl".into(), "c".into()],
        };
        let json = String::from_utf8(cmd.to_bytes().unwrap()).unwrap();
        assert!(json.contains(r#""type":"key_combination""#), "{json}");
    }

    #[test]
    fn roundtrip_every_variant() {
        let commands = vec![
            Command::MouseMove { x: 10.0, y: 20.0 },
            Command::MouseClick {
                x: 1.0,
                y: 2.0,
                button: MouseButton::Right,
            },
            Command::MouseDrag {
                x1: 0.0,
                y1: 0.0,
                x2: 5.5,
                y2: 6.5,
            },
            Command::MouseScroll {
                x: 3.0,
                y: 4.0,
                clicks: -2,
            },
            Command::KeyPress { key: "enter".into() },
            Command::KeyCombination {
                keys: vec!["ctrl".into(), "v".into()],
            },
            Command::TypeText { text: "hi".into() },
            Command::DoubleClick { x: 7.0, y: 8.0 },
        ];

        for cmd in commands {
            let bytes = cmd.to_bytes().unwrap();
            let parsed = Command::from_bytes(&bytes).unwrap();
            assert_eq!(parsed, cmd);
        }
    }

    #[test]
    fn missing_button_defaults_to_left() {
        let cmd =
            Command::from_bytes(br#"{"type":"mouse_click","x":40.0,"y":30.0}"#).unwrap();
        assert_eq!(
            cmd,
            Command::MouseClick {
                x: 40.0,
                y: 30.0,
                button: MouseButton::Left,
            }
        );
    }

    #[test]
    fn unknown_type_tag_fails() {
        let err = Command::from_bytes(br#"{"type":"mouse_teleport","x":1,"y":2}"#).unwrap_err();
        assert!(matches!(err, CastError::MalformedCommand(_)));
    }

    #[test]
    fn garbage_bytes_fail() {
        assert!(Command::from_bytes(b"\x00\xffnot json").is_err());
    }
}

//! Input mapping — turns window events into wire commands.
//!
//! Pure state machine, no OS calls: the main loop feeds it window
//! events plus the current letterbox transform and forwards whatever
//! commands come out. Pointer events over the letterbox margins are
//! dropped, movement is throttled, and a held primary button turns
//! motion into drag segments.

use std::time::{Duration, Instant};

use rcast_core::{Command, MouseButton, transform::DisplayTransform};

use crate::window::{KeyInput, MouseBtn, WindowEvent};

/// Minimum interval between forwarded pointer moves.
const MOVE_THROTTLE: Duration = Duration::from_millis(50);

/// Control chords forwarded as key combinations instead of text.
const CTRL_CHORD_KEYS: &[char] = &['c', 'v', 'a', 'z', 'y'];

/// Stateful translator from [`WindowEvent`]s to [`Command`]s.
#[derive(Debug)]
pub struct InputMapper {
    /// Last pointer position in window coordinates.
    pointer: (f64, f64),
    dragging: bool,
    /// Remote-space position of the previous drag segment end.
    drag_prev: Option<(f64, f64)>,
    last_move_sent: Option<Instant>,
}

impl InputMapper {
    pub fn new() -> Self {
        Self {
            pointer: (0.0, 0.0),
            dragging: false,
            drag_prev: None,
            last_move_sent: None,
        }
    }

    /// Map one window event to at most one command.
    pub fn map(&mut self, event: &WindowEvent, transform: &DisplayTransform) -> Option<Command> {
        self.map_at(event, transform, Instant::now())
    }

    fn map_at(
        &mut self,
        event: &WindowEvent,
        transform: &DisplayTransform,
        now: Instant,
    ) -> Option<Command> {
        match event {
            WindowEvent::MouseMove(wx, wy) => {
                self.pointer = (*wx, *wy);
                let (rx, ry) = transform.window_to_remote(*wx, *wy)?;

                if self.dragging {
                    // Drag segments are never throttled; dropping one
                    // would skew the path.
                    let (px, py) = self.drag_prev.replace((rx, ry))?;
                    return Some(Command::MouseDrag {
                        x1: px,
                        y1: py,
                        x2: rx,
                        y2: ry,
                    });
                }

                if let Some(last) = self.last_move_sent {
                    if now.duration_since(last) < MOVE_THROTTLE {
                        return None;
                    }
                }
                self.last_move_sent = Some(now);
                Some(Command::MouseMove { x: rx, y: ry })
            }

            WindowEvent::MouseButton(MouseBtn::Left, true) => {
                let (wx, wy) = self.pointer;
                let (rx, ry) = transform.window_to_remote(wx, wy)?;
                self.dragging = true;
                self.drag_prev = Some((rx, ry));
                Some(Command::MouseClick {
                    x: rx,
                    y: ry,
                    button: MouseButton::Left,
                })
            }

            WindowEvent::MouseButton(MouseBtn::Left, false) => {
                self.dragging = false;
                self.drag_prev = None;
                None
            }

            WindowEvent::MouseButton(MouseBtn::Right, true) => {
                let (wx, wy) = self.pointer;
                let (rx, ry) = transform.window_to_remote(wx, wy)?;
                Some(Command::MouseClick {
                    x: rx,
                    y: ry,
                    button: MouseButton::Right,
                })
            }

            WindowEvent::MouseButton(MouseBtn::Right, false) => None,

            WindowEvent::Wheel(clicks) => {
                let (wx, wy) = self.pointer;
                let (rx, ry) = transform.window_to_remote(wx, wy)?;
                Some(Command::MouseScroll {
                    x: rx,
                    y: ry,
                    clicks: *clicks,
                })
            }

            WindowEvent::Key { key, ctrl } => self.map_key(key, *ctrl),

            WindowEvent::Close | WindowEvent::Resize(..) => None,
        }
    }

    fn map_key(&self, key: &KeyInput, ctrl: bool) -> Option<Command> {
        match key {
            KeyInput::Char(c) if ctrl && CTRL_CHORD_KEYS.contains(c) => {
                Some(Command::KeyCombination {
                    keys: vec!["ctrl".into(), c.to_string()],
                })
            }
            // Other ctrl-chords have no remote meaning; swallow them
            // rather than typing stray characters.
            KeyInput::Char(_) if ctrl => None,
            KeyInput::Char(c) => Some(Command::TypeText { text: c.to_string() }),
            KeyInput::Named(name) => Some(Command::KeyPress {
                key: (*name).into(),
            }),
        }
    }
}

impl Default for InputMapper {
    fn default() -> Self {
        Self::new()
    }
}

// ── Tests ────────────────────────────────────────────────────────

//! Command execution — maps wire commands onto an input backend.
//!
//! Incoming coordinates live in captured-frame space (the client sees
//! the scaled frame); the executor divides by the capture scale to
//! recover true screen pixels before injecting.

use std::time::Duration;

use crate::command::Command;
use crate::error::CastError;
use crate::input::InputBackend;

/// Duration a drag gesture is spread over when replayed.
const DRAG_DURATION: Duration = Duration::from_millis(100);

/// Dispatches [`Command`]s to an [`InputBackend`], undoing the
/// capture scale on every coordinate.
pub struct CommandExecutor<B> {
    backend: B,
    scale: f64,
}

impl<B: InputBackend> CommandExecutor<B> {
    /// `scale` is the server's capture scale in (0, 1].
    pub fn new(backend: B, scale: f64) -> Self {
        Self { backend, scale }
    }

    fn to_screen(&self, v: f64) -> i32 {
        (v / self.scale).round() as i32
    }

    /// Execute one command against the backend.
    pub fn execute(&self, command: &Command) -> Result<(), CastError> {
        match command {
            Command::MouseMove { x, y } => {
                self.backend.move_to(self.to_screen(*x), self.to_screen(*y))
            }
            Command::MouseClick { x, y, button } => {
                self.backend
                    .click(self.to_screen(*x), self.to_screen(*y), *button)
            }
            Command::MouseDrag { x1, y1, x2, y2 } => self.backend.drag(
                self.to_screen(*x1),
                self.to_screen(*y1),
                self.to_screen(*x2),
                self.to_screen(*y2),
                DRAG_DURATION,
            ),
            Command::MouseScroll { x, y, clicks } => {
                self.backend
                    .scroll(self.to_screen(*x), self.to_screen(*y), *clicks)
            }
            Command::KeyPress { key } => self.backend.key_press(key),
            Command::KeyCombination { keys } => self.backend.key_chord(keys),
            Command::TypeText { text } => self.backend.type_text(text),
            Command::DoubleClick { x, y } => {
                self.backend
                    .double_click(self.to_screen(*x), self.to_screen(*y))
            }
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::MouseButton;
    use std::sync::Mutex;

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        MoveTo(i32, i32),
        Click(i32, i32, MouseButton),
        DoubleClick(i32, i32),
        Drag(i32, i32, i32, i32),
        Scroll(i32, i32, i32),
        KeyPress(String),
        KeyChord(Vec<String>),
        TypeText(String),
    }

    #[derive(Default)]
    struct Recorder {
        calls: Mutex<Vec<Call>>,
    }

    impl Recorder {
        fn take(&self) -> Vec<Call> {
            std::mem::take(&mut self.calls.lock().unwrap())
        }
        fn push(&self, call: Call) -> Result<(), CastError> {
            self.calls.lock().unwrap().push(call);
            Ok(())
        }
    }

    impl InputBackend for &Recorder {
        fn move_to(&self, x: i32, y: i32) -> Result<(), CastError> {
            self.push(Call::MoveTo(x, y))
        }
        fn click(&self, x: i32, y: i32, button: MouseButton) -> Result<(), CastError> {
            self.push(Call::Click(x, y, button))
        }
        fn double_click(&self, x: i32, y: i32) -> Result<(), CastError> {
            self.push(Call::DoubleClick(x, y))
        }
        fn drag(
            &self,
            x1: i32,
            y1: i32,
            x2: i32,
            y2: i32,
            _duration: Duration,
        ) -> Result<(), CastError> {
            self.push(Call::Drag(x1, y1, x2, y2))
        }
        fn scroll(&self, x: i32, y: i32, clicks: i32) -> Result<(), CastError> {
            self.push(Call::Scroll(x, y, clicks))
        }
        fn key_press(&self, key: &str) -> Result<(), CastError> {
            self.push(Call::KeyPress(key.to_string()))
        }
        fn key_chord(&self, keys: &[String]) -> Result<(), CastError> {
            self.push(Call::KeyChord(keys.to_vec()))
        }
        fn type_text(&self, text: &str) -> Result<(), CastError> {
            self.push(Call::TypeText(text.to_string()))
        }
    }

    #[test]
    fn coordinates_are_divided_by_the_capture_scale() {
        let rec = Recorder::default();
        let exec = CommandExecutor::new(&rec, 0.5);

        exec.execute(&Command::MouseClick {
            x: 40.0,
            y: 30.0,
            button: MouseButton::Left,
        })
        .unwrap();

        assert_eq!(rec.take(), vec![Call::Click(80, 60, MouseButton::Left)]);
    }

    #[test]
    fn fractional_results_round_to_nearest() {
        let rec = Recorder::default();
        let exec = CommandExecutor::new(&rec, 0.3);

        exec.execute(&Command::MouseMove { x: 10.0, y: 20.0 }).unwrap();

        // 10 / 0.3 = 33.33 → 33, 20 / 0.3 = 66.67 → 67.
        assert_eq!(rec.take(), vec![Call::MoveTo(33, 67)]);
    }

    #[test]
    fn unit_scale_passes_coordinates_through() {
        let rec = Recorder::default();
        let exec = CommandExecutor::new(&rec, 1.0);

        exec.execute(&Command::DoubleClick { x: 7.0, y: 8.0 }).unwrap();
        exec.execute(&Command::MouseScroll {
            x: 3.0,
            y: 4.0,
            clicks: -2,
        })
        .unwrap();

        assert_eq!(
            rec.take(),
            vec![Call::DoubleClick(7, 8), Call::Scroll(3, 4, -2)]
        );
    }

    #[test]
    fn drag_scales_both_endpoints() {
        let rec = Recorder::default();
        let exec = CommandExecutor::new(&rec, 0.5);

        exec.execute(&Command::MouseDrag {
            x1: 10.0,
            y1: 20.0,
            x2: 30.0,
            y2: 40.0,
        })
        .unwrap();

        assert_eq!(rec.take(), vec![Call::Drag(20, 40, 60, 80)]);
    }

    #[test]
    fn keyboard_commands_bypass_scaling() {
        let rec = Recorder::default();
        let exec = CommandExecutor::new(&rec, 0.5);

        exec.execute(&Command::KeyPress { key: "enter".into() }).unwrap();
        exec.execute(&Command::KeyCombination {
            keys: vec!["ctrl".into(), "c".into()],
        })
        .unwrap();
        exec.execute(&Command::TypeText { text: "hello".into() }).unwrap();

        assert_eq!(
            rec.take(),
            vec![
                Call::KeyPress("enter".into()),
                Call::KeyChord(vec!["ctrl".into(), "c".into()]),
                Call::TypeText("hello".into()),
            ]
        );
    }
}

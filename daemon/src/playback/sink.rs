//! Input injection primitives and token replay

use std::thread;
use std::time::Duration;

use tracing::info;

use crate::action::{ActionToken, ClickKind, HeldKeys, Key};

/// OS input primitives consumed by playback
pub trait InputSink: Send {
    fn type_text(&mut self, text: &str);
    fn key_down(&mut self, key: Key);
    fn key_up(&mut self, key: Key);
    fn key_press(&mut self, key: Key);
    fn cursor_position(&self) -> (i32, i32);
    fn move_cursor(&mut self, x: i32, y: i32);
    fn click(&mut self, button: ClickKind);
    /// Width and height of the primary screen in pixels
    fn screen_size(&self) -> (i32, i32);
}

/// Screen geometry and cursor as last seen by playback
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScreenState {
    pub cursor: (i32, i32),
    pub screen: (i32, i32),
}

impl ScreenState {
    pub fn of(sink: &dyn InputSink) -> Self {
        Self {
            cursor: sink.cursor_position(),
            screen: sink.screen_size(),
        }
    }
}

/// Screen assumed by [`TracingSink`] unless configured
pub const DEFAULT_SCREEN_SIZE: (i32, i32) = (1920, 1080);

/// Dry-run sink that logs every primitive and tracks a virtual cursor
#[derive(Debug)]
pub struct TracingSink {
    cursor: (i32, i32),
    screen: (i32, i32),
}

impl TracingSink {
    pub fn new(screen: (i32, i32)) -> Self {
        Self {
            cursor: (0, 0),
            screen,
        }
    }
}

impl Default for TracingSink {
    fn default() -> Self {
        Self::new(DEFAULT_SCREEN_SIZE)
    }
}

impl InputSink for TracingSink {
    fn type_text(&mut self, text: &str) {
        info!(text, "type text");
    }

    fn key_down(&mut self, key: Key) {
        info!(%key, "key down");
    }

    fn key_up(&mut self, key: Key) {
        info!(%key, "key up");
    }

    fn key_press(&mut self, key: Key) {
        info!(%key, "key press");
    }

    fn cursor_position(&self) -> (i32, i32) {
        self.cursor
    }

    fn move_cursor(&mut self, x: i32, y: i32) {
        self.cursor = (x, y);
        info!(x, y, "move cursor");
    }

    fn click(&mut self, button: ClickKind) {
        info!(?button, "mouse click");
    }

    fn screen_size(&self) -> (i32, i32) {
        self.screen
    }
}

/// Replay tokens in order, blocking through delays.
///
/// Keys still held when the tokens run out are released, so a script may
/// write `+Shift` without a matching `-Shift`.
pub fn replay(tokens: &[ActionToken], sink: &mut dyn InputSink) {
    let mut held = HeldKeys::default();

    for token in tokens {
        match token {
            ActionToken::Text(text) => sink.type_text(text),
            ActionToken::Key(event) if event.held_down => {
                held.press(event.key);
                sink.key_down(event.key);
            }
            ActionToken::Key(event) if event.released => {
                held.release(event.key);
                sink.key_up(event.key);
            }
            ActionToken::Key(event) => sink.key_press(event.key),
            ActionToken::Mouse(mouse) => {
                if let Some((x, y)) = mouse.target(sink.cursor_position()) {
                    sink.move_cursor(x, y);
                }
                if let Some(button) = mouse.click {
                    sink.click(button);
                }
            }
            ActionToken::Delay(ms) => {
                if *ms > 0 {
                    thread::sleep(Duration::from_millis(*ms));
                }
            }
        }
    }

    for key in held.drain() {
        sink.key_up(key);
    }
}

#[cfg(test)]
pub(crate) mod recording {
    use std::sync::{Arc, Mutex};

    use super::*;

    /// A primitive call observed by [`RecordingSink`]
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum Call {
        Text(String),
        Down(Key),
        Up(Key),
        Press(Key),
        Move(i32, i32),
        Click(ClickKind),
    }

    /// Sink that records calls into a shared log
    #[derive(Debug, Clone, Default)]
    pub struct RecordingSink {
        pub calls: Arc<Mutex<Vec<Call>>>,
        pub cursor: (i32, i32),
        pub screen: (i32, i32),
    }

    impl RecordingSink {
        pub fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl InputSink for RecordingSink {
        fn type_text(&mut self, text: &str) {
            self.calls.lock().unwrap().push(Call::Text(text.to_string()));
        }
        fn key_down(&mut self, key: Key) {
            self.calls.lock().unwrap().push(Call::Down(key));
        }
        fn key_up(&mut self, key: Key) {
            self.calls.lock().unwrap().push(Call::Up(key));
        }
        fn key_press(&mut self, key: Key) {
            self.calls.lock().unwrap().push(Call::Press(key));
        }
        fn cursor_position(&self) -> (i32, i32) {
            self.cursor
        }
        fn move_cursor(&mut self, x: i32, y: i32) {
            self.cursor = (x, y);
            self.calls.lock().unwrap().push(Call::Move(x, y));
        }
        fn click(&mut self, button: ClickKind) {
            self.calls.lock().unwrap().push(Call::Click(button));
        }
        fn screen_size(&self) -> (i32, i32) {
            self.screen
        }
    }
}

#[cfg(test)]
mod tests {
    use super::recording::{Call, RecordingSink};
    use super::*;
    use crate::action::parse;

    fn replay_source(source: &str, sink: &mut RecordingSink) -> Vec<Call> {
        replay(&parse(source).unwrap(), sink);
        sink.calls()
    }

    #[test]
    fn test_replay_copy_shortcut_releases_control() {
        let mut sink = RecordingSink::default();
        let calls = replay_source("`foo` +Control C -Control", &mut sink);
        assert_eq!(
            calls,
            vec![
                Call::Text("foo".into()),
                Call::Down(Key::Control),
                Call::Press(Key::Letter('C')),
                Call::Up(Key::Control),
            ]
        );
    }

    #[test]
    fn test_replay_releases_keys_left_held() {
        let mut sink = RecordingSink::default();
        let calls = replay_source("Control Shift Tab", &mut sink);
        assert_eq!(
            calls,
            vec![
                Call::Down(Key::Control),
                Call::Down(Key::Shift),
                Call::Press(Key::Tab),
                Call::Up(Key::Control),
                Call::Up(Key::Shift),
            ]
        );
    }

    #[test]
    fn test_replay_mouse_relative_to_cursor() {
        let mut sink = RecordingSink {
            cursor: (100, 100),
            ..RecordingSink::default()
        };
        let calls = replay_source("<+10,-5,L> <20,> <,,R>", &mut sink);
        assert_eq!(
            calls,
            vec![
                Call::Move(110, 95),
                Call::Click(ClickKind::Left),
                Call::Move(20, 95),
                Call::Click(ClickKind::Right),
            ]
        );
    }

    #[test]
    fn test_tracing_sink_tracks_cursor() {
        let mut sink = TracingSink::new((800, 600));
        replay(&parse("<300,200> <-50,+25>").unwrap(), &mut sink);
        assert_eq!(
            ScreenState::of(&sink),
            ScreenState {
                cursor: (250, 225),
                screen: (800, 600),
            }
        );
        assert_eq!(TracingSink::default().screen_size(), DEFAULT_SCREEN_SIZE);
    }
}

//! Action tokens produced by the action script compiler

use std::fmt;

use super::keys::Key;

/// Mouse button clicked by a mouse action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickKind {
    Left,
    Middle,
    Right,
}

impl ClickKind {
    /// `L`, `M` or `R`, case-insensitive
    pub fn from_letter(letter: char) -> Option<Self> {
        match letter.to_ascii_uppercase() {
            'L' => Some(ClickKind::Left),
            'M' => Some(ClickKind::Middle),
            'R' => Some(ClickKind::Right),
            _ => None,
        }
    }
}

/// A key press, or the start/end of a key hold
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    pub key: Key,
    pub held_down: bool,
    pub released: bool,
}

impl KeyEvent {
    /// A bare key. Modifiers are held down; everything else is a one-shot press.
    pub fn tap(key: Key) -> Self {
        Self {
            key,
            held_down: key.is_modifier(),
            released: false,
        }
    }

    /// `+KEY`
    pub fn hold(key: Key) -> Self {
        Self {
            key,
            held_down: true,
            released: false,
        }
    }

    /// `-KEY`
    pub fn release(key: Key) -> Self {
        Self {
            key,
            held_down: false,
            released: true,
        }
    }

    #[cfg(test)]
    pub fn is_press(&self) -> bool {
        !self.held_down && !self.released
    }
}

/// Cursor movement and/or click. Each axis is absolute unless marked relative.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MouseAction {
    pub x: Option<i32>,
    pub y: Option<i32>,
    pub x_absolute: bool,
    pub y_absolute: bool,
    pub click: Option<ClickKind>,
}

impl MouseAction {
    /// Where the cursor should move given its current position, or `None`
    /// when neither coordinate is set.
    pub fn target(&self, cursor: (i32, i32)) -> Option<(i32, i32)> {
        if self.x.is_none() && self.y.is_none() {
            return None;
        }

        let resolve = |value: Option<i32>, absolute: bool, current: i32| match value {
            Some(v) if absolute => v,
            Some(v) => current.saturating_add(v),
            None => current,
        };

        Some((
            resolve(self.x, self.x_absolute, cursor.0),
            resolve(self.y, self.y_absolute, cursor.1),
        ))
    }
}

/// One step of an action script, replayed in order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionToken {
    /// Characters typed verbatim
    Text(String),
    Key(KeyEvent),
    Mouse(MouseAction),
    /// Pause before the next token; zero is a no-op
    Delay(u64),
}

impl fmt::Display for ActionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionToken::Text(text) => write!(f, "`{}`", text),
            ActionToken::Key(event) if event.held_down => write!(f, "+{}", event.key),
            ActionToken::Key(event) if event.released => write!(f, "-{}", event.key),
            ActionToken::Key(event) => write!(f, "{}", event.key),
            ActionToken::Mouse(mouse) => {
                let axis = |value: Option<i32>, absolute: bool| match value {
                    Some(v) if absolute => v.to_string(),
                    Some(v) => format!("{:+}", v),
                    None => String::new(),
                };
                write!(
                    f,
                    "<{},{}",
                    axis(mouse.x, mouse.x_absolute),
                    axis(mouse.y, mouse.y_absolute)
                )?;
                if let Some(click) = mouse.click {
                    write!(f, ",{:?}", click)?;
                }
                write!(f, ">")
            }
            ActionToken::Delay(ms) => write!(f, "{}ms", ms),
        }
    }
}

//! Key definitions and held-key tracking
//!
//! Provides the key names accepted in action scripts and a set for
//! tracking which keys playback is currently holding down.

use std::collections::BTreeSet;
use std::fmt;

/// A key the input sink can press, hold or release
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Key {
    Alt,
    Backspace,
    CapsLock,
    Control,
    Delete,
    Down,
    End,
    Enter,
    Escape,
    F1,
    F2,
    F3,
    F4,
    F5,
    F6,
    F7,
    F8,
    F9,
    F10,
    F11,
    F12,
    Home,
    Insert,
    Left,
    PageDown,
    PageUp,
    Right,
    Shift,
    Space,
    Super,
    Tab,
    Up,
    /// A letter key, stored uppercase
    Letter(char),
}

impl Key {
    /// Resolve a key name (case-insensitive, with common abbreviations)
    pub fn from_name(name: &str) -> Option<Self> {
        let lower = name.to_ascii_lowercase();
        let key = match lower.as_str() {
            "alt" => Key::Alt,
            "back" | "backspace" | "bksp" => Key::Backspace,
            "capslock" => Key::CapsLock,
            "control" | "ctrl" => Key::Control,
            "del" | "delete" => Key::Delete,
            "down" => Key::Down,
            "end" => Key::End,
            "enter" => Key::Enter,
            "esc" | "escape" => Key::Escape,
            "f1" => Key::F1,
            "f2" => Key::F2,
            "f3" => Key::F3,
            "f4" => Key::F4,
            "f5" => Key::F5,
            "f6" => Key::F6,
            "f7" => Key::F7,
            "f8" => Key::F8,
            "f9" => Key::F9,
            "f10" => Key::F10,
            "f11" => Key::F11,
            "f12" => Key::F12,
            "home" => Key::Home,
            "insert" => Key::Insert,
            "left" => Key::Left,
            "pagedown" | "pgdn" => Key::PageDown,
            "pageup" | "pgup" => Key::PageUp,
            "right" => Key::Right,
            "shift" => Key::Shift,
            "space" => Key::Space,
            "super" | "win" | "cmd" => Key::Super,
            "tab" => Key::Tab,
            "up" => Key::Up,
            _ => {
                let mut chars = lower.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) if c.is_ascii_alphabetic() => {
                        Key::Letter(c.to_ascii_uppercase())
                    }
                    _ => return None,
                }
            }
        };
        Some(key)
    }

    /// Control, Alt and Shift default to being held when pressed bare
    pub fn is_modifier(self) -> bool {
        matches!(self, Key::Control | Key::Alt | Key::Shift)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Letter(c) => write!(f, "{}", c),
            other => write!(f, "{:?}", other),
        }
    }
}

/// Tracks which keys are currently held down
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeldKeys {
    keys: BTreeSet<Key>,
}

impl HeldKeys {
    /// Mark a key as held; returns false if it already was
    pub fn press(&mut self, key: Key) -> bool {
        self.keys.insert(key)
    }

    /// Mark a key as released; returns false if it was not held
    pub fn release(&mut self, key: Key) -> bool {
        self.keys.remove(&key)
    }

    #[cfg(test)]
    pub fn contains(&self, key: Key) -> bool {
        self.keys.contains(&key)
    }

    /// Check if all keys are released
    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Take every key still held, leaving the set empty
    pub fn drain(&mut self) -> Vec<Key> {
        std::mem::take(&mut self.keys).into_iter().collect()
    }
}

//! Named callbacks a command can invoke
//!
//! Handlers are registered by name once at startup and resolved when a
//! definitions file is compiled. Each receives the session and the
//! recognized phrase as lowercased words.

use std::collections::HashMap;
use std::fmt;

use tracing::{info, warn};

use super::numbers::{read_integer, read_number, read_trailing_number};
use super::Session;
use crate::action::{ActionToken, ClickKind, Key, KeyEvent, MouseAction};
use crate::playback::PlaybackError;
use crate::state::ActivationError;

/// Upper bound on any spoken count that replays or presses something
pub const MAX_REPEAT: i64 = 100;

/// Signature shared by every callback
pub type Handler = fn(&mut Session, &[String]) -> Result<(), FunctionError>;

/// A resolved callback
#[derive(Clone, Copy)]
pub struct Callback {
    pub name: &'static str,
    pub handler: Handler,
}

impl fmt::Debug for Callback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Callback").field(&self.name).finish()
    }
}

/// Errors raised by callbacks. Logged by the dispatcher, never fatal.
#[derive(Debug, thiserror::Error)]
pub enum FunctionError {
    #[error("phrase has no word at position {index}")]
    MissingWord { index: usize },

    #[error("no mode named `{name}`")]
    UnknownMode { name: String },

    #[error("unknown direction `{word}`")]
    UnknownDirection { word: String },

    #[error("unknown symbol `{word}`")]
    UnknownSymbol { word: String },

    #[error("unknown mouse grid section `{word}`")]
    UnknownGridSection { word: String },

    #[error(transparent)]
    Activation(#[from] ActivationError),

    #[error(transparent)]
    Playback(#[from] PlaybackError),
}

/// Name to handler lookup
#[derive(Clone, Default)]
pub struct FunctionRegistry {
    handlers: HashMap<&'static str, Handler>,
}

impl FunctionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every built-in callback
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register("voice_code_mute", voice_code_mute);
        registry.register("change_mode", change_mode);
        registry.register("exit_mode", exit_mode);
        registry.register("switch_sibling_mode", switch_sibling_mode);
        registry.register("enter_exclusive_mode", enter_exclusive_mode);
        registry.register("exit_exclusive_mode", exit_exclusive_mode);
        registry.register("reload_definitions", reload_definitions);
        registry.register("repeat_action", repeat_action);
        registry.register("emit_dictation", emit_dictation);
        registry.register("emit_spelled_word", emit_spelled_word);
        registry.register("emit_keys", emit_keys);
        registry.register("emit_camel_case", emit_camel_case);
        registry.register("emit_pascal_case", emit_pascal_case);
        registry.register("emit_integer", emit_integer);
        registry.register("mouse_move", mouse_move);
        registry.register("mouse_click", mouse_click);
        registry.register("mouse_grid", mouse_grid);
        registry.register("print_mouse_coordinates", print_mouse_coordinates);
        registry.register("go_to_line", go_to_line);
        registry.register("change_mode_navigate", change_mode_navigate);
        registry.register("symbol_emit", symbol_emit);
        registry.register("emit_keyword", emit_keyword);
        registry.register("emit_primitive", emit_primitive);
        registry.register("create_new_field_or_method", create_new_field_or_method);
        registry.register("choose_offset", choose_offset);
        registry.register("emit_string_literal", emit_string_literal);
        registry.register("emit_string_interpolation", emit_string_interpolation);
        registry.register("change_window", change_window);
        registry
    }

    pub fn register(&mut self, name: &'static str, handler: Handler) {
        self.handlers.insert(name, handler);
    }

    pub fn resolve(&self, name: &str) -> Option<Callback> {
        self.handlers
            .get_key_value(name)
            .map(|(name, handler)| Callback {
                name: *name,
                handler: *handler,
            })
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = self.handlers.keys().copied().collect();
        names.sort_unstable();
        names
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl fmt::Debug for FunctionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.names()).finish()
    }
}

fn word_at(words: &[String], index: usize) -> Result<&str, FunctionError> {
    words
        .get(index)
        .map(String::as_str)
        .ok_or(FunctionError::MissingWord { index })
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Clamp a spoken count to `0..=MAX_REPEAT`
fn capped_count(count: i64, function: &'static str) -> usize {
    if count > MAX_REPEAT {
        warn!(function, count, max = MAX_REPEAT, "spoken count too large, capping");
    }
    count.clamp(0, MAX_REPEAT) as usize
}

fn tap(key: Key) -> ActionToken {
    ActionToken::Key(KeyEvent::tap(key))
}

fn text(value: String) -> Vec<ActionToken> {
    if value.is_empty() {
        Vec::new()
    } else {
        vec![ActionToken::Text(value)]
    }
}

// Core

/// `voice code start` unmutes; any other third word mutes
fn voice_code_mute(session: &mut Session, words: &[String]) -> Result<(), FunctionError> {
    let word = word_at(words, 2)?;
    session.set_muted(word != "start");
    Ok(())
}

fn change_mode(session: &mut Session, words: &[String]) -> Result<(), FunctionError> {
    let name = word_at(words, 2)?;
    // Navigation failures are logged by the engine and change nothing
    let _ = session.engine_mut().change_mode(name);
    Ok(())
}

fn exit_mode(session: &mut Session, _words: &[String]) -> Result<(), FunctionError> {
    let _ = session.engine_mut().exit_mode();
    Ok(())
}

fn switch_sibling_mode(session: &mut Session, words: &[String]) -> Result<(), FunctionError> {
    let name = word_at(words, 2)?;
    let engine = session.engine_mut();
    let _ = engine.exit_mode();
    let _ = engine.change_mode(name);
    Ok(())
}

/// The target mode is named by the last word of the phrase
fn enter_exclusive_mode(session: &mut Session, words: &[String]) -> Result<(), FunctionError> {
    let name = word_at(words, words.len().saturating_sub(1))?;
    let engine = session.engine_mut();
    let target = engine
        .tree()
        .find_by_name(name)
        .ok_or_else(|| FunctionError::UnknownMode {
            name: name.to_string(),
        })?;
    engine.enter_exclusive_mode(target)?;
    Ok(())
}

fn exit_exclusive_mode(session: &mut Session, _words: &[String]) -> Result<(), FunctionError> {
    let engine = session.engine_mut();
    let target = engine
        .exclusive_target()
        .ok_or(ActivationError::ExclusiveNotActive)?;
    engine.exit_exclusive_mode(target)?;
    Ok(())
}

/// Deferred until the callback returns, since reloading replaces the tree
fn reload_definitions(session: &mut Session, _words: &[String]) -> Result<(), FunctionError> {
    session.request_reload();
    Ok(())
}

/// Replay the last action sequence so it has run N times in total
fn repeat_action(session: &mut Session, words: &[String]) -> Result<(), FunctionError> {
    let Some(times) = read_trailing_number(words) else {
        return Ok(());
    };
    for _ in 1..capped_count(times, "repeat_action") {
        session.repeat_last()?;
    }
    Ok(())
}

fn emit_dictation(session: &mut Session, words: &[String]) -> Result<(), FunctionError> {
    let dictated = words.get(1..).unwrap_or_default().join(" ");
    session.emit(text(dictated))?;
    Ok(())
}

/// First letter of each word; `capital` uppercases the next letter
fn emit_spelled_word(session: &mut Session, words: &[String]) -> Result<(), FunctionError> {
    let mut spelled = String::new();
    let mut upper = false;

    for word in words.iter().skip(1) {
        if word == "capital" {
            upper = true;
            continue;
        }
        if let Some(first) = word.chars().next() {
            if upper {
                spelled.extend(first.to_uppercase());
            } else {
                spelled.push(first);
            }
        }
        upper = false;
    }

    session.emit(text(spelled))?;
    Ok(())
}

/// Press every word that names a key; remembered for `repeat_action`
fn emit_keys(session: &mut Session, words: &[String]) -> Result<(), FunctionError> {
    let keys: Vec<ActionToken> = words
        .iter()
        .filter_map(|word| Key::from_name(word))
        .map(|key| ActionToken::Key(KeyEvent::tap(key)))
        .collect();

    if !keys.is_empty() {
        session.send_actions(keys)?;
    }
    Ok(())
}

fn emit_camel_case(session: &mut Session, words: &[String]) -> Result<(), FunctionError> {
    let mut out = word_at(words, 1)?.to_string();
    for word in words.iter().skip(2) {
        out.push_str(&capitalize(word));
    }
    session.emit(text(out))?;
    Ok(())
}

fn emit_pascal_case(session: &mut Session, words: &[String]) -> Result<(), FunctionError> {
    let out: String = words.iter().skip(1).map(|w| capitalize(w)).collect();
    session.emit(text(out))?;
    Ok(())
}

fn emit_integer(session: &mut Session, words: &[String]) -> Result<(), FunctionError> {
    let (value, _) = read_integer(words, 1);
    session.emit(text(value.to_string()))?;
    Ok(())
}

// Mouse

/// `mouse <up|down> [left|right] N` or `mouse <left|right> N`, in pixels
fn mouse_move(session: &mut Session, words: &[String]) -> Result<(), FunctionError> {
    let first = word_at(words, 1)?;
    let vertical = match first {
        "up" => Some(-1),
        "down" => Some(1),
        _ => None,
    };
    let horizontal_word = if vertical.is_some() {
        words.get(2).map(String::as_str)
    } else {
        Some(first)
    };
    let horizontal = match horizontal_word {
        Some("left") => Some(-1),
        Some("right") => Some(1),
        _ => None,
    };

    let amount_start = match (vertical, horizontal) {
        (None, None) => {
            return Err(FunctionError::UnknownDirection {
                word: first.to_string(),
            })
        }
        (Some(_), Some(_)) => 3,
        _ => 2,
    };
    let (amount, _) = read_number(words, amount_start);
    let amount = i32::try_from(amount).unwrap_or(i32::MAX);

    session.emit(vec![ActionToken::Mouse(MouseAction {
        x: Some(horizontal.unwrap_or(0) * amount),
        y: Some(vertical.unwrap_or(0) * amount),
        x_absolute: false,
        y_absolute: false,
        click: None,
    })])?;
    Ok(())
}

/// `click` left-clicks, `click right` right-clicks, any other word double-clicks
fn mouse_click(session: &mut Session, words: &[String]) -> Result<(), FunctionError> {
    let click = |button| {
        ActionToken::Mouse(MouseAction {
            x: None,
            y: None,
            x_absolute: true,
            y_absolute: true,
            click: Some(button),
        })
    };

    let tokens = match words.get(1).map(String::as_str) {
        Some("right") => vec![click(ClickKind::Right)],
        Some(_) => vec![
            click(ClickKind::Left),
            ActionToken::Delay(100),
            click(ClickKind::Left),
        ],
        None => vec![click(ClickKind::Left)],
    };
    session.emit(tokens)?;
    Ok(())
}

/// Halve the screen into quadrants once per section word (`one` and `two`
/// on top, `three` and `four` below), then center the cursor on the result
fn mouse_grid(session: &mut Session, words: &[String]) -> Result<(), FunctionError> {
    let (mut width, mut height) = session.screen_state().screen;
    let (mut x, mut y) = (0, 0);

    for section in words.iter().skip(1) {
        let (half_width, half_height) = (width / 2, height / 2);
        (x, y) = match section.as_str() {
            "one" => (x, y),
            "two" => (x + half_width, y),
            "three" => (x, y + half_height),
            "four" => (x + half_width, y + half_height),
            other => {
                return Err(FunctionError::UnknownGridSection {
                    word: other.to_string(),
                })
            }
        };
        width = half_width;
        height = half_height;
    }

    session.emit(vec![ActionToken::Mouse(MouseAction {
        x: Some(x + width / 2),
        y: Some(y + height / 2),
        x_absolute: true,
        y_absolute: true,
        click: None,
    })])?;
    Ok(())
}

fn print_mouse_coordinates(session: &mut Session, _words: &[String]) -> Result<(), FunctionError> {
    let (x, y) = session.screen_state().cursor;
    info!(x, y, "<{}, {}>", x, y);
    Ok(())
}

// Navigation

/// `go to line N`: open the editor's go-to-line prompt and submit N
fn go_to_line(session: &mut Session, words: &[String]) -> Result<(), FunctionError> {
    let (line, _) = read_number(words, 3);
    session.emit(vec![
        ActionToken::Key(KeyEvent::hold(Key::Control)),
        tap(Key::Letter('G')),
        ActionToken::Key(KeyEvent::release(Key::Control)),
        ActionToken::Delay(500),
        ActionToken::Text(line.to_string()),
        tap(Key::Enter),
    ])?;
    Ok(())
}

// Code

fn change_mode_navigate(session: &mut Session, _words: &[String]) -> Result<(), FunctionError> {
    let _ = session.engine_mut().change_mode("navigate");
    Ok(())
}

/// `<prefix> NAME`, or `<prefix> bit <and|or>` for the single-character
/// operators. Paired brackets leave the caret between them where noted.
fn symbol_emit(session: &mut Session, words: &[String]) -> Result<(), FunctionError> {
    if words.len() == 3 {
        let symbol = if words[2] == "and" { "&" } else { "|" };
        session.emit(text(symbol.to_string()))?;
        return Ok(());
    }

    let name = word_at(words, 1)?;
    let (symbol, caret_inside) = match name {
        "array" => ("[]", false),
        "index" => ("[]", true),
        "generic" => ("<>", true),
        "paren" => ("()", false),
        "braces" => ("{}", false),
        "and" => ("&&", false),
        "or" => ("||", false),
        "not" => ("!", false),
        "complement" => ("~", false),
        "plus" => ("+", false),
        "minus" => ("-", false),
        "star" => ("*", false),
        "divide" => ("/", false),
        "comma" => (",", false),
        "percent" => ("%", false),
        "backslash" => ("\\", false),
        "colon" => (":", false),
        "pipe" => ("|", false),
        "caret" => ("^", false),
        other => {
            return Err(FunctionError::UnknownSymbol {
                word: other.to_string(),
            })
        }
    };

    let mut tokens = text(symbol.to_string());
    if caret_inside {
        tokens.push(tap(Key::Left));
    }
    session.emit(tokens)?;
    Ok(())
}

fn emit_keyword(session: &mut Session, words: &[String]) -> Result<(), FunctionError> {
    let keyword = word_at(words, 1)?.to_string();
    session.emit(text(keyword))?;
    Ok(())
}

/// `<prefix> you N` types the unsigned form `uN`
fn emit_primitive(session: &mut Session, words: &[String]) -> Result<(), FunctionError> {
    let first = word_at(words, 1)?;
    let primitive = if first == "you" {
        format!("u{}", word_at(words, 2)?)
    } else {
        first.to_string()
    };
    session.emit(text(primitive))?;
    Ok(())
}

/// Everything after the first word, followed by a space
fn create_new_field_or_method(session: &mut Session, words: &[String]) -> Result<(), FunctionError> {
    let mut declaration = words.get(1..).unwrap_or_default().join(" ");
    declaration.push(' ');
    session.emit(text(declaration))?;
    Ok(())
}

/// Move down N entries of a completion list and accept
fn choose_offset(session: &mut Session, words: &[String]) -> Result<(), FunctionError> {
    let (offset, _) = read_number(words, 1);
    let mut tokens = vec![tap(Key::Down); capped_count(offset, "choose_offset")];
    tokens.push(tap(Key::Enter));
    session.emit(tokens)?;
    Ok(())
}

fn emit_string_literal(session: &mut Session, _words: &[String]) -> Result<(), FunctionError> {
    session.emit(vec![ActionToken::Text("\"\"".to_string()), tap(Key::Left)])?;
    Ok(())
}

fn emit_string_interpolation(session: &mut Session, _words: &[String]) -> Result<(), FunctionError> {
    session.emit(vec![ActionToken::Text("$\"\"".to_string()), tap(Key::Left)])?;
    Ok(())
}

// System

/// Hold Alt and press Tab N times (once when no number is spoken)
fn change_window(session: &mut Session, words: &[String]) -> Result<(), FunctionError> {
    let presses = capped_count(read_trailing_number(words).unwrap_or(1), "change_window");

    let mut tokens = vec![
        ActionToken::Key(KeyEvent::hold(Key::Alt)),
        ActionToken::Delay(50),
    ];
    for _ in 0..presses {
        tokens.push(tap(Key::Tab));
        tokens.push(ActionToken::Delay(50));
    }
    tokens.push(ActionToken::Key(KeyEvent::release(Key::Alt)));
    session.emit(tokens)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_names() {
        let registry = FunctionRegistry::builtin();
        assert_eq!(registry.len(), 28);
        assert!(registry.resolve("change_mode").is_some());
        assert!(registry.resolve("ChangeMode").is_none());
        assert!(registry.resolve("").is_none());
        assert_eq!(registry.names()[0], "change_mode");
    }

    #[test]
    fn test_resolve_keeps_name() {
        let registry = FunctionRegistry::builtin();
        let callback = registry.resolve("mouse_click").unwrap();
        assert_eq!(callback.name, "mouse_click");
        assert_eq!(format!("{:?}", callback), "Callback(\"mouse_click\")");
    }

    #[test]
    fn test_capped_count() {
        assert_eq!(capped_count(3, "test"), 3);
        assert_eq!(capped_count(-4, "test"), 0);
        assert_eq!(capped_count(MAX_REPEAT + 1, "test"), 100);
        assert_eq!(capped_count(i64::MAX, "test"), 100);
    }

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("hello"), "Hello");
        assert_eq!(capitalize("x"), "X");
        assert_eq!(capitalize(""), "");
    }
}

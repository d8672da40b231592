//! Action script scanner
//!
//! Tokens are not whitespace-delimited (`+Control C{3}<+10,-5,L>200`), so
//! this is a single pass over characters with manual index control rather
//! than a separate tokenizer.

use super::keys::Key;
use super::token::{ActionToken, ClickKind, KeyEvent, MouseAction};

/// Errors produced while compiling an action script
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ActionError {
    #[error("missing closing ` for text starting at offset {offset}")]
    UnterminatedText { offset: usize },

    #[error("expected a key name at offset {offset}")]
    MissingKeyName { offset: usize },

    #[error("unknown key `{name}`")]
    UnknownKey { name: String },

    #[error("expected ',' after mouse X coordinate at offset {offset}")]
    MissingMouseComma { offset: usize },

    #[error("expected '>' to close mouse action at offset {offset}")]
    UnclosedMouse { offset: usize },

    #[error("expected a click type at offset {offset}")]
    MissingClick { offset: usize },

    #[error("unknown mouse click `{letter}`")]
    UnknownClick { letter: char },

    #[error("repeat at offset {offset} has no preceding action")]
    DanglingRepeat { offset: usize },

    #[error("expected a repeat count at offset {offset}")]
    MissingRepeatCount { offset: usize },

    #[error("repeat count must be at least 1")]
    ZeroRepeat,

    #[error("expected closing '}}' after repeat count at offset {offset}")]
    UnclosedRepeat { offset: usize },

    #[error("number `{digits}` is out of range")]
    NumberOutOfRange { digits: String },

    #[error("unexpected character {character:?} at offset {offset}")]
    UnexpectedCharacter { character: char, offset: usize },
}

/// Compile an action script into tokens, in replay order.
pub fn parse(source: &str) -> Result<Vec<ActionToken>, ActionError> {
    Scanner {
        chars: source.chars().collect(),
        index: 0,
        tokens: Vec::new(),
    }
    .run()
}

struct Scanner {
    chars: Vec<char>,
    index: usize,
    tokens: Vec<ActionToken>,
}

impl Scanner {
    fn run(mut self) -> Result<Vec<ActionToken>, ActionError> {
        while let Some(c) = self.peek() {
            match c {
                '`' => {
                    self.index += 1;
                    self.text()?;
                }
                '+' | '-' => {
                    self.index += 1;
                    let key = self.key()?;
                    self.tokens.push(ActionToken::Key(if c == '+' {
                        KeyEvent::hold(key)
                    } else {
                        KeyEvent::release(key)
                    }));
                }
                '{' => {
                    self.index += 1;
                    self.repeat()?;
                }
                '<' => {
                    self.index += 1;
                    self.mouse()?;
                }
                c if c.is_whitespace() => self.index += 1,
                c if c.is_ascii_digit() => {
                    let delay = self.number::<u64>()?;
                    self.tokens.push(ActionToken::Delay(delay));
                }
                c if c.is_alphanumeric() => {
                    let key = self.key()?;
                    self.tokens.push(ActionToken::Key(KeyEvent::tap(key)));
                }
                character => {
                    return Err(ActionError::UnexpectedCharacter {
                        character,
                        offset: self.index,
                    })
                }
            }
        }

        Ok(self.tokens)
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.index).copied()
    }

    /// Consume `expected` if it is the next character
    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.index += 1;
            true
        } else {
            false
        }
    }

    fn skip_spaces(&mut self) {
        while self.peek().is_some_and(|c| c == ' ' || c == '\t') {
            self.index += 1;
        }
    }

    /// Literal text up to the next unescaped backtick; "\`" embeds one
    fn text(&mut self) -> Result<(), ActionError> {
        let offset = self.index - 1;
        let mut text = String::new();

        loop {
            match self.peek() {
                None => return Err(ActionError::UnterminatedText { offset }),
                Some('`') => {
                    self.index += 1;
                    break;
                }
                Some('\\') if self.chars.get(self.index + 1) == Some(&'`') => {
                    text.push('`');
                    self.index += 2;
                }
                Some(c) => {
                    text.push(c);
                    self.index += 1;
                }
            }
        }

        if !text.is_empty() {
            self.tokens.push(ActionToken::Text(text));
        }
        Ok(())
    }

    /// A key name: letters and digits, so `F12` stays one name
    fn key(&mut self) -> Result<Key, ActionError> {
        let offset = self.index;
        let mut name = String::new();
        while let Some(c) = self.peek().filter(|c| c.is_alphanumeric()) {
            name.push(c);
            self.index += 1;
        }

        if name.is_empty() {
            return Err(ActionError::MissingKeyName { offset });
        }
        Key::from_name(&name).ok_or(ActionError::UnknownKey { name })
    }

    fn digits(&mut self) -> String {
        let mut digits = String::new();
        while let Some(c) = self.peek().filter(char::is_ascii_digit) {
            digits.push(c);
            self.index += 1;
        }
        digits
    }

    /// A run of decimal digits; the caller has checked one is present
    fn number<T: std::str::FromStr>(&mut self) -> Result<T, ActionError> {
        let digits = self.digits();
        digits
            .parse()
            .map_err(|_| ActionError::NumberOutOfRange { digits })
    }

    /// `{N}`: the previous token N times in total
    fn repeat(&mut self) -> Result<(), ActionError> {
        let offset = self.index - 1;
        let Some(previous) = self.tokens.last().cloned() else {
            return Err(ActionError::DanglingRepeat { offset });
        };

        if !self.peek().is_some_and(|c| c.is_ascii_digit()) {
            return Err(ActionError::MissingRepeatCount { offset: self.index });
        }
        let count = self.number::<usize>()?;
        if !self.eat('}') {
            return Err(ActionError::UnclosedRepeat { offset: self.index });
        }
        if count == 0 {
            return Err(ActionError::ZeroRepeat);
        }

        self.tokens
            .extend(std::iter::repeat(previous).take(count - 1));
        Ok(())
    }

    /// `<[+|-]X,[+|-]Y[,C]>`
    fn mouse(&mut self) -> Result<(), ActionError> {
        self.skip_spaces();
        let (x, x_absolute) = self.coordinate()?;
        self.skip_spaces();
        if !self.eat(',') {
            return Err(ActionError::MissingMouseComma { offset: self.index });
        }

        self.skip_spaces();
        let (y, y_absolute) = self.coordinate()?;
        self.skip_spaces();

        let click = if self.eat(',') {
            self.skip_spaces();
            Some(self.click()?)
        } else {
            None
        };

        self.skip_spaces();
        if !self.eat('>') {
            return Err(ActionError::UnclosedMouse { offset: self.index });
        }

        self.tokens.push(ActionToken::Mouse(MouseAction {
            x,
            y,
            x_absolute,
            y_absolute,
            click,
        }));
        Ok(())
    }

    /// Optional sign (marks the axis relative) and optional value
    fn coordinate(&mut self) -> Result<(Option<i32>, bool), ActionError> {
        let sign = match self.peek() {
            Some('+') => Some(1),
            Some('-') => Some(-1),
            _ => None,
        };
        if sign.is_some() {
            self.index += 1;
        }

        let value = if self.peek().is_some_and(|c| c.is_ascii_digit()) {
            Some(self.number::<i32>()? * sign.unwrap_or(1))
        } else {
            None
        };

        Ok((value, sign.is_none()))
    }

    fn click(&mut self) -> Result<ClickKind, ActionError> {
        let letter = self.peek().ok_or(ActionError::MissingClick { offset: self.index })?;
        self.index += 1;
        ClickKind::from_letter(letter).ok_or(ActionError::UnknownClick { letter })
    }
}

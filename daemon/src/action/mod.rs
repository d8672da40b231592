//! Action script compiler
//!
//! Compiles scripts such as `` `foo` +Control C -Control <+10,-5,L> 200 ``
//! into an ordered list of [`ActionToken`]s for playback.

mod keys;
mod parser;
mod token;

pub use keys::{HeldKeys, Key};
pub use parser::{parse, ActionError};
pub use token::{ActionToken, ClickKind, KeyEvent, MouseAction};

//! Recognition engine seam
//!
//! The speech engine consumes compiled matchers and reports which grammar a
//! phrase matched. Grammars are loaded once per definitions load and then
//! only toggled on and off by the activation engine.

mod emulator;

use std::fmt;

use crate::grammar::Matcher;

pub use emulator::Emulator;

/// Identifier of a compiled grammar, unique within one definitions load
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GrammarId(pub usize);

impl fmt::Display for GrammarId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "g{}", self.0)
    }
}

/// A speech engine holding loaded grammars with per-grammar enable flags
pub trait RecognitionEngine: Send {
    /// Load a grammar; it starts disabled
    fn load_grammar(&mut self, id: GrammarId, matcher: Matcher);

    /// Drop every loaded grammar
    fn unload_all(&mut self);

    /// Toggle a grammar. Unknown ids are ignored.
    fn set_enabled(&mut self, id: GrammarId, enabled: bool);

    fn is_enabled(&self, id: GrammarId) -> bool;

    /// Every enabled grammar, in load order
    fn enabled(&self) -> Vec<GrammarId>;

    /// The grammar a phrase matches, if any enabled grammar accepts it
    fn recognize(&self, phrase: &str) -> Option<GrammarId>;
}

//! Text-driven recognition engine
//!
//! Feeds typed phrases through the loaded matchers instead of audio. Used
//! for offline verification of definitions and for live input from stdin.

use tracing::{debug, trace};

use super::{GrammarId, RecognitionEngine};
use crate::grammar::Matcher;

struct LoadedGrammar {
    id: GrammarId,
    matcher: Matcher,
    enabled: bool,
}

/// Emulated engine matching whitespace-split, case-insensitive words
#[derive(Default)]
pub struct Emulator {
    grammars: Vec<LoadedGrammar>,
}

impl Emulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of loaded grammars
    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.grammars.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.grammars.is_empty()
    }
}

impl RecognitionEngine for Emulator {
    fn load_grammar(&mut self, id: GrammarId, matcher: Matcher) {
        trace!(%id, "grammar loaded");
        self.grammars.push(LoadedGrammar {
            id,
            matcher,
            enabled: false,
        });
    }

    fn unload_all(&mut self) {
        debug!(count = self.grammars.len(), "unloading grammars");
        self.grammars.clear();
    }

    fn set_enabled(&mut self, id: GrammarId, enabled: bool) {
        if let Some(grammar) = self.grammars.iter_mut().find(|g| g.id == id) {
            grammar.enabled = enabled;
        }
    }

    fn is_enabled(&self, id: GrammarId) -> bool {
        self.grammars.iter().any(|g| g.id == id && g.enabled)
    }

    fn enabled(&self) -> Vec<GrammarId> {
        self.grammars
            .iter()
            .filter(|g| g.enabled)
            .map(|g| g.id)
            .collect()
    }

    fn recognize(&self, phrase: &str) -> Option<GrammarId> {
        let words: Vec<&str> = phrase.split_whitespace().collect();
        if words.is_empty() {
            return None;
        }

        self.grammars
            .iter()
            .filter(|g| g.enabled)
            .find(|g| g.matcher.matches(&words))
            .map(|g| g.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::{parse, Definitions};

    fn matcher(source: &str) -> Matcher {
        Matcher::compile(&parse(source, &Definitions::with_builtins()).unwrap())
    }

    #[test]
    fn test_grammars_load_disabled() {
        let mut engine = Emulator::new();
        engine.load_grammar(GrammarId(0), matcher("hello"));
        assert_eq!(engine.len(), 1);
        assert!(!engine.is_enabled(GrammarId(0)));
        assert_eq!(engine.recognize("hello"), None);

        engine.set_enabled(GrammarId(0), true);
        assert_eq!(engine.recognize("Hello"), Some(GrammarId(0)));
        assert_eq!(engine.enabled(), vec![GrammarId(0)]);
    }

    #[test]
    fn test_first_loaded_match_wins() {
        let mut engine = Emulator::new();
        engine.load_grammar(GrammarId(0), matcher("go $dictate"));
        engine.load_grammar(GrammarId(1), matcher("go home"));
        engine.set_enabled(GrammarId(0), true);
        engine.set_enabled(GrammarId(1), true);
        assert_eq!(engine.recognize("go home"), Some(GrammarId(0)));

        engine.set_enabled(GrammarId(0), false);
        assert_eq!(engine.recognize("go home"), Some(GrammarId(1)));
    }

    #[test]
    fn test_blank_phrase_and_unload() {
        let mut engine = Emulator::new();
        engine.load_grammar(GrammarId(3), matcher("[ please ] stop"));
        engine.set_enabled(GrammarId(3), true);
        assert_eq!(engine.recognize("   "), None);
        assert_eq!(engine.recognize("please   stop"), Some(GrammarId(3)));

        engine.unload_all();
        assert!(engine.is_empty());
        assert!(engine.enabled().is_empty());
        assert_eq!(engine.recognize("stop"), None);
    }
}

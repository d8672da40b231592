//! Vendor-neutral matcher form of a compiled grammar
//!
//! Recognition engines consume [`Matcher`] values. The same structure can
//! also match a word list directly, which the offline recognizer uses.

use std::collections::BTreeSet;

use super::node::{GrammarNode, Repeat};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchElement {
    /// A literal word with repeat bounds
    Phrase { text: String, repeat: Repeat },
    /// Open dictation
    Dictation,
    /// Any utterance span
    Wildcard,
    /// Alternation over independently compiled matchers
    Alternatives {
        options: Vec<Matcher>,
        repeat: Repeat,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Matcher {
    elements: Vec<MatchElement>,
}

impl Matcher {
    /// Compile a grammar sequence, node by node
    pub fn compile(sequence: &[GrammarNode]) -> Self {
        let elements = sequence
            .iter()
            .map(|node| {
                debug_assert!(node.is_valid(), "grammar node incorrectly constructed");
                match node {
                    GrammarNode::Literal { text, repeat } => MatchElement::Phrase {
                        text: text.clone(),
                        repeat: *repeat,
                    },
                    GrammarNode::Dictation => MatchElement::Dictation,
                    GrammarNode::Wildcard => MatchElement::Wildcard,
                    GrammarNode::Choice {
                        alternatives,
                        repeat,
                    } => MatchElement::Alternatives {
                        options: alternatives.iter().map(|seq| Matcher::compile(seq)).collect(),
                        repeat: *repeat,
                    },
                }
            })
            .collect();

        Self { elements }
    }

    #[cfg(test)]
    pub fn elements(&self) -> &[MatchElement] {
        &self.elements
    }

    /// Whether the whole word list is accepted (case-insensitive)
    pub fn matches<S: AsRef<str>>(&self, words: &[S]) -> bool {
        let words: Vec<String> = words.iter().map(|w| w.as_ref().to_lowercase()).collect();
        self.ends(&words, 0).contains(&words.len())
    }

    /// Every position the sequence can end at when started at `start`
    fn ends(&self, words: &[String], start: usize) -> BTreeSet<usize> {
        let mut frontier = BTreeSet::from([start]);
        for element in &self.elements {
            frontier = frontier
                .iter()
                .flat_map(|&position| element.ends(words, position))
                .collect();
            if frontier.is_empty() {
                break;
            }
        }
        frontier
    }
}

impl MatchElement {
    fn repeat(&self) -> Repeat {
        match self {
            MatchElement::Phrase { repeat, .. } | MatchElement::Alternatives { repeat, .. } => {
                *repeat
            }
            MatchElement::Dictation | MatchElement::Wildcard => Repeat::ONCE,
        }
    }

    /// End positions for a single occurrence starting at `start`
    fn once(&self, words: &[String], start: usize) -> BTreeSet<usize> {
        match self {
            MatchElement::Phrase { text, .. } => match words.get(start) {
                Some(word) if *word == text.to_lowercase() => {
                    BTreeSet::from([start + 1])
                }
                _ => BTreeSet::new(),
            },
            MatchElement::Dictation | MatchElement::Wildcard => {
                (start + 1..=words.len()).collect()
            }
            MatchElement::Alternatives { options, .. } => options
                .iter()
                .flat_map(|option| option.ends(words, start))
                .collect(),
        }
    }

    /// End positions honouring the repeat range
    fn ends(&self, words: &[String], start: usize) -> BTreeSet<usize> {
        let repeat = self.repeat();
        let mut result = BTreeSet::new();
        if repeat.min == 0 {
            result.insert(start);
        }

        let mut frontier = BTreeSet::from([start]);
        let mut seen = BTreeSet::new();
        let mut count = 0u32;

        while !frontier.is_empty() && count < repeat.max {
            count += 1;
            let next: BTreeSet<usize> = frontier
                .iter()
                .flat_map(|&position| self.once(words, position))
                .collect();

            if count >= repeat.min {
                result.extend(next.iter().copied());
                // positions already expanded cannot yield new ends
                frontier = next.difference(&seen).copied().collect();
                seen.extend(frontier.iter().copied());
            } else {
                frontier = next;
            }
        }

        result
    }
}

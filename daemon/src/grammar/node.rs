//! Grammar tree types and source rendering

use std::fmt;

/// Upper repeat bound for `+`/`*` on words and references
pub const UNBOUNDED: u32 = u32::MAX;

/// Upper repeat bound for `+`/`*` on a parenthesised group
pub const GROUP_REPEAT_MAX: u32 = 1000;

/// Inclusive repeat range of a grammar node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Repeat {
    pub min: u32,
    pub max: u32,
}

impl Repeat {
    /// Exactly once
    pub const ONCE: Repeat = Repeat { min: 1, max: 1 };
    /// Zero or one time (`[...]`)
    pub const OPTIONAL: Repeat = Repeat { min: 0, max: 1 };

    pub const fn new(min: u32, max: u32) -> Self {
        Self { min, max }
    }

    pub fn is_once(&self) -> bool {
        *self == Self::ONCE
    }

    pub fn is_valid(&self) -> bool {
        self.min <= self.max && self.max >= 1
    }
}

impl Default for Repeat {
    fn default() -> Self {
        Self::ONCE
    }
}

/// An ordered run of grammar nodes, matched one after another
pub type Sequence = Vec<GrammarNode>;

/// A single element of a compiled grammar
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GrammarNode {
    /// A fixed word repeated within the given range
    Literal { text: String, repeat: Repeat },
    /// Alternation between sequences; `repeat.min == 0` makes it optional
    Choice {
        alternatives: Vec<Sequence>,
        repeat: Repeat,
    },
    /// Free-form speech handled by the recognizer's dictation mode
    Dictation,
    /// Any single utterance span
    Wildcard,
}

impl GrammarNode {
    /// A literal word matched exactly once
    #[cfg(test)]
    pub fn literal(text: impl Into<String>) -> Self {
        GrammarNode::Literal {
            text: text.into(),
            repeat: Repeat::ONCE,
        }
    }

    /// An optional group over the given alternatives
    pub fn optional(alternatives: Vec<Sequence>) -> Self {
        GrammarNode::Choice {
            alternatives,
            repeat: Repeat::OPTIONAL,
        }
    }

    /// A mandatory group over the given alternatives
    #[cfg(test)]
    pub fn group(alternatives: Vec<Sequence>) -> Self {
        GrammarNode::Choice {
            alternatives,
            repeat: Repeat::ONCE,
        }
    }

    /// Repeat range of this node. Dictation and wildcard always match once.
    pub fn repeat(&self) -> Repeat {
        match self {
            GrammarNode::Literal { repeat, .. } | GrammarNode::Choice { repeat, .. } => *repeat,
            GrammarNode::Dictation | GrammarNode::Wildcard => Repeat::ONCE,
        }
    }

    /// Mutable access to the repeat range, if this node carries one
    pub fn repeat_mut(&mut self) -> Option<&mut Repeat> {
        match self {
            GrammarNode::Literal { repeat, .. } | GrammarNode::Choice { repeat, .. } => Some(repeat),
            GrammarNode::Dictation | GrammarNode::Wildcard => None,
        }
    }

    #[cfg(test)]
    pub fn is_optional(&self) -> bool {
        self.repeat().min == 0
    }

    /// Structural invariant check, recursing into alternatives
    pub fn is_valid(&self) -> bool {
        match self {
            GrammarNode::Literal { text, repeat } => !text.is_empty() && repeat.is_valid(),
            GrammarNode::Choice {
                alternatives,
                repeat,
            } => {
                repeat.is_valid()
                    && !alternatives.is_empty()
                    && alternatives
                        .iter()
                        .all(|seq| !seq.is_empty() && seq.iter().all(GrammarNode::is_valid))
            }
            GrammarNode::Dictation | GrammarNode::Wildcard => true,
        }
    }
}

impl fmt::Display for GrammarNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GrammarNode::Literal { text, repeat } => {
                write!(f, "{}", text)?;
                if repeat.max > 1 {
                    write!(f, "{}", if repeat.min == 0 { "*" } else { "+" })?;
                }
                Ok(())
            }
            GrammarNode::Choice {
                alternatives,
                repeat,
            } => {
                let (open, close) = if repeat.min == 0 { ('[', ']') } else { ('(', ')') };
                let inner = alternatives
                    .iter()
                    .map(|seq| render(seq))
                    .collect::<Vec<_>>()
                    .join(" | ");
                write!(f, "{}{}{}", open, inner, close)?;
                if repeat.min > 0 && repeat.max > 1 {
                    write!(f, "+")?;
                }
                Ok(())
            }
            GrammarNode::Dictation => write!(f, "$dictate"),
            GrammarNode::Wildcard => write!(f, "$wildcard"),
        }
    }
}

/// Reproduce grammar source for a sequence.
///
/// Re-parsing the output and rendering again yields the same string.
pub fn render(sequence: &[GrammarNode]) -> String {
    sequence
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_optional_and_group() {
        let seq = vec![
            GrammarNode::literal("go"),
            GrammarNode::optional(vec![
                vec![GrammarNode::literal("the")],
                vec![GrammarNode::literal("a")],
            ]),
            GrammarNode::group(vec![
                vec![GrammarNode::literal("house")],
                vec![GrammarNode::literal("big"), GrammarNode::literal("barn")],
            ]),
        ];
        assert_eq!(render(&seq), "go [the | a] (house | big barn)");
    }

    #[test]
    fn test_render_quantifiers() {
        let seq = vec![
            GrammarNode::Literal {
                text: "dot".into(),
                repeat: Repeat::new(1, UNBOUNDED),
            },
            GrammarNode::Literal {
                text: "space".into(),
                repeat: Repeat::new(0, UNBOUNDED),
            },
            GrammarNode::Dictation,
        ];
        assert_eq!(render(&seq), "dot+ space* $dictate");
    }

    #[test]
    fn test_validity() {
        assert!(GrammarNode::literal("word").is_valid());
        assert!(!GrammarNode::literal("").is_valid());
        assert!(!GrammarNode::group(vec![]).is_valid());
        assert!(!GrammarNode::Literal {
            text: "x".into(),
            repeat: Repeat::new(2, 1),
        }
        .is_valid());
        assert!(GrammarNode::Wildcard.is_valid());
    }
}

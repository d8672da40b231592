//! Recursive descent parser for grammar sources
//!
//! ```text
//! sequence := element+
//! element  := word ('+' | '*')?
//!           | '(' sequence ('|' sequence)* ')' ('+' | '*')?
//!           | '[' sequence ('|' sequence)* ']'
//!           | '$' word ('+' | '*')?
//! ```

use tracing::debug;

use super::definitions::Definitions;
use super::lexer::{tokenize, Token};
use super::node::{GrammarNode, Repeat, Sequence, GROUP_REPEAT_MAX, UNBOUNDED};

/// Errors produced while compiling grammar source
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GrammarError {
    #[error("unexpected control character {character:?} at offset {offset}")]
    ControlCharacter { character: char, offset: usize },

    #[error("grammar is empty")]
    Empty,

    #[error("empty sequence at token {position}")]
    EmptySequence { position: usize },

    #[error("choices must not start with '|' (token {position})")]
    LeadingPipe { position: usize },

    #[error("'{symbol}' at token {position} does not follow an element")]
    DanglingQuantifier { symbol: char, position: usize },

    #[error("cannot apply + or * to an optional group (token {position})")]
    QuantifiedOptional { position: usize },

    #[error("cannot apply + or * to `${name}`, which is already optional or repeated")]
    QuantifiedReference { name: String, position: usize },

    #[error("'$' at token {position} has no name after it")]
    MissingReferenceName { position: usize },

    #[error("undefined reference `${name}`")]
    UndefinedReference { name: String, position: usize },

    #[error("missing closing '{expected}'")]
    Unclosed { expected: char },

    #[error("unexpected '{found}' at token {position}")]
    UnexpectedToken { found: String, position: usize },

    #[error("`{name}` is reserved and cannot be redefined")]
    ReservedName { name: String },
}

/// Parse grammar source, resolving `$name` references against `definitions`.
pub fn parse(source: &str, definitions: &Definitions) -> Result<Sequence, GrammarError> {
    let tokens = tokenize(source)?;
    if tokens.is_empty() {
        return Err(GrammarError::Empty);
    }

    let mut parser = Parser {
        tokens,
        index: 0,
        definitions,
    };

    let result = parser.parse_all();
    if let Err(err) = &result {
        debug!(%err, "grammar parse failure\n{}", parser.caret_diagnostic());
    }
    result
}

struct Parser<'a> {
    tokens: Vec<Token>,
    index: usize,
    definitions: &'a Definitions,
}

impl<'a> Parser<'a> {
    fn parse_all(&mut self) -> Result<Sequence, GrammarError> {
        let sequence = self.sequence()?;
        match self.peek() {
            None => Ok(sequence),
            Some(token) => Err(GrammarError::UnexpectedToken {
                found: token.to_string(),
                position: self.index,
            }),
        }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.index)
    }

    fn bump(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.index).cloned();
        if token.is_some() {
            self.index += 1;
        }
        token
    }

    /// Consume a trailing `+` or `*`, returning the repeat it implies
    fn quantifier(&mut self, max: u32) -> Option<Repeat> {
        let repeat = match self.peek()? {
            Token::Plus => Repeat::new(1, max),
            Token::Star => Repeat::new(0, max),
            _ => return None,
        };
        self.index += 1;
        Some(repeat)
    }

    fn sequence(&mut self) -> Result<Sequence, GrammarError> {
        let mut nodes = Vec::new();

        while let Some(token) = self.peek() {
            match token {
                Token::CloseOptional | Token::CloseGroup | Token::Pipe => break,
                Token::OpenOptional => {
                    self.index += 1;
                    nodes.push(self.optional_group()?);
                }
                Token::OpenGroup => {
                    self.index += 1;
                    nodes.push(self.group()?);
                }
                Token::Plus | Token::Star => {
                    let symbol = if *token == Token::Plus { '+' } else { '*' };
                    return Err(GrammarError::DanglingQuantifier {
                        symbol,
                        position: self.index,
                    });
                }
                Token::Dollar => {
                    self.index += 1;
                    nodes.extend(self.reference()?);
                }
                Token::Word(text) => {
                    let text = text.clone();
                    self.index += 1;
                    nodes.push(self.word(text));
                }
            }
        }

        if nodes.is_empty() {
            return Err(GrammarError::EmptySequence {
                position: self.index,
            });
        }

        Ok(nodes)
    }

    fn word(&mut self, text: String) -> GrammarNode {
        let repeat = self.quantifier(UNBOUNDED).unwrap_or(Repeat::ONCE);
        GrammarNode::Literal { text, repeat }
    }

    /// Parse `|`-separated sequences up to and including `close`
    fn alternatives(&mut self, close: Token) -> Result<Vec<Sequence>, GrammarError> {
        if self.peek() == Some(&Token::Pipe) {
            return Err(GrammarError::LeadingPipe {
                position: self.index,
            });
        }

        let mut alternatives = Vec::new();
        loop {
            if self.peek().is_none() {
                break;
            }
            alternatives.push(self.sequence()?);

            let position = self.index;
            match self.bump() {
                Some(Token::Pipe) => continue,
                Some(token) if token == close => return Ok(alternatives),
                Some(token) => {
                    return Err(GrammarError::UnexpectedToken {
                        found: token.to_string(),
                        position,
                    })
                }
                None => break,
            }
        }

        let expected = if close == Token::CloseGroup { ')' } else { ']' };
        Err(GrammarError::Unclosed { expected })
    }

    fn group(&mut self) -> Result<GrammarNode, GrammarError> {
        let alternatives = self.alternatives(Token::CloseGroup)?;
        let repeat = self.quantifier(GROUP_REPEAT_MAX).unwrap_or(Repeat::ONCE);
        Ok(GrammarNode::Choice {
            alternatives,
            repeat,
        })
    }

    fn optional_group(&mut self) -> Result<GrammarNode, GrammarError> {
        let alternatives = self.alternatives(Token::CloseOptional)?;
        if self.peek().is_some_and(Token::is_quantifier) {
            return Err(GrammarError::QuantifiedOptional {
                position: self.index,
            });
        }
        Ok(GrammarNode::optional(alternatives))
    }

    /// Resolve `$name`; the returned nodes are an independent copy of the
    /// template and are spliced into the enclosing sequence.
    fn reference(&mut self) -> Result<Sequence, GrammarError> {
        let position = self.index;
        let name = match self.bump() {
            Some(Token::Word(name)) => name.to_lowercase(),
            _ => return Err(GrammarError::MissingReferenceName { position }),
        };

        let mut template = self
            .definitions
            .lookup(&name)
            .ok_or_else(|| GrammarError::UndefinedReference {
                name: name.clone(),
                position,
            })?;

        let quantifier_position = self.index;
        let Some(repeat) = self.quantifier(UNBOUNDED) else {
            return Ok(template);
        };

        // Checked on the leading node whatever the template length
        if template.first().is_some_and(|node| !node.repeat().is_once()) {
            return Err(GrammarError::QuantifiedReference {
                name,
                position: quantifier_position,
            });
        }

        if template.len() == 1 {
            if let Some(slot) = template[0].repeat_mut() {
                *slot = repeat;
                return Ok(template);
            }
        }

        // Multi-node templates and dictation/wildcard repeat as a group
        Ok(vec![GrammarNode::Choice {
            alternatives: vec![template],
            repeat,
        }])
    }

    /// Token listing with a caret under the failing token
    fn caret_diagnostic(&self) -> String {
        let mut line = String::new();
        let mut caret = String::new();

        for (i, token) in self.tokens.iter().enumerate() {
            let text = token.to_string();
            if i == self.index {
                caret.push('^');
            } else if i < self.index {
                caret.push_str(&" ".repeat(text.chars().count() + 1));
            }
            line.push_str(&text);
            line.push(' ');
        }
        if self.index >= self.tokens.len() {
            caret.push('^');
        }

        format!("{}\n{}", line, caret)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::node::render;

    fn parse_builtin(source: &str) -> Result<Sequence, GrammarError> {
        parse(source, &Definitions::with_builtins())
    }

    fn lit(text: &str) -> GrammarNode {
        GrammarNode::literal(text)
    }

    #[test]
    fn test_go_to_optional_article_house() {
        let seq = parse_builtin("go to [ the | a ] house").unwrap();
        assert_eq!(
            seq,
            vec![
                lit("go"),
                lit("to"),
                GrammarNode::Choice {
                    alternatives: vec![vec![lit("the")], vec![lit("a")]],
                    repeat: Repeat::OPTIONAL,
                },
                lit("house"),
            ]
        );
    }

    #[test]
    fn test_word_quantifiers() {
        let seq = parse_builtin("dot+ space*").unwrap();
        assert_eq!(seq[0].repeat(), Repeat::new(1, UNBOUNDED));
        assert_eq!(seq[1].repeat(), Repeat::new(0, UNBOUNDED));
    }

    #[test]
    fn test_group_quantifiers_use_group_bound() {
        let seq = parse_builtin("(up | down)+ (left | right)*").unwrap();
        assert_eq!(seq[0].repeat(), Repeat::new(1, GROUP_REPEAT_MAX));
        assert_eq!(seq[1].repeat(), Repeat::new(0, GROUP_REPEAT_MAX));
    }

    #[test]
    fn test_nested_groups() {
        let seq = parse_builtin("select (word | line [up | down]) now").unwrap();
        assert_eq!(seq.len(), 3);
        let GrammarNode::Choice { alternatives, repeat } = &seq[1] else {
            panic!("expected choice");
        };
        assert_eq!(*repeat, Repeat::ONCE);
        assert_eq!(alternatives.len(), 2);
        assert_eq!(alternatives[1].len(), 2);
        assert!(alternatives[1][1].is_optional());
    }

    #[test]
    fn test_quantified_optional_rejected() {
        assert!(matches!(
            parse_builtin("[a | b]+"),
            Err(GrammarError::QuantifiedOptional { .. })
        ));
        assert!(matches!(
            parse_builtin("x [a]*"),
            Err(GrammarError::QuantifiedOptional { .. })
        ));
    }

    #[test]
    fn test_leading_pipe_rejected() {
        assert!(matches!(
            parse_builtin("( | a)"),
            Err(GrammarError::LeadingPipe { .. })
        ));
        assert!(matches!(
            parse_builtin("[| a]"),
            Err(GrammarError::LeadingPipe { .. })
        ));
    }

    #[test]
    fn test_dangling_quantifier_rejected() {
        assert!(matches!(
            parse_builtin("+ a"),
            Err(GrammarError::DanglingQuantifier { symbol: '+', .. })
        ));
        assert!(matches!(
            parse_builtin("a + *"),
            Err(GrammarError::DanglingQuantifier { symbol: '*', .. })
        ));
    }

    #[test]
    fn test_unmatched_brackets_rejected() {
        assert_eq!(
            parse_builtin("(a | b"),
            Err(GrammarError::Unclosed { expected: ')' })
        );
        assert_eq!(
            parse_builtin("[a"),
            Err(GrammarError::Unclosed { expected: ']' })
        );
        assert!(matches!(
            parse_builtin("(a ]"),
            Err(GrammarError::UnexpectedToken { .. })
        ));
        assert!(matches!(
            parse_builtin("a )"),
            Err(GrammarError::UnexpectedToken { .. })
        ));
    }

    #[test]
    fn test_empty_inputs_rejected() {
        assert_eq!(parse_builtin(""), Err(GrammarError::Empty));
        assert!(matches!(
            parse_builtin("()"),
            Err(GrammarError::EmptySequence { .. })
        ));
        assert!(matches!(
            parse_builtin("(a | )"),
            Err(GrammarError::EmptySequence { .. })
        ));
    }

    #[test]
    fn test_reference_resolution_is_case_insensitive() {
        let mut defs = Definitions::with_builtins();
        defs.define_source("Direction", "(up | down)").unwrap();
        let seq = parse("move $DIRECTION", &defs).unwrap();
        assert_eq!(render(&seq), "move (up | down)");
    }

    #[test]
    fn test_builtin_references() {
        let seq = parse_builtin("say $dictate then $wildcard").unwrap();
        assert_eq!(seq[1], GrammarNode::Dictation);
        assert_eq!(seq[3], GrammarNode::Wildcard);
    }

    #[test]
    fn test_undefined_reference_rejected() {
        assert!(matches!(
            parse_builtin("go $nowhere"),
            Err(GrammarError::UndefinedReference { ref name, .. }) if name == "nowhere"
        ));
        assert!(matches!(
            parse_builtin("go $"),
            Err(GrammarError::MissingReferenceName { .. })
        ));
    }

    #[test]
    fn test_quantified_reference_requires_single_repeat() {
        let mut defs = Definitions::with_builtins();
        defs.define_source("digit", "(one | two)").unwrap();
        defs.define_source("maybe", "[please]").unwrap();
        defs.define_source("many", "dot+").unwrap();

        let seq = parse("$digit+", &defs).unwrap();
        assert_eq!(seq[0].repeat(), Repeat::new(1, UNBOUNDED));

        assert!(matches!(
            parse("$maybe+", &defs),
            Err(GrammarError::QuantifiedReference { .. })
        ));
        assert!(matches!(
            parse("$many*", &defs),
            Err(GrammarError::QuantifiedReference { .. })
        ));

        defs.define_source("maybepair", "[x] y").unwrap();
        defs.define_source("manypair", "dot+ y").unwrap();
        assert!(matches!(
            parse("$maybepair+", &defs),
            Err(GrammarError::QuantifiedReference { ref name, position: 2 }) if name == "maybepair"
        ));
        assert!(matches!(
            parse("go $manypair*", &defs),
            Err(GrammarError::QuantifiedReference { ref name, position: 3 }) if name == "manypair"
        ));

        // Unquantified use is still fine
        assert_eq!(parse("$maybepair", &defs).unwrap().len(), 2);
    }

    #[test]
    fn test_quantified_multi_node_reference_wraps_in_group() {
        let mut defs = Definitions::with_builtins();
        defs.define_source("pair", "left right").unwrap();
        let seq = parse("$pair*", &defs).unwrap();
        assert_eq!(
            seq,
            vec![GrammarNode::Choice {
                alternatives: vec![vec![lit("left"), lit("right")]],
                repeat: Repeat::new(0, UNBOUNDED),
            }]
        );
    }

    #[test]
    fn test_reference_copy_leaves_template_untouched() {
        let mut defs = Definitions::with_builtins();
        defs.define_source("word", "hello").unwrap();
        let _ = parse("$word+", &defs).unwrap();
        assert_eq!(defs.lookup("word").unwrap()[0].repeat(), Repeat::ONCE);
    }

    #[test]
    fn test_render_reparse_is_idempotent() {
        let mut defs = Definitions::with_builtins();
        defs.define_source("dir", "(up | down)").unwrap();
        let sources = [
            "go to [ the | a ] house",
            "(alpha | bravo | charlie)+ done",
            "dot+ space* [very]",
            "select ( word | line [ up | down ] ) $dictate",
            "move $dir+ [by $dir]",
            "(a)* b",
        ];
        for source in sources {
            let first = render(&parse(source, &defs).unwrap());
            let second = render(&parse(&first, &defs).unwrap());
            assert_eq!(first, second, "source: {source}");
        }
    }

    #[test]
    fn test_parsed_trees_are_valid() {
        let seq = parse_builtin("a+ [b | c d] (e | f)* $dictate").unwrap();
        assert!(seq.iter().all(GrammarNode::is_valid));
    }
}

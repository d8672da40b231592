//! Grammar source tokenizer
//!
//! Whitespace separates words; the structural symbols `[ ] ( ) + * | $`
//! always stand alone regardless of surrounding whitespace.

use std::fmt;

use logos::Logos;

use super::parser::GrammarError;

#[derive(Logos, Debug, Clone, PartialEq, Eq)]
#[logos(skip r"[ \t]+")]
pub enum Token {
    #[regex(r"[^ \t\[\]()+*|$\x00-\x1f\x7f-\x9f]+", |lex| lex.slice().to_string())]
    Word(String),
    #[token("[")]
    OpenOptional,
    #[token("]")]
    CloseOptional,
    #[token("(")]
    OpenGroup,
    #[token(")")]
    CloseGroup,
    #[token("+")]
    Plus,
    #[token("*")]
    Star,
    #[token("|")]
    Pipe,
    #[token("$")]
    Dollar,
}

impl Token {
    pub fn is_quantifier(&self) -> bool {
        matches!(self, Token::Plus | Token::Star)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Word(word) => write!(f, "{}", word),
            Token::OpenOptional => write!(f, "["),
            Token::CloseOptional => write!(f, "]"),
            Token::OpenGroup => write!(f, "("),
            Token::CloseGroup => write!(f, ")"),
            Token::Plus => write!(f, "+"),
            Token::Star => write!(f, "*"),
            Token::Pipe => write!(f, "|"),
            Token::Dollar => write!(f, "$"),
        }
    }
}

/// Split grammar source into tokens.
///
/// Control characters (NUL, CR, LF, ...) match no token and are rejected;
/// grammar sources are single-line.
pub fn tokenize(source: &str) -> Result<Vec<Token>, GrammarError> {
    let mut lexer = Token::lexer(source);
    let mut tokens = Vec::new();

    while let Some(result) = lexer.next() {
        match result {
            Ok(token) => tokens.push(token),
            Err(()) => {
                let offset = lexer.span().start;
                let character = source[offset..].chars().next().unwrap_or('\0');
                return Err(GrammarError::ControlCharacter { character, offset });
            }
        }
    }

    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn word(s: &str) -> Token {
        Token::Word(s.to_string())
    }

    #[test]
    fn test_symbols_split_without_whitespace() {
        let tokens = tokenize("go[the|a]house+").unwrap();
        assert_eq!(
            tokens,
            vec![
                word("go"),
                Token::OpenOptional,
                word("the"),
                Token::Pipe,
                word("a"),
                Token::CloseOptional,
                word("house"),
                Token::Plus,
            ]
        );
    }

    #[test]
    fn test_whitespace_runs_collapse() {
        let tokens = tokenize("  change \t mode  $name ").unwrap();
        assert_eq!(
            tokens,
            vec![word("change"), word("mode"), Token::Dollar, word("name")]
        );
    }

    #[test]
    fn test_control_characters_rejected() {
        for source in ["a\nb", "a\rb", "a\0b"] {
            let err = tokenize(source).unwrap_err();
            assert!(matches!(
                err,
                GrammarError::ControlCharacter { offset: 1, .. }
            ));
        }
    }

    #[test]
    fn test_delete_and_c1_controls_rejected() {
        let err = tokenize("go\u{7f}").unwrap_err();
        assert!(matches!(
            err,
            GrammarError::ControlCharacter { character: '\u{7f}', offset: 2 }
        ));

        let err = tokenize("é\u{85}x").unwrap_err();
        assert!(matches!(
            err,
            GrammarError::ControlCharacter { character: '\u{85}', offset: 2 }
        ));
    }

    #[test]
    fn test_non_ascii_words() {
        let tokens = tokenize("café|naïve").unwrap();
        assert_eq!(tokens, vec![word("café"), Token::Pipe, word("naïve")]);
    }

    #[test]
    fn test_empty_source_has_no_tokens() {
        assert!(tokenize("   ").unwrap().is_empty());
    }
}

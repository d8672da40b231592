//! A spoken command bound to its mode

use tracing::{debug, warn};

use super::file::CommandDefinition;
use super::{LoadError, ModeId};
use crate::action::{self, ActionToken};
use crate::grammar::{self, render, Definitions, Matcher};
use crate::session::{Callback, FunctionRegistry};

/// A compiled command. Immutable once its mode tree is built.
#[derive(Debug, Clone)]
pub struct Command {
    /// Mode the command belongs to
    pub mode: ModeId,
    /// Display name, defaulting to the grammar source
    pub name: String,
    pub matcher: Matcher,
    pub actions: Vec<ActionToken>,
    pub callback: Option<Callback>,
}

impl Command {
    /// Compile one command definition.
    ///
    /// An unknown function name only warns, but the command must then have
    /// an action of its own.
    pub fn build(
        mode: ModeId,
        def: &CommandDefinition,
        definitions: &Definitions,
        functions: &FunctionRegistry,
    ) -> Result<Self, LoadError> {
        let name = def.name.clone().unwrap_or_else(|| def.grammar.clone());

        let grammar = grammar::parse(&def.grammar, definitions).map_err(|source| {
            LoadError::Grammar {
                command: name.clone(),
                source,
            }
        })?;

        let callback = def.function.as_deref().and_then(|function| {
            let callback = functions.resolve(function);
            if callback.is_none() {
                warn!(function, command = %name, "could not find function");
            }
            callback
        });

        let actions = match def.action.as_deref() {
            Some(source) => action::parse(source).map_err(|source| LoadError::Action {
                command: name.clone(),
                source,
            })?,
            None if callback.is_some() => Vec::new(),
            None => return Err(LoadError::MissingAction { command: name }),
        };

        debug!(
            command = %name,
            grammar = %render(&grammar),
            tokens = actions.len(),
            "command compiled"
        );

        Ok(Self {
            mode,
            matcher: Matcher::compile(&grammar),
            name,
            actions,
            callback,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::{Key, KeyEvent};
    use crate::grammar::GrammarError;

    fn definition(grammar: &str, action: Option<&str>, function: Option<&str>) -> CommandDefinition {
        CommandDefinition {
            name: None,
            grammar: grammar.to_string(),
            action: action.map(str::to_string),
            function: function.map(str::to_string),
        }
    }

    fn build(def: &CommandDefinition) -> Result<Command, LoadError> {
        Command::build(
            ModeId(0),
            def,
            &Definitions::with_builtins(),
            &FunctionRegistry::builtin(),
        )
    }

    #[test]
    fn test_name_defaults_to_grammar() {
        let command = build(&definition("save file", Some("Control S"), None)).unwrap();
        assert_eq!(command.name, "save file");
        assert!(command.callback.is_none());
        assert_eq!(
            command.actions,
            vec![
                ActionToken::Key(KeyEvent::hold(Key::Control)),
                ActionToken::Key(KeyEvent::tap(Key::Letter('S'))),
            ]
        );
        assert!(command.matcher.matches(&["save", "file"]));
    }

    #[test]
    fn test_function_without_action() {
        let command = build(&definition("exit mode", None, Some("exit_mode"))).unwrap();
        assert!(command.actions.is_empty());
        assert_eq!(command.callback.map(|c| c.name), Some("exit_mode"));
    }

    #[test]
    fn test_unknown_function_keeps_action() {
        let command = build(&definition("beep", Some("Escape"), Some("no_such_function"))).unwrap();
        assert!(command.callback.is_none());
        assert_eq!(command.actions.len(), 1);
    }

    #[test]
    fn test_unknown_function_without_action_fails() {
        let result = build(&definition("beep", None, Some("no_such_function")));
        assert!(matches!(result, Err(LoadError::MissingAction { command }) if command == "beep"));

        let result = build(&definition("beep", None, None));
        assert!(matches!(result, Err(LoadError::MissingAction { .. })));
    }

    #[test]
    fn test_syntax_errors_name_the_command() {
        let mut def = definition("go (", Some("Enter"), None);
        def.name = Some("broken".into());
        match build(&def) {
            Err(LoadError::Grammar { command, source }) => {
                assert_eq!(command, "broken");
                assert_eq!(source, GrammarError::Unclosed { expected: ')' });
            }
            other => panic!("expected grammar error, got {:?}", other),
        }

        let result = build(&definition("go", Some("`unterminated"), None));
        assert!(matches!(result, Err(LoadError::Action { .. })));
    }
}

//! Mode tree module
//!
//! Turns a definitions file into a tree of modes, each owning compiled
//! commands. A failed build never produces a partial tree.

mod command;
mod file;
mod tree;

use std::fmt;
use std::path::PathBuf;

use crate::action::ActionError;
use crate::grammar::GrammarError;

pub use command::Command;
pub use file::{CommandDefinition, ModeDefinition};
pub use tree::{Mode, ModeTree};

/// Index of a mode inside its [`ModeTree`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModeId(pub usize);

impl fmt::Display for ModeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "m{}", self.0)
    }
}

/// Errors that abort loading a definitions file
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("malformed definitions: {0}")]
    Format(#[from] serde_json::Error),

    #[error("invalid define `{name}`: {source}")]
    Define { name: String, source: GrammarError },

    #[error("invalid grammar in '{command}': {source}")]
    Grammar {
        command: String,
        source: GrammarError,
    },

    #[error("invalid action in '{command}': {source}")]
    Action { command: String, source: ActionError },

    #[error("function cannot be found and no action given for '{command}'")]
    MissingAction { command: String },

    #[error("mode `{name}` is defined twice")]
    DuplicateMode { name: String },
}

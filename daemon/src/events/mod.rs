//! Events module for activation changes and dispatch outcomes
//!
//! Published on a broadcast channel by the activation engine and the
//! session, and logged by the main loop.

use serde::{Deserialize, Serialize};

/// Events emitted as modes change and phrases are dispatched
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StateEvent {
    /// A child mode was pushed onto the active stack
    ModeEntered {
        mode: String,
        /// Stack depth after entering
        depth: usize,
    },

    /// The innermost mode was popped
    ModeExited {
        mode: String,
        /// Stack depth after exiting
        depth: usize,
    },

    /// An exclusive overlay suppressed the current and root modes
    ExclusiveEntered { mode: String },

    /// The exclusive overlay was lifted
    ExclusiveExited { mode: String },

    /// A definitions file was loaded and its root mode enabled
    DefinitionsLoaded { modes: usize, commands: usize },

    /// A reload failed and the previous definitions stay in effect
    ReloadFailed { reason: String },

    /// A phrase matched an enabled command
    CommandRecognized { command: String, phrase: String },

    /// No enabled command matched a phrase
    PhraseRejected { phrase: String },
}

impl std::fmt::Display for StateEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StateEvent::ModeEntered { mode, depth } => {
                write!(f, "MODE_ENTERED {} (depth {})", mode, depth)
            }
            StateEvent::ModeExited { mode, depth } => {
                write!(f, "MODE_EXITED {} (depth {})", mode, depth)
            }
            StateEvent::ExclusiveEntered { mode } => write!(f, "EXCLUSIVE_ENTERED {}", mode),
            StateEvent::ExclusiveExited { mode } => write!(f, "EXCLUSIVE_EXITED {}", mode),
            StateEvent::DefinitionsLoaded { modes, commands } => {
                write!(f, "DEFINITIONS_LOADED ({} modes, {} commands)", modes, commands)
            }
            StateEvent::ReloadFailed { reason } => write!(f, "RELOAD_FAILED: {}", reason),
            StateEvent::CommandRecognized { command, .. } => {
                write!(f, "COMMAND_RECOGNIZED >>> {}", command)
            }
            StateEvent::PhraseRejected { phrase } => write!(f, "PHRASE_REJECTED {}", phrase),
        }
    }
}

//! Activation engine implementation
//!
//! Owns the loaded mode tree, the active mode stack and the optional
//! exclusive overlay, and keeps the recognition engine's enable flags in
//! step with them.

use std::collections::BTreeSet;
use std::mem;

use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::events::StateEvent;
use crate::grammar::Definitions;
use crate::modes::{Command, LoadError, ModeDefinition, ModeId, ModeTree};
use crate::recognition::{GrammarId, RecognitionEngine};
use crate::session::FunctionRegistry;

/// Where the engine sits relative to the mode tree
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    /// Only the root mode is active
    Root,
    /// Child modes are stacked on the root; holds the stack depth
    Nested(usize),
    /// An exclusive overlay is active, whatever the stack depth
    ExclusiveOverride,
}

impl Default for State {
    fn default() -> Self {
        Self::Root
    }
}

impl std::fmt::Display for State {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            State::Root => write!(f, "Root"),
            State::Nested(depth) => write!(f, "Nested({})", depth),
            State::ExclusiveOverride => write!(f, "ExclusiveOverride"),
        }
    }
}

/// An exclusive mode temporarily replacing the normal active set
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Overlay {
    pub target: ModeId,
    /// Modes whose grammars were disabled on entry
    pub suppressed: BTreeSet<ModeId>,
}

/// Mode navigation that could not be carried out. Logged; nothing changes.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NavigationWarning {
    #[error("cannot find mode to change to: {name}")]
    UnknownMode { name: String },

    #[error("cannot exit from global mode")]
    AtRoot,
}

/// Misuse of the exclusive overlay. The state is left untouched.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ActivationError {
    #[error("exclusive mode is already active")]
    ExclusiveAlreadyActive,

    #[error("not in exclusive mode")]
    ExclusiveNotActive,
}

/// Runtime state machine over the loaded mode tree
pub struct ActivationEngine {
    tree: ModeTree,
    definitions: Definitions,
    functions: FunctionRegistry,
    recognizer: Box<dyn RecognitionEngine>,
    /// Entered modes, innermost last; the root is implicit below
    stack: Vec<ModeId>,
    overlay: Option<Overlay>,
    /// Channel for emitting state events
    event_tx: broadcast::Sender<StateEvent>,
}

impl ActivationEngine {
    /// Create an engine with nothing loaded
    pub fn new(
        recognizer: Box<dyn RecognitionEngine>,
        functions: FunctionRegistry,
        event_tx: broadcast::Sender<StateEvent>,
    ) -> Self {
        Self {
            tree: ModeTree::empty(),
            definitions: Definitions::with_builtins(),
            functions,
            recognizer,
            stack: Vec::new(),
            overlay: None,
            event_tx,
        }
    }

    /// Build a fresh tree from `def` and make it live.
    ///
    /// On failure the previous tree, definitions and activation state are
    /// kept exactly as they were.
    pub fn load(&mut self, def: &ModeDefinition) -> Result<(), LoadError> {
        let previous = mem::replace(&mut self.definitions, Definitions::with_builtins());

        match ModeTree::build(def, &mut self.definitions, &self.functions) {
            Ok(tree) => {
                self.install(tree);
                Ok(())
            }
            Err(err) => {
                self.definitions = previous;
                warn!(error = %err, "definitions rejected, keeping previous definitions");
                self.publish(StateEvent::ReloadFailed {
                    reason: err.to_string(),
                });
                Err(err)
            }
        }
    }

    fn install(&mut self, tree: ModeTree) {
        self.tree = tree;
        self.stack.clear();
        self.overlay = None;

        // Everything is loaded up front so modes only need toggling later
        self.recognizer.unload_all();
        for mode in self.tree.preorder() {
            for id in self.tree.grammars(mode) {
                if let Some(command) = self.tree.command(*id) {
                    self.recognizer.load_grammar(*id, command.matcher.clone());
                }
            }
        }
        self.set_mode_enabled(self.tree.root(), true);

        info!(
            modes = self.tree.mode_count(),
            commands = self.tree.command_count(),
            "definitions loaded"
        );
        self.publish(StateEvent::DefinitionsLoaded {
            modes: self.tree.mode_count(),
            commands: self.tree.command_count(),
        });
    }

    /// Enter the current mode's child named `name`
    pub fn change_mode(&mut self, name: &str) -> Result<ModeId, NavigationWarning> {
        let current = self.current();
        let Some(target) = self.tree.child(current, name) else {
            warn!(mode = name, "cannot find mode to change to");
            return Err(NavigationWarning::UnknownMode {
                name: name.to_lowercase(),
            });
        };

        if current != self.tree.root() {
            self.set_mode_enabled(current, false);
        }
        self.stack.push(target);
        self.set_mode_enabled(target, true);

        let mode = self.mode_name(target);
        info!(mode = %mode, depth = self.stack.len(), "changed to mode");
        self.publish(StateEvent::ModeEntered {
            mode,
            depth: self.stack.len(),
        });
        Ok(target)
    }

    /// Leave the innermost mode
    pub fn exit_mode(&mut self) -> Result<ModeId, NavigationWarning> {
        let Some(left) = self.stack.pop() else {
            warn!("cannot exit from global mode");
            return Err(NavigationWarning::AtRoot);
        };

        self.set_mode_enabled(left, false);
        let current = self.current();
        self.set_mode_enabled(current, true);

        info!(mode = %self.mode_name(current), state = ?self.state(), "exited to mode");
        self.publish(StateEvent::ModeExited {
            mode: self.mode_name(left),
            depth: self.stack.len(),
        });
        Ok(current)
    }

    /// Suppress the current and root modes and enable only `target`
    pub fn enter_exclusive_mode(&mut self, target: ModeId) -> Result<(), ActivationError> {
        if self.overlay.is_some() {
            return Err(ActivationError::ExclusiveAlreadyActive);
        }

        let suppressed: BTreeSet<ModeId> = [self.current(), self.tree.root()].into_iter().collect();
        for mode in &suppressed {
            self.set_mode_enabled(*mode, false);
        }
        self.set_mode_enabled(target, true);

        debug!(suppressed = suppressed.len(), "exclusive overlay applied");
        self.overlay = Some(Overlay { target, suppressed });

        let mode = self.mode_name(target);
        info!(mode = %mode, "entered exclusive mode");
        self.publish(StateEvent::ExclusiveEntered { mode });
        Ok(())
    }

    /// Lift the overlay, restoring every suppressed mode
    pub fn exit_exclusive_mode(&mut self, target: ModeId) -> Result<(), ActivationError> {
        let Some(overlay) = self.overlay.take() else {
            return Err(ActivationError::ExclusiveNotActive);
        };

        for mode in &overlay.suppressed {
            self.set_mode_enabled(*mode, true);
        }
        self.set_mode_enabled(target, false);

        let mode = self.mode_name(target);
        info!(mode = %mode, "exited exclusive mode");
        self.publish(StateEvent::ExclusiveExited { mode });
        Ok(())
    }

    fn set_mode_enabled(&mut self, mode: ModeId, enabled: bool) {
        for id in self.tree.grammars(mode) {
            self.recognizer.set_enabled(*id, enabled);
        }
    }

    /// The command whose enabled grammar accepts `phrase`
    pub fn recognize(&self, phrase: &str) -> Option<&Command> {
        self.recognizer
            .recognize(phrase)
            .and_then(|id| self.tree.command(id))
    }

    /// The innermost active mode, or the root
    pub fn current(&self) -> ModeId {
        self.stack.last().copied().unwrap_or_else(|| self.tree.root())
    }

    pub fn state(&self) -> State {
        match (&self.overlay, self.stack.len()) {
            (Some(_), _) => State::ExclusiveOverride,
            (None, 0) => State::Root,
            (None, depth) => State::Nested(depth),
        }
    }

    #[cfg(test)]
    pub fn overlay(&self) -> Option<&Overlay> {
        self.overlay.as_ref()
    }

    pub fn exclusive_target(&self) -> Option<ModeId> {
        self.overlay.as_ref().map(|o| o.target)
    }

    /// Enabled grammars, in load order
    pub fn enabled(&self) -> Vec<GrammarId> {
        self.recognizer.enabled()
    }

    pub fn tree(&self) -> &ModeTree {
        &self.tree
    }

    #[cfg(test)]
    pub fn definitions(&self) -> &Definitions {
        &self.definitions
    }

    pub fn mode_name(&self, id: ModeId) -> String {
        self.tree
            .mode(id)
            .map(|m| m.display_name().to_string())
            .unwrap_or_else(|| id.to_string())
    }

    /// Publish an event to every subscriber
    pub fn publish(&self, event: StateEvent) {
        debug!(?event, "emitting state event");
        let _ = self.event_tx.send(event);
    }
}

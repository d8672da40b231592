//! Phrase dispatch
//!
//! The session is the single path that turns recognized phrases into
//! playback and callbacks, and the only mutator of activation state.

mod functions;
mod numbers;

use std::mem;
use std::path::PathBuf;

use tracing::{debug, error, info, warn};

use crate::action::ActionToken;
use crate::events::StateEvent;
use crate::modes::{LoadError, ModeDefinition};
use crate::playback::{PlaybackError, PlaybackWorker, ScreenState};
use crate::state::ActivationEngine;

pub use functions::{Callback, FunctionRegistry};

/// The only phrase accepted while muted
pub const WAKE_PHRASE: &str = "voice code start";

/// What happened to a phrase
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    /// Ignored because the session is muted
    Muted,
    /// No enabled command matched
    Rejected,
    Recognized { command: String },
}

pub struct Session {
    engine: ActivationEngine,
    playback: PlaybackWorker,
    definitions_path: PathBuf,
    muted: bool,
    /// Most recent action sequence, for `repeat_action`
    last_actions: Vec<ActionToken>,
    reload_requested: bool,
}

impl Session {
    pub fn new(engine: ActivationEngine, playback: PlaybackWorker, definitions_path: PathBuf) -> Self {
        Self {
            engine,
            playback,
            definitions_path,
            muted: false,
            last_actions: Vec::new(),
            reload_requested: false,
        }
    }

    /// Read the definitions file and make it live.
    ///
    /// On failure the previous definitions stay in effect.
    pub fn load(&mut self) -> Result<(), LoadError> {
        info!(path = %self.definitions_path.display(), "loading definitions");

        let def = match ModeDefinition::from_path(&self.definitions_path) {
            Ok(def) => def,
            Err(err) => {
                self.engine.publish(StateEvent::ReloadFailed {
                    reason: err.to_string(),
                });
                return Err(err);
            }
        };

        self.engine.load(&def)?;
        self.last_actions.clear();
        Ok(())
    }

    /// Reload once queued playback has finished
    pub async fn reload(&mut self) {
        self.playback.drain().await;
        if let Err(err) = self.load() {
            error!(error = %err, "definitions are malformed, rolled back to old definitions");
        }
    }

    /// Recognize a phrase and run the matching command
    pub async fn handle_phrase(&mut self, phrase: &str) -> Dispatch {
        let phrase = phrase.trim();
        if self.muted && !is_wake_phrase(phrase) {
            debug!(phrase, "muted, ignoring phrase");
            return Dispatch::Muted;
        }

        let Some(command) = self.engine.recognize(phrase) else {
            info!(phrase, "rejected");
            self.engine.publish(StateEvent::PhraseRejected {
                phrase: phrase.to_string(),
            });
            return Dispatch::Rejected;
        };

        let name = command.name.clone();
        let actions = command.actions.clone();
        let callback = command.callback;
        let mode = self.engine.mode_name(command.mode);

        info!(phrase, command = %name, %mode, "recognized");
        self.engine.publish(StateEvent::CommandRecognized {
            command: name.clone(),
            phrase: phrase.to_string(),
        });

        if !actions.is_empty() {
            if let Err(err) = self.send_actions(actions) {
                error!(error = %err, command = %name, "failed to queue actions");
            }
        }

        if let Some(callback) = callback {
            let words: Vec<String> = phrase.split_whitespace().map(str::to_lowercase).collect();
            if let Err(err) = (callback.handler)(self, &words) {
                warn!(function = callback.name, error = %err, "function failed");
            }
        }

        if mem::take(&mut self.reload_requested) {
            self.reload().await;
        }

        Dispatch::Recognized { command: name }
    }

    /// Play tokens and remember them for `repeat_action`
    pub fn send_actions(&mut self, tokens: Vec<ActionToken>) -> Result<(), PlaybackError> {
        self.last_actions = tokens.clone();
        self.playback.submit(tokens)
    }

    /// Play tokens without remembering them
    pub fn emit(&mut self, tokens: Vec<ActionToken>) -> Result<(), PlaybackError> {
        self.playback.submit(tokens)
    }

    /// Play the remembered sequence again
    pub fn repeat_last(&mut self) -> Result<(), PlaybackError> {
        self.playback.submit(self.last_actions.clone())
    }

    /// Reload after the current callback returns
    pub fn request_reload(&mut self) {
        self.reload_requested = true;
    }

    pub fn set_muted(&mut self, muted: bool) {
        if self.muted != muted {
            info!(muted, "voice input toggled");
        }
        self.muted = muted;
    }

    #[cfg(test)]
    pub fn is_muted(&self) -> bool {
        self.muted
    }

    /// Cursor and screen size as of the last finished playback
    pub fn screen_state(&self) -> ScreenState {
        self.playback.screen_state()
    }

    #[cfg(test)]
    pub fn last_actions(&self) -> &[ActionToken] {
        &self.last_actions
    }

    #[cfg(test)]
    pub fn engine(&self) -> &ActivationEngine {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut ActivationEngine {
        &mut self.engine
    }

    #[cfg(test)]
    pub fn definitions_path(&self) -> &std::path::Path {
        &self.definitions_path
    }

    /// Wait for queued playback to finish
    pub async fn drain(&mut self) {
        self.playback.drain().await;
    }

    /// Finish playback and stop the worker
    pub async fn shutdown(&mut self) {
        self.playback.shutdown().await;
    }
}

/// Word-by-word, ignoring case and spacing
fn is_wake_phrase(phrase: &str) -> bool {
    phrase
        .split_whitespace()
        .map(str::to_lowercase)
        .eq(WAKE_PHRASE.split_whitespace())
}

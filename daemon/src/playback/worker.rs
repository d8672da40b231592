//! Dedicated playback thread
//!
//! Replays action tokens off the dispatch path. Requests are queued and
//! played strictly one after another; a request never interleaves with
//! another and always runs to completion.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info};

use super::sink::{replay, InputSink, ScreenState};
use crate::action::ActionToken;

/// A queued playback with its completion signal
struct PlaybackRequest {
    tokens: Vec<ActionToken>,
    done: oneshot::Sender<()>,
}

/// Handle to the playback thread
pub struct PlaybackWorker {
    request_tx: Option<mpsc::UnboundedSender<PlaybackRequest>>,
    running: Arc<AtomicBool>,
    /// Refreshed by the thread after every request
    screen: Arc<Mutex<ScreenState>>,
    thread: Option<JoinHandle<()>>,
    /// Completion of the most recently queued request
    last_done: Option<oneshot::Receiver<()>>,
}

/// Errors that can occur in the playback worker
#[derive(Debug, thiserror::Error)]
pub enum PlaybackError {
    #[error("failed to spawn playback thread: {0}")]
    ThreadSpawn(String),

    #[error("playback thread is not running")]
    Stopped,
}

impl PlaybackWorker {
    /// Spawn the playback thread, which owns `sink` for its lifetime
    pub fn start<S: InputSink + 'static>(mut sink: S) -> Result<Self, PlaybackError> {
        let (request_tx, mut request_rx) = mpsc::unbounded_channel::<PlaybackRequest>();
        let running = Arc::new(AtomicBool::new(true));
        let thread_running = Arc::clone(&running);
        let screen = Arc::new(Mutex::new(ScreenState::of(&sink)));
        let thread_screen = Arc::clone(&screen);

        let thread = thread::Builder::new()
            .name("action-playback".to_string())
            .spawn(move || {
                info!("playback thread started");

                while let Some(request) = request_rx.blocking_recv() {
                    debug!(tokens = request.tokens.len(), "replaying actions");
                    replay(&request.tokens, &mut sink);
                    *thread_screen.lock().unwrap_or_else(PoisonError::into_inner) =
                        ScreenState::of(&sink);
                    let _ = request.done.send(());
                }

                thread_running.store(false, Ordering::SeqCst);
                info!("playback thread stopped");
            })
            .map_err(|e| PlaybackError::ThreadSpawn(e.to_string()))?;

        Ok(Self {
            request_tx: Some(request_tx),
            running,
            screen,
            thread: Some(thread),
            last_done: None,
        })
    }

    /// Queue tokens behind any playback already in flight
    pub fn submit(&mut self, tokens: Vec<ActionToken>) -> Result<(), PlaybackError> {
        if tokens.is_empty() {
            return Ok(());
        }

        if !self.is_running() {
            return Err(PlaybackError::Stopped);
        }
        let request_tx = self.request_tx.as_ref().ok_or(PlaybackError::Stopped)?;
        let (done, done_rx) = oneshot::channel();
        request_tx
            .send(PlaybackRequest { tokens, done })
            .map_err(|_| PlaybackError::Stopped)?;

        self.last_done = Some(done_rx);
        Ok(())
    }

    /// Wait until every queued playback has finished
    pub async fn drain(&mut self) {
        if let Some(done) = self.last_done.take() {
            // An error means the thread exited, which also leaves nothing in flight
            let _ = done.await;
        }
    }

    /// Cursor and screen size as of the last finished playback
    pub fn screen_state(&self) -> ScreenState {
        *self.screen.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Check if the playback thread is still accepting requests
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Finish queued playback and stop the thread
    pub async fn shutdown(&mut self) {
        self.drain().await;
        self.request_tx = None;
        if let Some(thread) = self.thread.take() {
            let _ = tokio::task::spawn_blocking(move || thread.join()).await;
        }
    }
}

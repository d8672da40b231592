//! voicecoder: voice command daemon
//!
//! Compiles a definitions file of modes and spoken commands, then turns
//! recognized phrases into keystrokes and mouse actions:
//! - Grammar and action script compilers
//! - Mode tree with an activation engine toggling grammars on and off
//! - Playback of action tokens on a dedicated thread
//!
//! Phrases are taken from the command line for offline verification of a
//! definitions file, or one per line from stdin.

mod action;
mod config;
mod events;
mod grammar;
mod lifecycle;
mod modes;
mod playback;
mod recognition;
mod session;
mod state;

use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::{Cli, Config};
use crate::events::StateEvent;
use crate::lifecycle::ShutdownSignal;
use crate::playback::{PlaybackWorker, TracingSink};
use crate::recognition::Emulator;
use crate::session::{FunctionRegistry, Session};
use crate::state::ActivationEngine;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::load(Cli::parse())?;

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.log_filter())),
        )
        .init();

    info!(version = env!("CARGO_PKG_VERSION"), "voicecoder starting");

    let shutdown = ShutdownSignal::new();

    // Activation engine and session -> main loop (for logging state events)
    let (event_tx, mut event_rx) = broadcast::channel::<StateEvent>(64);

    let engine = ActivationEngine::new(
        Box::new(Emulator::new()),
        FunctionRegistry::builtin(),
        event_tx,
    );
    let playback = PlaybackWorker::start(TracingSink::new(config.screen_size))
        .context("failed to start playback thread")?;
    let mut session = Session::new(engine, playback, config.definitions_path.clone());

    if let Err(err) = session.load() {
        error!(error = %err, "definitions are malformed, resolve the errors and re-run");
        session.shutdown().await;
        std::process::exit(1);
    }

    // Phrase source -> dispatcher
    let (phrase_tx, mut phrase_rx) = mpsc::channel::<String>(32);
    let source = if config.is_emulated() {
        tokio::spawn(feed_phrases(
            config.phrases.clone(),
            config.phrase_delay,
            phrase_tx,
        ))
    } else {
        info!("voice coder active, reading phrases from stdin");
        tokio::spawn(read_stdin(phrase_tx))
    };

    let stop = shutdown.wait();
    tokio::pin!(stop);

    info!("daemon initialized, entering main loop");

    loop {
        tokio::select! {
            phrase = phrase_rx.recv() => match phrase {
                Some(phrase) => {
                    session.handle_phrase(&phrase).await;
                }
                None => {
                    info!("no more phrases");
                    break;
                }
            },

            event = event_rx.recv() => match event {
                Ok(event) => info!(%event, "state event"),
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!(skipped = n, "state event receiver lagged");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },

            signal = &mut stop => {
                info!(%signal, "shutdown signal received");
                break;
            }
        }
    }

    // Cleanup
    info!("shutting down...");

    source.abort();
    session.shutdown().await;
    while let Ok(event) = event_rx.try_recv() {
        info!(%event, "state event");
    }

    info!("voicecoder stopped");

    Ok(())
}

/// Send each phrase in turn, pausing between them like spoken input
async fn feed_phrases(phrases: Vec<String>, delay: Duration, tx: mpsc::Sender<String>) {
    for phrase in phrases {
        debug!(%phrase, "emulating phrase");
        if tx.send(phrase).await.is_err() {
            return;
        }
        tokio::time::sleep(delay).await;
    }
}

/// Forward non-blank stdin lines until end of input
async fn read_stdin(tx: mpsc::Sender<String>) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) if line.trim().is_empty() => continue,
            Ok(Some(line)) => {
                if tx.send(line).await.is_err() {
                    return;
                }
            }
            Ok(None) => return,
            Err(e) => {
                error!(?e, "failed to read stdin");
                return;
            }
        }
    }
}

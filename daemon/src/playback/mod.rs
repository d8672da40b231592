//! Action playback
//!
//! Replays compiled action tokens through an [`InputSink`] on a single
//! worker thread, preserving submission order.

mod sink;
mod worker;

pub use sink::{InputSink, ScreenState, TracingSink, DEFAULT_SCREEN_SIZE};
pub use worker::{PlaybackError, PlaybackWorker};

#[cfg(test)]
pub(crate) use sink::recording;

//! Core types for playback sequencing

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Transport state of the session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransportState {
    /// Nothing prepared
    Stopped,

    /// Waiting for the renderer to prepare the current track
    Loading,

    /// Currently playing
    Playing,

    /// Paused mid-track
    Paused,
}

impl TransportState {
    /// Whether the renderer holds a prepared track
    pub fn is_active(self) -> bool {
        matches!(self, Self::Playing | Self::Paused)
    }
}

/// Configuration for the playback sequencer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// How long a load may wait for `Prepared` before it counts as a
    /// failure, in milliseconds (default: 10000, 0 disables the watchdog)
    pub prepare_timeout_ms: u64,

    /// Session event pump tick in milliseconds (default: 50)
    pub event_poll_interval_ms: u64,

    /// Fixed seed for shuffle picks (default: None, seeded from entropy)
    pub shuffle_seed: Option<u64>,
}

impl PlaybackConfig {
    /// Prepare watchdog timeout, if enabled
    pub fn prepare_timeout(&self) -> Option<Duration> {
        (self.prepare_timeout_ms > 0).then(|| Duration::from_millis(self.prepare_timeout_ms))
    }

    /// Event pump tick, never shorter than one millisecond
    pub fn event_poll_interval(&self) -> Duration {
        Duration::from_millis(self.event_poll_interval_ms.max(1))
    }
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            prepare_timeout_ms: 10_000,
            event_poll_interval_ms: 50,
            shuffle_seed: None,
        }
    }
}

//! Playback Events
//!
//! Push-style notifications from the sequencer to the presentation layer.
//! A sink is invoked synchronously on every transition:
//! - Track started (after the renderer prepared it)
//! - Paused / resumed / stopped
//! - Shuffle and repeat mode changes
//! - Position changes caused by seeking
//! - Recoverable warnings (skipped tracks, renderer faults)

use amp_core::RepeatMode;
use crossbeam_channel::Sender;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Notification-level problems the sequencer recovered from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum PlaybackWarning {
    /// The track could not be loaded and was skipped
    #[error("Failed to load track at index {index}")]
    UnplayableTrack { index: usize },

    /// The renderer never finished preparing the track; it was skipped
    #[error("Timed out preparing track at index {index}")]
    PrepareTimedOut { index: usize },

    /// The renderer failed mid-playback
    #[error("Playback error (code {code})")]
    RendererFault { code: i32 },

    /// Every track failed in a row; playback stopped
    #[error("No playable tracks")]
    AllTracksUnplayable,
}

/// Receiver of sequencer notifications
///
/// At most one sink is attached to a sequencer. Sinks run while the
/// sequencer is locked, so they must not call back into it; hand work to
/// another thread instead (see [`ChannelCallback`]).
pub trait PlaybackCallback: Send {
    /// A newly prepared track started playing
    fn on_track_started(&mut self, index: usize);

    /// Playback paused
    fn on_track_paused(&mut self);

    /// Playback resumed from pause
    fn on_track_resumed(&mut self);

    /// Playback stopped
    fn on_track_stopped(&mut self);

    /// Repeat mode changed
    fn on_repeat_mode_changed(&mut self, mode: RepeatMode);

    /// Shuffle toggled
    fn on_shuffle_mode_changed(&mut self, enabled: bool);

    /// Position jumped (seek), in whole seconds
    fn on_position_changed(&mut self, seconds: u64);

    /// Something went wrong and was recovered from
    fn on_playback_warning(&mut self, _warning: PlaybackWarning) {}
}

/// Events emitted by the sequencer, one per callback
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlaybackEvent {
    /// See [`PlaybackCallback::on_track_started`]
    TrackStarted { index: usize },

    /// See [`PlaybackCallback::on_track_paused`]
    TrackPaused,

    /// See [`PlaybackCallback::on_track_resumed`]
    TrackResumed,

    /// See [`PlaybackCallback::on_track_stopped`]
    TrackStopped,

    /// See [`PlaybackCallback::on_repeat_mode_changed`]
    RepeatModeChanged { mode: RepeatMode },

    /// See [`PlaybackCallback::on_shuffle_mode_changed`]
    ShuffleModeChanged { enabled: bool },

    /// See [`PlaybackCallback::on_position_changed`]
    PositionChanged { seconds: u64 },

    /// See [`PlaybackCallback::on_playback_warning`]
    Warning { warning: PlaybackWarning },
}

impl PlaybackEvent {
    /// Invoke the matching callback on `sink`
    pub fn dispatch(self, sink: &mut dyn PlaybackCallback) {
        match self {
            Self::TrackStarted { index } => sink.on_track_started(index),
            Self::TrackPaused => sink.on_track_paused(),
            Self::TrackResumed => sink.on_track_resumed(),
            Self::TrackStopped => sink.on_track_stopped(),
            Self::RepeatModeChanged { mode } => sink.on_repeat_mode_changed(mode),
            Self::ShuffleModeChanged { enabled } => sink.on_shuffle_mode_changed(enabled),
            Self::PositionChanged { seconds } => sink.on_position_changed(seconds),
            Self::Warning { warning } => sink.on_playback_warning(warning),
        }
    }
}

/// Sink that forwards every callback as a [`PlaybackEvent`] over a channel
///
/// Lets a UI thread consume notifications without touching the sequencer
/// lock. Send failures (receiver dropped) are ignored.
#[derive(Debug, Clone)]
pub struct ChannelCallback {
    tx: Sender<PlaybackEvent>,
}

impl ChannelCallback {
    /// Forward into `tx`
    pub fn new(tx: Sender<PlaybackEvent>) -> Self {
        Self { tx }
    }

    fn forward(&self, event: PlaybackEvent) {
        self.tx.send(event).ok();
    }
}

impl PlaybackCallback for ChannelCallback {
    fn on_track_started(&mut self, index: usize) {
        self.forward(PlaybackEvent::TrackStarted { index });
    }

    fn on_track_paused(&mut self) {
        self.forward(PlaybackEvent::TrackPaused);
    }

    fn on_track_resumed(&mut self) {
        self.forward(PlaybackEvent::TrackResumed);
    }

    fn on_track_stopped(&mut self) {
        self.forward(PlaybackEvent::TrackStopped);
    }

    fn on_repeat_mode_changed(&mut self, mode: RepeatMode) {
        self.forward(PlaybackEvent::RepeatModeChanged { mode });
    }

    fn on_shuffle_mode_changed(&mut self, enabled: bool) {
        self.forward(PlaybackEvent::ShuffleModeChanged { enabled });
    }

    fn on_position_changed(&mut self, seconds: u64) {
        self.forward(PlaybackEvent::PositionChanged { seconds });
    }

    fn on_playback_warning(&mut self, warning: PlaybackWarning) {
        self.forward(PlaybackEvent::Warning { warning });
    }
}

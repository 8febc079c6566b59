//! Platform-agnostic renderer contract
//!
//! Abstracts the decoder/output device that actually produces sound.

use crate::error::Result;
use amp_core::Track;
use crossbeam_channel::{unbounded, Receiver, Sender};
use std::fmt;
use std::time::Duration;

/// Identifies one load request
///
/// Tokens increase monotonically per sequencer. Only events carrying the
/// token of the most recent load are honoured; everything else is stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LoadToken(u64);

impl LoadToken {
    /// Wrap a raw token value
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Raw token value
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for LoadToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Lifecycle notifications raised by a renderer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RendererEventKind {
    /// The loaded track is ready to start
    Prepared,

    /// The track played to its end
    Completed,

    /// Decoding or output failed; `code` is renderer-specific
    Error { code: i32 },
}

/// A renderer notification tagged with the load it belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RendererEvent {
    /// Load the event belongs to
    pub token: LoadToken,
    /// What happened
    pub kind: RendererEventKind,
}

impl RendererEvent {
    /// Create a new event
    pub fn new(token: LoadToken, kind: RendererEventKind) -> Self {
        Self { token, kind }
    }
}

/// Platform-agnostic audio renderer
///
/// Implementors wrap a platform decoder and output. The sequencer owns the
/// renderer exclusively and drives it with the commands below; the renderer
/// reports back asynchronously through a [`RendererEventSender`], from any
/// thread, tagging every event with the token of the load it concerns.
pub trait Renderer: Send {
    /// Reset, point at `track`, and begin preparing it without blocking
    ///
    /// Completion is reported later as `Prepared` or `Error` for `token`.
    ///
    /// # Returns
    /// * `Ok(())` - Preparation started
    /// * `Err(_)` - The track cannot be loaded at all (missing source, bad URI)
    fn load_and_prepare(&mut self, track: &Track, token: LoadToken) -> Result<()>;

    /// Start or resume output of the prepared track
    fn start(&mut self);

    /// Pause output, keeping the position
    fn pause(&mut self);

    /// Stop output
    fn stop(&mut self);

    /// Seek to an absolute position in the prepared track
    fn seek_to(&mut self, position: Duration);

    /// Free the underlying device; no other command follows
    fn release(&mut self);

    /// Whether sound is currently being produced
    fn is_playing(&self) -> bool;

    /// Current playback position
    fn position(&self) -> Duration;

    /// Duration of the prepared track as reported by the decoder
    fn duration(&self) -> Duration;
}

/// Handle a renderer uses to deliver events to its session
///
/// Cheap to clone and safe to move to decoder threads.
#[derive(Debug, Clone)]
pub struct RendererEventSender {
    tx: Sender<RendererEvent>,
}

impl RendererEventSender {
    /// Deliver an event
    ///
    /// Returns false once the receiving session has gone away.
    pub fn send(&self, event: RendererEvent) -> bool {
        self.tx.send(event).is_ok()
    }

    /// Report that the load for `token` is prepared
    pub fn prepared(&self, token: LoadToken) -> bool {
        self.send(RendererEvent::new(token, RendererEventKind::Prepared))
    }

    /// Report that the track for `token` reached its end
    pub fn completed(&self, token: LoadToken) -> bool {
        self.send(RendererEvent::new(token, RendererEventKind::Completed))
    }

    /// Report a failure for `token`
    pub fn error(&self, token: LoadToken, code: i32) -> bool {
        self.send(RendererEvent::new(token, RendererEventKind::Error { code }))
    }
}

/// Create the channel renderer events travel through
pub fn renderer_channel() -> (RendererEventSender, Receiver<RendererEvent>) {
    let (tx, rx) = unbounded();
    (RendererEventSender { tx }, rx)
}

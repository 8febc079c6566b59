//! Thread-safe playback session
//!
//! Wraps a [`Sequencer`] in `Arc<Mutex<_>>` and runs an event pump thread that
//! feeds renderer events into it, so renderer notifications and caller
//! commands never interleave.

use crate::{
    error::Result,
    renderer::{renderer_channel, Renderer, RendererEvent, RendererEventSender},
    sequencer::Sequencer,
    types::PlaybackConfig,
};
use crossbeam_channel::{bounded, select, tick, Receiver, Sender};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// A sequencer plus the thread that delivers its renderer events
///
/// Commands go through [`PlaybackSession::lock`] or [`PlaybackSession::with`].
/// The attached callback runs while the session lock is held, so it must not
/// call back into the session; forward events to another thread instead
/// (see [`crate::ChannelCallback`]).
pub struct PlaybackSession {
    sequencer: Arc<Mutex<Sequencer>>,
    events: RendererEventSender,
    shutdown_tx: Option<Sender<()>>,
    pump: Option<JoinHandle<()>>,
}

impl PlaybackSession {
    /// Create a session
    ///
    /// `make_renderer` receives the sender the renderer must use to report
    /// prepared/completed/error events.
    pub fn new<R, F>(config: PlaybackConfig, make_renderer: F) -> Result<Self>
    where
        R: Renderer + 'static,
        F: FnOnce(RendererEventSender) -> Result<R>,
    {
        let (events, event_rx) = renderer_channel();
        let poll_interval = config.event_poll_interval();
        let renderer = make_renderer(events.clone())?;

        let sequencer = Arc::new(Mutex::new(Sequencer::new(config, renderer)));
        let (shutdown_tx, shutdown_rx) = bounded(1);

        let pump_sequencer = Arc::clone(&sequencer);
        let pump = thread::Builder::new()
            .name("amp-event-pump".to_string())
            .spawn(move || {
                Self::run_event_pump(&pump_sequencer, &event_rx, &shutdown_rx, poll_interval);
            })?;

        Ok(Self {
            sequencer,
            events,
            shutdown_tx: Some(shutdown_tx),
            pump: Some(pump),
        })
    }

    /// Event pump loop
    ///
    /// Applies renderer events in arrival order and checks the prepare
    /// timeout every `poll_interval`, however busy the event channel is.
    fn run_event_pump(
        sequencer: &Mutex<Sequencer>,
        event_rx: &Receiver<RendererEvent>,
        shutdown_rx: &Receiver<()>,
        poll_interval: Duration,
    ) {
        debug!("Event pump started");
        let ticker = tick(poll_interval);
        loop {
            select! {
                recv(event_rx) -> event => match event {
                    Ok(event) => {
                        let mut guard = lock_sequencer(sequencer);
                        guard.handle_renderer_event(event);
                        guard.check_prepare_timeout(Instant::now());
                    }
                    Err(_) => break,
                },
                recv(shutdown_rx) -> _ => break,
                recv(ticker) -> _ => {
                    lock_sequencer(sequencer).check_prepare_timeout(Instant::now());
                }
            }
        }
        debug!("Event pump stopped");
    }

    /// Lock the sequencer for a sequence of commands or queries
    pub fn lock(&self) -> MutexGuard<'_, Sequencer> {
        lock_sequencer(&self.sequencer)
    }

    /// Run `f` against the locked sequencer
    pub fn with<T>(&self, f: impl FnOnce(&mut Sequencer) -> T) -> T {
        f(&mut self.lock())
    }

    /// Sender for renderer events, for renderers created outside
    /// [`PlaybackSession::new`] or for tests
    pub fn event_sender(&self) -> RendererEventSender {
        self.events.clone()
    }

    /// Stop the event pump and release the renderer
    ///
    /// Idempotent.
    pub fn shutdown(&mut self) {
        let Some(shutdown_tx) = self.shutdown_tx.take() else {
            return;
        };
        // Disconnecting the shutdown channel wakes the pump
        drop(shutdown_tx);

        if let Some(pump) = self.pump.take() {
            if pump.join().is_err() {
                warn!("Event pump thread panicked");
            }
        }

        self.lock().release();
        debug!("Playback session shut down");
    }
}

impl Drop for PlaybackSession {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for PlaybackSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaybackSession")
            .field("running", &self.pump.is_some())
            .finish_non_exhaustive()
    }
}

fn lock_sequencer(sequencer: &Mutex<Sequencer>) -> MutexGuard<'_, Sequencer> {
    sequencer.lock().unwrap_or_else(PoisonError::into_inner)
}

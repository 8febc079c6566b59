//! Playback sequencer - core orchestration
//!
//! Owns the session state (track list, current index, shuffle/repeat,
//! shuffle history, readiness) and drives the renderer through it.

use crate::{
    error::{PlaybackError, Result},
    events::{PlaybackCallback, PlaybackEvent, PlaybackWarning},
    history::ShuffleHistory,
    renderer::{LoadToken, Renderer, RendererEvent, RendererEventKind},
    shuffle::ShufflePicker,
    types::{PlaybackConfig, TransportState},
};
use amp_core::{PlaybackSnapshot, RepeatMode, Track};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Sole authority over which track plays, in what transport state, and how
/// next/previous navigate
///
/// All methods run synchronously; the only asynchronous step is the
/// renderer's prepare, whose outcome comes back through
/// [`Sequencer::handle_renderer_event`]. Callers that receive renderer events
/// on another thread must serialize them with commands (see
/// [`crate::PlaybackSession`]).
///
/// State machine:
/// `Stopped -> Loading -> Playing <-> Paused`, any state `-> Stopped` on
/// stop or renderer error, `Loading -> Loading` when a load fails and the
/// next track is tried.
pub struct Sequencer {
    // Collaborators
    renderer: Box<dyn Renderer>,
    callback: Option<Box<dyn PlaybackCallback>>,

    // Track list (catalog order, never reordered)
    tracks: Option<Arc<[Track]>>,
    current_index: usize,

    // Navigation modifiers
    shuffle_enabled: bool,
    repeat_mode: RepeatMode,
    shuffle_history: ShuffleHistory,
    picker: ShufflePicker,

    // Transport
    state: TransportState,
    player_ready: bool,
    has_been_ready: bool,
    restored_position: Option<Duration>,

    // Load tracking
    last_token: u64,
    active_load: Option<LoadToken>,
    loading_since: Option<Instant>,
    // Indices that failed to load since the last prepare or user command
    failed_loads: HashSet<usize>,
    prepare_timeout: Option<Duration>,

    released: bool,
}

impl Sequencer {
    /// Create a sequencer driving `renderer`
    pub fn new(config: PlaybackConfig, renderer: impl Renderer + 'static) -> Self {
        Self::with_boxed_renderer(config, Box::new(renderer))
    }

    /// Create a sequencer from an already boxed renderer
    pub fn with_boxed_renderer(config: PlaybackConfig, renderer: Box<dyn Renderer>) -> Self {
        Self {
            renderer,
            callback: None,
            tracks: None,
            current_index: 0,
            shuffle_enabled: false,
            repeat_mode: RepeatMode::Off,
            shuffle_history: ShuffleHistory::new(),
            picker: ShufflePicker::new(config.shuffle_seed),
            state: TransportState::Stopped,
            player_ready: false,
            has_been_ready: false,
            restored_position: None,
            last_token: 0,
            active_load: None,
            loading_since: None,
            failed_loads: HashSet::new(),
            prepare_timeout: config.prepare_timeout(),
            released: false,
        }
    }

    // ===== Session Setup =====

    /// Replace the working track list
    ///
    /// Only allowed while stopped. Clears the shuffle history; a current
    /// index beyond the new list is reset to 0, otherwise it is kept.
    pub fn set_track_list(&mut self, tracks: impl Into<Arc<[Track]>>) -> Result<()> {
        match self.state {
            TransportState::Loading => {
                warn!("Track list not replaced: a track is loading");
                return Err(PlaybackError::LoadInProgress);
            }
            TransportState::Playing | TransportState::Paused => {
                warn!("Track list not replaced: playback is active");
                return Err(PlaybackError::PlaybackActive);
            }
            TransportState::Stopped => {}
        }

        let tracks: Arc<[Track]> = tracks.into();
        if !tracks.is_empty() && self.current_index >= tracks.len() {
            debug!(
                index = self.current_index,
                len = tracks.len(),
                "Current index outside new track list, resetting to 0"
            );
            self.current_index = 0;
        }

        self.shuffle_history.clear();
        info!(count = tracks.len(), "Track list assigned");
        self.tracks = Some(tracks);
        Ok(())
    }

    /// Apply persisted index, shuffle flag and repeat mode
    ///
    /// Equivalent to [`Sequencer::restore`] with a zero position.
    pub fn set_initial_state(
        &mut self,
        index: usize,
        shuffle_enabled: bool,
        repeat_mode: RepeatMode,
    ) -> Result<()> {
        self.restore(PlaybackSnapshot {
            track_index: index,
            position_secs: 0,
            shuffle_enabled,
            repeat_mode,
        })
    }

    /// Seed the session from persisted state
    ///
    /// Accepted only before any track has been prepared. The restored
    /// position is reported by [`Sequencer::position`] until a track is
    /// prepared or playback is stopped. An index outside the assigned list
    /// falls back to 0.
    pub fn restore(&mut self, snapshot: PlaybackSnapshot) -> Result<()> {
        if self.has_been_ready || self.state != TransportState::Stopped {
            return Err(PlaybackError::AlreadyStarted);
        }

        let mut index = snapshot.track_index;
        if let Some(len) = self.tracks.as_ref().map(|t| t.len()) {
            if index >= len.max(1) {
                warn!(index, len, "Restored index outside track list, using 0");
                index = 0;
            }
        }

        self.current_index = index;
        self.shuffle_enabled = snapshot.shuffle_enabled;
        self.repeat_mode = snapshot.repeat_mode;
        self.shuffle_history.clear();
        self.restored_position =
            (snapshot.position_secs > 0).then(|| Duration::from_secs(snapshot.position_secs));

        debug!(
            index,
            shuffle = self.shuffle_enabled,
            repeat = %self.repeat_mode,
            "Restored playback state"
        );
        Ok(())
    }

    // ===== Callback Sink =====

    /// Attach `callback`, replacing any existing sink
    pub fn attach_callback(&mut self, callback: Box<dyn PlaybackCallback>) {
        self.callback = Some(callback);
    }

    /// Detach the current sink, if any
    pub fn detach_callback(&mut self) -> Option<Box<dyn PlaybackCallback>> {
        self.callback.take()
    }

    /// Replace the sink with `callback` (or none), returning the old one
    pub fn set_callback(
        &mut self,
        callback: Option<Box<dyn PlaybackCallback>>,
    ) -> Option<Box<dyn PlaybackCallback>> {
        std::mem::replace(&mut self.callback, callback)
    }

    /// Whether a sink is attached
    pub fn has_callback(&self) -> bool {
        self.callback.is_some()
    }

    // ===== Playback Control =====

    /// Select a track explicitly and play it from the start
    ///
    /// Clears the shuffle history.
    pub fn select_track(&mut self, index: usize) -> Result<()> {
        let len = self.require_tracks()?;
        if index >= len {
            return Err(PlaybackError::IndexOutOfBounds { index, len });
        }

        self.shuffle_history.clear();
        self.current_index = index;
        self.failed_loads.clear();
        debug!(index, "Track selected");
        self.play_current();
        Ok(())
    }

    /// Pause if playing, resume if paused, load the current track otherwise
    pub fn toggle_play_pause(&mut self) -> Result<()> {
        self.require_tracks()?;

        if self.renderer.is_playing() {
            self.pause();
        } else if !self.player_ready {
            self.failed_loads.clear();
            self.play_current();
        } else {
            self.renderer.start();
            self.state = TransportState::Playing;
            debug!(index = self.current_index, "Track resumed");
            self.emit(PlaybackEvent::TrackResumed);
        }
        Ok(())
    }

    /// Pause playback
    ///
    /// No-op unless a prepared track is playing.
    pub fn pause(&mut self) {
        if !self.player_ready || self.state != TransportState::Playing {
            debug!(state = ?self.state, "Pause ignored");
            return;
        }

        self.renderer.pause();
        self.state = TransportState::Paused;
        debug!(index = self.current_index, "Track paused");
        self.emit(PlaybackEvent::TrackPaused);
    }

    /// Stop playback
    ///
    /// Supersedes any in-flight load, clears readiness and resets the
    /// reported position to zero.
    pub fn stop(&mut self) {
        if self.state != TransportState::Stopped {
            self.renderer.stop();
        }

        self.active_load = None;
        self.loading_since = None;
        self.player_ready = false;
        self.restored_position = None;
        self.failed_loads.clear();
        self.state = TransportState::Stopped;
        debug!(index = self.current_index, "Playback stopped");
        self.emit(PlaybackEvent::TrackStopped);
    }

    /// Skip to the next track
    ///
    /// At the end of the list without repeat-all (and without shuffle) this
    /// stops instead and the index stays on the last track.
    pub fn play_next(&mut self) -> Result<()> {
        self.require_tracks()?;
        self.failed_loads.clear();
        if self.advance() {
            self.play_current();
        }
        Ok(())
    }

    /// Go to the previous track
    ///
    /// In shuffle mode, retraces the shuffle history while it lasts.
    /// Otherwise steps back one index, wrapping from the first track to the
    /// last regardless of repeat mode.
    pub fn play_previous(&mut self) -> Result<()> {
        let len = self.require_tracks()?;
        self.failed_loads.clear();

        let retraced = if self.shuffle_enabled {
            self.shuffle_history.pop()
        } else {
            None
        };

        self.current_index = match retraced {
            Some(index) => index,
            None if self.current_index == 0 => len - 1,
            None => self.current_index - 1,
        };

        self.play_current();
        Ok(())
    }

    // ===== Seek =====

    /// Seek to `percent` (0-100) of the current track
    ///
    /// Returns the absolute target position.
    pub fn seek_to_percent(&mut self, percent: u8) -> Result<Duration> {
        if !self.player_ready {
            return Err(PlaybackError::NotReady);
        }
        if percent > 100 {
            return Err(PlaybackError::InvalidSeekPercent(percent));
        }

        let duration_ms = self.renderer.duration().as_millis() as u64;
        let target = Duration::from_millis(duration_ms * u64::from(percent) / 100);

        self.renderer.seek_to(target);
        debug!(percent, target_ms = target.as_millis() as u64, "Seek");
        self.emit(PlaybackEvent::PositionChanged {
            seconds: target.as_secs(),
        });
        Ok(target)
    }

    // ===== Shuffle & Repeat =====

    /// Flip shuffle, returning the new value
    ///
    /// Turning shuffle off discards the shuffle history.
    pub fn toggle_shuffle(&mut self) -> bool {
        self.shuffle_enabled = !self.shuffle_enabled;
        if !self.shuffle_enabled {
            self.shuffle_history.clear();
        }

        info!(enabled = self.shuffle_enabled, "Shuffle mode changed");
        self.emit(PlaybackEvent::ShuffleModeChanged {
            enabled: self.shuffle_enabled,
        });
        self.shuffle_enabled
    }

    /// Cycle Off -> Track -> All -> Off, returning the new mode
    pub fn toggle_repeat_mode(&mut self) -> RepeatMode {
        self.repeat_mode = self.repeat_mode.next();

        info!(mode = %self.repeat_mode, "Repeat mode changed");
        self.emit(PlaybackEvent::RepeatModeChanged {
            mode: self.repeat_mode,
        });
        self.repeat_mode
    }

    // ===== Renderer Events =====

    /// React to a renderer notification
    ///
    /// Events for anything but the most recent load are dropped.
    pub fn handle_renderer_event(&mut self, event: RendererEvent) {
        if self.active_load != Some(event.token) {
            debug!(token = %event.token, kind = ?event.kind, "Ignoring stale renderer event");
            return;
        }

        match event.kind {
            RendererEventKind::Prepared => self.on_prepared(),
            RendererEventKind::Completed => self.on_completed(),
            RendererEventKind::Error { code } => self.on_renderer_error(code),
        }
    }

    /// Give up on a load that has waited longer than the prepare timeout
    ///
    /// Returns true if the load was abandoned (and the next track tried).
    pub fn check_prepare_timeout(&mut self, now: Instant) -> bool {
        let (Some(timeout), Some(since)) = (self.prepare_timeout, self.loading_since) else {
            return false;
        };
        if self.state != TransportState::Loading || now.saturating_duration_since(since) < timeout
        {
            return false;
        }

        let index = self.current_index;
        warn!(index, timeout_ms = timeout.as_millis() as u64, "Track prepare timed out");
        self.renderer.stop();
        if self.skip_failed_load(PlaybackWarning::PrepareTimedOut { index }) {
            self.play_current();
        }
        true
    }

    fn on_prepared(&mut self) {
        if self.state != TransportState::Loading {
            debug!(state = ?self.state, "Ignoring prepared event outside loading");
            return;
        }

        self.player_ready = true;
        self.has_been_ready = true;
        self.restored_position = None;
        self.loading_since = None;
        self.failed_loads.clear();

        self.renderer.start();
        self.state = TransportState::Playing;
        info!(index = self.current_index, "Track started");
        self.emit(PlaybackEvent::TrackStarted {
            index: self.current_index,
        });
    }

    fn on_completed(&mut self) {
        if !self.state.is_active() {
            debug!(state = ?self.state, "Ignoring completion outside playback");
            return;
        }
        // Some decoders fire a completion before anything was played
        if self.renderer.position().is_zero() {
            debug!(index = self.current_index, "Ignoring completion at position zero");
            return;
        }

        debug!(index = self.current_index, repeat = %self.repeat_mode, "Track completed");
        self.player_ready = false;
        if self.repeat_mode == RepeatMode::Track || self.advance() {
            self.play_current();
        }
    }

    fn on_renderer_error(&mut self, code: i32) {
        if self.state == TransportState::Loading {
            let index = self.current_index;
            warn!(index, code, "Renderer failed to prepare track");
            if self.skip_failed_load(PlaybackWarning::UnplayableTrack { index }) {
                self.play_current();
            }
            return;
        }

        warn!(index = self.current_index, code, "Renderer error during playback");
        self.renderer.stop();
        self.active_load = None;
        self.loading_since = None;
        self.player_ready = false;
        self.state = TransportState::Stopped;
        self.emit(PlaybackEvent::TrackPaused);
        self.emit(PlaybackEvent::Warning {
            warning: PlaybackWarning::RendererFault { code },
        });
    }

    // ===== Sequencing =====

    /// Next-index algorithm
    ///
    /// Returns false when the end of the list stopped playback.
    fn advance(&mut self) -> bool {
        let len = self.track_count();

        if self.shuffle_enabled {
            self.shuffle_history.push(self.current_index);
            self.current_index = self
                .picker
                .pick_other_excluding(self.current_index, len, &self.failed_loads)
                .unwrap_or(self.current_index);
            return true;
        }

        self.shuffle_history.clear();
        if self.current_index + 1 < len {
            self.current_index += 1;
            true
        } else if self.repeat_mode == RepeatMode::All {
            self.current_index = 0;
            true
        } else {
            debug!(index = self.current_index, "End of track list");
            self.stop();
            false
        }
    }

    /// Load the track at the current index
    ///
    /// Loads the renderer rejects outright are skipped here, in a loop, until
    /// one is accepted or the unplayable-run guard stops playback.
    fn play_current(&mut self) {
        if self.released {
            return;
        }
        let Some(tracks) = self.tracks.clone() else {
            return;
        };
        if tracks.is_empty() {
            return;
        }

        loop {
            let index = self.current_index;
            let token = self.begin_load();
            let track = &tracks[index];
            debug!(index, token = %token, track = %track.full_title(), "Loading track");

            match self.renderer.load_and_prepare(track, token) {
                Ok(()) => return,
                Err(err) => {
                    warn!(index, error = %err, "Failed to load track, skipping");
                    if !self.skip_failed_load(PlaybackWarning::UnplayableTrack { index }) {
                        return;
                    }
                }
            }
        }
    }

    /// Enter Loading under a fresh token, superseding any earlier load
    fn begin_load(&mut self) -> LoadToken {
        self.last_token += 1;
        let token = LoadToken::new(self.last_token);

        self.active_load = Some(token);
        self.loading_since = Some(Instant::now());
        self.player_ready = false;
        self.state = TransportState::Loading;
        token
    }

    /// Report a failed load and move to the next track
    ///
    /// Returns true if another load should be issued. Once every track in
    /// the list has failed without a successful prepare in between, stops
    /// instead. Shuffle only jumps to tracks that have not failed yet.
    fn skip_failed_load(&mut self, warning: PlaybackWarning) -> bool {
        self.active_load = None;
        self.loading_since = None;
        self.emit(PlaybackEvent::Warning { warning });

        self.failed_loads.insert(self.current_index);
        if self.failed_loads.len() >= self.track_count() {
            warn!(
                failures = self.failed_loads.len(),
                "No playable track in list, stopping"
            );
            self.stop();
            self.emit(PlaybackEvent::Warning {
                warning: PlaybackWarning::AllTracksUnplayable,
            });
            return false;
        }

        self.advance()
    }

    fn require_tracks(&self) -> Result<usize> {
        match self.tracks.as_deref() {
            None => Err(PlaybackError::NoTrackList),
            Some([]) => Err(PlaybackError::EmptyTrackList),
            Some(tracks) => Ok(tracks.len()),
        }
    }

    fn emit(&mut self, event: PlaybackEvent) {
        if let Some(callback) = self.callback.as_deref_mut() {
            event.dispatch(callback);
        }
    }

    // ===== State Queries =====

    /// Current transport state
    pub fn state(&self) -> TransportState {
        self.state
    }

    /// Index of the current track, once a non-empty list is assigned
    pub fn current_index(&self) -> Option<usize> {
        self.current_track().map(|_| self.current_index)
    }

    /// The current track, once a non-empty list is assigned
    pub fn current_track(&self) -> Option<&Track> {
        self.tracks.as_deref()?.get(self.current_index)
    }

    /// `"<artist> - <title>"` of the current track
    pub fn current_track_title(&self) -> Option<String> {
        self.current_track().map(Track::full_title)
    }

    /// The assigned track list, in catalog order
    pub fn tracks(&self) -> Option<&[Track]> {
        self.tracks.as_deref()
    }

    /// Number of tracks in the assigned list
    pub fn track_count(&self) -> usize {
        self.tracks.as_deref().map_or(0, <[Track]>::len)
    }

    /// Whether shuffle is enabled
    pub fn is_shuffle_enabled(&self) -> bool {
        self.shuffle_enabled
    }

    /// Current repeat mode
    pub fn repeat_mode(&self) -> RepeatMode {
        self.repeat_mode
    }

    /// Whether a track is prepared (playing or paused)
    pub fn is_ready(&self) -> bool {
        self.player_ready
    }

    /// Whether the renderer is producing sound
    pub fn is_playing(&self) -> bool {
        self.renderer.is_playing()
    }

    /// Whether a load is waiting for the renderer
    pub fn is_loading(&self) -> bool {
        self.state == TransportState::Loading
    }

    /// Elapsed position in the current track
    ///
    /// Before the first prepare this is the restored position; after a stop
    /// it is zero.
    pub fn position(&self) -> Duration {
        if self.player_ready {
            self.renderer.position()
        } else {
            self.restored_position.unwrap_or(Duration::ZERO)
        }
    }

    /// Elapsed position in whole seconds
    pub fn position_secs(&self) -> u64 {
        self.position().as_secs()
    }

    /// Duration of the current track
    ///
    /// The decoder's figure once prepared, the catalog's before that.
    pub fn duration(&self) -> Duration {
        if self.player_ready {
            self.renderer.duration()
        } else {
            self.current_track()
                .map_or(Duration::ZERO, Track::duration)
        }
    }

    /// Number of shuffle jumps that "previous" can retrace
    pub fn shuffle_history_len(&self) -> usize {
        self.shuffle_history.len()
    }

    /// Values to persist across restarts
    pub fn snapshot(&self) -> PlaybackSnapshot {
        PlaybackSnapshot {
            track_index: self.current_index,
            position_secs: self.position_secs(),
            shuffle_enabled: self.shuffle_enabled,
            repeat_mode: self.repeat_mode,
        }
    }

    // ===== Teardown =====

    /// Stop output and free the renderer
    ///
    /// Idempotent; no callbacks are emitted.
    pub fn release(&mut self) {
        if self.released {
            return;
        }
        if self.state != TransportState::Stopped {
            self.renderer.stop();
        }
        self.active_load = None;
        self.loading_since = None;
        self.player_ready = false;
        self.state = TransportState::Stopped;

        self.renderer.release();
        self.released = true;
        debug!("Renderer released");
    }
}

impl Drop for Sequencer {
    fn drop(&mut self) {
        self.release();
    }
}

impl std::fmt::Debug for Sequencer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sequencer")
            .field("state", &self.state)
            .field("current_index", &self.current_index)
            .field("track_count", &self.track_count())
            .field("shuffle_enabled", &self.shuffle_enabled)
            .field("repeat_mode", &self.repeat_mode)
            .field("shuffle_history", &self.shuffle_history.as_slice())
            .field("player_ready", &self.player_ready)
            .field("active_load", &self.active_load)
            .finish_non_exhaustive()
    }
}

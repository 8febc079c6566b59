//! Shared helpers for playback integration tests

#![allow(dead_code)]

use amp_core::{Track, TrackId};
use amp_playback::{
    ChannelCallback, LoadToken, PlaybackConfig, PlaybackEvent, Renderer, RendererEvent,
    RendererEventKind, Result, Sequencer,
};
use crossbeam_channel::{unbounded, Receiver};
use std::collections::HashSet;
use std::sync::{Arc, Mutex, Once};
use std::time::Duration;

static INIT: Once = Once::new();

/// Initialize tracing for tests (idempotent)
pub fn init_logging() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_test_writer()
            .with_max_level(tracing::Level::DEBUG)
            .try_init()
            .ok();
    });
}

// ===== Mock Renderer =====

/// Command recorded by [`MockRenderer`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Load(TrackId, LoadToken),
    Start,
    Pause,
    Stop,
    Seek(Duration),
    Release,
}

#[derive(Debug, Default)]
pub struct MockState {
    pub commands: Vec<Command>,
    pub playing: bool,
    pub position: Duration,
    pub duration: Duration,
    pub failing: HashSet<TrackId>,
    pub last_token: Option<LoadToken>,
}

/// Renderer that records every command
///
/// Clones share state, so a test keeps one handle while the sequencer owns
/// the other. Nothing is reported back on its own: tests deliver
/// prepared/completed/error events explicitly.
#[derive(Debug, Clone, Default)]
pub struct MockRenderer {
    state: Arc<Mutex<MockState>>,
}

impl MockRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make loads of `id` fail synchronously
    pub fn fail_track(&self, id: i64) {
        self.state().failing.insert(TrackId::new(id));
    }

    pub fn state(&self) -> std::sync::MutexGuard<'_, MockState> {
        self.state.lock().unwrap()
    }

    pub fn commands(&self) -> Vec<Command> {
        self.state().commands.clone()
    }

    pub fn clear_commands(&self) {
        self.state().commands.clear();
    }

    /// Track ids loaded so far, in order
    pub fn loaded_ids(&self) -> Vec<i64> {
        self.state()
            .commands
            .iter()
            .filter_map(|c| match c {
                Command::Load(id, _) => Some(id.get()),
                _ => None,
            })
            .collect()
    }

    pub fn last_token(&self) -> LoadToken {
        self.state().last_token.expect("no load issued")
    }

    pub fn set_position(&self, position: Duration) {
        self.state().position = position;
    }

    pub fn release_count(&self) -> usize {
        self.state()
            .commands
            .iter()
            .filter(|c| **c == Command::Release)
            .count()
    }
}

impl Renderer for MockRenderer {
    fn load_and_prepare(&mut self, track: &Track, token: LoadToken) -> Result<()> {
        let mut state = self.state();
        state.commands.push(Command::Load(track.id, token));
        if state.failing.contains(&track.id) {
            return Err(amp_playback::PlaybackError::renderer(format!(
                "cannot open {}",
                track.title
            )));
        }
        state.last_token = Some(token);
        state.playing = false;
        state.position = Duration::ZERO;
        state.duration = track.duration();
        Ok(())
    }

    fn start(&mut self) {
        let mut state = self.state();
        state.commands.push(Command::Start);
        state.playing = true;
    }

    fn pause(&mut self) {
        let mut state = self.state();
        state.commands.push(Command::Pause);
        state.playing = false;
    }

    fn stop(&mut self) {
        let mut state = self.state();
        state.commands.push(Command::Stop);
        state.playing = false;
        state.position = Duration::ZERO;
    }

    fn seek_to(&mut self, position: Duration) {
        let mut state = self.state();
        state.commands.push(Command::Seek(position));
        state.position = position;
    }

    fn release(&mut self) {
        self.state().commands.push(Command::Release);
    }

    fn is_playing(&self) -> bool {
        self.state().playing
    }

    fn position(&self) -> Duration {
        self.state().position
    }

    fn duration(&self) -> Duration {
        self.state().duration
    }
}

// ===== Fixtures =====

/// Tracks A-E, ids 0-4, 200 s each
pub fn five_tracks() -> Vec<Track> {
    ["A", "B", "C", "D", "E"]
        .iter()
        .enumerate()
        .map(|(i, title)| Track::new(TrackId::new(i as i64), *title, "Test Artist", 200_000))
        .collect()
}

pub fn tracks(count: usize) -> Vec<Track> {
    (0..count)
        .map(|i| Track::new(TrackId::new(i as i64), format!("Track {}", i), "Test Artist", 180_000))
        .collect()
}

/// Sequencer with a recording renderer and a channel-backed sink
pub struct Harness {
    pub sequencer: Sequencer,
    pub renderer: MockRenderer,
    pub events: Receiver<PlaybackEvent>,
}

impl Harness {
    pub fn new(track_list: Vec<Track>) -> Self {
        Self::with_config(track_list, PlaybackConfig::default())
    }

    pub fn with_config(track_list: Vec<Track>, config: PlaybackConfig) -> Self {
        init_logging();
        let renderer = MockRenderer::new();
        let mut sequencer = Sequencer::new(config, renderer.clone());
        sequencer.set_track_list(track_list).unwrap();

        let (tx, events) = unbounded();
        sequencer.attach_callback(Box::new(ChannelCallback::new(tx)));

        Self {
            sequencer,
            renderer,
            events,
        }
    }

    /// Seeded shuffle for reproducible runs
    pub fn seeded(track_list: Vec<Track>, seed: u64) -> Self {
        Self::with_config(
            track_list,
            PlaybackConfig {
                shuffle_seed: Some(seed),
                ..PlaybackConfig::default()
            },
        )
    }

    /// Deliver `Prepared` for the most recent load
    pub fn prepare(&mut self) {
        let token = self.renderer.last_token();
        self.sequencer
            .handle_renderer_event(RendererEvent::new(token, RendererEventKind::Prepared));
    }

    /// Select `index` and deliver its `Prepared`
    pub fn play(&mut self, index: usize) {
        self.sequencer.select_track(index).unwrap();
        self.prepare();
    }

    /// Play to the end of the current track and deliver `Completed`
    pub fn complete(&mut self) {
        let duration = self.renderer.duration();
        self.renderer.set_position(duration);
        let token = self.renderer.last_token();
        self.sequencer
            .handle_renderer_event(RendererEvent::new(token, RendererEventKind::Completed));
    }

    pub fn error(&mut self, code: i32) {
        let token = self.renderer.last_token();
        self.sequencer
            .handle_renderer_event(RendererEvent::new(token, RendererEventKind::Error { code }));
    }

    /// Drain callback events received so far
    pub fn drain_events(&self) -> Vec<PlaybackEvent> {
        self.events.try_iter().collect()
    }

    pub fn index(&self) -> usize {
        self.sequencer.current_index().unwrap()
    }
}

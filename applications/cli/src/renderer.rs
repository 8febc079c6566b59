//! Simulated renderer
//!
//! Stands in for a platform decoder: a worker thread reports `Prepared` after
//! a configurable delay and `Completed` once the wall clock has run through
//! the track. No audio is produced.

use crate::config::SimulatorSettings;
use amp_core::{Track, TrackId};
use amp_playback::{LoadToken, Renderer, RendererEventSender, Result};
use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender};
use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Elapsed-time tracking for the loaded track
#[derive(Debug, Default)]
struct PlaybackClock {
    duration: Duration,
    offset: Duration,
    started: Option<Instant>,
}

impl PlaybackClock {
    fn position(&self) -> Duration {
        let elapsed = self.started.map_or(Duration::ZERO, |at| at.elapsed());
        (self.offset + elapsed).min(self.duration)
    }

    fn is_playing(&self) -> bool {
        self.started.is_some()
    }

    fn start(&mut self) {
        if self.started.is_none() {
            self.started = Some(Instant::now());
        }
    }

    fn pause(&mut self) {
        self.offset = self.position();
        self.started = None;
    }

    fn seek(&mut self, position: Duration) {
        self.offset = position.min(self.duration);
        if self.started.is_some() {
            self.started = Some(Instant::now());
        }
    }

    fn reset(&mut self, duration: Duration) {
        *self = Self {
            duration,
            ..Self::default()
        };
    }

    /// Time left while running
    fn remaining(&self) -> Option<Duration> {
        self.started
            .map(|_| self.duration.saturating_sub(self.position()))
    }
}

fn lock_clock(clock: &Mutex<PlaybackClock>) -> MutexGuard<'_, PlaybackClock> {
    clock.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Debug)]
enum WorkerCommand {
    Load { token: LoadToken, fail: bool },
    Stop,
    /// Clock changed, recompute deadlines
    Wake,
    Shutdown,
}

#[derive(Debug, Clone, Copy)]
struct PendingLoad {
    token: LoadToken,
    fail: bool,
    due: Instant,
}

struct Worker {
    commands: Receiver<WorkerCommand>,
    events: RendererEventSender,
    clock: Arc<Mutex<PlaybackClock>>,
    prepare_delay: Duration,
    error_code: i32,
    pending: Option<PendingLoad>,
    current: Option<LoadToken>,
}

impl Worker {
    fn run(mut self) {
        debug!("Simulated renderer started");
        loop {
            let received = match self.next_deadline() {
                Some(at) => self.commands.recv_deadline(at),
                None => self
                    .commands
                    .recv()
                    .map_err(|_| RecvTimeoutError::Disconnected),
            };

            match received {
                Ok(WorkerCommand::Load { token, fail }) => {
                    self.current = None;
                    self.pending = Some(PendingLoad {
                        token,
                        fail,
                        due: Instant::now() + self.prepare_delay,
                    });
                }
                Ok(WorkerCommand::Stop) => {
                    self.pending = None;
                    self.current = None;
                }
                Ok(WorkerCommand::Wake) => {}
                Ok(WorkerCommand::Shutdown) | Err(RecvTimeoutError::Disconnected) => break,
                Err(RecvTimeoutError::Timeout) => self.fire_due(),
            }
        }
        debug!("Simulated renderer stopped");
    }

    fn next_deadline(&self) -> Option<Instant> {
        if let Some(pending) = self.pending {
            return Some(pending.due);
        }
        self.current?;
        lock_clock(&self.clock)
            .remaining()
            .map(|left| Instant::now() + left)
    }

    fn fire_due(&mut self) {
        if let Some(pending) = self.pending {
            if Instant::now() < pending.due {
                return;
            }
            self.pending = None;
            if pending.fail {
                debug!(token = %pending.token, "Simulated prepare failure");
                self.events.error(pending.token, self.error_code);
            } else {
                self.current = Some(pending.token);
                self.events.prepared(pending.token);
            }
            return;
        }

        let Some(token) = self.current else {
            return;
        };
        let finished = {
            let mut clock = lock_clock(&self.clock);
            let finished = clock.remaining() == Some(Duration::ZERO);
            if finished {
                clock.pause();
            }
            finished
        };
        if finished {
            self.current = None;
            self.events.completed(token);
        }
    }
}

/// Renderer backed by a timer thread
pub struct SimulatedRenderer {
    commands: Sender<WorkerCommand>,
    clock: Arc<Mutex<PlaybackClock>>,
    failing: HashSet<TrackId>,
    worker: Option<JoinHandle<()>>,
}

impl SimulatedRenderer {
    /// Start the worker thread reporting to `events`
    pub fn spawn(settings: SimulatorSettings, events: RendererEventSender) -> Result<Self> {
        let (commands, rx) = unbounded();
        let clock = Arc::new(Mutex::new(PlaybackClock::default()));

        let worker = Worker {
            commands: rx,
            events,
            clock: Arc::clone(&clock),
            prepare_delay: Duration::from_millis(settings.prepare_delay_ms),
            error_code: settings.error_code,
            pending: None,
            current: None,
        };
        let worker = thread::Builder::new()
            .name("amp-sim-renderer".to_string())
            .spawn(move || worker.run())?;

        Ok(Self {
            commands,
            clock,
            failing: settings.failing_ids.into_iter().map(TrackId::new).collect(),
            worker: Some(worker),
        })
    }

    fn clock(&self) -> MutexGuard<'_, PlaybackClock> {
        lock_clock(&self.clock)
    }

    fn send(&self, command: WorkerCommand) {
        // Worker only exits on shutdown
        self.commands.send(command).ok();
    }
}

impl Renderer for SimulatedRenderer {
    fn load_and_prepare(&mut self, track: &Track, token: LoadToken) -> Result<()> {
        self.clock().reset(track.duration());
        self.send(WorkerCommand::Load {
            token,
            fail: self.failing.contains(&track.id),
        });
        Ok(())
    }

    fn start(&mut self) {
        self.clock().start();
        self.send(WorkerCommand::Wake);
    }

    fn pause(&mut self) {
        self.clock().pause();
        self.send(WorkerCommand::Wake);
    }

    fn stop(&mut self) {
        let mut clock = self.clock();
        let duration = clock.duration;
        clock.reset(duration);
        drop(clock);
        self.send(WorkerCommand::Stop);
    }

    fn seek_to(&mut self, position: Duration) {
        self.clock().seek(position);
        self.send(WorkerCommand::Wake);
    }

    fn release(&mut self) {
        let Some(worker) = self.worker.take() else {
            return;
        };
        self.send(WorkerCommand::Shutdown);
        if worker.join().is_err() {
            warn!("Simulated renderer thread panicked");
        }
    }

    fn is_playing(&self) -> bool {
        self.clock().is_playing()
    }

    fn position(&self) -> Duration {
        self.clock().position()
    }

    fn duration(&self) -> Duration {
        self.clock().duration
    }
}

impl Drop for SimulatedRenderer {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use amp_playback::{renderer_channel, RendererEvent, RendererEventKind};

    const WAIT: Duration = Duration::from_secs(5);

    fn settings(prepare_delay_ms: u64, failing_ids: Vec<i64>) -> SimulatorSettings {
        SimulatorSettings {
            prepare_delay_ms,
            failing_ids,
            ..SimulatorSettings::default()
        }
    }

    fn track(id: i64, duration_ms: u64) -> Track {
        Track::new(TrackId::new(id), "Test", "Artist", duration_ms)
    }

    #[test]
    fn prepares_then_completes() {
        let (events, rx) = renderer_channel();
        let mut renderer = SimulatedRenderer::spawn(settings(5, Vec::new()), events).unwrap();
        let token = LoadToken::new(1);

        renderer.load_and_prepare(&track(1, 40), token).unwrap();
        assert_eq!(
            rx.recv_timeout(WAIT).unwrap(),
            RendererEvent::new(token, RendererEventKind::Prepared)
        );
        assert!(!renderer.is_playing());
        assert_eq!(renderer.duration(), Duration::from_millis(40));

        renderer.start();
        assert!(renderer.is_playing());
        assert_eq!(
            rx.recv_timeout(WAIT).unwrap(),
            RendererEvent::new(token, RendererEventKind::Completed)
        );
        assert_eq!(renderer.position(), Duration::from_millis(40));
        assert!(!renderer.is_playing());

        renderer.release();
    }

    #[test]
    fn failing_track_reports_error() {
        let (events, rx) = renderer_channel();
        let mut renderer = SimulatedRenderer::spawn(settings(1, vec![7]), events).unwrap();
        let token = LoadToken::new(3);

        renderer.load_and_prepare(&track(7, 1_000), token).unwrap();
        assert_eq!(
            rx.recv_timeout(WAIT).unwrap(),
            RendererEvent::new(token, RendererEventKind::Error { code: -1004 })
        );
    }

    #[test]
    fn stop_cancels_pending_prepare() {
        let (events, rx) = renderer_channel();
        let mut renderer = SimulatedRenderer::spawn(settings(50, Vec::new()), events).unwrap();

        renderer
            .load_and_prepare(&track(1, 1_000), LoadToken::new(1))
            .unwrap();
        renderer.stop();
        assert!(rx.recv_timeout(Duration::from_millis(200)).is_err());
    }

    #[test]
    fn pause_freezes_position_and_seek_moves_it() {
        let (events, _rx) = renderer_channel();
        let mut renderer = SimulatedRenderer::spawn(settings(1, Vec::new()), events).unwrap();
        renderer
            .load_and_prepare(&track(1, 60_000), LoadToken::new(1))
            .unwrap();

        renderer.seek_to(Duration::from_secs(30));
        assert_eq!(renderer.position(), Duration::from_secs(30));

        renderer.start();
        renderer.pause();
        let paused_at = renderer.position();
        thread::sleep(Duration::from_millis(20));
        assert_eq!(renderer.position(), paused_at);
        assert!(paused_at >= Duration::from_secs(30));

        renderer.stop();
        assert_eq!(renderer.position(), Duration::ZERO);
    }

    #[test]
    fn seek_clamps_to_duration() {
        let (events, _rx) = renderer_channel();
        let mut renderer = SimulatedRenderer::spawn(settings(1, Vec::new()), events).unwrap();
        renderer
            .load_and_prepare(&track(1, 10_000), LoadToken::new(1))
            .unwrap();

        renderer.seek_to(Duration::from_secs(99));
        assert_eq!(renderer.position(), Duration::from_secs(10));
    }
}

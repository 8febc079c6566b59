//! Tests for the threaded playback session
//!
//! Renderer events travel through the session's channel and are applied by
//! the pump thread, so assertions poll until the expected state shows up.

mod common;

use amp_playback::{
    ChannelCallback, LoadToken, PlaybackConfig, PlaybackEvent, PlaybackSession, PlaybackWarning,
    TransportState,
};
use common::{five_tracks, init_logging, MockRenderer};
use crossbeam_channel::{unbounded, Receiver};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

const WAIT: Duration = Duration::from_secs(5);

fn wait_until(mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + WAIT;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(2));
    }
    condition()
}

fn start_session(
    config: PlaybackConfig,
) -> (PlaybackSession, MockRenderer, Receiver<PlaybackEvent>) {
    init_logging();
    let renderer = MockRenderer::new();
    let handle = renderer.clone();
    let session = PlaybackSession::new(config, move |_events| Ok(handle)).unwrap();

    let (tx, rx) = unbounded();
    session
        .with(|seq| {
            seq.attach_callback(Box::new(ChannelCallback::new(tx)));
            seq.set_track_list(five_tracks())
        })
        .unwrap();

    (session, renderer, rx)
}

#[test]
fn test_prepared_event_starts_playback() {
    let (session, renderer, rx) = start_session(PlaybackConfig::default());
    session.lock().select_track(2).unwrap();
    assert!(session.lock().is_loading());

    assert!(session.event_sender().prepared(renderer.last_token()));
    assert!(wait_until(|| session.lock().is_playing()));

    assert_eq!(session.lock().current_index(), Some(2));
    assert_eq!(rx.recv_timeout(WAIT).unwrap(), PlaybackEvent::TrackStarted { index: 2 });
}

#[test]
fn test_superseded_load_events_are_dropped() {
    let (session, renderer, rx) = start_session(PlaybackConfig::default());
    let sender = session.event_sender();

    session.lock().select_track(0).unwrap();
    let stale = renderer.last_token();
    session.lock().select_track(1).unwrap();
    let current = renderer.last_token();

    // Delivered in order: the stale prepare is applied (and ignored) first
    sender.prepared(stale);
    sender.prepared(current);
    assert!(wait_until(|| session.lock().is_playing()));

    assert_eq!(session.lock().current_index(), Some(1));
    assert_eq!(rx.recv_timeout(WAIT).unwrap(), PlaybackEvent::TrackStarted { index: 1 });
    assert!(rx.try_recv().is_err());
}

#[test]
fn test_completion_through_channel_advances() {
    let (session, renderer, _rx) = start_session(PlaybackConfig::default());
    let sender = session.event_sender();

    session.lock().select_track(0).unwrap();
    sender.prepared(renderer.last_token());
    assert!(wait_until(|| session.lock().is_playing()));

    renderer.set_position(Duration::from_secs(200));
    sender.completed(renderer.last_token());
    assert!(wait_until(|| session.lock().current_index() == Some(1)));
    assert!(wait_until(|| session.lock().is_loading()));
}

#[test]
fn test_pump_times_out_stalled_prepares() {
    let config = PlaybackConfig {
        prepare_timeout_ms: 20,
        event_poll_interval_ms: 5,
        ..PlaybackConfig::default()
    };
    let (session, renderer, rx) = start_session(config);

    // The renderer never reports back
    session.lock().select_track(0).unwrap();
    let all_failed = PlaybackEvent::Warning {
        warning: PlaybackWarning::AllTracksUnplayable,
    };
    let mut events = Vec::new();
    assert!(wait_until(|| {
        events.extend(rx.try_iter());
        events.contains(&all_failed)
    }));

    assert_eq!(session.lock().state(), TransportState::Stopped);
    assert_eq!(renderer.loaded_ids(), vec![0, 1, 2, 3, 4]);
    assert_eq!(
        events[0],
        PlaybackEvent::Warning {
            warning: PlaybackWarning::PrepareTimedOut { index: 0 }
        }
    );
}

#[test]
fn test_watchdog_runs_while_stale_events_stream_in() {
    let config = PlaybackConfig {
        prepare_timeout_ms: 30,
        event_poll_interval_ms: 10,
        ..PlaybackConfig::default()
    };
    let (session, _renderer, rx) = start_session(config);
    let sender = session.event_sender();

    session.lock().select_track(0).unwrap();

    let running = Arc::new(AtomicBool::new(true));
    let flood = {
        let running = Arc::clone(&running);
        thread::spawn(move || {
            while running.load(Ordering::Relaxed) {
                sender.prepared(LoadToken::new(u64::MAX));
                thread::sleep(Duration::from_millis(1));
            }
        })
    };

    let timed_out = PlaybackEvent::Warning {
        warning: PlaybackWarning::PrepareTimedOut { index: 0 },
    };
    let mut events = Vec::new();
    let fired = wait_until(|| {
        events.extend(rx.try_iter());
        events.contains(&timed_out)
    });

    running.store(false, Ordering::Relaxed);
    flood.join().unwrap();
    assert!(fired, "events: {:?}", events);
}

#[test]
fn test_shutdown_releases_renderer_once() {
    let (mut session, renderer, _rx) = start_session(PlaybackConfig::default());
    let sender = session.event_sender();
    session.lock().select_track(0).unwrap();

    session.shutdown();
    assert_eq!(renderer.release_count(), 1);
    assert_eq!(session.lock().state(), TransportState::Stopped);

    // Pump is gone: events have nowhere to go
    assert!(!sender.prepared(renderer.last_token()));

    session.shutdown();
    drop(session);
    assert_eq!(renderer.release_count(), 1);
}

#[test]
fn test_drop_shuts_down() {
    let (session, renderer, _rx) = start_session(PlaybackConfig::default());
    drop(session);
    assert_eq!(renderer.release_count(), 1);
}

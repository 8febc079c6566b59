//! AMP - Playback Sequencing
//!
//! Platform-agnostic playback sequencing for AMP.
//!
//! This crate provides:
//! - Track index management over a catalog-ordered track list
//! - Shuffle with exact "previous" retrace (LIFO shuffle history)
//! - Repeat modes (Off, Track, All)
//! - Play/pause/stop/seek lifecycle synchronized with an asynchronous
//!   renderer prepare step (load tokens discard stale events)
//! - Push-style callback sink for the presentation layer
//!
//! # Architecture
//!
//! `amp-playback` never decodes audio. The platform supplies a [`Renderer`]
//! that loads and prepares tracks asynchronously and reports back through a
//! [`RendererEventSender`]. The [`Sequencer`] decides what plays; a
//! [`PlaybackSession`] serializes renderer events with caller commands.
//!
//! # Example: Sequencing
//!
//! ```rust
//! use amp_core::{Track, TrackId};
//! use amp_playback::{
//!     LoadToken, PlaybackConfig, Renderer, RendererEvent, RendererEventKind, Result, Sequencer,
//! };
//! use std::time::Duration;
//!
//! // A renderer that accepts every load
//! #[derive(Default)]
//! struct NullRenderer {
//!     playing: bool,
//! }
//!
//! impl Renderer for NullRenderer {
//!     fn load_and_prepare(&mut self, _track: &Track, _token: LoadToken) -> Result<()> {
//!         Ok(())
//!     }
//!     fn start(&mut self) { self.playing = true; }
//!     fn pause(&mut self) { self.playing = false; }
//!     fn stop(&mut self) { self.playing = false; }
//!     fn seek_to(&mut self, _position: Duration) {}
//!     fn release(&mut self) {}
//!     fn is_playing(&self) -> bool { self.playing }
//!     fn position(&self) -> Duration { Duration::ZERO }
//!     fn duration(&self) -> Duration { Duration::from_secs(200) }
//! }
//!
//! let tracks: Vec<Track> = (0..5)
//!     .map(|i| Track::new(TrackId::new(i), format!("Track {}", i), "Artist", 200_000))
//!     .collect();
//!
//! let mut sequencer = Sequencer::new(PlaybackConfig::default(), NullRenderer::default());
//! sequencer.set_track_list(tracks)?;
//! sequencer.select_track(2)?;
//! assert!(sequencer.is_loading());
//!
//! // The renderer reports the prepare for the first load
//! sequencer.handle_renderer_event(RendererEvent::new(LoadToken::new(1), RendererEventKind::Prepared));
//! assert!(sequencer.is_playing());
//!
//! // Half way through a 200 s track
//! assert_eq!(sequencer.seek_to_percent(50)?, Duration::from_secs(100));
//! # Ok::<(), amp_playback::PlaybackError>(())
//! ```
//!
//! # Example: Shuffle and Repeat
//!
//! ```rust
//! use amp_core::RepeatMode;
//! # use amp_core::Track;
//! # use amp_playback::{LoadToken, PlaybackConfig, Renderer, Result, Sequencer};
//! # use std::time::Duration;
//! # struct NullRenderer;
//! # impl Renderer for NullRenderer {
//! #     fn load_and_prepare(&mut self, _: &Track, _: LoadToken) -> Result<()> { Ok(()) }
//! #     fn start(&mut self) {}
//! #     fn pause(&mut self) {}
//! #     fn stop(&mut self) {}
//! #     fn seek_to(&mut self, _: Duration) {}
//! #     fn release(&mut self) {}
//! #     fn is_playing(&self) -> bool { false }
//! #     fn position(&self) -> Duration { Duration::ZERO }
//! #     fn duration(&self) -> Duration { Duration::ZERO }
//! # }
//!
//! let mut sequencer = Sequencer::new(PlaybackConfig::default(), NullRenderer);
//!
//! assert!(sequencer.toggle_shuffle());
//! assert_eq!(sequencer.toggle_repeat_mode(), RepeatMode::Track);
//! assert_eq!(sequencer.toggle_repeat_mode(), RepeatMode::All);
//! assert_eq!(sequencer.toggle_repeat_mode(), RepeatMode::Off);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod events;
mod history;
mod renderer;
mod sequencer;
mod session;
mod shuffle;
pub mod types;

// Public exports
pub use error::{PlaybackError, Result};
pub use events::{ChannelCallback, PlaybackCallback, PlaybackEvent, PlaybackWarning};
pub use history::ShuffleHistory;
pub use renderer::{
    renderer_channel, LoadToken, Renderer, RendererEvent, RendererEventKind, RendererEventSender,
};
pub use sequencer::Sequencer;
pub use session::PlaybackSession;
pub use shuffle::ShufflePicker;
pub use types::{PlaybackConfig, TransportState};

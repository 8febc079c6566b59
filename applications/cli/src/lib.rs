//! AMP CLI - terminal driver for the playback sequencer
//!
//! Plays the presentation layer: loads a catalog, restores saved state,
//! feeds line commands into a [`amp_playback::PlaybackSession`] backed by a
//! simulated renderer, and prints callback events.

pub mod catalog;
pub mod commands;
pub mod config;
pub mod error;
pub mod renderer;
pub mod state;

//! Domain types shared across AMP crates

mod ids;
mod playback_state;
mod track;

pub use ids::TrackId;
pub use playback_state::{PlaybackSnapshot, RepeatMode};
pub use track::Track;

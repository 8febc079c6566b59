//! AMP Core
//!
//! Platform-agnostic domain types and contracts shared by every AMP crate.
//!
//! # Architecture
//!
//! The core crate defines:
//! - **Domain Types**: `Track`, `TrackId`, `RepeatMode`, `PlaybackSnapshot`
//! - **Core Traits**: `TrackCatalog` (the source of the ordered track list)
//! - **Error Handling**: Unified `CoreError` and `Result` types
//!
//! # Example
//!
//! ```rust
//! use amp_core::{format_duration, RepeatMode, Track, TrackId};
//! use std::time::Duration;
//!
//! let track = Track::new(TrackId::new(7), "Blue in Green", "Miles Davis", 337_000);
//! assert_eq!(track.full_title(), "Miles Davis - Blue in Green");
//! assert_eq!(format_duration(track.duration()), "05:37");
//!
//! assert_eq!(RepeatMode::Off.next(), RepeatMode::Track);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod format;
pub mod traits;
pub mod types;

// Re-export commonly used types
pub use error::{CoreError, Result};
pub use format::format_duration;
pub use traits::{StaticCatalog, TrackCatalog};
pub use types::{PlaybackSnapshot, RepeatMode, Track, TrackId};

/// Track catalogs for the CLI
use amp_core::{CoreError, StaticCatalog, Track, TrackCatalog, TrackId};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Catalog read from a JSON array of tracks
///
/// ```json
/// [{ "id": 1, "title": "Intro", "artist": "Band", "duration_ms": 95000 }]
/// ```
#[derive(Debug, Clone)]
pub struct JsonCatalog {
    path: PathBuf,
}

impl JsonCatalog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TrackCatalog for JsonCatalog {
    fn load_tracks(&self) -> amp_core::Result<Vec<Track>> {
        let data = fs::read_to_string(&self.path)?;
        let tracks: Vec<Track> = serde_json::from_str(&data)?;

        let mut seen = HashSet::new();
        if let Some(dup) = tracks.iter().find(|t| !seen.insert(t.id)) {
            return Err(CoreError::catalog(format!(
                "duplicate track id {} in {}",
                dup.id,
                self.path.display()
            )));
        }

        debug!(count = tracks.len(), path = %self.path.display(), "Catalog loaded");
        Ok(tracks)
    }
}

/// Five short tracks for trying the player without a catalog file
pub fn demo_catalog() -> StaticCatalog {
    let tracks = [
        ("Morning Static", "The Wavelengths", 12_000),
        ("Paper Lanterns", "Quiet Harbor", 9_500),
        ("Northbound", "The Wavelengths", 15_000),
        ("Glass Hours", "Mira Sol", 8_000),
        ("Last Ferry", "Quiet Harbor", 11_000),
    ]
    .into_iter()
    .enumerate()
    .map(|(i, (title, artist, duration_ms))| {
        Track::new(TrackId::new(i as i64 + 1), title, artist, duration_ms)
    })
    .collect();

    StaticCatalog::new(tracks)
}

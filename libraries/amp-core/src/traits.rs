/// Core traits for AMP
use crate::error::Result;
use crate::types::Track;

/// Source of the ordered track list for a session
///
/// Implementers decide how tracks are discovered (media store query,
/// directory scan, JSON file). The order returned is catalog order and is
/// never changed by playback.
pub trait TrackCatalog {
    /// Load every track, in catalog order
    ///
    /// # Errors
    /// Returns an error if the underlying store cannot be read
    fn load_tracks(&self) -> Result<Vec<Track>>;
}

/// In-memory catalog
#[derive(Debug, Clone, Default)]
pub struct StaticCatalog {
    tracks: Vec<Track>,
}

impl StaticCatalog {
    /// Wrap an existing track list
    pub fn new(tracks: Vec<Track>) -> Self {
        Self { tracks }
    }
}

impl TrackCatalog for StaticCatalog {
    fn load_tracks(&self) -> Result<Vec<Track>> {
        Ok(self.tracks.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TrackId;

    #[test]
    fn static_catalog_preserves_order() {
        let catalog = StaticCatalog::new(vec![
            Track::new(TrackId::new(3), "C", "Artist", 1000),
            Track::new(TrackId::new(1), "A", "Artist", 1000),
        ]);

        let tracks = catalog.load_tracks().unwrap();
        let ids: Vec<i64> = tracks.iter().map(|t| t.id.get()).collect();
        assert_eq!(ids, vec![3, 1]);
    }
}

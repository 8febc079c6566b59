//! Persisted playback state
//!
//! The sequencer only hands out and accepts [`PlaybackSnapshot`]s; this
//! module decides where they live on disk.

use crate::error::Result;
use amp_core::PlaybackSnapshot;
use std::fs;
use std::path::Path;
use tracing::debug;

/// Read the snapshot at `path`, if one was saved
pub fn load_snapshot(path: &Path) -> Result<Option<PlaybackSnapshot>> {
    if !path.exists() {
        debug!(path = %path.display(), "No saved playback state");
        return Ok(None);
    }

    let json = fs::read_to_string(path)?;
    let snapshot = PlaybackSnapshot::from_json(&json)?;
    Ok(Some(snapshot))
}

/// Write `snapshot` to `path`
///
/// Goes through a sibling temp file so an interrupted write never leaves a
/// truncated state file behind.
pub fn save_snapshot(path: &Path, snapshot: &PlaybackSnapshot) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let json = snapshot.to_json()?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, json)?;
    fs::rename(&tmp, path)?;

    debug!(path = %path.display(), "Playback state saved");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use amp_core::RepeatMode;

    #[test]
    fn missing_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_snapshot(&dir.path().join("state.json"))
            .unwrap()
            .is_none());
    }

    #[test]
    fn saved_snapshot_loads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("state.json");
        let snapshot = PlaybackSnapshot {
            track_index: 4,
            position_secs: 73,
            shuffle_enabled: true,
            repeat_mode: RepeatMode::Track,
        };

        save_snapshot(&path, &snapshot).unwrap();
        assert!(!path.with_extension("json.tmp").exists());
        assert_eq!(load_snapshot(&path).unwrap(), Some(snapshot));

        let raw = fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\"repeat_mode\": 1"));
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(load_snapshot(&path).is_err());
    }
}

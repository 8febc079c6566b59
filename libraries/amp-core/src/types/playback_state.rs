/// Playback state types that outlive a single process
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Repeat mode for playback
///
/// Declaration order is the toggle cycle and the persisted ordinal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepeatMode {
    /// Stop after the last track
    #[default]
    Off,
    /// Loop the current track
    Track,
    /// Loop the whole list
    All,
}

impl RepeatMode {
    /// All modes in toggle order
    pub const ALL: [RepeatMode; 3] = [RepeatMode::Off, RepeatMode::Track, RepeatMode::All];

    /// The mode that follows this one: Off -> Track -> All -> Off
    #[must_use]
    pub fn next(self) -> Self {
        Self::from_ordinal(self.ordinal() + 1).unwrap_or(Self::Off)
    }

    /// Persisted ordinal (0 = off, 1 = track, 2 = all)
    pub fn ordinal(self) -> u8 {
        match self {
            Self::Off => 0,
            Self::Track => 1,
            Self::All => 2,
        }
    }

    /// Mode for a persisted ordinal
    pub fn from_ordinal(ordinal: u8) -> Option<Self> {
        Self::ALL.get(usize::from(ordinal)).copied()
    }

    /// Convert to string representation
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Off => "off",
            Self::Track => "track",
            Self::All => "all",
        }
    }

    /// Parse from string
    #[must_use]
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "off" => Some(Self::Off),
            "track" => Some(Self::Track),
            "all" => Some(Self::All),
            _ => None,
        }
    }
}

impl std::fmt::Display for RepeatMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Session values handed to the sequencer at startup and read back for
/// external persistence
///
/// The core never stores this itself; whoever owns persistence decides
/// where the JSON goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PlaybackSnapshot {
    /// Index of the selected track in catalog order
    pub track_index: usize,

    /// Elapsed position in whole seconds
    pub position_secs: u64,

    /// Whether shuffle is enabled
    pub shuffle_enabled: bool,

    /// Repeat mode, persisted as its ordinal
    #[serde(with = "repeat_ordinal")]
    pub repeat_mode: RepeatMode,
}

impl PlaybackSnapshot {
    /// Serialize to JSON
    pub fn to_json(&self) -> crate::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse from JSON
    pub fn from_json(json: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

mod repeat_ordinal {
    use super::{Deserialize, Deserializer, RepeatMode, Serializer};

    pub fn serialize<S: Serializer>(mode: &RepeatMode, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(mode.ordinal())
    }

    // Unknown ordinals (written by a newer build, or hand-edited) fall back to Off.
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<RepeatMode, D::Error> {
        let ordinal = u8::deserialize(deserializer)?;
        Ok(RepeatMode::from_ordinal(ordinal).unwrap_or_default())
    }
}

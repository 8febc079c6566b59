/// Line commands and event formatting
use crate::error::{CliError, Result};
use amp_core::{format_duration, Track};
use amp_playback::{PlaybackEvent, Sequencer, TransportState};
use std::str::FromStr;

pub const HELP: &str = "\
Commands:
  play <n>      play track n (as numbered by `list`)
  toggle        play/pause
  pause         pause
  stop          stop
  next          next track
  prev          previous track
  seek <0-100>  jump to a percentage of the current track
  shuffle       toggle shuffle
  repeat        cycle repeat mode (off -> track -> all)
  status        show what is playing
  list          list tracks
  help          show this help
  quit          save state and exit";

/// A parsed input line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Zero-based track index
    Play(usize),
    Toggle,
    Pause,
    Stop,
    Next,
    Previous,
    Seek(u8),
    Shuffle,
    Repeat,
    Status,
    List,
    Help,
    Quit,
}

impl FromStr for Command {
    type Err = CliError;

    fn from_str(line: &str) -> Result<Self> {
        let mut words = line.split_whitespace();
        let Some(name) = words.next() else {
            return Err(CliError::invalid_command("empty line"));
        };
        let arg = words.next();
        if words.next().is_some() {
            return Err(CliError::invalid_command(format!("too many arguments: {}", line.trim())));
        }

        let command = match (name.to_ascii_lowercase().as_str(), arg) {
            ("play", Some(n)) => {
                let number: usize = n
                    .parse()
                    .map_err(|_| CliError::invalid_command(format!("not a track number: {}", n)))?;
                if number == 0 {
                    return Err(CliError::invalid_command("track numbers start at 1"));
                }
                Command::Play(number - 1)
            }
            ("seek", Some(p)) => Command::Seek(
                p.trim_end_matches('%')
                    .parse()
                    .map_err(|_| CliError::invalid_command(format!("not a percentage: {}", p)))?,
            ),
            ("toggle" | "t", None) => Command::Toggle,
            ("pause", None) => Command::Pause,
            ("stop", None) => Command::Stop,
            ("next" | "n", None) => Command::Next,
            ("prev" | "previous" | "p", None) => Command::Previous,
            ("shuffle", None) => Command::Shuffle,
            ("repeat", None) => Command::Repeat,
            ("status" | "s", None) => Command::Status,
            ("list" | "ls", None) => Command::List,
            ("help" | "?", None) => Command::Help,
            ("quit" | "exit" | "q", None) => Command::Quit,
            ("play" | "seek", None) => {
                return Err(CliError::invalid_command(format!("{} needs an argument", name)))
            }
            _ => return Err(CliError::invalid_command(line.trim().to_string())),
        };
        Ok(command)
    }
}

/// Apply `command` to the sequencer, returning text to print
///
/// `Quit` is handled by the caller.
pub fn execute(command: Command, sequencer: &mut Sequencer) -> Result<Option<String>> {
    let output = match command {
        Command::Play(index) => {
            sequencer.select_track(index)?;
            None
        }
        Command::Toggle => {
            sequencer.toggle_play_pause()?;
            None
        }
        Command::Pause => {
            sequencer.pause();
            None
        }
        Command::Stop => {
            sequencer.stop();
            None
        }
        Command::Next => {
            sequencer.play_next()?;
            None
        }
        Command::Previous => {
            sequencer.play_previous()?;
            None
        }
        Command::Seek(percent) => {
            sequencer.seek_to_percent(percent)?;
            None
        }
        Command::Shuffle => {
            sequencer.toggle_shuffle();
            None
        }
        Command::Repeat => {
            sequencer.toggle_repeat_mode();
            None
        }
        Command::Status => Some(status_line(sequencer)),
        Command::List => Some(track_listing(sequencer)),
        Command::Help => Some(HELP.to_string()),
        Command::Quit => None,
    };
    Ok(output)
}

/// One-line summary of the session
pub fn status_line(sequencer: &Sequencer) -> String {
    let state = match sequencer.state() {
        TransportState::Stopped => "stopped",
        TransportState::Loading => "loading",
        TransportState::Playing => "playing",
        TransportState::Paused => "paused",
    };
    let modes = format!(
        "shuffle {} | repeat {}",
        if sequencer.is_shuffle_enabled() { "on" } else { "off" },
        sequencer.repeat_mode()
    );

    match (sequencer.current_index(), sequencer.current_track_title()) {
        (Some(index), Some(title)) => format!(
            "[{}] {}/{} {} {} / {} | {}",
            state,
            index + 1,
            sequencer.track_count(),
            title,
            format_duration(sequencer.position()),
            format_duration(sequencer.duration()),
            modes
        ),
        _ => format!("[{}] no tracks | {}", state, modes),
    }
}

/// Numbered track list with the current track marked
pub fn track_listing(sequencer: &Sequencer) -> String {
    let Some(tracks) = sequencer.tracks() else {
        return "no track list".to_string();
    };
    let current = sequencer.current_index();

    tracks
        .iter()
        .enumerate()
        .map(|(i, track)| {
            let marker = if current == Some(i) { '>' } else { ' ' };
            format!("{} {:>3}. {}", marker, i + 1, track)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Human-readable form of a callback event
pub fn describe_event(event: &PlaybackEvent, tracks: &[Track]) -> String {
    match event {
        PlaybackEvent::TrackStarted { index } => match tracks.get(*index) {
            Some(track) => format!(
                "Now playing: {} ({})",
                track.full_title(),
                format_duration(track.duration())
            ),
            None => format!("Now playing track {}", index + 1),
        },
        PlaybackEvent::TrackPaused => "Paused".to_string(),
        PlaybackEvent::TrackResumed => "Resumed".to_string(),
        PlaybackEvent::TrackStopped => "Stopped".to_string(),
        PlaybackEvent::RepeatModeChanged { mode } => format!("Repeat: {}", mode),
        PlaybackEvent::ShuffleModeChanged { enabled } => {
            format!("Shuffle: {}", if *enabled { "on" } else { "off" })
        }
        PlaybackEvent::PositionChanged { seconds } => format!(
            "Position: {}",
            format_duration(std::time::Duration::from_secs(*seconds))
        ),
        PlaybackEvent::Warning { warning } => format!("Warning: {}", warning),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use amp_core::{RepeatMode, TrackId};
    use amp_playback::PlaybackWarning;

    #[test]
    fn parse_commands() {
        assert_eq!("play 3".parse::<Command>().unwrap(), Command::Play(2));
        assert_eq!("  NEXT ".parse::<Command>().unwrap(), Command::Next);
        assert_eq!("prev".parse::<Command>().unwrap(), Command::Previous);
        assert_eq!("seek 50%".parse::<Command>().unwrap(), Command::Seek(50));
        assert_eq!("seek 150".parse::<Command>().unwrap(), Command::Seek(150));
        assert_eq!("q".parse::<Command>().unwrap(), Command::Quit);
    }

    #[test]
    fn parse_rejects_bad_input() {
        for line in ["", "play", "play 0", "play x", "seek 300", "jump", "next 2", "play 1 2"] {
            assert!(
                matches!(line.parse::<Command>(), Err(CliError::InvalidCommand(_))),
                "{:?} should not parse",
                line
            );
        }
    }

    #[test]
    fn describe_events() {
        let tracks = vec![Track::new(TrackId::new(1), "Song", "Band", 65_000)];

        assert_eq!(
            describe_event(&PlaybackEvent::TrackStarted { index: 0 }, &tracks),
            "Now playing: Band - Song (01:05)"
        );
        assert_eq!(
            describe_event(
                &PlaybackEvent::RepeatModeChanged {
                    mode: RepeatMode::All
                },
                &tracks
            ),
            "Repeat: all"
        );
        assert_eq!(
            describe_event(&PlaybackEvent::PositionChanged { seconds: 100 }, &tracks),
            "Position: 01:40"
        );
        assert_eq!(
            describe_event(
                &PlaybackEvent::Warning {
                    warning: PlaybackWarning::UnplayableTrack { index: 0 }
                },
                &tracks
            ),
            "Warning: Failed to load track at index 0"
        );
    }
}

//! Wire protocol for the relay
//!
//! All control traffic is JSON text frames. Inbound commands are tagged by
//! `action`, outbound events by `type`. Live audio travels as raw binary
//! frames alongside the JSON and is never inspected.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::constants::DEFAULT_MASTER_NAME;
use crate::error::ProtocolError;

/// Command issued by a controller console.
///
/// An unrecognized `action` tag parses to [`ControllerCommand::Unknown`]
/// rather than an error, so the connection loop can observe and drop it.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ControllerCommand {
    PlayAnnouncement {
        #[serde(default)]
        id: Option<i64>,
        #[serde(default)]
        files: Vec<String>,
    },
    Stop,
    PlayMusic {
        #[serde(default)]
        file: Option<String>,
    },
    PlayPlaylist {
        #[serde(default)]
        playlist_id: Option<i64>,
        #[serde(default)]
        tracks: Vec<Value>,
        #[serde(default)]
        shuffle: bool,
    },
    MusicNext,
    MusicPrev,
    MusicShuffle,
    Pause,
    Resume,
    #[serde(other)]
    Unknown,
}

impl ControllerCommand {
    /// Parse a controller text frame
    pub fn parse(text: &str) -> Result<Self, ProtocolError> {
        serde_json::from_str(text).map_err(|e| ProtocolError::Malformed(e.to_string()))
    }

    /// Translate into the equivalent player-directed event.
    ///
    /// Returns `None` for [`ControllerCommand::Unknown`]; every recognized
    /// command maps to exactly one event.
    pub fn into_player_event(self) -> Option<ServerEvent> {
        match self {
            Self::PlayAnnouncement { id, files } => Some(ServerEvent::Play {
                content: PlayContent::Announcement,
                id,
                files: Some(files),
                file: None,
            }),
            Self::Stop => Some(ServerEvent::Stop),
            Self::PlayMusic { file } => Some(ServerEvent::Play {
                content: PlayContent::Music,
                id: None,
                files: None,
                file,
            }),
            Self::PlayPlaylist {
                playlist_id,
                tracks,
                shuffle,
            } => Some(ServerEvent::PlayPlaylist {
                playlist_id,
                tracks,
                shuffle,
            }),
            Self::MusicNext => Some(ServerEvent::MusicNext),
            Self::MusicPrev => Some(ServerEvent::MusicPrev),
            Self::MusicShuffle => Some(ServerEvent::MusicShuffle),
            Self::Pause => Some(ServerEvent::Pause),
            Self::Resume => Some(ServerEvent::Resume),
            Self::Unknown => None,
        }
    }
}

/// Command issued by a master (live microphone) connection
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum MasterCommand {
    StartAnnouncement {
        #[serde(default = "default_master_name")]
        username: String,
    },
    StopAnnouncement,
    #[serde(other)]
    Unknown,
}

fn default_master_name() -> String {
    DEFAULT_MASTER_NAME.to_string()
}

impl MasterCommand {
    /// Parse a master text frame
    pub fn parse(text: &str) -> Result<Self, ProtocolError> {
        serde_json::from_str(text).map_err(|e| ProtocolError::Malformed(e.to_string()))
    }
}

/// What a `play` event carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayContent {
    Announcement,
    Music,
}

/// Why a controller command was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockReason {
    MasterActive,
}

/// Event pushed to connected clients.
///
/// Content identifiers and file handles are carried opaquely; the relay
/// never resolves them.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerEvent {
    MasterStart {
        username: String,
    },
    MasterStop,
    PlayerStatus {
        data: Value,
    },
    Play {
        content: PlayContent,
        #[serde(skip_serializing_if = "Option::is_none")]
        id: Option<i64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        files: Option<Vec<String>>,
        #[serde(skip_serializing_if = "Option::is_none")]
        file: Option<String>,
    },
    PlayPlaylist {
        playlist_id: Option<i64>,
        tracks: Vec<Value>,
        shuffle: bool,
    },
    Stop,
    Pause,
    Resume,
    MusicNext,
    MusicPrev,
    MusicShuffle,
    Blocked {
        reason: BlockReason,
    },
}

impl ServerEvent {
    /// Serialize to a JSON text frame
    pub fn to_json(&self) -> String {
        // ServerEvent contains no non-string map keys, so this cannot fail
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// A single queued item on a connection's outbound channel
#[derive(Debug, Clone)]
pub enum Outbound {
    /// Structured control event, serialized to a text frame on write
    Event(ServerEvent),
    /// Opaque audio frame, forwarded verbatim as a binary frame
    Frame(Bytes),
}

/// Parse a player status report.
///
/// Players report arbitrary JSON; it is echoed to all audiences unmodified.
pub fn parse_status_report(text: &str) -> Result<Value, ProtocolError> {
    serde_json::from_str(text).map_err(|e| ProtocolError::Malformed(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_play_music() {
        let cmd = ControllerCommand::parse(r#"{"action":"play_music","file":"a.mp3"}"#).unwrap();
        assert_eq!(
            cmd,
            ControllerCommand::PlayMusic {
                file: Some("a.mp3".to_string())
            }
        );
    }

    #[test]
    fn test_parse_play_announcement_defaults() {
        let cmd = ControllerCommand::parse(r#"{"action":"play_announcement","id":7}"#).unwrap();
        assert_eq!(
            cmd,
            ControllerCommand::PlayAnnouncement {
                id: Some(7),
                files: vec![]
            }
        );
    }

    #[test]
    fn test_unknown_action_is_observable() {
        let cmd = ControllerCommand::parse(r#"{"action":"reboot_ship"}"#).unwrap();
        assert_eq!(cmd, ControllerCommand::Unknown);
        assert_eq!(cmd.into_player_event(), None);
    }

    #[test]
    fn test_malformed_message_is_error() {
        assert!(ControllerCommand::parse("not json").is_err());
        assert!(MasterCommand::parse(r#"{"no_action":true}"#).is_err());
    }

    #[test]
    fn test_master_start_default_username() {
        let cmd = MasterCommand::parse(r#"{"action":"start_announcement"}"#).unwrap();
        assert_eq!(
            cmd,
            MasterCommand::StartAnnouncement {
                username: "Master".to_string()
            }
        );
    }

    #[test]
    fn test_play_music_event_shape() {
        let event = ControllerCommand::PlayMusic {
            file: Some("a.mp3".to_string()),
        }
        .into_player_event()
        .unwrap();

        let value: Value = serde_json::from_str(&event.to_json()).unwrap();
        assert_eq!(
            value,
            json!({"type": "play", "content": "music", "file": "a.mp3"})
        );
    }

    #[test]
    fn test_play_announcement_event_shape() {
        let event = ControllerCommand::PlayAnnouncement {
            id: Some(3),
            files: vec!["boarding_it.mp3".to_string(), "boarding_en.mp3".to_string()],
        }
        .into_player_event()
        .unwrap();

        let value: Value = serde_json::from_str(&event.to_json()).unwrap();
        assert_eq!(
            value,
            json!({
                "type": "play",
                "content": "announcement",
                "id": 3,
                "files": ["boarding_it.mp3", "boarding_en.mp3"]
            })
        );
    }

    #[test]
    fn test_blocked_event_shape() {
        let value: Value = serde_json::from_str(
            &ServerEvent::Blocked {
                reason: BlockReason::MasterActive,
            }
            .to_json(),
        )
        .unwrap();
        assert_eq!(value, json!({"type": "blocked", "reason": "master_active"}));
    }

    #[test]
    fn test_playlist_tracks_stay_opaque() {
        let cmd = ControllerCommand::parse(
            r#"{"action":"play_playlist","playlist_id":2,"tracks":[{"id":9,"file":"t.mp3"}],"shuffle":true}"#,
        )
        .unwrap();

        let event = cmd.into_player_event().unwrap();
        let value: Value = serde_json::from_str(&event.to_json()).unwrap();
        assert_eq!(
            value,
            json!({
                "type": "play_playlist",
                "playlist_id": 2,
                "tracks": [{"id": 9, "file": "t.mp3"}],
                "shuffle": true
            })
        );
    }
}

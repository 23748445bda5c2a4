use thiserror::Error;

use crate::management::RecordKey;

/// Every failure the client can report.
///
/// Provider failures are passed through unchanged, except for the
/// "no active device" condition which the playback activator intercepts.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Spotify API error ({status}): {message}")]
    Provider { status: u16, message: String },

    #[error("No active device found")]
    NoActiveDevice,

    #[error("No playback device selected. Run `sporadio devices set <device-id>` first")]
    DeviceNotConfigured,

    #[error("{0} is empty")]
    EmptySource(String),

    #[error("Nothing is playing")]
    NothingPlaying,

    #[error("Unknown device: {0}")]
    UnknownDevice(String),

    #[error("Not a track link: {0}")]
    InvalidTrackUrl(String),

    #[error("Failed to access the {key} record: {reason}")]
    Persistence { key: RecordKey, reason: String },

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    pub fn persistence(key: RecordKey, reason: impl ToString) -> Self {
        Error::Persistence {
            key,
            reason: reason.to_string(),
        }
    }

    /// Returns true when the provider refused a playback call because no
    /// device is currently active.
    pub fn is_no_active_device(&self) -> bool {
        matches!(self, Error::NoActiveDevice)
    }
}

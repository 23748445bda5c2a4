//! # CLI Module
//!
//! User-facing commands of `sporadio`. Each command connects a [`Session`]
//! backed by the [`SpotifyClient`] and the on-disk [`FileStore`], calls into
//! the player, the radio engine or the provider and prints the result.
//!
//! ## Command Categories
//!
//! ### Authentication
//!
//! - [`auth`] - OAuth 2.0 PKCE login
//!
//! ### Playback
//!
//! - [`play`], [`pause`], [`toggle`], [`next`], [`previous`]
//! - [`seek`], [`position`], [`volume`], [`shuffle`], [`repeat`]
//! - [`like`], [`unlike`], [`link`], [`play_url`], [`queue`]
//! - [`status`], [`now_playing`]
//!
//! ### Devices
//!
//! - [`devices`] - list devices
//! - [`set_device`] - save the fallback device and transfer playback to it
//!
//! ### Radio
//!
//! - [`radio`] - build a radio from a seed
//! - [`refill_radio`], [`clear_radio`]
//! - [`liked`] - play the saved tracks through the radio playlist
//!
//! ### Library
//!
//! - [`tracks`], [`albums`], [`playlists`], [`artists`]
//! - [`album_tracks`], [`playlist_tracks`], [`search`]
//!
//! ## Error Handling
//!
//! Commands return [`crate::Result`]; the binary prints the error and exits
//! with status 1. Spinners are cleared before anything is returned.
//!
//! ## Usage Patterns
//!
//! ```bash
//! sporadio auth                        # Authenticate with Spotify
//! sporadio devices                     # Find your device id
//! sporadio devices set <device-id>     # Save it as fallback device
//! sporadio radio                       # Radio from the playing song
//! sporadio radio refill                # Trim played tracks, top up
//! ```

mod auth;
mod devices;
mod library;
mod player;
mod radio;

pub use auth::auth;
pub use devices::{devices, set_device};
pub use library::{album_tracks, albums, artists, playlist_tracks, playlists, search, tracks};
pub use player::{
    SeekDirection, VolumeChange, like, link, next, now_playing, pause, play, play_url, position,
    previous, queue, repeat, seek, shuffle, status, toggle, unlike, volume,
};
pub use radio::{RadioTarget, clear_radio, liked, radio, refill_radio};

use crate::{
    Result,
    config::Config,
    management::FileStore,
    radio::Session,
    spotify::{MusicProvider, SpotifyClient},
};

/// Session used by every CLI command.
pub type CliSession = Session<SpotifyClient, FileStore>;

/// Loads the configuration and the stored token and resolves the user id,
/// from `SPOTIFY_USER_ID` when set, from the API otherwise.
async fn connect() -> Result<CliSession> {
    let config = Config::from_env()?;
    let configured_user = config.user_id.clone();
    let client = SpotifyClient::connect(config).await?;

    let user_id = match configured_user {
        Some(id) => id,
        None => client.current_user().await?.id,
    };

    Ok(Session::new(user_id, client, FileStore::default()))
}

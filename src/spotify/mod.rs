//! # Spotify Integration Module
//!
//! This module is the boundary between the radio engine and the Spotify Web
//! API. The engine only ever talks to the [`MusicProvider`] trait; the
//! [`SpotifyClient`] implements it over HTTP, and tests substitute an
//! in-memory fake.
//!
//! ## Architecture
//!
//! ```text
//! CLI Layer
//!     ↓
//! Radio Engine / Player  (generic over MusicProvider)
//!     ↓
//! SpotifyClient          (reqwest, bearer token, retry on 502/429)
//!     ↓
//! Spotify Web API
//! ```
//!
//! ## Core Modules
//!
//! - [`auth`] - OAuth 2.0 PKCE flow: verifier/challenge, local callback,
//!   browser launch and code exchange.
//! - [`client`] - The HTTP implementation of [`MusicProvider`].
//!
//! ## Capability Set
//!
//! - **Playback control**: play, pause, skip, seek, volume, shuffle, repeat,
//!   transfer, devices, player state and queue
//! - **Library/catalog reads**: followed artists, albums, album tracks,
//!   playlists, playlist items, saved tracks and albums, search
//! - **Playlist writes**: create, add tracks, remove tracks, unfollow
//! - **Recommendations**: ranked tracks for a track/artist seed
//!
//! ## Error Mapping
//!
//! Every method reports failures as [`crate::Error`]. A player command that
//! the API rejects because no device is active comes back as
//! [`crate::Error::NoActiveDevice`] so the playback activator can retry it on
//! the saved device.

pub mod auth;
pub mod client;

pub use client::SpotifyClient;

use crate::{
    Result,
    types::{
        Album, Artist, CreatePlaylistRequest, CursorPage, Device, DeviceId, Page, PlayOptions,
        PlaybackState, Playlist, PlaylistItem, Queue, RecommendationSeed, RepeatState, SavedAlbum,
        SavedTrack, SearchResults, Track, TrackId, User,
    },
};

/// Maximum number of items a listing endpoint returns per page.
pub const PAGE_LIMIT: u32 = 50;

/// Maximum number of tracks per add/remove playlist call.
pub const PLAYLIST_BATCH_LIMIT: usize = 100;

/// Maximum number of results per recommendation call.
pub const RECOMMENDATION_LIMIT: usize = 100;

/// The provider capabilities the client consumes.
///
/// Methods that affect playback accept an optional device id; `None` targets
/// whichever device is currently active.
#[allow(async_fn_in_trait)]
pub trait MusicProvider {
    async fn current_user(&self) -> Result<User>;

    /// Current player state, `None` when nothing has been played recently.
    async fn playback_state(&self) -> Result<Option<PlaybackState>>;

    async fn devices(&self) -> Result<Vec<Device>>;

    async fn queue(&self) -> Result<Queue>;

    async fn play(&self, options: PlayOptions) -> Result<()>;

    async fn pause(&self, device_id: Option<DeviceId>) -> Result<()>;

    async fn next(&self, device_id: Option<DeviceId>) -> Result<()>;

    async fn previous(&self, device_id: Option<DeviceId>) -> Result<()>;

    async fn seek(&self, position_ms: u64) -> Result<()>;

    async fn set_volume(&self, percent: u8) -> Result<()>;

    async fn set_shuffle(&self, state: bool) -> Result<()>;

    async fn set_repeat(&self, state: RepeatState) -> Result<()>;

    async fn transfer_playback(&self, device_id: &str, play: bool) -> Result<()>;

    async fn add_to_queue(&self, track_id: &str, device_id: Option<DeviceId>) -> Result<()>;

    async fn saved_tracks(&self, limit: u32, offset: u32) -> Result<Page<SavedTrack>>;

    async fn saved_albums(&self, limit: u32, offset: u32) -> Result<Page<SavedAlbum>>;

    async fn save_tracks(&self, ids: &[TrackId]) -> Result<()>;

    async fn remove_saved_tracks(&self, ids: &[TrackId]) -> Result<()>;

    async fn followed_artists(&self, limit: u32, after: Option<&str>)
    -> Result<CursorPage<Artist>>;

    async fn artist(&self, artist_id: &str) -> Result<Artist>;

    async fn album(&self, album_id: &str) -> Result<Album>;

    async fn album_tracks(&self, album_id: &str, limit: u32, offset: u32) -> Result<Page<Track>>;

    async fn user_playlists(&self, limit: u32, offset: u32) -> Result<Page<Playlist>>;

    async fn playlist(&self, playlist_id: &str) -> Result<Playlist>;

    async fn playlist_items(
        &self,
        playlist_id: &str,
        limit: u32,
        offset: u32,
    ) -> Result<Page<PlaylistItem>>;

    async fn search(&self, query: &str, limit: u32, offset: u32) -> Result<SearchResults>;

    async fn create_playlist(
        &self,
        user_id: &str,
        request: &CreatePlaylistRequest,
    ) -> Result<Playlist>;

    /// Appends tracks in order. Callers keep batches within
    /// [`PLAYLIST_BATCH_LIMIT`].
    async fn add_tracks(&self, playlist_id: &str, ids: &[TrackId]) -> Result<()>;

    /// Removes every occurrence of the given tracks. Callers keep batches
    /// within [`PLAYLIST_BATCH_LIMIT`].
    async fn remove_tracks(&self, playlist_id: &str, ids: &[TrackId]) -> Result<()>;

    async fn unfollow_playlist(&self, playlist_id: &str) -> Result<()>;

    async fn recommendations(&self, seed: &RecommendationSeed, limit: usize)
    -> Result<Vec<Track>>;
}

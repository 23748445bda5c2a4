use std::{collections::HashMap, fmt};

use serde::{Deserialize, Serialize};
use tabled::Tabled;

/// Opaque provider identifier of a playable track.
pub type TrackId = String;
pub type ArtistId = String;
pub type DeviceId = String;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Token {
    pub access_token: String,
    pub refresh_token: String,
    pub scope: String,
    pub expires_in: u64,
    pub obtained_at: u64,
}

/// Raw body of the token endpoint. `refresh_token` is absent when the
/// provider does not rotate it.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub scope: String,
    #[serde(default = "default_expires_in")]
    pub expires_in: u64,
}

fn default_expires_in() -> u64 {
    3600
}

impl Token {
    /// Builds a token from the token endpoint body, keeping the previous
    /// refresh token when the provider did not rotate it.
    pub fn from_response(body: TokenResponse, previous_refresh: Option<&str>) -> Self {
        Self {
            access_token: body.access_token,
            refresh_token: body
                .refresh_token
                .or_else(|| previous_refresh.map(str::to_string))
                .unwrap_or_default(),
            scope: body.scope,
            expires_in: body.expires_in,
            obtained_at: chrono::Utc::now().timestamp() as u64,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub display_name: Option<String>,
}

/// One page of an offset-paginated listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    #[serde(default)]
    pub total: u32,
    #[serde(default)]
    pub limit: u32,
    #[serde(default)]
    pub offset: u32,
    pub next: Option<String>,
}

impl<T> Default for Page<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            total: 0,
            limit: 0,
            offset: 0,
            next: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CursorPage<T> {
    pub items: Vec<T>,
    pub next: Option<String>,
    pub cursors: Option<Cursors>,
    pub total: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cursors {
    pub after: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FollowedArtistsResponse {
    pub artists: CursorPage<Artist>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Artist {
    pub id: ArtistId,
    pub name: String,
    #[serde(default)]
    pub genres: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Album {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub uri: String,
    #[serde(default)]
    pub release_date: String,
    #[serde(default)]
    pub total_tracks: u32,
    #[serde(default)]
    pub artists: Vec<Artist>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Track {
    /// `None` for local files, which cannot be seeded or added to playlists.
    pub id: Option<TrackId>,
    pub name: String,
    #[serde(default)]
    pub uri: String,
    #[serde(default)]
    pub duration_ms: u64,
    #[serde(default)]
    pub artists: Vec<Artist>,
    pub album: Option<Album>,
    #[serde(default)]
    pub external_urls: HashMap<String, String>,
}

impl Track {
    pub fn artist_names(&self) -> String {
        self.artists
            .iter()
            .map(|a| a.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedTrack {
    #[serde(default)]
    pub added_at: String,
    pub track: Track,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedAlbum {
    #[serde(default)]
    pub added_at: String,
    pub album: Album,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaylistItem {
    /// Empty for podcast episodes that are no longer available.
    pub track: Option<Track>,
}

impl PlaylistItem {
    pub fn track_id(&self) -> Option<&TrackId> {
        self.track.as_ref().and_then(|t| t.id.as_ref())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaylistTracksRef {
    #[serde(default)]
    pub total: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Owner {
    pub id: String,
    pub display_name: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Playlist {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub uri: String,
    pub description: Option<String>,
    pub public: Option<bool>,
    #[serde(default)]
    pub collaborative: bool,
    pub snapshot_id: Option<String>,
    pub owner: Option<Owner>,
    pub tracks: Option<PlaylistTracksRef>,
    #[serde(default)]
    pub external_urls: HashMap<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Device {
    pub id: Option<DeviceId>,
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub is_active: bool,
    pub volume_percent: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DevicesResponse {
    pub devices: Vec<Device>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepeatState {
    #[default]
    Off,
    Track,
    Context,
}

impl RepeatState {
    pub fn as_str(&self) -> &'static str {
        match self {
            RepeatState::Off => "off",
            RepeatState::Track => "track",
            RepeatState::Context => "context",
        }
    }
}

impl fmt::Display for RepeatState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaybackContext {
    #[serde(rename = "type")]
    pub kind: String,
    pub uri: String,
    #[serde(default)]
    pub external_urls: HashMap<String, String>,
}

/// Snapshot of the player as reported by the provider. Read-only here.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlaybackState {
    pub device: Option<Device>,
    #[serde(default)]
    pub shuffle_state: bool,
    #[serde(default)]
    pub repeat_state: RepeatState,
    pub context: Option<PlaybackContext>,
    pub progress_ms: Option<u64>,
    #[serde(default)]
    pub is_playing: bool,
    pub item: Option<Track>,
}

impl PlaybackState {
    /// The item being played, but only while playback is running.
    pub fn playing_track(&self) -> Option<&Track> {
        if self.is_playing {
            self.item.as_ref()
        } else {
            None
        }
    }

    pub fn context_uri(&self) -> Option<&str> {
        self.context.as_ref().map(|c| c.uri.as_str())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Queue {
    pub currently_playing: Option<Track>,
    #[serde(default)]
    pub queue: Vec<Track>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationsResponse {
    pub tracks: Vec<Track>,
}

/// Seed of a recommendation request. The provider accepts at most five seeds
/// across tracks and artists.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecommendationSeed {
    pub tracks: Vec<TrackId>,
    pub artists: Vec<ArtistId>,
}

impl RecommendationSeed {
    pub fn from_track(id: TrackId) -> Self {
        Self {
            tracks: vec![id],
            artists: Vec::new(),
        }
    }

    pub fn from_artist(id: ArtistId) -> Self {
        Self {
            tracks: Vec::new(),
            artists: vec![id],
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchResults {
    pub tracks: Option<Page<Track>>,
    pub artists: Option<Page<Artist>>,
    pub albums: Option<Page<Album>>,
    pub playlists: Option<Page<Option<Playlist>>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePlaylistRequest {
    pub name: String,
    pub description: String,
    pub public: bool,
    pub collaborative: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddTracksRequest {
    pub uris: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackUri {
    pub uri: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoveTracksRequest {
    pub tracks: Vec<TrackUri>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaybackOffset {
    pub position: usize,
}

/// Arguments of a play call. `device_id` travels in the query string, the
/// rest is the JSON body.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PlayOptions {
    #[serde(skip)]
    pub device_id: Option<DeviceId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context_uri: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uris: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<PlaybackOffset>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position_ms: Option<u64>,
}

impl PlayOptions {
    /// Plays `context_uri` starting at the track with index `position`.
    pub fn context(context_uri: &str, position: usize) -> Self {
        Self {
            context_uri: Some(context_uri.to_string()),
            offset: Some(PlaybackOffset { position }),
            ..Default::default()
        }
    }

    pub fn on_device(mut self, device_id: Option<DeviceId>) -> Self {
        self.device_id = device_id;
        self
    }

    pub fn at_position(mut self, position_ms: Option<u64>) -> Self {
        self.position_ms = position_ms;
        self
    }
}

#[derive(Tabled)]
pub struct TrackTableRow {
    pub name: String,
    pub artists: String,
    pub album: String,
    pub id: String,
}

impl From<&Track> for TrackTableRow {
    fn from(track: &Track) -> Self {
        Self {
            name: track.name.clone(),
            artists: track.artist_names(),
            album: track
                .album
                .as_ref()
                .map(|a| a.name.clone())
                .unwrap_or_default(),
            id: track.id.clone().unwrap_or_default(),
        }
    }
}

#[derive(Tabled)]
pub struct AlbumTableRow {
    pub name: String,
    pub artists: String,
    pub released: String,
    pub id: String,
}

impl From<&Album> for AlbumTableRow {
    fn from(album: &Album) -> Self {
        Self {
            name: album.name.clone(),
            artists: album
                .artists
                .iter()
                .map(|a| a.name.as_str())
                .collect::<Vec<_>>()
                .join(", "),
            released: album.release_date.clone(),
            id: album.id.clone(),
        }
    }
}

#[derive(Tabled)]
pub struct ArtistTableRow {
    pub name: String,
    pub genres: String,
    pub id: String,
}

impl From<&Artist> for ArtistTableRow {
    fn from(artist: &Artist) -> Self {
        Self {
            name: artist.name.clone(),
            genres: artist
                .genres
                .iter()
                .take(3)
                .cloned()
                .collect::<Vec<_>>()
                .join(","),
            id: artist.id.clone(),
        }
    }
}

#[derive(Tabled)]
pub struct PlaylistTableRow {
    pub name: String,
    pub tracks: u32,
    pub owner: String,
    pub id: String,
}

impl From<&Playlist> for PlaylistTableRow {
    fn from(playlist: &Playlist) -> Self {
        Self {
            name: playlist.name.clone(),
            tracks: playlist.tracks.as_ref().map_or(0, |t| t.total),
            owner: playlist
                .owner
                .as_ref()
                .and_then(|o| o.display_name.clone().or_else(|| Some(o.id.clone())))
                .unwrap_or_default(),
            id: playlist.id.clone(),
        }
    }
}

#[derive(Tabled)]
pub struct DeviceTableRow {
    pub name: String,
    pub kind: String,
    pub active: String,
    pub volume: String,
    pub id: String,
}

impl From<&Device> for DeviceTableRow {
    fn from(device: &Device) -> Self {
        Self {
            name: device.name.clone(),
            kind: device.kind.clone(),
            active: if device.is_active { "yes" } else { "" }.to_string(),
            volume: device
                .volume_percent
                .map(|v| format!("{v}%"))
                .unwrap_or_default(),
            id: device.id.clone().unwrap_or_default(),
        }
    }
}

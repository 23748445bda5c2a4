#![allow(dead_code)]

use std::{collections::HashMap, sync::Mutex};

use sporadio::{
    Error, Result,
    management::{MemoryStore, PointerStore, RecordKey},
    radio::Session,
    spotify::MusicProvider,
    types::{
        Album, Artist, CreatePlaylistRequest, CursorPage, Device, DeviceId, Page, PlayOptions,
        PlaybackContext, PlaybackState, Playlist, PlaylistItem, PlaylistTracksRef, Queue,
        RecommendationSeed, RepeatState, SavedAlbum, SavedTrack, SearchResults, Track, TrackId,
        User,
    },
};

pub const USER_ID: &str = "user-1";

/// Calls the fake provider received, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Play(PlayOptions),
    Pause(Option<DeviceId>),
    Next(Option<DeviceId>),
    Previous(Option<DeviceId>),
    Seek(u64),
    SetVolume(u8),
    SetShuffle(bool),
    SetRepeat(RepeatState),
    Transfer(String, bool),
    AddToQueue(String, Option<DeviceId>),
    SaveTracks(Vec<TrackId>),
    RemoveSavedTracks(Vec<TrackId>),
    PlaylistItems(String, u32),
    CreatePlaylist(String),
    AddTracks(String, Vec<TrackId>),
    RemoveTracks(String, Vec<TrackId>),
    Unfollow(String),
    Recommendations(RecommendationSeed, usize),
}

/// How the fake answers recommendation calls.
#[derive(Debug, Clone)]
pub enum Recommendations {
    /// `limit` tracks named `<first seed>~<n>`, distinct for every seed.
    Generated,
    /// The same list every time.
    Fixed(Vec<TrackId>),
}

#[derive(Debug)]
pub struct FakeState {
    pub playback: Option<PlaybackState>,
    pub devices: Vec<Device>,
    pub saved: Vec<Track>,
    pub albums: HashMap<String, Vec<Track>>,
    pub playlists: HashMap<String, (Playlist, Vec<TrackId>)>,
    pub recommendations: Recommendations,
    pub calls: Vec<Call>,
    /// Untargeted playback calls fail with "no active device".
    pub no_active_device: bool,
    /// Playback calls targeting a device fail with a server error.
    pub targeted_failure: bool,
    pub fail_unfollow: bool,
    created: u32,
}

impl Default for FakeState {
    fn default() -> Self {
        Self {
            playback: None,
            devices: Vec::new(),
            saved: Vec::new(),
            albums: HashMap::new(),
            playlists: HashMap::new(),
            recommendations: Recommendations::Generated,
            calls: Vec::new(),
            no_active_device: false,
            targeted_failure: false,
            fail_unfollow: false,
            created: 0,
        }
    }
}

/// In-memory provider with just enough behavior for the radio engine.
#[derive(Debug, Default)]
pub struct FakeProvider {
    pub state: Mutex<FakeState>,
}

pub fn track(id: &str) -> Track {
    Track {
        id: Some(id.to_string()),
        name: format!("Track {id}"),
        uri: format!("spotify:track:{id}"),
        duration_ms: 180_000,
        ..Default::default()
    }
}

pub fn ids(prefix: &str, count: usize) -> Vec<TrackId> {
    (0..count).map(|i| format!("{prefix}{i}")).collect()
}

pub fn playing(track_id: &str, context_uri: Option<&str>, progress_ms: u64) -> PlaybackState {
    PlaybackState {
        is_playing: true,
        progress_ms: Some(progress_ms),
        item: Some(track(track_id)),
        context: context_uri.map(|uri| PlaybackContext {
            kind: "playlist".to_string(),
            uri: uri.to_string(),
            external_urls: HashMap::new(),
        }),
        ..Default::default()
    }
}

pub fn device(id: &str) -> Device {
    Device {
        id: Some(id.to_string()),
        name: format!("Device {id}"),
        kind: "Computer".to_string(),
        is_active: false,
        volume_percent: Some(50),
    }
}

fn page_of<T: Clone>(items: &[T], limit: u32, offset: u32) -> Page<T> {
    let start = (offset as usize).min(items.len());
    let end = (start + limit as usize).min(items.len());
    Page {
        items: items[start..end].to_vec(),
        total: items.len() as u32,
        limit,
        offset,
        next: None,
    }
}

fn not_found(what: &str) -> Error {
    Error::Provider {
        status: 404,
        message: format!("{what} not found"),
    }
}

impl FakeProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(configure: impl FnOnce(&mut FakeState)) -> Self {
        let fake = Self::new();
        configure(&mut fake.state.lock().unwrap());
        fake
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn add_playlist(&self, id: &str, name: &str, tracks: Vec<TrackId>) -> Playlist {
        let playlist = Playlist {
            id: id.to_string(),
            name: name.to_string(),
            uri: format!("spotify:playlist:{id}"),
            ..Default::default()
        };
        self.state
            .lock()
            .unwrap()
            .playlists
            .insert(id.to_string(), (playlist.clone(), tracks));
        playlist
    }

    pub fn membership(&self, playlist_id: &str) -> Vec<TrackId> {
        self.state
            .lock()
            .unwrap()
            .playlists
            .get(playlist_id)
            .map(|(_, tracks)| tracks.clone())
            .unwrap_or_default()
    }

    pub fn playlist_count(&self) -> usize {
        self.state.lock().unwrap().playlists.len()
    }

    fn record(&self, call: Call) {
        self.state.lock().unwrap().calls.push(call);
    }

    fn check_device(&self, device_id: &Option<DeviceId>) -> Result<()> {
        let state = self.state.lock().unwrap();
        match device_id {
            None if state.no_active_device => Err(Error::NoActiveDevice),
            Some(_) if state.targeted_failure => Err(Error::Provider {
                status: 502,
                message: "targeted failure".to_string(),
            }),
            _ => Ok(()),
        }
    }
}

impl MusicProvider for FakeProvider {
    async fn current_user(&self) -> Result<User> {
        Ok(User {
            id: USER_ID.to_string(),
            display_name: None,
        })
    }

    async fn playback_state(&self) -> Result<Option<PlaybackState>> {
        Ok(self.state.lock().unwrap().playback.clone())
    }

    async fn devices(&self) -> Result<Vec<Device>> {
        Ok(self.state.lock().unwrap().devices.clone())
    }

    async fn queue(&self) -> Result<Queue> {
        Ok(Queue::default())
    }

    async fn play(&self, options: PlayOptions) -> Result<()> {
        self.record(Call::Play(options.clone()));
        self.check_device(&options.device_id)
    }

    async fn pause(&self, device_id: Option<DeviceId>) -> Result<()> {
        self.record(Call::Pause(device_id.clone()));
        self.check_device(&device_id)
    }

    async fn next(&self, device_id: Option<DeviceId>) -> Result<()> {
        self.record(Call::Next(device_id.clone()));
        self.check_device(&device_id)
    }

    async fn previous(&self, device_id: Option<DeviceId>) -> Result<()> {
        self.record(Call::Previous(device_id.clone()));
        self.check_device(&device_id)
    }

    async fn seek(&self, position_ms: u64) -> Result<()> {
        self.record(Call::Seek(position_ms));
        Ok(())
    }

    async fn set_volume(&self, percent: u8) -> Result<()> {
        self.record(Call::SetVolume(percent));
        Ok(())
    }

    async fn set_shuffle(&self, state: bool) -> Result<()> {
        self.record(Call::SetShuffle(state));
        Ok(())
    }

    async fn set_repeat(&self, state: RepeatState) -> Result<()> {
        self.record(Call::SetRepeat(state));
        Ok(())
    }

    async fn transfer_playback(&self, device_id: &str, play: bool) -> Result<()> {
        self.record(Call::Transfer(device_id.to_string(), play));
        self.state.lock().unwrap().no_active_device = false;
        Ok(())
    }

    async fn add_to_queue(&self, track_id: &str, device_id: Option<DeviceId>) -> Result<()> {
        self.record(Call::AddToQueue(track_id.to_string(), device_id.clone()));
        self.check_device(&device_id)
    }

    async fn saved_tracks(&self, limit: u32, offset: u32) -> Result<Page<SavedTrack>> {
        let state = self.state.lock().unwrap();
        let saved: Vec<SavedTrack> = state
            .saved
            .iter()
            .map(|t| SavedTrack {
                added_at: String::new(),
                track: t.clone(),
            })
            .collect();
        Ok(page_of(&saved, limit, offset))
    }

    async fn saved_albums(&self, limit: u32, offset: u32) -> Result<Page<SavedAlbum>> {
        Ok(page_of(&[], limit, offset))
    }

    async fn save_tracks(&self, ids: &[TrackId]) -> Result<()> {
        self.record(Call::SaveTracks(ids.to_vec()));
        Ok(())
    }

    async fn remove_saved_tracks(&self, ids: &[TrackId]) -> Result<()> {
        self.record(Call::RemoveSavedTracks(ids.to_vec()));
        Ok(())
    }

    async fn followed_artists(
        &self,
        _limit: u32,
        _after: Option<&str>,
    ) -> Result<CursorPage<Artist>> {
        Ok(CursorPage {
            items: Vec::new(),
            next: None,
            cursors: None,
            total: Some(0),
        })
    }

    async fn artist(&self, artist_id: &str) -> Result<Artist> {
        Ok(Artist {
            id: artist_id.to_string(),
            name: format!("Artist {artist_id}"),
            genres: Vec::new(),
        })
    }

    async fn album(&self, album_id: &str) -> Result<Album> {
        Ok(Album {
            id: album_id.to_string(),
            name: format!("Album {album_id}"),
            uri: format!("spotify:album:{album_id}"),
            ..Default::default()
        })
    }

    async fn album_tracks(&self, album_id: &str, limit: u32, offset: u32) -> Result<Page<Track>> {
        let state = self.state.lock().unwrap();
        let tracks = state.albums.get(album_id).ok_or_else(|| not_found(album_id))?;
        Ok(page_of(tracks, limit, offset))
    }

    async fn user_playlists(&self, limit: u32, offset: u32) -> Result<Page<Playlist>> {
        let state = self.state.lock().unwrap();
        let playlists: Vec<Playlist> = state.playlists.values().map(|(p, _)| p.clone()).collect();
        Ok(page_of(&playlists, limit, offset))
    }

    async fn playlist(&self, playlist_id: &str) -> Result<Playlist> {
        let state = self.state.lock().unwrap();
        let (playlist, tracks) = state
            .playlists
            .get(playlist_id)
            .ok_or_else(|| not_found(playlist_id))?;
        Ok(Playlist {
            tracks: Some(PlaylistTracksRef {
                total: tracks.len() as u32,
            }),
            ..playlist.clone()
        })
    }

    async fn playlist_items(
        &self,
        playlist_id: &str,
        limit: u32,
        offset: u32,
    ) -> Result<Page<PlaylistItem>> {
        self.record(Call::PlaylistItems(playlist_id.to_string(), offset));
        let state = self.state.lock().unwrap();
        let (_, tracks) = state
            .playlists
            .get(playlist_id)
            .ok_or_else(|| not_found(playlist_id))?;
        let items: Vec<PlaylistItem> = tracks
            .iter()
            .map(|id| PlaylistItem {
                track: Some(track(id)),
            })
            .collect();
        Ok(page_of(&items, limit, offset))
    }

    async fn search(&self, _query: &str, _limit: u32, _offset: u32) -> Result<SearchResults> {
        Ok(SearchResults::default())
    }

    async fn create_playlist(
        &self,
        _user_id: &str,
        request: &CreatePlaylistRequest,
    ) -> Result<Playlist> {
        self.record(Call::CreatePlaylist(request.name.clone()));
        let mut state = self.state.lock().unwrap();
        state.created += 1;
        let id = format!("radio-{}", state.created);
        let playlist = Playlist {
            id: id.clone(),
            name: request.name.clone(),
            uri: format!("spotify:playlist:{id}"),
            description: Some(request.description.clone()),
            public: Some(request.public),
            collaborative: request.collaborative,
            ..Default::default()
        };
        state.playlists.insert(id, (playlist.clone(), Vec::new()));
        Ok(playlist)
    }

    async fn add_tracks(&self, playlist_id: &str, ids: &[TrackId]) -> Result<()> {
        self.record(Call::AddTracks(playlist_id.to_string(), ids.to_vec()));
        let mut state = self.state.lock().unwrap();
        let (_, tracks) = state
            .playlists
            .get_mut(playlist_id)
            .ok_or_else(|| not_found(playlist_id))?;
        tracks.extend(ids.iter().cloned());
        Ok(())
    }

    async fn remove_tracks(&self, playlist_id: &str, ids: &[TrackId]) -> Result<()> {
        self.record(Call::RemoveTracks(playlist_id.to_string(), ids.to_vec()));
        let mut state = self.state.lock().unwrap();
        let (_, tracks) = state
            .playlists
            .get_mut(playlist_id)
            .ok_or_else(|| not_found(playlist_id))?;
        tracks.retain(|id| !ids.contains(id));
        Ok(())
    }

    async fn unfollow_playlist(&self, playlist_id: &str) -> Result<()> {
        self.record(Call::Unfollow(playlist_id.to_string()));
        let mut state = self.state.lock().unwrap();
        if state.fail_unfollow {
            return Err(Error::Provider {
                status: 500,
                message: "unfollow failed".to_string(),
            });
        }
        state.playlists.remove(playlist_id);
        Ok(())
    }

    async fn recommendations(&self, seed: &RecommendationSeed, limit: usize) -> Result<Vec<Track>> {
        self.record(Call::Recommendations(seed.clone(), limit));
        let state = self.state.lock().unwrap();
        let ids = match &state.recommendations {
            Recommendations::Fixed(ids) => ids.clone(),
            Recommendations::Generated => {
                let key = seed
                    .tracks
                    .first()
                    .or(seed.artists.first())
                    .cloned()
                    .unwrap_or_default();
                (0..limit).map(|i| format!("{key}~{i}")).collect()
            }
        };
        Ok(ids.iter().map(|id| track(id)).collect())
    }
}

/// Store whose writes always fail.
#[derive(Default)]
pub struct FailingStore;

impl PointerStore for FailingStore {
    async fn read(&self, _key: RecordKey) -> Result<Option<String>> {
        Ok(None)
    }

    async fn write(&self, key: RecordKey, _contents: String) -> Result<()> {
        Err(Error::persistence(key, "disk full"))
    }

    async fn remove(&self, _key: RecordKey) -> Result<()> {
        Ok(())
    }
}

pub type TestSession = Session<FakeProvider, MemoryStore>;

pub fn session(provider: FakeProvider) -> TestSession {
    Session::seeded(USER_ID, provider, MemoryStore::new(), 7)
}

pub fn play_calls(calls: &[Call]) -> Vec<PlayOptions> {
    calls
        .iter()
        .filter_map(|c| match c {
            Call::Play(options) => Some(options.clone()),
            _ => None,
        })
        .collect()
}

pub fn add_batches(calls: &[Call]) -> Vec<usize> {
    calls
        .iter()
        .filter_map(|c| match c {
            Call::AddTracks(_, ids) => Some(ids.len()),
            _ => None,
        })
        .collect()
}

use std::time::Duration;

use reqwest::{Client, Method, Response, StatusCode, header::CONTENT_LENGTH};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tokio::{sync::Mutex, time::sleep};

use crate::{
    Error, Result,
    config::Config,
    management::TokenManager,
    types::{
        AddTracksRequest, Album, Artist, CreatePlaylistRequest, CursorPage, Device, DeviceId,
        DevicesResponse, FollowedArtistsResponse, Page, PlayOptions, PlaybackState, Playlist,
        PlaylistItem, Queue, RecommendationSeed, RecommendationsResponse, RemoveTracksRequest,
        RepeatState, SavedAlbum, SavedTrack, SearchResults, Track, TrackId, TrackUri, User,
    },
    utils, warning,
};

use super::{MusicProvider, RECOMMENDATION_LIMIT};

/// Longest `Retry-After` the client is willing to wait for.
const MAX_RETRY_AFTER_SECS: u64 = 120;

/// Attempts per request when the gateway answers 502.
const MAX_GATEWAY_ATTEMPTS: u32 = 3;

const GATEWAY_RETRY_DELAY: Duration = Duration::from_secs(10);

type Query<'a> = [(&'a str, String)];

/// HTTP implementation of [`MusicProvider`] for the Spotify Web API.
pub struct SpotifyClient {
    http: Client,
    config: Config,
    tokens: Mutex<TokenManager>,
}

impl SpotifyClient {
    pub fn new(config: Config, tokens: TokenManager) -> Self {
        Self {
            http: Client::new(),
            config,
            tokens: Mutex::new(tokens),
        }
    }

    /// Creates a client from the persisted token.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Auth`] when no token has been stored yet.
    pub async fn connect(config: Config) -> Result<Self> {
        let tokens = TokenManager::load().await?;
        Ok(Self::new(config, tokens))
    }

    /// Sends one request, retrying on 502 Bad Gateway and on 429 Too Many
    /// Requests when the advertised wait is acceptable.
    ///
    /// Returns `None` for 204 No Content.
    async fn send(
        &self,
        method: Method,
        path: &str,
        query: &Query<'_>,
        body: Option<&Value>,
    ) -> Result<Option<Response>> {
        let url = format!("{}{}", self.config.api_url, path);
        let mut gateway_attempts = 0;

        loop {
            let token = self
                .tokens
                .lock()
                .await
                .get_valid_token(&self.config)
                .await?;

            let mut request = self
                .http
                .request(method.clone(), &url)
                .bearer_auth(token)
                .query(query);
            request = match body {
                Some(body) => request.json(body),
                None if method != Method::GET => request.header(CONTENT_LENGTH, "0"),
                None => request,
            };

            let response = request.send().await?;
            let status = response.status();

            if status == StatusCode::BAD_GATEWAY {
                gateway_attempts += 1;
                if gateway_attempts < MAX_GATEWAY_ATTEMPTS {
                    sleep(GATEWAY_RETRY_DELAY).await;
                    continue; // retry
                }
            }

            if status == StatusCode::TOO_MANY_REQUESTS {
                let retry_after = response
                    .headers()
                    .get("retry-after")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse::<u64>().ok())
                    .unwrap_or(0);
                if retry_after <= MAX_RETRY_AFTER_SECS {
                    sleep(Duration::from_secs(retry_after)).await;
                    continue; // retry
                }
                warning!(
                    "Retry after has reached an abnormal high of {} seconds. Try again later.",
                    retry_after
                );
            }

            if status == StatusCode::NO_CONTENT {
                return Ok(None);
            }

            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(provider_error(status.as_u16(), &body));
            }

            return Ok(Some(response));
        }
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, query: &Query<'_>) -> Result<T> {
        match self.get_optional(path, query).await? {
            Some(value) => Ok(value),
            None => Err(Error::Provider {
                status: StatusCode::NO_CONTENT.as_u16(),
                message: format!("{path} returned no content"),
            }),
        }
    }

    async fn get_optional<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &Query<'_>,
    ) -> Result<Option<T>> {
        match self.send(Method::GET, path, query, None).await? {
            Some(response) => {
                let bytes = response.bytes().await?;
                if bytes.is_empty() {
                    return Ok(None);
                }
                Ok(Some(serde_json::from_slice(&bytes)?))
            }
            None => Ok(None),
        }
    }

    async fn command(
        &self,
        method: Method,
        path: &str,
        query: &Query<'_>,
        body: Option<&Value>,
    ) -> Result<()> {
        self.send(method, path, query, body).await?;
        Ok(())
    }
}

fn device_query(device_id: Option<DeviceId>) -> Vec<(&'static str, String)> {
    device_id.map(|id| ("device_id", id)).into_iter().collect()
}

fn page_query(limit: u32, offset: u32) -> [(&'static str, String); 2] {
    [("limit", limit.to_string()), ("offset", offset.to_string())]
}

/// Maps an unsuccessful response to an [`Error`].
///
/// The player endpoints answer 404 with reason `NO_ACTIVE_DEVICE` when no
/// device is active; that case becomes [`Error::NoActiveDevice`].
pub fn provider_error(status: u16, body: &str) -> Error {
    let parsed: Option<Value> = serde_json::from_str(body).ok();
    let error = parsed.as_ref().and_then(|v| v.get("error"));

    let message = error
        .and_then(|e| e.get("message").and_then(Value::as_str).or(e.as_str()))
        .unwrap_or(body)
        .to_string();
    let reason = error
        .and_then(|e| e.get("reason"))
        .and_then(Value::as_str)
        .unwrap_or_default();

    if reason == "NO_ACTIVE_DEVICE" || message.contains("No active device found") {
        return Error::NoActiveDevice;
    }

    Error::Provider { status, message }
}

impl MusicProvider for SpotifyClient {
    async fn current_user(&self) -> Result<User> {
        self.get("/me", &[]).await
    }

    async fn playback_state(&self) -> Result<Option<PlaybackState>> {
        self.get_optional("/me/player", &[]).await
    }

    async fn devices(&self) -> Result<Vec<Device>> {
        let response: DevicesResponse = self.get("/me/player/devices", &[]).await?;
        Ok(response.devices)
    }

    async fn queue(&self) -> Result<Queue> {
        Ok(self
            .get_optional("/me/player/queue", &[])
            .await?
            .unwrap_or_default())
    }

    async fn play(&self, options: PlayOptions) -> Result<()> {
        let body = serde_json::to_value(&options)?;
        let query = device_query(options.device_id);
        self.command(Method::PUT, "/me/player/play", &query, Some(&body))
            .await
    }

    async fn pause(&self, device_id: Option<DeviceId>) -> Result<()> {
        self.command(Method::PUT, "/me/player/pause", &device_query(device_id), None)
            .await
    }

    async fn next(&self, device_id: Option<DeviceId>) -> Result<()> {
        self.command(Method::POST, "/me/player/next", &device_query(device_id), None)
            .await
    }

    async fn previous(&self, device_id: Option<DeviceId>) -> Result<()> {
        let query = device_query(device_id);
        self.command(Method::POST, "/me/player/previous", &query, None)
            .await
    }

    async fn seek(&self, position_ms: u64) -> Result<()> {
        let query = [("position_ms", position_ms.to_string())];
        self.command(Method::PUT, "/me/player/seek", &query, None)
            .await
    }

    async fn set_volume(&self, percent: u8) -> Result<()> {
        let query = [("volume_percent", percent.min(100).to_string())];
        self.command(Method::PUT, "/me/player/volume", &query, None)
            .await
    }

    async fn set_shuffle(&self, state: bool) -> Result<()> {
        let query = [("state", state.to_string())];
        self.command(Method::PUT, "/me/player/shuffle", &query, None)
            .await
    }

    async fn set_repeat(&self, state: RepeatState) -> Result<()> {
        let query = [("state", state.to_string())];
        self.command(Method::PUT, "/me/player/repeat", &query, None)
            .await
    }

    async fn transfer_playback(&self, device_id: &str, play: bool) -> Result<()> {
        let body = json!({ "device_ids": [device_id], "play": play });
        self.command(Method::PUT, "/me/player", &[], Some(&body))
            .await
    }

    async fn add_to_queue(&self, track_id: &str, device_id: Option<DeviceId>) -> Result<()> {
        let mut query = device_query(device_id);
        query.push(("uri", utils::track_uri(track_id)));
        self.command(Method::POST, "/me/player/queue", &query, None)
            .await
    }

    async fn saved_tracks(&self, limit: u32, offset: u32) -> Result<Page<SavedTrack>> {
        self.get("/me/tracks", &page_query(limit, offset)).await
    }

    async fn saved_albums(&self, limit: u32, offset: u32) -> Result<Page<SavedAlbum>> {
        self.get("/me/albums", &page_query(limit, offset)).await
    }

    async fn save_tracks(&self, ids: &[TrackId]) -> Result<()> {
        let query = [("ids", ids.join(","))];
        self.command(Method::PUT, "/me/tracks", &query, None).await
    }

    async fn remove_saved_tracks(&self, ids: &[TrackId]) -> Result<()> {
        let query = [("ids", ids.join(","))];
        self.command(Method::DELETE, "/me/tracks", &query, None)
            .await
    }

    async fn followed_artists(
        &self,
        limit: u32,
        after: Option<&str>,
    ) -> Result<CursorPage<Artist>> {
        let mut query = vec![("type", "artist".to_string()), ("limit", limit.to_string())];
        if let Some(after) = after {
            query.push(("after", after.to_string()));
        }
        let response: FollowedArtistsResponse = self.get("/me/following", &query).await?;
        Ok(response.artists)
    }

    async fn artist(&self, artist_id: &str) -> Result<Artist> {
        self.get(&format!("/artists/{artist_id}"), &[]).await
    }

    async fn album(&self, album_id: &str) -> Result<Album> {
        self.get(&format!("/albums/{album_id}"), &[]).await
    }

    async fn album_tracks(&self, album_id: &str, limit: u32, offset: u32) -> Result<Page<Track>> {
        self.get(
            &format!("/albums/{album_id}/tracks"),
            &page_query(limit, offset),
        )
        .await
    }

    async fn user_playlists(&self, limit: u32, offset: u32) -> Result<Page<Playlist>> {
        self.get("/me/playlists", &page_query(limit, offset)).await
    }

    async fn playlist(&self, playlist_id: &str) -> Result<Playlist> {
        let query = [(
            "fields",
            "id,name,uri,description,public,collaborative,snapshot_id,owner,tracks.total,external_urls"
                .to_string(),
        )];
        self.get(&format!("/playlists/{playlist_id}"), &query).await
    }

    async fn playlist_items(
        &self,
        playlist_id: &str,
        limit: u32,
        offset: u32,
    ) -> Result<Page<PlaylistItem>> {
        self.get(
            &format!("/playlists/{playlist_id}/tracks"),
            &page_query(limit, offset),
        )
        .await
    }

    async fn search(&self, query: &str, limit: u32, offset: u32) -> Result<SearchResults> {
        let [limit, offset] = page_query(limit, offset);
        let query = [
            ("q", query.to_string()),
            ("type", "album,artist,track,playlist".to_string()),
            limit,
            offset,
        ];
        self.get("/search", &query).await
    }

    async fn create_playlist(
        &self,
        user_id: &str,
        request: &CreatePlaylistRequest,
    ) -> Result<Playlist> {
        let body = serde_json::to_value(request)?;
        match self
            .send(
                Method::POST,
                &format!("/users/{user_id}/playlists"),
                &[],
                Some(&body),
            )
            .await?
        {
            Some(response) => Ok(response.json::<Playlist>().await?),
            None => Err(Error::Provider {
                status: StatusCode::NO_CONTENT.as_u16(),
                message: "playlist creation returned no content".to_string(),
            }),
        }
    }

    async fn add_tracks(&self, playlist_id: &str, ids: &[TrackId]) -> Result<()> {
        let request = AddTracksRequest {
            uris: ids.iter().map(|id| utils::track_uri(id)).collect(),
        };
        let body = serde_json::to_value(&request)?;
        self.command(
            Method::POST,
            &format!("/playlists/{playlist_id}/tracks"),
            &[],
            Some(&body),
        )
        .await
    }

    async fn remove_tracks(&self, playlist_id: &str, ids: &[TrackId]) -> Result<()> {
        let request = RemoveTracksRequest {
            tracks: ids
                .iter()
                .map(|id| TrackUri {
                    uri: utils::track_uri(id),
                })
                .collect(),
        };
        let body = serde_json::to_value(&request)?;
        self.command(
            Method::DELETE,
            &format!("/playlists/{playlist_id}/tracks"),
            &[],
            Some(&body),
        )
        .await
    }

    async fn unfollow_playlist(&self, playlist_id: &str) -> Result<()> {
        self.command(
            Method::DELETE,
            &format!("/playlists/{playlist_id}/followers"),
            &[],
            None,
        )
        .await
    }

    async fn recommendations(
        &self,
        seed: &RecommendationSeed,
        limit: usize,
    ) -> Result<Vec<Track>> {
        let mut query = vec![("limit", limit.clamp(1, RECOMMENDATION_LIMIT).to_string())];
        if !seed.tracks.is_empty() {
            query.push(("seed_tracks", seed.tracks.join(",")));
        }
        if !seed.artists.is_empty() {
            query.push(("seed_artists", seed.artists.join(",")));
        }
        let response: RecommendationsResponse = self.get("/recommendations", &query).await?;
        Ok(response.tracks)
    }
}

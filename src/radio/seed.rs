use std::{collections::HashSet, future::Future};

use rand::{
    Rng,
    seq::{IndexedRandom, SliceRandom},
};

use crate::{
    Error, Result,
    management::PointerStore,
    spotify::{MusicProvider, PAGE_LIMIT},
    types::{Album, Artist, ArtistId, Playlist, RecommendationSeed, TrackId},
};

use super::{MAX_SEEDS, Session, playback};

/// Number of saved tracks to pick from when nothing is playing.
const SAVED_SAMPLE_SIZE: u32 = 10;

/// A page as seen by the sampler: the source's total and the ids on it.
type PageIds = (u32, Vec<TrackId>);

/// What the user asked to build a radio from.
#[derive(Debug, Clone)]
pub enum SeedSource {
    CurrentlyPlaying,
    Artist(Artist),
    Album(Album),
    Playlist(Playlist),
    SavedTracks,
}

/// Resolved seed of a radio.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Seed {
    /// Human-readable name the radio playlist is named after.
    pub name: String,
    /// Seed tracks, unique, at most [`MAX_SEEDS`]. They open the radio.
    pub tracks: Vec<TrackId>,
    pub artists: Vec<ArtistId>,
    /// Progress into the first seed track to resume playback at.
    pub position_ms: Option<u64>,
}

impl Seed {
    pub fn recommendation_seed(&self) -> RecommendationSeed {
        RecommendationSeed {
            tracks: self.tracks.clone(),
            artists: self.artists.clone(),
        }
    }
}

/// Turns a [`SeedSource`] into a non-empty seed.
///
/// # Errors
///
/// [`Error::EmptySource`] when the album, playlist or saved-tracks library
/// has no playable tracks.
pub async fn resolve_seed<P, S, R>(session: &mut Session<P, S, R>, source: SeedSource) -> Result<Seed>
where
    P: MusicProvider,
    S: PointerStore,
    R: Rng,
{
    match source {
        SeedSource::CurrentlyPlaying => currently_playing(session).await,
        SeedSource::Artist(artist) => Ok(Seed {
            name: artist.name,
            tracks: Vec::new(),
            artists: vec![artist.id],
            position_ms: None,
        }),
        SeedSource::Album(album) => {
            let provider = &session.provider;
            let album_id = album.id.as_str();
            let tracks = sample_page(&mut session.rng, &album.name, |offset| async move {
                let page = provider.album_tracks(album_id, PAGE_LIMIT, offset).await?;
                let ids = page.items.into_iter().filter_map(|t| t.id).collect();
                Ok::<PageIds, Error>((page.total, ids))
            })
            .await?;
            Ok(Seed::from_tracks(album.name, tracks))
        }
        SeedSource::Playlist(playlist) => {
            let tracks = sample_playlist(session, &playlist.id, &playlist.name).await?;
            Ok(Seed::from_tracks(playlist.name, tracks))
        }
        SeedSource::SavedTracks => {
            let provider = &session.provider;
            let tracks = sample_page(&mut session.rng, "Saved tracks", |offset| async move {
                let page = provider.saved_tracks(PAGE_LIMIT, offset).await?;
                let ids = page.items.into_iter().filter_map(|s| s.track.id).collect();
                Ok::<PageIds, Error>((page.total, ids))
            })
            .await?;
            Ok(Seed::from_tracks("Saved Tracks".to_string(), tracks))
        }
    }
}

impl Seed {
    fn from_tracks(name: String, tracks: Vec<TrackId>) -> Self {
        Self {
            name,
            tracks,
            artists: Vec::new(),
            position_ms: None,
        }
    }
}

/// Seeds from the playing track, or from a random recently saved track when
/// playback is paused or stopped. With no track loaded at all the saved
/// device is activated first.
async fn currently_playing<P, S, R>(session: &mut Session<P, S, R>) -> Result<Seed>
where
    P: MusicProvider,
    S: PointerStore,
    R: Rng,
{
    let state = session.provider.playback_state().await?;

    if let Some(state) = &state {
        if let Some(track) = state.playing_track() {
            if let Some(id) = &track.id {
                return Ok(Seed {
                    name: track.name.clone(),
                    tracks: vec![id.clone()],
                    artists: Vec::new(),
                    position_ms: state.progress_ms,
                });
            }
        }
    }

    if state.as_ref().and_then(|s| s.item.as_ref()).is_none() {
        playback::activate_device(session).await?;
    }

    let page = session
        .provider
        .saved_tracks(SAVED_SAMPLE_SIZE, 0)
        .await?;
    let saved: Vec<_> = page
        .items
        .into_iter()
        .filter(|s| s.track.id.is_some())
        .collect();
    let pick = saved
        .choose(&mut session.rng)
        .ok_or_else(|| Error::EmptySource("Saved tracks".to_string()))?;

    Ok(Seed {
        name: pick.track.name.clone(),
        tracks: pick.track.id.clone().into_iter().collect(),
        artists: Vec::new(),
        position_ms: None,
    })
}

/// Samples seed tracks from a random page of a playlist.
pub(crate) async fn sample_playlist<P, S, R>(
    session: &mut Session<P, S, R>,
    playlist_id: &str,
    label: &str,
) -> Result<Vec<TrackId>>
where
    P: MusicProvider,
    R: Rng,
{
    let provider = &session.provider;
    sample_page(&mut session.rng, label, |offset| async move {
        let page = provider
            .playlist_items(playlist_id, PAGE_LIMIT, offset)
            .await?;
        let ids = page
            .items
            .iter()
            .filter_map(|item| item.track_id().cloned())
            .collect();
        Ok::<PageIds, Error>((page.total, ids))
    })
    .await
}

/// Fetches the first page to learn the total, fetches a random page and
/// draws up to [`MAX_SEEDS`] unique ids from it.
///
/// `fetch` maps a page offset to `(total, ids on that page)`.
async fn sample_page<R, F, Fut>(rng: &mut R, label: &str, mut fetch: F) -> Result<Vec<TrackId>>
where
    R: Rng,
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<PageIds>>,
{
    let (total, first_page) = fetch(0).await?;
    if total == 0 {
        return Err(Error::EmptySource(label.to_string()));
    }

    let page_index = sample_page_index(rng, total);
    let ids = if page_index == 0 {
        first_page
    } else {
        fetch(page_index * PAGE_LIMIT).await?.1
    };

    let seeds = pick_seeds(rng, ids);
    if seeds.is_empty() {
        return Err(Error::EmptySource(label.to_string()));
    }
    Ok(seeds)
}

/// Index of the page to sample from a source with `total` items.
///
/// With more than one page the last page is never chosen, so the sampled
/// page is always full.
pub fn sample_page_index<R: Rng>(rng: &mut R, total: u32) -> u32 {
    let pages = total.div_ceil(PAGE_LIMIT);
    if pages <= 1 {
        0
    } else {
        rng.random_range(0..pages - 1)
    }
}

/// Shuffles the page and keeps the first [`MAX_SEEDS`] distinct ids.
pub fn pick_seeds<R: Rng>(rng: &mut R, mut ids: Vec<TrackId>) -> Vec<TrackId> {
    let mut seen = HashSet::new();
    ids.retain(|id| seen.insert(id.clone()));
    ids.shuffle(rng);
    ids.truncate(MAX_SEEDS);
    ids
}

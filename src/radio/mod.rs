//! # Radio Engine
//!
//! Builds and maintains one auto-managed "radio" playlist per user from
//! recommendation calls.
//!
//! ## Flow
//!
//! ```text
//! SeedSource ─► resolve_seed ─► expand ─► clear + get_or_create ─► append_batch
//!                                                                     │
//!                        refill ◄── playback runs ◄── play_playlist ◄─┘
//! ```
//!
//! ## Components
//!
//! - [`seed`] - turns a target into up to [`MAX_SEEDS`] unique track ids
//! - [`expand`] - recommendation calls filtered through a seen-track set
//! - [`playlist`] - the persisted radio playlist and batched writes
//! - [`playback`] - device fallback around playback calls
//! - [`refill`] - trims played tracks and tops the playlist up again
//!
//! Every operation takes a [`Session`] carrying the user, the provider, the
//! pointer store and the random source. Nothing here prints; results are
//! returned for the CLI to report.

use std::time::Instant;

use rand::Rng;

use crate::{
    Error, Result,
    management::PointerStore,
    spotify::{MusicProvider, PAGE_LIMIT},
    types::{Playlist, RepeatState, TrackId},
};

pub mod expand;
pub mod playback;
pub mod playlist;
pub mod refill;
pub mod seed;
mod session;

pub use expand::{Expansion, SeenTracks, expand, reseed};
pub use playback::{activate_device, saved_device_id, with_device_fallback};
pub use playlist::{append_batch, clear, get_or_create};
pub use refill::{RefillOutcome, refill};
pub use seed::{Seed, SeedSource, resolve_seed};
pub use session::Session;

/// Size the radio playlist is kept at.
pub const RADIO_TARGET_SIZE: usize = 500;

/// Upper bound of seed tracks per recommendation call.
pub const MAX_SEEDS: usize = 5;

pub const INITIAL_RECOMMENDATIONS: usize = 99;

pub const REFILL_RECOMMENDATIONS: usize = 95;

pub const FOLLOW_UP_RECOMMENDATIONS: usize = 100;

/// Top-up rounds run after a new radio starts playing.
pub const DEFAULT_EXTRA_ROUNDS: usize = 4;

/// Pages of saved tracks loaded into the "Saved Songs" playlist.
pub const SAVED_SONGS_PAGES: u32 = 5;

const SAVED_SONGS_NAME: &str = "Saved Songs";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RadioOptions {
    /// Follow-up rounds of [`FOLLOW_UP_RECOMMENDATIONS`] appended once
    /// playback started.
    pub extra_rounds: usize,
}

impl Default for RadioOptions {
    fn default() -> Self {
        Self {
            extra_rounds: DEFAULT_EXTRA_ROUNDS,
        }
    }
}

/// What a new radio ended up with.
#[derive(Debug, Clone)]
pub struct RadioSummary {
    pub playlist: Playlist,
    pub seed: Seed,
    /// Tracks written to the playlist.
    pub tracks: usize,
}

/// Replaces the current radio with one built from `source` and starts it.
///
/// The playlist opens with the seed tracks followed by the first batch of
/// recommendations. Playback starts at the first track with repeat set to
/// the playlist; a seed taken from the playing track resumes at its
/// progress, shifted by the time spent building the radio. Afterwards up to
/// `options.extra_rounds` follow-up rounds fill the playlist towards
/// [`RADIO_TARGET_SIZE`].
pub async fn start_radio<P, S, R>(
    session: &mut Session<P, S, R>,
    source: SeedSource,
    options: RadioOptions,
) -> Result<RadioSummary>
where
    P: MusicProvider,
    S: PointerStore,
    R: Rng,
{
    let started = Instant::now();
    let seed = resolve_seed(session, source).await?;

    let mut seen: SeenTracks = seed.tracks.iter().cloned().collect();
    let expansion = expand(
        &session.provider,
        &seed.recommendation_seed(),
        INITIAL_RECOMMENDATIONS,
        &mut seen,
    )
    .await?;

    clear(session).await?;
    let radio = get_or_create(session, &seed.name).await?;

    let queue: Vec<TrackId> = seed
        .tracks
        .iter()
        .chain(expansion.fresh.iter())
        .cloned()
        .collect();
    let mut written = SeenTracks::new();
    let mut tracks = append_batch(&session.provider, &radio.id, &queue, &mut written)
        .await?
        .len();

    let position_ms = seed
        .position_ms
        .filter(|ms| *ms > 0)
        .map(|ms| ms + started.elapsed().as_millis() as u64);
    playback::play_playlist(session, &radio, position_ms).await?;
    session.provider.set_repeat(RepeatState::Context).await?;

    if options.extra_rounds > 0 {
        tracks += refill::top_up(
            session,
            &radio.id,
            expansion.candidates,
            &mut seen,
            &mut written,
            RADIO_TARGET_SIZE.saturating_sub(tracks),
            Some(options.extra_rounds),
        )
        .await?;
    }

    Ok(RadioSummary {
        playlist: radio,
        seed,
        tracks,
    })
}

/// Replaces the current radio with a "Saved Songs" playlist holding up to
/// [`SAVED_SONGS_PAGES`] pages of saved tracks from `offset` on and plays it.
///
/// Playback starts as soon as the first page is written.
pub async fn play_saved_tracks<P, S, R>(
    session: &mut Session<P, S, R>,
    offset: u32,
) -> Result<RadioSummary>
where
    P: MusicProvider,
    S: PointerStore,
{
    clear(session).await?;
    let radio = get_or_create(session, SAVED_SONGS_NAME).await?;

    let mut written = SeenTracks::new();
    let mut tracks = 0;

    for page_index in 0..SAVED_SONGS_PAGES {
        let page = session
            .provider
            .saved_tracks(PAGE_LIMIT, offset + page_index * PAGE_LIMIT)
            .await?;
        if page.items.is_empty() {
            if page_index == 0 {
                return Err(Error::EmptySource("Saved tracks".to_string()));
            }
            break;
        }

        let ids: Vec<TrackId> = page.items.into_iter().filter_map(|s| s.track.id).collect();
        tracks += append_batch(&session.provider, &radio.id, &ids, &mut written)
            .await?
            .len();

        if page_index == 0 {
            playback::play_playlist(session, &radio, None).await?;
        }
    }

    Ok(RadioSummary {
        playlist: radio,
        seed: Seed {
            name: SAVED_SONGS_NAME.to_string(),
            ..Default::default()
        },
        tracks,
    })
}

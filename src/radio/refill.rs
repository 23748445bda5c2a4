use rand::Rng;

use crate::{
    Result,
    management::PointerStore,
    spotify::{MusicProvider, PAGE_LIMIT},
    types::{RecommendationSeed, RepeatState, TrackId},
};

use super::{
    FOLLOW_UP_RECOMMENDATIONS, RADIO_TARGET_SIZE, REFILL_RECOMMENDATIONS, SeenTracks, Session,
    expand::{expand, reseed},
    playlist, seed,
};

/// What a refill did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefillOutcome {
    /// Nothing is playing.
    Idle,
    /// Playback runs, but not from the radio playlist.
    NotRadio,
    Refilled { removed: usize, added: usize },
}

/// Trims the tracks played before the current one from the radio playlist
/// and tops it back up to [`RADIO_TARGET_SIZE`].
pub async fn refill<P, S, R>(session: &mut Session<P, S, R>) -> Result<RefillOutcome>
where
    P: MusicProvider,
    S: PointerStore,
    R: Rng,
{
    let Some(state) = session.provider.playback_state().await? else {
        return Ok(RefillOutcome::Idle);
    };
    let Some(current_id) = state.playing_track().and_then(|t| t.id.clone()) else {
        return Ok(RefillOutcome::Idle);
    };
    let Some(radio) = playlist::current(&session.store).await? else {
        return Ok(RefillOutcome::NotRadio);
    };
    if state.context_uri() != Some(radio.uri.as_str()) {
        return Ok(RefillOutcome::NotRadio);
    }

    let (total, played) = played_before(&session.provider, &radio.id, &current_id).await?;
    playlist::remove_batch(&session.provider, &radio.id, &played).await?;
    let removed = played.len();

    let remaining = (total as usize).saturating_sub(removed);
    let to_add = RADIO_TARGET_SIZE.saturating_sub(remaining);
    if to_add == 0 {
        return Ok(RefillOutcome::Refilled { removed, added: 0 });
    }

    let seeds = seed::sample_playlist(session, &radio.id, &radio.name).await?;
    let mut written: SeenTracks = playlist::track_ids(&session.provider, &radio.id)
        .await?
        .into_iter()
        .collect();
    let mut seen = written.clone();
    seen.extend(seeds.iter().cloned());

    let recommendation_seed = RecommendationSeed {
        tracks: seeds.clone(),
        artists: Vec::new(),
    };
    let expansion = expand(
        &session.provider,
        &recommendation_seed,
        REFILL_RECOMMENDATIONS,
        &mut seen,
    )
    .await?;

    // seeds come from the playlist itself, so deduplication drops them
    let queue: Vec<TrackId> = seeds
        .into_iter()
        .chain(expansion.fresh.iter().take(to_add).cloned())
        .collect();
    let mut added = playlist::append_batch(&session.provider, &radio.id, &queue, &mut written)
        .await?
        .len();

    session.provider.set_repeat(RepeatState::Context).await?;

    added += top_up(
        session,
        &radio.id,
        expansion.candidates,
        &mut seen,
        &mut written,
        to_add.saturating_sub(added),
        None,
    )
    .await?;

    Ok(RefillOutcome::Refilled { removed, added })
}

/// Scans the playlist from the start for `current_id` and returns its total
/// together with every id found before it.
///
/// The scan ends after the last page. When the current track never shows up
/// nothing counts as played.
async fn played_before<P: MusicProvider>(
    provider: &P,
    playlist_id: &str,
    current_id: &str,
) -> Result<(u32, Vec<TrackId>)> {
    let mut played = Vec::new();
    let mut offset = 0;
    let mut total;

    loop {
        let page = provider
            .playlist_items(playlist_id, PAGE_LIMIT, offset)
            .await?;
        total = page.total;
        if page.items.is_empty() {
            break;
        }
        offset += page.items.len() as u32;

        for id in page.items.iter().filter_map(|item| item.track_id()) {
            if id == current_id {
                return Ok((total, played));
            }
            played.push(id.clone());
        }

        if offset >= total {
            break;
        }
    }

    Ok((total, Vec::new()))
}

/// Adds up to `budget` tracks in follow-up rounds. Each round reseeds from
/// one track of the previous round's candidates and requests
/// [`FOLLOW_UP_RECOMMENDATIONS`] more.
///
/// Stops once the budget is met, after `max_rounds` rounds when given, or
/// as soon as a round yields no new track. Returns the number of tracks
/// added.
pub(crate) async fn top_up<P, S, R>(
    session: &mut Session<P, S, R>,
    playlist_id: &str,
    mut candidates: Vec<TrackId>,
    seen: &mut SeenTracks,
    written: &mut SeenTracks,
    budget: usize,
    max_rounds: Option<usize>,
) -> Result<usize>
where
    P: MusicProvider,
    R: Rng,
{
    let mut added = 0;
    let mut rounds = 0;

    while added < budget && max_rounds.is_none_or(|max| rounds < max) {
        let Some(next_seed) = reseed(&mut session.rng, &candidates) else {
            break;
        };
        let expansion = expand(
            &session.provider,
            &next_seed,
            FOLLOW_UP_RECOMMENDATIONS,
            seen,
        )
        .await?;
        rounds += 1;

        if expansion.fresh.is_empty() {
            break;
        }

        let take = expansion.fresh.len().min(budget - added);
        let sent =
            playlist::append_batch(&session.provider, playlist_id, &expansion.fresh[..take], written)
                .await?;
        added += sent.len();
        candidates = expansion.candidates;
    }

    Ok(added)
}

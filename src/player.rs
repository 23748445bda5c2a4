//! Playback commands.
//!
//! Calls that start or move playback go through
//! [`with_device_fallback`], so they still work right after the active
//! device went to sleep as long as a device was saved with
//! [`set_device`].

use crate::{
    Error, Result,
    management::PointerStore,
    radio::{Session, with_device_fallback},
    spotify::{MusicProvider, PAGE_LIMIT},
    types::{Device, PlayOptions, PlaybackContext, PlaybackState, RepeatState, Track, TrackId},
    utils,
};

/// Step of `seek forward` and `seek back`.
pub const SEEK_STEP_MS: i64 = 5000;

/// Step of `volume up` and `volume down` when none is given.
pub const VOLUME_STEP: i32 = 10;

/// Current playback state, failing when nothing has been played recently.
pub async fn state<P: MusicProvider, S, R>(session: &Session<P, S, R>) -> Result<PlaybackState> {
    session
        .provider
        .playback_state()
        .await?
        .ok_or(Error::NothingPlaying)
}

/// The loaded track, playing or paused.
async fn current_track<P: MusicProvider, S, R>(session: &Session<P, S, R>) -> Result<Track> {
    state(session).await?.item.ok_or(Error::NothingPlaying)
}

/// Resumes playback.
pub async fn play<P, S, R>(session: &Session<P, S, R>) -> Result<()>
where
    P: MusicProvider,
    S: PointerStore,
{
    let provider = &session.provider;
    with_device_fallback(&session.store, move |device| {
        provider.play(PlayOptions::default().on_device(device))
    })
    .await
}

pub async fn pause<P: MusicProvider, S, R>(session: &Session<P, S, R>) -> Result<()> {
    session.provider.pause(None).await
}

/// Pauses when playing, resumes otherwise. Returns whether playback runs
/// afterwards.
pub async fn toggle<P, S, R>(session: &Session<P, S, R>) -> Result<bool>
where
    P: MusicProvider,
    S: PointerStore,
{
    let playing = session
        .provider
        .playback_state()
        .await?
        .is_some_and(|s| s.is_playing);

    if playing {
        pause(session).await?;
    } else {
        play(session).await?;
    }
    Ok(!playing)
}

/// Skips `amount` tracks.
///
/// Inside a playlist or album the context is restarted at the current
/// index plus `amount`, which is a single call. Anywhere else, or when the
/// current track cannot be located, the player skips one track at a time.
/// An `amount` of zero leaves playback alone.
pub async fn next<P, S, R>(session: &Session<P, S, R>, amount: usize) -> Result<()>
where
    P: MusicProvider,
    S: PointerStore,
{
    let provider = &session.provider;

    if amount == 0 {
        return Ok(());
    }

    if amount > 1 {
        let state = state(session).await?;
        let current = state.item.as_ref().and_then(|t| t.id.as_deref());
        if let (Some(context), Some(track_id)) = (&state.context, current) {
            if let Some(index) = context_index(provider, context, track_id).await? {
                let options = &PlayOptions::context(&context.uri, index + amount);
                return with_device_fallback(&session.store, move |device| {
                    provider.play(options.clone().on_device(device))
                })
                .await;
            }
        }
    }

    for _ in 0..amount {
        with_device_fallback(&session.store, move |device| provider.next(device)).await?;
    }
    Ok(())
}

/// Position of `track_id` within an album or playlist context. Other
/// context kinds, and tracks not found after the last page, give `None`.
async fn context_index<P: MusicProvider>(
    provider: &P,
    context: &PlaybackContext,
    track_id: &str,
) -> Result<Option<usize>> {
    let Some(context_id) = utils::id_from_uri(&context.uri) else {
        return Ok(None);
    };

    let mut offset = 0;
    loop {
        let (total, ids): (u32, Vec<Option<TrackId>>) = match context.kind.as_str() {
            "playlist" => {
                let page = provider
                    .playlist_items(context_id, PAGE_LIMIT, offset)
                    .await?;
                let ids = page.items.iter().map(|i| i.track_id().cloned()).collect();
                (page.total, ids)
            }
            "album" => {
                let page = provider.album_tracks(context_id, PAGE_LIMIT, offset).await?;
                (page.total, page.items.into_iter().map(|t| t.id).collect())
            }
            _ => return Ok(None),
        };

        if let Some(position) = ids.iter().position(|id| id.as_deref() == Some(track_id)) {
            return Ok(Some(offset as usize + position));
        }
        if ids.is_empty() {
            return Ok(None);
        }
        offset += ids.len() as u32;
        if offset >= total {
            return Ok(None);
        }
    }
}

pub async fn previous<P, S, R>(session: &Session<P, S, R>) -> Result<()>
where
    P: MusicProvider,
    S: PointerStore,
{
    let provider = &session.provider;
    with_device_fallback(&session.store, move |device| provider.previous(device)).await
}

/// Moves the playhead by `delta_ms` from the current progress, never before
/// the start of the track. Returns the new position.
pub async fn seek_relative<P: MusicProvider, S, R>(
    session: &Session<P, S, R>,
    delta_ms: i64,
) -> Result<u64> {
    let progress = state(session).await?.progress_ms.unwrap_or(0);
    let position = progress.saturating_add_signed(delta_ms);
    session.provider.seek(position).await?;
    Ok(position)
}

pub async fn set_position<P: MusicProvider, S, R>(
    session: &Session<P, S, R>,
    position_ms: u64,
) -> Result<()> {
    session.provider.seek(position_ms).await
}

/// Sets the volume, clamped to 0..=100. Returns the applied value.
pub async fn set_volume<P: MusicProvider, S, R>(
    session: &Session<P, S, R>,
    percent: u8,
) -> Result<u8> {
    let percent = percent.min(100);
    session.provider.set_volume(percent).await?;
    Ok(percent)
}

/// Changes the volume of the active device by `delta`, clamped to 0..=100.
pub async fn change_volume<P: MusicProvider, S, R>(
    session: &Session<P, S, R>,
    delta: i32,
) -> Result<u8> {
    let current = state(session)
        .await?
        .device
        .and_then(|d| d.volume_percent)
        .unwrap_or(0) as i32;
    let percent = (current + delta).clamp(0, 100) as u8;
    session.provider.set_volume(percent).await?;
    Ok(percent)
}

/// Flips shuffle and returns the new state.
pub async fn toggle_shuffle<P: MusicProvider, S, R>(session: &Session<P, S, R>) -> Result<bool> {
    let shuffle = !state(session).await?.shuffle_state;
    session.provider.set_shuffle(shuffle).await?;
    Ok(shuffle)
}

/// Switches repeat between off and context and returns the new mode.
pub async fn toggle_repeat<P: MusicProvider, S, R>(
    session: &Session<P, S, R>,
) -> Result<RepeatState> {
    let repeat = match state(session).await?.repeat_state {
        RepeatState::Off => RepeatState::Context,
        RepeatState::Track | RepeatState::Context => RepeatState::Off,
    };
    session.provider.set_repeat(repeat).await?;
    Ok(repeat)
}

/// Saves the loaded track to the library.
pub async fn like<P: MusicProvider, S, R>(session: &Session<P, S, R>) -> Result<Track> {
    let track = current_track(session).await?;
    let id = track.id.clone().ok_or(Error::NothingPlaying)?;
    session.provider.save_tracks(&[id]).await?;
    Ok(track)
}

/// Removes the loaded track from the library.
pub async fn unlike<P: MusicProvider, S, R>(session: &Session<P, S, R>) -> Result<Track> {
    let track = current_track(session).await?;
    let id = track.id.clone().ok_or(Error::NothingPlaying)?;
    session.provider.remove_saved_tracks(&[id]).await?;
    Ok(track)
}

/// Web link of the loaded track.
pub async fn link<P: MusicProvider, S, R>(session: &Session<P, S, R>) -> Result<String> {
    current_track(session)
        .await?
        .external_urls
        .remove("spotify")
        .ok_or(Error::NothingPlaying)
}

/// Web link of the album or playlist being played.
pub async fn link_context<P: MusicProvider, S, R>(session: &Session<P, S, R>) -> Result<String> {
    state(session)
        .await?
        .context
        .and_then(|mut c| c.external_urls.remove("spotify"))
        .ok_or(Error::NothingPlaying)
}

/// Queues the track behind an `open.spotify.com` link and skips to it.
pub async fn play_url<P, S, R>(session: &Session<P, S, R>, url: &str) -> Result<TrackId>
where
    P: MusicProvider,
    S: PointerStore,
{
    let track_id =
        utils::track_id_from_url(url).ok_or_else(|| Error::InvalidTrackUrl(url.to_string()))?;
    queue_track(session, &track_id).await?;

    let provider = &session.provider;
    with_device_fallback(&session.store, move |device| provider.next(device)).await?;
    Ok(track_id)
}

pub async fn queue_track<P, S, R>(session: &Session<P, S, R>, track_id: &str) -> Result<()>
where
    P: MusicProvider,
    S: PointerStore,
{
    let provider = &session.provider;
    with_device_fallback(&session.store, move |device| {
        provider.add_to_queue(track_id, device)
    })
    .await
}

/// Remembers `device_id` as the fallback device and moves playback there.
///
/// # Errors
///
/// [`Error::UnknownDevice`] when the provider does not list the device.
pub async fn set_device<P, S, R>(session: &Session<P, S, R>, device_id: &str) -> Result<Device>
where
    P: MusicProvider,
    S: PointerStore,
{
    let device = session
        .provider
        .devices()
        .await?
        .into_iter()
        .find(|d| d.id.as_deref() == Some(device_id))
        .ok_or_else(|| Error::UnknownDevice(device_id.to_string()))?;

    session.store.save(&device).await?;
    session.provider.transfer_playback(device_id, true).await?;
    Ok(device)
}

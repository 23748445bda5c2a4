use crate::{
    Result,
    management::PointerStore,
    spotify::{MusicProvider, PAGE_LIMIT, PLAYLIST_BATCH_LIMIT},
    types::{CreatePlaylistRequest, Playlist, TrackId},
    warning,
};

use super::{SeenTracks, Session};

/// Appended to the seed name to form the radio playlist name.
pub const RADIO_SUFFIX: &str = " - autoradio";

pub const RADIO_DESCRIPTION: &str = "Automanaged radio playlist";

/// Name of the radio playlist built from a seed called `seed_name`.
pub fn radio_name(seed_name: &str) -> String {
    format!("{seed_name}{RADIO_SUFFIX}")
}

/// The radio playlist the pointer record refers to, if any.
pub async fn current<S: PointerStore>(store: &S) -> Result<Option<Playlist>> {
    store.load::<Playlist>().await
}

/// Returns the tracked radio playlist, creating one named after `name` when
/// no pointer exists.
///
/// The pointer is written right after creation. When that write fails the
/// new playlist is unfollowed again, so no untracked radio playlist is left
/// behind, and the persistence error is returned.
pub async fn get_or_create<P, S, R>(
    session: &mut Session<P, S, R>,
    name: &str,
) -> Result<Playlist>
where
    P: MusicProvider,
    S: PointerStore,
{
    if let Some(playlist) = current(&session.store).await? {
        return Ok(playlist);
    }

    let request = CreatePlaylistRequest {
        name: radio_name(name),
        description: RADIO_DESCRIPTION.to_string(),
        public: false,
        collaborative: false,
    };
    let playlist = session
        .provider
        .create_playlist(&session.user_id, &request)
        .await?;

    if let Err(e) = session.store.save(&playlist).await {
        if let Err(rollback) = session.provider.unfollow_playlist(&playlist.id).await {
            warning!(
                "Could not remove untracked playlist {}: {}",
                playlist.name,
                rollback
            );
        }
        return Err(e);
    }

    Ok(playlist)
}

/// Detaches the tracked radio playlist and deletes the pointer.
///
/// Without a pointer this is a no-op returning `Ok(None)`. When unfollowing
/// fails the pointer is kept so a later call can finish the job.
pub async fn clear<P, S, R>(session: &mut Session<P, S, R>) -> Result<Option<Playlist>>
where
    P: MusicProvider,
    S: PointerStore,
{
    let Some(playlist) = current(&session.store).await? else {
        return Ok(None);
    };

    session.provider.unfollow_playlist(&playlist.id).await?;
    session.store.delete::<Playlist>().await?;
    Ok(Some(playlist))
}

/// Appends `ids` in order, skipping the ones already in `written` and
/// recording the rest there. Calls are issued sequentially in chunks of at
/// most [`PLAYLIST_BATCH_LIMIT`]; the first failure stops the append.
///
/// Returns the ids that were sent.
pub async fn append_batch<P: MusicProvider>(
    provider: &P,
    playlist_id: &str,
    ids: &[TrackId],
    written: &mut SeenTracks,
) -> Result<Vec<TrackId>> {
    let batch: Vec<TrackId> = ids
        .iter()
        .filter(|id| written.insert((*id).clone()))
        .cloned()
        .collect();

    for chunk in batch.chunks(PLAYLIST_BATCH_LIMIT) {
        provider.add_tracks(playlist_id, chunk).await?;
    }

    Ok(batch)
}

/// Removes `ids` from the playlist in chunks of at most
/// [`PLAYLIST_BATCH_LIMIT`].
pub async fn remove_batch<P: MusicProvider>(
    provider: &P,
    playlist_id: &str,
    ids: &[TrackId],
) -> Result<()> {
    for chunk in ids.chunks(PLAYLIST_BATCH_LIMIT) {
        provider.remove_tracks(playlist_id, chunk).await?;
    }
    Ok(())
}

/// Every track id of the playlist, in order. Stops at the first empty page
/// or once `total` items were read.
pub async fn track_ids<P: MusicProvider>(provider: &P, playlist_id: &str) -> Result<Vec<TrackId>> {
    let mut ids = Vec::new();
    let mut offset = 0;

    loop {
        let page = provider
            .playlist_items(playlist_id, PAGE_LIMIT, offset)
            .await?;
        if page.items.is_empty() {
            break;
        }
        offset += page.items.len() as u32;
        ids.extend(page.items.iter().filter_map(|item| item.track_id().cloned()));
        if offset >= page.total {
            break;
        }
    }

    Ok(ids)
}

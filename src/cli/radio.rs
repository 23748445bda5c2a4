use crate::{
    Result, info,
    radio::{self as engine, RadioOptions, RefillOutcome, SeedSource},
    spotify::MusicProvider,
    success, utils,
};

use super::connect;

/// What the user asked to seed a radio from. Ids are resolved against the
/// API before the engine runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RadioTarget {
    CurrentlyPlaying,
    Artist(String),
    Album(String),
    Playlist(String),
    SavedTracks,
}

pub async fn radio(target: RadioTarget, extra_rounds: usize) -> Result<()> {
    let mut session = connect().await?;

    let source = match target {
        RadioTarget::CurrentlyPlaying => SeedSource::CurrentlyPlaying,
        RadioTarget::Artist(id) => SeedSource::Artist(session.provider.artist(&id).await?),
        RadioTarget::Album(id) => SeedSource::Album(session.provider.album(&id).await?),
        RadioTarget::Playlist(id) => SeedSource::Playlist(session.provider.playlist(&id).await?),
        RadioTarget::SavedTracks => SeedSource::SavedTracks,
    };

    let pb = utils::spinner("Building radio...");
    let result = engine::start_radio(&mut session, source, RadioOptions { extra_rounds }).await;
    pb.finish_and_clear();

    let summary = result?;
    success!(
        "Radio \"{}\" is playing with {} tracks",
        summary.playlist.name,
        summary.tracks
    );
    Ok(())
}

pub async fn refill_radio() -> Result<()> {
    let mut session = connect().await?;

    let pb = utils::spinner("Refilling radio...");
    let result = engine::refill(&mut session).await;
    pb.finish_and_clear();

    match result? {
        RefillOutcome::Idle => info!("Nothing is playing, nothing to refill"),
        RefillOutcome::NotRadio => info!("The radio playlist is not playing"),
        RefillOutcome::Refilled { removed, added } => {
            success!("Removed {} played tracks, added {}", removed, added)
        }
    }
    Ok(())
}

pub async fn clear_radio() -> Result<()> {
    let mut session = connect().await?;
    match engine::clear(&mut session).await? {
        Some(playlist) => success!("Removed radio \"{}\"", playlist.name),
        None => info!("No radio to clear"),
    }
    Ok(())
}

/// Plays the saved tracks from `offset` through the radio playlist.
pub async fn liked(offset: u32) -> Result<()> {
    let mut session = connect().await?;

    let pb = utils::spinner("Loading saved tracks...");
    let result = engine::play_saved_tracks(&mut session, offset).await;
    pb.finish_and_clear();

    let summary = result?;
    success!(
        "Playing \"{}\" with {} tracks",
        summary.playlist.name,
        summary.tracks
    );
    Ok(())
}

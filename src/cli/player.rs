use clap::ValueEnum;
use tabled::Table;

use crate::{
    Result, info,
    player::{self as playback, SEEK_STEP_MS},
    spotify::MusicProvider,
    success,
    types::{PlaybackState, Track, TrackTableRow},
};

use super::connect;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SeekDirection {
    Forward,
    Back,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VolumeChange {
    Set(u8),
    Up(u8),
    Down(u8),
}

pub async fn play() -> Result<()> {
    let session = connect().await?;
    playback::play(&session).await?;
    success!("Playing");
    Ok(())
}

pub async fn pause() -> Result<()> {
    let session = connect().await?;
    playback::pause(&session).await?;
    success!("Paused");
    Ok(())
}

pub async fn toggle() -> Result<()> {
    let session = connect().await?;
    if playback::toggle(&session).await? {
        success!("Playing");
    } else {
        success!("Paused");
    }
    Ok(())
}

pub async fn next(amount: usize) -> Result<()> {
    let session = connect().await?;
    playback::next(&session, amount).await
}

pub async fn previous() -> Result<()> {
    let session = connect().await?;
    playback::previous(&session).await
}

pub async fn seek(direction: SeekDirection) -> Result<()> {
    let session = connect().await?;
    let delta = match direction {
        SeekDirection::Forward => SEEK_STEP_MS,
        SeekDirection::Back => -SEEK_STEP_MS,
    };
    let position = playback::seek_relative(&session, delta).await?;
    info!("Position {}", format_duration(position));
    Ok(())
}

pub async fn position(position_ms: u64) -> Result<()> {
    let session = connect().await?;
    playback::set_position(&session, position_ms).await
}

pub async fn volume(change: VolumeChange) -> Result<()> {
    let session = connect().await?;
    let percent = match change {
        VolumeChange::Set(percent) => playback::set_volume(&session, percent).await?,
        VolumeChange::Up(step) => playback::change_volume(&session, step as i32).await?,
        VolumeChange::Down(step) => playback::change_volume(&session, -(step as i32)).await?,
    };
    success!("Volume {}%", percent);
    Ok(())
}

pub async fn shuffle() -> Result<()> {
    let session = connect().await?;
    let on = playback::toggle_shuffle(&session).await?;
    success!("Shuffle {}", if on { "on" } else { "off" });
    Ok(())
}

pub async fn repeat() -> Result<()> {
    let session = connect().await?;
    let state = playback::toggle_repeat(&session).await?;
    success!("Repeat {}", state);
    Ok(())
}

pub async fn like() -> Result<()> {
    let session = connect().await?;
    let track = playback::like(&session).await?;
    success!("Saved {} - {}", track.name, track.artist_names());
    Ok(())
}

pub async fn unlike() -> Result<()> {
    let session = connect().await?;
    let track = playback::unlike(&session).await?;
    success!("Removed {} - {}", track.name, track.artist_names());
    Ok(())
}

pub async fn link(context: bool) -> Result<()> {
    let session = connect().await?;
    let url = if context {
        playback::link_context(&session).await?
    } else {
        playback::link(&session).await?
    };
    println!("{url}");
    Ok(())
}

pub async fn play_url(url: &str) -> Result<()> {
    let session = connect().await?;
    let track_id = playback::play_url(&session, url).await?;
    success!("Playing {}", track_id);
    Ok(())
}

/// Enqueues `track_id`, or prints the queue when none is given.
pub async fn queue(track_id: Option<String>) -> Result<()> {
    let session = connect().await?;

    if let Some(track_id) = track_id {
        playback::queue_track(&session, &track_id).await?;
        success!("Queued {}", track_id);
        return Ok(());
    }

    let queue = session.provider.queue().await?;
    if let Some(track) = &queue.currently_playing {
        info!("Now playing: {}", describe(track));
    }
    let rows: Vec<TrackTableRow> = queue.queue.iter().map(TrackTableRow::from).collect();
    println!("{}", Table::new(rows));
    Ok(())
}

pub async fn status() -> Result<()> {
    let session = connect().await?;
    let state = session.provider.playback_state().await?;
    println!("{}", serde_json::to_string_pretty(&state)?);
    Ok(())
}

pub async fn now_playing() -> Result<()> {
    let session = connect().await?;
    let state = session.provider.playback_state().await?;
    println!("{}", now_playing_line(state.as_ref()));
    Ok(())
}

/// `▶ <track> - <artists>` while playing, `⏸` when paused.
pub fn now_playing_line(state: Option<&PlaybackState>) -> String {
    match state.and_then(|s| s.item.as_ref().map(|t| (s.is_playing, t))) {
        Some((true, track)) => format!("▶ {}", describe(track)),
        Some((false, track)) => format!("⏸ {}", describe(track)),
        None => "Nothing playing".to_string(),
    }
}

fn describe(track: &Track) -> String {
    format!("{} - {}", track.name, track.artist_names())
}

fn format_duration(ms: u64) -> String {
    let seconds = ms / 1000;
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

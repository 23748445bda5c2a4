use std::future::Future;

use crate::{
    Error, Result,
    management::PointerStore,
    spotify::MusicProvider,
    types::{Device, DeviceId, Playlist, PlayOptions},
};

use super::Session;

/// Reads the device saved with `devices set`.
///
/// # Errors
///
/// [`Error::DeviceNotConfigured`] when no device pointer exists (or it has
/// no id); a corrupt pointer file is reported as [`Error::Persistence`].
pub async fn saved_device_id<S: PointerStore>(store: &S) -> Result<DeviceId> {
    store
        .load::<Device>()
        .await?
        .and_then(|device| device.id)
        .ok_or(Error::DeviceNotConfigured)
}

/// Runs a playback call, retrying it once on the saved device when the
/// provider reports that no device is active.
///
/// `call` receives the device to target: `None` on the first attempt, the
/// saved device on the retry. Any other failure, and any failure of the
/// retry, is returned unchanged.
pub async fn with_device_fallback<S, T, F, Fut>(store: &S, mut call: F) -> Result<T>
where
    S: PointerStore,
    F: FnMut(Option<DeviceId>) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    match call(None).await {
        Err(Error::NoActiveDevice) => {
            let device_id = saved_device_id(store).await?;
            call(Some(device_id)).await
        }
        other => other,
    }
}

/// Transfers playback to the saved device and returns its id.
pub async fn activate_device<P, S, R>(session: &Session<P, S, R>) -> Result<DeviceId>
where
    P: MusicProvider,
    S: PointerStore,
{
    let device_id = saved_device_id(&session.store).await?;
    session.provider.transfer_playback(&device_id, true).await?;
    Ok(device_id)
}

/// Starts the radio playlist from its first track.
///
/// The device fallback may still race with a device that has just gone
/// away; in that case the saved device is activated explicitly and the play
/// call is attempted one final time.
pub async fn play_playlist<P, S, R>(
    session: &Session<P, S, R>,
    playlist: &Playlist,
    position_ms: Option<u64>,
) -> Result<()>
where
    P: MusicProvider,
    S: PointerStore,
{
    let options = &PlayOptions::context(&playlist.uri, 0).at_position(position_ms);
    let provider = &session.provider;
    let play = move |device: Option<DeviceId>| provider.play(options.clone().on_device(device));

    match with_device_fallback(&session.store, play).await {
        Err(Error::NoActiveDevice) => {
            activate_device(session).await?;
            with_device_fallback(&session.store, play).await
        }
        other => other,
    }
}

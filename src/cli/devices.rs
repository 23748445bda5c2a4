use tabled::Table;

use crate::{
    Result, info,
    management::PointerStore,
    player,
    spotify::MusicProvider,
    success,
    types::{Device, DeviceTableRow},
};

use super::connect;

pub async fn devices() -> Result<()> {
    let session = connect().await?;
    let devices = session.provider.devices().await?;
    if devices.is_empty() {
        info!("No devices available. Open Spotify on one of your devices.");
        return Ok(());
    }

    let saved = session.store.load::<Device>().await?.and_then(|d| d.id);
    let rows: Vec<DeviceTableRow> = devices.iter().map(DeviceTableRow::from).collect();
    println!("{}", Table::new(rows));

    if let Some(id) = saved {
        info!("Fallback device: {}", id);
    }
    Ok(())
}

pub async fn set_device(device_id: &str) -> Result<()> {
    let session = connect().await?;
    let device = player::set_device(&session, device_id).await?;
    success!("Playing on {} ({})", device.name, device.kind);
    Ok(())
}

use crate::{Result, config::Config, info, spotify, success};

pub async fn auth() -> Result<()> {
    let config = Config::from_env()?;
    info!("Waiting for the Spotify authorization (60s)...");
    spotify::auth::authorize(&config).await?;
    success!("Successfully authenticated with Spotify");
    Ok(())
}

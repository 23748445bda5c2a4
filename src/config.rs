//! Configuration management for the Spotify radio client.
//!
//! Configuration comes from environment variables, optionally seeded from a
//! `.env` file in the per-user config directory. The same directory holds the
//! token and the pointer records.
//!
//! The configuration system follows a hierarchical approach:
//! 1. Environment variables (highest priority)
//! 2. `.env` file in the config directory
//! 3. Application defaults (where applicable)

use std::{env, path::PathBuf};

use crate::{Error, Result};

pub const APP_DIR: &str = "sporadio";

const DEFAULT_API_URL: &str = "https://api.spotify.com/v1";
const DEFAULT_AUTH_URL: &str = "https://accounts.spotify.com/authorize";
const DEFAULT_TOKEN_URL: &str = "https://accounts.spotify.com/api/token";
const DEFAULT_REDIRECT_URI: &str = "http://127.0.0.1:8888/callback";
const DEFAULT_SERVER_ADDRESS: &str = "127.0.0.1:8888";
const DEFAULT_SCOPE: &str = "user-read-playback-state user-modify-playback-state \
    user-read-currently-playing user-library-read user-library-modify user-follow-read \
    playlist-read-private playlist-modify-public playlist-modify-private";

/// Returns the per-user directory holding the `.env` file, the token and
/// the pointer records.
///
/// # Directory Structure
///
/// - Linux: `~/.config/sporadio`
/// - macOS: `~/Library/Application Support/sporadio`
/// - Windows: `%APPDATA%/sporadio`
pub fn app_dir() -> PathBuf {
    let mut path = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push(APP_DIR);
    path
}

/// Loads environment variables from the `.env` file in the config directory.
///
/// Creates the directory if needed. A missing `.env` file is not an error,
/// the values may already be set in the environment.
pub async fn load_env() -> Result<()> {
    let dir = app_dir();
    async_fs::create_dir_all(&dir).await?;

    let path = dir.join(".env");
    if path.is_file() {
        dotenv::from_path(&path).map_err(|e| Error::Config(e.to_string()))?;
    }
    Ok(())
}

/// Runtime settings for talking to the Spotify Web API.
#[derive(Debug, Clone)]
pub struct Config {
    pub client_id: String,
    pub redirect_uri: String,
    pub server_addr: String,
    pub scope: String,
    pub api_url: String,
    pub auth_url: String,
    pub token_url: String,
    pub user_id: Option<String>,
}

impl Config {
    /// Reads the configuration from the environment.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] when `SPOTIFY_API_AUTH_CLIENT_ID` is not set.
    pub fn from_env() -> Result<Self> {
        let client_id = env::var("SPOTIFY_API_AUTH_CLIENT_ID")
            .map_err(|_| Error::Config("SPOTIFY_API_AUTH_CLIENT_ID must be set".to_string()))?;

        Ok(Self {
            client_id,
            redirect_uri: var_or("SPOTIFY_API_REDIRECT_URI", DEFAULT_REDIRECT_URI),
            server_addr: var_or("SERVER_ADDRESS", DEFAULT_SERVER_ADDRESS),
            scope: var_or("SPOTIFY_API_AUTH_SCOPE", DEFAULT_SCOPE),
            api_url: var_or("SPOTIFY_API_URL", DEFAULT_API_URL),
            auth_url: var_or("SPOTIFY_API_AUTH_URL", DEFAULT_AUTH_URL),
            token_url: var_or("SPOTIFY_API_TOKEN_URL", DEFAULT_TOKEN_URL),
            user_id: env::var("SPOTIFY_USER_ID").ok().filter(|v| !v.is_empty()),
        })
    }
}

fn var_or(name: &str, default: &str) -> String {
    env::var(name)
        .ok()
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default.to_string())
}

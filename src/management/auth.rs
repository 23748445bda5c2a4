use std::path::PathBuf;

use chrono::Utc;
use reqwest::Client;

use crate::{
    Error, Result, config,
    config::Config,
    types::{Token, TokenResponse},
};

/// Seconds before the reported expiry at which a token is refreshed.
const EXPIRY_MARGIN_SECS: u64 = 240;

pub struct TokenManager {
    token: Token,
    path: PathBuf,
}

impl TokenManager {
    pub fn new(token: Token) -> Self {
        TokenManager {
            token,
            path: Self::token_path(),
        }
    }

    pub async fn load() -> Result<Self> {
        let path = Self::token_path();
        let content = async_fs::read_to_string(&path).await.map_err(|e| {
            Error::Auth(format!(
                "No stored token ({e}). Please run `sporadio auth` first"
            ))
        })?;
        let token: Token = serde_json::from_str(&content)?;
        Ok(Self { token, path })
    }

    pub async fn persist(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            async_fs::create_dir_all(parent).await?;
        }

        let json = serde_json::to_string_pretty(&self.token)?;
        async_fs::write(&self.path, json).await?;
        Ok(())
    }

    /// Returns an access token that is valid for at least a few more minutes,
    /// refreshing and persisting it first when needed.
    pub async fn get_valid_token(&mut self, config: &Config) -> Result<String> {
        if self.is_expired() {
            let refreshed = refresh_token(config, &self.token.refresh_token).await?;
            self.token = refreshed;
            self.persist().await?;
        }

        Ok(self.token.access_token.clone())
    }

    fn is_expired(&self) -> bool {
        let now = Utc::now().timestamp() as u64;
        now + EXPIRY_MARGIN_SECS >= self.token.obtained_at + self.token.expires_in
    }

    fn token_path() -> PathBuf {
        config::app_dir().join("token.json")
    }
}

/// Exchanges a refresh token for a new access token. The old refresh token
/// is kept when the provider does not rotate it.
pub async fn refresh_token(config: &Config, refresh_token: &str) -> Result<Token> {
    let response = Client::new()
        .post(&config.token_url)
        .form(&[
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
            ("client_id", config.client_id.as_str()),
        ])
        .send()
        .await?;

    if !response.status().is_success() {
        return Err(Error::Auth(format!(
            "Token refresh failed with status {}. Please run `sporadio auth`",
            response.status()
        )));
    }

    let body: TokenResponse = response.json().await?;
    Ok(Token::from_response(body, Some(refresh_token)))
}

use std::time::Duration;

use reqwest::{Client, Url};
use tokio::{sync::oneshot, time::timeout};

use crate::{
    Error, Result,
    config::Config,
    management::TokenManager,
    server::start_callback_server,
    types::{Token, TokenResponse},
    utils, warning,
};

const CALLBACK_TIMEOUT: Duration = Duration::from_secs(60);

/// Runs the OAuth 2.0 PKCE flow and persists the resulting token.
///
/// 1. Generates the code verifier and its SHA256 challenge
/// 2. Starts the local callback server
/// 3. Opens the authorization URL in the browser (or prints it)
/// 4. Waits up to 60 seconds for the redirect
/// 5. Exchanges the code for a token and stores it
pub async fn authorize(config: &Config) -> Result<Token> {
    let code_verifier = utils::generate_code_verifier();
    let code_challenge = utils::generate_code_challenge(&code_verifier);

    let (sender, receiver) = oneshot::channel();
    let server = start_callback_server(&config.server_addr, sender).await?;

    let auth_url = authorize_url(config, &code_challenge)?;
    if webbrowser::open(auth_url.as_str()).is_err() {
        warning!(
            "Failed to open browser. Please navigate to the following URL manually:\n{}",
            auth_url
        )
    }

    let outcome = timeout(CALLBACK_TIMEOUT, receiver).await;
    server.abort();

    let code = match outcome {
        Ok(Ok(Ok(code))) => code,
        Ok(Ok(Err(reason))) => {
            return Err(Error::Auth(format!("Authorization denied: {reason}")));
        }
        Ok(Err(_)) => return Err(Error::Auth("Callback server stopped".to_string())),
        Err(_) => return Err(Error::Auth("Authentication timed out".to_string())),
    };

    let token = exchange_code(config, &code, &code_verifier).await?;
    TokenManager::new(token.clone()).persist().await?;
    Ok(token)
}

/// Builds the authorization URL the user has to visit.
pub fn authorize_url(config: &Config, code_challenge: &str) -> Result<Url> {
    Url::parse_with_params(
        &config.auth_url,
        &[
            ("client_id", config.client_id.as_str()),
            ("response_type", "code"),
            ("redirect_uri", config.redirect_uri.as_str()),
            ("code_challenge", code_challenge),
            ("code_challenge_method", "S256"),
            ("scope", config.scope.as_str()),
        ],
    )
    .map_err(|e| Error::Config(format!("Invalid authorization URL: {e}")))
}

/// Exchanges an authorization code and its PKCE verifier for a token.
pub async fn exchange_code(config: &Config, code: &str, verifier: &str) -> Result<Token> {
    let response = Client::new()
        .post(&config.token_url)
        .form(&[
            ("grant_type", "authorization_code"),
            ("client_id", config.client_id.as_str()),
            ("code", code),
            ("code_verifier", verifier),
            ("redirect_uri", config.redirect_uri.as_str()),
        ])
        .send()
        .await?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        return Err(Error::Auth(format!(
            "Token exchange failed ({status}): {body}"
        )));
    }

    let body: TokenResponse = response.json().await?;
    Ok(Token::from_response(body, None))
}

use std::time::Duration;

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use indicatif::{ProgressBar, ProgressStyle};
use rand::{Rng, distr::Alphanumeric};
use sha2::{Digest, Sha256};

pub fn generate_code_verifier() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(128)
        .map(char::from)
        .collect()
}

pub fn generate_code_challenge(verifier: &str) -> String {
    let hash = Sha256::digest(verifier.as_bytes());
    URL_SAFE_NO_PAD.encode(hash)
}

pub fn track_uri(track_id: &str) -> String {
    format!("spotify:track:{track_id}")
}

/// Extracts the id from a `spotify:<kind>:<id>` URI.
pub fn id_from_uri(uri: &str) -> Option<&str> {
    let mut parts = uri.split(':');
    match (parts.next(), parts.next(), parts.next()) {
        (Some("spotify"), Some(_), Some(id)) if !id.is_empty() => Some(id),
        _ => None,
    }
}

/// Extracts the track id from an `https://open.spotify.com/track/<id>` link.
/// Query strings (`?si=...`) and locale segments (`/intl-de/`) are ignored.
pub fn track_id_from_url(url: &str) -> Option<String> {
    let parsed = reqwest::Url::parse(url).ok()?;
    let mut segments = parsed.path_segments()?.filter(|s| !s.is_empty());
    while let Some(segment) = segments.next() {
        if segment == "track" {
            return segments.next().map(str::to_string);
        }
    }
    None
}

/// Spinner shown while network operations run.
pub fn spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_style(
        ProgressStyle::with_template("{spinner:.blue} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
    );
    pb
}

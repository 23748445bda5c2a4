//! Spotify Radio CLI Library
//!
//! This library provides playback control for the Spotify Web API and an
//! auto-managed "radio" playlist that is seeded from a song, artist, album,
//! playlist or the saved-tracks library and refilled from recommendations as
//! it is consumed.
//!
//! # Modules
//!
//! - `cli` - Command-line interface implementations
//! - `config` - Configuration management and environment variables
//! - `error` - Error taxonomy shared by every layer
//! - `management` - Persisted token and pointer records
//! - `player` - Playback commands with device fallback
//! - `radio` - The radio engine (seeding, expansion, playlist upkeep)
//! - `server` - Local HTTP server for OAuth callbacks
//! - `spotify` - Spotify Web API client implementation
//! - `types` - Data structures and type definitions
//! - `utils` - Utility functions and helpers
//!
//! # Example
//!
//! ```
//! use sporadio::{config, radio};
//!
//! #[tokio::main]
//! async fn main() -> sporadio::Result<()> {
//!     config::load_env().await?;
//!     // Build a session and start a radio...
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod management;
pub mod player;
pub mod radio;
pub mod server;
pub mod spotify;
pub mod types;
pub mod utils;

pub use error::Error;

/// Result type used throughout the crate.
///
/// Every fallible operation reports an [`Error`], so callers can match on the
/// recoverable cases (for example [`Error::NoActiveDevice`]) and print the rest.
pub type Result<T> = std::result::Result<T, Error>;

/// Prints an informational message with a blue bullet point.
///
/// # Example
///
/// ```
/// info!("Building radio from {}", name);
/// ```
#[macro_export]
macro_rules! info {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "o".blue().bold(), std::format_args!($($arg)*));
  })
}

/// Prints a success message with a green checkmark.
///
/// # Example
///
/// ```
/// success!("Radio started with {} tracks", count);
/// ```
#[macro_export]
macro_rules! success {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "✓".green().bold(), std::format_args!($($arg)*));
  })
}

/// Prints an error message with a red exclamation mark and exits the program.
///
/// Only the binary uses this, after a command has returned an error. Library
/// code propagates errors instead.
#[macro_export]
macro_rules! error {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "!".red().bold(), std::format_args!($($arg)*));
    std::process::exit(1);
  })
}

/// Prints a warning message with a yellow exclamation mark.
///
/// Used for recoverable issues that the user should notice.
#[macro_export]
macro_rules! warning {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "!".yellow().bold(), std::format_args!($($arg)*));
  })
}

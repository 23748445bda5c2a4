use clap::{
    Args, CommandFactory, Parser, Subcommand,
    builder::{
        Styles,
        styling::{AnsiColor, Effects},
    },
};
use clap_complete::{Shell, generate};

use sporadio::{
    cli::{self, RadioTarget, SeekDirection, VolumeChange},
    config, error,
    player::VOLUME_STEP,
    radio::DEFAULT_EXTRA_ROUNDS,
};

fn styles() -> Styles {
    Styles::styled()
        .header(AnsiColor::White.on_default() | Effects::BOLD)
        .usage(AnsiColor::White.on_default() | Effects::BOLD)
        .literal(AnsiColor::BrightBlue.on_default())
        .placeholder(AnsiColor::BrightGreen.on_default())
}

#[derive(Parser, Debug, Clone)]
#[clap(
  version = env!("CARGO_PKG_VERSION"),
  name=env!("CARGO_PKG_NAME"),
  bin_name=env!("CARGO_PKG_NAME"),
  author=env!("CARGO_PKG_AUTHORS"),
  about=env!("CARGO_PKG_DESCRIPTION"),
  styles=styles(),
)]
struct Cli {
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Authorize with Spotify API
    Auth,

    /// Resume playback
    Play,

    /// Pause playback
    Pause,

    /// Toggle between play and pause
    Toggle,

    /// Skip forward, optionally several tracks at once
    Next {
        #[clap(default_value_t = 1, value_parser = clap::value_parser!(u64).range(1..))]
        amount: u64,
    },

    /// Skip to the previous track
    Previous,

    /// Seek 5 seconds forward or back
    Seek { direction: SeekDirection },

    /// Jump to a position in milliseconds
    Position { position_ms: u64 },

    /// Set or change the volume
    Volume(VolumeOptions),

    /// Toggle shuffle
    Shuffle,

    /// Toggle repeat between off and context
    Repeat,

    /// Save the current track to your library
    Like,

    /// Remove the current track from your library
    Unlike,

    /// Print the link of the current track
    Link {
        /// Link the album or playlist instead
        #[clap(long)]
        context: bool,
    },

    /// Play the track behind an open.spotify.com link
    PlayUrl { url: String },

    /// Show the queue, or add a track to it
    Queue { track_id: Option<String> },

    /// Print the raw playback state
    Status,

    /// Print the current track
    NowPlaying,

    /// List devices, or select the fallback device
    Devices(DevicesOptions),

    /// Build a radio playlist and play it
    Radio(RadioOptions),

    /// Play your saved tracks
    Liked {
        /// Offset into the saved tracks
        #[clap(long, default_value_t = 0)]
        position: u32,
    },

    /// List saved tracks
    Tracks(PageOption),

    /// List saved albums
    Albums(PageOption),

    /// List your playlists
    Playlists(PageOption),

    /// List followed artists
    Artists(PageOption),

    /// List the tracks of an album
    AlbumTracks {
        album_id: String,
        #[clap(flatten)]
        page: PageOption,
    },

    /// List the tracks of a playlist
    PlaylistTracks {
        playlist_id: String,
        #[clap(flatten)]
        page: PageOption,
    },

    /// Search tracks, artists, albums and playlists
    Search {
        query: String,
        #[clap(flatten)]
        page: PageOption,
    },

    /// Get shell completions
    Completions(CompletionsOption),
}

#[derive(Args, Debug, Clone)]
pub struct PageOption {
    /// Page to show, 50 items each
    #[clap(long, default_value_t = 1)]
    pub page: u32,
}

#[derive(Parser, Debug, Clone)]
pub struct VolumeOptions {
    #[command(subcommand)]
    pub command: VolumeSubcommand,
}

#[derive(Subcommand, Debug, Clone)]
pub enum VolumeSubcommand {
    /// Set the volume in percent
    Set { percent: u8 },
    /// Raise the volume
    Up {
        #[clap(default_value_t = VOLUME_STEP as u8)]
        step: u8,
    },
    /// Lower the volume
    Down {
        #[clap(default_value_t = VOLUME_STEP as u8)]
        step: u8,
    },
}

#[derive(Parser, Debug, Clone)]
#[command(
    about = "List devices, or select the fallback device",
    args_conflicts_with_subcommands = true
)]
pub struct DevicesOptions {
    #[command(subcommand)]
    pub command: Option<DevicesSubcommand>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum DevicesSubcommand {
    /// Save the device used when no device is active and play on it
    Set { device_id: String },
}

#[derive(Parser, Debug, Clone)]
#[command(
    about = "Build a radio playlist and play it",
    args_conflicts_with_subcommands = true // seed flags do not apply to `refill` or `clear`
)]
pub struct RadioOptions {
    /// Seed from an artist
    #[clap(long, group = "seed")]
    pub artist: Option<String>,

    /// Seed from an album
    #[clap(long, group = "seed")]
    pub album: Option<String>,

    /// Seed from a playlist
    #[clap(long, group = "seed")]
    pub playlist: Option<String>,

    /// Seed from your saved tracks
    #[clap(long, group = "seed")]
    pub saved: bool,

    /// Follow-up rounds of recommendations added after playback starts
    #[clap(long, default_value_t = DEFAULT_EXTRA_ROUNDS)]
    pub extend: usize,

    #[command(subcommand)]
    pub command: Option<RadioSubcommand>,
}

impl RadioOptions {
    fn target(&self) -> RadioTarget {
        if let Some(id) = &self.artist {
            RadioTarget::Artist(id.clone())
        } else if let Some(id) = &self.album {
            RadioTarget::Album(id.clone())
        } else if let Some(id) = &self.playlist {
            RadioTarget::Playlist(id.clone())
        } else if self.saved {
            RadioTarget::SavedTracks
        } else {
            RadioTarget::CurrentlyPlaying
        }
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum RadioSubcommand {
    /// Remove played tracks and top the radio up again
    Refill,
    /// Remove the radio playlist
    Clear,
}

#[derive(Parser, Debug, Clone)]
pub struct CompletionsOption {
    shell: Shell,
}

#[tokio::main]
async fn main() {
    if let Err(e) = config::load_env().await {
        error!("Cannot load environment. Err: {}", e);
    }

    let cli = Cli::parse();

    if let Err(e) = run(cli.command).await {
        error!("{}", e);
    }
}

async fn run(command: Command) -> sporadio::Result<()> {
    match command {
        Command::Auth => cli::auth().await,
        Command::Play => cli::play().await,
        Command::Pause => cli::pause().await,
        Command::Toggle => cli::toggle().await,
        Command::Next { amount } => cli::next(amount as usize).await,
        Command::Previous => cli::previous().await,
        Command::Seek { direction } => cli::seek(direction).await,
        Command::Position { position_ms } => cli::position(position_ms).await,
        Command::Volume(opt) => {
            let change = match opt.command {
                VolumeSubcommand::Set { percent } => VolumeChange::Set(percent),
                VolumeSubcommand::Up { step } => VolumeChange::Up(step),
                VolumeSubcommand::Down { step } => VolumeChange::Down(step),
            };
            cli::volume(change).await
        }
        Command::Shuffle => cli::shuffle().await,
        Command::Repeat => cli::repeat().await,
        Command::Like => cli::like().await,
        Command::Unlike => cli::unlike().await,
        Command::Link { context } => cli::link(context).await,
        Command::PlayUrl { url } => cli::play_url(&url).await,
        Command::Queue { track_id } => cli::queue(track_id).await,
        Command::Status => cli::status().await,
        Command::NowPlaying => cli::now_playing().await,
        Command::Devices(opt) => match opt.command {
            Some(DevicesSubcommand::Set { device_id }) => cli::set_device(&device_id).await,
            None => cli::devices().await,
        },
        Command::Radio(opt) => match opt.command {
            Some(RadioSubcommand::Refill) => cli::refill_radio().await,
            Some(RadioSubcommand::Clear) => cli::clear_radio().await,
            None => cli::radio(opt.target(), opt.extend).await,
        },
        Command::Liked { position } => cli::liked(position).await,
        Command::Tracks(opt) => cli::tracks(opt.page).await,
        Command::Albums(opt) => cli::albums(opt.page).await,
        Command::Playlists(opt) => cli::playlists(opt.page).await,
        Command::Artists(opt) => cli::artists(opt.page).await,
        Command::AlbumTracks { album_id, page } => cli::album_tracks(&album_id, page.page).await,
        Command::PlaylistTracks { playlist_id, page } => {
            cli::playlist_tracks(&playlist_id, page.page).await
        }
        Command::Search { query, page } => cli::search(&query, page.page).await,
        Command::Completions(opt) => {
            let mut cmd = Cli::command_for_update();
            let name = cmd.get_name().to_string();
            generate(opt.shell, &mut cmd, name, &mut std::io::stdout());
            Ok(())
        }
    }
}

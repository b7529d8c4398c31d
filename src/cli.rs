use clap::Parser;
use std::path::PathBuf;

use crate::config::Config;

#[derive(Parser, Debug)]
#[command(name = "mpristext")]
#[command(version)]
#[command(
    about = "Write metadata from MPRIS-compliant media players into a text file",
    long_about = None
)]
pub struct Args {
    /// Path to config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// File the now-playing text is written to (overrides config)
    #[arg(short, long)]
    pub file: Option<PathBuf>,

    /// Overall template; {artist}, {title} and {album} expand to the
    /// per-field segments (overrides config)
    #[arg(long)]
    pub format: Option<String>,

    /// Artist segment template; {} expands to the artist name (overrides config)
    #[arg(long)]
    pub format_artist: Option<String>,

    /// Title segment template; {} expands to the track title (overrides config)
    #[arg(long)]
    pub format_title: Option<String>,

    /// Album segment template; {} expands to the album name (overrides config)
    #[arg(long)]
    pub format_album: Option<String>,
}

impl Args {
    /// Fold command line overrides into the loaded config.
    pub fn apply_to(&self, config: &mut Config) {
        if let Some(file) = &self.file {
            config.output.file = file.clone();
        }
        if let Some(format) = &self.format {
            config.format.overall = format.clone();
        }
        if let Some(artist) = &self.format_artist {
            config.format.artist = artist.clone();
        }
        if let Some(title) = &self.format_title {
            config.format.title = title.clone();
        }
        if let Some(album) = &self.format_album {
            config.format.album = album.clone();
        }
    }
}

use std::convert::Infallible;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::LazyLock;

use clap::{Parser, Subcommand, ValueEnum};
use directories::ProjectDirs;

use crate::cli::*;
use crate::dhash::{DEFAULT_HASH_SIZE, MAX_HASH_SIZE};
use crate::kmeans::PaletteOptions;

static CONF_DIR: LazyLock<String> = LazyLock::new(|| {
    ProjectDirs::from("", "wallflower", "wallflower")
        .map(|dirs| dirs.config_dir().to_string_lossy().into_owned())
        .unwrap_or_else(|| ".wallflower".to_owned())
});

fn default_config_dir() -> &'static str {
    CONF_DIR.as_str()
}

#[derive(Parser, Debug, Clone)]
pub struct AnalyzeOptions {
    /// Difference hash grid size, fingerprints have SIZE² bits
    #[arg(long, value_name = "SIZE", default_value_t = DEFAULT_HASH_SIZE, value_parser = clap::value_parser!(u32).range(1..=MAX_HASH_SIZE as i64))]
    pub hash_size: u32,
    /// Number of dominant colors extracted per wallpaper
    #[arg(long, value_name = "N", default_value_t = 10, value_parser = clap::value_parser!(u32).range(1..=255))]
    pub colors: u32,
    /// Independent k-means runs, the best one is kept
    #[arg(long, value_name = "N", default_value_t = 10)]
    pub restarts: usize,
    /// Maximum k-means iterations per run
    #[arg(long, value_name = "N", default_value_t = 20)]
    pub max_iter: usize,
    /// k-means convergence threshold
    #[arg(long, value_name = "EPS", default_value_t = 1e-4)]
    pub converge: f32,
    /// Fixed random seed, makes palettes reproducible
    #[arg(long)]
    pub seed: Option<u64>,
    /// Images larger than this are shrunk before hashing, keeping the aspect ratio
    #[arg(short = 'S', long, value_name = "WIDTHxHEIGHT", value_parser = parse_size, default_value = "1920x1080")]
    pub max_size: (u32, u32),
    /// Thumbnail size used for color clustering
    #[arg(long, value_name = "WIDTHxHEIGHT", value_parser = parse_size, default_value = "256x256")]
    pub palette_size: (u32, u32),
    /// Wallpapers fetched from the database per batch
    #[arg(long, value_name = "N", default_value_t = 100)]
    pub batch_size: usize,
}

impl AnalyzeOptions {
    pub fn palette(&self) -> PaletteOptions {
        PaletteOptions {
            k: self.colors as usize,
            restarts: self.restarts,
            max_iter: self.max_iter,
            converge: self.converge,
            seed: self.seed,
        }
    }
}

#[derive(Parser, Debug, Clone)]
pub struct SearchOptions {
    /// Number of results
    #[arg(short, value_name = "K", default_value_t = 20)]
    pub k: usize,
    /// Output format
    #[arg(long, value_name = "FORMAT", value_enum, default_value_t = OutputFormat::Table)]
    pub output_format: OutputFormat,
}

#[derive(Parser, Debug, Clone)]
#[command(name = "wallflower", version)]
pub struct Opts {
    #[command(subcommand)]
    pub subcmd: SubCommand,
    /// Configuration directory holding the database
    #[arg(short, long, default_value = default_config_dir())]
    pub conf_dir: ConfDir,
}

#[derive(Subcommand, Debug, Clone)]
pub enum SubCommand {
    /// Add the wallpapers of a directory to the database
    Add(AddCommand),
    /// Compute fingerprints and palettes of wallpapers not analyzed yet
    Analyze(AnalyzeCommand),
    /// Group near-identical wallpapers
    Duplicates(DuplicatesCommand),
    /// Find the wallpapers most similar to a stored one
    Similar(SimilarCommand),
    /// Find stored colors close to a color and the wallpapers using them
    Colors(ColorsCommand),
    /// Start the HTTP API
    Server(ServerCommand),
}

#[derive(Debug, Clone)]
pub struct ConfDir {
    path: PathBuf,
}

impl ConfDir {
    /// Path of the database file
    pub fn database(&self) -> PathBuf {
        self.path.join("wallflower.db")
    }
}

impl FromStr for ConfDir {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self { path: PathBuf::from(s) })
    }
}

fn parse_size(s: &str) -> anyhow::Result<(u32, u32)> {
    let parts: Vec<&str> = s.split('x').collect();
    if parts.len() != 2 {
        return Err(anyhow::anyhow!("invalid size: {}", s));
    }
    let size = (parts[0].parse()?, parts[1].parse()?);
    if size.0 == 0 || size.1 == 0 {
        return Err(anyhow::anyhow!("invalid size: {}", s));
    }
    Ok(size)
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
}

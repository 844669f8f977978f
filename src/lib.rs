//! Perceptual similarity search for a wallpaper collection
//!
//! Images are fingerprinted with a difference hash and summarized by their
//! dominant colors. Near-duplicate grouping, similar image lookup and color
//! lookup all run on a vantage-point tree built over a snapshot of the store.

pub mod analyze;
pub mod cli;
pub mod color;
pub mod config;
pub mod db;
pub mod dhash;
pub mod duplicate;
mod error;
pub mod hamming;
pub mod kmeans;
pub mod search;
mod server;
pub mod utils;
pub mod vptree;

pub use config::Opts;
pub use error::{Error, Result};

/// Row id of a wallpaper in the store
pub type ImageId = i64;

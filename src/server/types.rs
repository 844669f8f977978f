use serde::{Deserialize, Serialize};

use crate::ImageId;
use crate::color::Color;
use crate::db::{AspectRatio, DEFAULT_ASPECT_TOLERANCE, WallpaperRecord, parse_aspect_ratio};
use crate::error::Error;

/// Query of `/similar/{id}`
#[derive(Debug, Deserialize)]
pub struct SimilarQuery {
    /// Number of results, the server default when absent
    pub k: Option<usize>,
}

/// Query of `/colors`
#[derive(Debug, Deserialize)]
pub struct ColorsQuery {
    /// `#RRGGBB`, the `#` has to be percent-encoded
    pub color: String,
    pub n: Option<usize>,
}

/// Query of `/duplicates`
#[derive(Debug, Deserialize)]
pub struct DuplicatesQuery {
    pub radius: u32,
}

/// Every endpoint answers with the elapsed time and its result
#[derive(Debug, Serialize)]
pub struct Timed<T> {
    /// Milliseconds spent on the query
    pub time: u128,
    pub result: T,
}

/// Query of `/wallpapers`, every filter is optional
#[derive(Debug, Deserialize)]
pub struct WallpapersQuery {
    /// Match wallpapers using the `n` stored colors nearest to this one
    pub color: Option<String>,
    pub n: Option<usize>,
    /// Comma separated ids
    pub ids: Option<String>,
    /// Only wallpapers among the `k` most similar to this one
    pub similar_to: Option<ImageId>,
    pub k: Option<usize>,
    /// `W:H` or a ratio
    pub aspect_ratio: Option<String>,
    pub tolerance: Option<f64>,
    pub limit: Option<u32>,
}

impl WallpapersQuery {
    pub fn parse_ids(&self) -> crate::Result<Option<Vec<ImageId>>> {
        self.ids
            .as_deref()
            .map(|ids| {
                ids.split(',')
                    .map(|id| {
                        id.trim()
                            .parse()
                            .map_err(|_| Error::InvalidArgument(format!("invalid id: {id:?}")))
                    })
                    .collect::<crate::Result<Vec<ImageId>>>()
            })
            .transpose()
    }

    pub fn parse_aspect_ratio(&self) -> crate::Result<Option<AspectRatio>> {
        self.aspect_ratio
            .as_deref()
            .map(|s| {
                let tolerance = self.tolerance.unwrap_or(DEFAULT_ASPECT_TOLERANCE);
                AspectRatio::new(parse_aspect_ratio(s)?, tolerance)
            })
            .transpose()
    }
}

/// A wallpaper with its palette
#[derive(Debug, Serialize)]
pub struct WallpaperDetail {
    #[serde(flatten)]
    pub record: WallpaperRecord,
    pub colors: Vec<Color>,
}

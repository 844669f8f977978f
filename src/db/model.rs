use serde::Serialize;
use sqlx::FromRow;

use crate::ImageId;
use crate::color::Color;
use crate::dhash::Fingerprint;
use crate::error::Error;

/// A wallpaper known to the store
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct WallpaperRecord {
    pub id: i64,
    /// blake3 of the file content
    #[serde(skip)]
    pub hash: Vec<u8>,
    pub path: String,
    /// Decimal difference hash, `None` until analyzed
    pub dhash: Option<String>,
    pub width: Option<i64>,
    pub height: Option<i64>,
    pub analyzed: bool,
    pub duplicate: bool,
}

impl WallpaperRecord {
    pub fn fingerprint(&self) -> crate::Result<Option<Fingerprint>> {
        self.dhash.as_deref().map(str::parse).transpose()
    }
}

/// Default allowed deviation of `width / height` from the requested ratio
pub const DEFAULT_ASPECT_TOLERANCE: f64 = 0.01;

/// `width / height` within `tolerance` of `ratio`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AspectRatio {
    pub ratio: f64,
    pub tolerance: f64,
}

impl AspectRatio {
    pub fn new(ratio: f64, tolerance: f64) -> crate::Result<Self> {
        if !ratio.is_finite() || ratio <= 0.0 {
            return Err(Error::InvalidArgument(format!("aspect ratio must be positive, got {ratio}")));
        }
        if !tolerance.is_finite() || tolerance < 0.0 {
            return Err(Error::InvalidArgument(format!("tolerance must be non-negative, got {tolerance}")));
        }
        Ok(Self { ratio, tolerance })
    }
}

/// Parse `16:9` or `1.78`
pub fn parse_aspect_ratio(s: &str) -> crate::Result<f64> {
    let invalid = || Error::InvalidArgument(format!("invalid aspect ratio: {s:?}"));
    let ratio = match s.split_once(':') {
        Some((w, h)) => {
            let w: f64 = w.trim().parse().map_err(|_| invalid())?;
            let h: f64 = h.trim().parse().map_err(|_| invalid())?;
            w / h
        }
        None => s.trim().parse().map_err(|_| invalid())?,
    };
    if !ratio.is_finite() || ratio <= 0.0 {
        return Err(invalid());
    }
    Ok(ratio)
}

/// Filters of a wallpaper listing, unset filters match everything
///
/// Duplicates are always left out.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WallpaperQuery {
    /// Only these wallpapers
    pub ids: Option<Vec<ImageId>>,
    /// Wallpapers using any of these colors, ordered by the color's rank in
    /// their palette
    pub colors: Option<Vec<Color>>,
    pub aspect_ratio: Option<AspectRatio>,
}

impl WallpaperQuery {
    /// Narrow the id filter to `ids`, keeping the ids already required
    pub fn restrict_ids(&mut self, ids: Vec<ImageId>) {
        self.ids = Some(match self.ids.take() {
            Some(current) => ids.into_iter().filter(|id| current.contains(id)).collect(),
            None => ids,
        });
    }
}

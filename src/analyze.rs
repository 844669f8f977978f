use image::DynamicImage;
use serde::Serialize;

use crate::color::Color;
use crate::config::AnalyzeOptions;
use crate::dhash::{DEFAULT_HASH_SIZE, Fingerprint, dhash_image};
use crate::error::Result;
use crate::kmeans::{PaletteOptions, dominant_colors_image};

/// Everything the store keeps about the content of a wallpaper
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Analysis {
    pub fingerprint: Fingerprint,
    /// Size of the original image
    pub width: u32,
    pub height: u32,
    /// Dominant colors, most frequent first
    pub colors: Vec<Color>,
}

#[derive(Debug, Clone)]
pub struct Analyzer {
    hash_size: u32,
    max_size: (u32, u32),
    palette_size: (u32, u32),
    palette: PaletteOptions,
}

impl Default for Analyzer {
    fn default() -> Self {
        Self {
            hash_size: DEFAULT_HASH_SIZE,
            max_size: (1920, 1080),
            palette_size: (256, 256),
            palette: PaletteOptions::default(),
        }
    }
}

impl From<&AnalyzeOptions> for Analyzer {
    fn from(opts: &AnalyzeOptions) -> Self {
        Self {
            hash_size: opts.hash_size,
            max_size: opts.max_size,
            palette_size: opts.palette_size,
            palette: opts.palette(),
        }
    }
}

impl Analyzer {
    pub fn new(hash_size: u32, palette: PaletteOptions) -> Self {
        Self { hash_size, palette, ..Default::default() }
    }

    pub fn analyze_image(&self, image: &DynamicImage) -> Result<Analysis> {
        let (width, height) = (image.width(), image.height());

        let (mw, mh) = self.max_size;
        let shrunk;
        let image = if width > mw || height > mh {
            shrunk = image.thumbnail(mw, mh);
            &shrunk
        } else {
            image
        };

        let fingerprint = dhash_image(image, self.hash_size)?;

        let (pw, ph) = self.palette_size;
        let thumbnail = image.thumbnail(pw, ph).to_rgb8();
        let colors = dominant_colors_image(&thumbnail, &self.palette)?;

        Ok(Analysis { fingerprint, width, height, colors })
    }

    /// Decode an encoded image and analyze it
    pub fn analyze_bytes(&self, bytes: &[u8]) -> Result<Analysis> {
        let image = image::load_from_memory(bytes)?;
        self.analyze_image(&image)
    }
}

use std::collections::HashMap;

use image::RgbImage;
use kmeans_colors::get_kmeans;
use log::trace;
use palette::Srgb;

use crate::color::Color;
use crate::error::{Error, Result};

/// Parameters of the dominant color clustering
#[derive(Debug, Clone, PartialEq)]
pub struct PaletteOptions {
    /// Number of clusters
    pub k: usize,
    /// Independent runs, the one with the lowest score wins
    pub restarts: usize,
    pub max_iter: usize,
    /// Stop once the score improves by less than this between iterations
    pub converge: f32,
    /// Fixed seed for reproducible output, run `i` uses `seed + i`
    pub seed: Option<u64>,
}

impl Default for PaletteOptions {
    fn default() -> Self {
        Self { k: 10, restarts: 10, max_iter: 20, converge: 1e-4, seed: None }
    }
}

/// Cluster a pixel buffer into its dominant colors
///
/// Colors are ordered by the number of pixels assigned to them, most frequent
/// first. An image with at most `k` distinct colors yields each of them once,
/// so the result can be shorter than `k`.
pub fn dominant_colors(pixels: &[[u8; 3]], options: &PaletteOptions) -> Result<Vec<Color>> {
    if pixels.is_empty() {
        return Err(Error::EmptyInput);
    }
    if options.k == 0 || options.k > u8::MAX as usize {
        return Err(Error::InvalidArgument(format!("k must be in 1..=255, got {}", options.k)));
    }

    // distinct colors in first-seen order with their pixel count
    let mut histogram: Vec<(Color, usize)> = vec![];
    let mut position: HashMap<Color, usize> = HashMap::new();
    for &[r, g, b] in pixels {
        let color = Color::from_rgb(r, g, b);
        let i = *position.entry(color).or_insert_with(|| {
            histogram.push((color, 0));
            histogram.len() - 1
        });
        histogram[i].1 += 1;
    }

    if histogram.len() <= options.k {
        trace!("{} distinct colors, skipping clustering", histogram.len());
        return Ok(rank(histogram));
    }

    let buf = pixels
        .iter()
        .map(|&[r, g, b]| Srgb::new(r, g, b).into_format::<f32>())
        .collect::<Vec<_>>();

    let base = options.seed.unwrap_or_else(rand::random);
    let best = (0..options.restarts.max(1) as u64)
        .map(|run| {
            get_kmeans(
                options.k,
                options.max_iter,
                options.converge,
                false,
                &buf,
                base.wrapping_add(run),
            )
        })
        .min_by(|a, b| a.score.total_cmp(&b.score))
        .ok_or(Error::EmptyInput)?;

    let mut counts = vec![0usize; best.centroids.len()];
    for &i in &best.indices {
        counts[i as usize] += 1;
    }

    // centroids that quantize to the same color are one palette entry
    let mut merged: Vec<(Color, usize)> = vec![];
    let mut position: HashMap<Color, usize> = HashMap::new();
    for (centroid, count) in best.centroids.iter().zip(counts) {
        if count == 0 {
            continue;
        }
        let rgb: Srgb<u8> = centroid.into_format();
        let color = Color::from_rgb(rgb.red, rgb.green, rgb.blue);
        match position.get(&color) {
            Some(&i) => merged[i].1 += count,
            None => {
                position.insert(color, merged.len());
                merged.push((color, count));
            }
        }
    }

    Ok(rank(merged))
}

/// Cluster the pixels of an RGB image
pub fn dominant_colors_image(image: &RgbImage, options: &PaletteOptions) -> Result<Vec<Color>> {
    let pixels = image.pixels().map(|p| p.0).collect::<Vec<_>>();
    dominant_colors(&pixels, options)
}

/// Stable sort by descending count, equal counts keep their order
fn rank(mut entries: Vec<(Color, usize)>) -> Vec<Color> {
    entries.sort_by(|a, b| b.1.cmp(&a.1));
    entries.into_iter().map(|(color, _)| color).collect()
}

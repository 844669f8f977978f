use std::fmt;
use std::str::FromStr;

use image::imageops::{self, FilterType};
use image::{DynamicImage, GrayImage};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{Error, Result};
use crate::hamming::hamming;

/// Hash grid used when the caller has no preference, 64 bit fingerprints
pub const DEFAULT_HASH_SIZE: u32 = 8;

/// Largest grid whose `hash_size²` bits still fit in a `u128`
pub const MAX_HASH_SIZE: u32 = 11;

/// Difference hash of an image, `hash_size²` bits packed row-major
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Fingerprint(u128);

impl Fingerprint {
    pub fn new(value: u128) -> Self {
        Self(value)
    }

    pub fn value(&self) -> u128 {
        self.0
    }

    /// Hamming distance to another fingerprint of the same width
    pub fn distance(&self, other: &Fingerprint) -> u32 {
        hamming(self.0, other.0)
    }
}

impl From<u64> for Fingerprint {
    fn from(value: u64) -> Self {
        Self(value as u128)
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Fingerprint {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        s.trim().parse::<u128>().map(Self).map_err(|_| Error::InvalidFingerprint(s.to_owned()))
    }
}

impl Serialize for Fingerprint {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Fingerprint {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Compute the difference hash of a grayscale image
///
/// The image is resized to `(hash_size + 1) x hash_size` with bilinear
/// filtering, then every pixel is compared to its left neighbour. Bit
/// `row * hash_size + col` is set when the pixel at `col + 1` is brighter than
/// the one at `col`.
pub fn dhash(image: &GrayImage, hash_size: u32) -> Result<Fingerprint> {
    if hash_size > MAX_HASH_SIZE {
        return Err(Error::InvalidArgument(format!(
            "hash size {hash_size} exceeds {MAX_HASH_SIZE}"
        )));
    }
    let (width, height) = (hash_size + 1, hash_size);
    if width < 2 {
        return Err(Error::InvalidImage("fewer than two columns after resize".to_owned()));
    }
    if image.width() == 0 || image.height() == 0 {
        return Err(Error::InvalidImage(format!(
            "degenerate image size {}x{}",
            image.width(),
            image.height()
        )));
    }

    let resized = imageops::resize(image, width, height, FilterType::Triangle);
    let data = resized.as_raw();

    let mut bits = 0u128;
    for (i, row) in data.chunks_exact(width as usize).enumerate() {
        for j in 0..hash_size as usize {
            if row[j + 1] > row[j] {
                bits |= 1 << (i * hash_size as usize + j);
            }
        }
    }

    Ok(Fingerprint(bits))
}

/// Convert to grayscale and compute the difference hash
pub fn dhash_image(image: &DynamicImage, hash_size: u32) -> Result<Fingerprint> {
    dhash(&image.to_luma8(), hash_size)
}

#[cfg(test)]
mod tests {
    use image::Luma;

    use super::*;

    fn horizontal_gradient(width: u32, height: u32) -> GrayImage {
        GrayImage::from_fn(width, height, |x, _| Luma([(x * 255 / (width - 1)) as u8]))
    }

    #[test]
    fn test_dhash_bit_width() {
        let img = horizontal_gradient(90, 60);
        for size in 1..=MAX_HASH_SIZE {
            let hash = dhash(&img, size).unwrap();
            let bits = size * size;
            // a strictly increasing gradient sets every bit of the grid and nothing else
            assert_eq!(hash.value(), (1u128 << bits) - 1, "size {size}");
        }
    }

    #[test]
    fn test_dhash_deterministic() {
        let img = GrayImage::from_fn(64, 48, |x, y| Luma([((x * 7 + y * 13) % 251) as u8]));
        let a = dhash(&img, DEFAULT_HASH_SIZE).unwrap();
        let b = dhash(&img, DEFAULT_HASH_SIZE).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_dhash_constant_image() {
        let img = GrayImage::from_pixel(32, 32, Luma([128]));
        assert_eq!(dhash(&img, DEFAULT_HASH_SIZE).unwrap().value(), 0);
    }

    #[test]
    fn test_dhash_bit_order() {
        // already at hash resolution: only the first pair of the first row increases
        let mut img = GrayImage::from_pixel(9, 8, Luma([100]));
        img.put_pixel(1, 0, Luma([200]));
        img.put_pixel(2, 0, Luma([200]));
        assert_eq!(dhash(&img, DEFAULT_HASH_SIZE).unwrap().value(), 1);

        // last pair of the last row is bit 63
        let mut img = GrayImage::from_pixel(9, 8, Luma([100]));
        img.put_pixel(8, 7, Luma([200]));
        assert_eq!(dhash(&img, DEFAULT_HASH_SIZE).unwrap().value(), 1 << 63);
    }

    #[test]
    fn test_dhash_rejects_degenerate() {
        let img = horizontal_gradient(16, 16);
        assert!(matches!(dhash(&img, 0), Err(Error::InvalidImage(_))));
        assert!(matches!(dhash(&img, 12), Err(Error::InvalidArgument(_))));
        let empty = GrayImage::new(0, 0);
        assert!(matches!(dhash(&empty, 8), Err(Error::InvalidImage(_))));
    }

    #[test]
    fn test_fingerprint_wire_format() {
        let fp = Fingerprint::from(u64::MAX);
        assert_eq!(fp.to_string(), "18446744073709551615");
        assert_eq!("18446744073709551615".parse::<Fingerprint>().unwrap(), fp);
        assert!(matches!("0x12".parse::<Fingerprint>(), Err(Error::InvalidFingerprint(_))));
        assert_eq!(serde_json::to_string(&Fingerprint::new(42)).unwrap(), "\"42\"");
    }
}

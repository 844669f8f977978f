use std::fmt;
use std::str::FromStr;

use palette::white_point::D65;
use palette::{IntoColor, Lab, LinSrgb, Srgb};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{Error, Result};

/// 24-bit packed RGB color, `0xRRGGBB`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Color(u32);

impl Color {
    pub const MAX: u32 = 0xFF_FF_FF;

    pub fn from_rgb(red: u8, green: u8, blue: u8) -> Self {
        Self((red as u32) << 16 | (green as u32) << 8 | blue as u32)
    }

    /// Build from a packed value, as stored in the database
    pub fn from_packed(value: u32) -> Result<Self> {
        if value > Self::MAX {
            return Err(Error::InvalidColor(format!("{value:#x}")));
        }
        Ok(Self(value))
    }

    pub fn value(&self) -> u32 {
        self.0
    }

    pub fn rgb(&self) -> [u8; 3] {
        [(self.0 >> 16) as u8, (self.0 >> 8) as u8, self.0 as u8]
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:06X}", self.0)
    }
}

impl FromStr for Color {
    type Err = Error;

    /// Accepts `#RRGGBB` or `RRGGBB`, case-insensitive
    fn from_str(s: &str) -> Result<Self> {
        let hex = s.trim();
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        if hex.len() != 6 || !hex.bytes().all(|c| c.is_ascii_hexdigit()) {
            return Err(Error::InvalidColor(s.to_owned()));
        }
        u32::from_str_radix(hex, 16).map(Self).map_err(|_| Error::InvalidColor(s.to_owned()))
    }
}

impl Serialize for Color {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// A point in CIE L*a*b* space under the D65 illuminant
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LabPoint {
    l: f64,
    a: f64,
    b: f64,
}

impl LabPoint {
    pub fn l(&self) -> f64 {
        self.l
    }

    pub fn a(&self) -> f64 {
        self.a
    }

    pub fn b(&self) -> f64 {
        self.b
    }

    /// Euclidean distance, roughly the perceived difference between two colors
    pub fn distance(&self, other: &LabPoint) -> f64 {
        let (dl, da, db) = (self.l - other.l, self.a - other.a, self.b - other.b);
        (dl * dl + da * da + db * db).sqrt()
    }
}

/// Convert an sRGB color to LAB
pub fn to_lab(color: Color) -> LabPoint {
    let [r, g, b] = color.rgb();
    let linear: LinSrgb<f64> = Srgb::new(r, g, b).into_format::<f64>().into_linear();
    let lab: Lab<D65, f64> = linear.into_color();
    LabPoint { l: lab.l, a: lab.a, b: lab.b }
}

/// Convert a LAB point back to the nearest displayable sRGB color
///
/// Points outside the sRGB gamut are clamped per channel.
pub fn to_hex(lab: LabPoint) -> Color {
    let lab = Lab::<D65, f64>::new(lab.l, lab.a, lab.b);
    let linear: LinSrgb<f64> = lab.into_color();
    let rgb: Srgb<f64> = Srgb::from_linear(linear);
    let rgb: Srgb<u8> = rgb.into_format();
    Color::from_rgb(rgb.red, rgb.green, rgb.blue)
}

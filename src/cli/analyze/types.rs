use crate::ImageId;
use crate::analyze::Analysis;

/// A wallpaper file loaded from disk
pub struct LoadedImage {
    pub id: ImageId,
    pub path: String,
    pub data: Vec<u8>,
}

pub struct AnalyzedImage {
    pub id: ImageId,
    pub path: String,
    pub analysis: Analysis,
}

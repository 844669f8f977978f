/// A file read from disk
pub struct ImageData {
    pub path: String,
    pub data: Vec<u8>,
}

/// A file with its content hash
pub struct HashedImageData {
    pub path: String,
    pub hash: blake3::Hash,
}

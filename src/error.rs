use thiserror::Error;

use crate::ImageId;

/// Errors raised by the similarity engine
///
/// Every error is local to one image or one query, callers processing a batch
/// are expected to log it and move on to the next item.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid image: {0}")]
    InvalidImage(String),

    #[error("empty pixel buffer")]
    EmptyInput,

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("invalid color: {0:?}")]
    InvalidColor(String),

    #[error("invalid fingerprint: {0:?}")]
    InvalidFingerprint(String),

    #[error("no fingerprint recorded for image {0}")]
    UnknownId(ImageId),

    #[error("failed to decode image: {0}")]
    Decode(#[from] image::ImageError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

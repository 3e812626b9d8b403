//! Image normalization contract.

use figcap_core::{basename, split_extension};

use crate::error::ImageError;

/// Encoded output image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedImage {
    /// Encoded bytes.
    pub bytes: Vec<u8>,
    /// Output file extension without dot.
    pub extension: String,
}

/// Turns a kept graphic into the image written next to its caption.
///
/// Decoding, rasterizing vector formats, resizing and color conversion
/// belong here. A failure affects only the pair being normalized.
pub trait ImageNormalizer: Sync {
    /// Normalize the graphic `name` holding `bytes`.
    fn normalize(&self, name: &str, bytes: Vec<u8>) -> Result<NormalizedImage, ImageError>;
}

/// Keeps graphic bytes as they are, with a lowercased extension.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughImages;

impl ImageNormalizer for PassthroughImages {
    fn normalize(&self, name: &str, bytes: Vec<u8>) -> Result<NormalizedImage, ImageError> {
        if bytes.is_empty() {
            return Err(ImageError::Empty(name.to_owned()));
        }
        let (_, extension) = split_extension(basename(name));
        if extension.is_empty() {
            return Err(ImageError::MissingExtension(name.to_owned()));
        }
        Ok(NormalizedImage {
            bytes,
            extension: extension.to_ascii_lowercase(),
        })
    }
}

//! Transport payload → pixels.
//!
//! Payloads usually come straight from `canvas.toDataURL()`, i.e.
//! `data:image/png;base64,<body>`. Everything up to the first comma is a
//! header and is discarded; a payload without a comma is taken as a bare
//! base64 body.

use base64::{prelude::BASE64_STANDARD, Engine};
use image::DynamicImage;

use crate::error::DecodeError;

/// 8-bit pixel grid, interleaved by channel.
///
/// Channel layouts: 1 = L, 2 = LA, 3 = RGB, 4 = RGBA.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    width: u32,
    height: u32,
    channels: u8,
    pixels: Vec<u8>,
}

impl DecodedImage {
    /// Wraps a raw buffer. No validation happens here; the canonicalizer
    /// rejects inconsistent dimensions.
    pub fn new(width: u32, height: u32, channels: u8, pixels: Vec<u8>) -> Self {
        DecodedImage { width, height, channels, pixels }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channels(&self) -> u8 {
        self.channels
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }
}

impl From<DynamicImage> for DecodedImage {
    /// Keeps the source channel layout; deeper sample formats are reduced to
    /// 8 bits per component.
    fn from(img: DynamicImage) -> Self {
        let (width, height) = (img.width(), img.height());
        let color = img.color();
        let (channels, pixels) = match (color.has_color(), color.has_alpha()) {
            (false, false) => (1, img.into_luma8().into_raw()),
            (false, true) => (2, img.into_luma_alpha8().into_raw()),
            (true, false) => (3, img.into_rgb8().into_raw()),
            (true, true) => (4, img.into_rgba8().into_raw()),
        };
        DecodedImage { width, height, channels, pixels }
    }
}

/// Returns the base64 body of a payload, with any `<header>,` prefix and
/// surrounding whitespace removed.
pub fn strip_header(payload: &str) -> &str {
    let body = match payload.find(',') {
        Some(pos) => &payload[pos + 1..],
        None => payload,
    };
    body.trim()
}

/// Decodes a base64 image payload into pixels.
pub fn decode(payload: &str) -> Result<DecodedImage, DecodeError> {
    let body = strip_header(payload);
    if body.is_empty() {
        return Err(DecodeError::EmptyPayload);
    }
    let bytes = BASE64_STANDARD.decode(body)?;
    decode_bytes(&bytes)
}

/// Decodes an already-binary image container (PNG, JPEG, BMP, GIF).
pub fn decode_bytes(bytes: &[u8]) -> Result<DecodedImage, DecodeError> {
    let img = image::load_from_memory(bytes)?;
    Ok(img.into())
}

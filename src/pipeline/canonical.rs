//! Decoded image → canonical `[1, 28, 28, 1]` tensor.
//!
//! Order of operations: luminance, resample, scale to `[0, 1]`. Luminance
//! uses ITU-R 601-2 weights in 16.16 fixed point, the same integer formula
//! PIL's `convert("L")` applies, and ignores alpha. Resampling uses a fixed
//! filter (bicubic unless configured otherwise). Every step is integer or
//! deterministic float arithmetic, so equal inputs give bit-identical
//! tensors.

use std::str::FromStr;

use image::imageops::{self, FilterType};
use image::{GrayImage, ImageBuffer};

use crate::error::CanonicalizationError;
use crate::pipeline::codec::DecodedImage;

/// Side length of the square classifier input.
pub const CANONICAL_SIDE: u32 = 28;

/// `[batch, height, width, channels]`.
pub const CANONICAL_SHAPE: [usize; 4] = [1, CANONICAL_SIDE as usize, CANONICAL_SIDE as usize, 1];

/// Number of components in a canonical tensor.
pub const CANONICAL_LEN: usize = (CANONICAL_SIDE * CANONICAL_SIDE) as usize;

/// Resampling filter used to reach 28×28.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResizeFilter {
    Nearest,
    Bilinear,
    /// Catmull-Rom cubic, the default for grayscale resizes in common
    /// Python imaging stacks.
    #[default]
    Bicubic,
    Lanczos3,
}

impl ResizeFilter {
    fn filter_type(self) -> FilterType {
        match self {
            ResizeFilter::Nearest => FilterType::Nearest,
            ResizeFilter::Bilinear => FilterType::Triangle,
            ResizeFilter::Bicubic => FilterType::CatmullRom,
            ResizeFilter::Lanczos3 => FilterType::Lanczos3,
        }
    }
}

impl FromStr for ResizeFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "nearest" => Ok(ResizeFilter::Nearest),
            "bilinear" | "triangle" => Ok(ResizeFilter::Bilinear),
            "bicubic" | "catmullrom" => Ok(ResizeFilter::Bicubic),
            "lanczos3" | "lanczos" => Ok(ResizeFilter::Lanczos3),
            other => Err(format!(
                "unknown resize filter '{}'; expected nearest, bilinear, bicubic or lanczos3",
                other
            )),
        }
    }
}

/// Fixed-shape grayscale tensor fed to the classifier.
#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalTensor {
    shape: [usize; 4],
    data: Vec<f64>,
}

impl CanonicalTensor {
    /// Wraps arbitrary data without checking it. Only the canonicalizer
    /// produces conforming tensors; the classifier rejects anything else.
    pub fn from_raw(shape: [usize; 4], data: Vec<f64>) -> Self {
        CanonicalTensor { shape, data }
    }

    pub fn shape(&self) -> [usize; 4] {
        self.shape
    }

    /// Row-major components (`y * 28 + x`).
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    pub fn is_canonical(&self) -> bool {
        self.shape == CANONICAL_SHAPE && self.data.len() == CANONICAL_LEN
    }

    /// Component at row `y`, column `x`.
    pub fn at(&self, y: usize, x: usize) -> f64 {
        self.data[y * self.shape[2] + x]
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Canonicalizer {
    filter: ResizeFilter,
}

impl Canonicalizer {
    pub fn new(filter: ResizeFilter) -> Self {
        Canonicalizer { filter }
    }

    pub fn filter(&self) -> ResizeFilter {
        self.filter
    }

    pub fn canonicalize(&self, image: &DecodedImage) -> Result<CanonicalTensor, CanonicalizationError> {
        let (width, height) = (image.width(), image.height());
        if width == 0 || height == 0 {
            return Err(CanonicalizationError::EmptyImage { width, height });
        }
        let channels = image.channels();
        if !(1..=4).contains(&channels) {
            return Err(CanonicalizationError::UnsupportedChannels(channels));
        }
        let expected = (width as usize)
            .checked_mul(height as usize)
            .and_then(|n| n.checked_mul(channels as usize))
            .ok_or(CanonicalizationError::TooLarge { width, height, channels })?;
        if image.pixels().len() != expected {
            return Err(CanonicalizationError::BufferLength {
                expected,
                actual: image.pixels().len(),
            });
        }

        let gray = luminance(image)?;
        let resized = if (width, height) == (CANONICAL_SIDE, CANONICAL_SIDE) {
            gray
        } else {
            imageops::resize(&gray, CANONICAL_SIDE, CANONICAL_SIDE, self.filter.filter_type())
        };

        let data = resized.into_raw().into_iter().map(|p| p as f64 / 255.0).collect();
        Ok(CanonicalTensor { shape: CANONICAL_SHAPE, data })
    }
}

/// ITU-R 601-2 luma in 16.16 fixed point; the weights sum to 65536.
fn luma(r: u8, g: u8, b: u8) -> u8 {
    ((r as u32 * 19595 + g as u32 * 38470 + b as u32 * 7471 + 0x8000) >> 16) as u8
}

/// Collapses any supported channel layout to one luminance channel.
fn luminance(image: &DecodedImage) -> Result<GrayImage, CanonicalizationError> {
    let px = image.pixels();
    let raw: Vec<u8> = match image.channels() {
        1 => px.to_vec(),
        2 => px.chunks_exact(2).map(|la| la[0]).collect(),
        n => px.chunks_exact(n as usize).map(|c| luma(c[0], c[1], c[2])).collect(),
    };
    let actual = raw.len();
    ImageBuffer::from_raw(image.width(), image.height(), raw).ok_or(CanonicalizationError::BufferLength {
        expected: image.width() as usize * image.height() as usize,
        actual,
    })
}

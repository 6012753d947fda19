//! Parameter types for image operations.
//!
//! These describe *what* to do, not *how*. The [`operations`](super::operations)
//! and [`bridge`](super::bridge) modules decide the numbers; the
//! [`backend`](super::backend) does the pixel work.
//!
//! ## Types
//!
//! - [`Quality`] — JPEG encode quality (0–100, default 75). Clamped on construction.
//! - [`BoundingBoxSize`] — The fixed set of square thumbnail boxes.
//! - [`ResizeFilter`] — Resampling kernel handed to the backend.
//! - [`ResizeParams`] — Target dimensions plus filter for one resample call.

use super::backend::ConvertError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Quality setting for JPEG encoding (0-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(u8);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.min(100) as u8)
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(75)
    }
}

impl From<u32> for Quality {
    fn from(value: u32) -> Self {
        Self::new(value)
    }
}

impl From<Quality> for u32 {
    fn from(q: Quality) -> Self {
        q.0 as u32
    }
}

/// One of the fixed square boxes a thumbnail is fitted into.
///
/// The side length is the only meaningful property; `X256` is a 256×256 box.
/// Anything outside this set is rejected with [`ConvertError::InvalidSize`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum BoundingBoxSize {
    X32,
    X64,
    X128,
    X150,
    X256,
    X800,
}

impl BoundingBoxSize {
    /// Every box, smallest first.
    pub const ALL: [BoundingBoxSize; 6] = [
        BoundingBoxSize::X32,
        BoundingBoxSize::X64,
        BoundingBoxSize::X128,
        BoundingBoxSize::X150,
        BoundingBoxSize::X256,
        BoundingBoxSize::X800,
    ];

    /// Side length of the box in pixels.
    pub fn side(self) -> u32 {
        match self {
            BoundingBoxSize::X32 => 32,
            BoundingBoxSize::X64 => 64,
            BoundingBoxSize::X128 => 128,
            BoundingBoxSize::X150 => 150,
            BoundingBoxSize::X256 => 256,
            BoundingBoxSize::X800 => 800,
        }
    }
}

impl TryFrom<u32> for BoundingBoxSize {
    type Error = ConvertError;

    fn try_from(side: u32) -> Result<Self, Self::Error> {
        BoundingBoxSize::ALL
            .into_iter()
            .find(|b| b.side() == side)
            .ok_or_else(|| ConvertError::InvalidSize(side.to_string()))
    }
}

impl From<BoundingBoxSize> for u32 {
    fn from(b: BoundingBoxSize) -> Self {
        b.side()
    }
}

/// Accepts `"256"` as well as the `"x256"` spelling.
impl FromStr for BoundingBoxSize {
    type Err = ConvertError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let digits = trimmed
            .strip_prefix('x')
            .or_else(|| trimmed.strip_prefix('X'))
            .unwrap_or(trimmed);
        digits
            .parse::<u32>()
            .map_err(|_| ConvertError::InvalidSize(s.to_string()))
            .and_then(BoundingBoxSize::try_from)
    }
}

impl fmt::Display for BoundingBoxSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "x{}", self.side())
    }
}

/// Resampling kernel used when shrinking.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResizeFilter {
    Nearest,
    Triangle,
    CatmullRom,
    Gaussian,
    #[default]
    Lanczos3,
}

/// Parameters for a single resample call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResizeParams {
    pub width: u32,
    pub height: u32,
    pub filter: ResizeFilter,
}

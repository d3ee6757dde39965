//! Compression policy: a three-point level plus the target container map to
//! concrete encoder parameters.
//!
//! | Format | lossless | glossy | lossy |
//! |---|---|---|---|
//! | jpeg | q=100 | q=90 | q=explicit or 80 |
//! | png | level 0 | level 6 | level 9 (quality explicit or 80) |
//! | webp | q=100, lossless | q=90 | q=explicit or 80 |
//! | avif | q=100, lossless | q=70 | q=explicit or 50 |
//! | gif | encoder default | | |

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

use crate::format::ImageFormat;

/// AVIF encoder speed used whenever AVIF parameters are built (0 = slowest).
pub const AVIF_SPEED: u8 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(try_from = "LevelRepr")]
pub enum CompressionLevel {
    Lossless,
    #[default]
    Lossy,
    Glossy,
}

impl CompressionLevel {
    /// Numeric code used by the HTTP API: 0 lossless, 1 lossy, 2 glossy.
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(Self::Lossless),
            1 => Some(Self::Lossy),
            2 => Some(Self::Glossy),
            _ => None,
        }
    }

    pub fn code(self) -> u8 {
        match self {
            Self::Lossless => 0,
            Self::Lossy => 1,
            Self::Glossy => 2,
        }
    }
}

impl fmt::Display for CompressionLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lossless => write!(f, "lossless"),
            Self::Lossy => write!(f, "lossy"),
            Self::Glossy => write!(f, "glossy"),
        }
    }
}

impl FromStr for CompressionLevel {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "lossless" | "0" => Ok(Self::Lossless),
            "lossy" | "1" => Ok(Self::Lossy),
            "glossy" | "2" => Ok(Self::Glossy),
            _ => Err(format!("unknown compression level: {s}")),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum LevelRepr {
    Code(i64),
    Name(String),
}

impl TryFrom<LevelRepr> for CompressionLevel {
    type Error = String;
    fn try_from(repr: LevelRepr) -> Result<Self, Self::Error> {
        match repr {
            LevelRepr::Code(code) => {
                Self::from_code(code).ok_or_else(|| format!("unknown compression code: {code}"))
            }
            LevelRepr::Name(name) => name.parse(),
        }
    }
}

/// Concrete encoder settings for one output container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodeParams {
    /// `optimize_coding` asks for the strongest entropy coding the encoder offers.
    Jpeg { quality: u8, optimize_coding: bool },
    /// `quality` only matters to palette-reducing encoders; deflate effort comes
    /// from `compression_level` (0-9).
    Png {
        compression_level: u8,
        quality: u8,
        adaptive_filtering: bool,
    },
    Webp { quality: u8, lossless: bool },
    Avif { quality: u8, lossless: bool, speed: u8 },
    Gif,
}

impl EncodeParams {
    pub fn format(&self) -> ImageFormat {
        match self {
            EncodeParams::Jpeg { .. } => ImageFormat::Jpeg,
            EncodeParams::Png { .. } => ImageFormat::Png,
            EncodeParams::Webp { .. } => ImageFormat::Webp,
            EncodeParams::Avif { .. } => ImageFormat::Avif,
            EncodeParams::Gif => ImageFormat::Gif,
        }
    }

    /// Parameters from an explicit quality and lossless flag, with per-format
    /// fallbacks when quality is absent.
    pub fn for_format(format: ImageFormat, quality: Option<u8>, lossless: bool) -> Self {
        match format {
            ImageFormat::Jpeg => EncodeParams::Jpeg {
                quality: quality.unwrap_or(80),
                optimize_coding: true,
            },
            ImageFormat::Png => EncodeParams::Png {
                compression_level: 9,
                quality: quality.unwrap_or(80),
                adaptive_filtering: true,
            },
            ImageFormat::Webp => EncodeParams::Webp {
                quality: quality.unwrap_or(80),
                lossless,
            },
            ImageFormat::Avif => EncodeParams::Avif {
                quality: quality.unwrap_or(50),
                lossless,
                speed: AVIF_SPEED,
            },
            ImageFormat::Gif => EncodeParams::Gif,
        }
    }

    /// Defaults applied when nothing else fixed the encoder for `format`.
    pub fn defaults(format: ImageFormat) -> Self {
        Self::for_format(format, None, false)
    }
}

/// Look up the policy table for a supported container.
pub fn policy(level: CompressionLevel, format: ImageFormat, quality: Option<u8>) -> EncodeParams {
    use CompressionLevel::*;

    match format {
        ImageFormat::Jpeg => EncodeParams::Jpeg {
            quality: match level {
                Lossless => 100,
                Glossy => 90,
                Lossy => quality.unwrap_or(80),
            },
            optimize_coding: true,
        },
        ImageFormat::Png => EncodeParams::Png {
            compression_level: match level {
                Lossless => 0,
                Glossy => 6,
                Lossy => 9,
            },
            quality: quality.unwrap_or(80),
            adaptive_filtering: true,
        },
        ImageFormat::Webp => EncodeParams::Webp {
            quality: match level {
                Lossless => 100,
                Glossy => 90,
                Lossy => quality.unwrap_or(80),
            },
            lossless: level == Lossless,
        },
        ImageFormat::Avif => EncodeParams::Avif {
            quality: match level {
                Lossless => 100,
                Glossy => 70,
                Lossy => quality.unwrap_or(50),
            },
            lossless: level == Lossless,
            speed: AVIF_SPEED,
        },
        ImageFormat::Gif => EncodeParams::Gif,
    }
}

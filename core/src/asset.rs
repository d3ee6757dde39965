//! Source image snapshot and the byte-level loader that builds it.
//!
//! Everything here reads headers only: format sniffing, dimensions and color
//! space are known before a single pixel is decoded, so oversized inputs are
//! rejected without paying for a decode.

use std::fmt;
use std::fs;
use std::io::Cursor;
use std::path::Path;

use image::{ColorType, ImageDecoder, ImageError, ImageReader};

use crate::config::EngineConfig;
use crate::error::{EngineError, RetrievalError};
use crate::format::ImageFormat;
use crate::resize::Dimensions;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorSpace {
    Srgb,
    Gray,
    Cmyk,
}

impl fmt::Display for ColorSpace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Srgb => write!(f, "srgb"),
            Self::Gray => write!(f, "b-w"),
            Self::Cmyk => write!(f, "cmyk"),
        }
    }
}

/// Immutable source bytes plus what the header says about them.
#[derive(Debug, Clone)]
pub struct ImageAsset {
    bytes: Vec<u8>,
    format: ImageFormat,
    dimensions: Dimensions,
    color_space: ColorSpace,
}

impl ImageAsset {
    /// Validate and identify an in-memory image.
    pub fn from_bytes(bytes: Vec<u8>, config: &EngineConfig) -> Result<Self, EngineError> {
        if bytes.is_empty() {
            return Err(EngineError::InvalidData("empty input".into()));
        }
        check_byte_size(bytes.len(), config)?;

        let container = image::guess_format(&bytes)
            .map_err(|_| EngineError::UnsupportedFormat("unrecognised image container".into()))?;
        let format = ImageFormat::from_container(container)
            .ok_or_else(|| EngineError::UnsupportedFormat(format!("{container:?}").to_lowercase()))?;

        let (dimensions, color_type) = probe_header(&bytes, container)?;
        check_pixel_count(dimensions, config)?;

        let color_space = match format {
            ImageFormat::Jpeg if jpeg_component_count(&bytes) == Some(4) => ColorSpace::Cmyk,
            _ if is_gray(color_type) => ColorSpace::Gray,
            _ => ColorSpace::Srgb,
        };

        log::debug!(
            "Loaded {} image: {} ({}), {} bytes",
            format,
            dimensions,
            color_space,
            bytes.len()
        );

        Ok(Self {
            bytes,
            format,
            dimensions,
            color_space,
        })
    }

    /// Read an image from disk and validate it.
    pub fn from_file(path: &Path, config: &EngineConfig) -> Result<Self, EngineError> {
        let bytes = fs::read(path).map_err(|source| RetrievalError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_bytes(bytes, config)
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn format(&self) -> ImageFormat {
        self.format
    }

    pub fn dimensions(&self) -> Dimensions {
        self.dimensions
    }

    pub fn width(&self) -> u32 {
        self.dimensions.width
    }

    pub fn height(&self) -> u32 {
        self.dimensions.height
    }

    pub fn color_space(&self) -> ColorSpace {
        self.color_space
    }

    pub fn byte_size(&self) -> usize {
        self.bytes.len()
    }

    pub fn mime_type(&self) -> &'static str {
        self.format.mime_type()
    }

    /// Re-check the ceilings of `config`; an asset built under other limits
    /// must not reach the decoder.
    pub fn check_limits(&self, config: &EngineConfig) -> Result<(), EngineError> {
        check_byte_size(self.bytes.len(), config)?;
        check_pixel_count(self.dimensions, config)
    }
}

fn check_byte_size(len: usize, config: &EngineConfig) -> Result<(), EngineError> {
    if len > config.max_input_bytes {
        return Err(EngineError::Oversize {
            limit_kind: "byte size",
            actual: len as u64,
            limit: config.max_input_bytes as u64,
        });
    }
    Ok(())
}

fn check_pixel_count(dimensions: Dimensions, config: &EngineConfig) -> Result<(), EngineError> {
    if dimensions.pixels() > config.max_input_pixels {
        return Err(EngineError::Oversize {
            limit_kind: "pixel count",
            actual: dimensions.pixels(),
            limit: config.max_input_pixels,
        });
    }
    Ok(())
}

fn probe_header(
    bytes: &[u8],
    container: image::ImageFormat,
) -> Result<(Dimensions, ColorType), EngineError> {
    let decoder = ImageReader::with_format(Cursor::new(bytes), container)
        .into_decoder()
        .map_err(|e| match e {
            ImageError::Unsupported(_) => EngineError::UnsupportedFormat(e.to_string()),
            _ => EngineError::InvalidData(e.to_string()),
        })?;

    let (width, height) = decoder.dimensions();
    if width == 0 || height == 0 {
        return Err(EngineError::InvalidData(format!("zero-sized image {width}x{height}")));
    }
    Ok((Dimensions::new(width, height), decoder.color_type()))
}

fn is_gray(color_type: ColorType) -> bool {
    matches!(
        color_type,
        ColorType::L8 | ColorType::La8 | ColorType::L16 | ColorType::La16
    )
}

/// Number of color components declared by the first JPEG frame header.
fn jpeg_component_count(input: &[u8]) -> Option<u8> {
    if input.len() < 2 || input[0] != 0xFF || input[1] != 0xD8 {
        return None;
    }

    let mut pos = 2;
    while pos + 3 < input.len() {
        if input[pos] != 0xFF {
            pos += 1;
            continue;
        }

        let marker = input[pos + 1];

        // Fill bytes and stuffed zeros
        if marker == 0xFF {
            pos += 1;
            continue;
        }
        if marker == 0x00 || (0xD0..=0xD7).contains(&marker) {
            pos += 2;
            continue;
        }
        if marker == 0xDA || marker == 0xD9 {
            return None;
        }

        let length = u16::from_be_bytes([input[pos + 2], input[pos + 3]]) as usize;

        // SOF0-SOF15, excluding DHT, JPG and DAC
        let is_frame = (0xC0..=0xCF).contains(&marker) && !matches!(marker, 0xC4 | 0xC8 | 0xCC);
        if is_frame {
            // precision(1) height(2) width(2) components(1)
            return input.get(pos + 4 + 5).copied();
        }

        pos += 2 + length;
    }

    None
}

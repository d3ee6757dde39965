//! The codec capability: decode, pixel transforms and encode.
//!
//! The engine only talks to the [`Codec`] trait. [`ImageCodec`] is the
//! production implementation built on `image`, `imageproc`, `webp` and
//! `oxipng`; its tuning knobs are fixed at construction in [`CodecOptions`].

use std::io::Cursor;

use image::codecs::avif::AvifEncoder;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType as PngFilter, PngEncoder};
use image::imageops::{self, FilterType};
use image::{DynamicImage, GenericImageView, ImageEncoder, Rgba, RgbaImage};
use imageproc::geometric_transformations::{rotate_about_center, Interpolation};
use serde::Deserialize;

use crate::compression::EncodeParams;
use crate::error::CodecError;
use crate::format::ImageFormat;
use crate::resize::{CropAnchor, Dimensions, Fit, ResizeDirective};
use crate::smart_crop;

/// Fill color for the corners uncovered by a rotation. `alpha` is 0.0-1.0.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Background {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    #[serde(default = "opaque")]
    pub alpha: f32,
}

fn opaque() -> f32 {
    1.0
}

impl Default for Background {
    /// Fully transparent white.
    fn default() -> Self {
        Self {
            r: 255,
            g: 255,
            b: 255,
            alpha: 0.0,
        }
    }
}

impl Background {
    pub fn to_rgba(self) -> Rgba<u8> {
        let alpha = (self.alpha.clamp(0.0, 1.0) * 255.0).round() as u8;
        Rgba([self.r, self.g, self.b, alpha])
    }
}

/// One pixel operation queued on the pipeline handle.
#[derive(Debug, Clone, PartialEq)]
pub enum ImageOp {
    /// Normalize a CMYK-decoded source to 8-bit sRGB.
    ToSrgb,
    Resize(ResizeDirective),
    /// Clockwise rotation in degrees.
    Rotate { degrees: f64, background: Background },
    Flip { horizontal: bool, vertical: bool },
}

impl ImageOp {
    pub fn name(&self) -> &'static str {
        match self {
            ImageOp::ToSrgb => "srgb",
            ImageOp::Resize(_) => "resize",
            ImageOp::Rotate { .. } => "rotate",
            ImageOp::Flip { .. } => "flip",
        }
    }
}

pub trait Codec: Send + Sync {
    fn decode(&self, data: &[u8], format: ImageFormat) -> Result<DynamicImage, CodecError>;

    fn apply(&self, image: DynamicImage, op: &ImageOp) -> Result<DynamicImage, CodecError>;

    fn encode(&self, image: &DynamicImage, params: &EncodeParams) -> Result<Vec<u8>, CodecError>;
}

#[derive(Debug, Clone, Copy)]
pub struct CodecOptions {
    pub resize_filter: FilterType,
    /// oxipng preset (0-6) run after maximum-effort PNG encodes; `None` skips it.
    pub png_optimizer_preset: Option<u8>,
}

impl Default for CodecOptions {
    fn default() -> Self {
        Self {
            resize_filter: FilterType::Lanczos3,
            png_optimizer_preset: Some(2),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ImageCodec {
    options: CodecOptions,
}

impl ImageCodec {
    pub fn new(options: CodecOptions) -> Self {
        Self { options }
    }

    fn resize(&self, image: DynamicImage, directive: &ResizeDirective) -> DynamicImage {
        let (width, height) = image.dimensions();
        let source = Dimensions::new(width, height);
        let filter = self.options.resize_filter;

        match directive.fit {
            Fit::Inside { .. } => {
                let target = directive.output_dimensions(source);
                if target == source {
                    return image;
                }
                image.resize_exact(target.width, target.height, filter)
            }
            Fit::Cover {
                anchor: CropAnchor::Center,
            } => image.resize_to_fill(directive.width, directive.height, filter),
            Fit::Cover {
                anchor: CropAnchor::Attention,
            } => {
                let scaled = directive.cover_scale_dimensions(source);
                let scaled_image = if scaled == source {
                    image
                } else {
                    image.resize_exact(scaled.width, scaled.height, filter)
                };
                let (x, y) = smart_crop::attention_offset(&scaled_image, directive.width, directive.height);
                scaled_image.crop_imm(x, y, directive.width, directive.height)
            }
        }
    }

    fn encode_png(
        &self,
        image: &DynamicImage,
        compression_level: u8,
        adaptive_filtering: bool,
    ) -> Result<Vec<u8>, CodecError> {
        let compression = match compression_level {
            0..=3 => CompressionType::Fast,
            4..=7 => CompressionType::Default,
            _ => CompressionType::Best,
        };
        let filter = if adaptive_filtering {
            PngFilter::Adaptive
        } else {
            PngFilter::Sub
        };

        let mut output = Vec::new();
        let encoder = PngEncoder::new_with_quality(&mut output, compression, filter);
        image
            .write_with_encoder(encoder)
            .map_err(|e| CodecError::Encode(format!("Failed to encode PNG: {e}")))?;

        match self.options.png_optimizer_preset {
            Some(preset) if compression_level >= 9 => optimize_png(&output, preset),
            _ => Ok(output),
        }
    }
}

impl Codec for ImageCodec {
    fn decode(&self, data: &[u8], format: ImageFormat) -> Result<DynamicImage, CodecError> {
        image::load_from_memory_with_format(data, format.to_container())
            .map_err(|e| CodecError::Decode(e.to_string()))
    }

    fn apply(&self, image: DynamicImage, op: &ImageOp) -> Result<DynamicImage, CodecError> {
        let out = match op {
            ImageOp::ToSrgb => DynamicImage::ImageRgb8(image.to_rgb8()),
            ImageOp::Resize(directive) => self.resize(image, directive),
            ImageOp::Rotate {
                degrees,
                background,
            } => rotate(image, *degrees, background.to_rgba())?,
            ImageOp::Flip {
                horizontal,
                vertical,
            } => {
                let mut image = image;
                if *horizontal {
                    image = image.fliph();
                }
                if *vertical {
                    image = image.flipv();
                }
                image
            }
        };
        Ok(out)
    }

    fn encode(&self, image: &DynamicImage, params: &EncodeParams) -> Result<Vec<u8>, CodecError> {
        let (width, height) = image.dimensions();
        log::debug!("Encoding {}x{} image as {:?}", width, height, params);

        let output = match *params {
            EncodeParams::Jpeg { quality, .. } => {
                let rgb = image.to_rgb8();
                let mut output = Vec::new();
                let mut encoder = JpegEncoder::new_with_quality(&mut output, quality.clamp(1, 100));
                encoder
                    .encode(rgb.as_raw(), width, height, image::ExtendedColorType::Rgb8)
                    .map_err(|e| CodecError::Encode(format!("Failed to encode JPEG: {e}")))?;
                output
            }
            EncodeParams::Png {
                compression_level,
                adaptive_filtering,
                ..
            } => self.encode_png(image, compression_level, adaptive_filtering)?,
            EncodeParams::Webp { quality, lossless } => {
                let rgba = image.to_rgba8();
                let encoder = webp::Encoder::from_rgba(rgba.as_raw(), width, height);
                let encoded = if lossless {
                    encoder.encode_lossless()
                } else {
                    encoder.encode(quality.clamp(1, 100) as f32)
                };
                encoded.to_vec()
            }
            EncodeParams::Avif {
                quality,
                lossless,
                speed,
            } => {
                if lossless {
                    log::debug!("AVIF encoder has no lossless mode, using quality {quality}");
                }
                let rgba = image.to_rgba8();
                let mut output = Vec::new();
                AvifEncoder::new_with_speed_quality(&mut output, speed.clamp(1, 10), quality.clamp(1, 100))
                    .write_image(rgba.as_raw(), width, height, image::ExtendedColorType::Rgba8)
                    .map_err(|e| CodecError::Encode(format!("Failed to encode AVIF: {e}")))?;
                output
            }
            EncodeParams::Gif => {
                let mut output = Vec::new();
                DynamicImage::ImageRgba8(image.to_rgba8())
                    .write_to(&mut Cursor::new(&mut output), image::ImageFormat::Gif)
                    .map_err(|e| CodecError::Encode(format!("Failed to encode GIF: {e}")))?;
                output
            }
        };

        log::debug!("Encoding complete: {} bytes ({})", output.len(), params.format());
        Ok(output)
    }
}

/// Lossless DEFLATE re-compression via oxipng.
fn optimize_png(png_data: &[u8], preset: u8) -> Result<Vec<u8>, CodecError> {
    let mut opts = oxipng::Options::from_preset(preset.min(6));
    opts.strip = oxipng::StripChunks::Safe;

    oxipng::optimize_from_memory(png_data, &opts).map_err(|e| CodecError::Optimize(e.to_string()))
}

/// Rotate clockwise. Right angles are exact; other angles expand the canvas
/// to the rotated bounding box and fill the corners with `background`.
fn rotate(image: DynamicImage, degrees: f64, background: Rgba<u8>) -> Result<DynamicImage, CodecError> {
    if !degrees.is_finite() {
        return Err(CodecError::Transform(format!("invalid rotation angle {degrees}")));
    }

    let normalized = degrees.rem_euclid(360.0);
    let quarter = (normalized / 90.0).round();
    if (normalized - quarter * 90.0).abs() < 1e-9 {
        return Ok(match quarter as u32 % 4 {
            1 => image.rotate90(),
            2 => image.rotate180(),
            3 => image.rotate270(),
            _ => image,
        });
    }

    let rgba = image.to_rgba8();
    let (width, height) = rgba.dimensions();
    let (sin, cos) = normalized.to_radians().sin_cos();
    let out_width = ((width as f64 * cos.abs() + height as f64 * sin.abs()).round() as u32).max(1);
    let out_height = ((width as f64 * sin.abs() + height as f64 * cos.abs()).round() as u32).max(1);

    let side_width = out_width.max(width);
    let side_height = out_height.max(height);
    let mut canvas = RgbaImage::from_pixel(side_width, side_height, background);
    imageops::overlay(
        &mut canvas,
        &rgba,
        ((side_width - width) / 2) as i64,
        ((side_height - height) / 2) as i64,
    );

    let rotated = rotate_about_center(
        &canvas,
        normalized.to_radians() as f32,
        Interpolation::Bilinear,
        background,
    );
    let cropped = imageops::crop_imm(
        &rotated,
        (side_width - out_width) / 2,
        (side_height - out_height) / 2,
        out_width,
        out_height,
    )
    .to_image();

    Ok(DynamicImage::ImageRgba8(cropped))
}

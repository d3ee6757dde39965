//! Flat processing options for the single-shot path.

use serde::Deserialize;

use crate::compression::CompressionLevel;
use crate::config::EngineConfig;
use crate::error::ValidationError;
use crate::format::{override_token, ImageFormat, SUPPORTED_FORMAT_KEYS};
use crate::resize::{Dimensions, ResizeMode};

/// Options exactly as a caller sent them. Numeric fields stay textual so
/// that malformed input can be reported instead of silently dropped.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawOptions {
    /// Code (`0`, `1`, `2`) or name.
    pub compression: Option<String>,
    /// Code (`0`, `1`, `3`, `4`) or name.
    pub resize: Option<String>,
    pub resize_width: Option<String>,
    pub resize_height: Option<String>,
    /// Bounding width; expands into a `contain` resize.
    pub max_width: Option<String>,
    pub convert_cmyk_to_rgb: Option<bool>,
    pub keep_exif: Option<bool>,
    pub target_format: Option<String>,
    pub quality: Option<String>,
}

impl RawOptions {
    /// Report every malformed field at once.
    pub fn check(&self) -> Result<(), ValidationError> {
        let mut fields = Vec::new();
        let mut messages = Vec::new();
        let mut fail = |field: &str, message: String| {
            fields.push(field.to_string());
            messages.push(message);
        };

        if let Some(raw) = &self.compression {
            if raw.parse::<CompressionLevel>().is_err() {
                fail("compression", "Compression must be 0, 1, or 2".into());
            }
        }

        if let Some(raw) = &self.resize {
            match raw.parse::<ResizeMode>() {
                Err(_) => fail("resize", "Resize must be one of: 0, 1, 3, 4".into()),
                Ok(ResizeMode::None) => {}
                Ok(_) => {
                    if self.resize_width.is_none() && self.resize_height.is_none() {
                        fail(
                            "resize",
                            "Either resize_width or resize_height must be specified for resize operations".into(),
                        );
                    }
                }
            }
        }

        if let Some(raw) = &self.resize_width {
            if positive(raw).is_none() {
                fail("resize_width", "resize_width must be a positive integer".into());
            }
        }
        if let Some(raw) = &self.resize_height {
            if positive(raw).is_none() {
                fail("resize_height", "resize_height must be a positive integer".into());
            }
        }
        if let Some(raw) = &self.max_width {
            if positive(raw).is_none() {
                fail("max_width", "max_width must be a positive integer".into());
            }
        }

        if let Some(raw) = &self.target_format {
            if ImageFormat::from_key(&override_token(raw)).is_none() {
                fail(
                    "convertto",
                    format!("Format must be one of: {}", SUPPORTED_FORMAT_KEYS.join(", ")),
                );
            }
        }

        if let Some(raw) = &self.quality {
            if quality(raw).is_none() {
                fail("quality", "Quality must be between 1 and 100".into());
            }
        }

        if fields.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::for_fields(fields, messages))
        }
    }
}

/// Fully populated options handed to the single-shot path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessingOptions {
    pub compression: CompressionLevel,
    pub resize_mode: ResizeMode,
    pub resize_width: Option<u32>,
    pub resize_height: Option<u32>,
    pub convert_cmyk_to_rgb: bool,
    pub keep_exif: bool,
    /// Raw override; resolved against the source format later.
    pub target_format: Option<String>,
    /// `None` leaves the per-format fallback of the policy table in charge.
    pub quality: Option<u8>,
}

impl ProcessingOptions {
    pub fn defaults(config: &EngineConfig) -> Self {
        Self {
            compression: config.default_compression,
            resize_mode: ResizeMode::None,
            resize_width: None,
            resize_height: None,
            convert_cmyk_to_rgb: true,
            keep_exif: false,
            target_format: None,
            quality: None,
        }
    }
}

/// Merge caller options over the defaults. Malformed fields fall back to the
/// default instead of failing; run [`RawOptions::check`] first to reject them.
pub fn normalize(raw: &RawOptions, source: Dimensions, config: &EngineConfig) -> ProcessingOptions {
    let mut options = ProcessingOptions::defaults(config);

    if let Some(level) = raw.compression.as_deref().and_then(|s| s.parse().ok()) {
        options.compression = level;
    }
    if let Some(mode) = raw.resize.as_deref().and_then(|s| s.parse().ok()) {
        options.resize_mode = mode;
    }
    options.resize_width = raw.resize_width.as_deref().and_then(positive);
    options.resize_height = raw.resize_height.as_deref().and_then(positive);

    if let Some(cmyk) = raw.convert_cmyk_to_rgb {
        options.convert_cmyk_to_rgb = cmyk;
    }
    if let Some(keep) = raw.keep_exif {
        options.keep_exif = keep;
    }
    options.target_format = raw.target_format.clone().filter(|f| !f.is_empty());
    options.quality = raw.quality.as_deref().and_then(quality);

    let max_width = raw.max_width.as_deref().and_then(positive);
    if let (Some(max_width), None) = (max_width, options.resize_width) {
        if source.width > 0 {
            options.resize_mode = ResizeMode::Contain;
            options.resize_width = Some(max_width);
            let height = (source.height as f64 * max_width as f64 / source.width as f64).round();
            options.resize_height = Some((height as u32).max(1));
        }
    }

    options
}

fn positive(raw: &str) -> Option<u32> {
    raw.trim().parse::<u32>().ok().filter(|v| *v > 0)
}

fn quality(raw: &str) -> Option<u8> {
    raw.trim().parse::<u8>().ok().filter(|q| (1..=100).contains(q))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw() -> RawOptions {
        RawOptions::default()
    }

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        let options = normalize(&raw(), Dimensions::new(100, 100), &config);
        assert_eq!(options, ProcessingOptions::defaults(&config));
        assert!(options.convert_cmyk_to_rgb);
        assert!(!options.keep_exif);
        assert_eq!(options.compression, CompressionLevel::Lossy);
    }

    #[test]
    fn test_max_width_expands_to_contain() {
        let options = normalize(
            &RawOptions {
                max_width: Some("1000".into()),
                ..raw()
            },
            Dimensions::new(2000, 1000),
            &EngineConfig::default(),
        );
        assert_eq!(options.resize_mode, ResizeMode::Contain);
        assert_eq!(options.resize_width, Some(1000));
        assert_eq!(options.resize_height, Some(500));
    }

    #[test]
    fn test_explicit_width_wins_over_max_width() {
        let options = normalize(
            &RawOptions {
                resize: Some("3".into()),
                resize_width: Some("300".into()),
                max_width: Some("1000".into()),
                ..raw()
            },
            Dimensions::new(2000, 1000),
            &EngineConfig::default(),
        );
        assert_eq!(options.resize_mode, ResizeMode::Cover);
        assert_eq!(options.resize_width, Some(300));
        assert_eq!(options.resize_height, None);
    }

    #[test]
    fn test_codes_and_names() {
        let options = normalize(
            &RawOptions {
                compression: Some("2".into()),
                resize: Some("smartCrop".into()),
                quality: Some("65".into()),
                ..raw()
            },
            Dimensions::new(10, 10),
            &EngineConfig::default(),
        );
        assert_eq!(options.compression, CompressionLevel::Glossy);
        assert_eq!(options.resize_mode, ResizeMode::SmartCrop);
        assert_eq!(options.quality, Some(65));
    }

    #[test]
    fn test_check_collects_every_field() {
        let err = RawOptions {
            compression: Some("7".into()),
            resize: Some("1".into()),
            target_format: Some("+tiff".into()),
            quality: Some("0".into()),
            ..raw()
        }
        .check()
        .unwrap_err();

        assert_eq!(err.fields, vec!["compression", "resize", "convertto", "quality"]);
        assert!(err.message.contains("Compression must be 0, 1, or 2"));
        assert!(err.message.contains("Quality must be between 1 and 100"));
    }

    #[test]
    fn test_check_accepts_marker_format() {
        let options = RawOptions {
            target_format: Some("+webp".into()),
            resize: Some("0".into()),
            ..raw()
        };
        assert!(options.check().is_ok());
    }

    #[test]
    fn test_check_rejects_non_positive_dimensions() {
        let err = RawOptions {
            resize_width: Some("-5".into()),
            resize_height: Some("abc".into()),
            ..raw()
        }
        .check()
        .unwrap_err();
        assert_eq!(err.fields, vec!["resize_width", "resize_height"]);
    }
}

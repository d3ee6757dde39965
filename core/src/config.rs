use std::env;
use std::str::FromStr;

use thiserror::Error;

use crate::compression::CompressionLevel;
use crate::format::ImageFormat;

/// Processed outputs below this size may be returned inline as a data URI.
pub const INLINE_THRESHOLD: usize = 1024 * 1024;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },
}

/// Read-only engine parameters, built once at startup and shared by reference.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub default_compression: CompressionLevel,
    /// Bounding width used when a caller asks for "optimize" without dimensions.
    pub default_max_width: u32,
    /// Quality 1-100 used by pipeline steps that omit one.
    pub default_quality: u8,
    pub default_format: ImageFormat,
    /// Largest accepted input, in bytes.
    pub max_input_bytes: usize,
    /// Largest accepted decoded size, in pixels.
    pub max_input_pixels: u64,
    pub inline_threshold: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_compression: CompressionLevel::Lossy,
            default_max_width: 1200,
            default_quality: 80,
            default_format: ImageFormat::Webp,
            max_input_bytes: 10 * 1024 * 1024,
            max_input_pixels: 50_000_000,
            inline_threshold: INLINE_THRESHOLD,
        }
    }
}

impl EngineConfig {
    /// Defaults overridden by `DEFAULT_COMPRESSION`, `DEFAULT_MAX_WIDTH`,
    /// `DEFAULT_QUALITY`, `DEFAULT_FORMAT`, `MAX_FILE_SIZE` and `MAX_INPUT_PIXELS`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let default_compression = match lookup("DEFAULT_COMPRESSION") {
            Some(value) => value.parse::<CompressionLevel>().map_err(|_| ConfigError::Invalid {
                name: "DEFAULT_COMPRESSION",
                value,
            })?,
            None => defaults.default_compression,
        };

        let default_format = match lookup("DEFAULT_FORMAT") {
            Some(value) => ImageFormat::from_key(&value).ok_or(ConfigError::Invalid {
                name: "DEFAULT_FORMAT",
                value,
            })?,
            None => defaults.default_format,
        };

        let default_quality = parse_or("DEFAULT_QUALITY", &lookup, defaults.default_quality)?;
        if !(1..=100).contains(&default_quality) {
            return Err(ConfigError::Invalid {
                name: "DEFAULT_QUALITY",
                value: default_quality.to_string(),
            });
        }

        Ok(Self {
            default_compression,
            default_max_width: parse_or("DEFAULT_MAX_WIDTH", &lookup, defaults.default_max_width)?,
            default_quality,
            default_format,
            max_input_bytes: parse_or("MAX_FILE_SIZE", &lookup, defaults.max_input_bytes)?,
            max_input_pixels: parse_or("MAX_INPUT_PIXELS", &lookup, defaults.max_input_pixels)?,
            inline_threshold: defaults.inline_threshold,
        })
    }
}

fn parse_or<T, F>(name: &'static str, lookup: &F, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| map.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = EngineConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config.default_compression, CompressionLevel::Lossy);
        assert_eq!(config.default_max_width, 1200);
        assert_eq!(config.default_quality, 80);
        assert_eq!(config.default_format, ImageFormat::Webp);
        assert_eq!(config.max_input_bytes, 10 * 1024 * 1024);
        assert_eq!(config.max_input_pixels, 50_000_000);
    }

    #[test]
    fn test_overrides() {
        let config = EngineConfig::from_lookup(lookup_from(&[
            ("DEFAULT_COMPRESSION", "2"),
            ("DEFAULT_FORMAT", "avif"),
            ("DEFAULT_QUALITY", "65"),
            ("DEFAULT_MAX_WIDTH", "800"),
        ]))
        .unwrap();
        assert_eq!(config.default_compression, CompressionLevel::Glossy);
        assert_eq!(config.default_format, ImageFormat::Avif);
        assert_eq!(config.default_quality, 65);
        assert_eq!(config.default_max_width, 800);
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        assert!(EngineConfig::from_lookup(lookup_from(&[("DEFAULT_FORMAT", "bmp")])).is_err());
        assert!(EngineConfig::from_lookup(lookup_from(&[("DEFAULT_QUALITY", "0")])).is_err());
        assert!(EngineConfig::from_lookup(lookup_from(&[("MAX_FILE_SIZE", "ten")])).is_err());
    }
}

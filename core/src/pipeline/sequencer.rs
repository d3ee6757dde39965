//! Pure reducer from pipeline steps to a transform state. No pixels are
//! touched here; the engine replays `ops` through the codec afterwards.

use crate::codec::{Background, ImageOp};
use crate::compression::{policy, EncodeParams};
use crate::config::EngineConfig;
use crate::format::ImageFormat;
use crate::resize::{select, Dimensions};

use super::step::PipelineStep;

#[derive(Debug, Clone, PartialEq)]
pub struct PipelineState {
    /// Pixel operations queued so far, in step order.
    pub ops: Vec<ImageOp>,
    pub format: ImageFormat,
    /// Expected geometry; only a resize step refreshes it.
    pub dimensions: Dimensions,
    pub encode: Option<EncodeParams>,
    pub keep_exif: bool,
}

impl PipelineState {
    pub fn new(format: ImageFormat, dimensions: Dimensions) -> Self {
        Self {
            ops: Vec::new(),
            format,
            dimensions,
            encode: None,
            keep_exif: false,
        }
    }
}

pub fn reduce(mut state: PipelineState, step: &PipelineStep, config: &EngineConfig) -> PipelineState {
    match step {
        PipelineStep::Resize { width, height, fit } => {
            if let Some(directive) = select(*fit, *width, *height, state.dimensions) {
                state.dimensions = directive.output_dimensions(state.dimensions);
                state.ops.push(ImageOp::Resize(directive));
            }
        }
        PipelineStep::Convert {
            format,
            quality,
            lossless,
        } => match ImageFormat::from_key(format) {
            Some(target) => {
                let quality = step_quality(*quality, config);
                state.format = target;
                state.encode = Some(EncodeParams::for_format(target, Some(quality), *lossless));
            }
            None => log::warn!("Skipping convert to unsupported format '{format}'"),
        },
        PipelineStep::Compress { level, quality } => {
            let level = level.unwrap_or(config.default_compression);
            let quality = step_quality(*quality, config);
            state.encode = Some(policy(level, state.format, Some(quality)));
        }
        PipelineStep::Rotate { angle, background } => {
            state.ops.push(ImageOp::Rotate {
                degrees: *angle,
                background: background.unwrap_or_default(),
            });
        }
        PipelineStep::Flip {
            horizontal,
            vertical,
        } => {
            if *horizontal || *vertical {
                state.ops.push(ImageOp::Flip {
                    horizontal: *horizontal,
                    vertical: *vertical,
                });
            }
        }
        PipelineStep::Metadata { keep_exif } => state.keep_exif = *keep_exif,
        PipelineStep::Unknown => log::warn!("Skipping unknown pipeline step"),
    }
    state
}

pub fn sequence(initial: PipelineState, steps: &[PipelineStep], config: &EngineConfig) -> PipelineState {
    steps.iter().fold(initial, |state, step| reduce(state, step, config))
}

/// `0` counts as unset, like a missing value.
fn step_quality(quality: Option<u8>, config: &EngineConfig) -> u8 {
    quality
        .filter(|q| *q != 0)
        .unwrap_or(config.default_quality)
        .clamp(1, 100)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compression::CompressionLevel;
    use crate::resize::{Fit, ResizeMode};

    fn start() -> PipelineState {
        PipelineState::new(ImageFormat::Jpeg, Dimensions::new(1600, 900))
    }

    #[test]
    fn test_resize_refreshes_dimensions() {
        let config = EngineConfig::default();
        let step = PipelineStep::Resize {
            width: Some(800),
            height: None,
            fit: ResizeMode::Contain,
        };
        let state = reduce(start(), &step, &config);
        assert_eq!(state.dimensions, Dimensions::new(800, 450));
        assert!(matches!(
            state.ops[0],
            ImageOp::Resize(d) if d.width == 800 && d.height == 900 && matches!(d.fit, Fit::Inside { .. })
        ));
    }

    #[test]
    fn test_convert_uses_step_quality_not_policy() {
        let config = EngineConfig::default();
        let state = reduce(
            start(),
            &PipelineStep::Convert {
                format: "avif".into(),
                quality: None,
                lossless: false,
            },
            &config,
        );
        assert_eq!(state.format, ImageFormat::Avif);
        assert_eq!(state.encode, Some(EncodeParams::for_format(ImageFormat::Avif, Some(80), false)));
    }

    #[test]
    fn test_zero_quality_means_default() {
        let config = EngineConfig::default();
        let state = reduce(
            start(),
            &PipelineStep::Convert {
                format: "webp".into(),
                quality: Some(0),
                lossless: false,
            },
            &config,
        );
        assert_eq!(state.encode, Some(EncodeParams::Webp { quality: 80, lossless: false }));

        let state = reduce(
            start(),
            &PipelineStep::Compress {
                level: Some(CompressionLevel::Lossy),
                quality: Some(0),
            },
            &config,
        );
        assert_eq!(state.encode, Some(EncodeParams::Jpeg { quality: 80, optimize_coding: true }));
    }

    #[test]
    fn test_compress_targets_current_format() {
        let config = EngineConfig::default();
        let steps = [
            PipelineStep::Convert {
                format: "webp".into(),
                quality: Some(60),
                lossless: false,
            },
            PipelineStep::Compress {
                level: Some(CompressionLevel::Lossless),
                quality: None,
            },
        ];
        let state = sequence(start(), &steps, &config);
        assert_eq!(state.encode, Some(EncodeParams::Webp { quality: 100, lossless: true }));
    }

    #[test]
    fn test_rotate_default_background_and_metadata() {
        let config = EngineConfig::default();
        let steps = [
            PipelineStep::Rotate {
                angle: 30.0,
                background: None,
            },
            PipelineStep::Metadata { keep_exif: true },
        ];
        let state = sequence(start(), &steps, &config);
        assert_eq!(
            state.ops,
            vec![ImageOp::Rotate {
                degrees: 30.0,
                background: Background::default()
            }]
        );
        assert!(state.keep_exif);
        // Rotation leaves the tracked geometry alone
        assert_eq!(state.dimensions, Dimensions::new(1600, 900));
    }

    #[test]
    fn test_unknown_steps_are_skipped() {
        let config = EngineConfig::default();
        let steps = [
            PipelineStep::Resize {
                width: Some(300),
                height: None,
                fit: ResizeMode::Contain,
            },
            PipelineStep::Convert {
                format: "png".into(),
                quality: None,
                lossless: false,
            },
            PipelineStep::Unknown,
            PipelineStep::Rotate {
                angle: 90.0,
                background: None,
            },
        ];
        let state = sequence(start(), &steps, &config);
        let names: Vec<_> = state.ops.iter().map(ImageOp::name).collect();
        assert_eq!(names, vec!["resize", "rotate"]);
        assert_eq!(state.format, ImageFormat::Png);
    }
}

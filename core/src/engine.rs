//! Wires option normalization, pipeline sequencing and the codec together.

use image::DynamicImage;
use serde_json::Value;

use crate::asset::{ColorSpace, ImageAsset};
use crate::codec::{Codec, ImageCodec, ImageOp};
use crate::compression::policy;
use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::finalize::{finalize, Finalized};
use crate::format::resolve_output_format;
use crate::metadata::apply_exif_policy;
use crate::naming::random_filename;
use crate::options::{normalize, ProcessingOptions, RawOptions};
use crate::pipeline::{parse_steps, sequence, PipelineState, PipelineStep};
use crate::resize::select;
use crate::result::ProcessingResult;

/// Holds read-only configuration and a stateless codec; one value serves
/// any number of concurrent runs.
pub struct Engine<C: Codec = ImageCodec> {
    config: EngineConfig,
    codec: C,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        Self::with_codec(config, ImageCodec::default())
    }
}

impl<C: Codec> Engine<C> {
    pub fn with_codec(config: EngineConfig, codec: C) -> Self {
        Self { config, codec }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Single-shot path over caller options.
    pub fn process_image(&self, asset: &ImageAsset, raw: &RawOptions) -> Result<ProcessingResult, EngineError> {
        let options = normalize(raw, asset.dimensions(), &self.config);
        self.process_with_options(asset, &options)
    }

    pub fn process_with_options(
        &self,
        asset: &ImageAsset,
        options: &ProcessingOptions,
    ) -> Result<ProcessingResult, EngineError> {
        asset.check_limits(&self.config)?;

        let mut ops = Vec::new();
        if asset.color_space() == ColorSpace::Cmyk {
            if options.convert_cmyk_to_rgb {
                ops.push(ImageOp::ToSrgb);
            } else {
                log::warn!("Keeping CMYK source as decoded, output may not match the original colors");
            }
        }
        if let Some(directive) = select(
            options.resize_mode,
            options.resize_width,
            options.resize_height,
            asset.dimensions(),
        ) {
            ops.push(ImageOp::Resize(directive));
        }

        let format = resolve_output_format(options.target_format.as_deref(), asset.format());
        let params = policy(options.compression, format, options.quality);

        let image = self.run_ops(asset, &ops)?;
        let finalized = finalize(&self.codec, &image, format, Some(params))?;
        self.build_result(asset, finalized, options.keep_exif)
    }

    /// Validate raw step JSON, then run it.
    pub fn execute(&self, asset: &ImageAsset, steps: &Value) -> Result<ProcessingResult, EngineError> {
        let steps = parse_steps(steps)?;
        self.process_pipeline(asset, &steps)
    }

    /// Ordered pipeline path over already parsed steps.
    pub fn process_pipeline(
        &self,
        asset: &ImageAsset,
        steps: &[PipelineStep],
    ) -> Result<ProcessingResult, EngineError> {
        asset.check_limits(&self.config)?;

        let initial = PipelineState::new(asset.format(), asset.dimensions());
        let state = sequence(initial, steps, &self.config);
        log::debug!(
            "Pipeline of {} steps reduced to {} ops, output {}",
            steps.len(),
            state.ops.len(),
            state.format
        );

        let image = self.run_ops(asset, &state.ops)?;
        let finalized = finalize(&self.codec, &image, state.format, state.encode)?;
        self.build_result(asset, finalized, state.keep_exif)
    }

    fn run_ops(&self, asset: &ImageAsset, ops: &[ImageOp]) -> Result<DynamicImage, EngineError> {
        let mut image = self.codec.decode(asset.bytes(), asset.format())?;
        for op in ops {
            log::debug!("Applying {}", op.name());
            image = self.codec.apply(image, op)?;
        }
        Ok(image)
    }

    fn build_result(
        &self,
        asset: &ImageAsset,
        finalized: Finalized,
        keep_exif: bool,
    ) -> Result<ProcessingResult, EngineError> {
        let bytes = apply_exif_policy(asset.bytes(), finalized.bytes, keep_exif)?;

        log::debug!(
            "Processed {} -> {} ({} -> {} bytes)",
            asset.format(),
            finalized.format,
            asset.byte_size(),
            bytes.len()
        );

        Ok(ProcessingResult {
            original_size: asset.byte_size(),
            processed_size: bytes.len(),
            width: finalized.width,
            height: finalized.height,
            format: finalized.format,
            suggested_filename: random_filename(finalized.format),
            encoded_bytes: bytes,
        })
    }
}

use serde::Deserialize;

use crate::codec::Background;
use crate::compression::CompressionLevel;
use crate::resize::ResizeMode;

/// One named operation of a pipeline request.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum PipelineStep {
    Resize {
        width: Option<u32>,
        height: Option<u32>,
        #[serde(default = "default_fit")]
        fit: ResizeMode,
    },
    Convert {
        format: String,
        quality: Option<u8>,
        #[serde(default)]
        lossless: bool,
    },
    Compress {
        level: Option<CompressionLevel>,
        quality: Option<u8>,
    },
    Rotate {
        angle: f64,
        background: Option<Background>,
    },
    Flip {
        #[serde(default)]
        horizontal: bool,
        #[serde(default)]
        vertical: bool,
    },
    Metadata {
        #[serde(default, rename = "keepExif")]
        keep_exif: bool,
    },
    /// Any tag this build does not know; skipped at run time.
    #[serde(other)]
    Unknown,
}

fn default_fit() -> ResizeMode {
    ResizeMode::Contain
}

impl PipelineStep {
    pub fn kind(&self) -> &'static str {
        match self {
            PipelineStep::Resize { .. } => "resize",
            PipelineStep::Convert { .. } => "convert",
            PipelineStep::Compress { .. } => "compress",
            PipelineStep::Rotate { .. } => "rotate",
            PipelineStep::Flip { .. } => "flip",
            PipelineStep::Metadata { .. } => "metadata",
            PipelineStep::Unknown => "unknown",
        }
    }
}

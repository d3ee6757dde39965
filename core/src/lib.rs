//! Image transformation engine.
//!
//! Two ways in: [`Engine::process_image`] applies one flat option set,
//! [`Engine::execute`] runs an ordered list of named steps. Both take an
//! [`ImageAsset`] built by the header-only loader and return a
//! [`ProcessingResult`] holding the encoded output.

pub mod asset;
pub mod codec;
pub mod compression;
pub mod config;
pub mod engine;
pub mod error;
pub mod finalize;
pub mod format;
pub mod metadata;
pub mod naming;
pub mod options;
pub mod pipeline;
pub mod resize;
pub mod result;
pub mod smart_crop;

pub use asset::{ColorSpace, ImageAsset};
pub use codec::{Background, Codec, CodecOptions, ImageCodec, ImageOp};
pub use compression::{CompressionLevel, EncodeParams};
pub use config::{ConfigError, EngineConfig};
pub use engine::Engine;
pub use error::{CodecError, EngineError, RetrievalError, ValidationError};
pub use format::ImageFormat;
pub use options::{ProcessingOptions, RawOptions};
pub use pipeline::PipelineStep;
pub use resize::{Dimensions, ResizeMode};
pub use result::ProcessingResult;

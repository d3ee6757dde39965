use image::{DynamicImage, GenericImageView};

use crate::codec::Codec;
use crate::compression::EncodeParams;
use crate::error::CodecError;
use crate::format::ImageFormat;

/// Terminal encode output.
#[derive(Debug, Clone)]
pub struct Finalized {
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub format: ImageFormat,
}

/// Parameters for the terminal encode. Parameters built for another
/// container are replaced by the defaults of `format`.
pub fn effective_params(encode: Option<EncodeParams>, format: ImageFormat) -> EncodeParams {
    match encode {
        Some(params) if params.format() == format => params,
        _ => EncodeParams::defaults(format),
    }
}

pub fn finalize<C: Codec + ?Sized>(
    codec: &C,
    image: &DynamicImage,
    format: ImageFormat,
    encode: Option<EncodeParams>,
) -> Result<Finalized, CodecError> {
    let params = effective_params(encode, format);
    let bytes = codec.encode(image, &params)?;
    let (width, height) = image.dimensions();

    Ok(Finalized {
        bytes,
        width,
        height,
        format,
    })
}

use bytes::Bytes;
use img_parts::{DynImage, ImageEXIF};

use crate::error::CodecError;

/// EXIF payload embedded in a JPEG, PNG or WebP container, if any.
pub fn read_exif(data: &[u8]) -> Option<Bytes> {
    match DynImage::from_bytes(Bytes::copy_from_slice(data)) {
        Ok(Some(image)) => image.exif(),
        _ => None,
    }
}

/// Apply the EXIF policy to freshly encoded output.
///
/// The encoders never write EXIF, so stripping is the natural result; keeping
/// means copying the source block into the output container. Containers
/// without an EXIF slot (AVIF, GIF) come back unchanged.
pub fn apply_exif_policy(source: &[u8], encoded: Vec<u8>, keep_exif: bool) -> Result<Vec<u8>, CodecError> {
    if !keep_exif {
        return strip_exif(encoded);
    }

    let Some(exif) = read_exif(source) else {
        return Ok(encoded);
    };

    match DynImage::from_bytes(Bytes::from(encoded.clone())) {
        Ok(Some(mut image)) => {
            image.set_exif(Some(exif));
            Ok(image.encoder().bytes().to_vec())
        }
        Ok(None) => {
            log::debug!("output container has no EXIF slot, metadata dropped");
            Ok(encoded)
        }
        Err(e) => Err(CodecError::Metadata(e.to_string())),
    }
}

/// Remove any EXIF block from an encoded image.
pub fn strip_exif(encoded: Vec<u8>) -> Result<Vec<u8>, CodecError> {
    match DynImage::from_bytes(Bytes::from(encoded.clone())) {
        Ok(Some(mut image)) if image.exif().is_some() => {
            image.set_exif(None);
            Ok(image.encoder().bytes().to_vec())
        }
        _ => Ok(encoded),
    }
}

use uuid::Uuid;

use crate::format::ImageFormat;

/// Random 16 hex character token plus the extension of `format`.
pub fn random_filename(format: ImageFormat) -> String {
    let token = Uuid::new_v4().simple().to_string();
    format!("{}.{}", &token[..16], format.extension())
}

use base64::{engine::general_purpose::STANDARD, Engine as _};

use crate::format::ImageFormat;

/// Outcome of one engine run. `encoded_bytes` is the source of truth; any
/// copy persisted by a caller may be swept independently.
#[derive(Debug, Clone)]
pub struct ProcessingResult {
    pub original_size: usize,
    pub processed_size: usize,
    pub width: u32,
    pub height: u32,
    pub format: ImageFormat,
    pub encoded_bytes: Vec<u8>,
    pub suggested_filename: String,
}

impl ProcessingResult {
    /// Processed size as a percentage of the original, e.g. `"40.00%"`.
    pub fn compression_ratio(&self) -> String {
        let ratio = if self.original_size == 0 {
            0.0
        } else {
            self.processed_size as f64 / self.original_size as f64 * 100.0
        };
        format!("{ratio:.2}%")
    }

    pub fn mime_type(&self) -> &'static str {
        self.format.mime_type()
    }

    /// Inline `data:` URI, only for outputs strictly below `threshold` bytes.
    pub fn data_uri(&self, threshold: usize) -> Option<String> {
        if self.processed_size >= threshold {
            return None;
        }
        Some(format!(
            "data:{};base64,{}",
            self.mime_type(),
            STANDARD.encode(&self.encoded_bytes)
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::INLINE_THRESHOLD;

    fn result(original_size: usize, bytes: Vec<u8>) -> ProcessingResult {
        ProcessingResult {
            original_size,
            processed_size: bytes.len(),
            width: 1,
            height: 1,
            format: ImageFormat::Png,
            encoded_bytes: bytes,
            suggested_filename: "0123456789abcdef.png".into(),
        }
    }

    #[test]
    fn test_compression_ratio() {
        let mut r = result(100_000, Vec::new());
        r.processed_size = 40_000;
        assert_eq!(r.compression_ratio(), "40.00%");
        r.processed_size = 1;
        r.original_size = 3;
        assert_eq!(r.compression_ratio(), "33.33%");
    }

    #[test]
    fn test_data_uri_threshold() {
        let r = result(10, b"abc".to_vec());
        assert_eq!(r.data_uri(INLINE_THRESHOLD).as_deref(), Some("data:image/png;base64,YWJj"));
        assert_eq!(r.data_uri(3), None);
    }
}

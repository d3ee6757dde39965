//! Source retrieval for the HTTP surface: remote URLs and inline base64.

use std::time::Duration;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::header::ACCEPT;
use reqwest::redirect::Policy;

use image_optimizer_core::{EngineConfig, EngineError, ImageAsset, RetrievalError};

const USER_AGENT: &str = "Image-Optimizer-API/1.0";
const TIMEOUT: Duration = Duration::from_secs(15);
const MAX_REDIRECTS: usize = 5;

pub struct Loader {
    client: reqwest::Client,
}

impl Loader {
    pub fn new() -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(TIMEOUT)
            .user_agent(USER_AGENT)
            .redirect(Policy::limited(MAX_REDIRECTS))
            .build()?;
        Ok(Self { client })
    }

    /// Download `url` and identify the image it holds.
    pub async fn from_url(&self, url: &str, config: &EngineConfig) -> Result<ImageAsset, EngineError> {
        let download = |reason: String| RetrievalError::Download {
            url: url.to_string(),
            reason,
        };

        let parsed = reqwest::Url::parse(url).map_err(|e| download(e.to_string()))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(download(format!("unsupported scheme '{}'", parsed.scheme())).into());
        }

        let response = self
            .client
            .get(parsed)
            .header(ACCEPT, "image/*")
            .send()
            .await
            .map_err(|e| download(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(download(format!("HTTP error: {}", status.as_u16())).into());
        }

        if let Some(len) = response.content_length() {
            if len > config.max_input_bytes as u64 {
                return Err(EngineError::Oversize {
                    limit_kind: "byte size",
                    actual: len,
                    limit: config.max_input_bytes as u64,
                });
            }
        }

        let bytes = response.bytes().await.map_err(|e| download(e.to_string()))?;
        log::debug!("Downloaded {} bytes from {}", bytes.len(), url);

        ImageAsset::from_bytes(bytes.to_vec(), config)
    }
}

/// Decode base64 image text, with or without a `data:image/<type>;base64,`
/// prefix.
pub fn decode_inline(text: &str) -> Result<Vec<u8>, EngineError> {
    let payload = strip_data_uri_prefix(text.trim());
    STANDARD
        .decode(payload)
        .map_err(|_| EngineError::InvalidData("Invalid base64 image data".into()))
}

fn strip_data_uri_prefix(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("data:image/") else {
        return text;
    };
    match rest.split_once(";base64,") {
        Some((kind, payload)) if !kind.is_empty() && kind.chars().all(|c| c.is_alphanumeric() || c == '_') => payload,
        _ => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_inline() {
        assert_eq!(decode_inline("YWJj").unwrap(), b"abc");
        assert_eq!(decode_inline("data:image/png;base64,YWJj").unwrap(), b"abc");
        assert_eq!(decode_inline(" data:image/webp;base64,YWJj\n").unwrap(), b"abc");
    }

    #[test]
    fn test_decode_inline_rejects_garbage() {
        let err = decode_inline("data:image/png;base64,@@@").unwrap_err();
        assert_eq!(err.code(), "INVALID_IMAGE");
        // Only image data URIs are unwrapped
        assert!(decode_inline("data:text/plain;base64,YWJj").is_err());
    }

    #[tokio::test]
    async fn test_rejects_non_http_urls() {
        let loader = Loader::new().unwrap();
        let config = EngineConfig::default();
        for url in ["not a url", "ftp://example.com/a.png", "file:///etc/passwd"] {
            let err = loader.from_url(url, &config).await.unwrap_err();
            assert_eq!(err.code(), "INVALID_URL", "{url}");
        }
    }
}

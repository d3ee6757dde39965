use axum::{
    extract::{Multipart, Query, State},
    http::{header, HeaderMap},
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use image_optimizer_core::pipeline::parse_steps;
use image_optimizer_core::{EngineError, ImageAsset, ProcessingResult, RawOptions};

use crate::error::ApiError;
use crate::loader::decode_inline;
use crate::state::AppState;

#[derive(Debug, Serialize)]
struct Status {
    code: i32,
    message: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ProcessedResponse {
    status: Status,
    #[serde(skip_serializing_if = "Option::is_none")]
    original_url: Option<String>,
    original_size: usize,
    processed_size: usize,
    format: String,
    width: u32,
    height: u32,
    compression_ratio: String,
    download_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    base64: Option<String>,
}

pub async fn root() -> &'static str {
    "Image Optimizer API\n\nAPI Endpoints:\n  GET  /optimize\n  POST /optimize\n  POST /pipeline\n  GET  /stats\n  GET  /health\n"
}

pub async fn health() -> Json<Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizeQuery {
    url: Option<String>,
    max_width: Option<String>,
    compression: Option<String>,
}

/// GET /optimize
///
/// Load `url`, fit it inside `maxWidth` and return the image bytes in the
/// default output format.
pub async fn optimize_url(
    State(state): State<AppState>,
    Query(query): Query<OptimizeQuery>,
) -> Result<Response, ApiError> {
    let url = query
        .url
        .filter(|u| !u.is_empty())
        .ok_or_else(|| ApiError::BadRequest("URL parameter is required".into()))?;

    let defaults = state.engine.config();
    let raw = RawOptions {
        max_width: Some(query.max_width.unwrap_or_else(|| defaults.default_max_width.to_string())),
        compression: query.compression,
        target_format: Some(defaults.default_format.as_str().to_string()),
        quality: Some(defaults.default_quality.to_string()),
        ..RawOptions::default()
    };
    raw.check().map_err(EngineError::from)?;

    let asset = state.loader.from_url(&url, defaults).await?;
    let result = run_options(&state, asset, raw).await?;

    Ok((
        [(header::CONTENT_TYPE, result.mime_type())],
        result.encoded_bytes,
    )
        .into_response())
}

/// POST /optimize
///
/// Form fields:
/// - url or image (file): source
/// - lossy: compression 0, 1 or 2
/// - resize: 0, 1, 3 or 4, with resize_width / resize_height
/// - cmyk2rgb, keep_exif: 1 to enable
/// - convertto: target format (default: the configured format)
/// - quality: 1-100 (default: the configured quality)
pub async fn optimize_upload(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<Response, ApiError> {
    let mut url: Option<String> = None;
    let mut upload: Option<Vec<u8>> = None;
    let mut raw = RawOptions::default();

    while let Some(field) = multipart.next_field().await.map_err(bad_multipart)? {
        let name = field.name().unwrap_or("").to_string();

        if name == "image" {
            upload = Some(field.bytes().await.map_err(bad_multipart)?.to_vec());
            continue;
        }

        let text = field.text().await.map_err(bad_multipart)?;
        match name.as_str() {
            "url" => url = Some(text).filter(|u| !u.is_empty()),
            "lossy" => raw.compression = Some(text),
            "resize" => raw.resize = Some(text),
            "resize_width" => raw.resize_width = Some(text),
            "resize_height" => raw.resize_height = Some(text),
            "cmyk2rgb" => raw.convert_cmyk_to_rgb = Some(text.trim() == "1"),
            "keep_exif" => raw.keep_exif = Some(text.trim() == "1"),
            "convertto" => raw.target_format = Some(text),
            "quality" => raw.quality = Some(text),
            _ => {}
        }
    }

    let config = state.engine.config();
    raw.target_format.get_or_insert_with(|| config.default_format.as_str().to_string());
    raw.quality.get_or_insert_with(|| config.default_quality.to_string());
    raw.check().map_err(EngineError::from)?;

    let asset = match (&url, upload) {
        (Some(url), _) => state.loader.from_url(url, config).await?,
        (None, Some(bytes)) => ImageAsset::from_bytes(bytes, config)?,
        (None, None) => {
            return Err(ApiError::BadRequest(
                "Either url parameter or image file upload is required".into(),
            ))
        }
    };

    let result = run_options(&state, asset, raw).await?;
    respond(&state, &headers, result, url.or(Some("uploaded-file".into())), "Image processed successfully").await
}

/// POST /pipeline
///
/// Form fields:
/// - pipeline: JSON `{"steps": [...]}`
/// - url, image (file) or image (base64 text / data URI): source
pub async fn pipeline(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<Response, ApiError> {
    let mut pipeline: Option<String> = None;
    let mut url: Option<String> = None;
    let mut upload: Option<Vec<u8>> = None;
    let mut inline: Option<String> = None;

    while let Some(field) = multipart.next_field().await.map_err(bad_multipart)? {
        let name = field.name().unwrap_or("").to_string();
        let is_file = field.file_name().is_some();

        match name.as_str() {
            "image" if is_file => upload = Some(field.bytes().await.map_err(bad_multipart)?.to_vec()),
            "image" => inline = Some(field.text().await.map_err(bad_multipart)?),
            "pipeline" => pipeline = Some(field.text().await.map_err(bad_multipart)?),
            "url" => url = Some(field.text().await.map_err(bad_multipart)?).filter(|u| !u.is_empty()),
            _ => {}
        }
    }

    let pipeline = pipeline
        .filter(|p| !p.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest("Pipeline configuration is required".into()))?;
    let pipeline: Value = serde_json::from_str(&pipeline)
        .map_err(|e| ApiError::BadRequest(format!("Invalid pipeline configuration: {e}")))?;

    // Fail on bad steps before touching the source
    let steps = parse_steps(pipeline.get("steps").unwrap_or(&Value::Null)).map_err(EngineError::from)?;

    let config = state.engine.config();
    let asset = if let Some(url) = &url {
        state.loader.from_url(url, config).await?
    } else if let Some(bytes) = upload {
        ImageAsset::from_bytes(bytes, config)?
    } else if let Some(text) = inline {
        ImageAsset::from_bytes(decode_inline(&text)?, config)?
    } else {
        return Err(ApiError::BadRequest(
            "Image input is required (url, file upload, or base64)".into(),
        ));
    };

    let engine = state.engine.clone();
    let result = blocking(move || engine.process_pipeline(&asset, &steps)).await?;
    respond(&state, &headers, result, url, "Pipeline executed successfully").await
}

/// GET /stats
pub async fn stats(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let stats = state.storage.stats().await?;
    Ok(Json(serde_json::json!({
        "status": { "code": 2, "message": "Storage statistics" },
        "storage": stats,
    })))
}

async fn run_options(state: &AppState, asset: ImageAsset, raw: RawOptions) -> Result<ProcessingResult, ApiError> {
    let engine = state.engine.clone();
    blocking(move || engine.process_image(&asset, &raw)).await
}

/// Run an engine call on the blocking pool.
async fn blocking<F>(run: F) -> Result<ProcessingResult, ApiError>
where
    F: FnOnce() -> Result<ProcessingResult, EngineError> + Send + 'static,
{
    tokio::task::spawn_blocking(run)
        .await
        .map_err(|e| ApiError::Internal(format!("processing task failed: {e}")))?
        .map_err(ApiError::from)
}

async fn respond(
    state: &AppState,
    headers: &HeaderMap,
    result: ProcessingResult,
    original_url: Option<String>,
    message: &'static str,
) -> Result<Response, ApiError> {
    let stored = state
        .storage
        .persist(&result.encoded_bytes, &result.suggested_filename)
        .await?;
    log::debug!("Stored {} at {}", stored.filename, stored.path.display());

    let download_url = match headers.get(header::HOST).and_then(|h| h.to_str().ok()) {
        Some(host) => format!("http://{}{}", host, stored.url),
        None => stored.url,
    };

    let body = ProcessedResponse {
        status: Status { code: 2, message },
        original_url,
        original_size: result.original_size,
        processed_size: result.processed_size,
        format: result.format.to_string(),
        width: result.width,
        height: result.height,
        compression_ratio: result.compression_ratio(),
        download_url,
        base64: result.data_uri(state.engine.config().inline_threshold),
    };

    Ok(Json(body).into_response())
}

fn bad_multipart(e: axum::extract::multipart::MultipartError) -> ApiError {
    ApiError::BadRequest(format!("Invalid multipart body: {e}"))
}

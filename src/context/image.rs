//! Image payload decoding and vision-model description.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::core::errors::ApiError;
use crate::llm::types::DEFAULT_IMAGE_MIME;
use crate::llm::{ImageInput, LlmProvider};

pub const IMAGE_ANALYSIS_PROMPT: &str = "Analyze this image and provide a detailed medical/botanical description. \
Identify any visible symptoms, skin conditions, herbs, or plants. \
Do not provide advice yet, just describe what is seen.";

/// Decodes a base64 image, optionally prefixed with a data URI header
/// such as `data:image/png;base64,`.
pub fn decode_image_payload(payload: &str) -> Result<ImageInput, ApiError> {
    let (header, data) = match payload.split_once(',') {
        Some((header, data)) => (Some(header), data),
        None => (None, payload),
    };

    let mime_type = header
        .and_then(|h| h.trim().strip_prefix("data:"))
        .and_then(|h| h.split(';').next())
        .map(str::trim)
        .filter(|m| m.starts_with("image/"))
        .unwrap_or(DEFAULT_IMAGE_MIME);

    let cleaned: String = data.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = STANDARD.decode(cleaned.as_bytes()).map_err(ApiError::image)?;
    if bytes.is_empty() {
        return Err(ApiError::ImageProcessing("image payload is empty".to_string()));
    }
    Ok(ImageInput::new(bytes, mime_type))
}

/// Asks the vision model to describe the image; returns the
/// `"Image Analysis: ..."` context block.
pub async fn describe_image(llm: &dyn LlmProvider, image: &ImageInput) -> Result<String, ApiError> {
    let description = llm
        .generate_with_image(image, IMAGE_ANALYSIS_PROMPT)
        .await
        .map_err(ApiError::image)?;
    tracing::debug!("image described ({} chars)", description.len());
    Ok(format!("Image Analysis: {}", description.trim()))
}

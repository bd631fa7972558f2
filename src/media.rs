//! Post image uploads to Cloudinary.

use base64::{engine::general_purpose::STANDARD, Engine};
use reqwest::multipart::Form;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::time::Duration;

use crate::config::CloudinaryConfig;
use crate::error::{AppError, AppResult};

pub const MAX_IMAGES: usize = 5;
pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;
pub const ALLOWED_MIME_TYPES: [&str; 3] = ["image/jpeg", "image/png", "image/gif"];
pub const UPLOAD_FOLDER: &str = "aifarming/posts";

/// Image attached to `POST /posts`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageUpload {
    pub data_base64: String,
    pub mime_type: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DecodedImage {
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

/// Decode standard base64, tolerating a `data:<mime>;base64,` prefix.
pub fn decode_base64(raw: &str) -> AppResult<Vec<u8>> {
    let payload = match raw.split_once(";base64,") {
        Some((prefix, data)) if prefix.starts_with("data:") => data,
        _ => raw,
    };
    STANDARD
        .decode(payload.trim())
        .map_err(|_| AppError::BadRequest("Invalid base64 payload".to_string()))
}

/// Checks count, type and size limits and decodes every image.
pub fn decode_images(images: &[ImageUpload]) -> AppResult<Vec<DecodedImage>> {
    if images.len() > MAX_IMAGES {
        return Err(AppError::BadRequest(format!(
            "At most {} images per post",
            MAX_IMAGES
        )));
    }

    images
        .iter()
        .map(|image| {
            let mime_type = image.mime_type.trim().to_ascii_lowercase();
            if !ALLOWED_MIME_TYPES.contains(&mime_type.as_str()) {
                return Err(AppError::BadRequest(format!(
                    "Unsupported image type: {}",
                    image.mime_type
                )));
            }
            let bytes = decode_base64(&image.data_base64)?;
            if bytes.len() > MAX_IMAGE_BYTES {
                return Err(AppError::BadRequest("Image exceeds 5MB limit".to_string()));
            }
            Ok(DecodedImage { mime_type, bytes })
        })
        .collect()
}

/// Cloudinary signature: sorted `key=value` pairs joined by `&`, followed by
/// the API secret, hashed with SHA-256.
pub fn sign_params(params: &[(&str, String)], api_secret: &str) -> String {
    let mut sorted: Vec<&(&str, String)> = params.iter().collect();
    sorted.sort_by_key(|(key, _)| *key);

    let to_sign = sorted
        .iter()
        .map(|(key, value)| format!("{}={}", key, value))
        .collect::<Vec<_>>()
        .join("&");

    let mut hasher = Sha256::new();
    hasher.update(to_sign.as_bytes());
    hasher.update(api_secret.as_bytes());
    hex::encode(hasher.finalize())
}

#[derive(Deserialize)]
struct UploadResponse {
    secure_url: String,
}

pub struct MediaUploader {
    http: reqwest::Client,
    config: CloudinaryConfig,
}

impl MediaUploader {
    pub fn new(config: CloudinaryConfig) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_default();
        Self { http, config }
    }

    /// Upload one image and return its `secure_url`.
    pub async fn upload(&self, image: &DecodedImage) -> AppResult<String> {
        let timestamp = chrono::Utc::now().timestamp().to_string();
        let params = [("folder", UPLOAD_FOLDER.to_string()), ("timestamp", timestamp.clone())];
        let signature = sign_params(&params, &self.config.api_secret);

        let data_uri = format!("data:{};base64,{}", image.mime_type, STANDARD.encode(&image.bytes));
        let form = Form::new()
            .text("file", data_uri)
            .text("api_key", self.config.api_key.clone())
            .text("timestamp", timestamp)
            .text("folder", UPLOAD_FOLDER)
            .text("signature", signature)
            .text("signature_algorithm", "sha256");

        let url = format!(
            "https://api.cloudinary.com/v1_1/{}/image/upload",
            self.config.cloud_name
        );
        let response = self.http.post(url).multipart(form).send().await?;

        if !response.status().is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Upstream {
                message: "Image upload failed".to_string(),
                body,
            });
        }

        let uploaded: UploadResponse = response.json().await?;
        tracing::debug!(url = %uploaded.secure_url, "Image uploaded");
        Ok(uploaded.secure_url)
    }

    pub async fn upload_all(&self, images: &[DecodedImage]) -> AppResult<Vec<String>> {
        let mut urls = Vec::with_capacity(images.len());
        for image in images {
            urls.push(self.upload(image).await?);
        }
        Ok(urls)
    }
}

//! Media hosting
//!
//! Handles:
//! - Image upload from `data:` URIs, returning a public secure URL
//! - Image deletion by asset ID
//!
//! The asset ID of a stored image is the last path segment of its URL
//! with the extension stripped, so a URL kept on a user record is all
//! that is needed to delete it later.

mod media;
mod memory;

use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose};

use crate::error::AppError;

pub use media::R2MediaHost;
pub use memory::MemoryMediaHost;

/// Result of a successful upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedAsset {
    /// Identifier accepted by [`MediaHost::destroy`]
    pub asset_id: String,
    /// Canonical public URL to store on the record
    pub secure_url: String,
}

/// External media host
#[async_trait]
pub trait MediaHost: Send + Sync {
    /// Upload an asset given as a `data:` URI
    async fn upload(&self, asset: &str) -> Result<UploadedAsset, AppError>;

    /// Delete a previously uploaded asset
    ///
    /// Deleting an unknown asset is not an error.
    async fn destroy(&self, asset_id: &str) -> Result<(), AppError>;

    /// Content type and bytes of a stored asset, for hosts this server serves itself
    ///
    /// Hosts with their own public endpoint return `None`.
    async fn fetch(&self, _asset_id: &str) -> Result<Option<StoredMedia>, AppError> {
        Ok(None)
    }
}

/// Asset bytes as served back to clients
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredMedia {
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Derive the asset ID from a stored media URL
///
/// `https://media.example.com/media/01HX.png` → `01HX`
pub fn asset_id_from_url(stored: &str) -> Option<String> {
    let last_segment = match url::Url::parse(stored) {
        Ok(parsed) => parsed
            .path_segments()
            .and_then(|segments| segments.last())
            .map(str::to_string),
        Err(_) => stored.rsplit('/').next().map(str::to_string),
    }?;

    let asset_id = last_segment
        .split('.')
        .next()
        .unwrap_or_default()
        .to_string();

    if asset_id.is_empty() {
        None
    } else {
        Some(asset_id)
    }
}

/// Decoded `data:<mime>;base64,<payload>` URI
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUri {
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl DataUri {
    /// Parse a base64 data URI
    ///
    /// # Errors
    /// `Validation` if the value is not a base64 image data URI
    pub fn parse(raw: &str) -> Result<Self, AppError> {
        let invalid = || AppError::Validation("Image must be a base64 data URI".to_string());

        let rest = raw.trim().strip_prefix("data:").ok_or_else(invalid)?;
        let (header, payload) = rest.split_once(',').ok_or_else(invalid)?;
        let content_type = header.strip_suffix(";base64").ok_or_else(invalid)?;
        if !content_type.starts_with("image/") {
            return Err(invalid());
        }

        let bytes = general_purpose::STANDARD
            .decode(payload.trim())
            .map_err(|_| invalid())?;
        if bytes.is_empty() {
            return Err(invalid());
        }

        Ok(Self {
            content_type: content_type.to_ascii_lowercase(),
            bytes,
        })
    }

    /// File extension for the content type
    pub fn extension(&self) -> &'static str {
        match self.content_type.as_str() {
            "image/jpeg" | "image/jpg" => "jpg",
            "image/png" => "png",
            "image/webp" => "webp",
            "image/gif" => "gif",
            "image/avif" => "avif",
            "image/svg+xml" => "svg",
            _ => "bin",
        }
    }
}

pub(crate) fn build_r2_http_client() -> aws_sdk_s3::config::SharedHttpClient {
    use aws_smithy_runtime::client::http::hyper_014::HyperClientBuilder;

    let https_connector = hyper_rustls::HttpsConnectorBuilder::new()
        .with_webpki_roots()
        .https_only()
        .enable_http1()
        .enable_http2()
        .build();

    HyperClientBuilder::new().build(https_connector)
}

//! Media storage using Cloudflare R2
//!
//! Objects are stored as `media/{asset_id}.{ext}` and served via the
//! R2 Custom Domain (CDN).

use async_trait::async_trait;
use aws_sdk_s3::Client as S3Client;

use super::{DataUri, MediaHost, UploadedAsset, build_r2_http_client};
use crate::data::EntityId;
use crate::error::AppError;
use crate::metrics::{MEDIA_DESTROYS_TOTAL, MEDIA_UPLOADS_TOTAL};

const MEDIA_PREFIX: &str = "media";

/// Media host backed by an R2 bucket
pub struct R2MediaHost {
    /// S3-compatible client for R2
    client: S3Client,
    /// Media bucket name
    bucket: String,
    /// Public URL base (Custom Domain)
    /// e.g., "https://media.example.com"
    public_url: String,
}

impl R2MediaHost {
    /// Create new media storage client
    ///
    /// No network traffic happens here; credentials are checked on the
    /// first request.
    pub fn new(
        config: &crate::config::MediaStorageConfig,
        cloudflare: &crate::config::CloudflareConfig,
    ) -> Self {
        use aws_sdk_s3::config::{BehaviorVersion, Credentials, Region};

        // R2 endpoint: https://{account_id}.r2.cloudflarestorage.com
        let endpoint = format!("https://{}.r2.cloudflarestorage.com", cloudflare.account_id);

        let credentials = Credentials::new(
            &cloudflare.r2_access_key_id,
            &cloudflare.r2_secret_access_key,
            None,
            None,
            "rookery-r2",
        );

        let s3_config = aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .http_client(build_r2_http_client())
            .region(Region::new("auto"))
            .endpoint_url(&endpoint)
            .credentials_provider(credentials)
            .build();

        Self {
            client: S3Client::from_conf(s3_config),
            bucket: config.bucket.clone(),
            public_url: config.public_url.trim_end_matches('/').to_string(),
        }
    }

    /// Get public URL for an S3 key
    pub fn get_public_url(&self, key: &str) -> String {
        format!("{}/{}", self.public_url, key)
    }
}

#[async_trait]
impl MediaHost for R2MediaHost {
    async fn upload(&self, asset: &str) -> Result<UploadedAsset, AppError> {
        use aws_sdk_s3::primitives::ByteStream;

        let data = DataUri::parse(asset)?;
        let asset_id = EntityId::new().0;
        let key = format!("{}/{}.{}", MEDIA_PREFIX, asset_id, data.extension());

        let result = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .body(ByteStream::from(data.bytes))
            .content_type(&data.content_type)
            .cache_control("public, max-age=31536000") // 1 year
            .send()
            .await;

        if let Err(e) = result {
            MEDIA_UPLOADS_TOTAL.with_label_values(&["error"]).inc();
            return Err(AppError::Storage(format!("R2 upload failed: {}", e)));
        }

        MEDIA_UPLOADS_TOTAL.with_label_values(&["ok"]).inc();
        Ok(UploadedAsset {
            secure_url: self.get_public_url(&key),
            asset_id,
        })
    }

    async fn destroy(&self, asset_id: &str) -> Result<(), AppError> {
        // The extension is not part of the asset ID, so find the object by prefix.
        let listing = self
            .client
            .list_objects_v2()
            .bucket(&self.bucket)
            .prefix(format!("{}/{}.", MEDIA_PREFIX, asset_id))
            .send()
            .await
            .map_err(|e| AppError::Storage(format!("R2 list failed: {}", e)))?;

        for object in listing.contents() {
            let Some(key) = object.key() else {
                continue;
            };

            if let Err(e) = self
                .client
                .delete_object()
                .bucket(&self.bucket)
                .key(key)
                .send()
                .await
            {
                MEDIA_DESTROYS_TOTAL.with_label_values(&["error"]).inc();
                return Err(AppError::Storage(format!("R2 delete failed: {}", e)));
            }
            MEDIA_DESTROYS_TOTAL.with_label_values(&["ok"]).inc();
        }

        Ok(())
    }
}

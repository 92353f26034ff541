//! In-process media host
//!
//! Keeps uploaded bytes in a map. Used for local development
//! (`storage.media.backend = "memory"`) and tests.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{DataUri, MediaHost, StoredMedia, UploadedAsset};
use crate::data::EntityId;
use crate::error::AppError;
use crate::metrics::{MEDIA_DESTROYS_TOTAL, MEDIA_UPLOADS_TOTAL};

/// Media host that never leaves the process
pub struct MemoryMediaHost {
    public_url: String,
    assets: RwLock<HashMap<String, StoredMedia>>,
}

impl MemoryMediaHost {
    pub fn new(public_url: &str) -> Self {
        Self {
            public_url: public_url.trim_end_matches('/').to_string(),
            assets: RwLock::new(HashMap::new()),
        }
    }

    /// Whether an asset with this ID is currently stored
    pub async fn contains(&self, asset_id: &str) -> bool {
        self.assets.read().await.contains_key(asset_id)
    }

    /// Number of stored assets
    pub async fn len(&self) -> usize {
        self.assets.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.assets.read().await.is_empty()
    }

    pub async fn get(&self, asset_id: &str) -> Option<StoredMedia> {
        self.assets.read().await.get(asset_id).cloned()
    }
}

#[async_trait]
impl MediaHost for MemoryMediaHost {
    async fn upload(&self, asset: &str) -> Result<UploadedAsset, AppError> {
        let data = DataUri::parse(asset)?;
        let asset_id = EntityId::new().0;
        let secure_url = format!("{}/{}.{}", self.public_url, asset_id, data.extension());

        self.assets.write().await.insert(
            asset_id.clone(),
            StoredMedia {
                content_type: data.content_type,
                bytes: data.bytes,
            },
        );
        MEDIA_UPLOADS_TOTAL.with_label_values(&["ok"]).inc();

        Ok(UploadedAsset {
            asset_id,
            secure_url,
        })
    }

    async fn destroy(&self, asset_id: &str) -> Result<(), AppError> {
        if self.assets.write().await.remove(asset_id).is_some() {
            MEDIA_DESTROYS_TOTAL.with_label_values(&["ok"]).inc();
        }
        Ok(())
    }

    async fn fetch(&self, asset_id: &str) -> Result<Option<StoredMedia>, AppError> {
        Ok(self.get(asset_id).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::asset_id_from_url;

    const PNG: &str = "data:image/png;base64,iVBORw0KGgo=";

    #[tokio::test]
    async fn upload_then_destroy_by_url() {
        let host = MemoryMediaHost::new("https://media.test.example.com/");
        let uploaded = host.upload(PNG).await.unwrap();

        assert!(
            uploaded
                .secure_url
                .starts_with("https://media.test.example.com/")
        );
        assert!(uploaded.secure_url.ends_with(".png"));
        assert_eq!(
            asset_id_from_url(&uploaded.secure_url),
            Some(uploaded.asset_id.clone())
        );
        assert!(host.contains(&uploaded.asset_id).await);

        let stored = host.fetch(&uploaded.asset_id).await.unwrap().unwrap();
        assert_eq!(stored.content_type, "image/png");
        assert_eq!(stored.bytes[..4], [0x89, b'P', b'N', b'G']);

        host.destroy(&uploaded.asset_id).await.unwrap();
        assert!(host.is_empty().await);
        assert!(host.fetch(&uploaded.asset_id).await.unwrap().is_none());

        // unknown IDs are fine
        host.destroy("nope").await.unwrap();
    }

    #[tokio::test]
    async fn upload_rejects_non_data_uri() {
        let host = MemoryMediaHost::new("https://media.test.example.com");
        let error = host.upload("https://elsewhere/a.png").await.unwrap_err();
        assert!(matches!(error, AppError::Validation(_)));
        assert_eq!(host.len().await, 0);
    }
}

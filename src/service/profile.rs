//! Profile service
//!
//! Profile lookup by username and merge-patch updates, including
//! password rotation and image replacement.
//!
//! Updates are built in memory first: the password is checked and
//! re-hashed and new images are uploaded before anything is written.
//! The user row is then persisted with a single statement, so a
//! failure at any earlier step leaves the stored record untouched.

use std::sync::Arc;

use chrono::Utc;

use crate::auth::password::{MIN_PASSWORD_LENGTH, hash_password, is_strong_enough, verify_password};
use crate::data::{Database, User};
use crate::error::AppError;
use crate::metrics::PROFILE_UPDATES_TOTAL;
use crate::storage::{MediaHost, UploadedAsset, asset_id_from_url};

/// Requested changes to a profile
///
/// Empty strings count as "not provided".
#[derive(Debug, Clone, Default)]
pub struct ProfilePatch {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub username: Option<String>,
    pub bio: Option<String>,
    pub link: Option<String>,
    /// New profile image as a `data:` URI
    pub profile_img: Option<String>,
    /// New cover image as a `data:` URI
    pub cover_img: Option<String>,
    pub current_password: Option<String>,
    pub new_password: Option<String>,
}

fn provided(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.is_empty())
}

impl ProfilePatch {
    fn normalized(self) -> Self {
        Self {
            full_name: provided(self.full_name),
            email: provided(self.email.map(|email| email.trim().to_string())),
            username: provided(self.username.map(|username| username.trim().to_string())),
            bio: provided(self.bio),
            link: provided(self.link),
            profile_img: provided(self.profile_img),
            cover_img: provided(self.cover_img),
            current_password: provided(self.current_password),
            new_password: provided(self.new_password),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum ImageSlot {
    Profile,
    Cover,
}

impl ImageSlot {
    fn failure_message(&self) -> &'static str {
        match self {
            Self::Profile => "Failed to update profile image",
            Self::Cover => "Failed to update cover image",
        }
    }
}

/// Profile service
pub struct ProfileService {
    db: Arc<Database>,
    media: Arc<dyn MediaHost>,
}

impl ProfileService {
    /// Create new profile service
    pub fn new(db: Arc<Database>, media: Arc<dyn MediaHost>) -> Self {
        Self { db, media }
    }

    /// Look up a user by username
    ///
    /// Surrounding whitespace in `username` is ignored.
    pub async fn get_profile(&self, username: &str) -> Result<User, AppError> {
        self.db
            .get_user_by_username(username.trim())
            .await?
            .ok_or(AppError::NotFound)
    }

    /// Apply a merge patch to a user's profile
    ///
    /// # Errors
    /// * `NotFound` - no such user
    /// * `Validation` - malformed password change, wrong current password,
    ///   short new password, or username/email already taken
    /// * `Storage` - an image could not be uploaded
    pub async fn update_profile(&self, user_id: &str, patch: ProfilePatch) -> Result<User, AppError> {
        let result = self.build_and_commit(user_id, patch.normalized()).await;
        let status = if result.is_ok() { "ok" } else { "error" };
        PROFILE_UPDATES_TOTAL.with_label_values(&[status]).inc();
        result
    }

    async fn build_and_commit(&self, user_id: &str, patch: ProfilePatch) -> Result<User, AppError> {
        let current = self.db.get_user(user_id).await?.ok_or(AppError::NotFound)?;
        let mut updated = current.clone();

        if let Some(password_hash) = next_password_hash(
            &current.password_hash,
            patch.current_password.as_deref(),
            patch.new_password.as_deref(),
        )
        .await?
        {
            updated.password_hash = password_hash;
        }

        if let Some(full_name) = patch.full_name {
            updated.full_name = full_name;
        }
        if let Some(email) = patch.email {
            updated.email = email;
        }
        if let Some(username) = patch.username {
            updated.username = username;
        }
        if let Some(bio) = patch.bio {
            updated.bio = Some(bio);
        }
        if let Some(link) = patch.link {
            updated.link = Some(link);
        }

        let mut uploaded: Vec<UploadedAsset> = Vec::new();
        let mut replaced: Vec<String> = Vec::new();

        for (slot, asset) in [
            (ImageSlot::Profile, patch.profile_img),
            (ImageSlot::Cover, patch.cover_img),
        ] {
            let Some(asset) = asset else {
                continue;
            };

            let new_asset = match self.media.upload(&asset).await {
                Ok(new_asset) => new_asset,
                Err(error) => {
                    tracing::error!(user_id = %user_id, %error, "{}", slot.failure_message());
                    self.discard_uploads(&uploaded).await;
                    return Err(AppError::Storage(slot.failure_message().to_string()));
                }
            };

            let field = match slot {
                ImageSlot::Profile => &mut updated.profile_img,
                ImageSlot::Cover => &mut updated.cover_img,
            };
            if let Some(previous) = field.replace(new_asset.secure_url.clone()) {
                replaced.push(previous);
            }
            uploaded.push(new_asset);
        }

        updated.updated_at = Utc::now();

        let committed = match self.db.update_user_profile(&updated).await {
            Ok(committed) => committed,
            Err(error) => {
                self.discard_uploads(&uploaded).await;
                return Err(error);
            }
        };
        if !committed {
            self.discard_uploads(&uploaded).await;
            return Err(AppError::NotFound);
        }

        self.destroy_replaced(&replaced).await;

        tracing::info!(
            user_id = %user_id,
            password_changed = updated.password_hash != current.password_hash,
            images_replaced = uploaded.len(),
            "Profile updated"
        );

        Ok(updated)
    }

    /// Best-effort removal of assets uploaded for an update that did not commit
    async fn discard_uploads(&self, uploaded: &[UploadedAsset]) {
        let removals = uploaded.iter().map(|asset| async move {
            if let Err(error) = self.media.destroy(&asset.asset_id).await {
                tracing::warn!(
                    asset_id = %asset.asset_id,
                    %error,
                    "failed to rollback uploaded image after profile update error"
                );
            }
        });
        futures::future::join_all(removals).await;
    }

    /// Best-effort removal of images that a committed update replaced
    async fn destroy_replaced(&self, previous_urls: &[String]) {
        let removals = previous_urls.iter().filter_map(|url| {
            let asset_id = asset_id_from_url(url)?;
            Some(async move {
                if let Err(error) = self.media.destroy(&asset_id).await {
                    tracing::warn!(
                        asset_id = %asset_id,
                        %error,
                        "failed to delete previous image from media host"
                    );
                }
            })
        });
        futures::future::join_all(removals).await;
    }
}

/// Decide the password hash after a patch
///
/// Returns `None` when the patch does not touch the password.
async fn next_password_hash(
    stored_hash: &str,
    current_password: Option<&str>,
    new_password: Option<&str>,
) -> Result<Option<String>, AppError> {
    match (current_password, new_password) {
        (None, None) => Ok(None),
        (Some(current_password), Some(new_password)) => {
            if !verify_password(current_password, stored_hash).await? {
                return Err(AppError::Validation(
                    "Current password is incorrect".to_string(),
                ));
            }
            if !is_strong_enough(new_password) {
                return Err(AppError::Validation(format!(
                    "Password must be at least {} characters long",
                    MIN_PASSWORD_LENGTH
                )));
            }
            Ok(Some(hash_password(new_password).await?))
        }
        _ => Err(AppError::Validation(
            "Please provide both current password and new password".to_string(),
        )),
    }
}

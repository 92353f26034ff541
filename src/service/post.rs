//! Post service
//!
//! Creating and deleting posts, the four feeds, and the like toggle.
//!
//! A post's likers live in the post row itself. "Posts liked by a
//! user" is read back from that column, so a like is a single-row
//! write with nothing to keep in step.

use std::sync::Arc;

use crate::data::{Database, Notification, NotificationType, Post, PostWithAuthor};
use crate::error::AppError;
use crate::metrics::{LIKE_TOGGLES_TOTAL, NOTIFICATIONS_CREATED_TOTAL, POST_WRITES_TOTAL};
use crate::storage::{MediaHost, asset_id_from_url};

const POST_NOT_FOUND: &str = "Post not found";

/// Content of a new post
///
/// Empty or whitespace-only values count as absent.
#[derive(Debug, Clone, Default)]
pub struct NewPost {
    pub text: Option<String>,
    /// Image as a `data:` URI
    pub img: Option<String>,
}

/// Which branch a like toggle took
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LikeOutcome {
    Liked,
    Unliked,
}

impl LikeOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Liked => "liked",
            Self::Unliked => "unliked",
        }
    }
}

/// Result of a like toggle: the branch taken and the post's likes afterwards
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LikeToggle {
    pub outcome: LikeOutcome,
    pub likes: Vec<String>,
}

/// Post service
pub struct PostService {
    db: Arc<Database>,
    media: Arc<dyn MediaHost>,
}

impl PostService {
    /// Create new post service
    pub fn new(db: Arc<Database>, media: Arc<dyn MediaHost>) -> Self {
        Self { db, media }
    }

    /// Publish a post as `author_id`
    ///
    /// The image, if any, is uploaded before the row is written and
    /// removed again if the write fails.
    ///
    /// # Errors
    /// * `Validation` - neither text nor image given
    /// * `NotFound` - the author does not exist
    /// * `Storage` - the image could not be uploaded
    pub async fn create_post(
        &self,
        author_id: &str,
        new_post: NewPost,
    ) -> Result<PostWithAuthor, AppError> {
        let text = new_post.text.filter(|text| !text.trim().is_empty());
        let img = new_post.img.filter(|img| !img.trim().is_empty());
        if text.is_none() && img.is_none() {
            return Err(AppError::Validation(
                "Post must have text or image".to_string(),
            ));
        }

        let author = self
            .db
            .get_user(author_id)
            .await?
            .ok_or(AppError::NotFound)?;

        let uploaded = match img {
            Some(img) => match self.media.upload(&img).await {
                Ok(uploaded) => Some(uploaded),
                Err(error) => {
                    tracing::error!(author_id = %author_id, %error, "Failed to upload post image");
                    return Err(AppError::Storage("Failed to upload post image".to_string()));
                }
            },
            None => None,
        };

        let post = Post::new(
            author_id,
            text,
            uploaded.as_ref().map(|asset| asset.secure_url.clone()),
        );
        if let Err(error) = self.db.insert_post(&post).await {
            if let Some(asset) = &uploaded {
                self.destroy_quietly(&asset.asset_id).await;
            }
            return Err(error);
        }

        POST_WRITES_TOTAL.with_label_values(&["created"]).inc();
        tracing::info!(post_id = %post.id, author_id = %author_id, "Post created");

        Ok(PostWithAuthor {
            post,
            author_username: Some(author.username),
            author_full_name: Some(author.full_name),
            author_profile_img: author.profile_img,
        })
    }

    /// Delete one of the actor's own posts, and its image
    ///
    /// # Errors
    /// * `Missing` - no such post
    /// * `Forbidden` - the post belongs to someone else
    pub async fn delete_post(&self, actor_id: &str, post_id: &str) -> Result<(), AppError> {
        let post = self
            .db
            .get_post(post_id)
            .await?
            .ok_or(AppError::Missing(POST_NOT_FOUND))?;

        if post.user_id != actor_id {
            return Err(AppError::Forbidden(
                "You are not authorized to delete this post".to_string(),
            ));
        }

        if !self.db.delete_post(post_id).await? {
            return Err(AppError::Missing(POST_NOT_FOUND));
        }

        if let Some(asset_id) = post.img.as_deref().and_then(asset_id_from_url) {
            self.destroy_quietly(&asset_id).await;
        }

        POST_WRITES_TOTAL.with_label_values(&["deleted"]).inc();
        tracing::info!(post_id = %post_id, author_id = %actor_id, "Post deleted");

        Ok(())
    }

    /// Every post, newest first
    pub async fn all_posts(&self) -> Result<Vec<PostWithAuthor>, AppError> {
        self.db.list_posts().await
    }

    /// Posts by the users `user_id` follows, newest first
    pub async fn following_posts(&self, user_id: &str) -> Result<Vec<PostWithAuthor>, AppError> {
        let user = self.db.get_user(user_id).await?.ok_or(AppError::NotFound)?;
        if user.following.is_empty() {
            return Ok(Vec::new());
        }
        self.db.list_posts_by_authors(&user.following).await
    }

    /// Posts written by `username`, newest first
    ///
    /// Surrounding whitespace in `username` is ignored.
    pub async fn user_posts(&self, username: &str) -> Result<Vec<PostWithAuthor>, AppError> {
        let user = self
            .db
            .get_user_by_username(username.trim())
            .await?
            .ok_or(AppError::NotFound)?;
        self.db.list_posts_by_authors(&[user.id]).await
    }

    /// Posts `user_id` has liked, newest first
    pub async fn liked_posts(&self, user_id: &str) -> Result<Vec<PostWithAuthor>, AppError> {
        self.db.get_user(user_id).await?.ok_or(AppError::NotFound)?;
        self.db.list_posts_liked_by(user_id).await
    }

    /// Like `post_id` if `actor_id` has not liked it yet, otherwise unlike
    ///
    /// A like on someone else's post notifies the author once; liking
    /// your own post and unliking notify nobody.
    ///
    /// # Errors
    /// * `Missing` - no such post
    /// * `NotFound` - the actor does not exist
    pub async fn toggle_like(&self, actor_id: &str, post_id: &str) -> Result<LikeToggle, AppError> {
        let (post, actor) = tokio::try_join!(self.db.get_post(post_id), self.db.get_user(actor_id))?;
        let post = post.ok_or(AppError::Missing(POST_NOT_FOUND))?;
        actor.ok_or(AppError::NotFound)?;

        let outcome = if post.is_liked_by(actor_id) {
            self.db.remove_post_like(post_id, actor_id).await?;
            LikeOutcome::Unliked
        } else {
            let added = self.db.add_post_like(post_id, actor_id).await?;
            if added && post.user_id != actor_id {
                let notification = Notification::new(NotificationType::Like, actor_id, &post.user_id);
                self.db.insert_notification(&notification).await?;
                NOTIFICATIONS_CREATED_TOTAL
                    .with_label_values(&[NotificationType::Like.as_str()])
                    .inc();
            }
            LikeOutcome::Liked
        };

        let likes = self
            .db
            .get_post(post_id)
            .await?
            .ok_or(AppError::Missing(POST_NOT_FOUND))?
            .likes;

        LIKE_TOGGLES_TOTAL
            .with_label_values(&[outcome.as_str()])
            .inc();
        tracing::info!(
            actor_id = %actor_id,
            post_id = %post_id,
            outcome = outcome.as_str(),
            "Like toggled"
        );

        Ok(LikeToggle { outcome, likes })
    }

    async fn destroy_quietly(&self, asset_id: &str) {
        if let Err(error) = self.media.destroy(asset_id).await {
            tracing::warn!(asset_id = %asset_id, %error, "failed to delete post image from media host");
        }
    }
}

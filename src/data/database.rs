//! SQLite database operations
//!
//! All database access goes through this module.
//! Every write touches exactly one row, so each statement is atomic
//! on its own; callers that need two rows updated issue two writes.

use chrono::Utc;
use sqlx::{Pool, Sqlite, SqlitePool};
use std::path::Path;

use super::models::*;
use crate::error::AppError;

/// Map a unique-constraint violation to a client-facing validation error.
fn map_unique_violation(error: sqlx::Error, message: &str) -> AppError {
    match &error {
        sqlx::Error::Database(db_error) if db_error.is_unique_violation() => {
            AppError::Validation(message.to_string())
        }
        _ => AppError::Database(error),
    }
}

/// Post columns plus the author's public fields; callers append WHERE/ORDER BY.
const POST_WITH_AUTHOR_SELECT: &str = r#"
    SELECT p.id, p.user_id, p.text, p.img, p.likes, p.created_at, p.updated_at,
           u.username AS author_username, u.full_name AS author_full_name,
           u.profile_img AS author_profile_img
    FROM posts p
    LEFT JOIN users u ON u.id = p.user_id
"#;

/// Database connection pool wrapper.
pub struct Database {
    pool: Pool<Sqlite>,
}

impl Database {
    // =========================================================================
    // Connection
    // =========================================================================

    /// Connect to SQLite database
    ///
    /// Creates the database file if it doesn't exist.
    /// Runs pending migrations automatically.
    ///
    /// # Errors
    /// Returns error if connection or migration fails
    pub async fn connect(path: &Path) -> Result<Self, AppError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| AppError::Database(sqlx::Error::Io(e)))?;
        }

        let connection_string = format!("sqlite:{}?mode=rwc", path.display());
        let pool = SqlitePool::connect(&connection_string).await?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| {
                tracing::error!("Migration failed: {}", e);
                AppError::Internal(anyhow::anyhow!("Migration failed: {}", e))
            })?;

        tracing::info!("Database connected and migrated successfully");

        Ok(Self { pool })
    }

    /// Raw pool, for tests that need to shape the schema
    #[cfg(test)]
    pub(crate) fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    // =========================================================================
    // Users
    // =========================================================================

    /// Insert a newly registered user
    ///
    /// # Errors
    /// `Validation` if the username or email is already taken
    pub async fn insert_user(&self, user: &User) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO users (
                id, username, full_name, email, password_hash, bio, link,
                profile_img, cover_img, followers, following, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&user.id)
        .bind(&user.username)
        .bind(&user.full_name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.bio)
        .bind(&user.link)
        .bind(&user.profile_img)
        .bind(&user.cover_img)
        .bind(sqlx::types::Json(&user.followers))
        .bind(sqlx::types::Json(&user.following))
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, "Username or email is already taken"))?;

        Ok(())
    }

    /// Get user by ID
    pub async fn get_user(&self, id: &str) -> Result<Option<User>, AppError> {
        let row = sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(User::from))
    }

    /// Get user by exact username
    pub async fn get_user_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        let row = sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE username = ?")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(User::from))
    }

    /// Get user by exact email
    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let row = sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE email = ?")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(User::from))
    }

    /// Persist the profile fields of a user in one statement
    ///
    /// Relationship lists are deliberately not written here; they are
    /// owned by [`Database::add_to_relation`] and
    /// [`Database::remove_from_relation`].
    ///
    /// # Returns
    /// `false` if no row matched the user ID
    pub async fn update_user_profile(&self, user: &User) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET username = ?, full_name = ?, email = ?, password_hash = ?,
                bio = ?, link = ?, profile_img = ?, cover_img = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&user.username)
        .bind(&user.full_name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.bio)
        .bind(&user.link)
        .bind(&user.profile_img)
        .bind(&user.cover_img)
        .bind(user.updated_at)
        .bind(&user.id)
        .execute(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, "Username or email is already taken"))?;

        Ok(result.rows_affected() > 0)
    }

    /// Append `member` to one relationship list of a user
    ///
    /// Set semantics: an ID already present is left alone.
    ///
    /// # Returns
    /// `true` if the list changed
    pub async fn add_to_relation(
        &self,
        user_id: &str,
        list: RelationList,
        member: &str,
    ) -> Result<bool, AppError> {
        let column = list.column();
        let sql = format!(
            r#"
            UPDATE users
            SET {column} = json_insert({column}, '$[#]', ?), updated_at = ?
            WHERE id = ?
              AND NOT EXISTS (
                  SELECT 1 FROM json_each(users.{column}) WHERE json_each.value = ?
              )
            "#
        );

        let result = sqlx::query(&sql)
            .bind(member)
            .bind(Utc::now())
            .bind(user_id)
            .bind(member)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Remove every occurrence of `member` from one relationship list
    ///
    /// # Returns
    /// `true` if the user row exists
    pub async fn remove_from_relation(
        &self,
        user_id: &str,
        list: RelationList,
        member: &str,
    ) -> Result<bool, AppError> {
        let column = list.column();
        let sql = format!(
            r#"
            UPDATE users
            SET {column} = (
                    SELECT json_group_array(json_each.value)
                    FROM json_each(users.{column})
                    WHERE json_each.value != ?
                ),
                updated_at = ?
            WHERE id = ?
            "#
        );

        let result = sqlx::query(&sql)
            .bind(member)
            .bind(Utc::now())
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Randomly sample users outside an exclusion set
    ///
    /// # Arguments
    /// * `exclude_id` - Caller's own ID
    /// * `excluded` - IDs the caller already follows
    /// * `limit` - Sample size
    pub async fn sample_users_excluding(
        &self,
        exclude_id: &str,
        excluded: &[String],
        limit: usize,
    ) -> Result<Vec<User>, AppError> {
        let rows = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT * FROM users
            WHERE id != ?
              AND id NOT IN (SELECT json_each.value FROM json_each(?))
            ORDER BY RANDOM()
            LIMIT ?
            "#,
        )
        .bind(exclude_id)
        .bind(sqlx::types::Json(excluded))
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(User::from).collect())
    }

    // =========================================================================
    // Posts
    // =========================================================================

    /// Insert post
    pub async fn insert_post(&self, post: &Post) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO posts (id, user_id, text, img, likes, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&post.id)
        .bind(&post.user_id)
        .bind(&post.text)
        .bind(&post.img)
        .bind(sqlx::types::Json(&post.likes))
        .bind(post.created_at)
        .bind(post.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Get post by ID
    pub async fn get_post(&self, id: &str) -> Result<Option<Post>, AppError> {
        let row = sqlx::query_as::<_, PostRow>("SELECT * FROM posts WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Post::from))
    }

    /// Delete post
    ///
    /// # Returns
    /// `false` if no row matched
    pub async fn delete_post(&self, id: &str) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM posts WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Add `user_id` to a post's likes; a repeated like is a no-op
    ///
    /// # Returns
    /// `true` if the list changed
    pub async fn add_post_like(&self, post_id: &str, user_id: &str) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE posts
            SET likes = json_insert(likes, '$[#]', ?), updated_at = ?
            WHERE id = ?
              AND NOT EXISTS (
                  SELECT 1 FROM json_each(posts.likes) WHERE json_each.value = ?
              )
            "#,
        )
        .bind(user_id)
        .bind(Utc::now())
        .bind(post_id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Remove `user_id` from a post's likes
    ///
    /// # Returns
    /// `true` if the post exists
    pub async fn remove_post_like(&self, post_id: &str, user_id: &str) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE posts
            SET likes = (
                    SELECT json_group_array(json_each.value)
                    FROM json_each(posts.likes)
                    WHERE json_each.value != ?
                ),
                updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(user_id)
        .bind(Utc::now())
        .bind(post_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Every post, newest first
    pub async fn list_posts(&self) -> Result<Vec<PostWithAuthor>, AppError> {
        let sql = format!("{POST_WITH_AUTHOR_SELECT} ORDER BY p.created_at DESC, p.id DESC");
        let rows = sqlx::query_as::<_, PostWithAuthorRow>(&sql)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(PostWithAuthor::from).collect())
    }

    /// Posts written by any of `author_ids`, newest first
    pub async fn list_posts_by_authors(
        &self,
        author_ids: &[String],
    ) -> Result<Vec<PostWithAuthor>, AppError> {
        let sql = format!(
            "{POST_WITH_AUTHOR_SELECT} \
             WHERE p.user_id IN (SELECT json_each.value FROM json_each(?)) \
             ORDER BY p.created_at DESC, p.id DESC"
        );
        let rows = sqlx::query_as::<_, PostWithAuthorRow>(&sql)
            .bind(sqlx::types::Json(author_ids))
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(PostWithAuthor::from).collect())
    }

    /// Posts whose likes contain `user_id`, newest first
    pub async fn list_posts_liked_by(&self, user_id: &str) -> Result<Vec<PostWithAuthor>, AppError> {
        let sql = format!(
            "{POST_WITH_AUTHOR_SELECT} \
             WHERE EXISTS (SELECT 1 FROM json_each(p.likes) WHERE json_each.value = ?) \
             ORDER BY p.created_at DESC, p.id DESC"
        );
        let rows = sqlx::query_as::<_, PostWithAuthorRow>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(PostWithAuthor::from).collect())
    }

    // =========================================================================
    // Notifications
    // =========================================================================

    /// Insert notification
    pub async fn insert_notification(&self, notification: &Notification) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO notifications (
                id, notification_type, from_user_id, to_user_id, read, created_at
            ) VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&notification.id)
        .bind(&notification.notification_type)
        .bind(&notification.from_user_id)
        .bind(&notification.to_user_id)
        .bind(notification.read)
        .bind(notification.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Get notifications addressed to a user, newest first, with sender fields
    pub async fn get_notifications_for(
        &self,
        to_user_id: &str,
    ) -> Result<Vec<NotificationWithSender>, AppError> {
        let notifications = sqlx::query_as::<_, NotificationWithSender>(
            r#"
            SELECT n.id, n.notification_type, n.from_user_id, n.to_user_id, n.read,
                   n.created_at, u.username AS from_username,
                   u.profile_img AS from_profile_img
            FROM notifications n
            LEFT JOIN users u ON u.id = n.from_user_id
            WHERE n.to_user_id = ?
            ORDER BY n.created_at DESC, n.id DESC
            "#,
        )
        .bind(to_user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(notifications)
    }

    /// Mark all of a user's notifications as read
    pub async fn mark_notifications_read(&self, to_user_id: &str) -> Result<u64, AppError> {
        let result = sqlx::query("UPDATE notifications SET read = 1 WHERE to_user_id = ? AND read = 0")
            .bind(to_user_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    /// Delete all of a user's notifications
    pub async fn delete_notifications_for(&self, to_user_id: &str) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM notifications WHERE to_user_id = ?")
            .bind(to_user_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    /// Count unread notifications for a user
    pub async fn count_unread_notifications(&self, to_user_id: &str) -> Result<i64, AppError> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM notifications WHERE to_user_id = ? AND read = 0",
        )
        .bind(to_user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }
}

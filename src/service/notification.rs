//! Notification service
//!
//! Notifications are written by other services (follow toggles) and only
//! read, acknowledged or cleared here.

use std::sync::Arc;

use crate::data::{Database, NotificationWithSender};
use crate::error::AppError;

/// Notification service
pub struct NotificationService {
    db: Arc<Database>,
}

impl NotificationService {
    /// Create new notification service
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// List a user's notifications, newest first, then mark them all read
    ///
    /// The returned records carry the read state from before this call.
    pub async fn list_notifications(
        &self,
        user_id: &str,
    ) -> Result<Vec<NotificationWithSender>, AppError> {
        let notifications = self.db.get_notifications_for(user_id).await?;
        let marked = self.db.mark_notifications_read(user_id).await?;
        tracing::debug!(user_id = %user_id, marked, "Notifications marked read");
        Ok(notifications)
    }

    /// Delete every notification addressed to a user
    pub async fn delete_notifications(&self, user_id: &str) -> Result<u64, AppError> {
        let deleted = self.db.delete_notifications_for(user_id).await?;
        tracing::info!(user_id = %user_id, deleted, "Notifications deleted");
        Ok(deleted)
    }

    pub async fn unread_count(&self, user_id: &str) -> Result<i64, AppError> {
        self.db.count_unread_notifications(user_id).await
    }
}

//! Follow-graph service
//!
//! Toggles the directed "follows" edge between two users. An edge lives
//! in two places: the actor's `following` list and the target's
//! `followers` list. Both sides are written as independent single-row
//! updates issued concurrently. Both writes always run to completion
//! before the first error, if any, is reported. There is no cross-row
//! transaction, so a failure of one write can leave the pair out of
//! step until the next toggle.

use std::sync::Arc;

use crate::data::{Database, Notification, NotificationType, RelationList};
use crate::error::AppError;
use crate::metrics::{FOLLOW_TOGGLES_TOTAL, NOTIFICATIONS_CREATED_TOTAL};

/// Which branch a toggle took
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FollowOutcome {
    Followed,
    Unfollowed,
}

impl FollowOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Followed => "followed",
            Self::Unfollowed => "unfollowed",
        }
    }

    /// Human-readable confirmation for API responses
    pub fn message(&self) -> &'static str {
        match self {
            Self::Followed => "User followed successfully",
            Self::Unfollowed => "User unfollowed successfully",
        }
    }
}

/// Follow-graph service
pub struct FollowService {
    db: Arc<Database>,
}

impl FollowService {
    /// Create new follow service
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Follow `target_id` if `actor_id` does not follow it yet, otherwise unfollow
    ///
    /// Calling this twice in a row follows and then unfollows; it is not
    /// an "ensure followed" operation.
    ///
    /// A follow creates exactly one `follow` notification for the target.
    /// An unfollow creates none.
    ///
    /// # Errors
    /// * `Validation` - actor and target are the same user
    /// * `NotFound` - either user does not exist
    pub async fn toggle_follow(
        &self,
        actor_id: &str,
        target_id: &str,
    ) -> Result<FollowOutcome, AppError> {
        if actor_id == target_id {
            return Err(AppError::Validation(
                "You can't follow/unfollow yourself".to_string(),
            ));
        }

        let (target, actor) = tokio::try_join!(self.db.get_user(target_id), self.db.get_user(actor_id))?;
        let (Some(_target), Some(actor)) = (target, actor) else {
            return Err(AppError::NotFound);
        };

        let outcome = if actor.is_following(target_id) {
            let (followers_write, following_write) = tokio::join!(
                self.db
                    .remove_from_relation(target_id, RelationList::Followers, actor_id),
                self.db
                    .remove_from_relation(actor_id, RelationList::Following, target_id),
            );
            followers_write?;
            following_write?;
            FollowOutcome::Unfollowed
        } else {
            let (followers_write, following_write) = tokio::join!(
                self.db
                    .add_to_relation(target_id, RelationList::Followers, actor_id),
                self.db
                    .add_to_relation(actor_id, RelationList::Following, target_id),
            );
            followers_write?;
            following_write?;

            let notification = Notification::new(NotificationType::Follow, actor_id, target_id);
            self.db.insert_notification(&notification).await?;
            NOTIFICATIONS_CREATED_TOTAL
                .with_label_values(&[NotificationType::Follow.as_str()])
                .inc();

            FollowOutcome::Followed
        };

        FOLLOW_TOGGLES_TOTAL
            .with_label_values(&[outcome.as_str()])
            .inc();
        tracing::info!(
            actor_id = %actor_id,
            target_id = %target_id,
            outcome = outcome.as_str(),
            "Follow toggled"
        );

        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::User;
    use tempfile::TempDir;

    async fn create_test_db() -> (Arc<Database>, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("service-follow.db");
        let db = Database::connect(&db_path).await.unwrap();
        (Arc::new(db), temp_dir)
    }

    async fn seed_user(db: &Database, username: &str) -> User {
        let user = User::new(
            username.to_string(),
            username.to_uppercase(),
            format!("{username}@example.com"),
            "unused-hash".to_string(),
        );
        db.insert_user(&user).await.unwrap();
        user
    }

    async fn reload(db: &Database, user: &User) -> User {
        db.get_user(&user.id).await.unwrap().unwrap()
    }

    #[tokio::test]
    async fn follow_updates_both_sides_and_notifies() {
        let (db, _temp_dir) = create_test_db().await;
        let service = FollowService::new(db.clone());
        let alice = seed_user(&db, "alice").await;
        let bob = seed_user(&db, "bob").await;

        let outcome = service.toggle_follow(&alice.id, &bob.id).await.unwrap();
        assert_eq!(outcome, FollowOutcome::Followed);

        assert_eq!(reload(&db, &alice).await.following, vec![bob.id.clone()]);
        assert_eq!(reload(&db, &bob).await.followers, vec![alice.id.clone()]);

        let notifications = db.get_notifications_for(&bob.id).await.unwrap();
        assert_eq!(notifications.len(), 1);
        assert_eq!(notifications[0].notification_type, "follow");
        assert_eq!(notifications[0].from_user_id, alice.id);
        assert_eq!(notifications[0].to_user_id, bob.id);
    }

    #[tokio::test]
    async fn second_toggle_unfollows_without_notification() {
        let (db, _temp_dir) = create_test_db().await;
        let service = FollowService::new(db.clone());
        let alice = seed_user(&db, "alice").await;
        let bob = seed_user(&db, "bob").await;

        service.toggle_follow(&alice.id, &bob.id).await.unwrap();
        let outcome = service.toggle_follow(&alice.id, &bob.id).await.unwrap();
        assert_eq!(outcome, FollowOutcome::Unfollowed);

        assert!(reload(&db, &alice).await.following.is_empty());
        assert!(reload(&db, &bob).await.followers.is_empty());
        assert_eq!(db.get_notifications_for(&bob.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn self_follow_is_rejected_without_writes() {
        let (db, _temp_dir) = create_test_db().await;
        let service = FollowService::new(db.clone());
        let alice = seed_user(&db, "alice").await;

        let error = service
            .toggle_follow(&alice.id, &alice.id)
            .await
            .unwrap_err();
        assert!(matches!(error, AppError::Validation(_)));

        let stored = reload(&db, &alice).await;
        assert!(stored.following.is_empty());
        assert!(stored.followers.is_empty());
        assert!(db.get_notifications_for(&alice.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn missing_target_is_not_found_without_writes() {
        let (db, _temp_dir) = create_test_db().await;
        let service = FollowService::new(db.clone());
        let alice = seed_user(&db, "alice").await;

        let error = service
            .toggle_follow(&alice.id, "01HZZZZZZZZZZZZZZZZZZZZZZZ")
            .await
            .unwrap_err();
        assert!(matches!(error, AppError::NotFound));
        assert!(reload(&db, &alice).await.following.is_empty());

        let error = service
            .toggle_follow("01HZZZZZZZZZZZZZZZZZZZZZZZ", &alice.id)
            .await
            .unwrap_err();
        assert!(matches!(error, AppError::NotFound));
        assert!(reload(&db, &alice).await.followers.is_empty());
    }

    #[tokio::test]
    async fn failed_followers_write_still_completes_following_write() {
        let (db, _temp_dir) = create_test_db().await;
        let service = FollowService::new(db.clone());
        let alice = seed_user(&db, "alice").await;
        let bob = seed_user(&db, "bob").await;

        let trigger = format!(
            "CREATE TRIGGER refuse_bob_followers BEFORE UPDATE OF followers ON users \
             WHEN NEW.id = '{}' BEGIN SELECT RAISE(ABORT, 'followers write refused'); END",
            bob.id
        );
        sqlx::query(&trigger).execute(db.pool()).await.unwrap();

        let error = service.toggle_follow(&alice.id, &bob.id).await.unwrap_err();
        assert!(matches!(error, AppError::Database(_)));

        assert_eq!(reload(&db, &alice).await.following, vec![bob.id.clone()]);
        assert!(reload(&db, &bob).await.followers.is_empty());
        assert!(db.get_notifications_for(&bob.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn follow_follow_unfollow_scenario() {
        let (db, _temp_dir) = create_test_db().await;
        let service = FollowService::new(db.clone());
        let a = seed_user(&db, "a").await;
        let b = seed_user(&db, "b").await;
        let c = seed_user(&db, "c").await;

        service.toggle_follow(&a.id, &b.id).await.unwrap();
        service.toggle_follow(&a.id, &c.id).await.unwrap();
        let total_notifications = db.get_notifications_for(&b.id).await.unwrap().len()
            + db.get_notifications_for(&c.id).await.unwrap().len();
        assert_eq!(total_notifications, 2);

        let outcome = service.toggle_follow(&a.id, &b.id).await.unwrap();
        assert_eq!(outcome, FollowOutcome::Unfollowed);

        let total_notifications = db.get_notifications_for(&b.id).await.unwrap().len()
            + db.get_notifications_for(&c.id).await.unwrap().len();
        assert_eq!(total_notifications, 2);
        assert_eq!(reload(&db, &a).await.following, vec![c.id.clone()]);
        assert!(reload(&db, &b).await.followers.is_empty());
        assert_eq!(reload(&db, &c).await.followers, vec![a.id.clone()]);
    }
}

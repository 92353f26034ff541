//! Suggested-users service

use std::sync::Arc;

use crate::data::{Database, User};
use crate::error::AppError;

/// How many candidates are drawn from the store per request
const SAMPLE_SIZE: usize = 10;

/// How many suggestions are returned at most
const SUGGESTION_LIMIT: usize = 4;

/// Suggested-users service
pub struct SuggestionService {
    db: Arc<Database>,
}

impl SuggestionService {
    /// Create new suggestion service
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Suggest up to four users the caller might want to follow
    ///
    /// Never includes the caller or anyone the caller already follows.
    /// The selection is random. An unknown caller is treated as following
    /// nobody.
    pub async fn suggest_users(&self, caller_id: &str) -> Result<Vec<User>, AppError> {
        let following = self
            .db
            .get_user(caller_id)
            .await?
            .map(|caller| caller.following)
            .unwrap_or_default();

        let mut candidates = self
            .db
            .sample_users_excluding(caller_id, &following, SAMPLE_SIZE)
            .await?;
        candidates.retain(|candidate| candidate.id != caller_id && !following.contains(&candidate.id));
        candidates.truncate(SUGGESTION_LIMIT);

        tracing::debug!(caller_id = %caller_id, count = candidates.len(), "Suggested users");
        Ok(candidates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::RelationList;
    use std::collections::HashSet;
    use tempfile::TempDir;

    async fn create_test_db() -> (Arc<Database>, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("service-suggestion.db");
        let db = Database::connect(&db_path).await.unwrap();
        (Arc::new(db), temp_dir)
    }

    async fn seed_users(db: &Database, count: usize) -> Vec<User> {
        let mut users = Vec::with_capacity(count);
        for index in 0..count {
            let user = User::new(
                format!("user{index}"),
                format!("User {index}"),
                format!("user{index}@example.com"),
                "unused-hash".to_string(),
            );
            db.insert_user(&user).await.unwrap();
            users.push(user);
        }
        users
    }

    #[tokio::test]
    async fn excludes_caller_and_followed_users() {
        let (db, _temp_dir) = create_test_db().await;
        let users = seed_users(&db, 12).await;
        let caller = &users[0];
        for followed in &users[1..9] {
            db.add_to_relation(&caller.id, RelationList::Following, &followed.id)
                .await
                .unwrap();
        }
        let eligible: HashSet<&str> = users[9..].iter().map(|u| u.id.as_str()).collect();

        let service = SuggestionService::new(db);
        for _ in 0..5 {
            let suggestions = service.suggest_users(&caller.id).await.unwrap();
            assert_eq!(suggestions.len(), 3);
            assert!(suggestions.iter().all(|s| eligible.contains(s.id.as_str())));
        }
    }

    #[tokio::test]
    async fn caps_result_at_four() {
        let (db, _temp_dir) = create_test_db().await;
        let users = seed_users(&db, 20).await;

        let suggestions = SuggestionService::new(db)
            .suggest_users(&users[0].id)
            .await
            .unwrap();
        assert_eq!(suggestions.len(), 4);

        let unique: HashSet<&str> = suggestions.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(unique.len(), 4);
    }

    #[tokio::test]
    async fn lone_user_gets_nothing() {
        let (db, _temp_dir) = create_test_db().await;
        let users = seed_users(&db, 1).await;

        let suggestions = SuggestionService::new(db)
            .suggest_users(&users[0].id)
            .await
            .unwrap();
        assert!(suggestions.is_empty());
    }

    #[tokio::test]
    async fn unknown_caller_follows_nobody() {
        let (db, _temp_dir) = create_test_db().await;
        seed_users(&db, 3).await;

        let suggestions = SuggestionService::new(db)
            .suggest_users("01HZZZZZZZZZZZZZZZZZZZZZZZ")
            .await
            .unwrap();
        assert_eq!(suggestions.len(), 3);
    }
}

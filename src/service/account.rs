//! Account service
//!
//! Sign-up, credential checks and current-user lookup. Session tokens
//! are minted by the HTTP layer from the user this service returns.

use std::sync::Arc;

use crate::auth::password::{MIN_PASSWORD_LENGTH, hash_password, is_strong_enough, verify_password};
use crate::data::{Database, User};
use crate::error::AppError;
use crate::metrics::SIGNUPS_TOTAL;

/// Sign-up request
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub username: String,
    pub full_name: String,
    pub email: String,
    pub password: String,
}

/// Accepts `local@domain.tld` with no whitespace and a single `@`
fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    match domain.rsplit_once('.') {
        Some((host, tld)) => !host.is_empty() && !tld.is_empty(),
        None => false,
    }
}

fn invalid_credentials() -> AppError {
    AppError::Validation("Invalid username or password".to_string())
}

/// Account service
pub struct AccountService {
    db: Arc<Database>,
}

impl AccountService {
    /// Create new account service
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Register a new user
    ///
    /// # Errors
    /// `Validation` for a malformed email, a taken username or email, a
    /// blank username or full name, or a short password
    pub async fn signup(&self, request: NewAccount) -> Result<User, AppError> {
        let username = request.username.trim();
        let full_name = request.full_name.trim();
        let email = request.email.trim();

        if username.is_empty() || full_name.is_empty() {
            return Err(AppError::Validation(
                "Username and full name are required".to_string(),
            ));
        }
        if !is_valid_email(email) {
            return Err(AppError::Validation("Invalid email format".to_string()));
        }

        let (by_username, by_email) = tokio::try_join!(
            self.db.get_user_by_username(username),
            self.db.get_user_by_email(email),
        )?;
        if by_username.is_some() {
            return Err(AppError::Validation("Username is already taken".to_string()));
        }
        if by_email.is_some() {
            return Err(AppError::Validation("Email is already taken".to_string()));
        }

        if !is_strong_enough(&request.password) {
            return Err(AppError::Validation(format!(
                "Password must be at least {} characters long",
                MIN_PASSWORD_LENGTH
            )));
        }

        let password_hash = hash_password(&request.password).await?;
        let user = User::new(
            username.to_string(),
            full_name.to_string(),
            email.to_string(),
            password_hash,
        );
        // The unique indexes still guard against a concurrent sign-up.
        self.db.insert_user(&user).await?;

        SIGNUPS_TOTAL.inc();
        tracing::info!(user_id = %user.id, username = %user.username, "User signed up");

        Ok(user)
    }

    /// Check a username/password pair
    ///
    /// Unknown usernames and wrong passwords are indistinguishable.
    pub async fn login(&self, username: &str, password: &str) -> Result<User, AppError> {
        let Some(user) = self.db.get_user_by_username(username.trim()).await? else {
            return Err(invalid_credentials());
        };

        if !verify_password(password, &user.password_hash).await? {
            tracing::debug!(username = %user.username, "Rejected login");
            return Err(invalid_credentials());
        }

        tracing::info!(user_id = %user.id, "User logged in");
        Ok(user)
    }

    /// Get the signed-in user
    pub async fn me(&self, user_id: &str) -> Result<User, AppError> {
        self.db.get_user(user_id).await?.ok_or(AppError::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn create_test_service() -> (AccountService, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("service-account.db");
        let db = Database::connect(&db_path).await.unwrap();
        (AccountService::new(Arc::new(db)), temp_dir)
    }

    fn new_account(username: &str, email: &str, password: &str) -> NewAccount {
        NewAccount {
            username: username.to_string(),
            full_name: "Test User".to_string(),
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    #[test]
    fn email_shape() {
        assert!(is_valid_email("a@b.co"));
        assert!(is_valid_email("first.last@mail.example.com"));
        assert!(!is_valid_email("no-at-sign.com"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("user@localhost"));
        assert!(!is_valid_email("user@.com"));
        assert!(!is_valid_email("user@example."));
        assert!(!is_valid_email("us er@example.com"));
        assert!(!is_valid_email("a@b@c.com"));
    }

    #[tokio::test]
    async fn signup_then_login() {
        let (service, _temp_dir) = create_test_service().await;
        let user = service
            .signup(new_account(" alice ", "alice@example.com", "secret1"))
            .await
            .unwrap();
        assert_eq!(user.username, "alice");
        assert!(user.followers.is_empty());
        assert!(user.following.is_empty());
        assert_ne!(user.password_hash, "secret1");

        let logged_in = service.login("alice", "secret1").await.unwrap();
        assert_eq!(logged_in.id, user.id);

        let me = service.me(&user.id).await.unwrap();
        assert_eq!(me.email, "alice@example.com");
    }

    #[tokio::test]
    async fn signup_rejects_duplicates_and_short_passwords() {
        let (service, _temp_dir) = create_test_service().await;
        service
            .signup(new_account("alice", "alice@example.com", "secret1"))
            .await
            .unwrap();

        for request in [
            new_account("alice", "other@example.com", "secret1"),
            new_account("other", "alice@example.com", "secret1"),
            new_account("bob", "bob@example.com", "12345"),
            new_account("carol", "not-an-email", "secret1"),
        ] {
            let error = service.signup(request).await.unwrap_err();
            assert!(matches!(error, AppError::Validation(_)));
        }
    }

    #[tokio::test]
    async fn login_failures_share_one_message() {
        let (service, _temp_dir) = create_test_service().await;
        service
            .signup(new_account("alice", "alice@example.com", "secret1"))
            .await
            .unwrap();

        for (username, password) in [("alice", "wrong-pass"), ("nobody", "secret1")] {
            let error = service.login(username, password).await.unwrap_err();
            assert!(
                matches!(error, AppError::Validation(message) if message == "Invalid username or password")
            );
        }
    }

    #[tokio::test]
    async fn me_for_unknown_user_is_not_found() {
        let (service, _temp_dir) = create_test_service().await;
        let error = service.me("01HZZZZZZZZZZZZZZZZZZZZZZZ").await.unwrap_err();
        assert!(matches!(error, AppError::NotFound));
    }
}

//! Session management
//!
//! Uses HMAC-signed tokens stored in cookies.
//! No server-side session storage needed.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// User session data
///
/// Stored in a signed cookie or sent as a bearer token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// ID of the signed-in user
    pub user_id: String,
    /// Username at sign-in time
    pub username: String,
    /// When session was created
    pub created_at: DateTime<Utc>,
    /// When session expires
    pub expires_at: DateTime<Utc>,
}

impl Session {
    /// Start a session for a user lasting `max_age_seconds`
    pub fn new(user_id: &str, username: &str, max_age_seconds: i64) -> Self {
        let now = Utc::now();
        Self {
            user_id: user_id.to_string(),
            username: username.to_string(),
            created_at: now,
            expires_at: now + Duration::seconds(max_age_seconds),
        }
    }

    /// Check if session is expired
    pub fn is_expired(&self) -> bool {
        self.expires_at < Utc::now()
    }
}

/// Create a signed session token
///
/// Token format: base64(payload).base64(hmac_sha256(payload))
///
/// # Arguments
/// * `session` - Session data to encode
/// * `secret` - HMAC secret key
///
/// # Returns
/// Signed token string
pub fn create_session_token(session: &Session, secret: &str) -> Result<String, AppError> {
    use base64::{Engine as _, engine::general_purpose};
    use hmac::{Hmac, Mac};
    use sha2::Sha256;

    let payload = serde_json::to_string(session).map_err(|e| AppError::Internal(e.into()))?;
    let payload_b64 = general_purpose::URL_SAFE_NO_PAD.encode(payload.as_bytes());

    type HmacSha256 = Hmac<Sha256>;
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| AppError::Encryption(e.to_string()))?;
    mac.update(payload_b64.as_bytes());
    let signature = mac.finalize().into_bytes();
    let signature_b64 = general_purpose::URL_SAFE_NO_PAD.encode(signature);

    Ok(format!("{}.{}", payload_b64, signature_b64))
}

/// Verify and decode a session token
///
/// # Errors
/// `Unauthorized` if the signature is invalid, the token is malformed,
/// or the session has expired
pub fn verify_session_token(token: &str, secret: &str) -> Result<Session, AppError> {
    use base64::{Engine as _, engine::general_purpose};
    use hmac::{Hmac, Mac};
    use sha2::Sha256;

    let Some((payload_b64, signature_b64)) = token.split_once('.') else {
        return Err(AppError::Unauthorized);
    };

    type HmacSha256 = Hmac<Sha256>;
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| AppError::Encryption(e.to_string()))?;
    mac.update(payload_b64.as_bytes());

    let expected_signature = general_purpose::URL_SAFE_NO_PAD
        .decode(signature_b64)
        .map_err(|_| AppError::Unauthorized)?;

    mac.verify_slice(&expected_signature)
        .map_err(|_| AppError::Unauthorized)?;

    let payload_bytes = general_purpose::URL_SAFE_NO_PAD
        .decode(payload_b64)
        .map_err(|_| AppError::Unauthorized)?;

    let session: Session =
        serde_json::from_slice(&payload_bytes).map_err(|_| AppError::Unauthorized)?;

    if session.is_expired() {
        return Err(AppError::Unauthorized);
    }

    Ok(session)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret-key-32-bytes-long!!!";

    #[test]
    fn token_round_trip_keeps_identity() {
        let session = Session::new("01HUSER", "alice", 3600);
        let token = create_session_token(&session, SECRET).unwrap();

        let verified = verify_session_token(&token, SECRET).unwrap();
        assert_eq!(verified.user_id, "01HUSER");
        assert_eq!(verified.username, "alice");
    }

    #[test]
    fn tampered_or_foreign_tokens_are_rejected() {
        let session = Session::new("01HUSER", "alice", 3600);
        let token = create_session_token(&session, SECRET).unwrap();

        let other_secret = verify_session_token(&token, "another-secret-that-is-32-bytes!!");
        assert!(matches!(other_secret, Err(AppError::Unauthorized)));

        let forged_payload = create_session_token(&Session::new("01HADMIN", "root", 3600), SECRET)
            .unwrap()
            .split_once('.')
            .map(|(payload, _)| payload.to_string())
            .unwrap();
        let signature = token.split_once('.').map(|(_, sig)| sig).unwrap();
        let forged = format!("{forged_payload}.{signature}");
        assert!(matches!(
            verify_session_token(&forged, SECRET),
            Err(AppError::Unauthorized)
        ));

        assert!(matches!(
            verify_session_token("not-a-token", SECRET),
            Err(AppError::Unauthorized)
        ));
    }

    #[test]
    fn expired_sessions_are_rejected() {
        let session = Session::new("01HUSER", "alice", -1);
        let token = create_session_token(&session, SECRET).unwrap();
        assert!(matches!(
            verify_session_token(&token, SECRET),
            Err(AppError::Unauthorized)
        ));
    }
}

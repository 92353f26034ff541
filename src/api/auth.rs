//! Authentication endpoints
//!
//! Sessions are HMAC-signed tokens carried in an http-only cookie.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use axum_extra::extract::{
    CookieJar,
    cookie::{Cookie, SameSite},
};

use crate::AppState;
use crate::auth::{CurrentUser, SESSION_COOKIE, Session, create_session_token};
use crate::data::User;
use crate::error::AppError;
use crate::metrics::HTTP_REQUEST_DURATION_SECONDS;
use crate::service::AccountService;

use super::converters::user_to_response;
use super::dto::{LoginRequest, MessageResponse, SignupRequest, UserResponse};

/// Create authentication router
///
/// Routes:
/// - POST /signup - Register and sign in
/// - POST /login - Sign in
/// - POST /logout - Clear session cookie
/// - GET /me - Current user
pub fn auth_router() -> Router<AppState> {
    Router::new()
        .route("/signup", post(signup))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/me", get(me))
}

fn build_session_cookie(token: String, state: &AppState) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .secure(state.config.should_use_secure_cookies())
        .same_site(SameSite::Strict)
        .build()
}

fn clear_session_cookie() -> Cookie<'static> {
    let mut cookie = Cookie::build((SESSION_COOKIE, "")).path("/").http_only(true).build();
    cookie.make_removal();
    cookie
}

/// Sign a fresh session for `user` and attach it to the jar
fn start_session(state: &AppState, jar: CookieJar, user: &User) -> Result<CookieJar, AppError> {
    let session = Session::new(&user.id, &user.username, state.config.auth.session_max_age);
    let token = create_session_token(&session, &state.config.auth.session_secret)?;
    Ok(jar.add(build_session_cookie(token, state)))
}

/// POST /api/auth/signup
async fn signup(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(request): Json<SignupRequest>,
) -> Result<impl IntoResponse, AppError> {
    let _timer = HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&["POST", "/api/auth/signup"])
        .start_timer();

    let user = AccountService::new(state.db.clone())
        .signup(request.into())
        .await?;
    let jar = start_session(&state, jar, &user)?;

    Ok((StatusCode::CREATED, jar, Json(user_to_response(&user))))
}

/// POST /api/auth/login
async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(request): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let _timer = HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&["POST", "/api/auth/login"])
        .start_timer();

    let user = AccountService::new(state.db.clone())
        .login(&request.username, &request.password)
        .await?;
    let jar = start_session(&state, jar, &user)?;

    Ok((jar, Json(user_to_response(&user))))
}

/// POST /api/auth/logout
async fn logout(jar: CookieJar) -> impl IntoResponse {
    (
        jar.add(clear_session_cookie()),
        Json(MessageResponse::new("Logged out successfully")),
    )
}

/// GET /api/auth/me
async fn me(
    State(state): State<AppState>,
    CurrentUser(session): CurrentUser,
) -> Result<Json<UserResponse>, AppError> {
    let _timer = HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&["GET", "/api/auth/me"])
        .start_timer();

    let user = AccountService::new(state.db.clone())
        .me(&session.user_id)
        .await?;
    Ok(Json(user_to_response(&user)))
}

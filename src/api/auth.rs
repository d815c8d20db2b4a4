//! Session-based authentication.
//!
//! Sessions are opaque 32-byte tokens handed to the browser in an
//! HttpOnly cookie and stored server-side as a SHA-256 digest with an
//! absolute expiry. Expiry is checked lazily on access, not swept. A
//! second, client-trusted `user_role` cookie exists only for coarse
//! UI-level gating; every privileged operation re-validates the session
//! against the database.
//!
//! Any response that signals an authentication failure also clears both
//! cookies, so a client cannot loop on a cached role claim that no
//! longer matches server state.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::{
    async_trait,
    extract::{FromRequestParts, State},
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use axum_extra::extract::{
    cookie::{Cookie, SameSite},
    CookieJar,
};
use rand::Rng;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

use crate::config::AuthConfig;
use crate::db::{AuthenticatedUser, DbPool, LoginRequest, LoginResponse, RegisterRequest, Role, Session, User};
use crate::AppState;

use super::error::{ApiError, ValidationErrorBuilder};
use super::validation::{validate_email, validate_password};

/// Opaque session identifier, server-validated
pub const SESSION_COOKIE: &str = "session_id";
/// Role hint for the UI; never used for authorization decisions
pub const ROLE_COOKIE: &str = "user_role";

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub user: AuthenticatedUser,
}

/// Hash a password using Argon2
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let hash = argon2.hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

/// Verify a password against a hash
pub fn verify_password(password: &str, hash: &str) -> bool {
    let parsed_hash = match PasswordHash::new(hash) {
        Ok(h) => h,
        Err(_) => return false,
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}

/// Generate a random session token
fn generate_token() -> String {
    let mut rng = rand::rng();
    let bytes: [u8; 32] = rng.random();
    hex::encode(bytes)
}

/// Hash a token for storage
fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

/// Why a request could not be authenticated
#[derive(Debug, Error)]
pub enum AuthFailure {
    #[error("no session token")]
    NoToken,
    #[error("session not found")]
    NotFound,
    #[error("session expired")]
    Expired,
    #[error(transparent)]
    Storage(#[from] sqlx::Error),
}

/// Validate an opaque session token against the session store.
///
/// Invalid and expired records are deleted as a side effect (best-effort,
/// idempotent). All failure reasons are terminal for the request; only
/// `Storage` is a server fault.
pub async fn authenticate_token(
    pool: &DbPool,
    token: Option<&str>,
) -> Result<AuthenticatedUser, AuthFailure> {
    let token = match token {
        Some(t) if !t.is_empty() => t,
        _ => return Err(AuthFailure::NoToken),
    };

    let token_hash = hash_token(token);

    let session = sqlx::query_as::<_, Session>("SELECT * FROM sessions WHERE token_hash = ?")
        .bind(&token_hash)
        .fetch_optional(pool)
        .await?;

    let session = match session {
        Some(s) => s,
        None => {
            // Clear any stale record matching the token; failure ignored
            let _ = sqlx::query("DELETE FROM sessions WHERE token_hash = ?")
                .bind(&token_hash)
                .execute(pool)
                .await;
            return Err(AuthFailure::NotFound);
        }
    };

    let expired = match chrono::DateTime::parse_from_rfc3339(&session.expires_at) {
        Ok(t) => t.with_timezone(&chrono::Utc) < chrono::Utc::now(),
        // An unparseable expiry is treated as already expired
        Err(_) => true,
    };
    if expired {
        let _ = sqlx::query("DELETE FROM sessions WHERE id = ?")
            .bind(&session.id)
            .execute(pool)
            .await;
        return Err(AuthFailure::Expired);
    }

    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
        .bind(&session.user_id)
        .fetch_optional(pool)
        .await?;

    match user {
        Some(user) => Ok(user.into()),
        None => {
            let _ = sqlx::query("DELETE FROM sessions WHERE id = ?")
                .bind(&session.id)
                .execute(pool)
                .await;
            Err(AuthFailure::NotFound)
        }
    }
}

/// Create a session row and return the raw token for the cookie.
pub async fn create_session(
    pool: &DbPool,
    user_id: &str,
    ttl_hours: i64,
) -> Result<String, sqlx::Error> {
    let token = generate_token();
    let token_hash = hash_token(&token);
    let now = chrono::Utc::now();
    let expires_at = (now + chrono::Duration::hours(ttl_hours)).to_rfc3339();

    sqlx::query(
        "INSERT INTO sessions (id, user_id, token_hash, expires_at, created_at) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(Uuid::new_v4().to_string())
    .bind(user_id)
    .bind(&token_hash)
    .bind(&expires_at)
    .bind(now.to_rfc3339())
    .execute(pool)
    .await?;

    Ok(token)
}

fn session_cookie(token: String) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
}

fn role_cookie(role: String) -> Cookie<'static> {
    Cookie::build((ROLE_COOKIE, role))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
}

fn removal_cookie(name: &'static str) -> Cookie<'static> {
    let mut cookie = Cookie::new(name, "");
    cookie.set_path("/");
    cookie.make_removal();
    cookie
}

/// Add removal cookies for the session id and role hint
fn clear_auth_cookies(jar: CookieJar) -> CookieJar {
    jar.add(removal_cookie(SESSION_COOKIE))
        .add(removal_cookie(ROLE_COOKIE))
}

/// Authentication failure response: proper status plus cookie clearing,
/// so stale client credentials cannot trigger retry loops.
#[derive(Debug)]
pub struct AuthRejection {
    status: StatusCode,
    message: String,
}

impl AuthRejection {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    fn forbidden_not_admin() -> Self {
        Self::new(StatusCode::FORBIDDEN, "Admin privileges required")
    }
}

impl From<AuthFailure> for AuthRejection {
    fn from(failure: AuthFailure) -> Self {
        match failure {
            AuthFailure::NoToken => Self::new(StatusCode::UNAUTHORIZED, "No session"),
            AuthFailure::NotFound => Self::new(StatusCode::UNAUTHORIZED, "Invalid session"),
            AuthFailure::Expired => Self::new(StatusCode::UNAUTHORIZED, "Session expired"),
            AuthFailure::Storage(e) => {
                tracing::error!("Session validation failed: {}", e);
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        }
    }
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        let jar = clear_auth_cookies(CookieJar::new());
        (
            self.status,
            jar,
            Json(MessageResponse {
                message: self.message,
            }),
        )
            .into_response()
    }
}

/// Extractor for the current authenticated account
#[async_trait]
impl FromRequestParts<Arc<AppState>> for AuthenticatedUser {
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        let token = jar.get(SESSION_COOKIE).map(|c| c.value().to_string());
        authenticate_token(&state.db, token.as_deref())
            .await
            .map_err(AuthRejection::from)
    }
}

/// Extractor that additionally requires the ADMIN role
pub struct AdminUser(pub AuthenticatedUser);

#[async_trait]
impl FromRequestParts<Arc<AppState>> for AdminUser {
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let user = AuthenticatedUser::from_request_parts(parts, state).await?;
        if !user.is_admin() {
            return Err(AuthRejection::forbidden_not_admin());
        }
        Ok(AdminUser(user))
    }
}

/// Register endpoint - always creates a USER account
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<MessageResponse>), ApiError> {
    let mut errors = ValidationErrorBuilder::new();
    if let Err(e) = validate_email(&request.email) {
        errors.add("email", &e);
    }
    if let Err(e) = validate_password(&request.password) {
        errors.add("password", &e);
    }
    errors.finish()?;

    let email = request.email.trim().to_lowercase();

    let existing = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = ?")
        .bind(&email)
        .fetch_optional(&state.db)
        .await?;
    if existing.is_some() {
        return Err(ApiError::bad_request("This email is already registered"));
    }

    let password_hash = hash_password(&request.password).map_err(|e| {
        tracing::error!("Failed to hash password: {}", e);
        ApiError::internal("Failed to create account")
    })?;

    let now = chrono::Utc::now().to_rfc3339();
    sqlx::query(
        "INSERT INTO users (id, email, password_hash, role, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(Uuid::new_v4().to_string())
    .bind(&email)
    .bind(&password_hash)
    .bind(Role::User.as_str())
    .bind(&now)
    .bind(&now)
    .execute(&state.db)
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse {
            message: "Registration successful".to_string(),
        }),
    ))
}

/// Login endpoint - verifies credentials and issues a session
pub async fn login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(request): Json<LoginRequest>,
) -> Result<(CookieJar, Json<LoginResponse>), ApiError> {
    let mut errors = ValidationErrorBuilder::new();
    if let Err(e) = validate_email(&request.email) {
        errors.add("email", &e);
    }
    if let Err(e) = validate_password(&request.password) {
        errors.add("password", &e);
    }
    errors.finish()?;

    let email = request.email.trim().to_lowercase();

    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = ?")
        .bind(&email)
        .fetch_optional(&state.db)
        .await?;

    let user = user.ok_or_else(|| ApiError::unauthorized("Invalid email or password"))?;

    if !verify_password(&request.password, &user.password_hash) {
        return Err(ApiError::unauthorized("Invalid email or password"));
    }

    let token = create_session(&state.db, &user.id, state.config.auth.session_ttl_hours).await?;

    let jar = jar
        .add(session_cookie(token))
        .add(role_cookie(user.role.clone()));

    Ok((
        jar,
        Json(LoginResponse {
            message: "Login successful".to_string(),
            user: user.into(),
        }),
    ))
}

/// Logout endpoint - deletes the session row and clears cookies.
/// Always 200, even when no valid session was presented.
pub async fn logout(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> (CookieJar, Json<MessageResponse>) {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        let token_hash = hash_token(cookie.value());
        // Best-effort; a missing row is not an error
        let _ = sqlx::query("DELETE FROM sessions WHERE token_hash = ?")
            .bind(&token_hash)
            .execute(&state.db)
            .await;
    }

    (
        clear_auth_cookies(jar),
        Json(MessageResponse {
            message: "Logout successful".to_string(),
        }),
    )
}

/// Current session endpoint. The extractor rejects with a 401 and clears
/// cookies on any invalid, expired, or missing session.
pub async fn me(user: AuthenticatedUser) -> Json<MeResponse> {
    Json(MeResponse { user })
}

/// Ensure the admin account from config exists (startup provisioning;
/// there is no promotion path at runtime).
pub async fn ensure_admin_user(pool: &DbPool, auth: &AuthConfig) -> anyhow::Result<()> {
    let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users WHERE role = ?")
        .bind(Role::Admin.as_str())
        .fetch_one(pool)
        .await?;
    if count.0 > 0 {
        return Ok(());
    }

    let password = match &auth.admin_password {
        Some(p) => p.clone(),
        None => {
            let generated: String = generate_token().chars().take(16).collect();
            tracing::info!("Generated admin password: {}", generated);
            generated
        }
    };

    let password_hash =
        hash_password(&password).map_err(|e| anyhow::anyhow!("Failed to hash password: {}", e))?;
    let email = auth.admin_email.trim().to_lowercase();
    let now = chrono::Utc::now().to_rfc3339();

    sqlx::query(
        "INSERT INTO users (id, email, password_hash, role, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(Uuid::new_v4().to_string())
    .bind(&email)
    .bind(&password_hash)
    .bind(Role::Admin.as_str())
    .bind(&now)
    .bind(&now)
    .execute(pool)
    .await?;

    tracing::info!("Created admin account: {}", email);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::db::test_pool;

    async fn seed_user(pool: &DbPool, email: &str, password: &str) -> String {
        let id = Uuid::new_v4().to_string();
        let now = chrono::Utc::now().to_rfc3339();
        sqlx::query(
            "INSERT INTO users (id, email, password_hash, role, created_at, updated_at)
             VALUES (?, ?, ?, 'USER', ?, ?)",
        )
        .bind(&id)
        .bind(email)
        .bind(hash_password(password).unwrap())
        .bind(&now)
        .bind(&now)
        .execute(pool)
        .await
        .unwrap();
        id
    }

    async fn session_count(pool: &DbPool) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM sessions")
            .fetch_one(pool)
            .await
            .unwrap()
    }

    #[test]
    fn test_password_hash_roundtrip() {
        let hash = hash_password("hunter2!").unwrap();
        assert!(verify_password("hunter2!", &hash));
        assert!(!verify_password("hunter3!", &hash));
        assert!(!verify_password("hunter2!", "not-a-phc-string"));
    }

    #[test]
    fn test_token_hash_is_deterministic_and_opaque() {
        let token = generate_token();
        assert_eq!(token.len(), 64);
        assert_eq!(hash_token(&token), hash_token(&token));
        assert_ne!(hash_token(&token), token);
    }

    #[tokio::test]
    async fn test_no_token_rejected() {
        let pool = test_pool().await;
        let err = authenticate_token(&pool, None).await.unwrap_err();
        assert!(matches!(err, AuthFailure::NoToken));

        let err = authenticate_token(&pool, Some("")).await.unwrap_err();
        assert!(matches!(err, AuthFailure::NoToken));
    }

    #[tokio::test]
    async fn test_unknown_token_rejected() {
        let pool = test_pool().await;
        let err = authenticate_token(&pool, Some("bogus")).await.unwrap_err();
        assert!(matches!(err, AuthFailure::NotFound));
    }

    #[tokio::test]
    async fn test_valid_session_authenticates() {
        let pool = test_pool().await;
        let user_id = seed_user(&pool, "shopper@example.com", "secret123").await;

        let token = create_session(&pool, &user_id, 24).await.unwrap();
        let user = authenticate_token(&pool, Some(&token)).await.unwrap();

        assert_eq!(user.id, user_id);
        assert_eq!(user.email, "shopper@example.com");
        assert_eq!(user.role, "USER");
    }

    #[tokio::test]
    async fn test_expired_session_rejected_and_deleted() {
        let pool = test_pool().await;
        let user_id = seed_user(&pool, "shopper@example.com", "secret123").await;

        let token = generate_token();
        let past = (chrono::Utc::now() - chrono::Duration::hours(1)).to_rfc3339();
        sqlx::query(
            "INSERT INTO sessions (id, user_id, token_hash, expires_at, created_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(Uuid::new_v4().to_string())
        .bind(&user_id)
        .bind(hash_token(&token))
        .bind(&past)
        .bind(&past)
        .execute(&pool)
        .await
        .unwrap();

        let err = authenticate_token(&pool, Some(&token)).await.unwrap_err();
        assert!(matches!(err, AuthFailure::Expired));

        // The expired row was removed as a side effect
        assert_eq!(session_count(&pool).await, 0);

        // The next access reports NotFound, still rejected
        let err = authenticate_token(&pool, Some(&token)).await.unwrap_err();
        assert!(matches!(err, AuthFailure::NotFound));
    }

    #[tokio::test]
    async fn test_wrong_password_creates_no_session() {
        let pool = test_pool().await;
        seed_user(&pool, "shopper@example.com", "secret123").await;
        let state = Arc::new(AppState::new(Config::default(), pool.clone()));

        for _ in 0..2 {
            let err = login(
                State(state.clone()),
                CookieJar::new(),
                Json(LoginRequest {
                    email: "shopper@example.com".to_string(),
                    password: "wrong-password".to_string(),
                }),
            )
            .await
            .unwrap_err();
            assert_eq!(err.into_response().status(), StatusCode::UNAUTHORIZED);
        }

        assert_eq!(session_count(&pool).await, 0);
    }

    #[tokio::test]
    async fn test_login_sets_session_and_role_cookies() {
        let pool = test_pool().await;
        seed_user(&pool, "shopper@example.com", "secret123").await;
        let state = Arc::new(AppState::new(Config::default(), pool.clone()));

        let (jar, response) = login(
            State(state),
            CookieJar::new(),
            Json(LoginRequest {
                email: "Shopper@Example.com".to_string(),
                password: "secret123".to_string(),
            }),
        )
        .await
        .unwrap();

        assert_eq!(response.user.email, "shopper@example.com");
        let session = jar.get(SESSION_COOKIE).unwrap();
        assert!(!session.value().is_empty());
        assert_eq!(jar.get(ROLE_COOKIE).unwrap().value(), "USER");
        assert_eq!(session_count(&pool).await, 1);
    }

    #[tokio::test]
    async fn test_register_rejects_duplicate_email() {
        let pool = test_pool().await;
        let state = Arc::new(AppState::new(Config::default(), pool.clone()));

        let (status, _) = register(
            State(state.clone()),
            Json(RegisterRequest {
                email: "new@example.com".to_string(),
                password: "secret123".to_string(),
            }),
        )
        .await
        .unwrap();
        assert_eq!(status, StatusCode::CREATED);

        let err = register(
            State(state),
            Json(RegisterRequest {
                email: "New@Example.com".to_string(),
                password: "secret123".to_string(),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_ensure_admin_user_is_idempotent() {
        let pool = test_pool().await;
        let auth = AuthConfig {
            admin_email: "admin@example.com".to_string(),
            admin_password: Some("correct-horse".to_string()),
            session_ttl_hours: 24,
        };

        ensure_admin_user(&pool, &auth).await.unwrap();
        ensure_admin_user(&pool, &auth).await.unwrap();

        let admins: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE role = 'ADMIN'")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(admins, 1);
    }
}

//! Signup/login flow, password hashing, and the bearer-token auth gate.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::{
    async_trait,
    body::Body,
    extract::{FromRequestParts, State},
    http::{header, request::Parts, Request, StatusCode},
    middleware::Next,
    response::Response,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::error::ApiError;
use super::extract::Json;
use super::validation::{validate_email, validate_name, validate_password};
use crate::db::{LoginRequest, SignupRequest, TokenResponse, User, UserResponse};
use crate::AppState;

/// Hash a password using Argon2 with a fresh random salt
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let hash = argon2.hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

/// Verify a password against a stored hash.
///
/// A wrong password is `Ok(false)`; a malformed stored hash or other
/// hasher failure is an `Err`, so callers never report an operational
/// problem as "password incorrect".
pub fn verify_password(
    password: &str,
    hash: &str,
) -> Result<bool, argon2::password_hash::Error> {
    let parsed_hash = PasswordHash::new(hash)?;
    match Argon2::default().verify_password(password.as_bytes(), &parsed_hash) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(e),
    }
}

/// The authenticated identity attached to a request by the auth gate
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: String,
    pub name: String,
    pub email: String,
}

impl From<AuthUser> for UserResponse {
    fn from(user: AuthUser) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
        }
    }
}

/// Auth middleware applied to every protected route.
///
/// Verification is purely stateless: the token signature and expiry are
/// checked, but no database lookup confirms the user still exists.
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| ApiError::unauthorized("Missing authorization header"))?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| ApiError::unauthorized("Expected a bearer token"))?;

    let claims = state
        .tokens
        .verify(token)
        .map_err(|_| ApiError::unauthorized("Invalid or expired token"))?;

    request.extensions_mut().insert(AuthUser {
        id: claims.sub,
        name: claims.name,
        email: claims.email,
    });

    Ok(next.run(request).await)
}

/// Extractor for the identity the auth gate attached to the request
#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or_else(|| ApiError::unauthorized("Authentication required"))
    }
}

fn validate_signup(req: &SignupRequest) -> Result<(), ApiError> {
    if let Err(e) = validate_name(&req.name) {
        return Err(ApiError::validation_field("name", e));
    }
    if let Err(e) = validate_email(&req.email) {
        return Err(ApiError::validation_field("email", e));
    }
    if let Err(e) = validate_password(&req.password) {
        return Err(ApiError::validation_field("password", e));
    }
    Ok(())
}

/// Create an account and return a signed token
///
/// POST /auth/signup
pub async fn signup(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SignupRequest>,
) -> Result<(StatusCode, Json<TokenResponse>), ApiError> {
    validate_signup(&req)?;

    let existing: Option<User> = sqlx::query_as("SELECT * FROM users WHERE email = ?")
        .bind(&req.email)
        .fetch_optional(&state.db)
        .await?;

    if existing.is_some() {
        return Err(ApiError::conflict("Email already taken."));
    }

    let password_hash = hash_password(&req.password).map_err(|e| {
        tracing::error!("Failed to hash password: {}", e);
        ApiError::internal("Failed to process credentials")
    })?;

    let id = uuid::Uuid::new_v4().to_string();
    let now = chrono::Utc::now().to_rfc3339();

    // The UNIQUE constraint on email backstops the lookup above; a
    // concurrent signup with the same email surfaces as a 409.
    sqlx::query(
        r#"
        INSERT INTO users (id, name, email, password_hash, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(&req.name)
    .bind(&req.email)
    .bind(&password_hash)
    .bind(&now)
    .bind(&now)
    .execute(&state.db)
    .await
    .map_err(|e| {
        if e.to_string().contains("UNIQUE constraint failed") {
            ApiError::conflict("Email already taken.")
        } else {
            tracing::error!("Failed to create user: {}", e);
            ApiError::database("Failed to create account")
        }
    })?;

    let user = User {
        id,
        name: req.name,
        email: req.email,
        password_hash,
        created_at: now.clone(),
        updated_at: now,
    };

    let token = state.tokens.issue(&user).map_err(|e| {
        tracing::error!("Failed to issue token: {}", e);
        ApiError::internal("Failed to issue token")
    })?;

    tracing::info!(email = %user.email, "Account created");

    Ok((StatusCode::CREATED, Json(TokenResponse { token })))
}

/// Exchange credentials for a fresh signed token
///
/// POST /auth/login
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    // Unknown email and wrong password produce the same error so the
    // endpoint cannot be used to enumerate accounts.
    let user: Option<User> = sqlx::query_as("SELECT * FROM users WHERE email = ?")
        .bind(&req.email)
        .fetch_optional(&state.db)
        .await?;

    let user = user.ok_or_else(|| ApiError::unauthorized("Invalid credentials."))?;

    let password_ok = verify_password(&req.password, &user.password_hash).map_err(|e| {
        tracing::error!("Failed to verify password: {}", e);
        ApiError::internal("Failed to process credentials")
    })?;

    if !password_ok {
        return Err(ApiError::unauthorized("Invalid credentials."));
    }

    let token = state.tokens.issue(&user).map_err(|e| {
        tracing::error!("Failed to issue token: {}", e);
        ApiError::internal("Failed to issue token")
    })?;

    Ok(Json(TokenResponse { token }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::testing::test_state;
    use axum::http::StatusCode;

    fn signup_req(name: &str, email: &str, password: &str) -> SignupRequest {
        SignupRequest {
            name: name.to_string(),
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    #[test]
    fn same_password_hashes_differently() {
        let h1 = hash_password("correct horse").unwrap();
        let h2 = hash_password("correct horse").unwrap();
        assert_ne!(h1, h2);
        assert!(verify_password("correct horse", &h1).unwrap());
        assert!(verify_password("correct horse", &h2).unwrap());
    }

    #[test]
    fn wrong_password_fails_verification() {
        let hash = hash_password("right-password").unwrap();
        assert!(!verify_password("wrong-password", &hash).unwrap());
    }

    #[test]
    fn malformed_hash_is_an_error_not_a_mismatch() {
        assert!(verify_password("anything", "not-a-phc-string").is_err());
    }

    #[tokio::test]
    async fn signup_issues_a_verifiable_token() {
        let state = test_state().await;

        let (status, Json(body)) = signup(
            State(state.clone()),
            Json(signup_req("Ann", "a@x.com", "password1")),
        )
        .await
        .unwrap();

        assert_eq!(status, StatusCode::CREATED);
        let claims = state.tokens.verify(&body.token).unwrap();
        assert_eq!(claims.name, "Ann");
        assert_eq!(claims.email, "a@x.com");
    }

    #[tokio::test]
    async fn duplicate_email_conflicts_without_touching_first_account() {
        let state = test_state().await;

        signup(
            State(state.clone()),
            Json(signup_req("Ann", "a@x.com", "password1")),
        )
        .await
        .unwrap();

        let err = signup(
            State(state.clone()),
            Json(signup_req("Impostor", "a@x.com", "password2")),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status(), StatusCode::CONFLICT);

        // The original account is intact and still logs in
        let user: User = sqlx::query_as("SELECT * FROM users WHERE email = ?")
            .bind("a@x.com")
            .fetch_one(&state.db)
            .await
            .unwrap();
        assert_eq!(user.name, "Ann");

        login(
            State(state),
            Json(LoginRequest {
                email: "a@x.com".to_string(),
                password: "password1".to_string(),
            }),
        )
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn login_failures_are_indistinguishable() {
        let state = test_state().await;

        signup(
            State(state.clone()),
            Json(signup_req("Ann", "a@x.com", "password1")),
        )
        .await
        .unwrap();

        let wrong_password = login(
            State(state.clone()),
            Json(LoginRequest {
                email: "a@x.com".to_string(),
                password: "wrong".to_string(),
            }),
        )
        .await
        .unwrap_err();

        let unknown_email = login(
            State(state),
            Json(LoginRequest {
                email: "nobody@x.com".to_string(),
                password: "password1".to_string(),
            }),
        )
        .await
        .unwrap_err();

        assert_eq!(wrong_password.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(unknown_email.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(wrong_password.code(), unknown_email.code());
    }

    #[tokio::test]
    async fn login_returns_a_fresh_token_for_the_same_identity() {
        let state = test_state().await;

        let (_, Json(signup_body)) = signup(
            State(state.clone()),
            Json(signup_req("Ann", "a@x.com", "password1")),
        )
        .await
        .unwrap();

        let Json(login_body) = login(
            State(state.clone()),
            Json(LoginRequest {
                email: "a@x.com".to_string(),
                password: "password1".to_string(),
            }),
        )
        .await
        .unwrap();

        assert_ne!(signup_body.token, login_body.token);
        let c1 = state.tokens.verify(&signup_body.token).unwrap();
        let c2 = state.tokens.verify(&login_body.token).unwrap();
        assert_eq!(c1.sub, c2.sub);
    }

    #[tokio::test]
    async fn signup_rejects_invalid_payloads() {
        let state = test_state().await;

        let cases = [
            signup_req("", "a@x.com", "password1"),
            signup_req("Ann", "not-an-email", "password1"),
            signup_req("Ann", "a@x.com", "short"),
        ];

        for req in cases {
            let err = signup(State(state.clone()), Json(req)).await.unwrap_err();
            assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        }
    }
}

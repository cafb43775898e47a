use axum::{
    extract::{FromRef, State},
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        dto::{AuthResponse, LoginRequest, PublicUser, RefreshRequest, RegisterRequest},
        jwt::{AuthUser, JwtKeys},
        password::{hash_password, verify_password},
        repo::User,
    },
    error::ApiError,
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh))
}

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/me", get(get_me))
}

fn is_valid_email(email: &str) -> bool {
    let mut parts = email.splitn(2, '@');
    match (parts.next(), parts.next()) {
        (Some(local), Some(domain)) => {
            !local.is_empty() && domain.contains('.') && !domain.starts_with('.')
        }
        _ => false,
    }
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(mut payload): Json<RegisterRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    payload.email = payload.email.trim().to_lowercase();

    if !is_valid_email(&payload.email) {
        warn!(email = %payload.email, "invalid email");
        return Err(ApiError::Validation("invalid email".into()));
    }
    if payload.password.len() < 8 {
        return Err(ApiError::Validation("password too short".into()));
    }
    if payload.name.trim().is_empty() {
        return Err(ApiError::Validation("name is required".into()));
    }

    if User::find_by_email(&state.db, &payload.email).await?.is_some() {
        warn!(email = %payload.email, "email already registered");
        return Err(ApiError::Conflict("email already registered".into()));
    }

    let hash = hash_password(&payload.password)?;
    let user = User::create(&state.db, &payload.email, payload.name.trim(), &hash).await?;
    info!(user_id = %user.id, "user registered");

    issue_tokens(&state, user)
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let email = payload.email.trim().to_lowercase();
    let user = User::find_by_email(&state.db, &email)
        .await?
        .ok_or(ApiError::Unauthorized)?;

    if !verify_password(&payload.password, &user.password_hash)? {
        warn!(email = %email, "bad credentials");
        return Err(ApiError::Unauthorized);
    }
    // Deactivated technicians keep their rows but lose access.
    if !user.active {
        warn!(user_id = %user.id, "inactive user login attempt");
        return Err(ApiError::Forbidden);
    }

    issue_tokens(&state, user)
}

#[instrument(skip(state, payload))]
pub async fn refresh(
    State(state): State<AppState>,
    Json(payload): Json<RefreshRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let keys = JwtKeys::from_ref(&state);
    let claims = keys
        .verify_refresh(&payload.refresh_token)
        .map_err(|_| ApiError::Unauthorized)?;

    let user = User::find_by_id(&state.db, claims.sub)
        .await?
        .ok_or(ApiError::Unauthorized)?;
    if !user.active {
        return Err(ApiError::Forbidden);
    }

    issue_tokens(&state, user)
}

#[instrument(skip(state))]
pub async fn get_me(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
) -> Result<Json<PublicUser>, ApiError> {
    let user = User::find_by_id(&state.db, caller.id)
        .await?
        .ok_or(ApiError::Unauthorized)?;
    Ok(Json(PublicUser {
        id: user.id,
        email: user.email,
        name: user.name,
        role: user.role,
    }))
}

fn issue_tokens(state: &AppState, user: User) -> Result<Json<AuthResponse>, ApiError> {
    let keys = JwtKeys::from_ref(state);
    let access_token = keys.sign_access(user.id, user.role)?;
    let refresh_token = keys.sign_refresh(user.id, user.role)?;
    Ok(Json(AuthResponse {
        access_token,
        refresh_token,
        user: PublicUser {
            id: user.id,
            email: user.email,
            name: user.name,
            role: user.role,
        },
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_addresses() {
        assert!(is_valid_email("tech@shop.example"));
        assert!(is_valid_email("a.b@c.d.example"));
    }

    #[test]
    fn rejects_malformed_addresses() {
        assert!(!is_valid_email("no-at-sign"));
        assert!(!is_valid_email("@shop.example"));
        assert!(!is_valid_email("tech@nodot"));
        assert!(!is_valid_email("tech@.example"));
    }
}

use axum::{extract::State, http::StatusCode, response::Json};
use serde_json::{Value, json};
use validator::Validate;

use crate::{
    AppState,
    auth::{AuthUser, Claims, hash_password, verify_password},
    error::{AppError, Result},
    models::{AuthResponse, LoginRequest, RegisterRequest, User, UserResponse},
    services::user_service,
};

async fn start_session(state: &AppState, user: User) -> Result<AuthResponse> {
    let (token, claims) = Claims::new(user.id, user.username.clone(), &state.config.jwt_secret)?;

    state
        .redis
        .store_session(&claims.jti, &claims.sub, state.config.session_ttl_secs)
        .await?;

    Ok(AuthResponse {
        token,
        user: user.into(),
    })
}

pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>)> {
    payload.validate()?;

    let rate_limit_key = format!(
        "register_attempt:{}",
        payload.email.as_deref().unwrap_or(&payload.username)
    );
    if !state
        .redis
        .check_rate_limit(&rate_limit_key, 5, 3600)
        .await?
    {
        return Err(AppError::RateLimit);
    }

    if user_service::username_or_email_taken(&state.db, &payload.username, payload.email.as_deref())
        .await?
    {
        return Err(AppError::Conflict(
            "Username or email already exists".to_string(),
        ));
    }

    let password_hash = hash_password(&payload.password)?;
    let user = user_service::create_user(
        &state.db,
        &payload.username,
        payload.email.as_deref(),
        &password_hash,
    )
    .await?;

    tracing::info!(user_id = %user.id, "user registered");

    let response = start_session(&state, user).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<AuthResponse>> {
    payload.validate()?;

    let rate_limit_key = format!("login_attempt:{}", payload.username_or_email);
    if !state
        .redis
        .check_rate_limit(&rate_limit_key, 10, 900)
        .await?
    {
        return Err(AppError::RateLimit);
    }

    let user = user_service::get_user_by_login(&state.db, &payload.username_or_email)
        .await?
        .ok_or_else(|| AppError::Authentication("Invalid credentials".to_string()))?;

    if !verify_password(&payload.password, &user.password_hash)? {
        return Err(AppError::Authentication("Invalid credentials".to_string()));
    }

    tracing::debug!(user_id = %user.id, "user logged in");

    Ok(Json(start_session(&state, user).await?))
}

pub async fn logout(State(state): State<AppState>, auth_user: AuthUser) -> Result<Json<Value>> {
    state.redis.delete_session(&auth_user.jti).await?;

    Ok(Json(json!({ "message": "Logged out" })))
}

pub async fn get_current_user(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> Result<Json<UserResponse>> {
    let user = user_service::get_user_by_id(&state.db, auth_user.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    Ok(Json(user.into()))
}

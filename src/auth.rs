use axum::{RequestPartsExt, extract::FromRequestParts, http::request::Parts};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    AppState,
    error::{AppError, Result},
};

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // user_id
    pub username: String,
    pub exp: i64,
    pub iat: i64,
    pub jti: String, // session id
}

impl Claims {
    pub fn new(user_id: Uuid, username: String, jwt_secret: &str) -> Result<(String, Self)> {
        let now = Utc::now();
        let exp = now + Duration::hours(24);
        let jti = Uuid::new_v4().to_string();

        let claims = Self {
            sub: user_id.to_string(),
            username,
            exp: exp.timestamp(),
            iat: now.timestamp(),
            jti,
        };

        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(jwt_secret.as_ref()),
        )?;

        Ok((token, claims))
    }

    pub fn verify(token: &str, jwt_secret: &str) -> Result<Self> {
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(jwt_secret.as_ref()),
            &Validation::default(),
        )?;

        Ok(token_data.claims)
    }
}

/// The resolved caller identity for protected routes.
#[derive(Debug)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub username: String,
    pub jti: String,
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        let TypedHeader(Authorization(bearer)) = parts
            .extract::<TypedHeader<Authorization<Bearer>>>()
            .await
            .map_err(|_| AppError::Authentication("Missing authorization header".to_string()))?;

        let claims = Claims::verify(bearer.token(), &state.config.jwt_secret)?;

        // Logged-out tokens stay cryptographically valid; the session decides.
        match state.redis.get_session(&claims.jti).await? {
            Some(stored_user_id) if stored_user_id == claims.sub => {}
            Some(_) => return Err(AppError::Authentication("Invalid session".to_string())),
            None => return Err(AppError::Authentication("Session expired".to_string())),
        }

        let user_id = Uuid::parse_str(&claims.sub)
            .map_err(|_| AppError::Authentication("Invalid user ID in token".to_string()))?;

        Ok(AuthUser {
            user_id,
            username: claims.username,
            jti: claims.jti,
        })
    }
}

// Optional auth user (for endpoints that work with or without auth)
#[derive(Debug)]
pub struct OptionalAuthUser(pub Option<AuthUser>);

impl OptionalAuthUser {
    pub fn user_id(&self) -> Option<Uuid> {
        self.0.as_ref().map(|user| user.user_id)
    }
}

impl FromRequestParts<AppState> for OptionalAuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        match AuthUser::from_request_parts(parts, state).await {
            Ok(user) => Ok(OptionalAuthUser(Some(user))),
            Err(_) => Ok(OptionalAuthUser(None)),
        }
    }
}

// Password hashing utilities
pub fn hash_password(password: &str) -> Result<String> {
    let cost = 12;
    bcrypt::hash(password, cost).map_err(AppError::from)
}

pub fn verify_password(password: &str, hash: &str) -> Result<bool> {
    bcrypt::verify(password, hash).map_err(AppError::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issued_token_verifies_with_same_secret() {
        let user_id = Uuid::new_v4();
        let (token, issued) = Claims::new(user_id, "alice".to_string(), "secret").unwrap();

        let claims = Claims::verify(&token, "secret").unwrap();
        assert_eq!(claims.sub, user_id.to_string());
        assert_eq!(claims.username, "alice");
        assert_eq!(claims.jti, issued.jti);
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let (token, _) = Claims::new(Uuid::new_v4(), "bob".to_string(), "secret").unwrap();

        let err = Claims::verify(&token, "another-secret").unwrap_err();
        assert!(matches!(err, AppError::Jwt(_)));
    }

    #[test]
    fn password_hash_round_trip() {
        let hash = bcrypt::hash("correct horse", 4).unwrap();
        assert!(verify_password("correct horse", &hash).unwrap());
        assert!(!verify_password("battery staple", &hash).unwrap());
    }
}

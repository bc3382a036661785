//! User JWT authentication for the dashboard API

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use shared::error::AppError;
use shared::modules::Role;

use crate::state::AppState;

/// JWT claims for a company user
#[derive(Debug, Serialize, Deserialize)]
pub struct UserClaims {
    /// User ID
    pub sub: String,
    pub company_id: String,
    pub role: String,
    pub email: String,
    /// Expiration (Unix timestamp seconds)
    pub exp: usize,
    /// Issued at (Unix timestamp seconds)
    pub iat: usize,
}

/// Authenticated user extracted from the JWT
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub user_id: i64,
    pub company_id: String,
    pub role: Role,
    pub email: String,
}

impl CurrentUser {
    pub fn is_owner(&self) -> bool {
        self.role == Role::Owner
    }
}

const JWT_EXPIRY_HOURS: i64 = 24;

/// Create a JWT token for a user
pub fn create_token(
    user_id: i64,
    company_id: &str,
    role: Role,
    email: &str,
    secret: &str,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = chrono::Utc::now();
    let claims = UserClaims {
        sub: user_id.to_string(),
        company_id: company_id.to_string(),
        role: role.as_db().to_string(),
        email: email.to_string(),
        exp: (now + chrono::Duration::hours(JWT_EXPIRY_HOURS)).timestamp() as usize,
        iat: now.timestamp() as usize,
    };

    jsonwebtoken::encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

/// Decode and validate a token into the caller identity
pub fn decode_token(token: &str, secret: &str) -> Result<CurrentUser, AppError> {
    let token_data = jsonwebtoken::decode::<UserClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| {
        tracing::debug!("JWT validation failed: {e}");
        match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => AppError::token_expired(),
            _ => AppError::invalid_token("Invalid token"),
        }
    })?;

    let claims = token_data.claims;
    let user_id = claims
        .sub
        .parse()
        .map_err(|_| AppError::invalid_token("Invalid subject"))?;
    let role = Role::from_db(&claims.role).ok_or_else(|| AppError::invalid_token("Unknown role"))?;

    Ok(CurrentUser {
        user_id,
        company_id: claims.company_id,
        role,
        email: claims.email,
    })
}

/// Middleware that verifies the Bearer token and inserts [`CurrentUser`]
pub async fn user_auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let auth_header = request
        .headers()
        .get(http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(AppError::unauthorized)?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| AppError::invalid_token("Invalid Authorization format"))?;

    let user = decode_token(token, &state.jwt_secret)?;
    request.extensions_mut().insert(user);

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::error::ErrorCode;

    const SECRET: &str = "test-secret";

    #[test]
    fn test_token_round_trip() {
        let token = create_token(42, "company-1", Role::Manager, "m@example.com", SECRET).unwrap();
        let user = decode_token(&token, SECRET).unwrap();
        assert_eq!(user.user_id, 42);
        assert_eq!(user.company_id, "company-1");
        assert_eq!(user.role, Role::Manager);
        assert_eq!(user.email, "m@example.com");
        assert!(!user.is_owner());
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = create_token(1, "c", Role::Owner, "o@example.com", SECRET).unwrap();
        let err = decode_token(&token, "other-secret").unwrap_err();
        assert_eq!(err.code, ErrorCode::TokenInvalid);
    }

    #[test]
    fn test_expired_token() {
        let past = (chrono::Utc::now() - chrono::Duration::hours(2)).timestamp() as usize;
        let claims = UserClaims {
            sub: "1".into(),
            company_id: "c".into(),
            role: "owner".into(),
            email: "o@example.com".into(),
            exp: past,
            iat: past - 60,
        };
        let token = jsonwebtoken::encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();
        let err = decode_token(&token, SECRET).unwrap_err();
        assert_eq!(err.code, ErrorCode::TokenExpired);
    }

    #[test]
    fn test_unknown_role_rejected() {
        let now = chrono::Utc::now().timestamp() as usize;
        let claims = UserClaims {
            sub: "1".into(),
            company_id: "c".into(),
            role: "chef".into(),
            email: "c@example.com".into(),
            exp: now + 3600,
            iat: now,
        };
        let token = jsonwebtoken::encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();
        assert!(decode_token(&token, SECRET).is_err());
    }
}

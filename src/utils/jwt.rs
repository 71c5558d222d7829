// src/utils/jwt.rs

use std::time::{SystemTime, UNIX_EPOCH};

use axum::{
    body::Body,
    extract::{FromRef, FromRequestParts, State},
    http::{Request, header, request::Parts},
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use crate::{
    config::Config,
    error::AppError,
    models::user::{ActingUser, Viewer},
    services::users,
};

/// JWT Claims structure, as issued by the identity provider.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Claims {
    /// Subject - Stores the User ID (as string).
    pub sub: String,
    /// Display name.
    pub name: String,
    /// User's role ('user', 'staff' or 'admin').
    pub role: String,
    /// Expiration time as Unix timestamp.
    pub exp: usize,
}

impl Claims {
    pub fn is_staff(&self) -> bool {
        matches!(self.role.as_str(), "staff" | "admin")
    }
}

impl TryFrom<&Claims> for ActingUser {
    type Error = AppError;

    fn try_from(claims: &Claims) -> Result<Self, Self::Error> {
        let id = claims
            .sub
            .parse::<i64>()
            .map_err(|_| AppError::Unauthorized("Invalid token subject".to_string()))?;

        Ok(ActingUser {
            id,
            username: claims.name.clone(),
            is_staff: claims.is_staff(),
        })
    }
}

/// Signs a new JWT for the user.
///
/// Tokens normally come from the identity provider; this exists for tooling and tests.
pub fn sign_jwt(
    id: i64,
    name: &str,
    role: &str,
    secret: &str,
    expiration_seconds: u64,
) -> Result<String, AppError> {
    // Calculate expiration: current time + expiration_seconds
    let expiration = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| AppError::Internal(e.to_string()))?
        .as_secs() as usize
        + expiration_seconds as usize;

    let claims = Claims {
        sub: id.to_string(),
        name: name.to_owned(),
        role: role.to_owned(),
        exp: expiration,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(e.to_string()))
}

/// Verifies and decodes a JWT string.
pub fn verify_jwt(token: &str, secret: &str) -> Result<Claims, AppError> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| AppError::Unauthorized("Invalid token".to_string()))?;

    Ok(token_data.claims)
}

/// Axum Middleware: Authentication.
///
/// A valid 'Authorization: Bearer <token>' header puts `Claims` into the
/// request extensions. Requests without the header pass through anonymously;
/// a malformed or invalid token is rejected with 401. Whether a route needs a
/// user at all is decided by the `ActingUser` / `Viewer` extractors.
pub async fn auth_middleware(
    State(config): State<Config>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let claims = match req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
    {
        Some(value) => {
            let token = value.strip_prefix("Bearer ").ok_or_else(|| {
                AppError::Unauthorized("Malformed authorization header".to_string())
            })?;
            Some(verify_jwt(token, &config.jwt_secret)?)
        }
        None => None,
    };

    if let Some(claims) = claims {
        req.extensions_mut().insert(claims);
    }

    Ok(next.run(req).await)
}

/// Requires an authenticated caller and records their current identity.
impl<S> FromRequestParts<S> for ActingUser
where
    SqlitePool: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let claims = parts.extensions.get::<Claims>().ok_or_else(|| {
            AppError::Unauthorized("Authentication credentials were not provided".to_string())
        })?;
        let user = ActingUser::try_from(claims)?;

        let pool = SqlitePool::from_ref(state);
        users::sync(&pool, &user).await?;

        Ok(user)
    }
}

impl<S> FromRequestParts<S> for Viewer
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = parts
            .extensions
            .get::<Claims>()
            .map(ActingUser::try_from)
            .transpose()?;

        Ok(Viewer(user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "unit_test_secret";

    #[test]
    fn signed_token_verifies_into_acting_user() {
        let token = sign_jwt(42, "mina", "staff", SECRET, 60).unwrap();
        let claims = verify_jwt(&token, SECRET).unwrap();
        let user = ActingUser::try_from(&claims).unwrap();

        assert_eq!(
            user,
            ActingUser {
                id: 42,
                username: "mina".to_string(),
                is_staff: true,
            }
        );
    }

    #[test]
    fn wrong_secret_is_unauthorized() {
        let token = sign_jwt(1, "jun", "user", SECRET, 60).unwrap();
        assert!(matches!(
            verify_jwt(&token, "other_secret"),
            Err(AppError::Unauthorized(_))
        ));
    }

    #[test]
    fn plain_users_are_not_staff() {
        let token = sign_jwt(1, "jun", "user", SECRET, 60).unwrap();
        let claims = verify_jwt(&token, SECRET).unwrap();
        assert!(!claims.is_staff());
    }
}

//! Bearer-token identity extraction.
//!
//! The engine requires an explicit owner on every call; this module turns
//! an `Authorization: Bearer <jwt>` header into that identity. Token
//! issuance lives outside this service.

use axum::{extract::FromRequestParts, http::request::Parts};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::ServiceError;
use crate::AppState;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Owning user id.
    pub sub: Uuid,
    pub exp: usize,
}

/// The authenticated caller, passed explicitly into every service call.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser {
    pub user_id: Uuid,
}

fn bearer_token(parts: &Parts) -> Result<&str, ServiceError> {
    let header = parts
        .headers
        .get(axum::http::header::AUTHORIZATION)
        .ok_or_else(|| ServiceError::AuthError("missing authorization header".into()))?
        .to_str()
        .map_err(|_| ServiceError::AuthError("malformed authorization header".into()))?;

    header
        .strip_prefix("Bearer ")
        .ok_or_else(|| ServiceError::AuthError("expected bearer token".into()))
}

pub fn decode_token(token: &str, secret: &str) -> Result<AuthUser, ServiceError> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::new(Algorithm::HS256),
    )
    .map_err(|e| ServiceError::AuthError(format!("invalid token: {e}")))?;

    Ok(AuthUser {
        user_id: data.claims.sub,
    })
}

#[axum::async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ServiceError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?;
        decode_token(token, &state.config.jwt_secret)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};

    const SECRET: &str = "unit-test-secret-key-thats-long-enough";

    fn issue(sub: Uuid, exp_offset_secs: i64) -> String {
        let exp = (chrono::Utc::now().timestamp() + exp_offset_secs) as usize;
        encode(
            &Header::default(),
            &Claims { sub, exp },
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap()
    }

    #[test]
    fn valid_token_yields_the_subject() {
        let user = Uuid::new_v4();
        let token = issue(user, 600);
        let auth = decode_token(&token, SECRET).unwrap();
        assert_eq!(auth.user_id, user);
    }

    #[test]
    fn expired_token_is_rejected() {
        let token = issue(Uuid::new_v4(), -600);
        assert!(decode_token(&token, SECRET).is_err());
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = issue(Uuid::new_v4(), 600);
        assert!(decode_token(&token, "another-secret-key-thats-long-enough").is_err());
    }
}

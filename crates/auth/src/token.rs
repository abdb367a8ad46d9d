//! Stateless HS256 session tokens.

use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::error::AuthError;

/// Token lifetime in hours. There is no refresh mechanism; clients must
/// re-authenticate after expiry.
pub const TOKEN_TTL_HOURS: i64 = 24;

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    iat: i64,
    exp: i64,
}

/// Issue a signed token carrying `user_id`, expiring [`TOKEN_TTL_HOURS`]
/// from now.
pub fn issue(user_id: &str, secret: &str) -> Result<String, AuthError> {
    let now = Utc::now().timestamp();
    let claims = Claims {
        sub: user_id.to_string(),
        iat: now,
        exp: now + TOKEN_TTL_HOURS * 3600,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|err| AuthError::Encoding(err.to_string()))
}

/// Validate a token and return the embedded user id. Signature failure and
/// expiry both collapse into [`AuthError::InvalidToken`]; callers only need
/// valid-or-not.
pub fn validate(token: &str, secret: &str) -> Result<String, AuthError> {
    let validation = Validation::default();
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map_err(|_| AuthError::InvalidToken)?;

    Ok(data.claims.sub)
}

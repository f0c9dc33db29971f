/// Session token generation and validation
///
/// Sessions are represented by compact HS256-signed bearer tokens. The
/// subject claim carries the account's normalized (lowercase) email; the
/// expiry window defaults to seven days and is configurable at issuance.
///
/// # Example
///
/// ```
/// use tasknest_shared::auth::jwt::{create_token, verify_token, Claims};
/// use chrono::Duration;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let claims = Claims::new("user@example.com", Duration::days(7));
/// let token = create_token(&claims, "a-secret-key-at-least-32-bytes-long")?;
///
/// let verified = verify_token(&token, "a-secret-key-at-least-32-bytes-long")?;
/// assert_eq!(verified.sub, "user@example.com");
/// # Ok(())
/// # }
/// ```

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// Issuer claim pinned into every token
const ISSUER: &str = "tasknest";

/// Default token lifetime: seven days
pub const DEFAULT_EXPIRY_DAYS: i64 = 7;

/// Error type for token operations
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    /// Failed to sign a token
    #[error("failed to create token: {0}")]
    Create(String),

    /// Token has expired
    #[error("token has expired")]
    Expired,

    /// Signature mismatch, malformed structure, or wrong issuer
    #[error("invalid token: {0}")]
    Invalid(String),
}

/// Claims carried by a session token
///
/// `sub` is the account's normalized email; `iss` is always `"tasknest"`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: normalized account email
    pub sub: String,

    /// Issuer
    pub iss: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

impl Claims {
    /// Creates claims for a subject with the given lifetime.
    pub fn new(subject: impl Into<String>, valid_for: Duration) -> Self {
        let now = Utc::now();
        Self {
            sub: subject.into(),
            iss: ISSUER.to_string(),
            iat: now.timestamp(),
            exp: (now + valid_for).timestamp(),
        }
    }

    /// Whether the expiry timestamp has passed.
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() >= self.exp
    }
}

/// Signs claims into a compact token string.
pub fn create_token(claims: &Claims, secret: &str) -> Result<String, TokenError> {
    let header = Header::new(Algorithm::HS256);
    let key = EncodingKey::from_secret(secret.as_bytes());

    encode(&header, claims, &key).map_err(|e| TokenError::Create(e.to_string()))
}

/// Validates a token and returns its claims.
///
/// Checks the signature, the expiry timestamp, and the issuer. Any failure
/// is reported as [`TokenError::Expired`] or [`TokenError::Invalid`]; the
/// caller treats both as an unauthenticated request.
pub fn verify_token(token: &str, secret: &str) -> Result<Claims, TokenError> {
    let key = DecodingKey::from_secret(secret.as_bytes());

    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[ISSUER]);
    validation.validate_exp = true;

    let data = decode::<Claims>(token, &key, &validation).map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => TokenError::Expired,
        _ => TokenError::Invalid(e.to_string()),
    })?;

    Ok(data.claims)
}

/// Google ID-token verifier
///
/// Validates Google Sign-In credentials (ID tokens) offline: the token's
/// RS256 signature is checked against Google's published JWKS, the audience
/// must equal the configured OAuth client id, and the expiry is enforced by
/// the decoder. The issuer string is extracted as-is; the auth service
/// decides which issuers it trusts.

use async_trait::async_trait;
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use serde::Deserialize;

use super::federated::{AssertionError, FederatedIdentity, IdentityVerifier};

/// Google's JWKS endpoint for ID-token signing keys
pub const GOOGLE_CERTS_URL: &str = "https://www.googleapis.com/oauth2/v3/certs";

/// Single key from the provider's JWK set (RFC 7517 subset)
#[derive(Debug, Clone, Deserialize)]
struct Jwk {
    kid: String,
    n: String,
    e: String,
}

#[derive(Debug, Clone, Deserialize)]
struct JwkSet {
    keys: Vec<Jwk>,
}

/// Claims carried by a Google ID token (subset we consume)
#[derive(Debug, Deserialize)]
struct GoogleClaims {
    iss: String,
    sub: String,
    email: Option<String>,
    #[serde(default)]
    email_verified: bool,
    name: Option<String>,
}

/// Verifier for Google Sign-In ID tokens
pub struct GoogleIdVerifier {
    client_id: String,
    certs_url: String,
    http: reqwest::Client,
}

impl GoogleIdVerifier {
    /// Creates a verifier for the given OAuth client id.
    pub fn new(client_id: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            certs_url: GOOGLE_CERTS_URL.to_string(),
            http: reqwest::Client::new(),
        }
    }

    async fn fetch_keys(&self) -> Result<JwkSet, AssertionError> {
        let response = self
            .http
            .get(&self.certs_url)
            .send()
            .await
            .map_err(|e| AssertionError::KeyFetch(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AssertionError::KeyFetch(format!(
                "key endpoint returned {}",
                response.status()
            )));
        }

        response
            .json::<JwkSet>()
            .await
            .map_err(|e| AssertionError::KeyFetch(e.to_string()))
    }
}

#[async_trait]
impl IdentityVerifier for GoogleIdVerifier {
    async fn verify(&self, assertion: &str) -> Result<FederatedIdentity, AssertionError> {
        let header =
            decode_header(assertion).map_err(|e| AssertionError::Malformed(e.to_string()))?;

        let kid = header
            .kid
            .ok_or_else(|| AssertionError::Malformed("missing key id".to_string()))?;

        let keys = self.fetch_keys().await?;
        let jwk = keys
            .keys
            .iter()
            .find(|k| k.kid == kid)
            .ok_or_else(|| AssertionError::UnknownKey(kid.clone()))?;

        let decoding_key = DecodingKey::from_rsa_components(&jwk.n, &jwk.e)
            .map_err(|e| AssertionError::KeyFetch(e.to_string()))?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_audience(&[&self.client_id]);
        validation.validate_exp = true;

        let data =
            decode::<GoogleClaims>(assertion, &decoding_key, &validation).map_err(|e| {
                match e.kind() {
                    jsonwebtoken::errors::ErrorKind::InvalidAudience => {
                        AssertionError::AudienceMismatch
                    }
                    jsonwebtoken::errors::ErrorKind::Json(_)
                    | jsonwebtoken::errors::ErrorKind::Base64(_)
                    | jsonwebtoken::errors::ErrorKind::InvalidToken => {
                        AssertionError::Malformed(e.to_string())
                    }
                    _ => AssertionError::InvalidSignature(e.to_string()),
                }
            })?;

        let claims = data.claims;
        Ok(FederatedIdentity {
            issuer: claims.iss,
            subject_id: claims.sub,
            email: claims.email.unwrap_or_default(),
            email_verified: claims.email_verified,
            display_name: claims.name,
        })
    }
}

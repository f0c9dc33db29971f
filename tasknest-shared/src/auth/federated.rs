/// Federated identity assertion types
///
/// A federated login presents an opaque assertion string issued by a
/// third-party identity provider. An [`IdentityVerifier`] validates the
/// assertion cryptographically (signature against the provider's published
/// keys, audience, expiry) and extracts the identity it proves.
///
/// Trust policy on top of a valid signature — which issuers are accepted,
/// whether the email must be verified — belongs to the auth service, not to
/// the verifier.

use async_trait::async_trait;

/// Identity extracted from a successfully validated assertion
#[derive(Debug, Clone)]
pub struct FederatedIdentity {
    /// Issuer string as it appears in the assertion
    pub issuer: String,

    /// Stable provider-side subject id for this identity
    pub subject_id: String,

    /// Email address asserted by the provider (may be empty)
    pub email: String,

    /// Whether the provider has verified the email address
    pub email_verified: bool,

    /// Display name, if the provider supplies one
    pub display_name: Option<String>,
}

/// Error type for assertion validation
///
/// Every variant means the assertion cannot be trusted; callers collapse
/// these into a single unauthorized outcome at the HTTP boundary.
#[derive(Debug, thiserror::Error)]
pub enum AssertionError {
    /// Assertion is not a structurally valid token
    #[error("malformed assertion: {0}")]
    Malformed(String),

    /// Signature did not validate, or the token is expired
    #[error("assertion signature invalid: {0}")]
    InvalidSignature(String),

    /// Audience does not match the configured client id
    #[error("assertion audience mismatch")]
    AudienceMismatch,

    /// Could not fetch the provider's signing keys
    #[error("failed to fetch provider keys: {0}")]
    KeyFetch(String),

    /// Assertion references a signing key the provider does not publish
    #[error("unknown signing key: {0}")]
    UnknownKey(String),
}

/// Validates federated identity assertions.
///
/// Implemented by [`crate::auth::google::GoogleIdVerifier`] in production;
/// tests substitute a stub returning a fixed identity.
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    /// Validates `assertion` and extracts the identity it proves.
    async fn verify(&self, assertion: &str) -> Result<FederatedIdentity, AssertionError>;
}

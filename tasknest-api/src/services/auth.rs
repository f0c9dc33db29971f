/// Authentication service
///
/// Orchestrates registration, local login, and federated login against the
/// store, the password hasher, the token issuer, and the federated identity
/// verifier. Every outcome is typed; the HTTP layer maps outcomes to
/// statuses and stable messages.
///
/// Trust policy for federated identities lives here, on top of the
/// verifier's cryptographic checks: the issuer must be on the fixed
/// allow-list, the provider must have verified the email, and both email
/// and subject id must be non-empty.

use chrono::Duration;
use sqlx::PgPool;
use std::sync::Arc;
use tracing::{info, warn};

use tasknest_shared::auth::federated::{AssertionError, FederatedIdentity, IdentityVerifier};
use tasknest_shared::auth::jwt::{create_token, Claims, TokenError};
use tasknest_shared::auth::password::{hash_password, verify_password, PasswordError};
use tasknest_shared::models::user::{normalize_email, AuthProvider, CreateUser, User, UserView};

/// Issuer strings accepted for federated assertions. Both are canonical
/// forms of the same provider.
pub const TRUSTED_ISSUERS: [&str; 2] = ["accounts.google.com", "https://accounts.google.com"];

/// Error type for auth service operations
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// An account with this normalized email already exists
    #[error("user with this email already exists")]
    DuplicateEmail,

    /// Unknown email or wrong password (indistinguishable by design)
    #[error("invalid email or password")]
    InvalidCredentials,

    /// Account has no password credential; only federated login can succeed
    #[error("account has no local credential")]
    FederatedOnly,

    /// Assertion failed cryptographic validation
    #[error(transparent)]
    InvalidAssertion(#[from] AssertionError),

    /// Assertion validated but violates trust policy
    #[error("untrusted federated identity: {0}")]
    UntrustedIdentity(&'static str),

    /// Password hashing or verification failed unexpectedly
    #[error("password operation failed")]
    Password(#[from] PasswordError),

    /// Token issuance failed
    #[error("token issuance failed")]
    Token(#[from] TokenError),

    /// Store operation failed
    #[error("database error")]
    Database(#[from] sqlx::Error),
}

/// Established session: bearer token plus the public user view
#[derive(Debug, Clone)]
pub struct AuthSession {
    /// Signed bearer token, subject = normalized email
    pub token: String,

    /// Public projection of the account (credentials stripped)
    pub user: UserView,
}

/// Authentication orchestrator
pub struct AuthService {
    db: PgPool,
    jwt_secret: String,
    token_expiry: Duration,
    verifier: Arc<dyn IdentityVerifier>,
}

impl AuthService {
    /// Creates the service with its injected collaborators.
    pub fn new(
        db: PgPool,
        jwt_secret: String,
        token_expiry_days: i64,
        verifier: Arc<dyn IdentityVerifier>,
    ) -> Self {
        Self {
            db,
            jwt_secret,
            token_expiry: Duration::days(token_expiry_days),
            verifier,
        }
    }

    /// Registers a new local account and opens a session.
    ///
    /// The store's unique index is the duplicate guard: the insert is
    /// attempted directly and a uniqueness violation maps to
    /// [`AuthError::DuplicateEmail`], so a race between two registrations
    /// cannot create two accounts.
    pub async fn register(
        &self,
        email: &str,
        name: &str,
        password: &str,
    ) -> Result<AuthSession, AuthError> {
        let email = normalize_email(email);
        let password_hash = hash_password(password)?;

        let user = User::create(
            &self.db,
            CreateUser {
                email,
                name: name.to_string(),
                auth_provider: AuthProvider::Local,
                password_hash: Some(password_hash),
                federated_subject_id: None,
            },
        )
        .await
        .map_err(|e| {
            if is_unique_email_violation(&e) {
                AuthError::DuplicateEmail
            } else {
                AuthError::Database(e)
            }
        })?;

        info!(user_id = %user.id, "registered new account");
        self.issue_session(&user)
    }

    /// Authenticates a local account and opens a session.
    ///
    /// An unknown email and a wrong password produce the same outcome. An
    /// account without a password hash can never pass local login; it gets
    /// the distinguishable federated-only outcome instead.
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthSession, AuthError> {
        let email = normalize_email(email);

        let user = User::find_by_email(&self.db, &email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        let Some(hash) = user.password_hash.as_deref() else {
            return Err(AuthError::FederatedOnly);
        };

        if !verify_password(password, hash)? {
            return Err(AuthError::InvalidCredentials);
        }

        self.issue_session(&user)
    }

    /// Authenticates a federated assertion and opens a session.
    ///
    /// A matching account without a linked federated identity gets the
    /// subject id linked (additive; its password hash is preserved). An
    /// unknown email creates a fresh federated-only account.
    pub async fn federated_login(&self, assertion: &str) -> Result<AuthSession, AuthError> {
        let identity = self.verifier.verify(assertion).await?;
        validate_trusted(&identity)?;

        let email = normalize_email(&identity.email);

        let user = match User::find_by_email(&self.db, &email).await? {
            Some(user) if user.federated_subject_id.is_none() => {
                if user.password_hash.is_some() {
                    // Email-match linking onto a password-holding account;
                    // see DESIGN.md for the takeover trade-off.
                    warn!(
                        user_id = %user.id,
                        issuer = %identity.issuer,
                        "linking federated identity to an account with a local credential"
                    );
                }
                match User::link_federated_subject(&self.db, user.id, &identity.subject_id).await? {
                    Some(linked) => linked,
                    // A concurrent login already linked; re-read the record.
                    None => User::find_by_id(&self.db, user.id)
                        .await?
                        .ok_or(AuthError::Database(sqlx::Error::RowNotFound))?,
                }
            }
            Some(user) => user,
            None => {
                let created = User::create(
                    &self.db,
                    CreateUser {
                        email: email.clone(),
                        name: identity
                            .display_name
                            .clone()
                            .unwrap_or_else(|| "Federated User".to_string()),
                        auth_provider: AuthProvider::Federated,
                        password_hash: None,
                        federated_subject_id: Some(identity.subject_id.clone()),
                    },
                )
                .await;

                match created {
                    Ok(user) => {
                        info!(user_id = %user.id, "created account from federated login");
                        user
                    }
                    // A concurrent first login created the account; use it.
                    Err(e) if is_unique_email_violation(&e) => {
                        User::find_by_email(&self.db, &email)
                            .await?
                            .ok_or(AuthError::Database(sqlx::Error::RowNotFound))?
                    }
                    Err(e) => return Err(AuthError::Database(e)),
                }
            }
        };

        self.issue_session(&user)
    }

    fn issue_session(&self, user: &User) -> Result<AuthSession, AuthError> {
        let claims = Claims::new(user.email.clone(), self.token_expiry);
        let token = create_token(&claims, &self.jwt_secret)?;

        Ok(AuthSession {
            token,
            user: UserView::from(user),
        })
    }
}

/// Enforces trust policy on a cryptographically valid identity.
fn validate_trusted(identity: &FederatedIdentity) -> Result<(), AuthError> {
    if !TRUSTED_ISSUERS.contains(&identity.issuer.as_str()) {
        return Err(AuthError::UntrustedIdentity("issuer not on allow-list"));
    }
    if !identity.email_verified {
        return Err(AuthError::UntrustedIdentity("email not verified by provider"));
    }
    if identity.email.is_empty() || identity.subject_id.is_empty() {
        return Err(AuthError::UntrustedIdentity("missing email or subject id"));
    }
    Ok(())
}

fn is_unique_email_violation(err: &sqlx::Error) -> bool {
    matches!(
        err,
        sqlx::Error::Database(db_err)
            if db_err.constraint().map_or(false, |c| c.contains("email"))
    )
}

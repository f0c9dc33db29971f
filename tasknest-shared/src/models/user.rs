/// User model and store operations
///
/// One record per account. Emails are normalized to lowercase before every
/// insert and lookup; the store's unique constraint on `email` is the
/// authoritative duplicate guard (never an existence pre-check). An account
/// can hold a local password hash, a linked federated identity, or both —
/// linking is additive and never removes a credential.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE users (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     email TEXT NOT NULL UNIQUE,
///     name TEXT NOT NULL,
///     auth_provider TEXT NOT NULL DEFAULT 'local',
///     password_hash TEXT,
///     federated_subject_id TEXT,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Authentication provider most recently used by an account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum AuthProvider {
    /// Password credentials held by this service
    Local,

    /// Third-party identity provider
    Federated,
}

impl AuthProvider {
    /// Fixed string token used at the store boundary
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthProvider::Local => "local",
            AuthProvider::Federated => "federated",
        }
    }
}

/// User account record
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    /// Unique account id
    pub id: Uuid,

    /// Email address, always lowercase, unique across all accounts
    pub email: String,

    /// Display name
    pub name: String,

    /// Provider most recently used to establish this account
    pub auth_provider: AuthProvider,

    /// Argon2id digest; absent on federated-only accounts
    pub password_hash: Option<String>,

    /// Stable provider-side subject id once a federated identity is linked
    pub federated_subject_id: Option<String>,

    /// Set once at creation, immutable
    pub created_at: DateTime<Utc>,
}

/// Input for creating a new user
#[derive(Debug, Clone)]
pub struct CreateUser {
    /// Email address (caller must have normalized it to lowercase)
    pub email: String,

    /// Display name
    pub name: String,

    /// Provider establishing the account
    pub auth_provider: AuthProvider,

    /// Argon2id digest, for local-capable accounts
    pub password_hash: Option<String>,

    /// Federated subject id, when created via federated login
    pub federated_subject_id: Option<String>,
}

/// Public projection of a user, safe to return to clients
///
/// Strips `password_hash`, `federated_subject_id`, and `auth_provider`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserView {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for UserView {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            name: user.name.clone(),
            created_at: user.created_at,
        }
    }
}

/// Lowercases an email for storage and lookup.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

impl User {
    /// Creates a new user.
    ///
    /// A unique-constraint violation on `email` surfaces as
    /// `sqlx::Error::Database`; the auth service maps it to its
    /// duplicate-email outcome, making the insert itself the duplicate
    /// guard even under concurrent registration.
    pub async fn create(pool: &PgPool, data: CreateUser) -> Result<Self, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, name, auth_provider, password_hash, federated_subject_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, email, name, auth_provider, password_hash, federated_subject_id, created_at
            "#,
        )
        .bind(data.email)
        .bind(data.name)
        .bind(data.auth_provider)
        .bind(data.password_hash)
        .bind(data.federated_subject_id)
        .fetch_one(pool)
        .await?;

        Ok(user)
    }

    /// Finds a user by id.
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, name, auth_provider, password_hash, federated_subject_id, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Finds a user by normalized email.
    ///
    /// The caller is expected to pass an already-lowercased email;
    /// [`normalize_email`] is applied again here so a raw token subject
    /// can never miss on case.
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, name, auth_provider, password_hash, federated_subject_id, created_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(normalize_email(email))
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Links a federated subject id to an account, if none is linked yet.
    ///
    /// Single atomic update: the filter includes `federated_subject_id IS
    /// NULL`, so a concurrent link cannot overwrite an existing binding.
    /// `password_hash` is untouched. Returns the updated record, or `None`
    /// when the account was already linked (or does not exist).
    pub async fn link_federated_subject(
        pool: &PgPool,
        id: Uuid,
        subject_id: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET federated_subject_id = $2, auth_provider = 'federated'
            WHERE id = $1 AND federated_subject_id IS NULL
            RETURNING id, email, name, auth_provider, password_hash, federated_subject_id, created_at
            "#,
        )
        .bind(id)
        .bind(subject_id)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }
}

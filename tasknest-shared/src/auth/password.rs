/// Password hashing using Argon2id
///
/// Local credentials are stored as Argon2id digests in PHC string format.
/// Parameters: 64 MiB memory, 3 passes, 4 lanes, 32-byte output, 16-byte
/// random salt from the OS RNG. Verification is constant-time.
///
/// Plaintext passwords and digests never leave this module through logs or
/// error messages.
///
/// # Example
///
/// ```
/// use tasknest_shared::auth::password::{hash_password, verify_password};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let digest = hash_password("correct horse battery staple")?;
/// assert!(verify_password("correct horse battery staple", &digest)?);
/// assert!(!verify_password("wrong", &digest)?);
/// # Ok(())
/// # }
/// ```

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2, ParamsBuilder, Version,
};

/// Error type for password hashing operations
#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    /// Failed to produce a digest
    #[error("failed to hash password")]
    Hash,

    /// Stored digest is not a valid PHC string
    #[error("invalid password hash format")]
    InvalidDigest,

    /// Verification failed for a reason other than a wrong password
    #[error("failed to verify password")]
    Verify,
}

/// Hashes a plaintext password into a PHC-format Argon2id digest.
///
/// Each call generates a fresh random salt, so hashing the same password
/// twice yields different digests.
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);

    let params = ParamsBuilder::new()
        .m_cost(65536) // 64 MiB
        .t_cost(3)
        .p_cost(4)
        .output_len(32)
        .build()
        .map_err(|_| PasswordError::Hash)?;

    let argon2 = Argon2::new(argon2::Algorithm::Argon2id, Version::V0x13, params);

    let digest = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|_| PasswordError::Hash)?;

    Ok(digest.to_string())
}

/// Verifies a plaintext password against a stored digest.
///
/// Returns `Ok(false)` for a wrong password; parameters are read from the
/// PHC string so digests hashed under older parameters keep verifying.
pub fn verify_password(password: &str, digest: &str) -> Result<bool, PasswordError> {
    let parsed = PasswordHash::new(digest).map_err(|_| PasswordError::InvalidDigest)?;

    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(_) => Err(PasswordError::Verify),
    }
}

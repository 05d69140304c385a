/// Credential hashing using Argon2id
///
/// Passwords are never stored; the user directory keeps the PHC-format
/// Argon2id string produced here as an opaque byte sequence.
///
/// # Security
///
/// - **Algorithm**: Argon2id
/// - **Memory**: 64 MB (65536 KB) by default
/// - **Iterations**: 3 passes by default
/// - **Parallelism**: 4 lanes by default
/// - **Salt**: 16 random bytes per hash, taken from the OS RNG
///
/// The work factor lives in [`HasherConfig`]. Verification reads the
/// parameters back out of the stored hash, so raising the work factor does
/// not invalidate existing hashes.
///
/// # Example
///
/// ```
/// use sso_shared::auth::password::{Argon2Hasher, CredentialHasher, HasherConfig};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hasher = Argon2Hasher::new(HasherConfig::default());
/// let hash = hasher.hash("super_secret_password_123")?;
///
/// assert!(hasher.verify(&hash, "super_secret_password_123")?);
/// assert!(!hasher.verify(&hash, "wrong_password")?);
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
    /// Failed to hash password
    #[error("Failed to hash password: {0}")]
    HashError(String),

    /// Failed to verify password
    #[error("Failed to verify password: {0}")]
    VerifyError(String),

    /// Stored hash is not a valid PHC string (corrupt data)
    #[error("Invalid password hash format: {0}")]
    InvalidHash(String),
}

/// Argon2id work factor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HasherConfig {
    /// Memory cost in KiB
    pub memory_kib: u32,

    /// Number of passes
    pub iterations: u32,

    /// Degree of parallelism (lanes)
    pub parallelism: u32,
}

impl Default for HasherConfig {
    fn default() -> Self {
        Self {
            memory_kib: 65536, // 64 MB
            iterations: 3,
            parallelism: 4,
        }
    }
}

/// One-way transform of a secret into a verifiable hash
///
/// Implementations must be safe to share between concurrent callers.
pub trait CredentialHasher: Send + Sync {
    /// Hashes `secret` with a fresh random salt
    fn hash(&self, secret: &str) -> Result<Vec<u8>, PasswordError>;

    /// Checks `candidate` against a stored hash
    ///
    /// Returns `Ok(false)` on mismatch. An error means the stored hash itself
    /// is unusable.
    fn verify(&self, hash: &[u8], candidate: &str) -> Result<bool, PasswordError>;
}

/// Argon2id implementation of [`CredentialHasher`]
#[derive(Debug, Clone, Default)]
pub struct Argon2Hasher {
    config: HasherConfig,
}

impl Argon2Hasher {
    /// Creates a hasher with the given work factor
    pub fn new(config: HasherConfig) -> Self {
        Self { config }
    }

    /// Returns the configured work factor
    pub fn config(&self) -> HasherConfig {
        self.config
    }
}

impl CredentialHasher for Argon2Hasher {
    fn hash(&self, secret: &str) -> Result<Vec<u8>, PasswordError> {
        hash_with_config(secret, self.config).map(String::into_bytes)
    }

    fn verify(&self, hash: &[u8], candidate: &str) -> Result<bool, PasswordError> {
        let phc = std::str::from_utf8(hash)
            .map_err(|e| PasswordError::InvalidHash(format!("Hash is not UTF-8: {}", e)))?;
        verify_password(candidate, phc)
    }
}

/// Hashes a password using Argon2id with the default work factor
///
/// # Returns
///
/// PHC string format hash (includes algorithm, parameters, salt, and hash)
///
/// ```text
/// $argon2id$v=19$m=65536,t=3,p=4$c2FsdHNhbHRzYWx0$hash...
/// ```
///
/// # Errors
///
/// Returns `PasswordError::HashError` if hashing fails
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    hash_with_config(password, HasherConfig::default())
}

fn hash_with_config(password: &str, config: HasherConfig) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);

    let params = ParamsBuilder::new()
        .m_cost(config.memory_kib)
        .t_cost(config.iterations)
        .p_cost(config.parallelism)
        .output_len(32)
        .build()
        .map_err(|e| PasswordError::HashError(format!("Invalid parameters: {}", e)))?;

    let argon2 = Argon2::new(argon2::Algorithm::Argon2id, Version::V0x13, params);

    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| PasswordError::HashError(format!("Hash generation failed: {}", e)))?;

    Ok(password_hash.to_string())
}

/// Verifies a password against a PHC-format hash
///
/// Comparison is constant-time.
///
/// # Errors
///
/// Returns `PasswordError::InvalidHash` if the hash cannot be parsed and
/// `PasswordError::VerifyError` for any other failure besides a mismatch.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, PasswordError> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|e| PasswordError::InvalidHash(format!("Failed to parse hash: {}", e)))?;

    // Parameters are embedded in the hash
    let argon2 = Argon2::default();

    match argon2.verify_password(password.as_bytes(), &parsed_hash) {
        Ok(_) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(PasswordError::VerifyError(format!("Verification failed: {}", e))),
    }
}

/// Minimum accepted password length for [`validate_password_strength`]
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Validates password strength
///
/// Only enforces a minimum length. The authentication service does not call
/// this; front ends that want a policy can.
pub fn validate_password_strength(password: &str) -> Result<(), String> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(format!(
            "Password must be at least {} characters long",
            MIN_PASSWORD_LENGTH
        ));
    }

    Ok(())
}

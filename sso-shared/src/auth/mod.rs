/// Authentication primitives
///
/// This module provides the two leaf components the authentication service
/// builds on:
///
/// # Modules
///
/// - [`password`]: Argon2id credential hashing and verification
/// - [`jwt`]: HS256 session token issuance, scoped to an application
///
/// # Security Features
///
/// - **Password Hashing**: Argon2id with a tunable work factor (64 MB, 3 passes, 4 lanes by default)
/// - **Session Tokens**: HS256 signed with the requesting application's secret
/// - **Constant-time Comparison**: Password verification never short-circuits on content
///
/// # Example
///
/// ```
/// use sso_shared::auth::password::{hash_password, verify_password};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("user_password")?;
/// assert!(verify_password("user_password", &hash)?);
/// # Ok(())
/// # }
/// ```

pub mod jwt;
pub mod password;

pub use jwt::{Claims, JwtError, JwtIssuer, TokenIssuer};
pub use password::{Argon2Hasher, CredentialHasher, HasherConfig, PasswordError};

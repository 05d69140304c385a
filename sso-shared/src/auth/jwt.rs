/// Session token issuance
///
/// Tokens are JWTs signed with HS256, using the secret of the application the
/// user is logging into as the HMAC key. They are self-contained: nothing is
/// persisted, and the core never refreshes or revokes them.
///
/// # Claim Layout
///
/// The payload is exactly:
///
/// ```json
/// { "uid": 1, "email": "alice@example.com", "app_id": 1, "exp": 1735689600 }
/// ```
///
/// - `uid`: user ID (integer)
/// - `email`: user email (string)
/// - `app_id`: application ID (integer)
/// - `exp`: expiration as Unix seconds (issuance time + TTL)
///
/// Header is `{"typ":"JWT","alg":"HS256"}`; the token is the usual compact
/// `base64url(header).base64url(payload).base64url(signature)` form.
///
/// # Example
///
/// ```
/// use sso_shared::auth::jwt::{decode_token, JwtIssuer, TokenIssuer};
/// use sso_shared::models::{App, User};
/// use std::time::Duration;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let user = User::new(1, "alice@example.com", Vec::new());
/// let app = App::new(1, "web", "s");
///
/// let token = JwtIssuer.issue(&user, &app, Duration::from_secs(3600))?;
/// let claims = decode_token(&token, "s")?;
/// assert_eq!(claims.uid, 1);
/// assert_eq!(claims.app_id, 1);
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::models::{App, User};

/// Error type for JWT operations
#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    /// Failed to create token
    #[error("Failed to create token: {0}")]
    CreateError(String),

    /// Signing key cannot be used
    #[error("Malformed signing secret for app {app_id}")]
    MalformedSecret { app_id: i32 },

    /// TTL does not fit in a timestamp
    #[error("Token TTL out of range: {0:?}")]
    InvalidTtl(Duration),

    /// Failed to validate token
    #[error("Failed to validate token: {0}")]
    ValidationError(String),

    /// Token has expired
    #[error("Token has expired")]
    Expired,
}

/// Session token claims
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// User ID
    pub uid: i64,

    /// User email
    pub email: String,

    /// Application the token is scoped to
    pub app_id: i32,

    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

impl Claims {
    /// Builds claims for `user` in `app`, expiring `ttl` from now
    pub fn new(user: &User, app: &App, ttl: Duration) -> Result<Self, JwtError> {
        Self::issued_at(user, app, Utc::now(), ttl)
    }

    /// Builds claims as if issued at `now`
    pub fn issued_at(
        user: &User,
        app: &App,
        now: DateTime<Utc>,
        ttl: Duration,
    ) -> Result<Self, JwtError> {
        let ttl_delta = chrono::Duration::from_std(ttl).map_err(|_| JwtError::InvalidTtl(ttl))?;
        let expiration = now
            .checked_add_signed(ttl_delta)
            .ok_or(JwtError::InvalidTtl(ttl))?;

        Ok(Self {
            uid: user.id,
            email: user.email.clone(),
            app_id: app.id,
            exp: expiration.timestamp(),
        })
    }

    /// Expiration as a timestamp
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.exp, 0)
    }

    /// Checks if token has expired
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() >= self.exp
    }
}

/// Mints signed session tokens
///
/// Implementations must be safe to share between concurrent callers.
pub trait TokenIssuer: Send + Sync {
    /// Issues a token binding `user` to `app`, valid for `ttl`
    fn issue(&self, user: &User, app: &App, ttl: Duration) -> Result<String, JwtError>;
}

/// HS256 issuer keyed by the application secret
#[derive(Debug, Clone, Copy, Default)]
pub struct JwtIssuer;

impl TokenIssuer for JwtIssuer {
    fn issue(&self, user: &User, app: &App, ttl: Duration) -> Result<String, JwtError> {
        if app.secret.is_empty() {
            return Err(JwtError::MalformedSecret { app_id: app.id });
        }

        let claims = Claims::new(user, app, ttl)?;
        create_token(&claims, &app.secret)
    }
}

/// Signs claims with HS256
pub fn create_token(claims: &Claims, secret: &str) -> Result<String, JwtError> {
    let header = Header::new(Algorithm::HS256);
    let key = EncodingKey::from_secret(secret.as_bytes());

    encode(&header, claims, &key)
        .map_err(|e| JwtError::CreateError(format!("Token encoding failed: {}", e)))
}

/// Verifies a token's signature and expiry and returns its claims
///
/// Verification belongs to whoever consumes the tokens; this is provided so
/// they read the exact layout the issuer writes.
pub fn decode_token(token: &str, secret: &str) -> Result<Claims, JwtError> {
    let key = DecodingKey::from_secret(secret.as_bytes());

    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;
    validation.leeway = 0;
    validation.set_required_spec_claims(&["exp"]);

    let token_data = decode::<Claims>(token, &key, &validation).map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::Expired,
        _ => JwtError::ValidationError(format!("Token validation failed: {}", e)),
    })?;

    Ok(token_data.claims)
}

/// Authentication service
///
/// Orchestrates the user directory, application registry, credential hasher
/// and token issuer into three operations:
///
/// - [`AuthService::login`]: verify credentials and mint a token for an app
/// - [`AuthService::register`]: hash a password and persist a new user
/// - [`AuthService::is_admin`]: answer an admin-privilege query
///
/// The service holds no mutable state. Share it behind an `Arc` and call it
/// from as many tasks as needed; thread safety of the collaborators is their
/// own responsibility.
///
/// # Error Policy
///
/// Nothing is retried. Known conditions are classified into
/// [`AuthErrorKind`]; everything else becomes [`AuthErrorKind::Internal`].
/// Each error carries the name of the operation that produced it.
///
/// An unknown email and a wrong password both yield
/// [`AuthErrorKind::InvalidCredentials`], so callers cannot learn which
/// addresses are registered.
///
/// # Logging
///
/// Every operation opens a span under the handle passed to
/// [`AuthService::new`]. Attempts and outcomes are logged with the email
/// address attached, which is a privacy consideration for log retention.
///
/// # Example
///
/// ```
/// use sso_shared::auth::{Argon2Hasher, HasherConfig, JwtIssuer};
/// use sso_shared::context::CallContext;
/// use sso_shared::models::App;
/// use sso_shared::services::auth::{AuthConfig, AuthService};
/// use sso_shared::storage::memory::MemoryStore;
/// use std::sync::Arc;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store = Arc::new(MemoryStore::with_apps([App::new(1, "web", "s")]));
/// let auth = AuthService::new(
///     tracing::Span::current(),
///     store.clone(),
///     store,
///     Arc::new(Argon2Hasher::new(HasherConfig::default())),
///     Arc::new(JwtIssuer),
///     AuthConfig::default(),
/// );
///
/// let ctx = CallContext::background();
/// let user_id = auth.register(&ctx, "alice@example.com", "pw123456").await?;
/// let token = auth.login(&ctx, "alice@example.com", "pw123456", 1).await?;
/// # Ok(())
/// # }
/// ```

use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, info_span, warn, Instrument, Span};

use crate::auth::jwt::TokenIssuer;
use crate::auth::password::CredentialHasher;
use crate::context::CallContext;
use crate::storage::{AppRegistry, StorageError, UserDirectory};

const OP_LOGIN: &str = "auth.login";
const OP_REGISTER: &str = "auth.register";
const OP_IS_ADMIN: &str = "auth.is_admin";

/// Default session token lifetime (1 hour)
pub const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(3600);

/// Classification of authentication failures
#[derive(Debug, thiserror::Error)]
pub enum AuthErrorKind {
    /// Unknown email or wrong password, deliberately indistinguishable
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Unknown application ID
    #[error("invalid app id")]
    InvalidApplication,

    /// Registration with an email that is already taken
    #[error("user already exists")]
    UserExists,

    /// Admin lookup for an unknown user ID
    #[error("user not found")]
    UserNotFound,

    /// Any lower-layer failure (storage, hashing, signing, cancellation)
    #[error("internal error")]
    Internal(#[source] Box<dyn std::error::Error + Send + Sync + 'static>),
}

/// Error returned by [`AuthService`] operations
///
/// Displays as `"<operation>: <kind>"`.
#[derive(Debug, thiserror::Error)]
#[error("{op}: {kind}")]
pub struct AuthError {
    op: &'static str,
    #[source]
    kind: AuthErrorKind,
}

impl AuthError {
    fn new(op: &'static str, kind: AuthErrorKind) -> Self {
        Self { op, kind }
    }

    fn internal(op: &'static str, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::new(op, AuthErrorKind::Internal(Box::new(source)))
    }

    /// Classification for programmatic matching
    pub fn kind(&self) -> &AuthErrorKind {
        &self.kind
    }

    /// Consumes the error, returning its classification
    pub fn into_kind(self) -> AuthErrorKind {
        self.kind
    }

    /// Name of the operation that failed
    pub fn op(&self) -> &'static str {
        self.op
    }

    /// Whether this is an unclassified lower-layer failure
    pub fn is_internal(&self) -> bool {
        matches!(self.kind, AuthErrorKind::Internal(_))
    }
}

/// How [`AuthService::is_admin`] classifies an unknown user
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum NotFoundPolicy {
    /// Report [`AuthErrorKind::UserNotFound`]
    #[default]
    UserNotFound,

    /// Report [`AuthErrorKind::InvalidApplication`], matching older
    /// deployments whose clients branch on that kind
    InvalidApplication,
}

impl std::str::FromStr for NotFoundPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "user_not_found" | "user" => Ok(NotFoundPolicy::UserNotFound),
            "invalid_application" | "invalid_app" | "legacy" => {
                Ok(NotFoundPolicy::InvalidApplication)
            }
            other => Err(format!("unknown not-found policy: {}", other)),
        }
    }
}

/// Authentication policy settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthConfig {
    /// Lifetime of issued session tokens
    pub token_ttl: Duration,

    /// Classification of an unknown user in admin lookups
    pub admin_not_found: NotFoundPolicy,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            token_ttl: DEFAULT_TOKEN_TTL,
            admin_not_found: NotFoundPolicy::default(),
        }
    }
}

/// Authentication service
pub struct AuthService {
    log: Span,
    users: Arc<dyn UserDirectory>,
    apps: Arc<dyn AppRegistry>,
    hasher: Arc<dyn CredentialHasher>,
    issuer: Arc<dyn TokenIssuer>,
    config: AuthConfig,
}

impl AuthService {
    /// Creates a new service
    ///
    /// `log` is the parent span for everything the service records.
    pub fn new(
        log: Span,
        users: Arc<dyn UserDirectory>,
        apps: Arc<dyn AppRegistry>,
        hasher: Arc<dyn CredentialHasher>,
        issuer: Arc<dyn TokenIssuer>,
        config: AuthConfig,
    ) -> Self {
        Self {
            log,
            users,
            apps,
            hasher,
            issuer,
            config,
        }
    }

    /// Active configuration
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    /// Checks the credentials and returns a session token scoped to `app_id`
    ///
    /// # Errors
    ///
    /// - `InvalidCredentials`: unknown email or wrong password
    /// - `InvalidApplication`: unknown `app_id`
    /// - `Internal`: storage, hashing or signing failure, or the context was
    ///   cancelled / timed out
    pub async fn login(
        &self,
        ctx: &CallContext,
        email: &str,
        password: &str,
        app_id: i32,
    ) -> Result<String, AuthError> {
        let span = info_span!(parent: &self.log, "login", op = OP_LOGIN, email = %email, app_id);

        async move {
            info!("attempting to login user");

            let user = match ctx.run(self.users.find_user_by_email(email)).await {
                Ok(user) => user,
                Err(StorageError::UserNotFound) => {
                    warn!("user not found");
                    return Err(AuthError::new(OP_LOGIN, AuthErrorKind::InvalidCredentials));
                }
                Err(e) => {
                    error!(error = %e, "failed to get user");
                    return Err(AuthError::internal(OP_LOGIN, e));
                }
            };

            match self.hasher.verify(&user.pass_hash, password) {
                Ok(true) => {}
                Ok(false) => {
                    warn!(user_id = user.id, "invalid credentials");
                    return Err(AuthError::new(OP_LOGIN, AuthErrorKind::InvalidCredentials));
                }
                Err(e) => {
                    error!(user_id = user.id, error = %e, "stored password hash is unusable");
                    return Err(AuthError::internal(OP_LOGIN, e));
                }
            }

            let app = match ctx.run(self.apps.find_app(app_id)).await {
                Ok(app) => app,
                Err(StorageError::AppNotFound) => {
                    warn!("app not found");
                    return Err(AuthError::new(OP_LOGIN, AuthErrorKind::InvalidApplication));
                }
                Err(e) => {
                    error!(error = %e, "failed to get app");
                    return Err(AuthError::internal(OP_LOGIN, e));
                }
            };

            let token = self
                .issuer
                .issue(&user, &app, self.config.token_ttl)
                .map_err(|e| {
                    error!(error = %e, "failed to generate token");
                    AuthError::internal(OP_LOGIN, e)
                })?;

            info!(user_id = user.id, "user logged in successfully");
            Ok(token)
        }
        .instrument(span)
        .await
    }

    /// Registers a new user and returns the assigned ID
    ///
    /// # Errors
    ///
    /// - `UserExists`: the email is already registered
    /// - `Internal`: hashing or storage failure, or the context was
    ///   cancelled / timed out
    pub async fn register(
        &self,
        ctx: &CallContext,
        email: &str,
        password: &str,
    ) -> Result<i64, AuthError> {
        let span = info_span!(parent: &self.log, "register", op = OP_REGISTER, email = %email);

        async move {
            info!("registering user");

            let pass_hash = self.hasher.hash(password).map_err(|e| {
                error!(error = %e, "failed to generate password hash");
                AuthError::internal(OP_REGISTER, e)
            })?;

            let id = match ctx.run(self.users.save_user(email, pass_hash)).await {
                Ok(id) => id,
                Err(StorageError::UserExists) => {
                    warn!("user already exists");
                    return Err(AuthError::new(OP_REGISTER, AuthErrorKind::UserExists));
                }
                Err(e) => {
                    error!(error = %e, "failed to save user");
                    return Err(AuthError::internal(OP_REGISTER, e));
                }
            };

            info!(user_id = id, "user registered");
            Ok(id)
        }
        .instrument(span)
        .await
    }

    /// Reports whether `user_id` holds administrative privileges
    ///
    /// # Errors
    ///
    /// - `UserNotFound` (or `InvalidApplication` under
    ///   [`NotFoundPolicy::InvalidApplication`]): unknown user
    /// - `Internal`: storage failure, or the context was cancelled / timed out
    pub async fn is_admin(&self, ctx: &CallContext, user_id: i64) -> Result<bool, AuthError> {
        let span = info_span!(parent: &self.log, "is_admin", op = OP_IS_ADMIN, user_id);

        async move {
            info!("checking if user is admin");

            let is_admin = match ctx.run(self.users.is_admin(user_id)).await {
                Ok(flag) => flag,
                Err(e) if e.is_not_found() => {
                    let kind = match self.config.admin_not_found {
                        NotFoundPolicy::UserNotFound => AuthErrorKind::UserNotFound,
                        NotFoundPolicy::InvalidApplication => {
                            warn!("reporting unknown user as invalid app id (legacy policy)");
                            AuthErrorKind::InvalidApplication
                        }
                    };
                    warn!(error = %e, "user not found");
                    return Err(AuthError::new(OP_IS_ADMIN, kind));
                }
                Err(e) => {
                    error!(error = %e, "failed to check admin flag");
                    return Err(AuthError::internal(OP_IS_ADMIN, e));
                }
            };

            info!(is_admin, "checked if user is admin");
            Ok(is_admin)
        }
        .instrument(span)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::{decode_token, JwtError, JwtIssuer};
    use crate::auth::password::{Argon2Hasher, HasherConfig, PasswordError};
    use crate::models::{App, User};
    use crate::storage::memory::MemoryStore;
    use crate::storage::StorageResult;
    use async_trait::async_trait;

    fn fast_hasher() -> Arc<Argon2Hasher> {
        Arc::new(Argon2Hasher::new(HasherConfig {
            memory_kib: 1024,
            iterations: 1,
            parallelism: 1,
        }))
    }

    fn service_with(store: Arc<MemoryStore>, config: AuthConfig) -> AuthService {
        AuthService::new(
            Span::none(),
            store.clone(),
            store,
            fast_hasher(),
            Arc::new(JwtIssuer),
            config,
        )
    }

    fn service() -> (AuthService, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::with_apps([App::new(1, "web", "s")]));
        (service_with(store.clone(), AuthConfig::default()), store)
    }

    /// Directory whose every call fails with a database-level error
    struct BrokenDirectory;

    #[async_trait]
    impl UserDirectory for BrokenDirectory {
        async fn save_user(&self, _email: &str, _pass_hash: Vec<u8>) -> StorageResult<i64> {
            Err(StorageError::Unavailable("disk on fire".into()))
        }

        async fn find_user_by_email(&self, _email: &str) -> StorageResult<User> {
            Err(StorageError::Unavailable("disk on fire".into()))
        }

        async fn is_admin(&self, _user_id: i64) -> StorageResult<bool> {
            Err(StorageError::Unavailable("disk on fire".into()))
        }
    }

    /// Directory that reports unknown users the way older stores did
    struct LegacyAdminDirectory;

    #[async_trait]
    impl UserDirectory for LegacyAdminDirectory {
        async fn save_user(&self, _email: &str, _pass_hash: Vec<u8>) -> StorageResult<i64> {
            Ok(1)
        }

        async fn find_user_by_email(&self, _email: &str) -> StorageResult<User> {
            Err(StorageError::UserNotFound)
        }

        async fn is_admin(&self, _user_id: i64) -> StorageResult<bool> {
            Err(StorageError::AppNotFound)
        }
    }

    struct FailingHasher;

    impl CredentialHasher for FailingHasher {
        fn hash(&self, _secret: &str) -> Result<Vec<u8>, PasswordError> {
            Err(PasswordError::HashError("no entropy".into()))
        }

        fn verify(&self, _hash: &[u8], _candidate: &str) -> Result<bool, PasswordError> {
            Err(PasswordError::InvalidHash("corrupt".into()))
        }
    }

    struct FailingIssuer;

    impl TokenIssuer for FailingIssuer {
        fn issue(&self, _user: &User, app: &App, _ttl: Duration) -> Result<String, JwtError> {
            Err(JwtError::MalformedSecret { app_id: app.id })
        }
    }

    #[tokio::test]
    async fn test_register_then_login() {
        let (auth, _) = service();
        let ctx = CallContext::background();

        let id = auth.register(&ctx, "a@b.com", "secret1").await.unwrap();
        assert_eq!(id, 1);

        let token = auth.login(&ctx, "a@b.com", "secret1", 1).await.unwrap();
        let claims = decode_token(&token, "s").unwrap();
        assert_eq!(claims.uid, 1);
        assert_eq!(claims.email, "a@b.com");
        assert_eq!(claims.app_id, 1);
    }

    #[tokio::test]
    async fn test_token_expiration_uses_configured_ttl() {
        let store = Arc::new(MemoryStore::with_apps([App::new(1, "web", "s")]));
        let auth = service_with(
            store,
            AuthConfig {
                token_ttl: Duration::from_secs(900),
                ..Default::default()
            },
        );
        let ctx = CallContext::background();
        auth.register(&ctx, "a@b.com", "secret1").await.unwrap();

        let before = chrono::Utc::now().timestamp();
        let token = auth.login(&ctx, "a@b.com", "secret1", 1).await.unwrap();
        let after = chrono::Utc::now().timestamp();

        let exp = decode_token(&token, "s").unwrap().exp;
        assert!(exp >= before + 900 && exp <= after + 900);
    }

    #[tokio::test]
    async fn test_unknown_email_and_wrong_password_are_indistinguishable() {
        let (auth, _) = service();
        let ctx = CallContext::background();
        auth.register(&ctx, "a@b.com", "secret1").await.unwrap();

        let unknown = auth.login(&ctx, "x@y.com", "secret1", 1).await.unwrap_err();
        let wrong = auth.login(&ctx, "a@b.com", "secret2", 1).await.unwrap_err();

        assert!(matches!(unknown.kind(), AuthErrorKind::InvalidCredentials));
        assert!(matches!(wrong.kind(), AuthErrorKind::InvalidCredentials));
        assert_eq!(unknown.to_string(), wrong.to_string());
        assert_eq!(unknown.op(), "auth.login");
    }

    #[tokio::test]
    async fn test_login_unknown_app() {
        let (auth, _) = service();
        let ctx = CallContext::background();
        auth.register(&ctx, "a@b.com", "secret1").await.unwrap();

        let err = auth.login(&ctx, "a@b.com", "secret1", 42).await.unwrap_err();
        assert!(matches!(err.kind(), AuthErrorKind::InvalidApplication));
    }

    #[tokio::test]
    async fn test_bad_credentials_checked_before_app() {
        let (auth, _) = service();
        let ctx = CallContext::background();
        auth.register(&ctx, "a@b.com", "secret1").await.unwrap();

        let err = auth.login(&ctx, "a@b.com", "nope", 42).await.unwrap_err();
        assert!(matches!(err.kind(), AuthErrorKind::InvalidCredentials));
    }

    #[tokio::test]
    async fn test_duplicate_registration() {
        let (auth, store) = service();
        let ctx = CallContext::background();

        auth.register(&ctx, "a@b.com", "secret1").await.unwrap();
        let err = auth.register(&ctx, "a@b.com", "other").await.unwrap_err();

        assert!(matches!(err.kind(), AuthErrorKind::UserExists));
        assert_eq!(err.op(), "auth.register");
        assert_eq!(err.to_string(), "auth.register: user already exists");
        assert_eq!(store.user_count().await, 1);
    }

    #[tokio::test]
    async fn test_is_admin() {
        let (auth, store) = service();
        let ctx = CallContext::background();
        let id = auth.register(&ctx, "a@b.com", "secret1").await.unwrap();

        assert!(!auth.is_admin(&ctx, id).await.unwrap());
        store.set_admin(id, true).await.unwrap();
        assert!(auth.is_admin(&ctx, id).await.unwrap());
    }

    #[tokio::test]
    async fn test_is_admin_unknown_user() {
        let (auth, _) = service();
        let err = auth.is_admin(&CallContext::background(), 99).await.unwrap_err();

        assert!(matches!(err.kind(), AuthErrorKind::UserNotFound));
        assert_eq!(err.op(), "auth.is_admin");
    }

    #[tokio::test]
    async fn test_is_admin_legacy_policy() {
        let store = Arc::new(MemoryStore::new());
        let auth = service_with(
            store,
            AuthConfig {
                admin_not_found: NotFoundPolicy::InvalidApplication,
                ..Default::default()
            },
        );

        let err = auth.is_admin(&CallContext::background(), 99).await.unwrap_err();
        assert!(matches!(err.kind(), AuthErrorKind::InvalidApplication));
    }

    #[tokio::test]
    async fn test_is_admin_legacy_directory_report() {
        let auth = AuthService::new(
            Span::none(),
            Arc::new(LegacyAdminDirectory),
            Arc::new(MemoryStore::new()),
            fast_hasher(),
            Arc::new(JwtIssuer),
            AuthConfig::default(),
        );

        let err = auth.is_admin(&CallContext::background(), 5).await.unwrap_err();
        assert!(matches!(err.kind(), AuthErrorKind::UserNotFound));
    }

    #[tokio::test]
    async fn test_storage_failures_are_internal() {
        let auth = AuthService::new(
            Span::none(),
            Arc::new(BrokenDirectory),
            Arc::new(MemoryStore::new()),
            fast_hasher(),
            Arc::new(JwtIssuer),
            AuthConfig::default(),
        );
        let ctx = CallContext::background();

        let login = auth.login(&ctx, "a@b.com", "pw", 1).await.unwrap_err();
        let register = auth.register(&ctx, "a@b.com", "pw").await.unwrap_err();
        let admin = auth.is_admin(&ctx, 1).await.unwrap_err();

        for err in [&login, &register, &admin] {
            assert!(err.is_internal(), "expected internal, got {}", err);
        }

        assert_eq!(login.to_string(), "auth.login: internal error");

        let kind = std::error::Error::source(&login).unwrap();
        assert_eq!(kind.to_string(), "internal error");
        let cause = kind.source().unwrap();
        assert_eq!(cause.to_string(), "storage unavailable: disk on fire");
    }

    #[tokio::test]
    async fn test_hasher_failures_are_internal() {
        let store = Arc::new(MemoryStore::with_apps([App::new(1, "web", "s")]));
        store.save_user("a@b.com", b"whatever".to_vec()).await.unwrap();

        let auth = AuthService::new(
            Span::none(),
            store.clone(),
            store,
            Arc::new(FailingHasher),
            Arc::new(JwtIssuer),
            AuthConfig::default(),
        );
        let ctx = CallContext::background();

        assert!(auth.register(&ctx, "new@b.com", "pw").await.unwrap_err().is_internal());
        assert!(auth.login(&ctx, "a@b.com", "pw", 1).await.unwrap_err().is_internal());
    }

    #[tokio::test]
    async fn test_corrupt_stored_hash_is_internal() {
        let (auth, store) = service();
        store.save_user("a@b.com", b"not-a-phc-string".to_vec()).await.unwrap();

        let err = auth
            .login(&CallContext::background(), "a@b.com", "pw", 1)
            .await
            .unwrap_err();
        assert!(err.is_internal());
    }

    #[tokio::test]
    async fn test_signing_failure_is_internal() {
        let store = Arc::new(MemoryStore::with_apps([App::new(1, "web", "s")]));
        let auth = AuthService::new(
            Span::none(),
            store.clone(),
            store,
            fast_hasher(),
            Arc::new(FailingIssuer),
            AuthConfig::default(),
        );
        let ctx = CallContext::background();
        auth.register(&ctx, "a@b.com", "secret1").await.unwrap();

        let err = auth.login(&ctx, "a@b.com", "secret1", 1).await.unwrap_err();
        assert!(err.is_internal());
    }

    #[tokio::test]
    async fn test_cancelled_context_is_internal() {
        let (auth, store) = service();
        let ctx = CallContext::background();
        auth.register(&ctx, "a@b.com", "secret1").await.unwrap();

        let cancelled = CallContext::background();
        cancelled.cancel();

        let login = auth.login(&cancelled, "a@b.com", "secret1", 1).await.unwrap_err();
        let register = auth.register(&cancelled, "c@d.com", "pw").await.unwrap_err();
        let admin = auth.is_admin(&cancelled, 1).await.unwrap_err();

        for err in [login, register, admin] {
            match err.into_kind() {
                AuthErrorKind::Internal(source) => {
                    assert_eq!(source.to_string(), "operation cancelled");
                }
                other => panic!("expected internal, got {:?}", other),
            }
        }

        // Nothing was written under the cancelled context
        assert_eq!(store.user_count().await, 1);

        // Service is still usable afterwards
        assert!(auth.login(&ctx, "a@b.com", "secret1", 1).await.is_ok());
    }

    #[test]
    fn test_not_found_policy_from_str() {
        assert_eq!(
            "user_not_found".parse::<NotFoundPolicy>(),
            Ok(NotFoundPolicy::UserNotFound)
        );
        assert_eq!(
            "legacy".parse::<NotFoundPolicy>(),
            Ok(NotFoundPolicy::InvalidApplication)
        );
        assert_eq!(
            "INVALID_APPLICATION".parse::<NotFoundPolicy>(),
            Ok(NotFoundPolicy::InvalidApplication)
        );
        assert!("bogus".parse::<NotFoundPolicy>().is_err());
    }
}

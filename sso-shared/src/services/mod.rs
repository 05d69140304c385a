/// Business services
///
/// - `auth`: Login, registration and admin-privilege queries

pub mod auth;

pub use auth::{AuthConfig, AuthError, AuthErrorKind, AuthService, NotFoundPolicy};

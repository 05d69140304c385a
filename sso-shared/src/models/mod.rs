/// Domain records consumed by the authentication core
///
/// # Models
///
/// - `user`: User identity record (id, email, password hash)
/// - `app`: Application descriptor whose secret signs session tokens
///
/// Both are read-only from the core's point of view; only the storage layer
/// creates or destroys them.

pub mod app;
pub mod user;

pub use app::App;
pub use user::User;

//! # SSO Shared Library
//!
//! This crate contains the authentication core of the SSO service: credential
//! hashing, token issuance, the storage contracts the core consumes and the
//! authentication service that ties them together.
//!
//! ## Module Organization
//!
//! - `auth`: Password hashing and JWT issuance
//! - `context`: Cancellation and deadline propagation for collaborator calls
//! - `db`: SQLite connection pool and migrations
//! - `models`: Domain records (users, applications)
//! - `services`: The authentication service (login, register, admin check)
//! - `storage`: User directory / application registry contracts and stores

pub mod auth;
pub mod context;
pub mod db;
pub mod models;
pub mod services;
pub mod storage;

/// Current version of the SSO shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}

//! # SSO Server Library
//!
//! Process-level wiring around the authentication core.
//!
//! ## Modules
//!
//! - `app`: Builds the storage and authentication service from configuration
//! - `config`: Configuration management
//! - `telemetry`: Tracing subscriber setup

pub mod app;
pub mod config;
pub mod telemetry;

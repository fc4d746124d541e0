//! Configuration modules for the Authgate API.
//!
//! Each submodule handles one aspect of configuration, loaded from
//! environment variables with development-friendly defaults.
//!
//! # Modules
//!
//! - [`cors`]: CORS (Cross-Origin Resource Sharing) configuration
//! - [`database`]: PostgreSQL database connection pool initialization
//! - [`email`]: Email/SMTP configuration for outbound mail
//! - [`jwt`]: Access and refresh token configuration
//! - [`session`]: Session cookie scheme and signing configuration

pub mod cors;
pub mod database;
pub mod email;
pub mod jwt;
pub mod session;

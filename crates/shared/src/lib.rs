//! Shared configuration, auth, and notification plumbing for Kintai.
//!
//! This crate holds the pieces every other crate needs:
//! - Configuration loading
//! - JWT claims and token validation
//! - Email notification service

pub mod auth;
pub mod config;
pub mod email;
pub mod jwt;

pub use auth::Claims;
pub use config::AppConfig;
pub use email::{EmailError, EmailService};
pub use jwt::{JwtConfig, JwtError, JwtService};

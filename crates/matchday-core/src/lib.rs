//! Matchday client core.
//!
//! Library behind the Matchday apps: a typed API client for the backend, a
//! persistent session store, and the session lifecycle manager (login,
//! register, refresh, logout, and startup resume).
//!
//! The UI layers depend on this crate and never talk to the backend or the
//! persisted store directly.

pub mod api;
pub mod auth;
pub mod config;
pub mod models;

pub use api::{ApiClient, ApiError};
pub use auth::{AuthError, AuthState, SessionManager};
pub use config::Config;
pub use models::UserProfile;

//! Authentication: session data, persistent stores, and the lifecycle manager.
//!
//! This module provides:
//! - `PersistedSession`: the complete credential tuple for one logged-in user
//! - `SessionStore`: batched persistence (file-backed or OS keychain)
//! - `SessionManager`: login, register, refresh, logout, and startup resume

pub mod error;
pub mod manager;
pub mod session;
pub mod store;

pub use error::AuthError;
pub use manager::{AuthState, SessionManager};
pub use session::PersistedSession;
pub use store::{FileSessionStore, KeychainSessionStore, SessionStore};

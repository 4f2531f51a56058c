//! HTTP layer: typed client and error taxonomy for the Matchday backend.

pub mod client;
pub mod error;

pub use client::{
    ApiClient, AuthSuccess, LoginRequest, RefreshResponse, RegisterRequest, SessionInfo,
    Timeouts, TokenPair,
};
pub use error::ApiError;

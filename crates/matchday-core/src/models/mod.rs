//! Domain models shared across the client.

pub mod event;
pub mod user;

pub use event::{Event, GeoPoint};
pub use user::UserProfile;

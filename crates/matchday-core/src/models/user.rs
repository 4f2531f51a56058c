use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A user profile as returned by the backend.
///
/// The backend owns the profile shape. Fields the client does not interpret
/// (stats, avatar, preferences) live in `extra` and are round-tripped as-is,
/// so a newer server never loses data through an older client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(alias = "_id")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

impl UserProfile {
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            self.email.as_deref().unwrap_or(&self.id)
        } else {
            &self.name
        }
    }
}

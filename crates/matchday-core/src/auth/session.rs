use std::collections::BTreeMap;

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Duration, TimeZone, Utc};

use crate::api::TokenPair;
use crate::models::UserProfile;

// Store keys shared with the other Matchday clients; do not rename.
pub const KEY_USER: &str = "user";
pub const KEY_ACCESS_TOKEN: &str = "accessToken";
pub const KEY_REFRESH_TOKEN: &str = "refreshToken";
pub const KEY_TOKEN_EXPIRY: &str = "tokenExpiry";
pub const KEY_REMEMBER_ME: &str = "rememberMe";
pub const KEY_SESSION_DURATION: &str = "sessionDuration";

/// A complete authenticated session. Absence of a session means "logged out";
/// there is never a partially populated one.
#[derive(Debug, Clone, PartialEq)]
pub struct PersistedSession {
    pub user: UserProfile,
    pub access_token: String,
    pub refresh_token: String,
    /// Wall-clock instant at which `access_token` stops being accepted.
    /// Always derived from the server's `expiresIn`, never computed locally.
    pub expires_at: DateTime<Utc>,
    /// Server-assigned session duration choice made at login/register time.
    pub remember_me: bool,
    /// Display-only label for the session duration (e.g. "30 days").
    pub session_duration: Option<String>,
}

impl PersistedSession {
    /// Build a session from a fresh token grant.
    pub fn from_grant(
        user: UserProfile,
        tokens: &TokenPair,
        remember_me: bool,
        session_duration: Option<String>,
    ) -> Self {
        Self {
            user,
            access_token: tokens.access_token.clone(),
            refresh_token: tokens.refresh_token.clone(),
            expires_at: expiry_from_now(tokens.expires_in),
            remember_me,
            session_duration,
        }
    }

    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }

    pub fn time_until_expiry(&self) -> Duration {
        self.expires_at - Utc::now()
    }

    /// Apply a rotated token pair. The previous refresh token is discarded.
    pub fn rotate(&mut self, tokens: &TokenPair, remember_me: Option<bool>) {
        self.access_token = tokens.access_token.clone();
        self.refresh_token = tokens.refresh_token.clone();
        self.expires_at = expiry_from_now(tokens.expires_in);
        if let Some(remember) = remember_me {
            self.remember_me = remember;
        }
    }

    /// Flatten to the persisted key/value form.
    pub fn to_map(&self) -> Result<BTreeMap<String, String>> {
        let mut map = BTreeMap::new();
        map.insert(
            KEY_USER.to_string(),
            serde_json::to_string(&self.user).context("Failed to serialize user profile")?,
        );
        map.insert(KEY_ACCESS_TOKEN.to_string(), self.access_token.clone());
        map.insert(KEY_REFRESH_TOKEN.to_string(), self.refresh_token.clone());
        map.insert(
            KEY_TOKEN_EXPIRY.to_string(),
            self.expires_at.timestamp_millis().to_string(),
        );
        map.insert(KEY_REMEMBER_ME.to_string(), self.remember_me.to_string());
        if let Some(ref duration) = self.session_duration {
            map.insert(KEY_SESSION_DURATION.to_string(), duration.clone());
        }
        Ok(map)
    }

    /// Rebuild from the persisted key/value form. A record missing any
    /// required key is rejected rather than patched up.
    pub fn from_map(map: &BTreeMap<String, String>) -> Result<Self> {
        let get = |key: &str| {
            map.get(key)
                .ok_or_else(|| anyhow!("Missing session key: {}", key))
        };

        let user: UserProfile = serde_json::from_str(get(KEY_USER)?)
            .context("Failed to parse stored user profile")?;
        let expiry_ms: i64 = get(KEY_TOKEN_EXPIRY)?
            .parse()
            .context("Invalid stored token expiry")?;
        let expires_at = Utc
            .timestamp_millis_opt(expiry_ms)
            .single()
            .ok_or_else(|| anyhow!("Stored token expiry out of range"))?;

        Ok(Self {
            user,
            access_token: get(KEY_ACCESS_TOKEN)?.clone(),
            refresh_token: get(KEY_REFRESH_TOKEN)?.clone(),
            expires_at,
            remember_me: map.get(KEY_REMEMBER_ME).map(|v| v == "true").unwrap_or(false),
            session_duration: map.get(KEY_SESSION_DURATION).cloned(),
        })
    }
}

/// Absolute expiry from a server-issued lifetime in milliseconds.
pub fn expiry_from_now(expires_in_ms: i64) -> DateTime<Utc> {
    Utc::now() + Duration::milliseconds(expires_in_ms)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_user() -> UserProfile {
        serde_json::from_str(r#"{"id": "1", "name": "A", "email": "a@b.com"}"#).expect("user")
    }

    fn sample_tokens() -> TokenPair {
        TokenPair {
            access_token: "tok1".to_string(),
            refresh_token: "ref1".to_string(),
            expires_in: 3_600_000,
        }
    }

    #[test]
    fn test_from_grant_derives_expiry_from_server_lifetime() {
        let session = PersistedSession::from_grant(sample_user(), &sample_tokens(), false, None);
        let expected = Utc::now() + Duration::milliseconds(3_600_000);
        let drift = (session.expires_at - expected).num_milliseconds().abs();
        assert!(drift < 1000, "expiry drifted {}ms from expected", drift);
        assert!(!session.is_expired());
    }

    #[test]
    fn test_is_expired() {
        let mut session = PersistedSession::from_grant(sample_user(), &sample_tokens(), false, None);
        session.expires_at = Utc::now() - Duration::seconds(1);
        assert!(session.is_expired());
    }

    #[test]
    fn test_map_round_trip_uses_exact_keys() {
        let session = PersistedSession::from_grant(
            sample_user(),
            &sample_tokens(),
            true,
            Some("30 days".to_string()),
        );
        let map = session.to_map().expect("to_map");

        let keys: Vec<&str> = map.keys().map(String::as_str).collect();
        assert_eq!(
            keys,
            vec![
                "accessToken",
                "refreshToken",
                "rememberMe",
                "sessionDuration",
                "tokenExpiry",
                "user",
            ]
        );
        assert_eq!(map["rememberMe"], "true");
        assert_eq!(
            map["tokenExpiry"],
            session.expires_at.timestamp_millis().to_string()
        );

        let restored = PersistedSession::from_map(&map).expect("from_map");
        // Millisecond precision survives the epoch-ms round trip
        assert_eq!(restored.access_token, session.access_token);
        assert_eq!(restored.refresh_token, session.refresh_token);
        assert_eq!(
            restored.expires_at.timestamp_millis(),
            session.expires_at.timestamp_millis()
        );
        assert_eq!(restored.user, session.user);
        assert!(restored.remember_me);
        assert_eq!(restored.session_duration.as_deref(), Some("30 days"));
    }

    #[test]
    fn test_from_map_rejects_partial_record() {
        let session = PersistedSession::from_grant(sample_user(), &sample_tokens(), false, None);
        let mut map = session.to_map().expect("to_map");
        map.remove(KEY_REFRESH_TOKEN);
        let err = PersistedSession::from_map(&map).unwrap_err();
        assert!(err.to_string().contains("refreshToken"));
    }

    #[test]
    fn test_rotate_discards_previous_refresh_token() {
        let mut session = PersistedSession::from_grant(sample_user(), &sample_tokens(), false, None);
        let rotated = TokenPair {
            access_token: "tok2".to_string(),
            refresh_token: "ref2".to_string(),
            expires_in: 900_000,
        };
        session.rotate(&rotated, Some(true));

        assert_eq!(session.access_token, "tok2");
        assert_eq!(session.refresh_token, "ref2");
        assert!(session.remember_me);
        assert!(session.time_until_expiry() <= Duration::milliseconds(900_000));
    }
}

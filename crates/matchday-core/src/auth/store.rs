//! Persistent session storage.
//!
//! A store holds at most one session, and every key is written and removed
//! together in a single batched call - a store never holds a partial session.

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::{Context, Result};
use keyring::Entry;

use super::session::PersistedSession;

/// Session file name in the cache directory
const SESSION_FILE: &str = "session.json";

/// Keychain service name for the keychain-backed store
pub const KEYCHAIN_SERVICE: &str = "matchday";

pub trait SessionStore: Send + Sync {
    /// Load the stored session, if any. A corrupt or partial record is an error.
    fn load(&self) -> Result<Option<PersistedSession>>;

    /// Replace the stored session in one batched write.
    fn save(&self, session: &PersistedSession) -> Result<()>;

    /// Remove every session key. Clearing an empty store is a no-op.
    fn clear(&self) -> Result<()>;
}

/// File-backed store: one JSON document under the app cache directory.
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new(cache_dir: PathBuf) -> Self {
        Self {
            path: cache_dir.join(SESSION_FILE),
        }
    }
}

impl SessionStore for FileSessionStore {
    fn load(&self) -> Result<Option<PersistedSession>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let contents =
            std::fs::read_to_string(&self.path).context("Failed to read session file")?;
        let map: BTreeMap<String, String> =
            serde_json::from_str(&contents).context("Failed to parse session file")?;
        PersistedSession::from_map(&map).map(Some)
    }

    fn save(&self, session: &PersistedSession) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(&session.to_map()?)?;
        std::fs::write(&self.path, contents).context("Failed to write session file")?;
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        if self.path.exists() {
            std::fs::remove_file(&self.path).context("Failed to remove session file")?;
        }
        Ok(())
    }
}

/// Keychain-backed store: the whole session as one OS-keychain secret.
pub struct KeychainSessionStore {
    service: String,
    account: String,
}

impl KeychainSessionStore {
    pub fn new(service: impl Into<String>, account: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            account: account.into(),
        }
    }

    fn entry(&self) -> Result<Entry> {
        Entry::new(&self.service, &self.account).context("Failed to create keyring entry")
    }
}

impl SessionStore for KeychainSessionStore {
    fn load(&self) -> Result<Option<PersistedSession>> {
        match self.entry()?.get_password() {
            Ok(secret) => {
                let map: BTreeMap<String, String> =
                    serde_json::from_str(&secret).context("Failed to parse keychain session")?;
                PersistedSession::from_map(&map).map(Some)
            }
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(e).context("Failed to read session from keychain"),
        }
    }

    fn save(&self, session: &PersistedSession) -> Result<()> {
        let secret = serde_json::to_string(&session.to_map()?)?;
        self.entry()?
            .set_password(&secret)
            .context("Failed to store session in keychain")?;
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        match self.entry()?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(e).context("Failed to delete session from keychain"),
        }
    }
}

//! Authenticated client state.
//!
//! A [`SessionContext`] is created once at startup and handed to every
//! component that makes authenticated calls. Only the auth flow establishes a
//! session; any component may end one when the server rejects the token.

mod store;

pub use store::{FileStore, KeyValueStore, MemoryStore, StoreError};

use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{info, warn};

use crate::formatting::format_display_name;

/// Store key for the bearer token
pub const TOKEN_KEY: &str = "authToken";
/// Store key for the identifier the server resolved at login
pub const IDENTIFIER_KEY: &str = "username";

/// Token plus the identifier it was issued for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub token: String,
    pub identifier: String,
}

impl Session {
    pub fn display_name(&self) -> String {
        format_display_name(Some(&self.identifier))
    }
}

pub struct SessionContext {
    store: Arc<dyn KeyValueStore>,
    current: RwLock<Option<Session>>,
    logout_reason: RwLock<Option<String>>,
}

impl SessionContext {
    /// Read the persisted session. Token and identifier must both be present;
    /// a lone half is discarded so the pair is always set or cleared together.
    pub fn load(store: Arc<dyn KeyValueStore>) -> Result<Self, StoreError> {
        let token = store.get(TOKEN_KEY)?.filter(|t| !t.is_empty());
        let identifier = store.get(IDENTIFIER_KEY)?.filter(|i| !i.is_empty());

        let current = match (token, identifier) {
            (Some(token), Some(identifier)) => {
                info!(identifier = %identifier, "Restored persisted session");
                Some(Session { token, identifier })
            }
            (None, None) => None,
            _ => {
                warn!("Discarding incomplete persisted session");
                store.remove(TOKEN_KEY)?;
                store.remove(IDENTIFIER_KEY)?;
                None
            }
        };

        Ok(Self {
            store,
            current: RwLock::new(current),
            logout_reason: RwLock::new(None),
        })
    }

    /// Context with no persisted state, backed by memory
    pub fn in_memory() -> Self {
        Self {
            store: Arc::new(MemoryStore::new()),
            current: RwLock::new(None),
            logout_reason: RwLock::new(None),
        }
    }

    pub fn current(&self) -> Option<Session> {
        self.current.read().clone()
    }

    pub fn token(&self) -> Option<String> {
        self.current.read().as_ref().map(|s| s.token.clone())
    }

    pub fn is_authenticated(&self) -> bool {
        self.current.read().is_some()
    }

    /// Persist and activate a new session
    pub fn establish(&self, token: &str, identifier: &str) -> Result<Session, StoreError> {
        self.store.set(TOKEN_KEY, token)?;
        if let Err(e) = self.store.set(IDENTIFIER_KEY, identifier) {
            let _ = self.store.remove(TOKEN_KEY);
            return Err(e);
        }

        let session = Session {
            token: token.to_string(),
            identifier: identifier.to_string(),
        };
        *self.current.write() = Some(session.clone());
        *self.logout_reason.write() = None;

        info!(identifier = %identifier, "Session established");
        Ok(session)
    }

    /// End the session. Idempotent; the in-memory session is dropped even
    /// when the store cannot be updated.
    pub fn clear(&self) {
        let previous = self.current.write().take();

        for key in [TOKEN_KEY, IDENTIFIER_KEY] {
            if let Err(e) = self.store.remove(key) {
                warn!(key, error = %e, "Failed to remove persisted session key");
            }
        }

        if let Some(session) = previous {
            info!(identifier = %session.identifier, "Session cleared");
        }
    }

    /// End the session because the server rejected it, keeping the reason
    /// for whoever renders the login view next.
    pub fn expire(&self, reason: &str) {
        warn!(reason, "Forcing logout");
        self.clear();
        *self.logout_reason.write() = Some(reason.to_string());
    }

    pub fn take_logout_reason(&self) -> Option<String> {
        self.logout_reason.write().take()
    }
}

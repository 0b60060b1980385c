use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use reqwest::header::HeaderValue;
use tokio::sync::watch;
use tracing::{debug, warn};

use super::storage::{MemoryStorage, TokenStorage};

/// Storage key for the access token
pub const ACCESS_TOKEN_KEY: &str = "access_token";

/// Storage key for the refresh token
pub const REFRESH_TOKEN_KEY: &str = "refresh_token";

/// Snapshot of the stored credential pair.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub access: Option<String>,
    pub refresh: Option<String>,
}

#[derive(Default)]
struct State {
    credentials: Credentials,
    /// `Authorization` value attached to every gateway request
    authorization: Option<HeaderValue>,
}

/// Owner of the current access/refresh pair.
///
/// Values are mirrored in memory and written through to the storage backend,
/// so reads always see the latest committed value even when the backend
/// fails.
pub struct TokenStore {
    storage: Box<dyn TokenStorage>,
    state: RwLock<State>,
    authenticated: watch::Sender<bool>,
}

impl TokenStore {
    /// Open the store and load whatever the backend holds.
    ///
    /// A backend that cannot be read is replaced by in-memory storage for
    /// the rest of the process; the session then won't survive a restart.
    pub fn open(storage: Box<dyn TokenStorage>) -> Self {
        let loaded = storage
            .get(ACCESS_TOKEN_KEY)
            .and_then(|access| Ok((access, storage.get(REFRESH_TOKEN_KEY)?)));

        let (storage, credentials) = match loaded {
            Ok((access, refresh)) => {
                debug!(
                    backend = storage.name(),
                    has_access = access.is_some(),
                    has_refresh = refresh.is_some(),
                    "Loaded stored credentials"
                );
                (storage, Credentials { access, refresh })
            }
            Err(e) => {
                warn!(
                    backend = storage.name(),
                    error = %e,
                    "Token storage unavailable, keeping credentials in memory only"
                );
                let fallback: Box<dyn TokenStorage> = Box::new(MemoryStorage::new());
                (fallback, Credentials::default())
            }
        };

        let authorization = credentials.access.as_deref().and_then(bearer);
        let (authenticated, _) = watch::channel(credentials.access.is_some());

        Self {
            storage,
            state: RwLock::new(State {
                credentials,
                authorization,
            }),
            authenticated,
        }
    }

    /// Store backed by process memory only
    pub fn in_memory() -> Self {
        Self::open(Box::new(MemoryStorage::new()))
    }

    /// Convenience for sharing the store between gateway and session
    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub fn access(&self) -> Option<String> {
        self.read().credentials.access.clone()
    }

    pub fn refresh(&self) -> Option<String> {
        self.read().credentials.refresh.clone()
    }

    pub fn credentials(&self) -> Credentials {
        self.read().credentials.clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.read().credentials.access.is_some()
    }

    /// Name of the backend actually in use
    pub fn backend(&self) -> &str {
        self.storage.name()
    }

    /// Receiver that changes whenever the store gains or loses its access
    /// token. Route guards watch this to notice a forced logout.
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.authenticated.subscribe()
    }

    /// Default `Authorization` header for outbound requests
    pub(crate) fn authorization(&self) -> Option<HeaderValue> {
        self.read().authorization.clone()
    }

    /// Set or clear the access token. This is also the default bearer
    /// credential for every subsequent gateway request.
    pub fn set_access(&self, token: Option<&str>) {
        {
            let mut state = self.write();
            state.credentials.access = token.map(str::to_string);
            state.authorization = token.and_then(bearer);
        }
        self.persist(ACCESS_TOKEN_KEY, token);
        self.authenticated.send_replace(token.is_some());
    }

    /// Set or clear the refresh token. Does not touch request headers.
    pub fn set_refresh(&self, token: Option<&str>) {
        self.write().credentials.refresh = token.map(str::to_string);
        self.persist(REFRESH_TOKEN_KEY, token);
    }

    /// Forget both tokens (logout)
    pub fn clear(&self) {
        self.set_access(None);
        self.set_refresh(None);
    }

    fn persist(&self, key: &str, value: Option<&str>) {
        let result = match value {
            Some(value) => self.storage.set(key, value),
            None => self.storage.remove(key),
        };
        if let Err(e) = result {
            warn!(backend = self.storage.name(), key, error = %e, "Failed to persist token");
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, State> {
        self.state.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, State> {
        self.state.write().unwrap_or_else(|e| e.into_inner())
    }
}

fn bearer(token: &str) -> Option<HeaderValue> {
    match HeaderValue::from_str(&format!("Bearer {}", token)) {
        Ok(mut value) => {
            value.set_sensitive(true);
            Some(value)
        }
        Err(_) => {
            warn!("Access token contains characters not allowed in a header, ignoring it");
            None
        }
    }
}

//! The single bearer-token slot and its persistence backends.
//!
//! SYSTEM CONTEXT
//! ==============
//! Exactly one token exists at a time. [`TokenStore`] caches it in memory and
//! writes through to a [`TokenStorage`] backend so it survives reloads:
//! `localStorage` in the browser, a file for the CLI, memory in tests.
//!
//! TRADE-OFFS
//! ==========
//! Backend writes are best-effort. A failed persist is logged and the
//! in-memory slot stays authoritative for the rest of the session.

#[cfg(test)]
#[path = "store_test.rs"]
mod tests;

use std::sync::{Mutex, PoisonError, RwLock};

/// Storage key used for the persisted token.
pub const TOKEN_KEY: &str = "token";

/// Durable home for the token string.
pub trait TokenStorage: Send + Sync {
    /// Read the persisted token, if any.
    fn load(&self) -> Option<String>;
    /// Persist `token`, replacing any previous value.
    fn save(&self, token: &str);
    /// Delete the persisted token.
    fn remove(&self);
}

// =============================================================================
// TOKEN STORE
// =============================================================================

/// Owned token slot shared by every session component.
pub struct TokenStore {
    backend: Box<dyn TokenStorage>,
    slot: RwLock<Option<String>>,
}

impl TokenStore {
    /// Open the store, restoring any token the backend persisted.
    pub fn init(backend: impl TokenStorage + 'static) -> Self {
        Self::from_boxed(Box::new(backend))
    }

    /// Same as [`TokenStore::init`] for an already boxed backend.
    #[must_use]
    pub fn from_boxed(backend: Box<dyn TokenStorage>) -> Self {
        let restored = backend.load().filter(|t| !t.trim().is_empty());
        tracing::debug!(restored = restored.is_some(), "token store opened");
        Self { backend, slot: RwLock::new(restored) }
    }

    /// Current token, if one is held.
    #[must_use]
    pub fn token(&self) -> Option<String> {
        self.slot.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    #[must_use]
    pub fn has_token(&self) -> bool {
        self.slot.read().unwrap_or_else(PoisonError::into_inner).is_some()
    }

    /// Replace the held token. Last write wins.
    pub fn set(&self, token: impl Into<String>) {
        let token = token.into();
        self.backend.save(&token);
        *self.slot.write().unwrap_or_else(PoisonError::into_inner) = Some(token);
    }

    /// Drop the held token from memory and the backend.
    pub fn clear(&self) {
        self.backend.remove();
        *self.slot.write().unwrap_or_else(PoisonError::into_inner) = None;
    }

    /// Close the store and hand back its backend. The persisted token is kept.
    #[must_use]
    pub fn teardown(self) -> Box<dyn TokenStorage> {
        tracing::debug!("token store closed");
        self.backend
    }
}

impl std::fmt::Debug for TokenStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenStore").field("has_token", &self.has_token()).finish_non_exhaustive()
    }
}

// =============================================================================
// BACKENDS
// =============================================================================

/// Process-local storage. Nothing survives the process.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    slot: Mutex<Option<String>>,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Storage pre-seeded with `token`, as if persisted by an earlier session.
    #[must_use]
    pub fn with_token(token: impl Into<String>) -> Self {
        Self { slot: Mutex::new(Some(token.into())) }
    }
}

impl TokenStorage for MemoryStorage {
    fn load(&self) -> Option<String> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    fn save(&self, token: &str) {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(token.to_owned());
    }

    fn remove(&self) {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

/// Token persisted as the sole contents of a file.
#[cfg(feature = "native")]
#[derive(Debug, Clone)]
pub struct FileStorage {
    path: std::path::PathBuf,
}

#[cfg(feature = "native")]
impl FileStorage {
    pub fn new(path: impl Into<std::path::PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

#[cfg(feature = "native")]
impl TokenStorage for FileStorage {
    fn load(&self) -> Option<String> {
        match std::fs::read_to_string(&self.path) {
            Ok(raw) => Some(raw.trim().to_owned()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "token file unreadable");
                None
            }
        }
    }

    fn save(&self, token: &str) {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            if let Err(e) = std::fs::create_dir_all(parent) {
                tracing::warn!(path = %parent.display(), error = %e, "token directory not created");
                return;
            }
        }
        if let Err(e) = std::fs::write(&self.path, token) {
            tracing::warn!(path = %self.path.display(), error = %e, "token not persisted");
        }
    }

    fn remove(&self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(path = %self.path.display(), error = %e, "token file not removed"),
        }
    }
}

/// Browser `localStorage` under [`TOKEN_KEY`].
#[cfg(feature = "hydrate")]
#[derive(Debug, Clone, Copy, Default)]
pub struct BrowserStorage;

#[cfg(feature = "hydrate")]
impl BrowserStorage {
    fn local_storage() -> Option<web_sys::Storage> {
        web_sys::window().and_then(|w| w.local_storage().ok().flatten())
    }
}

#[cfg(feature = "hydrate")]
impl TokenStorage for BrowserStorage {
    fn load(&self) -> Option<String> {
        Self::local_storage()?.get_item(TOKEN_KEY).ok().flatten()
    }

    fn save(&self, token: &str) {
        let Some(storage) = Self::local_storage() else {
            return;
        };
        if let Err(e) = storage.set_item(TOKEN_KEY, token) {
            tracing::warn!(key = TOKEN_KEY, error = ?e, "token not persisted to localStorage");
        }
    }

    fn remove(&self) {
        if let Some(storage) = Self::local_storage() {
            if let Err(e) = storage.remove_item(TOKEN_KEY) {
                tracing::warn!(key = TOKEN_KEY, error = ?e, "token not removed from localStorage");
            }
        }
    }
}

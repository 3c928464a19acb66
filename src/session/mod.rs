//! Client-side session storage.
//!
//! Provides the `TokenStore` trait for pluggable key/value persistence
//! (the moral equivalent of browser local storage), an in-memory backend
//! for tests, a JSON file backend for the terminal shell, and the
//! `SessionManager` that owns the session token's lifecycle.

pub mod file;
pub mod manager;
pub mod memory;

pub use manager::SessionManager;

/// Storage key the session token lives under unless configured otherwise.
pub const DEFAULT_TOKEN_KEY: &str = "jwt_token";

/// Pluggable key/value storage for the session token.
///
/// Reads that fail are reported as absent; writes that fail are logged
/// and dropped. Implementations must be `Send + Sync` so one store can be
/// shared by every component of the client.
pub trait TokenStore: Send + Sync {
    /// Value stored under `key`, or `None` if absent.
    fn get(&self, key: &str) -> Option<String>;

    /// Store `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: &str);

    /// Remove `key`. Removing an absent key is a no-op.
    fn remove(&self, key: &str);
}

/// Store selected at runtime from configuration.
pub enum AnyStore {
    Memory(memory::InMemoryStore),
    File(file::FileStore),
}

impl TokenStore for AnyStore {
    fn get(&self, key: &str) -> Option<String> {
        match self {
            AnyStore::Memory(s) => s.get(key),
            AnyStore::File(s) => s.get(key),
        }
    }

    fn set(&self, key: &str, value: &str) {
        match self {
            AnyStore::Memory(s) => s.set(key, value),
            AnyStore::File(s) => s.set(key, value),
        }
    }

    fn remove(&self, key: &str) {
        match self {
            AnyStore::Memory(s) => s.remove(key),
            AnyStore::File(s) => s.remove(key),
        }
    }
}

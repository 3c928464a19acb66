//! Expensio client: session handling for the expense tracker frontend.
//!
//! Holds the session token, decides whether it is still usable, attaches
//! it to backend requests, and runs one recovery path whenever the backend
//! rejects it.

pub mod api;
pub mod config;
pub mod error;
pub mod http;
pub mod ocsf;
pub mod router;
pub mod session;
pub mod token;
pub mod types;

use std::sync::Arc;

use crate::api::AuthApi;
use crate::config::{Config, StoreKind};
use crate::error::ClientError;
use crate::http::{Gateway, UnauthorizedHandler};
use crate::session::file::FileStore;
use crate::session::memory::InMemoryStore;
use crate::session::{AnyStore, SessionManager};

/// Shared client state, built once at startup.
pub struct Client {
    pub config: Config,
    pub session: Arc<SessionManager>,
    pub gateway: Arc<Gateway>,
    pub auth: AuthApi,
}

impl Client {
    /// Wire the gateway and API client around an existing session.
    ///
    /// `on_unauthorized` runs every time the backend answers 401.
    pub fn new(
        config: Config,
        session: Arc<SessionManager>,
        on_unauthorized: Option<UnauthorizedHandler>,
    ) -> Result<Self, ClientError> {
        let http_client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        let mut gateway = Gateway::new(http_client, config.api_base_url.clone(), session.clone());
        if let Some(handler) = on_unauthorized {
            gateway = gateway.with_unauthorized_handler(move || handler());
        }
        let gateway = Arc::new(gateway);

        Ok(Self {
            auth: AuthApi::new(gateway.clone()),
            config,
            session,
            gateway,
        })
    }
}

/// Session manager over the store the configuration asks for.
pub fn create_session(config: &Config) -> Arc<SessionManager> {
    Arc::new(SessionManager::new(
        Arc::new(create_store(config)),
        config.token_key.clone(),
    ))
}

/// Build the token store the configuration asks for.
pub fn create_store(config: &Config) -> AnyStore {
    match config.token_store {
        StoreKind::Memory => AnyStore::Memory(InMemoryStore::new()),
        StoreKind::File => AnyStore::File(FileStore::new(&config.token_file)),
    }
}

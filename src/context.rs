//! One owned session: token slot, claim reader, auth calls, API client,
//! and guarded router, all wired from a single [`ClientConfig`].
//!
//! DESIGN
//! ======
//! Components share the token slot through `Arc<TokenStore>`; nothing is a
//! process-wide global. Tests build a context over `MemoryStorage` and a
//! mock transport, the CLI over a file and `reqwest`, the browser over
//! `localStorage` and `gloo-net`.

#[cfg(test)]
#[path = "context_test.rs"]
mod tests;

use std::sync::Arc;

use crate::auth::clock::Clock;
use crate::auth::gateway::AuthGateway;
use crate::auth::guard::{AuthGuard, RoleGuard};
use crate::auth::session::SessionOracle;
use crate::auth::store::{TokenStorage, TokenStore};
use crate::config::ClientConfig;
use crate::net::interceptor::ApiClient;
use crate::net::transport::Transport;
use crate::routes::{AppRouter, Navigator};

pub struct SessionContext {
    config: ClientConfig,
    store: Arc<TokenStore>,
    oracle: SessionOracle,
    gateway: Arc<AuthGateway>,
    client: ApiClient,
    router: AppRouter,
}

impl SessionContext {
    /// Open the token store over `storage` and wire every component to it.
    #[must_use]
    pub fn init(
        config: ClientConfig,
        storage: Box<dyn TokenStorage>,
        transport: Arc<dyn Transport>,
        navigator: Arc<dyn Navigator>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let store = Arc::new(TokenStore::from_boxed(storage));
        let oracle = SessionOracle::new(store.clone(), clock).with_refresh_threshold(config.refresh_threshold_secs);
        let gateway = Arc::new(AuthGateway::new(transport.clone(), store.clone(), navigator.clone()));
        let client = ApiClient::new(transport, gateway.clone(), oracle.clone(), store.clone());
        let router = AppRouter::new(
            AuthGuard::new(oracle.clone(), store.clone(), navigator.clone()),
            RoleGuard::new(oracle.clone(), store.clone(), navigator.clone()),
            navigator,
        );
        tracing::debug!(api_url = %config.api_url, logged_in = oracle.is_logged_in(), "session context ready");
        Self { config, store, oracle, gateway, client, router }
    }

    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    #[must_use]
    pub fn store(&self) -> &TokenStore {
        &self.store
    }

    #[must_use]
    pub fn oracle(&self) -> &SessionOracle {
        &self.oracle
    }

    #[must_use]
    pub fn gateway(&self) -> &AuthGateway {
        &self.gateway
    }

    #[must_use]
    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    #[must_use]
    pub fn router(&self) -> &AppRouter {
        &self.router
    }

    /// Release every component and hand back the storage backend.
    ///
    /// Returns `None` while clones of the client, oracle or router handed
    /// out earlier are still alive, since they keep the store open.
    #[must_use]
    pub fn teardown(self) -> Option<Box<dyn TokenStorage>> {
        let Self { store, oracle, gateway, client, router, .. } = self;
        drop((oracle, gateway, client, router));
        match Arc::try_unwrap(store) {
            Ok(store) => Some(store.teardown()),
            Err(_) => {
                tracing::warn!("session context torn down while still shared");
                None
            }
        }
    }
}

// =============================================================================
// NATIVE
// =============================================================================

#[cfg(all(feature = "native", not(target_arch = "wasm32")))]
impl SessionContext {
    /// File-backed token slot and `reqwest` transport.
    ///
    /// # Errors
    ///
    /// Returns the transport construction error.
    pub fn native(config: ClientConfig, navigator: Arc<dyn Navigator>) -> Result<Self, crate::error::ApiError> {
        use crate::auth::clock::SystemClock;
        use crate::auth::store::FileStorage;
        use crate::net::transport::HttpTransport;

        let transport = Arc::new(HttpTransport::new(config.api_url.clone())?);
        let storage = Box::new(FileStorage::new(config.token_file.clone()));
        Ok(Self::init(config, storage, transport, navigator, Arc::new(SystemClock)))
    }
}

// =============================================================================
// BROWSER
// =============================================================================

#[cfg(all(feature = "hydrate", target_arch = "wasm32"))]
impl SessionContext {
    /// `localStorage` token slot, `gloo-net` transport, and console logging.
    #[must_use]
    pub fn for_browser(config: ClientConfig) -> Self {
        use crate::auth::clock::SystemClock;
        use crate::auth::store::BrowserStorage;
        use crate::net::transport::BrowserTransport;
        use crate::routes::BrowserNavigator;

        console_error_panic_hook::set_once();
        let _ = console_log::init_with_level(log::Level::Debug);

        let transport = Arc::new(BrowserTransport::new(config.api_url.clone()));
        Self::init(
            config,
            Box::new(BrowserStorage),
            transport,
            Arc::new(BrowserNavigator),
            Arc::new(SystemClock),
        )
    }
}

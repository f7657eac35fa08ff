//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::ApiConfig;
use crate::db::{ProductGateway, StoreHealth, UserGateway};
use crate::services::{AuthService, ProductService, UserService};

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to the
/// configuration and the services wired over one document store.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ApiConfig,
    products: ProductService,
    users: UserService,
    auth: AuthService,
    health: Arc<dyn StoreHealth>,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Arguments
    ///
    /// * `config` - API configuration
    /// * `store` - Document store serving both collections
    #[must_use]
    pub fn new<S>(config: ApiConfig, store: S) -> Self
    where
        S: ProductGateway + UserGateway + StoreHealth + 'static,
    {
        let store = Arc::new(store);
        let products: Arc<dyn ProductGateway> = store.clone();
        let users: Arc<dyn UserGateway> = store.clone();

        Self {
            inner: Arc::new(AppStateInner {
                config,
                products: ProductService::new(products),
                users: UserService::new(Arc::clone(&users)),
                auth: AuthService::new(users),
                health: store,
            }),
        }
    }

    /// Get a reference to the API configuration.
    #[must_use]
    pub fn config(&self) -> &ApiConfig {
        &self.inner.config
    }

    /// Get a reference to the product service.
    #[must_use]
    pub fn products(&self) -> &ProductService {
        &self.inner.products
    }

    /// Get a reference to the user service.
    #[must_use]
    pub fn users(&self) -> &UserService {
        &self.inner.users
    }

    /// Get a reference to the authentication service.
    #[must_use]
    pub fn auth(&self) -> &AuthService {
        &self.inner.auth
    }

    /// Get a reference to the store health probe.
    #[must_use]
    pub fn health(&self) -> &dyn StoreHealth {
        self.inner.health.as_ref()
    }
}

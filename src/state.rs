//! Shared application state: config, the injected document store, the JWT
//! signer, and the optional Google OAuth client.
//!
//! The store is a trait object so the same handlers serve the in-memory
//! backend in tests and a hosted document database in production.

use std::sync::Arc;

use tracing::{info, instrument};

use crate::auth::{GoogleClient, JwtAuth};
use crate::config::AppConfig;
use crate::store::DocumentStore;

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub store: Arc<dyn DocumentStore>,
    pub jwt: JwtAuth,
    pub google: Option<GoogleClient>,
}

impl AppState {
    #[instrument(level = "info", skip_all)]
    pub fn new(config: AppConfig, store: Arc<dyn DocumentStore>) -> Self {
        let jwt = JwtAuth::new(&config.jwt_secret, config.jwt_ttl_hours);
        let google = GoogleClient::from_config(&config.google);
        if google.is_some() {
            info!(target: "brew_detective", "Google OAuth enabled");
        } else {
            info!(target: "brew_detective", "Google OAuth disabled (no client id)");
        }
        Self {
            config,
            store,
            jwt,
            google,
        }
    }
}

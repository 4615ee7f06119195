use std::sync::Arc;

use crate::config::AppConfig;
use crate::session::SessionStore;
use crate::storage::Storage;

/// Shared application state handed to every handler through axum's `State`.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub storage: Arc<Storage>,
    pub sessions: Arc<dyn SessionStore>,
}

impl AppState {
    pub fn new(config: AppConfig, storage: Storage, sessions: Arc<dyn SessionStore>) -> Self {
        Self {
            config: Arc::new(config),
            storage: Arc::new(storage),
            sessions,
        }
    }
}

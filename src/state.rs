use std::sync::Arc;

use crate::auth::SessionProvider;
use crate::config::AppConfig;
use crate::database::ShelterStore;

/// Everything a request handler needs, built once at startup.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ShelterStore>,
    pub sessions: Arc<dyn SessionProvider>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(store: Arc<dyn ShelterStore>, sessions: Arc<dyn SessionProvider>, config: AppConfig) -> Self {
        Self {
            store,
            sessions,
            config: Arc::new(config),
        }
    }
}

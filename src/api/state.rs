use std::sync::Arc;

use crate::config::Config;
use crate::handlers::Registry;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub registry: Arc<Registry>,
}

impl AppState {
    pub fn new(config: Config, registry: Arc<Registry>) -> Self {
        Self {
            config: Arc::new(config),
            registry,
        }
    }
}

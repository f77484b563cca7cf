//! Application state for the HTTP server.

use std::sync::Arc;

use crate::config::StackConfig;

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Configuration used when a request does not carry its own
    pub default_config: Arc<StackConfig>,
}

impl AppState {
    /// Create a new application state with the given default configuration.
    pub fn new(default_config: StackConfig) -> Self {
        Self {
            default_config: Arc::new(default_config),
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(StackConfig::default())
    }
}

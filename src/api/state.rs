//! Application state for the API server

use crate::Config;
use std::sync::Arc;

/// Shared application state accessible to all route handlers
///
/// Requests never mutate it: each extraction owns its own working directory, so the
/// only shared piece is the configuration.
#[derive(Clone)]
pub struct AppState {
    /// Configuration loaded at startup
    pub config: Arc<Config>,
}

impl AppState {
    /// Create a new AppState
    pub fn new(config: Arc<Config>) -> Self {
        Self { config }
    }
}

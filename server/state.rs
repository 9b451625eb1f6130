use std::sync::Arc;

use ferrite_digits::{ClassifierHandle, PredictionService, ServeConfig};

/// Everything a request handler needs. Built once at startup and never
/// mutated, so it is shared without a lock.
pub struct AppState {
    pub service: PredictionService<ClassifierHandle>,
    pub config: ServeConfig,
}

impl AppState {
    pub fn new(service: PredictionService<ClassifierHandle>, config: ServeConfig) -> Self {
        AppState { service, config }
    }
}

/// `Arc<AppState>` handed to every request thread.
pub type SharedState = Arc<AppState>;

//! Shared application state.

use crate::runtime::UserRuntime;
use std::sync::Arc;

/// Shared application state. Holds no user data: every container lives in
/// the runtime.
#[derive(Clone)]
pub struct AppState {
    pub runtime: Arc<dyn UserRuntime>,
    pub default_password: String,
}

impl AppState {
    pub fn new(runtime: Arc<dyn UserRuntime>, default_password: impl Into<String>) -> Self {
        Self {
            runtime,
            default_password: default_password.into(),
        }
    }
}

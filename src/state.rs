//! Application state management

use std::sync::Arc;

use crate::breakpoints::{BreakpointStore, PauseRegistry};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    registry: Arc<dyn PauseRegistry>,
}

impl AppState {
    /// Create state around an existing registry
    pub fn new(registry: Arc<dyn PauseRegistry>) -> Self {
        Self {
            inner: Arc::new(AppStateInner { registry }),
        }
    }

    /// Get the breakpoint registry
    pub fn registry(&self) -> &Arc<dyn PauseRegistry> {
        &self.inner.registry
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(Arc::new(BreakpointStore::new()))
    }
}

//! Application state shared across handlers.

use matador_monitor::QueueMonitor;
use std::sync::Arc;

/// Application state.
#[derive(Clone)]
pub struct AppState {
    /// Queue monitor.
    pub monitor: Arc<QueueMonitor>,
}

impl AppState {
    /// Creates a new application state.
    pub fn new(monitor: Arc<QueueMonitor>) -> Self {
        Self { monitor }
    }
}

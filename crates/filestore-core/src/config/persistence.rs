//! Persistence worker pool configuration.

use serde::{Deserialize, Serialize};

/// Sizing of the pool that executes database work off the request runtime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistenceConfig {
    /// Worker threads of the dedicated persistence runtime.
    #[serde(default = "default_worker_threads")]
    pub worker_threads: usize,
    /// Maximum number of persistence tasks executing at once.
    #[serde(default = "default_max_in_flight")]
    pub max_in_flight: usize,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            worker_threads: default_worker_threads(),
            max_in_flight: default_max_in_flight(),
        }
    }
}

fn default_worker_threads() -> usize {
    4
}

fn default_max_in_flight() -> usize {
    32
}

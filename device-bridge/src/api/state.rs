use std::sync::Arc;

use crate::artifacts::ArtifactManager;
use crate::config::Config;
use crate::device::{DeviceDriver, DeviceHandle};
use crate::dispatcher::CommandDispatcher;

/// Shared application state, one per server instance
pub struct AppState {
    pub commands: CommandDispatcher,
}

impl AppState {
    /// Wire a driver into a dispatcher. Must be called inside a tokio runtime.
    pub fn new(config: &Config, driver: Arc<dyn DeviceDriver>) -> Self {
        let device = DeviceHandle::new(driver);
        let artifacts = ArtifactManager::new(config.scratch_dir.clone(), config.cleanup_delay);

        tracing::info!(
            "Screenshots in {} (deleted after {:?})",
            config.scratch_dir.display(),
            config.cleanup_delay
        );

        Self {
            commands: CommandDispatcher::new(device, artifacts),
        }
    }

    /// Flush pending artifact deletions before exit
    pub async fn shutdown(&self) {
        self.commands.shutdown().await;
    }
}

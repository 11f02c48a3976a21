use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;

use super::DeviceDriver;
use crate::error::{AppError, Result};

/// Shared access to one device.
///
/// Calls are serialized through an instance-scoped lock (tokio's mutex is
/// FIFO-fair). Each call runs on its own task, so a request that is dropped
/// mid-flight still lets the device command finish.
pub struct DeviceHandle {
    driver: Arc<dyn DeviceDriver>,
    lock: Arc<Mutex<()>>,
}

impl DeviceHandle {
    pub fn new(driver: Arc<dyn DeviceDriver>) -> Self {
        Self {
            driver,
            lock: Arc::new(Mutex::new(())),
        }
    }

    /// Run one driver operation under the device lock
    pub async fn call<T, F, Fut>(&self, operation: &'static str, f: F) -> Result<T>
    where
        F: FnOnce(Arc<dyn DeviceDriver>) -> Fut + Send + 'static,
        Fut: Future<Output = anyhow::Result<T>> + Send + 'static,
        T: Send + 'static,
    {
        let driver = Arc::clone(&self.driver);
        let lock = Arc::clone(&self.lock);

        let task = tokio::spawn(async move {
            let _guard = lock.lock().await;
            tracing::trace!(operation, "driver call");
            f(driver).await
        });

        task.await
            .map_err(|e| AppError::Internal(format!("{} task failed: {}", operation, e)))?
            .map_err(AppError::Device)
    }

    /// Like [`call`](Self::call), but gives up after `bound`. `None` means the
    /// bound expired; the device lock is released at that point.
    pub async fn call_bounded<T, F, Fut>(
        &self,
        operation: &'static str,
        bound: Duration,
        f: F,
    ) -> Result<Option<T>>
    where
        F: FnOnce(Arc<dyn DeviceDriver>) -> Fut + Send + 'static,
        Fut: Future<Output = anyhow::Result<T>> + Send + 'static,
        T: Send + 'static,
    {
        self.call(operation, move |driver| async move {
            match tokio::time::timeout(bound, f(driver)).await {
                Ok(result) => result.map(Some),
                Err(_) => {
                    tracing::warn!(operation, ?bound, "driver call exceeded its bound");
                    Ok(None)
                }
            }
        })
        .await
    }
}

impl Clone for DeviceHandle {
    fn clone(&self) -> Self {
        Self {
            driver: Arc::clone(&self.driver),
            lock: Arc::clone(&self.lock),
        }
    }
}

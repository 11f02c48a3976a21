use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};

use super::scheduler::{remove_artifact, CleanupScheduler};
use crate::error::{AppError, Result};

const FILE_PREFIX: &str = "screenshot";
const FILE_SUFFIX: &str = ".png";

/// A screenshot file handed to the caller, deleted after `scheduled_deletion_at`
#[derive(Debug, Clone)]
pub struct ScreenshotArtifact {
    pub path: PathBuf,
    pub created_at: DateTime<Utc>,
    pub scheduled_deletion_at: DateTime<Utc>,
}

impl ScreenshotArtifact {
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// Owns screenshot files from allocation until deletion
pub struct ArtifactManager {
    scratch_dir: PathBuf,
    delay: Duration,
    scheduler: Arc<CleanupScheduler>,
}

impl ArtifactManager {
    /// Must be called inside a tokio runtime (starts the cleanup task)
    pub fn new(scratch_dir: impl Into<PathBuf>, delay: Duration) -> Self {
        Self {
            scratch_dir: scratch_dir.into(),
            delay,
            scheduler: Arc::new(CleanupScheduler::start()),
        }
    }

    /// Check capture parameters; returns the quality as a byte
    pub fn validate(scale: f32, quality: i32) -> Result<u8> {
        if !scale.is_finite() || scale <= 0.0 {
            return Err(AppError::Validation(format!(
                "scale must be a positive number, got {}",
                scale
            )));
        }
        u8::try_from(quality)
            .ok()
            .filter(|q| *q <= 100)
            .ok_or_else(|| {
                AppError::Validation(format!("quality must be between 0 and 100, got {}", quality))
            })
    }

    /// Allocate a scratch file and let `take` write the screenshot into it.
    ///
    /// On success the file is scheduled for deletion after the configured
    /// delay and returned. On any failure it is deleted before returning.
    /// The whole sequence runs on its own task, so a caller that goes away
    /// mid-capture still gets its file cleaned up.
    pub async fn capture<F, Fut>(&self, scale: f32, quality: i32, take: F) -> Result<ScreenshotArtifact>
    where
        F: FnOnce(PathBuf, f32, u8) -> Fut + Send + 'static,
        Fut: Future<Output = Result<bool>> + Send + 'static,
    {
        let quality = Self::validate(scale, quality)?;
        let scratch_dir = self.scratch_dir.clone();
        let delay = self.delay;
        let scheduler = Arc::clone(&self.scheduler);

        let task = tokio::spawn(async move {
            let path = allocate(&scratch_dir).await?;
            let created_at = Utc::now();

            match take(path.clone(), scale, quality).await {
                Ok(true) => {
                    scheduler.schedule(path.clone(), delay);
                    let delay =
                        chrono::Duration::from_std(delay).unwrap_or_else(|_| chrono::Duration::zero());
                    Ok(ScreenshotArtifact {
                        path,
                        created_at,
                        scheduled_deletion_at: Utc::now() + delay,
                    })
                }
                Ok(false) => {
                    remove_artifact(&path).await;
                    Err(AppError::Capture("the device could not take a screenshot".to_string()))
                }
                Err(e) => {
                    remove_artifact(&path).await;
                    Err(e)
                }
            }
        });

        task.await
            .map_err(|e| AppError::Internal(format!("capture task failed: {}", e)))?
    }

    /// Flush pending deletions
    pub async fn shutdown(&self) {
        self.scheduler.shutdown().await;
    }
}

async fn allocate(scratch_dir: &Path) -> Result<PathBuf> {
    tokio::fs::create_dir_all(scratch_dir).await.map_err(|e| {
        AppError::Capture(format!(
            "cannot create scratch directory {}: {}",
            scratch_dir.display(),
            e
        ))
    })?;

    let dir = scratch_dir.to_path_buf();
    tokio::task::spawn_blocking(move || {
        let file = tempfile::Builder::new()
            .prefix(FILE_PREFIX)
            .suffix(FILE_SUFFIX)
            .tempfile_in(&dir)
            .map_err(|e| AppError::Capture(format!("cannot create temporary file: {}", e)))?;

        let (_, path) = file
            .keep()
            .map_err(|e| AppError::Capture(format!("cannot keep temporary file: {}", e)))?;
        Ok(path)
    })
    .await
    .map_err(|e| AppError::Internal(format!("scratch file task failed: {}", e)))?
}

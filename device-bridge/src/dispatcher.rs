//! One entry point per device operation.
//!
//! Every entry point validates its arguments, makes exactly one call into the
//! device (through [`DeviceHandle`]) and maps the result to a
//! [`StatusResponse`] or a typed payload. No retries, no state kept between
//! calls.

use std::time::Duration;

use serde::Serialize;
use tokio::time::Instant;
use tracing::instrument;

use crate::artifacts::{ArtifactManager, ScreenshotArtifact};
use crate::device::DeviceHandle;
use crate::error::{AppError, Result};
use crate::hierarchy;
use crate::models::{
    DisplayRotation, DisplaySizeDp, ErrorCode, FindObjectQuery, ObjectRef, StatusResponse,
    ValueResponse,
};
use crate::selector::{self, Selector};

/// Slack on top of a caller's timeout before a wait is cut off
pub const WAIT_GRACE: Duration = Duration::from_millis(250);

pub const MSG_CANNOT_CLICK: &str = "Cannot click";
pub const MSG_PACKAGE_MISMATCH: &str = "Current window does not have the same package name";
pub const MSG_WINDOW_UPDATE_TIMEOUT: &str = "Timeout waiting for window update";

/// Outcome of `findObject`
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum FindObjectResult {
    Found(ObjectRef),
    /// No selector argument was supplied
    Missing(StatusResponse),
    /// Serialized as `null`
    NotFound,
}

/// A captured screenshot, ready to send
#[derive(Debug)]
pub struct Screenshot {
    pub artifact: ScreenshotArtifact,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, Copy)]
enum NamedKey {
    Back,
    Delete,
    Enter,
    Home,
}

impl NamedKey {
    fn label(self) -> &'static str {
        match self {
            NamedKey::Back => "BACK",
            NamedKey::Delete => "DELETE",
            NamedKey::Enter => "ENTER",
            NamedKey::Home => "HOME",
        }
    }
}

pub struct CommandDispatcher {
    device: DeviceHandle,
    artifacts: ArtifactManager,
}

impl CommandDispatcher {
    pub fn new(device: DeviceHandle, artifacts: ArtifactManager) -> Self {
        Self { device, artifacts }
    }

    #[instrument(skip(self))]
    pub async fn dump_window_hierarchy(&self, format: &str) -> Result<serde_json::Value> {
        if !format.eq_ignore_ascii_case("JSON") {
            return Err(AppError::Validation(format!("Unsupported format '{}'", format)));
        }

        let root = self
            .device
            .call("dumpWindowHierarchy", |d| async move { d.dump_window_hierarchy().await })
            .await?;
        tracing::debug!("Window hierarchy has {} nodes", root.node_count());
        Ok(hierarchy::to_document(&root))
    }

    #[instrument(skip(self))]
    pub async fn screenshot(&self, scale: f32, quality: i32) -> Result<Screenshot> {
        let device = self.device.clone();
        let artifact = self
            .artifacts
            .capture(scale, quality, move |path, scale, quality| async move {
                device
                    .call("takeScreenshot", move |d| async move {
                        d.take_screenshot(&path, scale, quality).await
                    })
                    .await
                    .map_err(|e| match e {
                        AppError::Device(err) => AppError::Capture(err.to_string()),
                        other => other,
                    })
            })
            .await?;

        let bytes = tokio::fs::read(&artifact.path).await.map_err(|e| {
            AppError::Capture(format!("cannot read {}: {}", artifact.path.display(), e))
        })?;
        tracing::debug!(
            "Screenshot {} ({} bytes), deleting at {}",
            artifact.file_name(),
            bytes.len(),
            artifact.scheduled_deletion_at
        );

        Ok(Screenshot { artifact, bytes })
    }

    #[instrument(skip(self))]
    pub async fn click(&self, x: i32, y: i32) -> Result<StatusResponse> {
        let clicked = self
            .device
            .call("click", move |d| async move { d.click(x, y).await })
            .await?;
        Ok(StatusResponse::from_outcome(clicked, || {
            StatusResponse::error(MSG_CANNOT_CLICK)
        }))
    }

    pub async fn current_package_name(&self) -> Result<ValueResponse<String>> {
        let name = self
            .device
            .call("currentPackageName", |d| async move { d.current_package_name().await })
            .await?;
        Ok(ValueResponse::new(name))
    }

    pub async fn display_height(&self) -> Result<ValueResponse<i32>> {
        let height = self
            .device
            .call("displayHeight", |d| async move { d.display_height().await })
            .await?;
        Ok(ValueResponse::new(height))
    }

    pub async fn display_width(&self) -> Result<ValueResponse<i32>> {
        let width = self
            .device
            .call("displayWidth", |d| async move { d.display_width().await })
            .await?;
        Ok(ValueResponse::new(width))
    }

    pub async fn display_rotation(&self) -> Result<ValueResponse<DisplayRotation>> {
        let index = self
            .device
            .call("displayRotation", |d| async move { d.display_rotation().await })
            .await?;
        let rotation = DisplayRotation::from_index(index).ok_or_else(|| {
            AppError::Device(anyhow::anyhow!("Driver reported invalid rotation {}", index))
        })?;
        Ok(ValueResponse::new(rotation))
    }

    pub async fn display_size_dp(&self) -> Result<DisplaySizeDp> {
        self.device
            .call("displaySizeDp", |d| async move { d.display_size_dp().await })
            .await
    }

    /// Locate the first element, in document order, matching the selector.
    ///
    /// `resourceId` wins over `uiSelector`, which wins over `bySelector`.
    #[instrument(skip(self))]
    pub async fn find_object(&self, query: &FindObjectQuery) -> Result<FindObjectResult> {
        let selector = if let Some(ref id) = query.resource_id {
            Selector::resource_id(id.as_str())
        } else if let Some(raw) = query.ui_selector.as_deref().or(query.by_selector.as_deref()) {
            selector::parse(raw)?
        } else {
            return Ok(FindObjectResult::Missing(StatusResponse::from_code(
                ErrorCode::ArgumentMissing,
            )));
        };

        let root = self
            .device
            .call("dumpWindowHierarchy", |d| async move { d.dump_window_hierarchy().await })
            .await?;

        let Some(found) = selector::find_first(&root, &selector) else {
            tracing::debug!("No element matches {}", selector);
            return Ok(FindObjectResult::NotFound);
        };

        Ok(FindObjectResult::Found(ObjectRef {
            selector: selector.to_string(),
            depth: found.depth,
            tag: found.node.tag().to_string(),
            attributes: found.node.attributes().clone(),
            path: found.path,
        }))
    }

    pub async fn last_traversed_text(&self) -> Result<ValueResponse<Option<String>>> {
        let text = self
            .device
            .call("lastTraversedText", |d| async move { d.last_traversed_text().await })
            .await?;
        Ok(ValueResponse::new(text))
    }

    pub async fn press_back(&self) -> Result<StatusResponse> {
        self.press_named(NamedKey::Back).await
    }

    pub async fn press_delete(&self) -> Result<StatusResponse> {
        self.press_named(NamedKey::Delete).await
    }

    pub async fn press_enter(&self) -> Result<StatusResponse> {
        self.press_named(NamedKey::Enter).await
    }

    pub async fn press_home(&self) -> Result<StatusResponse> {
        self.press_named(NamedKey::Home).await
    }

    #[instrument(skip(self))]
    async fn press_named(&self, key: NamedKey) -> Result<StatusResponse> {
        let pressed = self
            .device
            .call("pressKey", move |d| async move {
                match key {
                    NamedKey::Back => d.press_back().await,
                    NamedKey::Delete => d.press_delete().await,
                    NamedKey::Enter => d.press_enter().await,
                    NamedKey::Home => d.press_home().await,
                }
            })
            .await?;
        Ok(StatusResponse::from_outcome(pressed, || {
            StatusResponse::error(format!("Cannot press {}", key.label()))
        }))
    }

    #[instrument(skip(self))]
    pub async fn press_key_code(&self, key_code: i32, meta_state: i32) -> Result<StatusResponse> {
        let pressed = self
            .device
            .call("pressKeyCode", move |d| async move {
                d.press_key_code(key_code, meta_state).await
            })
            .await?;
        Ok(StatusResponse::from_outcome(pressed, || {
            StatusResponse::from_code(ErrorCode::InteractionKey)
        }))
    }

    pub async fn product_name(&self) -> Result<ValueResponse<String>> {
        let name = self
            .device
            .call("productName", |d| async move { d.product_name().await })
            .await?;
        Ok(ValueResponse::new(name))
    }

    /// Always OK once the wait is over, whether or not the device went idle
    #[instrument(skip(self))]
    pub async fn wait_for_idle(&self, timeout_ms: u64) -> Result<StatusResponse> {
        let timeout = Duration::from_millis(timeout_ms);
        self.device
            .call_bounded("waitForIdle", timeout + WAIT_GRACE, move |d| async move {
                d.wait_for_idle(timeout).await
            })
            .await?;
        Ok(StatusResponse::ok())
    }

    /// A failed wait that ended before `timeout` with a package given means the
    /// foreground package differed; otherwise the full timeout ran out.
    #[instrument(skip(self))]
    pub async fn wait_for_window_update(
        &self,
        timeout_ms: u64,
        package_name: Option<String>,
    ) -> Result<StatusResponse> {
        let timeout = Duration::from_millis(timeout_ms);
        let bound = timeout + WAIT_GRACE;
        let package = package_name.clone();

        let (updated, elapsed) = self
            .device
            .call_bounded("waitForWindowUpdate", bound, move |d| async move {
                let started = Instant::now();
                let updated = d.wait_for_window_update(package.as_deref(), timeout).await?;
                Ok((updated, started.elapsed()))
            })
            .await?
            .unwrap_or((false, bound));

        if updated {
            return Ok(StatusResponse::ok());
        }

        let message = if package_name.is_some() && elapsed < timeout {
            MSG_PACKAGE_MISMATCH
        } else {
            MSG_WINDOW_UPDATE_TIMEOUT
        };
        tracing::debug!(?elapsed, "{}", message);
        Ok(StatusResponse::with_code(ErrorCode::TimeoutWindowUpdate, message))
    }

    /// Flush pending artifact deletions
    pub async fn shutdown(&self) {
        self.artifacts.shutdown().await;
    }
}

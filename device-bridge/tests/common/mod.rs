//! Shared test fixtures: a scriptable in-memory device

#![allow(dead_code)]

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;

use device_bridge::artifacts::ArtifactManager;
use device_bridge::device::{DeviceDriver, DeviceHandle};
use device_bridge::dispatcher::CommandDispatcher;
use device_bridge::hierarchy::HierarchyNode;
use device_bridge::models::DisplaySizeDp;

pub const PNG_BYTES: &[u8] = b"\x89PNG\r\n\x1a\nfake";

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CaptureBehavior {
    /// Write the image and report success
    Succeed,
    /// Write a partial file, then report failure
    Fail,
    /// Fail to reach the device
    Error,
}

pub struct MockDriver {
    pub hierarchy: HierarchyNode,
    pub click_result: bool,
    pub press_result: bool,
    pub capture: CaptureBehavior,
    /// Time the capture spends before anything is written
    pub capture_delay: Duration,
    pub rotation: i32,
    /// Time every click/press spends inside the driver
    pub action_delay: Duration,
    pub window_update_result: bool,
    pub window_update_delay: Duration,
    pub idle_delay: Duration,

    pub calls: AtomicUsize,
    pub completed: AtomicUsize,
    pub in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
    pub keys: Mutex<Vec<(i32, i32)>>,
}

impl Default for MockDriver {
    fn default() -> Self {
        Self {
            hierarchy: sample_hierarchy(),
            click_result: true,
            press_result: true,
            capture: CaptureBehavior::Succeed,
            capture_delay: Duration::ZERO,
            rotation: 0,
            action_delay: Duration::ZERO,
            window_update_result: true,
            window_update_delay: Duration::ZERO,
            idle_delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
            completed: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            keys: Mutex::new(Vec::new()),
        }
    }
}

/// Decrements the in-flight count and marks the call completed when dropped
struct CallGuard<'a>(&'a MockDriver);

impl Drop for CallGuard<'_> {
    fn drop(&mut self) {
        self.0.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.0.completed.fetch_add(1, Ordering::SeqCst);
    }
}

impl MockDriver {
    fn enter(&self) -> CallGuard<'_> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        CallGuard(self)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn keys(&self) -> Vec<(i32, i32)> {
        self.keys.lock().unwrap().clone()
    }

    async fn act(&self) {
        if !self.action_delay.is_zero() {
            tokio::time::sleep(self.action_delay).await;
        }
    }
}

#[async_trait]
impl DeviceDriver for MockDriver {
    async fn dump_window_hierarchy(&self) -> Result<HierarchyNode> {
        let _guard = self.enter();
        Ok(self.hierarchy.clone())
    }

    async fn take_screenshot(&self, path: &Path, _scale: f32, _quality: u8) -> Result<bool> {
        let _guard = self.enter();
        if !self.capture_delay.is_zero() {
            tokio::time::sleep(self.capture_delay).await;
        }
        match self.capture {
            CaptureBehavior::Succeed => {
                tokio::fs::write(path, PNG_BYTES).await?;
                Ok(true)
            }
            CaptureBehavior::Fail => {
                tokio::fs::write(path, &PNG_BYTES[..4]).await?;
                Ok(false)
            }
            CaptureBehavior::Error => Err(anyhow!("device offline")),
        }
    }

    async fn click(&self, _x: i32, _y: i32) -> Result<bool> {
        let _guard = self.enter();
        self.act().await;
        Ok(self.click_result)
    }

    async fn current_package_name(&self) -> Result<String> {
        let _guard = self.enter();
        Ok("com.example.app".to_string())
    }

    async fn display_height(&self) -> Result<i32> {
        let _guard = self.enter();
        Ok(1920)
    }

    async fn display_width(&self) -> Result<i32> {
        let _guard = self.enter();
        Ok(1080)
    }

    async fn display_rotation(&self) -> Result<i32> {
        let _guard = self.enter();
        Ok(self.rotation)
    }

    async fn display_size_dp(&self) -> Result<DisplaySizeDp> {
        let _guard = self.enter();
        Ok(DisplaySizeDp { x: 411, y: 731 })
    }

    async fn last_traversed_text(&self) -> Result<Option<String>> {
        let _guard = self.enter();
        Ok(Some("Hello".to_string()))
    }

    async fn product_name(&self) -> Result<String> {
        let _guard = self.enter();
        Ok("sdk_gphone64".to_string())
    }

    async fn press_key_code(&self, key_code: i32, meta_state: i32) -> Result<bool> {
        let _guard = self.enter();
        self.keys.lock().unwrap().push((key_code, meta_state));
        self.act().await;
        Ok(self.press_result)
    }

    async fn wait_for_idle(&self, _timeout: Duration) -> Result<()> {
        let _guard = self.enter();
        tokio::time::sleep(self.idle_delay).await;
        Ok(())
    }

    async fn wait_for_window_update(
        &self,
        _package_name: Option<&str>,
        _timeout: Duration,
    ) -> Result<bool> {
        let _guard = self.enter();
        tokio::time::sleep(self.window_update_delay).await;
        Ok(self.window_update_result)
    }
}

pub fn sample_hierarchy() -> HierarchyNode {
    HierarchyNode::new("hierarchy").with_attr("rotation", "0").with_child(
        HierarchyNode::new("node")
            .with_attr("index", "0")
            .with_attr("text", "")
            .with_attr("resource-id", "android:id/content")
            .with_attr("class", "android.widget.FrameLayout")
            .with_attr("content-desc", "")
            .with_attr("clickable", "false")
            .with_child(
                HierarchyNode::new("node")
                    .with_attr("index", "0")
                    .with_attr("text", "Hello world")
                    .with_attr("resource-id", "com.example:id/greeting")
                    .with_attr("class", "android.widget.TextView")
                    .with_attr("content-desc", "")
                    .with_attr("clickable", "false"),
            )
            .with_child(
                HierarchyNode::new("node")
                    .with_attr("index", "1")
                    .with_attr("text", "OK")
                    .with_attr("resource-id", "android:id/button1")
                    .with_attr("class", "android.widget.Button")
                    .with_attr("content-desc", "Confirm")
                    .with_attr("clickable", "true"),
            ),
    )
}

/// Dispatcher over `driver`, writing screenshots to `scratch`
pub fn dispatcher(driver: Arc<MockDriver>, scratch: &Path, delay: Duration) -> CommandDispatcher {
    let device = DeviceHandle::new(driver);
    CommandDispatcher::new(device, ArtifactManager::new(scratch, delay))
}

/// Files currently in `dir`
pub fn files_in(dir: &Path) -> Vec<std::path::PathBuf> {
    match std::fs::read_dir(dir) {
        Ok(entries) => entries.filter_map(|e| e.ok()).map(|e| e.path()).collect(),
        Err(_) => Vec::new(),
    }
}

//! Device access
//!
//! - `DeviceDriver` - the operations a device exposes (one implementation per transport)
//! - `DeviceHandle` - serializes every call into a driver, one in flight at a time
//! - `AdbDriver` - drives an Android device through the `adb` executable

pub mod adb;
pub mod handle;

pub use adb::AdbDriver;
pub use handle::DeviceHandle;

use std::path::Path;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;

use crate::hierarchy::HierarchyNode;
use crate::models::DisplaySizeDp;

pub const KEYCODE_HOME: i32 = 3;
pub const KEYCODE_BACK: i32 = 4;
pub const KEYCODE_ENTER: i32 = 66;
pub const KEYCODE_DEL: i32 = 67;

/// UI automation operations against a single device.
///
/// Boolean results report whether the device accepted the action; `Err` is
/// reserved for failures to reach the device at all. Implementations are not
/// required to tolerate concurrent calls: go through [`DeviceHandle`].
#[async_trait]
pub trait DeviceDriver: Send + Sync {
    /// Snapshot of the current window hierarchy
    async fn dump_window_hierarchy(&self) -> Result<HierarchyNode>;

    /// Write a screenshot to `path`, scaled by `scale`; `quality` is a compression hint
    async fn take_screenshot(&self, path: &Path, scale: f32, quality: u8) -> Result<bool>;

    async fn click(&self, x: i32, y: i32) -> Result<bool>;

    async fn current_package_name(&self) -> Result<String>;

    async fn display_height(&self) -> Result<i32>;

    async fn display_width(&self) -> Result<i32>;

    /// Surface rotation index: 0, 1, 2 or 3 quarter turns
    async fn display_rotation(&self) -> Result<i32>;

    async fn display_size_dp(&self) -> Result<DisplaySizeDp>;

    /// Text from the last UI traversal event, if the driver can observe them
    async fn last_traversed_text(&self) -> Result<Option<String>>;

    async fn product_name(&self) -> Result<String>;

    async fn press_key_code(&self, key_code: i32, meta_state: i32) -> Result<bool>;

    async fn press_back(&self) -> Result<bool> {
        self.press_key_code(KEYCODE_BACK, 0).await
    }

    async fn press_delete(&self) -> Result<bool> {
        self.press_key_code(KEYCODE_DEL, 0).await
    }

    async fn press_enter(&self) -> Result<bool> {
        self.press_key_code(KEYCODE_ENTER, 0).await
    }

    async fn press_home(&self) -> Result<bool> {
        self.press_key_code(KEYCODE_HOME, 0).await
    }

    /// Wait for the foreground application to become idle, at most `timeout`
    async fn wait_for_idle(&self, timeout: Duration) -> Result<()>;

    /// Wait for a window content update, at most `timeout`. Returns `false`
    /// right away when `package_name` is set and the current window belongs
    /// to another package.
    async fn wait_for_window_update(
        &self,
        package_name: Option<&str>,
        timeout: Duration,
    ) -> Result<bool>;
}

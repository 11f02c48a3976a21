//! Android device driver over `adb`
//!
//! Every operation shells out to the `adb` executable; nothing runs on the
//! device besides stock tools (`uiautomator`, `screencap`, `input`, `wm`,
//! `dumpsys`, `getprop`).

use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use image::imageops::FilterType;
use image::ImageFormat;
use regex::Regex;
use tokio::process::Command;
use tokio::time::Instant;

use super::DeviceDriver;
use crate::hierarchy::{uiautomator, HierarchyNode};
use crate::models::{DisplayRotation, DisplaySizeDp};

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Largest scaled screenshot, in pixels, the driver will allocate
const MAX_SCALED_PIXELS: u64 = 64 * 1024 * 1024;

/// Baseline density: 1dp == 1px at 160 dpi
const DENSITY_DEFAULT: f64 = 160.0;

// Meta state bits and the modifier key each one stands for
const META_SHIFT_ON: i32 = 0x1;
const META_ALT_ON: i32 = 0x2;
const META_CTRL_ON: i32 = 0x1000;
const META_META_ON: i32 = 0x10000;
const KEYCODE_ALT_LEFT: i32 = 57;
const KEYCODE_SHIFT_LEFT: i32 = 59;
const KEYCODE_CTRL_LEFT: i32 = 113;
const KEYCODE_META_LEFT: i32 = 117;

static FOCUSED_WINDOW_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"mCurrentFocus=Window\{[^}]*?\s([A-Za-z0-9_.]+)/").expect("focus regex is valid")
});
static FOCUSED_APP_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"mFocusedApp=.*?\s([A-Za-z0-9_.]+)/").expect("focused app regex is valid")
});
static SIZE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(Physical|Override) size:\s*(\d+)x(\d+)").expect("size regex is valid")
});
static DENSITY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(Physical|Override) density:\s*(\d+)").expect("density regex is valid")
});
static ORIENTATION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"SurfaceOrientation:\s*(\d)").expect("orientation regex is valid")
});

pub struct AdbDriver {
    adb: PathBuf,
    serial: Option<String>,
    poll_interval: Duration,
}

impl AdbDriver {
    pub fn new(adb: impl Into<PathBuf>, serial: Option<String>) -> Self {
        Self {
            adb: adb.into(),
            serial,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.adb);
        if let Some(ref serial) = self.serial {
            cmd.arg("-s").arg(serial);
        }
        cmd.kill_on_drop(true);
        cmd
    }

    /// Raw stdout of `adb exec-out <args>`
    async fn exec_out(&self, args: &[&str]) -> Result<Vec<u8>> {
        let output = self
            .command()
            .arg("exec-out")
            .args(args)
            .output()
            .await
            .with_context(|| format!("Failed to run {}", self.adb.display()))?;

        if !output.status.success() {
            bail!(
                "adb exec-out {} failed: {}",
                args.join(" "),
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
        Ok(output.stdout)
    }

    async fn shell(&self, args: &[&str]) -> Result<String> {
        let output = self
            .command()
            .arg("shell")
            .args(args)
            .output()
            .await
            .with_context(|| format!("Failed to run {}", self.adb.display()))?;

        if !output.status.success() {
            bail!(
                "adb shell {} failed: {}",
                args.join(" "),
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    /// Whether a shell command exited successfully. Only spawn failures are errors.
    async fn shell_succeeds(&self, args: &[String]) -> Result<bool> {
        let status = self
            .command()
            .arg("shell")
            .args(args)
            .status()
            .await
            .with_context(|| format!("Failed to run {}", self.adb.display()))?;

        if !status.success() {
            tracing::debug!("adb shell {} exited with {}", args.join(" "), status);
        }
        Ok(status.success())
    }

    async fn raw_dump(&self) -> Result<String> {
        let bytes = self.exec_out(&["uiautomator", "dump", "/dev/tty"]).await?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    async fn rotation(&self) -> Result<DisplayRotation> {
        let index = self.display_rotation().await?;
        DisplayRotation::from_index(index).ok_or_else(|| anyhow!("Invalid rotation {}", index))
    }

    /// Display size in the current orientation
    async fn oriented_size(&self) -> Result<(i32, i32)> {
        let out = self.shell(&["wm", "size"]).await?;
        let (width, height) =
            parse_wm_size(&out).ok_or_else(|| anyhow!("Unexpected `wm size` output: {}", out.trim()))?;

        if self.rotation().await?.is_sideways() {
            Ok((height, width))
        } else {
            Ok((width, height))
        }
    }
}

#[async_trait]
impl DeviceDriver for AdbDriver {
    async fn dump_window_hierarchy(&self) -> Result<HierarchyNode> {
        let raw = self.raw_dump().await?;
        Ok(uiautomator::parse_dump(&raw)?)
    }

    async fn take_screenshot(&self, path: &Path, scale: f32, _quality: u8) -> Result<bool> {
        // PNG is lossless, so the quality hint has nothing to act on
        let png = self.exec_out(&["screencap", "-p"]).await?;
        if png.is_empty() {
            tracing::warn!("screencap returned no data");
            return Ok(false);
        }

        if (scale - 1.0).abs() <= f32::EPSILON {
            tokio::fs::write(path, &png)
                .await
                .with_context(|| format!("Failed to write {}", path.display()))?;
            return Ok(true);
        }

        let target = path.to_path_buf();
        tokio::task::spawn_blocking(move || -> Result<bool> {
            let image = match image::load_from_memory_with_format(&png, ImageFormat::Png) {
                Ok(image) => image,
                Err(e) => {
                    tracing::warn!("Cannot decode screencap output: {}", e);
                    return Ok(false);
                }
            };
            let Some((width, height)) = scaled_dimensions(image.width(), image.height(), scale)
            else {
                tracing::warn!(
                    "Scaling {}x{} by {} exceeds {} pixels",
                    image.width(),
                    image.height(),
                    scale,
                    MAX_SCALED_PIXELS
                );
                return Ok(false);
            };
            image
                .resize_exact(width, height, FilterType::Triangle)
                .save_with_format(&target, ImageFormat::Png)
                .with_context(|| format!("Failed to write {}", target.display()))?;
            Ok(true)
        })
        .await?
    }

    async fn click(&self, x: i32, y: i32) -> Result<bool> {
        let args = ["input".to_string(), "tap".to_string(), x.to_string(), y.to_string()];
        self.shell_succeeds(&args).await
    }

    async fn current_package_name(&self) -> Result<String> {
        let out = self.shell(&["dumpsys", "window"]).await?;
        parse_focused_package(&out).ok_or_else(|| anyhow!("Cannot determine the focused package"))
    }

    async fn display_height(&self) -> Result<i32> {
        Ok(self.oriented_size().await?.1)
    }

    async fn display_width(&self) -> Result<i32> {
        Ok(self.oriented_size().await?.0)
    }

    async fn display_rotation(&self) -> Result<i32> {
        let out = self.shell(&["dumpsys", "input"]).await?;
        Ok(parse_surface_orientation(&out).unwrap_or(0))
    }

    async fn display_size_dp(&self) -> Result<DisplaySizeDp> {
        let (width, height) = self.oriented_size().await?;
        let out = self.shell(&["wm", "density"]).await?;
        let dpi = parse_wm_density(&out)
            .ok_or_else(|| anyhow!("Unexpected `wm density` output: {}", out.trim()))?;
        Ok(DisplaySizeDp {
            x: px_to_dp(width, dpi),
            y: px_to_dp(height, dpi),
        })
    }

    async fn last_traversed_text(&self) -> Result<Option<String>> {
        // traversal events need an accessibility service on the device
        Ok(None)
    }

    async fn product_name(&self) -> Result<String> {
        let out = self.shell(&["getprop", "ro.product.name"]).await?;
        Ok(out.trim().to_string())
    }

    async fn press_key_code(&self, key_code: i32, meta_state: i32) -> Result<bool> {
        self.shell_succeeds(&key_event_args(key_code, meta_state)).await
    }

    async fn wait_for_idle(&self, timeout: Duration) -> Result<()> {
        let deadline = Instant::now() + timeout;
        let mut previous = self.raw_dump().await?;

        while Instant::now() < deadline {
            let remaining = deadline.saturating_duration_since(Instant::now());
            tokio::time::sleep(self.poll_interval.min(remaining)).await;
            let current = self.raw_dump().await?;
            if current == previous {
                return Ok(());
            }
            previous = current;
        }
        Ok(())
    }

    async fn wait_for_window_update(
        &self,
        package_name: Option<&str>,
        timeout: Duration,
    ) -> Result<bool> {
        let deadline = Instant::now() + timeout;

        if let Some(expected) = package_name {
            let current = self.current_package_name().await?;
            if current != expected {
                tracing::debug!("Foreground package is {}, not {}", current, expected);
                return Ok(false);
            }
        }

        let initial = self.raw_dump().await?;
        while Instant::now() < deadline {
            let remaining = deadline.saturating_duration_since(Instant::now());
            tokio::time::sleep(self.poll_interval.min(remaining)).await;
            if self.raw_dump().await? != initial {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

/// Output size for a scaled screenshot, `None` when it would exceed
/// [`MAX_SCALED_PIXELS`]
fn scaled_dimensions(width: u32, height: u32, scale: f32) -> Option<(u32, u32)> {
    let scaled = |side: u32| (f64::from(side) * f64::from(scale)).round().max(1.0);
    let (w, h) = (scaled(width), scaled(height));
    if w * h > MAX_SCALED_PIXELS as f64 {
        return None;
    }
    Some((w as u32, h as u32))
}

fn parse_focused_package(dumpsys_window: &str) -> Option<String> {
    FOCUSED_WINDOW_RE
        .captures(dumpsys_window)
        .or_else(|| FOCUSED_APP_RE.captures(dumpsys_window))
        .map(|c| c[1].to_string())
}

/// `wm size` output; an override size wins over the physical one
fn parse_wm_size(out: &str) -> Option<(i32, i32)> {
    let mut physical = None;
    for c in SIZE_RE.captures_iter(out) {
        let size = (c[2].parse().ok()?, c[3].parse().ok()?);
        if &c[1] == "Override" {
            return Some(size);
        }
        physical = Some(size);
    }
    physical
}

fn parse_wm_density(out: &str) -> Option<i32> {
    let mut physical = None;
    for c in DENSITY_RE.captures_iter(out) {
        let dpi = c[2].parse().ok()?;
        if &c[1] == "Override" {
            return Some(dpi);
        }
        physical = Some(dpi);
    }
    physical
}

fn parse_surface_orientation(dumpsys_input: &str) -> Option<i32> {
    ORIENTATION_RE
        .captures(dumpsys_input)
        .and_then(|c| c[1].parse().ok())
}

fn px_to_dp(px: i32, dpi: i32) -> i32 {
    if dpi <= 0 {
        return px;
    }
    (px as f64 * DENSITY_DEFAULT / dpi as f64).round() as i32
}

/// `input keyevent`, or `input keycombination` when modifiers are held
fn key_event_args(key_code: i32, meta_state: i32) -> Vec<String> {
    let modifiers: Vec<i32> = [
        (META_SHIFT_ON, KEYCODE_SHIFT_LEFT),
        (META_ALT_ON, KEYCODE_ALT_LEFT),
        (META_CTRL_ON, KEYCODE_CTRL_LEFT),
        (META_META_ON, KEYCODE_META_LEFT),
    ]
    .into_iter()
    .filter(|(bit, _)| meta_state & bit != 0)
    .map(|(_, key)| key)
    .collect();

    let mut args = vec!["input".to_string()];
    if modifiers.is_empty() {
        args.push("keyevent".to_string());
    } else {
        args.push("keycombination".to_string());
        args.extend(modifiers.iter().map(i32::to_string));
    }
    args.push(key_code.to_string());
    args
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_focused_package() {
        let out = "  mCurrentFocus=Window{5b7b3c1 u0 com.android.settings/com.android.settings.Settings}\n  mFocusedApp=ActivityRecord{1 u0 com.other/.Main t3}";
        assert_eq!(parse_focused_package(out), Some("com.android.settings".to_string()));

        let status_bar = "  mCurrentFocus=Window{5b7b3c1 u0 StatusBar}\n  mFocusedApp=ActivityRecord{1 u0 com.other/.Main t3}";
        assert_eq!(parse_focused_package(status_bar), Some("com.other".to_string()));

        assert_eq!(parse_focused_package("nothing here"), None);
    }

    #[test]
    fn test_parse_wm_size() {
        assert_eq!(parse_wm_size("Physical size: 1080x1920\n"), Some((1080, 1920)));
        assert_eq!(
            parse_wm_size("Physical size: 1080x1920\nOverride size: 720x1280\n"),
            Some((720, 1280))
        );
        assert_eq!(parse_wm_size("error"), None);
    }

    #[test]
    fn test_scaled_dimensions() {
        assert_eq!(scaled_dimensions(1080, 1920, 0.5), Some((540, 960)));
        assert_eq!(scaled_dimensions(1080, 1920, 2.0), Some((2160, 3840)));
        assert_eq!(scaled_dimensions(1080, 1920, 0.0001), Some((1, 1)));

        // a runaway scale is refused instead of allocating terabytes
        assert_eq!(scaled_dimensions(1080, 1920, 1000.0), None);
        assert_eq!(scaled_dimensions(1080, 1920, f32::MAX), None);
    }

    #[test]
    fn test_parse_wm_density() {
        assert_eq!(parse_wm_density("Physical density: 420\n"), Some(420));
        assert_eq!(
            parse_wm_density("Physical density: 420\nOverride density: 320\n"),
            Some(320)
        );
    }

    #[test]
    fn test_parse_surface_orientation() {
        let out = "    Viewport: displayId=0\n      SurfaceOrientation: 1\n";
        assert_eq!(parse_surface_orientation(out), Some(1));
        assert_eq!(parse_surface_orientation(""), None);
    }

    #[test]
    fn test_px_to_dp() {
        assert_eq!(px_to_dp(1080, 420), 411);
        assert_eq!(px_to_dp(1080, 160), 1080);
        assert_eq!(px_to_dp(1080, 0), 1080);
    }

    #[test]
    fn test_key_event_args() {
        assert_eq!(key_event_args(66, 0), vec!["input", "keyevent", "66"]);
        assert_eq!(
            key_event_args(29, META_CTRL_ON | META_SHIFT_ON),
            vec!["input", "keycombination", "59", "113", "29"]
        );
    }
}

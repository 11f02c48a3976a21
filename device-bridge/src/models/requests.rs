use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct DumpWindowHierarchyQuery {
    #[serde(default = "default_format")]
    pub format: String,
}

fn default_format() -> String {
    "JSON".to_string()
}

#[derive(Debug, Deserialize)]
pub struct ScreenshotQuery {
    #[serde(default = "default_scale")]
    pub scale: f32,
    #[serde(default = "default_quality")]
    pub quality: i32,
}

fn default_scale() -> f32 {
    1.0
}
fn default_quality() -> i32 {
    90
}

#[derive(Debug, Deserialize)]
pub struct ClickQuery {
    pub x: i32,
    pub y: i32,
}

/// Any of the three selector forms; at least one must be present
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FindObjectQuery {
    pub resource_id: Option<String>,
    pub ui_selector: Option<String>,
    pub by_selector: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PressKeyCodeQuery {
    pub key_code: i32,
    /// Each bit set to 1 represents a pressed meta key
    #[serde(default)]
    pub meta_state: i32,
}

/// Timeouts are milliseconds; unsigned so negative values are rejected at extraction
#[derive(Debug, Deserialize)]
pub struct WaitForIdleQuery {
    #[serde(default = "default_idle_timeout")]
    pub timeout: u64,
}

fn default_idle_timeout() -> u64 {
    10_000
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WaitForWindowUpdateQuery {
    pub timeout: u64,
    /// When set, the wait ends early if the foreground window belongs to another package
    pub package_name: Option<String>,
}

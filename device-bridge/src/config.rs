use std::env;
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_PORT: u16 = 8765;
const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_CLEANUP_DELAY_MS: u64 = 2000;
const DEFAULT_ADB_PATH: &str = "adb";

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub host: String,
    /// Where screenshot files are created
    pub scratch_dir: PathBuf,
    /// How long a returned screenshot stays on disk
    pub cleanup_delay: Duration,
    pub adb_path: String,
    /// Target device when more than one is attached
    pub adb_serial: Option<String>,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(DEFAULT_PORT),
            host: env::var("HOST").unwrap_or_else(|_| DEFAULT_HOST.to_string()),
            scratch_dir: env::var("BRIDGE_SCRATCH_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| default_scratch_dir()),
            cleanup_delay: Duration::from_millis(
                env::var("BRIDGE_CLEANUP_DELAY_MS")
                    .ok()
                    .and_then(|d| d.parse().ok())
                    .unwrap_or(DEFAULT_CLEANUP_DELAY_MS),
            ),
            adb_path: env::var("ADB_PATH").unwrap_or_else(|_| DEFAULT_ADB_PATH.to_string()),
            adb_serial: env::var("ANDROID_SERIAL").ok().filter(|s| !s.is_empty()),
        }
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            host: DEFAULT_HOST.to_string(),
            scratch_dir: default_scratch_dir(),
            cleanup_delay: Duration::from_millis(DEFAULT_CLEANUP_DELAY_MS),
            adb_path: DEFAULT_ADB_PATH.to_string(),
            adb_serial: None,
        }
    }
}

/// Platform cache directory, or the system temp dir when there is none
fn default_scratch_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(env::temp_dir)
        .join("device-bridge")
        .join("screenshots")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.port, 8765);
        assert_eq!(config.bind_address(), "127.0.0.1:8765");
        assert_eq!(config.cleanup_delay, Duration::from_millis(2000));
        assert!(config.scratch_dir.ends_with("device-bridge/screenshots"));
        assert!(config.adb_serial.is_none());
    }
}

//! Connection settings – reads/writes `~/.viam/config.toml`.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Persisted CLI configuration stored in `~/.viam/config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the machine's API server.
    #[serde(default = "default_address")]
    pub address: String,

    /// Base URL of the cloud app API (fleet, data and billing).
    #[serde(default = "default_app_address")]
    pub app_address: String,

    /// Per-call deadline in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Print every outgoing request before it is sent.
    #[serde(default)]
    pub log_requests: bool,

    /// Machine part used by `/logs` when none is given.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub default_part_id: String,
}

fn default_address() -> String {
    "http://localhost:8080".to_string()
}
fn default_app_address() -> String {
    "https://app.viam.com".to_string()
}
fn default_timeout_secs() -> u64 {
    10
}

impl Default for Config {
    fn default() -> Self {
        Self {
            address: default_address(),
            app_address: default_app_address(),
            timeout_secs: default_timeout_secs(),
            log_requests: false,
            default_part_id: String::new(),
        }
    }
}

impl Config {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Return the path to `~/.viam/config.toml`.
pub fn config_path() -> PathBuf {
    config_path_for_home(
        &std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .unwrap_or_else(|_| ".".to_string()),
    )
}

pub(crate) fn config_path_for_home(home: &str) -> PathBuf {
    PathBuf::from(home).join(".viam").join("config.toml")
}

/// Load the config from disk and apply env overrides.  Returns `None` if
/// the file does not exist.
pub fn load() -> Result<Option<Config>, String> {
    let Some(mut cfg) = load_from(&config_path())? else {
        return Ok(None);
    };
    apply_env_overrides(&mut cfg);
    Ok(Some(cfg))
}

/// Load the config, falling back to defaults (with env overrides) when the
/// file is absent.
pub fn load_or_default() -> Result<Config, String> {
    match load()? {
        Some(cfg) => Ok(cfg),
        None => {
            let mut cfg = Config::default();
            apply_env_overrides(&mut cfg);
            Ok(cfg)
        }
    }
}

pub(crate) fn load_from(path: &Path) -> Result<Option<Config>, String> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config at {}: {}", path.display(), e))?;
    let cfg: Config = toml::from_str(&raw).map_err(|e| format!("Failed to parse config: {}", e))?;
    Ok(Some(cfg))
}

/// Apply `VIAM_*` environment variable overrides to `cfg`.
///
/// | Variable | Config field |
/// |---|---|
/// | `VIAM_ADDRESS` | `address` |
/// | `VIAM_APP_ADDRESS` | `app_address` |
/// | `VIAM_TIMEOUT_SECS` | `timeout_secs` |
/// | `VIAM_PART_ID` | `default_part_id` |
pub fn apply_env_overrides(cfg: &mut Config) {
    if let Ok(v) = std::env::var("VIAM_ADDRESS") {
        cfg.address = v;
    }
    if let Ok(v) = std::env::var("VIAM_APP_ADDRESS") {
        cfg.app_address = v;
    }
    if let Ok(v) = std::env::var("VIAM_TIMEOUT_SECS")
        && let Ok(secs) = v.parse::<u64>()
    {
        cfg.timeout_secs = secs;
    }
    if let Ok(v) = std::env::var("VIAM_PART_ID") {
        cfg.default_part_id = v;
    }
}

/// Save the config to disk, creating `~/.viam/` if necessary.
pub fn save(cfg: &Config) -> Result<(), String> {
    save_to(cfg, &config_path())
}

pub(crate) fn save_to(cfg: &Config, path: &Path) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| format!("Failed to create config directory: {}", e))?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(parent, fs::Permissions::from_mode(0o700))
                .map_err(|e| format!("Failed to set config directory permissions: {}", e))?;
        }
    }
    let raw = toml::to_string_pretty(cfg).map_err(|e| format!("Failed to serialize config: {}", e))?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .mode(0o600)
            .open(path)
            .and_then(|mut f| {
                use std::io::Write;
                f.write_all(raw.as_bytes())
            })
            .map_err(|e| format!("Failed to write config at {}: {}", path.display(), e))?;
    }
    #[cfg(not(unix))]
    fs::write(path, raw).map_err(|e| format!("Failed to write config at {}: {}", path.display(), e))?;
    Ok(())
}

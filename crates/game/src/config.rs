//! Server configuration. Loaded from config.ron at startup.

use engine_core::{EconomyConfig, UniverseConfig};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Persistent server settings. Loaded from `config.ron` in the current directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default)]
    pub universe: UniverseConfig,
    #[serde(default)]
    pub economy: EconomyConfig,
    /// Directory holding one JSON file per save.
    #[serde(default = "default_save_dir")]
    pub save_dir: PathBuf,
    /// User the headless session logs in as.
    #[serde(default = "default_demo_user")]
    pub demo_user: String,
    /// How long the headless session runs before disconnecting.
    #[serde(default = "default_run_seconds")]
    pub run_seconds: u64,
}

fn default_save_dir() -> PathBuf {
    PathBuf::from("saves")
}
fn default_demo_user() -> String {
    "commander".to_string()
}
fn default_run_seconds() -> u64 {
    10
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            universe: UniverseConfig::default(),
            economy: EconomyConfig::default(),
            save_dir: default_save_dir(),
            demo_user: default_demo_user(),
            run_seconds: default_run_seconds(),
        }
    }
}

impl ServerConfig {
    /// Load config from `config.ron`. A missing file is created with the
    /// defaults; an invalid one falls back to them.
    pub fn load() -> Self {
        Self::load_or_init(&config_path())
    }

    pub fn load_or_init(path: &Path) -> Self {
        if path.exists() {
            return Self::load_from(path);
        }
        let config = Self::default();
        config.save_to(path);
        log::info!("Wrote default config to {:?}", path);
        config
    }

    pub fn load_from(path: &Path) -> Self {
        if let Ok(data) = std::fs::read_to_string(path) {
            match ron::from_str(&data) {
                Ok(c) => return c,
                Err(e) => log::warn!("Invalid config at {:?}: {}, using defaults", path, e),
            }
        }
        Self::default()
    }

    /// Logs on error.
    pub fn save_to(&self, path: &Path) {
        if let Ok(s) = ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default()) {
            if let Err(e) = std::fs::write(path, s) {
                log::warn!("Could not write config to {:?}: {}", path, e);
            }
        }
    }
}

fn config_path() -> PathBuf {
    std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")).join("config.ron")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_config_keeps_defaults() {
        let c: ServerConfig = ron::from_str("(demo_user: \"zim\", economy: (offline_bonus_rate: 0.5))").unwrap();
        assert_eq!(c.demo_user, "zim");
        assert_eq!(c.economy.offline_bonus_rate, 0.5);
        assert_eq!(c.economy.tick_interval_ms, 1000);
        assert_eq!(c.universe.global_seed, 42069);
        assert_eq!(c.run_seconds, 10);
    }

    #[test]
    fn save_then_load() {
        let path = std::env::temp_dir().join(format!("galaxy-config-{}.ron", std::process::id()));
        let mut c = ServerConfig::default();
        c.run_seconds = 3;
        c.save_to(&path);
        let back = ServerConfig::load_from(&path);
        assert_eq!(back.run_seconds, 3);
        assert_eq!(back.universe, c.universe);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn missing_file_is_written_with_defaults() {
        let path = std::env::temp_dir().join(format!("galaxy-init-{}.ron", std::process::id()));
        let _ = std::fs::remove_file(&path);
        let c = ServerConfig::load_or_init(&path);
        assert_eq!(c.demo_user, "commander");
        assert!(path.exists());

        let mut edited = c.clone();
        edited.run_seconds = 7;
        edited.save_to(&path);
        assert_eq!(ServerConfig::load_or_init(&path).run_seconds, 7);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn invalid_file_falls_back() {
        let path = std::env::temp_dir().join(format!("galaxy-bad-{}.ron", std::process::id()));
        std::fs::write(&path, "not ron at all (").unwrap();
        assert_eq!(ServerConfig::load_from(&path).demo_user, "commander");
        let _ = std::fs::remove_file(&path);
    }
}

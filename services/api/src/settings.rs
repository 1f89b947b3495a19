//! Service settings
//!
//! Loaded from an optional `config/api.{toml,json,yaml}` file, then from
//! `API_`-prefixed environment variables with `__` separating nested keys,
//! e.g. `API_ATTENDANCE__GEOFENCE_RADIUS_M=150`.

use attendance::AttendanceConfig;
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3001";

/// API service settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Socket address the HTTP server listens on
    pub bind_addr: String,
    /// JSON curriculum file; the bundled catalog is used when unset
    pub curriculum_path: Option<String>,
    pub attendance: AttendanceConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            curriculum_path: None,
            attendance: AttendanceConfig::default(),
        }
    }
}

impl Settings {
    pub fn load() -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::with_name("config/api").required(false))
            .add_source(
                Environment::with_prefix("API")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;

    fn clear_env() {
        unsafe {
            env::remove_var("API_BIND_ADDR");
            env::remove_var("API_CURRICULUM_PATH");
            env::remove_var("API_ATTENDANCE__GEOFENCE_RADIUS_M");
            env::remove_var("API_ATTENDANCE__DEVICE_REUSE_WINDOW_MINUTES");
        }
    }

    #[test]
    #[serial]
    fn test_defaults() {
        clear_env();

        let settings = Settings::load().unwrap();
        assert_eq!(settings.bind_addr, "0.0.0.0:3001");
        assert!(settings.curriculum_path.is_none());
        assert_eq!(settings.attendance, AttendanceConfig::default());
    }

    #[test]
    #[serial]
    fn test_environment_overrides() {
        clear_env();
        unsafe {
            env::set_var("API_BIND_ADDR", "127.0.0.1:8080");
            env::set_var("API_ATTENDANCE__GEOFENCE_RADIUS_M", "150.5");
            env::set_var("API_ATTENDANCE__DEVICE_REUSE_WINDOW_MINUTES", "30");
        }

        let settings = Settings::load().unwrap();
        assert_eq!(settings.bind_addr, "127.0.0.1:8080");
        assert_eq!(settings.attendance.geofence_radius_m, 150.5);
        assert_eq!(settings.attendance.device_reuse_window_minutes, 30);
        assert_eq!(settings.attendance.session_code_minutes, 10);

        clear_env();
    }
}

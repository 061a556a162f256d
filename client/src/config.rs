//! Client configuration file support.
//!
//! Settings are read from a TOML file and then overridden by environment
//! variables. Every field has a default, so an empty file (or no file at all)
//! yields a working configuration pointed at a local backend.

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{ClientError, ClientResult, ErrorContext};
use crate::models::Coordinates;

/// Latitude of the continental fallback center.
pub const FALLBACK_LATITUDE: f64 = 39.8283;
/// Longitude of the continental fallback center.
pub const FALLBACK_LONGITUDE: f64 = -98.5795;
/// City-scale zoom used after a successful position fix.
pub const LOCAL_ZOOM: u8 = 11;
/// Country-scale zoom used for the fallback center.
pub const WIDE_ZOOM: u8 = 4;

/// Top-level client configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default)]
    pub backend: BackendSettings,
    #[serde(default)]
    pub map: MapSettings,
    #[serde(default)]
    pub selection: SelectionSettings,
    #[serde(default)]
    pub session: SessionSettings,
    #[serde(default)]
    pub device: DeviceSettings,
}

/// Backend connection settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendSettings {
    #[serde(default = "default_backend_url")]
    pub url: String,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

/// Initial viewport settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapSettings {
    #[serde(default = "default_local_zoom")]
    pub local_zoom: u8,
    #[serde(default = "default_wide_zoom")]
    pub wide_zoom: u8,
    #[serde(default = "default_fallback_latitude")]
    pub fallback_latitude: f64,
    #[serde(default = "default_fallback_longitude")]
    pub fallback_longitude: f64,
    #[serde(default = "default_geolocation_timeout_ms")]
    pub geolocation_timeout_ms: u64,
}

/// Highlight decay windows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionSettings {
    #[serde(default = "default_hover_window_ms")]
    pub hover_window_ms: u64,
    #[serde(default = "default_accent_window_ms")]
    pub accent_window_ms: u64,
}

/// Where the bearer token is persisted between runs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSettings {
    #[serde(default)]
    pub token_file: Option<PathBuf>,
}

/// Fixed device position for hosts without a positioning service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeviceSettings {
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
}

fn default_backend_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_request_timeout_ms() -> u64 {
    10_000
}

fn default_local_zoom() -> u8 {
    LOCAL_ZOOM
}

fn default_wide_zoom() -> u8 {
    WIDE_ZOOM
}

fn default_fallback_latitude() -> f64 {
    FALLBACK_LATITUDE
}

fn default_fallback_longitude() -> f64 {
    FALLBACK_LONGITUDE
}

fn default_geolocation_timeout_ms() -> u64 {
    8_000
}

fn default_hover_window_ms() -> u64 {
    1_200
}

fn default_accent_window_ms() -> u64 {
    900
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            url: default_backend_url(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

impl Default for MapSettings {
    fn default() -> Self {
        Self {
            local_zoom: default_local_zoom(),
            wide_zoom: default_wide_zoom(),
            fallback_latitude: default_fallback_latitude(),
            fallback_longitude: default_fallback_longitude(),
            geolocation_timeout_ms: default_geolocation_timeout_ms(),
        }
    }
}

impl Default for SelectionSettings {
    fn default() -> Self {
        Self {
            hover_window_ms: default_hover_window_ms(),
            accent_window_ms: default_accent_window_ms(),
        }
    }
}

impl MapSettings {
    pub fn geolocation_timeout(&self) -> Duration {
        Duration::from_millis(self.geolocation_timeout_ms)
    }
}

impl SelectionSettings {
    pub fn hover_window(&self) -> Duration {
        Duration::from_millis(self.hover_window_ms)
    }

    pub fn accent_window(&self) -> Duration {
        Duration::from_millis(self.accent_window_ms)
    }
}

impl BackendSettings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

impl DeviceSettings {
    pub fn position(&self) -> Option<Coordinates> {
        Coordinates::from_parts(self.latitude, self.longitude)
    }
}

impl ClientConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    /// Returns `ClientError::Configuration` if the file cannot be read or parsed.
    pub fn from_file<P: AsRef<Path>>(path: P) -> ClientResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| ClientError::Configuration {
            message: format!("Failed to read config file: {}", e),
            context: ErrorContext::new("load_config").with_details(path.display().to_string()),
        })?;

        Self::from_toml_str(&content).map_err(|e| e.with_operation("load_config"))
    }

    /// Parse configuration from TOML text.
    pub fn from_toml_str(content: &str) -> ClientResult<Self> {
        let config: ClientConfig = toml::from_str(content).map_err(|e| {
            ClientError::configuration(format!("Failed to parse config file: {}", e))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from the default location.
    ///
    /// Searches for `courtfinder.toml` in:
    /// 1. Current directory
    /// 2. `client/` directory
    /// 3. Parent directory
    ///
    /// Falls back to defaults when no file exists.
    pub fn from_default_location() -> ClientResult<Self> {
        let search_paths = [
            PathBuf::from("courtfinder.toml"),
            PathBuf::from("client/courtfinder.toml"),
            PathBuf::from("../courtfinder.toml"),
        ];

        for path in search_paths {
            if path.exists() {
                return Self::from_file(&path);
            }
        }

        Ok(Self::default())
    }

    /// Resolve the full configuration: file (explicit path, `COURTFINDER_CONFIG`,
    /// or default location) followed by environment overrides.
    ///
    /// # Environment Variables
    /// - `COURTFINDER_CONFIG` (optional): path to the TOML file
    /// - `COURTFINDER_BACKEND_URL` (optional): overrides `backend.url`
    /// - `COURTFINDER_TOKEN_FILE` (optional): overrides `session.token_file`
    pub fn load(path: Option<&Path>) -> ClientResult<Self> {
        let mut config = match path {
            Some(p) => Self::from_file(p)?,
            None => match env::var("COURTFINDER_CONFIG") {
                Ok(p) if !p.trim().is_empty() => Self::from_file(p.trim())?,
                _ => Self::from_default_location()?,
            },
        };
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Apply environment overrides in place.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(url) = env::var("COURTFINDER_BACKEND_URL") {
            if !url.trim().is_empty() {
                self.backend.url = url.trim().to_string();
            }
        }
        if let Ok(path) = env::var("COURTFINDER_TOKEN_FILE") {
            if !path.trim().is_empty() {
                self.session.token_file = Some(PathBuf::from(path.trim()));
            }
        }
    }

    /// Check values that serde alone cannot reject.
    pub fn validate(&self) -> ClientResult<()> {
        url::Url::parse(&self.backend.url).map_err(|e| {
            ClientError::configuration(format!(
                "backend.url '{}' is not a valid URL: {}",
                self.backend.url, e
            ))
        })?;
        if !(-90.0..=90.0).contains(&self.map.fallback_latitude)
            || !(-180.0..=180.0).contains(&self.map.fallback_longitude)
        {
            return Err(ClientError::configuration(
                "map fallback coordinates are out of range",
            ));
        }
        if self.selection.hover_window_ms == 0 || self.selection.accent_window_ms == 0 {
            return Err(ClientError::configuration(
                "selection windows must be greater than zero",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Viewport;
    use crate::services::ViewportPolicy;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.backend.url, "http://localhost:8000");
        assert_eq!(config.map.local_zoom, 11);
        assert_eq!(config.map.wide_zoom, 4);
        assert_eq!(config.selection.hover_window(), Duration::from_millis(1200));
        assert_eq!(config.selection.accent_window(), Duration::from_millis(900));
        assert_eq!(
            ViewportPolicy::from(&config.map).fallback(),
            Viewport::new(Coordinates::new(39.8283, -98.5795), 4)
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_toml_is_default() {
        let config = ClientConfig::from_toml_str("").unwrap();
        assert_eq!(config, ClientConfig::default());
    }

    #[test]
    fn test_partial_toml() {
        let config = ClientConfig::from_toml_str(
            r#"
            [backend]
            url = "https://courts.example.com"

            [selection]
            hover_window_ms = 600

            [device]
            latitude = 40.0
            longitude = -75.0
            "#,
        )
        .unwrap();
        assert_eq!(config.backend.url, "https://courts.example.com");
        assert_eq!(config.backend.request_timeout_ms, 10_000);
        assert_eq!(config.selection.hover_window_ms, 600);
        assert_eq!(config.selection.accent_window_ms, 900);
        assert_eq!(config.device.position(), Some(Coordinates::new(40.0, -75.0)));
    }

    #[test]
    fn test_invalid_url_rejected() {
        let result = ClientConfig::from_toml_str("[backend]\nurl = \"not a url\"");
        assert!(matches!(result, Err(ClientError::Configuration { .. })));
    }

    #[test]
    fn test_zero_window_rejected() {
        let result = ClientConfig::from_toml_str("[selection]\naccent_window_ms = 0");
        assert!(result.is_err());
    }

    #[test]
    fn test_malformed_toml() {
        let result = ClientConfig::from_toml_str("[backend\nurl = 1");
        assert!(matches!(result, Err(ClientError::Configuration { .. })));
    }
}

//! Configuration file and environment overrides
//!
//! Settings live in `<config dir>/spectrum-cli/config.toml`. A missing file
//! means defaults. A few values can be overridden from the environment
//! (including a `.env` file loaded at startup):
//!
//! - `SPECTRUM_ACCESS_TOKEN` - bearer token for the Google backend
//! - `SPECTRUM_BACKEND` - `google` or `xlsx`
//! - `SPECTRUM_WORKBOOK_DIR` - directory scanned by the xlsx backend

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono_tz::Tz;
use log::warn;
use serde::{Deserialize, Serialize};

const APP_DIR: &str = "spectrum-cli";
const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub gateway: GatewayConfig,
    pub layout: LayoutConfig,
    pub cache: CacheConfig,
    pub locale: LocaleConfig,
    pub events: EventsConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    Google,
    Xlsx,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    pub backend: Backend,
    /// Prefer the environment variable; stored tokens expire quickly
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    pub workbook_dir: PathBuf,
    pub timeout_secs: u64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            backend: Backend::Google,
            access_token: None,
            workbook_dir: PathBuf::from("."),
            timeout_secs: 30,
        }
    }
}

/// Names of the system sheets every event workbook carries
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub panel_sheet: String,
    pub approach_sheet: String,
    pub ute_sheet: String,
    /// Sheets that are never treated as station sheets
    pub system_sheets: Vec<String>,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            panel_sheet: "PAINEL".to_string(),
            approach_sheet: "Abordagem".to_string(),
            ute_sheet: "Tabela UTE".to_string(),
            system_sheets: vec![
                "PAINEL".to_string(),
                "Abordagem".to_string(),
                "Tabela UTE".to_string(),
                "Escala".to_string(),
                "LISTAS".to_string(),
            ],
        }
    }
}

impl LayoutConfig {
    pub fn is_system_sheet(&self, name: &str) -> bool {
        name == self.panel_sheet
            || name == self.approach_sheet
            || name == self.ute_sheet
            || self.system_sheets.iter().any(|s| s == name)
    }

    /// Station sheets in workbook order
    pub fn station_sheets(&self, all_sheets: &[String]) -> Vec<String> {
        all_sheets
            .iter()
            .filter(|name| !self.is_system_sheet(name))
            .cloned()
            .collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Lifetime of cached pending queues and frequency indexes; 0 disables
    pub ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { ttl_secs: 180 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LocaleConfig {
    /// IANA zone used for default dates/times of new records
    pub timezone: String,
}

impl Default for LocaleConfig {
    fn default() -> Self {
        Self {
            timezone: "America/Sao_Paulo".to_string(),
        }
    }
}

impl LocaleConfig {
    pub fn tz(&self) -> Tz {
        self.timezone.parse().unwrap_or_else(|_| {
            warn!(
                "Unknown timezone '{}', falling back to America/Sao_Paulo",
                self.timezone
            );
            chrono_tz::America::Sao_Paulo
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EventsConfig {
    /// Workbooks whose normalized name contains this are events
    pub keyword: String,
    /// Explicit event name -> workbook id entries
    pub workbooks: BTreeMap<String, String>,
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            keyword: "monitoracao".to_string(),
            workbooks: BTreeMap::new(),
        }
    }
}

impl Config {
    /// Default config file location
    pub fn default_path() -> Result<PathBuf> {
        let dir = dirs::config_dir().context("Could not determine the user config directory")?;
        Ok(dir.join(APP_DIR).join(CONFIG_FILE))
    }

    /// Load from the default location and apply environment overrides
    pub fn load() -> Result<Self> {
        let path = Self::default_path()?;
        let mut config = Self::load_from(&path)?;
        config.apply_env_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Load from a file; a missing file yields defaults
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {}", parent.display()))?;
        }
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))
    }

    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(token) = lookup("SPECTRUM_ACCESS_TOKEN").filter(|t| !t.trim().is_empty()) {
            self.gateway.access_token = Some(token.trim().to_string());
        }
        if let Some(backend) = lookup("SPECTRUM_BACKEND") {
            match backend.trim().to_lowercase().as_str() {
                "google" => self.gateway.backend = Backend::Google,
                "xlsx" => self.gateway.backend = Backend::Xlsx,
                other => warn!("Ignoring unknown SPECTRUM_BACKEND '{}'", other),
            }
        }
        if let Some(dir) = lookup("SPECTRUM_WORKBOOK_DIR").filter(|d| !d.trim().is_empty()) {
            self.gateway.workbook_dir = PathBuf::from(dir.trim());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.gateway.backend, Backend::Google);
        assert_eq!(config.cache.ttl_secs, 180);
        assert_eq!(config.layout.panel_sheet, "PAINEL");
        assert_eq!(config.layout.approach_sheet, "Abordagem");
        assert_eq!(config.events.keyword, "monitoracao");
        assert_eq!(config.locale.tz(), chrono_tz::America::Sao_Paulo);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: Config = toml::from_str(
            r#"
            [gateway]
            backend = "xlsx"
            workbook_dir = "/data/events"

            [events.workbooks]
            "COP30 Belém" = "1AbCdEf"
            "#,
        )
        .unwrap();

        assert_eq!(config.gateway.backend, Backend::Xlsx);
        assert_eq!(config.gateway.workbook_dir, PathBuf::from("/data/events"));
        assert_eq!(config.gateway.timeout_secs, 30);
        assert_eq!(config.layout.ute_sheet, "Tabela UTE");
        assert_eq!(config.events.workbooks.get("COP30 Belém").map(String::as_str), Some("1AbCdEf"));
    }

    #[test]
    fn test_env_overrides() {
        let mut config = Config::default();
        config.apply_env_overrides(|key| match key {
            "SPECTRUM_ACCESS_TOKEN" => Some(" ya29.token ".to_string()),
            "SPECTRUM_BACKEND" => Some("XLSX".to_string()),
            _ => None,
        });
        assert_eq!(config.gateway.access_token.as_deref(), Some("ya29.token"));
        assert_eq!(config.gateway.backend, Backend::Xlsx);
        assert_eq!(config.gateway.workbook_dir, PathBuf::from("."));
    }

    #[test]
    fn test_station_sheets_exclude_system_sheets() {
        let layout = LayoutConfig::default();
        let all: Vec<String> = ["PAINEL", "Posto Norte", "Abordagem", "LISTAS", "Posto Sul"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(layout.station_sheets(&all), vec!["Posto Norte", "Posto Sul"]);
    }

    #[test]
    fn test_save_and_reload_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let mut config = Config::default();
        config.cache.ttl_secs = 60;
        config.save_to(&path).unwrap();

        let reloaded = Config::load_from(&path).unwrap();
        assert_eq!(reloaded.cache.ttl_secs, 60);
        assert!(Config::load_from(&dir.path().join("missing.toml")).is_ok());
    }
}

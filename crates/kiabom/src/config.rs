//! User configuration file (`<config dir>/kiabom/config.toml`).
//!
//! ```toml
//! [suppliers]
//! timeout_secs = 30
//!
//! [suppliers.mouser]
//! api_key = "..."
//!
//! [suppliers.digikey]
//! client_id = "..."
//! client_secret = "..."
//!
//! [cache]
//! enabled = true
//! ttl_hours = 24
//!
//! [presets.columns]
//! board = ["Designator", "Value", "MPN"]
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

use kiabom_supplier::Credentials;
use kiabom_supplier::cache::{DEFAULT_TTL_HOURS, default_cache_dir};

use crate::presets::Presets;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct UserConfig {
    pub suppliers: SupplierConfig,
    pub cache: CacheConfig,
    pub presets: Presets,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SupplierConfig {
    pub timeout_secs: Option<u64>,
    pub mouser: MouserConfig,
    pub digikey: DigiKeyConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MouserConfig {
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DigiKeyConfig {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub enabled: bool,
    pub ttl_hours: i64,
    pub dir: Option<PathBuf>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl_hours: DEFAULT_TTL_HOURS,
            dir: None,
        }
    }
}

pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("kiabom").join("config.toml"))
}

impl UserConfig {
    /// Load `explicit`, which must exist, or the default config file if there
    /// is one.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => Self::load_file(path),
            None => match default_config_path().filter(|p| p.is_file()) {
                Some(path) => Self::load_file(&path),
                None => Ok(Self::default()),
            },
        }
    }

    fn load_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: UserConfig = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        log::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// File credentials with the environment taking precedence.
    pub fn credentials(&self) -> Credentials {
        Credentials {
            mouser_api_key: self.suppliers.mouser.api_key.clone(),
            digikey_client_id: self.suppliers.digikey.client_id.clone(),
            digikey_client_secret: self.suppliers.digikey.client_secret.clone(),
        }
        .with_env()
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(
            self.suppliers
                .timeout_secs
                .unwrap_or(kiabom_supplier::DEFAULT_TIMEOUT_SECS),
        )
    }

    /// Where supplier responses are cached, `None` when caching is off.
    pub fn cache_dir(&self) -> Option<PathBuf> {
        if !self.cache.enabled {
            return None;
        }
        self.cache.dir.clone().or_else(default_cache_dir)
    }

    pub fn cache_ttl(&self) -> chrono::Duration {
        chrono::Duration::hours(self.cache.ttl_hours.max(0))
    }
}

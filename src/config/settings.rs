//! Process settings from environment variables and `.env` files, read once.

use crate::error::ConfigError;
use std::path::Path;
use std::sync::OnceLock;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8000";

/// Connection strings per provider plus the active provider name (`DB_*` variables).
#[derive(Clone, Debug)]
pub struct DatabaseSettings {
    pub provider: String,
    pub postgres: String,
    /// Entries kept by the column type cache; 0 disables caching.
    pub type_cache_capacity: usize,
}

#[derive(Clone, Debug)]
pub struct Settings {
    pub environment: String,
    pub debug: bool,
    pub bind_addr: String,
    pub database: DatabaseSettings,
}

impl Settings {
    /// Build settings from an arbitrary key lookup (the process environment in production).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let environment = lookup("ENVIRONMENT")
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "production".into());
        let debug = match lookup("DEBUG") {
            Some(v) => parse_bool("DEBUG", &v)?,
            None => false,
        };
        let bind_addr = lookup("BIND_ADDR")
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.into());
        let type_cache_capacity: usize = match lookup("DB_TYPE_CACHE_CAPACITY") {
            Some(v) => v.trim().parse().map_err(|_| ConfigError::Invalid {
                key: "DB_TYPE_CACHE_CAPACITY",
                value: v.clone(),
            })?,
            None => 0,
        };
        Ok(Settings {
            environment,
            debug,
            bind_addr,
            database: DatabaseSettings {
                provider: lookup("DB_PROVIDER").unwrap_or_else(|| "postgres".into()),
                postgres: lookup("DB_POSTGRES").unwrap_or_default(),
                type_cache_capacity,
            },
        })
    }

    /// Settings from the process environment. Call [`load_env_files`] first to pick up
    /// `.env` files.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }
}

fn parse_bool(key: &'static str, v: &str) -> Result<bool, ConfigError> {
    match v.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(ConfigError::Invalid {
            key,
            value: v.to_string(),
        }),
    }
}

/// `.env`, overlaid by `.env.development` in development. Variables already set win.
/// Runs before logging is set up, so a broken `.env.development` is returned for the
/// caller to report.
pub fn load_env_files() -> Result<(), dotenvy::Error> {
    let environment = std::env::var("ENVIRONMENT").unwrap_or_default();
    load_env_files_in(Path::new("."), &environment)
}

fn load_env_files_in(dir: &Path, environment: &str) -> Result<(), dotenvy::Error> {
    // dotenvy never overrides, so the more specific file goes first.
    let development = dir.join(".env.development");
    let result = if environment.trim().eq_ignore_ascii_case("development") && development.exists() {
        dotenvy::from_path(&development)
    } else {
        Ok(())
    };
    dotenvy::from_path(dir.join(".env")).ok();
    result
}

static SETTINGS: OnceLock<Settings> = OnceLock::new();

/// Process-wide settings, read from the environment on first call and cached for the
/// process lifetime.
pub fn settings() -> Result<&'static Settings, ConfigError> {
    if let Some(s) = SETTINGS.get() {
        return Ok(s);
    }
    let loaded = Settings::from_env()?;
    Ok(SETTINGS.get_or_init(|| loaded))
}

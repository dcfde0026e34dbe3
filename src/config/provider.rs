//! Connection info for the active provider.

use super::settings::Settings;
use crate::error::ConfigError;

/// Supplies the active provider name and its connection string.
pub trait ConnectionInfo: Send + Sync {
    fn provider_name(&self) -> String;
    fn connection_string(&self) -> Result<String, ConfigError>;
}

/// Reads provider and connection strings from [`Settings`].
#[derive(Clone, Debug)]
pub struct ConnectionProvider {
    settings: Settings,
}

impl ConnectionProvider {
    pub fn new(settings: Settings) -> Self {
        ConnectionProvider { settings }
    }
}

impl ConnectionInfo for ConnectionProvider {
    fn provider_name(&self) -> String {
        self.settings.database.provider.trim().to_lowercase()
    }

    fn connection_string(&self) -> Result<String, ConfigError> {
        let provider = self.provider_name();
        let db = &self.settings.database;
        let value = match provider.as_str() {
            "postgres" | "postgresql" => &db.postgres,
            _ => {
                return Err(ConfigError::UnsupportedProvider {
                    provider,
                    options: vec!["postgres".into(), "postgresql".into()],
                })
            }
        };
        if value.trim().is_empty() {
            return Err(ConfigError::MissingConnectionString {
                variable: format!("DB_{}", provider.to_uppercase()),
                provider,
            });
        }
        Ok(value.clone())
    }
}

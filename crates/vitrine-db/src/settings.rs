//! # Environment Settings
//!
//! Reads deployment settings from `VITRINE_*` environment variables.
//!
//! ## Variables
//! ```text
//! ┌──────────────────────────────┬──────────────────┬──────────────────────┐
//! │ Variable                     │ Default          │ Feeds                │
//! ├──────────────────────────────┼──────────────────┼──────────────────────┤
//! │ VITRINE_DATABASE_PATH        │ ./vitrine.db     │ DbConfig             │
//! │ VITRINE_CURRENCY             │ USD              │ CoreConfig           │
//! │ VITRINE_MAX_CONNECTIONS      │ 5                │ DbConfig             │
//! └──────────────────────────────┴──────────────────┴──────────────────────┘
//! ```
//!
//! Unset variables fall back to the defaults. A variable that is set but
//! cannot be parsed is an error, never silently ignored.

use std::path::PathBuf;
use thiserror::Error;
use tracing::debug;
use vitrine_core::{Currency, CoreConfig};

use crate::pool::DbConfig;

/// Database file used when `VITRINE_DATABASE_PATH` is unset.
pub const DEFAULT_DATABASE_PATH: &str = "./vitrine.db";

/// Pool size used when `VITRINE_MAX_CONNECTIONS` is unset.
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;

// =============================================================================
// Error
// =============================================================================

/// A `VITRINE_*` variable holds a value that cannot be used.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{var} has invalid value '{value}': {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

// =============================================================================
// Settings
// =============================================================================

/// Deployment settings for a Vitrine process.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub database_path: PathBuf,
    pub currency: Currency,
    pub max_connections: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            database_path: PathBuf::from(DEFAULT_DATABASE_PATH),
            currency: Currency::USD,
            max_connections: DEFAULT_MAX_CONNECTIONS,
        }
    }
}

impl Settings {
    /// Reads settings from the process environment.
    ///
    /// ## Example
    /// ```rust,ignore
    /// let settings = Settings::from_env()?;
    /// let db = Database::new(settings.db_config()).await?;
    /// ```
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Reads settings through `lookup`, which returns a variable's value if set.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = Settings::default();

        if let Some(path) = lookup("VITRINE_DATABASE_PATH") {
            if path.trim().is_empty() {
                return Err(ConfigError::Invalid {
                    var: "VITRINE_DATABASE_PATH",
                    value: path,
                    reason: "must not be empty".to_string(),
                });
            }
            debug!(path = %path, "Overriding database path from environment");
            settings.database_path = PathBuf::from(path);
        }

        if let Some(code) = lookup("VITRINE_CURRENCY") {
            let currency = code
                .trim()
                .to_uppercase()
                .parse::<Currency>()
                .map_err(|e| ConfigError::Invalid {
                    var: "VITRINE_CURRENCY",
                    value: code.clone(),
                    reason: e.to_string(),
                })?;
            debug!(currency = %currency, "Overriding default currency from environment");
            settings.currency = currency;
        }

        if let Some(max) = lookup("VITRINE_MAX_CONNECTIONS") {
            let parsed = max
                .trim()
                .parse::<u32>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or_else(|| ConfigError::Invalid {
                    var: "VITRINE_MAX_CONNECTIONS",
                    value: max.clone(),
                    reason: "expected a positive integer".to_string(),
                })?;
            debug!(max_connections = parsed, "Overriding pool size from environment");
            settings.max_connections = parsed;
        }

        Ok(settings)
    }

    /// Pool configuration for these settings.
    pub fn db_config(&self) -> DbConfig {
        DbConfig::new(self.database_path.clone()).max_connections(self.max_connections)
    }

    /// Business configuration for these settings.
    pub fn core_config(&self) -> CoreConfig {
        CoreConfig::default().with_default_currency(self.currency)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

//! Settings for the application.
//!
//! Read from an optional `settings.toml` and from `EMBALLAGE__…` environment
//! variables (`EMBALLAGE__DATABASE__SQLITE=ledger.db`,
//! `EMBALLAGE__AUTO_CREATE_ACCOUNTS=true`). Command line flags win over both.

use std::collections::HashMap;

use config::{Config, Environment, File};
use engine::{UnitOverride, UnitRegistry};
use serde::Deserialize;

use crate::{cli::Cli, error::Result};

const DEFAULT_CONFIG_PATH: &str = "settings";
const DEFAULT_DATABASE_PATH: &str = "emballage.db";
const MEMORY_DATABASE: &str = ":memory:";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct App {
    pub level: String,
}

impl Default for App {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Database {
    Memory,
    Sqlite(String),
}

impl Default for Database {
    fn default() -> Self {
        Self::Sqlite(DEFAULT_DATABASE_PATH.to_string())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub app: App,
    pub database: Database,
    /// Unknown account aliases create the account instead of failing.
    pub auto_create_accounts: bool,
    /// Per unit id overrides of the built-in catalog.
    pub units: HashMap<String, UnitOverride>,
}

impl Settings {
    /// Load file and environment, then apply the command line overrides.
    pub fn load(cli: &Cli) -> Result<Self> {
        let path = cli.config.as_deref().unwrap_or(DEFAULT_CONFIG_PATH);
        let settings: Settings = Config::builder()
            .add_source(File::with_name(path).required(cli.config.is_some()))
            .add_source(
                Environment::with_prefix("EMBALLAGE")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        Ok(settings.with_overrides(cli))
    }

    #[cfg(test)]
    fn from_toml(text: &str) -> Result<Self> {
        let settings = Config::builder()
            .add_source(File::from_str(text, config::FileFormat::Toml))
            .build()?
            .try_deserialize()?;
        Ok(settings)
    }

    fn with_overrides(mut self, cli: &Cli) -> Self {
        if let Some(path) = &cli.database {
            self.database = if path == MEMORY_DATABASE {
                Database::Memory
            } else {
                Database::Sqlite(path.clone())
            };
        }
        if cli.auto_create {
            self.auto_create_accounts = true;
        }
        self
    }

    /// Built-in units with the configured overrides applied.
    pub fn registry(&self) -> UnitRegistry {
        UnitRegistry::builtin().with_overrides(&self.units)
    }
}

//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.appearance-report.toml` files.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// File name looked up in the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = ".appearance-report.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Database connection settings.
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Report settings.
    #[serde(default)]
    pub report: ReportConfig,
}

/// General application settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,
}

/// Database connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Server host name or address.
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Login user.
    #[serde(default = "default_user")]
    pub user: String,

    /// Login password. Prefer the environment variable over storing it here.
    #[serde(default)]
    pub password: String,

    /// Database (schema) name.
    #[serde(default = "default_database")]
    pub database: String,

    /// Seconds to wait for the connection before giving up.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_seconds: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            user: default_user(),
            password: String::new(),
            database: default_database(),
            connect_timeout_seconds: default_connect_timeout(),
        }
    }
}

impl DatabaseConfig {
    /// Label used in logs and the report footer. Never includes credentials.
    pub fn source_label(&self) -> String {
        format!("{}@{}:{}", self.database, self.host, self.port)
    }
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    3306
}

fn default_user() -> String {
    "wwdtm".to_string()
}

fn default_database() -> String {
    "wwdtm".to_string()
}

fn default_connect_timeout() -> u64 {
    10
}

/// Report generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Output file path. `-` writes to standard output.
    #[serde(default = "default_output")]
    pub output: String,

    /// Heading shown at the top of the report.
    #[serde(default = "default_title")]
    pub title: String,

    /// Google Analytics property code; empty disables the snippet.
    #[serde(default)]
    pub ga_property_code: String,

    /// Count appearances on "best of" compilation shows.
    #[serde(default)]
    pub include_best_of: bool,

    /// Count appearances on repeat broadcasts.
    #[serde(default)]
    pub include_repeats: bool,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            output: default_output(),
            title: default_title(),
            ga_property_code: String::new(),
            include_best_of: false,
            include_repeats: false,
        }
    }
}

impl ReportConfig {
    /// The analytics code, or `None` when unset.
    pub fn ga_property_code(&self) -> Option<&str> {
        let code = self.ga_property_code.trim();
        (!code.is_empty()).then_some(code)
    }
}

fn default_output() -> String {
    "output/index.html".to_string()
}

fn default_title() -> String {
    "Panelist Appearances by Year".to_string()
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        Self::load_from_dir(Path::new("."))
    }

    /// Try to load the default config file from a directory.
    pub fn load_from_dir(dir: &Path) -> Result<Option<Self>> {
        let config_path = dir.join(DEFAULT_CONFIG_FILE);

        if config_path.exists() {
            Ok(Some(Self::load(&config_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings, but only
    /// when they were given explicitly.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        // Database settings
        if let Some(ref host) = args.db_host {
            self.database.host = host.clone();
        }
        if let Some(port) = args.db_port {
            self.database.port = port;
        }
        if let Some(ref user) = args.db_user {
            self.database.user = user.clone();
        }
        if let Some(ref password) = args.db_password {
            self.database.password = password.clone();
        }
        if let Some(ref name) = args.db_name {
            self.database.database = name.clone();
        }

        // Report settings
        if let Some(ref output) = args.output {
            self.report.output = output.display().to_string();
        }
        if let Some(ref title) = args.title {
            self.report.title = title.clone();
        }
        if let Some(ref code) = args.ga_property_code {
            self.report.ga_property_code = code.clone();
        }

        // Flags only ever widen the selection
        if args.include_best_of {
            self.report.include_best_of = true;
        }
        if args.include_repeats {
            self.report.include_repeats = true;
        }
        if args.verbose {
            self.general.verbose = true;
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}

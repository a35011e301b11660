//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use clap::Parser;
use std::path::PathBuf;

/// appearance-report - per-year panelist appearance report
///
/// Reads show and panelist tables from the quiz show database, counts how
/// often each panelist appeared in each year and writes an HTML table.
///
/// Examples:
///   appearance-report
///   appearance-report --db-host db.internal --db-user reporter -o public/index.html
///   appearance-report --format json -o -
///   appearance-report --dry-run
///   appearance-report --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Path to configuration file
    ///
    /// If not specified, looks for .appearance-report.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Output file path for the report (`-` for stdout)
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output format (html, json)
    #[arg(long, default_value = "html", value_name = "FORMAT")]
    pub format: OutputFormat,

    /// Heading shown at the top of the report
    #[arg(long, value_name = "TEXT")]
    pub title: Option<String>,

    /// Database server host
    #[arg(long, value_name = "HOST")]
    pub db_host: Option<String>,

    /// Database server port
    #[arg(long, value_name = "PORT")]
    pub db_port: Option<u16>,

    /// Database login user
    #[arg(long, value_name = "USER")]
    pub db_user: Option<String>,

    /// Database login password
    #[arg(
        long,
        value_name = "PASSWORD",
        env = "APPEARANCE_REPORT_DB_PASSWORD",
        hide_env_values = true
    )]
    pub db_password: Option<String>,

    /// Database name
    #[arg(long, value_name = "NAME")]
    pub db_name: Option<String>,

    /// Google Analytics property code to embed in the page
    ///
    /// Overrides the value from the configuration file.
    #[arg(long, value_name = "CODE")]
    pub ga_property_code: Option<String>,

    /// Count appearances on "best of" compilation shows
    #[arg(long)]
    pub include_best_of: bool,

    /// Count appearances on repeat broadcasts
    #[arg(long)]
    pub include_repeats: bool,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Dry run: query and aggregate without writing a report
    ///
    /// Prints a summary of what the report would contain and exits.
    #[arg(long)]
    pub dry_run: bool,

    /// Generate a default .appearance-report.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Self-contained HTML page (default)
    #[default]
    Html,
    /// JSON document
    Json,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        // Check for conflicting options
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if self.db_port == Some(0) {
            return Err("Database port must be between 1 and 65535".to_string());
        }

        if let Some(ref host) = self.db_host {
            if host.trim().is_empty() {
                return Err("Database host must not be empty".to_string());
            }
        }

        if let Some(ref output) = self.output {
            if output.as_os_str().is_empty() {
                return Err("Output path must not be empty".to_string());
            }
            if output.is_dir() {
                return Err(format!("Output path is a directory: {}", output.display()));
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    ///
    /// `config_verbose` is the `[general] verbose` setting; `--quiet` wins over it.
    pub fn log_level(&self, config_verbose: bool) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose || config_verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn make_args() -> Args {
        Args {
            config: None,
            output: None,
            format: OutputFormat::Html,
            title: None,
            db_host: None,
            db_port: None,
            db_user: None,
            db_password: None,
            db_name: None,
            ga_property_code: None,
            include_best_of: false,
            include_repeats: false,
            verbose: false,
            quiet: false,
            dry_run: false,
            init_config: false,
        }
    }

    #[test]
    fn test_no_arguments_required() {
        let args = Args::try_parse_from(["appearance-report"]).unwrap();
        assert_eq!(args.format, OutputFormat::Html);
        assert!(args.output.is_none());
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_parse_flags() {
        let args = Args::try_parse_from([
            "appearance-report",
            "--db-host",
            "db.internal",
            "--db-port",
            "3307",
            "--format",
            "json",
            "-o",
            "-",
            "--include-repeats",
        ])
        .unwrap();

        assert_eq!(args.db_host.as_deref(), Some("db.internal"));
        assert_eq!(args.db_port, Some(3307));
        assert_eq!(args.format, OutputFormat::Json);
        assert_eq!(args.output, Some(PathBuf::from("-")));
        assert!(args.include_repeats);
        assert!(!args.include_best_of);
    }

    #[test]
    fn test_validation_conflicting_options() {
        let mut args = make_args();
        args.verbose = true;
        args.quiet = true;
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_bad_port() {
        let mut args = make_args();
        args.db_port = Some(0);
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_output_directory() {
        let dir = tempfile::TempDir::new().unwrap();
        let mut args = make_args();
        args.output = Some(dir.path().to_path_buf());
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_log_level() {
        let mut args = make_args();
        assert_eq!(args.log_level(false), tracing::Level::INFO);

        args.verbose = true;
        assert_eq!(args.log_level(false), tracing::Level::DEBUG);

        args.verbose = false;
        args.quiet = true;
        assert_eq!(args.log_level(false), tracing::Level::ERROR);
    }

    #[test]
    fn test_log_level_from_config() {
        let mut args = make_args();
        assert_eq!(args.log_level(true), tracing::Level::DEBUG);

        args.quiet = true;
        assert_eq!(args.log_level(true), tracing::Level::ERROR);
    }
}

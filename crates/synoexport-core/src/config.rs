//! Configuration module for SynoExport.
//!
//! Provides typed configuration structs that map to the YAML configuration file,
//! with loading, validation, defaults, and a builder pattern for programmatic use.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Config struct with sub-sections
// ---------------------------------------------------------------------------

/// Top-level configuration for SynoExport.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub drive: DriveConfig,
    pub export: ExportConfig,
    pub logging: LoggingConfig,
}

/// Connection settings for the Synology NAS.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DriveConfig {
    /// Base URL of the NAS, e.g. `https://nas.local:5001`.
    pub url: String,
    /// Account name used to log in.
    pub username: String,
    /// Password; usually left empty and supplied through the environment.
    pub password: Option<String>,
    /// Whether TLS certificates are verified.
    pub verify_tls: bool,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
    /// Maximum retries for transient HTTP failures, at most 10.
    pub max_retries: u32,
}

/// Export settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Directory receiving the exported files and the history files.
    pub output_dir: PathBuf,
    /// Sources to export: `mydrive`, `teamfolder`, `shared`.
    pub sources: Vec<String>,
    /// Re-download every document even if its hash is unchanged.
    pub force_refresh: bool,
    /// Run all decisions without fetching, writing or removing anything.
    pub dry_run: bool,
    /// Number of items requested per listing page.
    pub page_size: u64,
    /// Permission bits for created directories.
    pub dir_mode: u32,
    /// Permission bits for exported files.
    pub file_mode: u32,
}

/// Logging / tracing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: `trace`, `debug`, `info`, `warn`, or `error`.
    pub level: String,
}

// ---------------------------------------------------------------------------
// Config::load()
// ---------------------------------------------------------------------------

impl Config {
    /// Load configuration from a YAML file at `path`.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Try to load from `path`; fall back to [`Config::default`] on any error.
    pub fn load_or_default(path: &Path) -> Self {
        Self::load(path).unwrap_or_default()
    }

    /// Platform-appropriate default path for the configuration file.
    ///
    /// Typically `$XDG_CONFIG_HOME/synoexport/config.yaml` on Linux.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("synoexport")
            .join("config.yaml")
    }
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

impl Default for DriveConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            username: String::new(),
            password: None,
            verify_tls: true,
            timeout_secs: 60,
            max_retries: 3,
        }
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            output_dir: dirs::document_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("synology-office"),
            sources: vec!["mydrive".to_string()],
            force_refresh: false,
            dry_run: false,
            page_size: 1000,
            dir_mode: 0o755,
            file_mode: 0o644,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Config::validate()
// ---------------------------------------------------------------------------

/// A single validation error with the field path and a human-readable message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path to the offending field, e.g. `"export.page_size"`.
    pub field: String,
    /// Human-readable explanation.
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Valid values for `logging.level`.
const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Valid values for `export.sources`.
pub const VALID_SOURCES: &[&str] = &["mydrive", "teamfolder", "shared"];

/// Most retries allowed for one request.
const MAX_RETRIES: u32 = 10;

/// Largest page size the Drive listing API accepts.
const MAX_PAGE_SIZE: u64 = 10_000;

impl Config {
    /// Validate the configuration and return all errors found.
    ///
    /// An empty vector means the configuration is valid.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        // --- drive ---
        if self.drive.url.is_empty() {
            errors.push(ValidationError {
                field: "drive.url".into(),
                message: "must be set".into(),
            });
        } else if !(self.drive.url.starts_with("http://") || self.drive.url.starts_with("https://"))
        {
            errors.push(ValidationError {
                field: "drive.url".into(),
                message: format!("must start with http:// or https://: {}", self.drive.url),
            });
        }
        if self.drive.username.is_empty() {
            errors.push(ValidationError {
                field: "drive.username".into(),
                message: "must be set".into(),
            });
        }
        if self.drive.timeout_secs == 0 {
            errors.push(ValidationError {
                field: "drive.timeout_secs".into(),
                message: "must be greater than 0".into(),
            });
        }
        if self.drive.max_retries > MAX_RETRIES {
            errors.push(ValidationError {
                field: "drive.max_retries".into(),
                message: format!("must be at most {MAX_RETRIES}, got {}", self.drive.max_retries),
            });
        }

        // --- export ---
        if self.export.sources.is_empty() {
            errors.push(ValidationError {
                field: "export.sources".into(),
                message: "at least one source is required".into(),
            });
        }
        for source in &self.export.sources {
            if !VALID_SOURCES.contains(&source.as_str()) {
                errors.push(ValidationError {
                    field: "export.sources".into(),
                    message: format!(
                        "invalid source '{}'; valid options: {}",
                        source,
                        VALID_SOURCES.join(", ")
                    ),
                });
            }
        }
        if self.export.page_size == 0 || self.export.page_size > MAX_PAGE_SIZE {
            errors.push(ValidationError {
                field: "export.page_size".into(),
                message: format!("must be in range 1..={MAX_PAGE_SIZE}"),
            });
        }
        if self.export.dir_mode > 0o7777 {
            errors.push(ValidationError {
                field: "export.dir_mode".into(),
                message: format!("not a permission mode: {:o}", self.export.dir_mode),
            });
        }
        if self.export.file_mode > 0o7777 {
            errors.push(ValidationError {
                field: "export.file_mode".into(),
                message: format!("not a permission mode: {:o}", self.export.file_mode),
            });
        }

        // --- logging ---
        if !VALID_LOG_LEVELS.contains(&self.logging.level.as_str()) {
            errors.push(ValidationError {
                field: "logging.level".into(),
                message: format!(
                    "invalid level '{}'; valid options: {}",
                    self.logging.level,
                    VALID_LOG_LEVELS.join(", ")
                ),
            });
        }

        errors
    }
}

// ---------------------------------------------------------------------------
// ConfigBuilder
// ---------------------------------------------------------------------------

/// Builder for constructing a [`Config`] programmatically.
///
/// Starts from [`Config::default`] and allows selective overrides. The CLI
/// uses it to layer command-line flags over the configuration file.
///
/// # Example
///
/// ```rust,no_run
/// use synoexport_core::config::ConfigBuilder;
/// use std::path::PathBuf;
///
/// let config = ConfigBuilder::new()
///     .drive_url("https://nas.local:5001")
///     .drive_username("alice")
///     .export_output_dir(PathBuf::from("/srv/backup/office"))
///     .build();
/// ```
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Create a new builder pre-populated with default values.
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    /// Start from an existing configuration (e.g. one loaded from disk).
    pub fn from_config(config: Config) -> Self {
        Self { config }
    }

    // -- drive --

    pub fn drive_url(mut self, url: impl Into<String>) -> Self {
        self.config.drive.url = url.into();
        self
    }

    pub fn drive_username(mut self, username: impl Into<String>) -> Self {
        self.config.drive.username = username.into();
        self
    }

    pub fn drive_password(mut self, password: impl Into<String>) -> Self {
        self.config.drive.password = Some(password.into());
        self
    }

    pub fn drive_verify_tls(mut self, verify: bool) -> Self {
        self.config.drive.verify_tls = verify;
        self
    }

    pub fn drive_timeout_secs(mut self, seconds: u64) -> Self {
        self.config.drive.timeout_secs = seconds;
        self
    }

    pub fn drive_max_retries(mut self, retries: u32) -> Self {
        self.config.drive.max_retries = retries;
        self
    }

    // -- export --

    pub fn export_output_dir(mut self, dir: PathBuf) -> Self {
        self.config.export.output_dir = dir;
        self
    }

    pub fn export_sources<I, S>(mut self, sources: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.export.sources = sources.into_iter().map(Into::into).collect();
        self
    }

    pub fn export_force_refresh(mut self, force: bool) -> Self {
        self.config.export.force_refresh = force;
        self
    }

    pub fn export_dry_run(mut self, dry_run: bool) -> Self {
        self.config.export.dry_run = dry_run;
        self
    }

    pub fn export_page_size(mut self, page_size: u64) -> Self {
        self.config.export.page_size = page_size;
        self
    }

    pub fn export_dir_mode(mut self, mode: u32) -> Self {
        self.config.export.dir_mode = mode;
        self
    }

    pub fn export_file_mode(mut self, mode: u32) -> Self {
        self.config.export.file_mode = mode;
        self
    }

    // -- logging --

    pub fn logging_level(mut self, level: impl Into<String>) -> Self {
        self.config.logging.level = level.into();
        self
    }

    /// Consume the builder and return the [`Config`] without validation.
    pub fn build(self) -> Config {
        self.config
    }

    /// Consume the builder, validate, and return the [`Config`] or errors.
    pub fn build_validated(self) -> Result<Config, Vec<ValidationError>> {
        let errors = self.config.validate();
        if errors.is_empty() {
            Ok(self.config)
        } else {
            Err(errors)
        }
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

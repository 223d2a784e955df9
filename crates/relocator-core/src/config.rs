use config::{Config, ConfigError, Environment, File as ConfigFile};
use serde::Deserialize;
use std::ffi::OsStr;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Where the roots and ignored/skipped marks are persisted.
    pub preferences_path: String,
    /// Pause after creating a link before its status is re-read.
    pub settle_delay_ms: u64,
    /// Worker threads used to measure entries during a scan. 0 lets rayon decide.
    pub scan_threads: usize,
    pub clear_read_only: bool,
    /// Glob patterns for directories that never show up in a listing.
    pub ignore_patterns: Vec<String>,
    /// `tracing` filter directive for the command line front end.
    pub log_level: String,
    pub log_file: String,
}

impl AppConfig {
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    /// Directory holding the log file, the working directory when none is given.
    pub fn log_directory(&self) -> &Path {
        match Path::new(&self.log_file).parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        }
    }

    pub fn log_file_name(&self) -> &OsStr {
        Path::new(&self.log_file)
            .file_name()
            .unwrap_or_else(|| OsStr::new("relocator.log"))
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            preferences_path: "preferences.toml".to_string(),
            settle_delay_ms: 500,
            scan_threads: 0,
            clear_read_only: true,
            ignore_patterns: Vec::new(),
            log_level: "info".to_string(),
            log_file: "./logs/relocator.log".to_string(),
        }
    }
}

/// Load `Relocator.toml` (optional) layered under `RELOCATOR_*` environment variables.
pub fn load_configuration() -> Result<AppConfig, ConfigError> {
    let defaults = AppConfig::default();
    let builder = Config::builder()
        .set_default("preferences_path", defaults.preferences_path)?
        .set_default("settle_delay_ms", defaults.settle_delay_ms)?
        .set_default("scan_threads", defaults.scan_threads as u64)?
        .set_default("clear_read_only", defaults.clear_read_only)?
        .set_default("ignore_patterns", Vec::<String>::new())?
        .set_default("log_level", defaults.log_level)?
        .set_default("log_file", defaults.log_file)?
        .add_source(ConfigFile::with_name("Relocator").required(false))
        .add_source(
            Environment::with_prefix("RELOCATOR")
                .try_parsing(true)
                .list_separator(";")
                .with_list_parse_key("ignore_patterns"),
        )
        .build()?;
    builder.try_deserialize::<AppConfig>()
}

//! CLI configuration management
//!
//! Handles loading configuration from TOML files, environment variables and
//! command-line flags.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use pricer_sharding::EngineConfig;
use serde::Deserialize;

use crate::error::{CliError, Result};

/// Configuration file picked up from the working directory when `--config`
/// is not given
pub const DEFAULT_CONFIG_FILE: &str = "neutryx-mc.toml";

/// Log level override
pub const ENV_LOG_LEVEL: &str = "NEUTRYX_MC_LOG_LEVEL";
/// Worker slot override
pub const ENV_WORKER_THREADS: &str = "NEUTRYX_MC_WORKER_THREADS";
/// Attempts-per-shard override
pub const ENV_MAX_ATTEMPTS: &str = "NEUTRYX_MC_MAX_ATTEMPTS";
/// Throughput (step evaluations per second) override
pub const ENV_THROUGHPUT: &str = "NEUTRYX_MC_THROUGHPUT";
/// Overall deadline override, in seconds
pub const ENV_DEADLINE_SECS: &str = "NEUTRYX_MC_DEADLINE_SECS";

/// Log levels supported by the CLI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl FromStr for LogLevel {
    type Err = CliError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            _ => Err(CliError::InvalidLogLevel(s.to_string())),
        }
    }
}

impl LogLevel {
    /// Convert log level to tracing filter string
    pub fn as_filter_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_filter_str())
    }
}

/// Complete CLI configuration
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// Log level
    #[serde(deserialize_with = "deserialize_log_level")]
    pub log_level: LogLevel,
    /// Engine tunables (`[engine]` table)
    pub engine: EngineConfig,
}

fn deserialize_log_level<'de, D>(deserializer: D) -> std::result::Result<LogLevel, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    LogLevel::from_str(&s).map_err(serde::de::Error::custom)
}

fn parse_var<T: FromStr>(name: &'static str, value: String) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| CliError::Env { name, value })
}

impl CliConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| CliError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        toml::from_str(&content)
            .map_err(|e| CliError::Config(format!("Failed to parse {}: {}", path.display(), e)))
    }

    /// Apply environment overrides read through `var`
    pub fn apply_env<F>(&mut self, var: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(level) = var(ENV_LOG_LEVEL) {
            self.log_level = LogLevel::from_str(&level)?;
        }
        if let Some(threads) = var(ENV_WORKER_THREADS) {
            self.engine.worker_threads = parse_var(ENV_WORKER_THREADS, threads)?;
        }
        if let Some(attempts) = var(ENV_MAX_ATTEMPTS) {
            self.engine.max_attempts = parse_var(ENV_MAX_ATTEMPTS, attempts)?;
        }
        if let Some(throughput) = var(ENV_THROUGHPUT) {
            self.engine.throughput_steps_per_sec = parse_var(ENV_THROUGHPUT, throughput)?;
        }
        if let Some(deadline) = var(ENV_DEADLINE_SECS) {
            self.engine.overall_deadline_secs = Some(parse_var(ENV_DEADLINE_SECS, deadline)?);
        }
        Ok(())
    }

    /// Merge with CLI arguments (CLI takes precedence)
    pub fn merge_with_cli(&mut self, cli: &CliArgs) -> Result<()> {
        if let Some(level) = &cli.log_level {
            self.log_level = LogLevel::from_str(level)?;
        }
        if let Some(threads) = cli.worker_threads {
            self.engine.worker_threads = threads;
        }
        if let Some(attempts) = cli.max_attempts {
            self.engine.max_attempts = attempts;
        }
        if let Some(deadline) = cli.deadline_secs {
            self.engine.overall_deadline_secs = Some(deadline);
        }
        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.engine
            .validate()
            .map_err(|e| CliError::Config(e.to_string()))
    }
}

/// Configuration-relevant command-line flags
#[derive(Debug, Clone, Default)]
pub struct CliArgs {
    /// Config file path
    pub config_file: Option<PathBuf>,
    /// Log level override
    pub log_level: Option<String>,
    /// Worker slot override
    pub worker_threads: Option<usize>,
    /// Attempts-per-shard override
    pub max_attempts: Option<u32>,
    /// Overall deadline override, in seconds
    pub deadline_secs: Option<u64>,
}

/// Build configuration from all sources
///
/// Priority (highest to lowest):
/// 1. CLI arguments
/// 2. Environment variables
/// 3. Config file (`--config`, else `neutryx-mc.toml` if present)
/// 4. Default values
pub fn build_config(cli: &CliArgs) -> Result<CliConfig> {
    build_config_with_env(cli, |name| std::env::var(name).ok())
}

/// [`build_config`] with an explicit environment lookup
pub fn build_config_with_env<F>(cli: &CliArgs, var: F) -> Result<CliConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let file = cli.config_file.clone().or_else(|| {
        let fallback = PathBuf::from(DEFAULT_CONFIG_FILE);
        fallback.is_file().then_some(fallback)
    });

    let mut config = match file {
        Some(path) => CliConfig::from_file(&path)?,
        None => CliConfig::default(),
    };

    config.apply_env(var)?;
    config.merge_with_cli(cli)?;

    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| map.get(name).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = CliConfig::default();
        assert_eq!(config.log_level, LogLevel::Info);
        assert_eq!(config.engine, EngineConfig::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_log_level_parsing() {
        assert_eq!(LogLevel::from_str("trace").unwrap(), LogLevel::Trace);
        assert_eq!(LogLevel::from_str("DEBUG").unwrap(), LogLevel::Debug);
        assert_eq!(LogLevel::from_str("Info").unwrap(), LogLevel::Info);
        assert_eq!(LogLevel::from_str("WARN").unwrap(), LogLevel::Warn);
        assert_eq!(LogLevel::from_str("error").unwrap(), LogLevel::Error);

        assert!(LogLevel::from_str("loud").is_err());
    }

    #[test]
    fn test_log_level_display() {
        assert_eq!(format!("{}", LogLevel::Trace), "trace");
        assert_eq!(format!("{}", LogLevel::Warn), "warn");
    }

    #[test]
    fn test_toml_deserialization() {
        let toml_str = r#"
            log_level = "debug"

            [engine]
            worker_threads = 8
            shard_timeout_floor_secs = 10
            max_attempts = 3
            path_buffer_limit_bytes = 1048576
        "#;

        let config: CliConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.log_level, LogLevel::Debug);
        assert_eq!(config.engine.worker_threads, 8);
        assert_eq!(config.engine.shard_timeout_floor_secs, 10);
        assert_eq!(config.engine.max_attempts, 3);
        assert_eq!(config.engine.path_buffer_limit_bytes, Some(1 << 20));
        // Unspecified fields keep their defaults
        assert_eq!(config.engine.heartbeat_timeout_secs, 60);
    }

    #[test]
    fn test_invalid_log_level_in_toml() {
        let result: std::result::Result<CliConfig, _> = toml::from_str(r#"log_level = "loud""#);
        assert!(result.is_err());
    }

    #[test]
    fn test_env_overrides() {
        let mut config = CliConfig::default();
        config
            .apply_env(env(&[
                (ENV_LOG_LEVEL, "warn"),
                (ENV_WORKER_THREADS, "8"),
                (ENV_MAX_ATTEMPTS, "2"),
                (ENV_THROUGHPUT, "1e6"),
                (ENV_DEADLINE_SECS, "600"),
            ]))
            .unwrap();

        assert_eq!(config.log_level, LogLevel::Warn);
        assert_eq!(config.engine.worker_threads, 8);
        assert_eq!(config.engine.max_attempts, 2);
        assert_eq!(config.engine.throughput_steps_per_sec, 1e6);
        assert_eq!(config.engine.overall_deadline_secs, Some(600));
    }

    #[test]
    fn test_unparsable_env_value() {
        let mut config = CliConfig::default();
        let err = config
            .apply_env(env(&[(ENV_WORKER_THREADS, "many")]))
            .unwrap_err();
        assert!(matches!(
            err,
            CliError::Env {
                name: ENV_WORKER_THREADS,
                ..
            }
        ));
    }

    #[test]
    fn test_cli_args_merge() {
        let mut config = CliConfig::default();
        let cli = CliArgs {
            log_level: Some("trace".to_string()),
            worker_threads: Some(2),
            max_attempts: Some(1),
            deadline_secs: Some(30),
            config_file: None,
        };

        config.merge_with_cli(&cli).unwrap();

        assert_eq!(config.log_level, LogLevel::Trace);
        assert_eq!(config.engine.worker_threads, 2);
        assert_eq!(config.engine.max_attempts, 1);
        assert_eq!(config.engine.overall_deadline_secs, Some(30));
    }

    #[test]
    fn test_cli_beats_env() {
        let cli = CliArgs {
            worker_threads: Some(3),
            ..CliArgs::default()
        };
        let config = build_config_with_env(&cli, env(&[(ENV_WORKER_THREADS, "12")])).unwrap();
        assert_eq!(config.engine.worker_threads, 3);
    }

    #[test]
    fn test_invalid_engine_config_rejected() {
        let cli = CliArgs {
            max_attempts: Some(0),
            ..CliArgs::default()
        };
        let err = build_config_with_env(&cli, env(&[])).unwrap_err();
        assert!(matches!(err, CliError::Config(_)));
    }
}

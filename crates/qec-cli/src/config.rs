//! Configuration for the `qec` binary.
//!
//! Values are resolved with the following precedence (highest first):
//! 1. Environment variables (`QEC_*`, optionally from a `.env` file)
//! 2. The YAML configuration file passed with `--config`
//! 3. Default values

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use qec_hal::BackendConfig;
use qec_mitigation::{DEFAULT_CALIBRATION_SHOTS, SolveMethod};

/// Backends this binary can construct.
const KNOWN_BACKENDS: &[&str] = &["simulator"];

/// Complete CLI configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Backend and shot settings
    #[serde(default)]
    pub execution: ExecutionConfig,

    /// Readout-error mitigation settings
    #[serde(default)]
    pub mitigation: MitigationConfig,

    /// Log output settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Backend and shot settings.
#[derive(Clone, Serialize, Deserialize)]
pub struct ExecutionConfig {
    /// Backend name (only "simulator" is built in)
    #[serde(default = "default_backend")]
    pub backend: String,

    /// Shots per experiment
    #[serde(default = "default_shots")]
    pub shots: u32,

    /// Simulator seed; random when absent
    #[serde(default)]
    pub seed: Option<u64>,

    /// Simulated per-bit readout flip probability
    #[serde(default)]
    pub readout_error: f64,

    /// Largest circuit the backend accepts
    #[serde(default = "default_max_qubits")]
    pub max_qubits: u32,

    /// Opaque session handle handed to the backend (set via QEC_TOKEN)
    #[serde(default, skip_serializing)]
    pub token: Option<String>,
}

impl fmt::Debug for ExecutionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutionConfig")
            .field("backend", &self.backend)
            .field("shots", &self.shots)
            .field("seed", &self.seed)
            .field("readout_error", &self.readout_error)
            .field("max_qubits", &self.max_qubits)
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

/// Readout-error mitigation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MitigationConfig {
    /// Force mitigation on or off; the code's own default applies when unset
    #[serde(default)]
    pub enabled: Option<bool>,

    /// Shots per calibration circuit
    #[serde(default = "default_calibration_shots")]
    pub calibration_shots: u32,

    /// Linear solve: "exact" or "least_squares"
    #[serde(default = "default_method")]
    pub method: String,

    /// Reuse a calibration across experiments in one invocation
    #[serde(default = "default_true")]
    pub cache_calibration: bool,
}

/// Log output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: "trace", "debug", "info", "warn", "error"
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: "console" or "json"
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_backend() -> String {
    "simulator".to_string()
}

fn default_shots() -> u32 {
    qec_codes::DEFAULT_SHOTS
}

fn default_max_qubits() -> u32 {
    qec_adapter_sim::DEFAULT_MAX_QUBITS
}

fn default_calibration_shots() -> u32 {
    DEFAULT_CALIBRATION_SHOTS
}

fn default_method() -> String {
    SolveMethod::default().name().to_string()
}

fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "warn".to_string()
}

fn default_log_format() -> String {
    "console".to_string()
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        ExecutionConfig {
            backend: default_backend(),
            shots: default_shots(),
            seed: None,
            readout_error: 0.0,
            max_qubits: default_max_qubits(),
            token: None,
        }
    }
}

impl Default for MitigationConfig {
    fn default() -> Self {
        MitigationConfig {
            enabled: None,
            calibration_shots: default_calibration_shots(),
            method: default_method(),
            cache_calibration: true,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Config {
    /// Load configuration from a YAML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(format!("{}: {e}", path.display())))?;
        Self::from_yaml(&contents)
    }

    /// Parse configuration from YAML text.
    pub fn from_yaml(contents: &str) -> Result<Self, ConfigError> {
        serde_yaml_ng::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Load the file (if any), apply the environment and validate.
    pub fn load(config_file: Option<&Path>) -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = match config_file {
            Some(path) => Self::from_file(path)?,
            None => Config::default(),
        };

        let config = config.merge_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Override fields with the `QEC_*` variables that `lookup` returns.
    ///
    /// Absent variables leave the field unchanged; present but unparseable
    /// ones are an error.
    pub fn merge_env<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Execution
        if let Some(v) = lookup("QEC_BACKEND") {
            self.execution.backend = v;
        }
        if let Some(v) = lookup("QEC_SHOTS") {
            self.execution.shots = parse_var("QEC_SHOTS", &v)?;
        }
        if let Some(v) = lookup("QEC_SEED") {
            self.execution.seed = Some(parse_var("QEC_SEED", &v)?);
        }
        if let Some(v) = lookup("QEC_READOUT_ERROR") {
            self.execution.readout_error = parse_var("QEC_READOUT_ERROR", &v)?;
        }
        if let Some(v) = lookup("QEC_MAX_QUBITS") {
            self.execution.max_qubits = parse_var("QEC_MAX_QUBITS", &v)?;
        }
        if let Some(v) = lookup("QEC_TOKEN") {
            self.execution.token = Some(v);
        }

        // Mitigation
        if let Some(v) = lookup("QEC_MITIGATE") {
            self.mitigation.enabled = Some(parse_var("QEC_MITIGATE", &v)?);
        }
        if let Some(v) = lookup("QEC_CALIBRATION_SHOTS") {
            self.mitigation.calibration_shots = parse_var("QEC_CALIBRATION_SHOTS", &v)?;
        }
        if let Some(v) = lookup("QEC_MITIGATION_METHOD") {
            self.mitigation.method = v;
        }
        if let Some(v) = lookup("QEC_CACHE_CALIBRATION") {
            self.mitigation.cache_calibration = parse_var("QEC_CACHE_CALIBRATION", &v)?;
        }

        // Logging
        if let Some(v) = lookup("QEC_LOG_LEVEL") {
            self.logging.level = v;
        }
        if let Some(v) = lookup("QEC_LOG_FORMAT") {
            self.logging.format = v;
        }

        Ok(self)
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !KNOWN_BACKENDS.contains(&self.execution.backend.as_str()) {
            return Err(ConfigError::Validation(format!(
                "Unknown backend: {} (available: {})",
                self.execution.backend,
                KNOWN_BACKENDS.join(", ")
            )));
        }

        if self.execution.shots == 0 {
            return Err(ConfigError::Validation(
                "execution.shots must be greater than 0".to_string(),
            ));
        }
        if self.mitigation.calibration_shots == 0 {
            return Err(ConfigError::Validation(
                "mitigation.calibration_shots must be greater than 0".to_string(),
            ));
        }

        // At 0.5 every readout is a coin toss and the calibration is singular.
        if !(0.0..0.5).contains(&self.execution.readout_error) {
            return Err(ConfigError::Validation(format!(
                "execution.readout_error must be in [0, 0.5), got {}",
                self.execution.readout_error
            )));
        }

        if self.execution.max_qubits == 0 {
            return Err(ConfigError::Validation(
                "execution.max_qubits must be greater than 0".to_string(),
            ));
        }

        self.solve_method()?;

        match self.logging.level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            other => {
                return Err(ConfigError::Validation(format!("Invalid log level: {other}")));
            }
        }

        match self.logging.format.as_str() {
            "console" | "json" => {}
            other => {
                return Err(ConfigError::Validation(format!("Invalid log format: {other}")));
            }
        }

        if let Some(ref token) = self.execution.token {
            if token.is_empty() {
                return Err(ConfigError::Validation(
                    "token must not be empty; omit the field instead".to_string(),
                ));
            }
        }

        Ok(())
    }

    /// Copy of this configuration with command-line overrides applied and
    /// validated again.
    pub fn with_overrides(
        &self,
        shots: Option<u32>,
        readout_error: Option<f64>,
        seed: Option<u64>,
    ) -> Result<Self, ConfigError> {
        let mut config = self.clone();
        if let Some(shots) = shots {
            config.execution.shots = shots;
        }
        if let Some(p) = readout_error {
            config.execution.readout_error = p;
        }
        if seed.is_some() {
            config.execution.seed = seed;
        }
        config.validate()?;
        Ok(config)
    }

    /// The configured solve method.
    pub fn solve_method(&self) -> Result<SolveMethod, ConfigError> {
        self.mitigation
            .method
            .parse()
            .map_err(ConfigError::Validation)
    }

    /// Backend configuration for the execution section.
    pub fn backend_config(&self) -> BackendConfig {
        let execution = &self.execution;
        let mut config = BackendConfig::new(execution.backend.clone())
            .with_extra("max_qubits", execution.max_qubits.into())
            .with_extra("readout_error", execution.readout_error.into());
        if let Some(seed) = execution.seed {
            config = config.with_extra("seed", seed.into());
        }
        if let Some(ref token) = execution.token {
            config = config.with_token(token.clone());
        }
        config
    }
}

fn parse_var<T: FromStr>(name: &str, value: &str) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::Parse(format!("{name}: cannot parse '{value}'")))
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::io::Write;

    use super::*;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.execution.backend, "simulator");
        assert_eq!(config.execution.shots, 1000);
        assert_eq!(config.mitigation.calibration_shots, 1000);
        assert_eq!(config.mitigation.method, "least_squares");
        assert!(config.mitigation.cache_calibration);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config = Config::from_yaml(
            "execution:\n  shots: 250\n  readout_error: 0.05\nmitigation:\n  method: exact\n",
        )
        .unwrap();
        assert_eq!(config.execution.shots, 250);
        assert_eq!(config.execution.readout_error, 0.05);
        assert_eq!(config.execution.backend, "simulator");
        assert_eq!(config.solve_method().unwrap(), SolveMethod::Exact);
        assert_eq!(config.logging.level, "warn");
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "execution:\n  seed: 42\nlogging:\n  format: json").unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.execution.seed, Some(42));
        assert_eq!(config.logging.format, "json");
    }

    #[test]
    fn test_missing_file() {
        let err = Config::from_file("/nonexistent/qec.yaml").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn test_env_overrides_file() {
        let config = Config::from_yaml("execution:\n  shots: 250\n  seed: 1\n")
            .unwrap()
            .merge_env(env(&[
                ("QEC_SHOTS", "500"),
                ("QEC_MITIGATE", "false"),
                ("QEC_TOKEN", "abc"),
            ]))
            .unwrap();

        assert_eq!(config.execution.shots, 500);
        assert_eq!(config.execution.seed, Some(1));
        assert_eq!(config.mitigation.enabled, Some(false));
        assert_eq!(config.execution.token.as_deref(), Some("abc"));
    }

    #[test]
    fn test_env_unparseable_value() {
        let err = Config::default()
            .merge_env(env(&[("QEC_SHOTS", "many")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Parse(ref m) if m.contains("QEC_SHOTS")));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let cases: [fn(&mut Config); 7] = [
            |c| c.execution.shots = 0,
            |c| c.execution.readout_error = 0.5,
            |c| c.execution.readout_error = -0.1,
            |c| c.execution.backend = "ibm".to_string(),
            |c| c.mitigation.method = "svd".to_string(),
            |c| c.logging.level = "loud".to_string(),
            |c| c.logging.format = "xml".to_string(),
        ];
        for mutate in cases {
            let mut config = Config::default();
            mutate(&mut config);
            assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
        }
    }

    #[test]
    fn test_overrides_are_validated() {
        let config = Config::default();
        let overridden = config.with_overrides(Some(10), Some(0.1), Some(3)).unwrap();
        assert_eq!(overridden.execution.shots, 10);
        assert_eq!(overridden.execution.seed, Some(3));
        assert_eq!(config.execution.shots, 1000);

        assert!(config.with_overrides(Some(0), None, None).is_err());
        assert!(config.with_overrides(None, Some(0.9), None).is_err());
    }

    #[test]
    fn test_token_is_redacted() {
        let mut config = Config::default();
        config.execution.token = Some("secret-handle".to_string());
        let debug = format!("{config:?}");
        assert!(!debug.contains("secret-handle"));
        assert!(debug.contains("[REDACTED]"));

        let yaml = serde_yaml_ng::to_string(&config).unwrap();
        assert!(!yaml.contains("secret-handle"));
        assert!(!yaml.contains("token"));
    }

    #[test]
    fn test_backend_config_carries_execution_settings() {
        let mut config = Config::default();
        config.execution.seed = Some(9);
        config.execution.readout_error = 0.02;

        let backend = config.backend_config();
        assert_eq!(backend.name, "simulator");
        assert_eq!(backend.extra_u64("seed"), Some(9));
        assert_eq!(backend.extra_f64("readout_error"), Some(0.02));
        assert_eq!(backend.extra_u64("max_qubits"), Some(20));
    }
}

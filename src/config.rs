use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DEFAULT_STACK_CAPACITY: usize = 256;

pub const STACK_CAPACITY_ENV: &str = "STACKVM_STACK_CAPACITY";
pub const TRACE_ENV: &str = "STACKVM_TRACE";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VmConfig {
    /// Number of value slots in the evaluation stack.
    pub stack_capacity: usize,
    /// Log every instruction and the stack before it runs.
    pub trace_execution: bool,
    /// Echo `print` output to stdout as well as collecting it.
    pub echo_output: bool,
}

impl Default for VmConfig {
    fn default() -> VmConfig {
        VmConfig {
            stack_capacity: DEFAULT_STACK_CAPACITY,
            trace_execution: false,
            echo_output: true,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid value {value:?} for {var}")]
    InvalidEnv { var: String, value: String },
    #[error("stack capacity must be at least 1")]
    ZeroCapacity,
}

impl VmConfig {
    pub fn from_json_str(json: &str) -> Result<VmConfig, ConfigError> {
        let config: VmConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<VmConfig, ConfigError> {
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        VmConfig::from_json_str(&json)
    }

    /// Applies `STACKVM_STACK_CAPACITY` and `STACKVM_TRACE` from the process
    /// environment.
    pub fn with_env(self) -> Result<VmConfig, ConfigError> {
        self.with_env_from(|var| std::env::var(var).ok())
    }

    pub fn with_env_from<F>(mut self, lookup: F) -> Result<VmConfig, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup(STACK_CAPACITY_ENV) {
            self.stack_capacity = value
                .trim()
                .parse::<usize>()
                .map_err(|_| ConfigError::InvalidEnv {
                    var: STACK_CAPACITY_ENV.to_string(),
                    value: value.clone(),
                })?;
        }
        if let Some(value) = lookup(TRACE_ENV) {
            self.trace_execution = match value.trim() {
                "1" | "true" | "yes" | "on" => true,
                "0" | "false" | "no" | "off" | "" => false,
                _ => {
                    return Err(ConfigError::InvalidEnv {
                        var: TRACE_ENV.to_string(),
                        value,
                    })
                }
            };
        }
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.stack_capacity == 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        Ok(())
    }
}

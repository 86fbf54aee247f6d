use std::fmt;
use std::str::FromStr;

use crate::domain::backend::cloud_backend::CloudBackend;
use crate::domain::backend::execution_backend_trait::{ConcurrencyPolicy, ExecutionBackend};
use crate::domain::backend::parallel_backend::ParallelBackend;
use crate::domain::backend::serial_backend::SerialBackend;
use crate::domain::config::RunConfig;
use crate::error::{ConversionError, Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RunMode {
    Serial,
    Parallel,
    Cloud,
}

impl RunMode {
    /// Factory method to return the execution backend of this run mode.
    pub fn get_instance(&self, config: &RunConfig) -> Result<Box<dyn ExecutionBackend>> {
        match self {
            RunMode::Serial => Ok(Box::new(SerialBackend::new(config.worker_name.clone()))),
            RunMode::Parallel => Ok(Box::new(ParallelBackend::new())),
            RunMode::Cloud => {
                let cloud = config
                    .cloud
                    .clone()
                    .ok_or_else(|| Error::ConfigurationError("Run mode 'cloud' requires a 'cloud' section.".to_string()))?;
                Ok(Box::new(CloudBackend::new(cloud)?))
            }
        }
    }

    pub fn concurrency(&self) -> ConcurrencyPolicy {
        match self {
            RunMode::Serial => ConcurrencyPolicy::OneAtATime,
            RunMode::Parallel => ConcurrencyPolicy::TopPriorityTier,
            RunMode::Cloud => ConcurrencyPolicy::Unbounded,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RunMode::Serial => "serial",
            RunMode::Parallel => "parallel",
            RunMode::Cloud => "cloud",
        }
    }
}

impl fmt::Display for RunMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for RunMode {
    type Err = ConversionError;

    fn from_str(run_mode: &str) -> std::result::Result<RunMode, Self::Err> {
        match run_mode.to_lowercase().as_str() {
            "serial" => Ok(RunMode::Serial),
            "parallel" => Ok(RunMode::Parallel),
            "cloud" => Ok(RunMode::Cloud),
            _ => Err(ConversionError::UnknownRunMode(run_mode.to_string())),
        }
    }
}

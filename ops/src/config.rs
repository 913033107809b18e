//! Registry configuration: defaults, YAML file, environment overrides.

use std::path::{Path, PathBuf};

use core_types::Target;
use serde::{Deserialize, Serialize};

use crate::types::OpError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory holding the compiled kernel binaries named by `binfile_name`.
    pub kernel_dir: PathBuf,

    /// Backend this process selects kernels for.
    pub target: Target,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            kernel_dir: PathBuf::from("kernel_meta"),
            target: Target::Tbe,
        }
    }
}

impl Config {
    /// Defaults overridden by `OPLIB_KERNEL_DIR` and `OPLIB_TARGET`.
    /// Values that do not parse are ignored.
    pub fn from_env() -> Self {
        Self::default().with_env()
    }

    /// Apply environment overrides on top of `self`
    pub fn with_env(mut self) -> Self {
        if let Ok(s) = std::env::var("OPLIB_KERNEL_DIR") {
            if !s.is_empty() {
                self.kernel_dir = PathBuf::from(s);
            }
        }

        if let Ok(s) = std::env::var("OPLIB_TARGET") {
            match s.parse::<Target>() {
                Ok(t) => self.target = t,
                Err(e) => tracing::warn!(error = %e, "ignoring OPLIB_TARGET"),
            }
        }

        self
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self, OpError> {
        serde_yaml::from_str(yaml).map_err(|e| OpError::Config(e.to_string()))
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, OpError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| OpError::Config(format!("{}: {e}", path.display())))?;
        Self::from_yaml_str(&text)
    }
}

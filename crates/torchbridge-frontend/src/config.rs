//! Frontend configuration: the emulated source-API release and its dtype
//! gate table.

use std::path::Path;

use tracing::warn;

use crate::error::{FrontendError, Result};
use crate::gate::{DtypeGate, TorchVersion};

/// Environment variable naming the emulated torch release.
pub const TORCH_VERSION_ENV: &str = "TORCHBRIDGE_TORCH_VERSION";

/// Environment variable holding a path to a JSON dtype gate table.
pub const DTYPE_GATES_ENV: &str = "TORCHBRIDGE_DTYPE_GATES";

#[derive(Debug, Clone, PartialEq)]
pub struct FrontendConfig {
    pub torch_version: TorchVersion,
    pub gate: DtypeGate,
}

impl Default for FrontendConfig {
    fn default() -> Self {
        Self {
            torch_version: TorchVersion::default(),
            gate: DtypeGate::torch_defaults(),
        }
    }
}

impl FrontendConfig {
    pub fn with_torch_version(mut self, version: TorchVersion) -> Self {
        self.torch_version = version;
        self
    }

    pub fn with_gate(mut self, gate: DtypeGate) -> Self {
        self.gate = gate;
        self
    }

    /// Build from the process environment.
    ///
    /// Malformed values are logged and replaced by the defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup, falling back to defaults on
    /// missing or malformed values.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(raw) = lookup(TORCH_VERSION_ENV).filter(|v| !v.trim().is_empty()) {
            match raw.parse() {
                Ok(version) => config.torch_version = version,
                Err(err) => warn!(
                    value = %raw,
                    error = %err,
                    "ignoring {TORCH_VERSION_ENV}, using {}",
                    config.torch_version
                ),
            }
        }
        if let Some(path) = lookup(DTYPE_GATES_ENV).filter(|v| !v.trim().is_empty()) {
            match load_gate(Path::new(&path)) {
                Ok(gate) => config.gate = gate,
                Err(err) => warn!(
                    path = %path,
                    error = %err,
                    "ignoring {DTYPE_GATES_ENV}, using built-in gate table"
                ),
            }
        }
        config
    }
}

/// Read and parse a JSON gate table from disk.
pub fn load_gate(path: &Path) -> Result<DtypeGate> {
    let json = std::fs::read_to_string(path)
        .map_err(|e| FrontendError::config(format!("cannot read {}: {e}", path.display())))?;
    DtypeGate::from_json(&json)
}

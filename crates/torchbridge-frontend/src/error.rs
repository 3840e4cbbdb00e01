use thiserror::Error;
use torchbridge_core::{CoreError, DType};

use crate::gate::TorchVersion;

/// Errors returned by catalogue entries and the conversion boundary.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FrontendError {
    /// A documented precondition of the source API was violated.
    #[error("{op}: {reason}")]
    Argument { op: &'static str, reason: String },

    /// The configured torch version does not support this dtype for `op`.
    #[error("{op} does not support {dtype} in torch {version}")]
    UnsupportedDtype {
        op: &'static str,
        dtype: DType,
        version: TorchVersion,
    },

    /// The tensor engine rejected the translated call.
    #[error(transparent)]
    Engine(#[from] CoreError),

    /// A value could not cross the conversion boundary.
    #[error("conversion failed: {reason}")]
    Conversion { reason: String },

    /// A gate table or version string could not be parsed.
    #[error("invalid configuration: {reason}")]
    Config { reason: String },
}

impl FrontendError {
    pub fn argument(op: &'static str, reason: impl Into<String>) -> Self {
        Self::Argument {
            op,
            reason: reason.into(),
        }
    }

    pub fn conversion(reason: impl Into<String>) -> Self {
        Self::Conversion {
            reason: reason.into(),
        }
    }

    pub fn config(reason: impl Into<String>) -> Self {
        Self::Config {
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, FrontendError>;

/// Fail with an argument error unless `cond` holds.
pub(crate) fn ensure(cond: bool, op: &'static str, reason: impl FnOnce() -> String) -> Result<()> {
    if cond {
        Ok(())
    } else {
        Err(FrontendError::argument(op, reason()))
    }
}

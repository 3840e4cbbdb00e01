//! `torchbridge-frontend`: PyTorch-style ops on the torchbridge engine.
//!
//! The [`ops`] module is the op translation catalogue: pure functions that
//! check the source API's preconditions and re-express each call with engine
//! primitives. [`Frontend`] wraps the catalogue in an explicit conversion
//! boundary: a [`TensorConverter`] moves tensors in and out, and a
//! [`DtypeGate`] rejects dtypes the configured torch release does not
//! support.
//!
//! ```
//! use torchbridge_core::{Array, DType};
//! use torchbridge_frontend::Frontend;
//!
//! let fe = Frontend::new();
//! let x = Array::ones(vec![2, 3], DType::F32);
//! let y = fe.cumsum(&x, 1, None, None).unwrap();
//! assert_eq!(y.to_f64_vec(), vec![1.0, 2.0, 3.0, 1.0, 2.0, 3.0]);
//! ```

pub mod config;
pub mod convert;
pub mod error;
pub mod frontend;
pub mod gate;
pub mod ops;

pub use config::FrontendConfig;
pub use convert::{ArrayConverter, BufferConverter, HostTensor, TensorConverter};
pub use error::{FrontendError, Result};
pub use frontend::Frontend;
pub use gate::{DtypeGate, TorchVersion, VersionSpec};
pub use ops::{IntOrTuple, Padding, Repeats};

/// Glob-import convenience: `use torchbridge_frontend::prelude::*;`
pub mod prelude {
    pub use crate::config::FrontendConfig;
    pub use crate::convert::{ArrayConverter, BufferConverter, HostTensor, TensorConverter};
    pub use crate::error::FrontendError;
    pub use crate::frontend::Frontend;
    pub use crate::gate::{DtypeGate, TorchVersion, VersionSpec};
    pub use crate::ops::{IntOrTuple, Padding, Repeats};
}

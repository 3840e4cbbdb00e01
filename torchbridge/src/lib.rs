//! # torchbridge
//!
//! Run code written against the PyTorch tensor API on a native Rust tensor
//! engine.
//!
//! One `use torchbridge::prelude::*;` gives you the engine's tensors and
//! dtypes and, with the `frontend` feature, the torch-style op catalogue and
//! its conversion boundary.
//!
//! ## Feature Flags
//!
//! | Feature | Enables |
//! |---------|---------|
//! | `core` *(default)* | Tensor engine: `Tensor<T>`, `Array`, convolution, einsum |
//! | `frontend` *(default)* | Torch op catalogue, `Frontend`, dtype gating |

pub use torchbridge_core as core;

#[cfg(feature = "frontend")]
pub use torchbridge_frontend as frontend;

/// Glob-import convenience: `use torchbridge::prelude::*;`
pub mod prelude {
    pub use torchbridge_core::prelude::*;

    #[cfg(feature = "frontend")]
    pub use torchbridge_frontend::prelude::*;
}

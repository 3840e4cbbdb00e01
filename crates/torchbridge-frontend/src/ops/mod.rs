//! The op translation catalogue.
//!
//! Every entry is a pure function over engine [`Array`]s: it checks the
//! source API's preconditions, translates argument conventions (torch `dim`
//! to engine axes, torch weight layout to engine filter layout, ...) and
//! calls the engine. Entries that accept `out` also write their result there.

pub mod conv;
pub mod indexing;
pub mod misc;
pub mod reduce;
pub mod shape;

use torchbridge_core::Array;

/// Copy `ret` into `out` when given and hand it back.
pub(crate) fn write_out(out: Option<&mut Array>, ret: Array) -> Array {
    if let Some(out) = out {
        *out = ret.clone();
    }
    ret
}

pub use conv::{IntOrTuple, Padding, conv1d, conv2d, conv3d, validate_conv_args};
pub use indexing::{diagonal, tril, tril_indices, triu, triu_indices, vander};
pub use misc::{cross, einsum, lcm};
pub use reduce::{cumprod, cumsum, logcumsumexp, renorm, trace};
pub use shape::{Repeats, cartesian_prod, flatten, flip, fliplr, ravel, repeat_interleave, roll, rot90};

//! `Display` and `Debug` formatting for [`Tensor`].

use core::fmt;

use crate::Element;

use super::Tensor;

impl<T: Element> fmt::Display for Tensor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "tensor([], shape={:?})", self.shape);
        }

        match self.ndim() {
            0 => write!(f, "tensor({})", self.data[0]),
            1 => {
                write!(f, "tensor([")?;
                for (i, v) in self.data.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{v}")?;
                }
                write!(f, "])")
            }
            2 => {
                let rows = self.shape[0];
                let cols = self.shape[1];
                writeln!(f, "tensor([")?;
                for r in 0..rows {
                    write!(f, "  [")?;
                    for c in 0..cols {
                        if c > 0 {
                            write!(f, ", ")?;
                        }
                        write!(f, "{}", self.data[r * cols + c])?;
                    }
                    if r < rows - 1 {
                        writeln!(f, "],")?;
                    } else {
                        writeln!(f, "]")?;
                    }
                }
                write!(f, "])")
            }
            _ => {
                // 3-D and up: shape plus the first and last elements
                let n = self.data.len();
                write!(f, "tensor(shape={:?}, data=[{}", self.shape, self.data[0])?;
                if n > 2 {
                    write!(f, ", ...")?;
                }
                if n > 1 {
                    write!(f, ", {}", self.data[n - 1])?;
                }
                write!(f, "], dtype={})", T::DTYPE)
            }
        }
    }
}

//! The conversion boundary wrapped around every catalogue entry.
//!
//! A [`Frontend`] owns a [`TensorConverter`] and a [`FrontendConfig`]. Each
//! method converts its tensor arguments to engine arrays, consults the dtype
//! gate for the configured torch release, runs the matching entry from
//! [`crate::ops`], and converts the result back. Methods taking `out` also
//! overwrite it with the converted result.

use torchbridge_core::{Array, DType};
use tracing::debug;

use crate::config::FrontendConfig;
use crate::convert::{ArrayConverter, TensorConverter};
use crate::error::Result;
use crate::ops::{self, IntOrTuple, Padding, Repeats};

/// Torch-style entry points behind a conversion boundary.
///
/// `C` decides what a caller-side tensor is; the default [`ArrayConverter`]
/// passes engine arrays straight through.
///
/// ```
/// use torchbridge_core::{Array, DType};
/// use torchbridge_frontend::{Frontend, FrontendConfig, FrontendError, TorchVersion};
/// use torchbridge_frontend::ArrayConverter;
///
/// let config = FrontendConfig::default().with_torch_version(TorchVersion::new(1, 11, 0));
/// let fe = Frontend::with_converter(ArrayConverter, config);
/// let x = Array::ones(vec![2, 2], DType::F16);
/// let err = fe.trace(&x).unwrap_err();
/// assert!(matches!(err, FrontendError::UnsupportedDtype { op: "trace", .. }));
/// ```
#[derive(Debug, Clone, Default)]
pub struct Frontend<C: TensorConverter = ArrayConverter> {
    converter: C,
    config: FrontendConfig,
}

impl Frontend<ArrayConverter> {
    /// An identity boundary over engine arrays with the default config.
    pub fn new() -> Self {
        Self::default()
    }
}

impl<C: TensorConverter> Frontend<C> {
    /// A boundary using `converter` for tensors and `config` for gating.
    pub fn with_converter(converter: C, config: FrontendConfig) -> Self {
        Self { converter, config }
    }

    /// The torch release and dtype gate in effect.
    pub fn config(&self) -> &FrontendConfig {
        &self.config
    }

    pub fn converter(&self) -> &C {
        &self.converter
    }

    /// Convert one tensor argument and check its dtype against the gate.
    fn input(&self, op: &'static str, native: &C::Native) -> Result<Array> {
        let array = self.converter.to_array(native)?;
        let version = self.config.torch_version;
        debug!(op, dtype = %array.dtype(), %version, shape = ?array.shape(), "frontend input");
        self.config.gate.check(op, version, array.dtype())?;
        Ok(array)
    }

    fn inputs(&self, op: &'static str, natives: &[&C::Native]) -> Result<Vec<Array>> {
        natives.iter().map(|n| self.input(op, n)).collect()
    }

    fn output(&self, ret: Array, out: Option<&mut C::Native>) -> Result<C::Native> {
        let native = self.converter.from_array(ret)?;
        if let Some(out) = out {
            *out = native.clone();
        }
        Ok(native)
    }

    // ------------------------------------------------------------------
    // Shape
    // ------------------------------------------------------------------

    /// Reverse the order of elements along `dims`.
    pub fn flip(&self, input: &C::Native, dims: &[isize]) -> Result<C::Native> {
        let x = self.input("flip", input)?;
        self.output(ops::flip(&x, dims)?, None)
    }

    /// Reverse the columns of a tensor with at least two dimensions.
    pub fn fliplr(&self, input: &C::Native) -> Result<C::Native> {
        let x = self.input("fliplr", input)?;
        self.output(ops::fliplr(&x)?, None)
    }

    /// Circularly shift elements; without `dims` the tensor is rolled flat.
    pub fn roll(
        &self,
        input: &C::Native,
        shifts: &[isize],
        dims: Option<&[isize]>,
    ) -> Result<C::Native> {
        let x = self.input("roll", input)?;
        self.output(ops::roll(&x, shifts, dims)?, None)
    }

    /// Merge the axes `start_dim..=end_dim` into one.
    pub fn flatten(&self, input: &C::Native, start_dim: isize, end_dim: isize) -> Result<C::Native> {
        let x = self.input("flatten", input)?;
        self.output(ops::flatten(&x, start_dim, end_dim)?, None)
    }

    pub fn ravel(&self, input: &C::Native) -> Result<C::Native> {
        let x = self.input("ravel", input)?;
        self.output(ops::ravel(&x)?, None)
    }

    /// Rotate by `k` quarter turns in the plane of `dims`, from the first
    /// axis towards the second.
    ///
    /// ```
    /// use torchbridge_core::{Array, tensor::Tensor};
    /// use torchbridge_frontend::Frontend;
    ///
    /// let fe = Frontend::new();
    /// let x = Array::from(Tensor::from_vec(vec![1_i32, 2, 3, 4], vec![2, 2]).unwrap());
    /// let r = fe.rot90(&x, 1, &[0, 1]).unwrap();
    /// assert_eq!(r.to_f64_vec(), vec![2.0, 4.0, 1.0, 3.0]);
    /// assert_eq!(fe.rot90(&x, 5, &[0, 1]).unwrap(), r);
    /// assert!(fe.rot90(&x, 1, &[0, 2]).is_err());
    /// ```
    pub fn rot90(&self, input: &C::Native, k: i64, dims: &[isize]) -> Result<C::Native> {
        let x = self.input("rot90", input)?;
        self.output(ops::rot90(&x, k, dims)?, None)
    }

    /// Repeat each element along `dim`, or over the flattened tensor.
    pub fn repeat_interleave(
        &self,
        input: &C::Native,
        repeats: impl Into<Repeats>,
        dim: Option<isize>,
        output_size: Option<usize>,
    ) -> Result<C::Native> {
        let x = self.input("repeat_interleave", input)?;
        self.output(ops::repeat_interleave(&x, repeats, dim, output_size)?, None)
    }

    /// Cartesian product of 1-D tensors as rows of a 2-D tensor.
    pub fn cartesian_prod(&self, tensors: &[&C::Native]) -> Result<C::Native> {
        let xs = self.inputs("cartesian_prod", tensors)?;
        let refs: Vec<&Array> = xs.iter().collect();
        self.output(ops::cartesian_prod(&refs)?, None)
    }

    // ------------------------------------------------------------------
    // Scans and reductions
    // ------------------------------------------------------------------

    /// Running sum along `dim`. Integer and bool inputs accumulate in int64.
    pub fn cumsum(
        &self,
        input: &C::Native,
        dim: isize,
        dtype: Option<DType>,
        out: Option<&mut C::Native>,
    ) -> Result<C::Native> {
        let x = self.input("cumsum", input)?;
        self.output(ops::cumsum(&x, dim, dtype, None)?, out)
    }

    /// Running product along `dim`.
    pub fn cumprod(
        &self,
        input: &C::Native,
        dim: isize,
        dtype: Option<DType>,
        out: Option<&mut C::Native>,
    ) -> Result<C::Native> {
        let x = self.input("cumprod", input)?;
        self.output(ops::cumprod(&x, dim, dtype, None)?, out)
    }

    /// `log(cumsum(exp(x)))` along `dim`, computed stably in double precision.
    pub fn logcumsumexp(
        &self,
        input: &C::Native,
        dim: isize,
        out: Option<&mut C::Native>,
    ) -> Result<C::Native> {
        let x = self.input("logcumsumexp", input)?;
        self.output(ops::logcumsumexp(&x, dim, None)?, out)
    }

    /// Sum of the main diagonal of a 2-D tensor.
    pub fn trace(&self, input: &C::Native) -> Result<C::Native> {
        let x = self.input("trace", input)?;
        self.output(ops::trace(&x)?, None)
    }

    /// Scale slices along `dim` whose `p`-norm exceeds `maxnorm` down to it.
    pub fn renorm(
        &self,
        input: &C::Native,
        p: f64,
        dim: isize,
        maxnorm: f64,
        out: Option<&mut C::Native>,
    ) -> Result<C::Native> {
        let x = self.input("renorm", input)?;
        self.output(ops::renorm(&x, p, dim, maxnorm, None)?, out)
    }

    // ------------------------------------------------------------------
    // Diagonals and triangles
    // ------------------------------------------------------------------

    pub fn diagonal(
        &self,
        input: &C::Native,
        offset: isize,
        dim1: isize,
        dim2: isize,
    ) -> Result<C::Native> {
        let x = self.input("diagonal", input)?;
        self.output(ops::diagonal(&x, offset, dim1, dim2)?, None)
    }

    /// Zero the elements above the `diagonal`-th diagonal.
    pub fn tril(
        &self,
        input: &C::Native,
        diagonal: isize,
        out: Option<&mut C::Native>,
    ) -> Result<C::Native> {
        let x = self.input("tril", input)?;
        self.output(ops::tril(&x, diagonal, None)?, out)
    }

    /// Zero the elements below the `diagonal`-th diagonal.
    pub fn triu(
        &self,
        input: &C::Native,
        diagonal: isize,
        out: Option<&mut C::Native>,
    ) -> Result<C::Native> {
        let x = self.input("triu", input)?;
        self.output(ops::triu(&x, diagonal, None)?, out)
    }

    /// Coordinates of the lower triangle of a `row x col` matrix, as a `(2, N)` tensor.
    pub fn tril_indices(
        &self,
        row: usize,
        col: usize,
        offset: isize,
        dtype: Option<DType>,
    ) -> Result<C::Native> {
        self.gate_dtype("tril_indices", dtype)?;
        self.output(ops::tril_indices(row, col, offset, dtype)?, None)
    }

    /// Coordinates of the upper triangle of a `row x col` matrix, as a `(2, N)` tensor.
    pub fn triu_indices(
        &self,
        row: usize,
        col: usize,
        offset: isize,
        dtype: Option<DType>,
    ) -> Result<C::Native> {
        self.gate_dtype("triu_indices", dtype)?;
        self.output(ops::triu_indices(row, col, offset, dtype)?, None)
    }

    /// Gate a requested result dtype for entries without tensor arguments.
    fn gate_dtype(&self, op: &'static str, dtype: Option<DType>) -> Result<()> {
        let dtype = dtype.unwrap_or(DType::I64);
        let version = self.config.torch_version;
        debug!(op, %dtype, %version, "frontend dtype");
        self.config.gate.check(op, version, dtype)
    }

    /// Vandermonde matrix of the 1-D tensor `x` with `n` columns.
    pub fn vander(&self, x: &C::Native, n: Option<usize>, increasing: bool) -> Result<C::Native> {
        let x = self.input("vander", x)?;
        self.output(ops::vander(&x, n, increasing)?, None)
    }

    // ------------------------------------------------------------------
    // Element-wise and linear algebra
    // ------------------------------------------------------------------

    /// Element-wise least common multiple of integer tensors.
    pub fn lcm(
        &self,
        input: &C::Native,
        other: &C::Native,
        out: Option<&mut C::Native>,
    ) -> Result<C::Native> {
        let x = self.input("lcm", input)?;
        let y = self.input("lcm", other)?;
        self.output(ops::lcm(&x, &y, None)?, out)
    }

    /// Einstein summation over `operands`.
    pub fn einsum(&self, equation: &str, operands: &[&C::Native]) -> Result<C::Native> {
        let xs = self.inputs("einsum", operands)?;
        let refs: Vec<&Array> = xs.iter().collect();
        self.output(ops::einsum(equation, &refs)?, None)
    }

    /// Cross product along `dim`, or the last axis when `dim` is `None`.
    pub fn cross(
        &self,
        input: &C::Native,
        other: &C::Native,
        dim: Option<isize>,
        out: Option<&mut C::Native>,
    ) -> Result<C::Native> {
        let x = self.input("cross", input)?;
        let y = self.input("cross", other)?;
        self.output(ops::cross(&x, &y, dim, None)?, out)
    }

    // ------------------------------------------------------------------
    // Convolution
    // ------------------------------------------------------------------

    fn conv_operands(
        &self,
        op: &'static str,
        input: &C::Native,
        weight: &C::Native,
        bias: Option<&C::Native>,
    ) -> Result<(Array, Array, Option<Array>)> {
        let x = self.input(op, input)?;
        let w = self.input(op, weight)?;
        let b = bias.map(|b| self.input(op, b)).transpose()?;
        Ok((x, w, b))
    }

    /// 1-D convolution of `(N, C, L)` input with `(O, C / groups, K)` weights.
    #[allow(clippy::too_many_arguments)]
    pub fn conv1d(
        &self,
        input: &C::Native,
        weight: &C::Native,
        bias: Option<&C::Native>,
        stride: impl Into<IntOrTuple>,
        padding: impl Into<Padding>,
        dilation: impl Into<IntOrTuple>,
        groups: usize,
    ) -> Result<C::Native> {
        let (x, w, b) = self.conv_operands("conv1d", input, weight, bias)?;
        let ret = ops::conv1d(&x, &w, b.as_ref(), stride, padding, dilation, groups)?;
        self.output(ret, None)
    }

    /// 2-D convolution; `padding` may be `"same"`, `"valid"`, or explicit sizes.
    #[allow(clippy::too_many_arguments)]
    pub fn conv2d(
        &self,
        input: &C::Native,
        weight: &C::Native,
        bias: Option<&C::Native>,
        stride: impl Into<IntOrTuple>,
        padding: impl Into<Padding>,
        dilation: impl Into<IntOrTuple>,
        groups: usize,
    ) -> Result<C::Native> {
        let (x, w, b) = self.conv_operands("conv2d", input, weight, bias)?;
        let ret = ops::conv2d(&x, &w, b.as_ref(), stride, padding, dilation, groups)?;
        self.output(ret, None)
    }

    /// 3-D convolution of `(N, C, D, H, W)` input.
    #[allow(clippy::too_many_arguments)]
    pub fn conv3d(
        &self,
        input: &C::Native,
        weight: &C::Native,
        bias: Option<&C::Native>,
        stride: impl Into<IntOrTuple>,
        padding: impl Into<Padding>,
        dilation: impl Into<IntOrTuple>,
        groups: usize,
    ) -> Result<C::Native> {
        let (x, w, b) = self.conv_operands("conv3d", input, weight, bias)?;
        let ret = ops::conv3d(&x, &w, b.as_ref(), stride, padding, dilation, groups)?;
        self.output(ret, None)
    }
}

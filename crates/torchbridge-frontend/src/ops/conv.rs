//! The convolution family and its shared argument validator.
//!
//! Inputs follow torch's channel-first layout `(batch, channels, *spatial)`
//! and weights are `(out_channels, in_channels / groups, *spatial)`. Each
//! entry validates the channel bookkeeping, materialises explicit padding,
//! permutes the weight into the engine's `(*spatial, in / groups, out)`
//! filter layout, and adds the bias along the channel axis.

use torchbridge_core::conv::{ConvParams, DataFormat, PaddingMode};
use torchbridge_core::{Array, CoreError};

use crate::error::{Result, ensure};

/// A hyper-parameter given either once for every spatial axis or per axis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntOrTuple {
    Int(usize),
    Tuple(Vec<usize>),
}

impl IntOrTuple {
    fn to_vec(&self) -> Vec<usize> {
        match self {
            Self::Int(v) => vec![*v],
            Self::Tuple(v) => v.clone(),
        }
    }
}

impl Default for IntOrTuple {
    fn default() -> Self {
        Self::Int(1)
    }
}

impl From<usize> for IntOrTuple {
    fn from(v: usize) -> Self {
        Self::Int(v)
    }
}

impl From<Vec<usize>> for IntOrTuple {
    fn from(v: Vec<usize>) -> Self {
        Self::Tuple(v)
    }
}

impl<const N: usize> From<[usize; N]> for IntOrTuple {
    fn from(v: [usize; N]) -> Self {
        Self::Tuple(v.to_vec())
    }
}

/// Convolution padding as torch accepts it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Padding {
    /// Symmetric zero padding of every spatial axis.
    Int(usize),
    /// Symmetric zero padding, one amount per spatial axis.
    PerAxis(Vec<usize>),
    /// A symbolic mode, `"valid"` or `"same"`, in any case.
    Mode(String),
}

impl Padding {
    fn is_same(&self) -> bool {
        matches!(self, Self::Mode(m) if m.eq_ignore_ascii_case("same"))
    }
}

impl Default for Padding {
    fn default() -> Self {
        Self::Int(0)
    }
}

impl From<usize> for Padding {
    fn from(v: usize) -> Self {
        Self::Int(v)
    }
}

impl From<Vec<usize>> for Padding {
    fn from(v: Vec<usize>) -> Self {
        Self::PerAxis(v)
    }
}

impl<const N: usize> From<[usize; N]> for Padding {
    fn from(v: [usize; N]) -> Self {
        Self::PerAxis(v.to_vec())
    }
}

impl From<&str> for Padding {
    fn from(mode: &str) -> Self {
        Self::Mode(mode.to_string())
    }
}

/// Check the channel, group, bias and padding bookkeeping of a (possibly
/// transposed) convolution call.
///
/// Fails with [`FrontendError::Argument`](crate::error::FrontendError::Argument)
/// on the first violated rule.
#[allow(clippy::too_many_arguments)]
pub fn validate_conv_args(
    op: &'static str,
    input: &Array,
    weight: &Array,
    bias: Option<&Array>,
    stride: &IntOrTuple,
    padding: &Padding,
    groups: usize,
    transpose: bool,
) -> Result<()> {
    ensure(groups > 0, op, || "groups must be a positive integer".into())?;
    ensure(input.ndim() >= 2, op, || {
        format!("input needs batch and channel axes, got {}-D", input.ndim())
    })?;
    ensure(weight.ndim() >= 2, op, || {
        format!("weight needs output and input channel axes, got {}-D", weight.ndim())
    })?;

    let in_channels = input.shape()[1];
    let out_channels = if transpose {
        weight.shape()[1] * groups
    } else {
        weight.shape()[0]
    };
    ensure(in_channels % groups == 0, op, || {
        "in_channels must be divisible by groups".into()
    })?;
    ensure(out_channels % groups == 0, op, || {
        "out_channels must be divisible by groups".into()
    })?;
    if let Some(bias) = bias {
        ensure(bias.shape().first() == Some(&out_channels), op, || {
            "bias must be same shape as out_channels".into()
        })?;
    }
    if padding.is_same() {
        ensure(stride.to_vec().iter().all(|&s| s == 1), op, || {
            "padding cannot be 'same' for stride > 1".into()
        })?;
    }
    if transpose {
        ensure(weight.shape()[0] == in_channels, op, || {
            "in_channels must be consistent between input and weight".into()
        })?;
    } else {
        ensure(weight.shape()[1] * groups == in_channels, op, || {
            "in_channels must be consistent between input and weight".into()
        })?;
    }
    Ok(())
}

/// Zero-pad both ends of every spatial axis of a channel-first input.
fn pad_spatial(input: &Array, amounts: &[usize]) -> Result<Array> {
    let mut pad_width = vec![(0, 0), (0, 0)];
    pad_width.extend(amounts.iter().map(|&p| (p, p)));
    Ok(input.zero_pad(&pad_width)?)
}

#[allow(clippy::too_many_arguments)]
fn conv_nd(
    op: &'static str,
    spatial: usize,
    input: &Array,
    weight: &Array,
    bias: Option<&Array>,
    stride: IntOrTuple,
    padding: Padding,
    dilation: IntOrTuple,
    groups: usize,
) -> Result<Array> {
    validate_conv_args(op, input, weight, bias, &stride, &padding, groups, false)?;
    let rank = spatial + 2;
    for t in [input, weight] {
        if t.ndim() != rank {
            return Err(CoreError::DimensionMismatch {
                expected: vec![rank],
                got: vec![t.ndim()],
            }
            .into());
        }
    }

    let (source, mode) = match &padding {
        Padding::Mode(m) => (input.clone(), m.to_uppercase().parse::<PaddingMode>()?),
        Padding::Int(p) => (pad_spatial(input, &vec![*p; spatial])?, PaddingMode::Valid),
        Padding::PerAxis(v) => {
            ensure(v.len() == spatial, op, || {
                format!("expected {spatial} padding values, got {}", v.len())
            })?;
            (pad_spatial(input, v)?, PaddingMode::Valid)
        }
    };

    let mut axes: Vec<usize> = (2..rank).collect();
    axes.extend([1, 0]);
    let filters = weight.permute(&axes)?;

    let params = ConvParams::default()
        .with_strides(stride.to_vec())
        .with_dilations(dilation.to_vec())
        .with_padding(mode)
        .with_groups(groups)
        .with_data_format(DataFormat::ChannelFirst);
    let ret = source.conv_general(&filters, &params)?;

    match bias {
        Some(bias) => {
            let mut singleton = vec![0];
            singleton.extend(2..rank);
            Ok(ret.add(&bias.expand_dims(&singleton)?)?)
        }
        None => Ok(ret),
    }
}

/// 1-D cross-correlation over `(batch, channels, length)` inputs.
pub fn conv1d(
    input: &Array,
    weight: &Array,
    bias: Option<&Array>,
    stride: impl Into<IntOrTuple>,
    padding: impl Into<Padding>,
    dilation: impl Into<IntOrTuple>,
    groups: usize,
) -> Result<Array> {
    conv_nd(
        "conv1d",
        1,
        input,
        weight,
        bias,
        stride.into(),
        padding.into(),
        dilation.into(),
        groups,
    )
}

/// 2-D cross-correlation over `(batch, channels, height, width)` inputs.
///
/// ```
/// # use torchbridge_core::{Array, tensor::Tensor};
/// # use torchbridge_frontend::ops::conv2d;
/// let x = Array::from(Tensor::<f32>::ones(vec![1, 1, 4, 4]));
/// let w = Array::from(Tensor::<f32>::ones(vec![1, 1, 3, 3]));
/// let y = conv2d(&x, &w, None, 1, 0, 1, 1).unwrap();
/// assert_eq!(y.shape(), &[1, 1, 2, 2]);
/// assert_eq!(y.to_f64_vec(), vec![9.0; 4]);
/// ```
pub fn conv2d(
    input: &Array,
    weight: &Array,
    bias: Option<&Array>,
    stride: impl Into<IntOrTuple>,
    padding: impl Into<Padding>,
    dilation: impl Into<IntOrTuple>,
    groups: usize,
) -> Result<Array> {
    conv_nd(
        "conv2d",
        2,
        input,
        weight,
        bias,
        stride.into(),
        padding.into(),
        dilation.into(),
        groups,
    )
}

/// 3-D cross-correlation over `(batch, channels, depth, height, width)`
/// inputs.
pub fn conv3d(
    input: &Array,
    weight: &Array,
    bias: Option<&Array>,
    stride: impl Into<IntOrTuple>,
    padding: impl Into<Padding>,
    dilation: impl Into<IntOrTuple>,
    groups: usize,
) -> Result<Array> {
    conv_nd(
        "conv3d",
        3,
        input,
        weight,
        bias,
        stride.into(),
        padding.into(),
        dilation.into(),
        groups,
    )
}

impl From<PaddingMode> for Padding {
    fn from(mode: PaddingMode) -> Self {
        match mode {
            PaddingMode::Valid => Self::Mode("valid".into()),
            PaddingMode::Same => Self::Mode("same".into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use torchbridge_core::tensor::Tensor;
    use torchbridge_core::DType;

    use super::*;
    use crate::error::FrontendError;

    fn array(data: Vec<f64>, shape: Vec<usize>) -> Array {
        Array::from(Tensor::from_vec(data, shape).unwrap())
    }

    fn signal() -> Array {
        array(vec![1.0, 2.0, 3.0, 4.0], vec![1, 1, 4])
    }

    fn is_argument(r: Result<impl Sized>) -> bool {
        matches!(r, Err(FrontendError::Argument { .. }))
    }

    #[test]
    fn test_conv1d_valid() {
        let w = array(vec![1.0, 1.0], vec![1, 1, 2]);
        let y = conv1d(&signal(), &w, None, 1, 0, 1, 1).unwrap();
        assert_eq!(y.shape(), &[1, 1, 3]);
        assert_eq!(y.to_f64_vec(), vec![3.0, 5.0, 7.0]);
    }

    #[test]
    fn test_conv1d_padding_stride_dilation() {
        let w = array(vec![1.0, 1.0, 1.0], vec![1, 1, 3]);
        let y = conv1d(&signal(), &w, None, 1, 1, 1, 1).unwrap();
        assert_eq!(y.to_f64_vec(), vec![3.0, 6.0, 9.0, 7.0]);

        let x = array(vec![1.0, 2.0, 3.0, 4.0, 5.0], vec![1, 1, 5]);
        let pair = array(vec![1.0, 1.0], vec![1, 1, 2]);
        let y = conv1d(&x, &pair, None, 2, 0, 1, 1).unwrap();
        assert_eq!(y.to_f64_vec(), vec![3.0, 7.0]);
        let y = conv1d(&x, &pair, None, 1, 0, 2, 1).unwrap();
        assert_eq!(y.to_f64_vec(), vec![4.0, 6.0, 8.0]);
    }

    #[test]
    fn test_conv1d_same_mode() {
        let w = array(vec![1.0, 1.0, 1.0], vec![1, 1, 3]);
        let y = conv1d(&signal(), &w, None, 1, "same", 1, 1).unwrap();
        assert_eq!(y.to_f64_vec(), vec![3.0, 6.0, 9.0, 7.0]);
        let y = conv1d(&signal(), &w, None, 1, PaddingMode::Same, 1, 1).unwrap();
        assert_eq!(y.shape(), &[1, 1, 4]);
        let y = conv1d(&signal(), &w, None, 1, "valid", 1, 1).unwrap();
        assert_eq!(y.shape(), &[1, 1, 2]);
        assert!(is_argument(conv1d(&signal(), &w, None, 2, "same", 1, 1)));
        assert!(matches!(
            conv1d(&signal(), &w, None, 1, "full", 1, 1),
            Err(FrontendError::Engine(_))
        ));
    }

    #[test]
    fn test_conv1d_bias_and_groups() {
        let x = array(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], vec![1, 2, 3]);
        let w = array(vec![1.0, 2.0], vec![2, 1, 1]);
        let b = array(vec![10.0, 20.0], vec![2]);
        let y = conv1d(&x, &w, Some(&b), 1, 0, 1, 2).unwrap();
        assert_eq!(y.shape(), &[1, 2, 3]);
        assert_eq!(y.to_f64_vec(), vec![11.0, 12.0, 13.0, 28.0, 30.0, 32.0]);
    }

    #[test]
    fn test_conv2d_output_size() {
        let x = Array::zeros(vec![2, 3, 5, 6], DType::F32);
        let w = Array::zeros(vec![4, 3, 2, 3], DType::F32);
        let y = conv2d(&x, &w, None, 1, 0, 1, 1).unwrap();
        assert_eq!(y.shape(), &[2, 4, 4, 4]);
        let y = conv2d(&x, &w, None, [1, 2], [1, 0], 1, 1).unwrap();
        assert_eq!(y.shape(), &[2, 4, 6, 2]);
        assert!(is_argument(conv2d(&x, &w, None, 1, vec![1, 1, 1], 1, 1)));
    }

    #[test]
    fn test_conv3d_box_filter() {
        let x = Array::ones(vec![1, 1, 3, 3, 3], DType::F64);
        let w = Array::ones(vec![1, 1, 2, 2, 2], DType::F64);
        let y = conv3d(&x, &w, None, 1, 0, 1, 1).unwrap();
        assert_eq!(y.shape(), &[1, 1, 2, 2, 2]);
        assert_eq!(y.to_f64_vec(), vec![8.0; 8]);
    }

    #[test]
    fn test_rank_mismatch_is_engine_error() {
        let w = array(vec![1.0; 4], vec![1, 1, 2, 2]);
        assert!(matches!(
            conv2d(&signal(), &w, None, 1, 0, 1, 1),
            Err(FrontendError::Engine(CoreError::DimensionMismatch { .. }))
        ));
    }

    #[test]
    fn test_validator_channel_rules() {
        let x = Array::zeros(vec![1, 3, 4], DType::F32);
        let w = Array::zeros(vec![2, 3, 1], DType::F32);
        let stride = IntOrTuple::default();
        let pad = Padding::default();
        assert!(validate_conv_args("conv1d", &x, &w, None, &stride, &pad, 1, false).is_ok());
        // 3 input channels cannot be split into 2 groups.
        let err = validate_conv_args("conv1d", &x, &w, None, &stride, &pad, 2, false).unwrap_err();
        assert_eq!(err.to_string(), "conv1d: in_channels must be divisible by groups");
        assert!(is_argument(validate_conv_args(
            "conv1d", &x, &w, None, &stride, &pad, 0, false
        )));
        let w3 = Array::zeros(vec![3, 3, 1], DType::F32);
        let x6 = Array::zeros(vec![1, 6, 4], DType::F32);
        let err =
            validate_conv_args("conv1d", &x6, &w3, None, &stride, &pad, 2, false).unwrap_err();
        assert_eq!(err.to_string(), "conv1d: out_channels must be divisible by groups");
        let w_bad = Array::zeros(vec![2, 2, 1], DType::F32);
        let err =
            validate_conv_args("conv1d", &x, &w_bad, None, &stride, &pad, 1, false).unwrap_err();
        assert_eq!(
            err.to_string(),
            "conv1d: in_channels must be consistent between input and weight"
        );
    }

    #[test]
    fn test_validator_bias_and_rank() {
        let x = Array::zeros(vec![1, 3, 4], DType::F32);
        let w = Array::zeros(vec![2, 3, 1], DType::F32);
        let bias = Array::zeros(vec![3], DType::F32);
        let stride = IntOrTuple::from(vec![1, 1]);
        let err = validate_conv_args("conv1d", &x, &w, Some(&bias), &stride, &Padding::Int(0), 1, false)
            .unwrap_err();
        assert_eq!(err.to_string(), "conv1d: bias must be same shape as out_channels");
        let scalar_bias = Array::scalar(1.0, DType::F32);
        assert!(is_argument(validate_conv_args(
            "conv1d", &x, &w, Some(&scalar_bias), &stride, &Padding::Int(0), 1, false
        )));
        let flat = Array::zeros(vec![4], DType::F32);
        assert!(is_argument(validate_conv_args(
            "conv1d", &flat, &w, None, &stride, &Padding::Int(0), 1, false
        )));
    }

    #[test]
    fn test_validator_same_padding_checks_every_stride() {
        let x = Array::zeros(vec![1, 1, 4, 4], DType::F32);
        let w = Array::zeros(vec![1, 1, 3, 3], DType::F32);
        let same = Padding::from("SAME");
        let ok = IntOrTuple::from([1, 1]);
        let bad = IntOrTuple::from([1, 2]);
        assert!(validate_conv_args("conv2d", &x, &w, None, &ok, &same, 1, false).is_ok());
        let err = validate_conv_args("conv2d", &x, &w, None, &bad, &same, 1, false).unwrap_err();
        assert_eq!(err.to_string(), "conv2d: padding cannot be 'same' for stride > 1");
    }

    #[test]
    fn test_validator_transposed_layout() {
        // Transposed weights are (in, out / groups, *spatial).
        let x = Array::zeros(vec![1, 4, 5], DType::F32);
        let w = Array::zeros(vec![4, 3, 2], DType::F32);
        let stride = IntOrTuple::default();
        let pad = Padding::default();
        assert!(validate_conv_args("conv_transpose1d", &x, &w, None, &stride, &pad, 2, true).is_ok());
        let bias = Array::zeros(vec![6], DType::F32);
        assert!(
            validate_conv_args("conv_transpose1d", &x, &w, Some(&bias), &stride, &pad, 2, true)
                .is_ok()
        );
        let w_bad = Array::zeros(vec![2, 3, 2], DType::F32);
        assert!(is_argument(validate_conv_args(
            "conv_transpose1d", &x, &w_bad, None, &stride, &pad, 2, true
        )));
    }
}

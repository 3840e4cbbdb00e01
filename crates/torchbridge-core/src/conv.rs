//! N-dimensional grouped convolution.
//!
//! [`conv_general`] is the engine's single convolution primitive. Filters are
//! laid out as `(*spatial, in_channels / groups, out_channels)`; the input is
//! channel-first `(batch, channels, *spatial)` or channel-last
//! `(batch, *spatial, channels)` depending on [`DataFormat`].

use core::str::FromStr;

#[cfg(feature = "rayon")]
use rayon::prelude::*;
use tracing::trace;

use crate::array::{Array, for_numeric_dtype};
use crate::error::{CoreError, Result};
use crate::Scalar;
use crate::tensor::{Tensor, advance};

/// How the engine pads the spatial axes before convolving.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PaddingMode {
    /// No padding; the kernel only visits fully covered positions.
    #[default]
    Valid,
    /// Pad so that `out = ceil(in / stride)`, extra padding going after.
    Same,
}

impl FromStr for PaddingMode {
    type Err = CoreError;

    /// Parses the upper-case mode names `"VALID"` and `"SAME"`.
    fn from_str(s: &str) -> Result<Self> {
        match s {
            "VALID" => Ok(Self::Valid),
            "SAME" => Ok(Self::Same),
            other => Err(CoreError::invalid_argument(format!(
                "unknown padding mode '{other}', expected VALID or SAME"
            ))),
        }
    }
}

/// Position of the channel axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DataFormat {
    /// `(batch, channels, *spatial)`
    #[default]
    ChannelFirst,
    /// `(batch, *spatial, channels)`
    ChannelLast,
}

/// Convolution hyper-parameters.
///
/// `strides` and `dilations` hold either one value shared by every spatial
/// axis or one value per spatial axis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvParams {
    pub strides: Vec<usize>,
    pub dilations: Vec<usize>,
    pub padding: PaddingMode,
    pub groups: usize,
    pub data_format: DataFormat,
}

impl Default for ConvParams {
    fn default() -> Self {
        Self {
            strides: vec![1],
            dilations: vec![1],
            padding: PaddingMode::Valid,
            groups: 1,
            data_format: DataFormat::ChannelFirst,
        }
    }
}

impl ConvParams {
    pub fn with_strides(mut self, strides: Vec<usize>) -> Self {
        self.strides = strides;
        self
    }

    pub fn with_dilations(mut self, dilations: Vec<usize>) -> Self {
        self.dilations = dilations;
        self
    }

    pub fn with_padding(mut self, padding: PaddingMode) -> Self {
        self.padding = padding;
        self
    }

    pub fn with_groups(mut self, groups: usize) -> Self {
        self.groups = groups;
        self
    }

    pub fn with_data_format(mut self, data_format: DataFormat) -> Self {
        self.data_format = data_format;
        self
    }
}

/// Expand a scalar-or-per-axis parameter to one value per spatial axis.
fn per_axis(values: &[usize], spatial: usize, name: &str) -> Result<Vec<usize>> {
    let expanded = match values.len() {
        1 => vec![values[0]; spatial],
        n if n == spatial => values.to_vec(),
        n => {
            return Err(CoreError::invalid_argument(format!(
                "{name} has {n} entries for {spatial} spatial dimensions"
            )));
        }
    };
    if expanded.contains(&0) {
        return Err(CoreError::invalid_argument(format!("{name} must be positive")));
    }
    Ok(expanded)
}

/// Convolve `input` with `filters`.
///
/// ```
/// # use torchbridge_core::tensor::Tensor;
/// # use torchbridge_core::conv::{conv_general, ConvParams};
/// // One 1-D signal, one channel; kernel [1, 1] sums neighbours.
/// let x = Tensor::from_vec(vec![1.0, 2.0, 3.0, 4.0], vec![1, 1, 4]).unwrap();
/// let k = Tensor::from_vec(vec![1.0, 1.0], vec![2, 1, 1]).unwrap();
/// let y = conv_general(&x, &k, &ConvParams::default()).unwrap();
/// assert_eq!(y.shape(), &[1, 1, 3]);
/// assert_eq!(y.as_slice(), &[3.0, 5.0, 7.0]);
/// ```
pub fn conv_general<T: Scalar>(
    input: &Tensor<T>,
    filters: &Tensor<T>,
    params: &ConvParams,
) -> Result<Tensor<T>> {
    let ndim = input.ndim();
    if ndim < 3 {
        return Err(CoreError::invalid_argument(format!(
            "convolution input needs batch, channel and spatial axes, got {ndim}-D"
        )));
    }
    if filters.ndim() != ndim {
        return Err(CoreError::DimensionMismatch {
            expected: vec![ndim],
            got: vec![filters.ndim()],
        });
    }
    if params.data_format == DataFormat::ChannelLast {
        let mut to_first: Vec<usize> = vec![0, ndim - 1];
        to_first.extend(1..ndim - 1);
        let mut to_last: Vec<usize> = vec![0];
        to_last.extend(2..ndim);
        to_last.push(1);
        let inner = ConvParams {
            data_format: DataFormat::ChannelFirst,
            ..params.clone()
        };
        let out = conv_general(&input.permute(&to_first)?, filters, &inner)?;
        return out.permute(&to_last);
    }

    let spatial = ndim - 2;
    let (batch, c_in) = (input.shape()[0], input.shape()[1]);
    let kernel = &filters.shape()[..spatial];
    let c_in_group = filters.shape()[spatial];
    let c_out = filters.shape()[spatial + 1];
    let groups = params.groups;

    if groups == 0 {
        return Err(CoreError::invalid_argument("groups must be positive"));
    }
    if c_in_group * groups != c_in {
        return Err(CoreError::invalid_argument(format!(
            "filters expect {} input channels ({c_in_group} x {groups} groups), input has {c_in}",
            c_in_group * groups
        )));
    }
    if c_out % groups != 0 {
        return Err(CoreError::invalid_argument(format!(
            "{c_out} output channels are not divisible by {groups} groups"
        )));
    }
    let strides = per_axis(&params.strides, spatial, "strides")?;
    let dilations = per_axis(&params.dilations, spatial, "dilations")?;
    let span: Vec<usize> = kernel
        .iter()
        .zip(&dilations)
        .map(|(&k, &d)| (k.max(1) - 1) * d + 1)
        .collect();

    // Padding for each spatial axis as (before, after).
    let mut pad_width = vec![(0, 0), (0, 0)];
    for d in 0..spatial {
        let len = input.shape()[d + 2];
        let pad = match params.padding {
            PaddingMode::Valid => (0, 0),
            PaddingMode::Same => {
                let out = len.div_ceil(strides[d]);
                let total = ((out.max(1) - 1) * strides[d] + span[d]).saturating_sub(len);
                (total / 2, total - total / 2)
            }
        };
        pad_width.push(pad);
    }
    let padded = input.pad(&pad_width, T::zero())?;

    let mut out_spatial = Vec::with_capacity(spatial);
    for d in 0..spatial {
        let len = padded.shape()[d + 2];
        if len < span[d] {
            return Err(CoreError::InvalidShape {
                shape: padded.shape().to_vec(),
                reason: "kernel extent exceeds padded input",
            });
        }
        out_spatial.push((len - span[d]) / strides[d] + 1);
    }
    trace!(
        input = ?input.shape(),
        filters = ?filters.shape(),
        output = ?out_spatial,
        groups,
        "conv_general"
    );

    let in_strides: Vec<usize> = padded.strides()[2..].to_vec();
    let channel_stride = padded.strides()[1];
    let batch_stride = padded.strides()[0];
    let c_out_group = c_out / groups;
    let kernel_numel: usize = kernel.iter().product();
    let out_numel: usize = out_spatial.iter().product();
    let x = padded.as_slice();
    let w = filters.as_slice();

    let fill = |plane_idx: usize, plane: &mut [T]| {
        let n = plane_idx / c_out;
        let oc = plane_idx % c_out;
        let group = oc / c_out_group;
        let mut o_ix = vec![0usize; spatial];
        for slot in plane.iter_mut() {
            let mut acc = T::zero();
            let mut k_ix = vec![0usize; spatial];
            for kpos in 0..kernel_numel {
                let mut offset = n * batch_stride;
                for d in 0..spatial {
                    offset += (o_ix[d] * strides[d] + k_ix[d] * dilations[d]) * in_strides[d];
                }
                for ic in 0..c_in_group {
                    let xv = x[offset + (group * c_in_group + ic) * channel_stride];
                    let wv = w[(kpos * c_in_group + ic) * c_out + oc];
                    acc += xv * wv;
                }
                advance(&mut k_ix, kernel);
            }
            *slot = acc;
            advance(&mut o_ix, &out_spatial);
        }
    };

    let mut data = vec![T::zero(); batch * c_out * out_numel];
    if out_numel > 0 {
        #[cfg(feature = "rayon")]
        data.par_chunks_mut(out_numel)
            .enumerate()
            .for_each(|(i, plane)| fill(i, plane));
        #[cfg(not(feature = "rayon"))]
        data.chunks_mut(out_numel)
            .enumerate()
            .for_each(|(i, plane)| fill(i, plane));
    }

    let mut shape = vec![batch, c_out];
    shape.extend(out_spatial);
    Tensor::from_vec(data, shape)
}

impl Array {
    /// Dynamically typed [`conv_general`]; both operands must share a
    /// numeric dtype.
    pub fn conv_general(&self, filters: &Array, params: &ConvParams) -> Result<Array> {
        if self.dtype() != filters.dtype() {
            return Err(CoreError::DTypeMismatch {
                lhs: self.dtype(),
                rhs: filters.dtype(),
            });
        }
        Ok(for_numeric_dtype!(self.dtype(), "conv_general", T => {
            let x = self.cast::<T>();
            let k = filters.cast::<T>();
            Array::from(conv_general(&x, &k, params)?)
        }))
    }
}

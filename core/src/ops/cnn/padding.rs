use crate::internal::*;
use crate::ops::nn::DataFormat;

/// How an ONNX-style pooling pads its input, per spatial axis.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum PaddingSpec {
    Explicit(TVec<usize>, TVec<usize>),
    ExplicitOnnxPool(TVec<usize>, TVec<usize>, bool),
    #[default]
    Valid,
    SameUpper,
    SameLower,
}

use PaddingSpec::*;

/// The padding mode string of the native pooling primitives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PaddingMode {
    #[default]
    Valid,
    Same,
}

impl PaddingMode {
    /// Native output length of one spatial axis.
    pub fn output_dim(&self, input: &Dim, kernel: usize, dilation: usize, stride: usize) -> TfResult<Dim> {
        let spec = match self {
            PaddingMode::Valid => Valid,
            PaddingMode::Same => SameUpper,
        };
        spec.output_dim(0, input, kernel, dilation, stride)
    }

    /// Padding the native primitive implicitly applies on one axis.
    pub fn compute_one(&self, input: usize, kernel: usize, dilation: usize, stride: usize) -> TfResult<ComputedPaddedDim> {
        match self {
            PaddingMode::Valid => Valid.compute_one(0, input, kernel, dilation, stride),
            PaddingMode::Same => SameUpper.compute_one(0, input, kernel, dilation, stride),
        }
    }
}

#[derive(Debug, Clone, Copy, new, PartialEq, Eq)]
pub struct ComputedPaddedDim {
    pub input: usize,
    pub output: usize,
    pub pad_before: usize,
    pub pad_after: usize,
}

fn kernel_field(kernel: usize, dilation: usize) -> usize {
    (kernel - 1) * dilation + 1
}

impl PaddingSpec {
    pub fn valid_dim(&self, d: usize) -> bool {
        match self {
            Valid => true,
            Explicit(bef, aft) | ExplicitOnnxPool(bef, aft, _) => bef[d] == 0 && aft[d] == 0,
            _ => false,
        }
    }

    pub fn compute(
        &self,
        input_spatial_shape: &[usize],
        kernel_spatial_shape: &[usize],
        dilations: &[usize],
        strides: &[usize],
    ) -> TfResult<TVec<ComputedPaddedDim>> {
        (0..input_spatial_shape.len())
            .map(|d| {
                self.compute_one(
                    d,
                    input_spatial_shape[d],
                    kernel_spatial_shape[d],
                    dilations[d],
                    strides[d],
                )
            })
            .collect()
    }

    /// Output length and padding of one spatial axis.
    ///
    /// For `ExplicitOnnxPool` in ceil mode, `pad_after` is grown (or shrunk)
    /// so that a floor-rounded valid pooling over the padded axis yields
    /// exactly `output` positions.
    pub fn compute_one(
        &self,
        axis: usize,
        input: usize,
        kernel: usize,
        dilation: usize,
        stride: usize,
    ) -> TfResult<ComputedPaddedDim> {
        ensure!(kernel > 0 && dilation > 0 && stride > 0, "Invalid pooling geometry");
        let it = match self {
            Valid => Self::valid(input, kernel, dilation, stride)?,
            Explicit(bef, aft) => {
                Self::explicit_onnx_pool(input, kernel, dilation, stride, bef[axis], aft[axis], false)
            }
            ExplicitOnnxPool(bef, aft, ceil_mode) => Self::explicit_onnx_pool(
                input, kernel, dilation, stride, bef[axis], aft[axis], *ceil_mode,
            ),
            SameUpper => Self::same(input, kernel, dilation, stride, true),
            SameLower => Self::same(input, kernel, dilation, stride, false),
        };
        Ok(it)
    }

    /// Output length of one spatial axis whose input length may be unknown.
    pub fn output_dim(
        &self,
        axis: usize,
        input: &Dim,
        kernel: usize,
        dilation: usize,
        stride: usize,
    ) -> TfResult<Dim> {
        input.map_known(|i| Ok(self.compute_one(axis, i, kernel, dilation, stride)?.output))
    }

    fn valid(input: usize, kernel: usize, dilation: usize, stride: usize) -> TfResult<ComputedPaddedDim> {
        let field = kernel_field(kernel, dilation);
        ensure!(
            input >= field,
            "Pooling window ({}) larger than input ({}) with valid padding",
            field,
            input
        );
        Ok(ComputedPaddedDim::new(input, (input - field) / stride + 1, 0, 0))
    }

    fn explicit_onnx_pool(
        input: usize,
        kernel: usize,
        dilation: usize,
        stride: usize,
        bef: usize,
        aft: usize,
        ceil_mode: bool,
    ) -> ComputedPaddedDim {
        // output = floor_or_ceil((input + pads - field) / stride) + 1
        let field = kernel_field(kernel, dilation);
        let dividend = (input + bef + aft).saturating_sub(field);
        let mut output = if ceil_mode { dividend.div_ceil(stride) } else { dividend / stride } + 1;
        if !ceil_mode {
            return ComputedPaddedDim::new(input, output, bef, aft);
        }
        // the last window must start inside the input or its leading padding
        if (output - 1) * stride >= input + bef {
            output -= 1;
        }
        if output == 0 {
            return ComputedPaddedDim::new(input, 0, bef, aft);
        }
        let after = ((output - 1) * stride + field).saturating_sub(input + bef);
        ComputedPaddedDim::new(input, output, bef, after)
    }

    fn same(input: usize, kernel: usize, dilation: usize, stride: usize, upper: bool) -> ComputedPaddedDim {
        let output = input.div_ceil(stride);
        let field = kernel_field(kernel, dilation);
        let pad = ((output.max(1) - 1) * stride + field).saturating_sub(input);
        let lower_pad = pad / 2;
        let higher_pad = pad - lower_pad;
        let (before, after) = if upper { (lower_pad, higher_pad) } else { (higher_pad, lower_pad) };
        ComputedPaddedDim::new(input, output, before, after)
    }
}

/// Per-axis `(before, after)` padding of a full `data_format` tensor,
/// zero on batch and channel axes.
pub fn pool_pads(
    data_format: DataFormat,
    input_shape: &[usize],
    kernel_shape: &[usize],
    strides: &[usize],
    dilations: &[usize],
    padding: &PaddingSpec,
) -> TfResult<TVec<(usize, usize)>> {
    let shape = data_format.shape(input_shape)?;
    ensure!(
        shape.hw_rank() == kernel_shape.len()
            && strides.len() == kernel_shape.len()
            && dilations.len() == kernel_shape.len(),
        "Pooling geometry {:?}/{:?}/{:?} does not fit input shape {:?}",
        kernel_shape,
        strides,
        dilations,
        input_shape
    );
    let computed = padding.compute(shape.hw_dims(), kernel_shape, dilations, strides)?;
    let spatial: TVec<(usize, usize)> = computed.iter().map(|c| (c.pad_before, c.pad_after)).collect();
    Ok(data_format.from_n_c_hw_values((0, 0), (0, 0), &spatial))
}

#[cfg(test)]
mod tests {
    use super::*;
    use PaddingSpec as PS;

    #[test]
    fn same_stride_1() {
        assert_eq!(PS::same(1, 2, 1, 1, true), ComputedPaddedDim::new(1, 1, 0, 1));
        assert_eq!(PS::same(2, 2, 1, 1, true), ComputedPaddedDim::new(2, 2, 0, 1));
        assert_eq!(PS::same(3, 2, 1, 1, true), ComputedPaddedDim::new(3, 3, 0, 1));
        assert_eq!(PS::same(4, 2, 1, 1, true), ComputedPaddedDim::new(4, 4, 0, 1));
    }

    #[test]
    fn same_stride_2() {
        assert_eq!(PS::same(1, 2, 1, 2, true), ComputedPaddedDim::new(1, 1, 0, 1));
        assert_eq!(PS::same(2, 2, 1, 2, true), ComputedPaddedDim::new(2, 1, 0, 0));
        assert_eq!(PS::same(3, 2, 1, 2, true), ComputedPaddedDim::new(3, 2, 0, 1));
        assert_eq!(PS::same(4, 2, 1, 2, true), ComputedPaddedDim::new(4, 2, 0, 0));
    }

    #[test]
    fn same_lower() {
        assert_eq!(PS::same(10, 2, 1, 3, false), ComputedPaddedDim::new(10, 4, 1, 0));
    }

    #[test]
    fn same_ker_3() {
        assert_eq!(PS::same(1, 3, 1, 1, true), ComputedPaddedDim::new(1, 1, 1, 1));
        assert_eq!(PS::same(4, 3, 1, 1, true), ComputedPaddedDim::new(4, 4, 1, 1));
        assert_eq!(PS::same(9, 3, 1, 2, true), ComputedPaddedDim::new(9, 5, 1, 1));
    }

    #[test]
    fn same_dilated() {
        // field 5, output 10, pad 4
        assert_eq!(PS::same(10, 3, 2, 1, true), ComputedPaddedDim::new(10, 10, 2, 2));
    }

    #[test]
    fn valid_1() {
        assert_eq!(PS::valid(10, 2, 1, 3).unwrap(), ComputedPaddedDim::new(10, 3, 0, 0));
        assert!(PS::valid(2, 2, 2, 1).is_err());
    }

    #[test]
    fn explicit_ceil_adds_trailing_pad() {
        // 5 + 0 - 2 = 3, ceil(3 / 2) + 1 = 3 windows: 0-1, 2-3, 4-5
        assert_eq!(
            PS::explicit_onnx_pool(5, 2, 1, 2, 0, 0, true),
            ComputedPaddedDim::new(5, 3, 0, 1)
        );
        assert_eq!(
            PS::explicit_onnx_pool(5, 2, 1, 2, 0, 0, false),
            ComputedPaddedDim::new(5, 2, 0, 0)
        );
    }

    #[test]
    fn explicit_ceil_last_window_in_input() {
        // 4 + 1 + 1 - 2 = 4, ceil(4 / 3) + 1 = 3, but the third window would
        // start at 6 >= 4 + 1
        assert_eq!(
            PS::explicit_onnx_pool(4, 2, 1, 3, 1, 1, true),
            ComputedPaddedDim::new(4, 2, 1, 0)
        );
    }

    #[test]
    fn explicit_ceil_empty_axis() {
        assert_eq!(
            PS::explicit_onnx_pool(0, 1, 1, 1, 0, 0, true),
            ComputedPaddedDim::new(0, 0, 0, 0)
        );
    }

    #[test]
    fn explicit_2() {
        assert_eq!(
            PS::explicit_onnx_pool(28, 3, 1, 1, 2, 2, true),
            ComputedPaddedDim::new(28, 30, 2, 2)
        );
    }

    // 0 1 2 3 4 5 6 7 8 9 a b
    // 012 345 678 9ab
    #[test]
    fn bug_explicit_stride() {
        assert_eq!(
            PS::explicit_onnx_pool(12, 3, 1, 3, 0, 0, false),
            ComputedPaddedDim::new(12, 4, 0, 0)
        );
    }

    #[test]
    fn unknown_dims() {
        assert_eq!(SameUpper.output_dim(0, &Dim::sym("H"), 3, 1, 2).unwrap(), Dim::Any);
        assert_eq!(PaddingMode::Same.output_dim(&Dim::Val(9), 3, 1, 2).unwrap(), Dim::Val(5));
        assert_eq!(PaddingMode::Valid.output_dim(&Dim::Val(9), 3, 1, 2).unwrap(), Dim::Val(4));
    }

    #[test]
    fn full_rank_pads() {
        let pads = pool_pads(
            DataFormat::NHWC,
            &[1, 9, 9, 3],
            &[3, 3],
            &[2, 2],
            &[1, 1],
            &PaddingSpec::SameUpper,
        )
        .unwrap();
        assert_eq!(pads.as_slice(), &[(0, 0), (1, 1), (1, 1), (0, 0)]);
        assert!(pool_pads(DataFormat::NCHW, &[1, 3, 9], &[3, 3], &[1, 1], &[1, 1], &Valid).is_err());
    }
}

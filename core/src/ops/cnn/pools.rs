use crate::internal::*;

use crate::ops::cnn::{PaddingMode, Patch, PatchSpec};
use crate::ops::nn::{DataFormat, DataShape};

/// Window geometry shared by the native pooling primitives.
#[derive(Debug, Clone, new, PartialEq, Eq, Hash)]
pub struct PoolSpec {
    pub data_format: DataFormat,
    pub kernel_shape: TVec<usize>,
    pub strides: TVec<usize>,
    pub dilations: TVec<usize>,
    pub padding: PaddingMode,
}

impl PoolSpec {
    pub fn info(&self) -> Vec<String> {
        vec![
            format!("Data format: {:?}", self.data_format),
            format!(
                "Kernel shape:{:?} (strides:{:?}, dilations:{:?}, padding:{:?})",
                self.kernel_shape, self.strides, self.dilations, self.padding,
            ),
        ]
    }

    pub fn rank(&self) -> usize {
        self.kernel_shape.len()
    }

    fn check(&self) -> TfResult<()> {
        ensure!(self.rank() > 0, "Pooling needs at least one spatial axis");
        ensure!(
            self.strides.len() == self.rank() && self.dilations.len() == self.rank(),
            "Kernel shape {:?}, strides {:?} and dilations {:?} must have the same length",
            self.kernel_shape,
            self.strides,
            self.dilations
        );
        ensure!(
            self.kernel_shape.iter().chain(&self.strides).chain(&self.dilations).all(|&x| x > 0),
            "Kernel shape, strides and dilations must be positive: {:?}",
            self
        );
        Ok(())
    }

    pub fn compute_geo(&self, input_full_shape: &[usize]) -> TfResult<(DataShape, Patch)> {
        self.check()?;
        let input_shape: DataShape = self.data_format.shape(input_full_shape.into())?;
        ensure!(
            input_shape.hw_rank() == self.rank(),
            "Input {:?} has {} spatial axes, kernel has {}",
            input_full_shape,
            input_shape.hw_rank(),
            self.rank()
        );
        let patch = PatchSpec::for_data_shape(&input_shape)
            .with_kernel_shape(self.kernel_shape.clone())
            .with_strides(self.strides.clone())
            .with_dilations(self.dilations.clone())
            .with_padding(self.padding)
            .into_patch()?;
        Ok((input_shape, patch))
    }

    pub fn output_fact(&self, input: &TypedFact) -> TfResult<TypedFact> {
        self.check()?;
        let Some(dims) = input.shape.dims() else {
            return Ok(TypedFact::dt_shape(input.datum_type, ShapeFact::of_rank(self.rank() + 2)));
        };
        let ishape = self.data_format.shape(dims)?;
        ensure!(
            ishape.hw_rank() == self.rank(),
            "Input {:?} has {} spatial axes, kernel has {}",
            input,
            ishape.hw_rank(),
            self.rank()
        );
        let spatial = ishape
            .hw_dims()
            .iter()
            .enumerate()
            .map(|(ix, d)| {
                self.padding.output_dim(d, self.kernel_shape[ix], self.dilations[ix], self.strides[ix])
            })
            .collect::<TfResult<TVec<Dim>>>()?;
        let oshape = self.data_format.from_n_c_hw(ishape.n().clone(), ishape.c().clone(), spatial)?;
        Ok(TypedFact::dt_shape(input.datum_type, oshape.shape))
    }

    pub(super) fn max_t<T: Datum>(&self, input: &Tensor) -> TfResult<Tensor> {
        let (_, patch) = self.compute_geo(input.shape())?;
        let output = patch.fold(
            self.data_format,
            &input.to_array_view::<T>()?,
            T::lowest,
            |acc, v, _, _| if v > acc { v } else { acc },
            |acc, _| acc,
        )?;
        Ok(T::into_tensor(output))
    }

    /// Average over the taps inside the input, padding excluded.
    pub(super) fn avg_t<T: Datum>(&self, input: &Tensor) -> TfResult<Tensor> {
        let (_, patch) = self.compute_geo(input.shape())?;
        let output = patch.fold(
            self.data_format,
            &input.to_array_view::<T>()?,
            || 0f64,
            |acc, v, _, _| acc + v.to_f64().unwrap_or(0.0),
            |acc, count| <T as num_traits::NumCast>::from(acc / count.max(1) as f64).unwrap_or_else(T::zero),
        )?;
        Ok(T::into_tensor(output))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PoolingType {
    Max,
    Avg,
}

/// Generic N-d pooling, `tf.nn.pool`.
///
/// Dilations are only accepted when every stride is 1.
#[derive(Debug, Clone, new, PartialEq, Eq, Hash)]
pub struct Pool {
    pub pooling_type: PoolingType,
    pub pool_spec: PoolSpec,
}

impl Op for Pool {
    fn name(&self) -> Cow<'_, str> {
        match self.pooling_type {
            PoolingType::Max => "Pool(MAX)".into(),
            PoolingType::Avg => "Pool(AVG)".into(),
        }
    }

    fn info(&self) -> TfResult<Vec<String>> {
        Ok(self.pool_spec.info())
    }

    fn output_fact(&self, inputs: &[&TypedFact]) -> TfResult<TypedFact> {
        super::super::check_input_arity(inputs, 1)?;
        if self.pool_spec.dilations.iter().any(|&d| d != 1) {
            ensure!(
                self.pool_spec.strides.iter().all(|&s| s == 1),
                "Pool: dilations {:?} require all strides to be 1, got {:?}",
                self.pool_spec.dilations,
                self.pool_spec.strides
            );
        }
        self.pool_spec.output_fact(inputs[0])
    }

    fn eval(&self, inputs: TVec<Arc<Tensor>>) -> TfResult<Arc<Tensor>> {
        super::super::check_input_arity(&inputs, 1)?;
        let dt = inputs[0].datum_type();
        let output = match self.pooling_type {
            PoolingType::Max => dispatch_datum!(PoolSpec::max_t(dt)(&self.pool_spec, &inputs[0]))?,
            PoolingType::Avg => dispatch_datum!(PoolSpec::avg_t(dt)(&self.pool_spec, &inputs[0]))?,
        };
        Ok(output.into_arc_tensor())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tfbridge_data::ndarray::{arr1, Array3};

    fn spec_1d(kernel: usize, stride: usize, dilation: usize, padding: PaddingMode) -> PoolSpec {
        PoolSpec::new(DataFormat::NCHW, tvec!(kernel), tvec!(stride), tvec!(dilation), padding)
    }

    fn run(op: &Pool, input: Tensor) -> TfResult<Tensor> {
        let fact = TypedFact::from(&input);
        let output = op.eval(tvec!(input.into_arc_tensor()))?.into_tensor();
        assert!(op.output_fact(&[&fact])?.matches(&output));
        Ok(output)
    }

    fn signal(v: &[f32]) -> Tensor {
        Array3::from_shape_vec((1, 1, v.len()), v.to_vec()).unwrap().into_tensor()
    }

    #[test]
    fn max_dilated() {
        let op = Pool::new(PoolingType::Max, spec_1d(2, 1, 2, PaddingMode::Valid));
        let output = run(&op, signal(&[1., 5., 2., 0., 3.])).unwrap();
        assert_eq!(output.as_vec::<f32>().unwrap(), vec![2., 5., 3.]);
    }

    #[test]
    fn max_same_strided() {
        let op = Pool::new(PoolingType::Max, spec_1d(3, 2, 1, PaddingMode::Same));
        let output = run(&op, signal(&[-1., -5., -2., -7., -3.])).unwrap();
        // pads (1, 1): windows [p,-1,-5] [-5,-2,-7] [-7,-3,p]
        assert_eq!(output.as_vec::<f32>().unwrap(), vec![-1., -2., -3.]);
    }

    #[test]
    fn avg_excludes_padding() {
        let op = Pool::new(PoolingType::Avg, spec_1d(2, 1, 1, PaddingMode::Same));
        let output = run(&op, signal(&[2., 4., 6.])).unwrap();
        assert_eq!(output.as_vec::<f32>().unwrap(), vec![3., 5., 6.]);
    }

    #[test]
    fn integer_max() {
        let op = Pool::new(PoolingType::Max, spec_1d(2, 2, 1, PaddingMode::Valid));
        let input = arr1(&[3i64, -1, 7, 8]).into_shape_with_order((1, 1, 4)).unwrap().into_tensor();
        assert_eq!(run(&op, input).unwrap().as_vec::<i64>().unwrap(), vec![3, 8]);
    }

    #[test]
    fn rejects_dilation_with_strides() {
        let op = Pool::new(PoolingType::Max, spec_1d(2, 2, 2, PaddingMode::Valid));
        let fact = TypedFact::dt_shape(DatumType::F32, [1, 1, 8]);
        assert!(op.output_fact(&[&fact]).is_err());
    }

    #[test]
    fn unknown_dims() {
        let op = Pool::new(PoolingType::Max, spec_1d(3, 2, 1, PaddingMode::Same));
        let fact = TypedFact::dt_shape(
            DatumType::F32,
            ShapeFact::from_dims([Dim::sym("N"), Dim::Val(3), Dim::Val(9)]),
        );
        let output = op.output_fact(&[&fact]).unwrap();
        assert_eq!(output.shape, ShapeFact::from_dims([Dim::sym("N"), Dim::Val(3), Dim::Val(5)]));
        let fact = TypedFact::dt_shape(DatumType::F32, ShapeFact::unknown());
        assert_eq!(op.output_fact(&[&fact]).unwrap().rank(), Some(3));
    }
}

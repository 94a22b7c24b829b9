use crate::internal::*;

use crate::ops::cnn::pools::PoolSpec;
use crate::ops::cnn::PaddingMode;
use crate::ops::nn::DataFormat;

/// Dedicated max pooling, `tf.nn.max_pool`. It has no dilation parameter.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MaxPool {
    pub pool_spec: PoolSpec,
}

impl MaxPool {
    pub fn new(
        data_format: DataFormat,
        kernel_shape: TVec<usize>,
        strides: TVec<usize>,
        padding: PaddingMode,
    ) -> MaxPool {
        let dilations = tvec!(1; kernel_shape.len());
        MaxPool { pool_spec: PoolSpec::new(data_format, kernel_shape, strides, dilations, padding) }
    }
}

impl Op for MaxPool {
    fn name(&self) -> Cow<'_, str> {
        "MaxPool".into()
    }

    fn info(&self) -> TfResult<Vec<String>> {
        Ok(self.pool_spec.info())
    }

    fn output_fact(&self, inputs: &[&TypedFact]) -> TfResult<TypedFact> {
        crate::ops::check_input_arity(inputs, 1)?;
        self.pool_spec.output_fact(inputs[0])
    }

    fn eval(&self, inputs: TVec<Arc<Tensor>>) -> TfResult<Arc<Tensor>> {
        crate::ops::check_input_arity(&inputs, 1)?;
        let dt = inputs[0].datum_type();
        let output = dispatch_datum!(PoolSpec::max_t(dt)(&self.pool_spec, &inputs[0]))?;
        Ok(output.into_arc_tensor())
    }
}

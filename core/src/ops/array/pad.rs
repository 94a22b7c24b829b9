use crate::internal::*;
use crate::ops::cnn::{pool_pads, PaddingSpec};
use crate::ops::nn::DataFormat;
use tfbridge_data::ndarray::{Array, ArrayD, ArrayViewD};

/// Value written in the padded area.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PadValue {
    Constant(f64),
    /// Lowest value of the datum type, neutral for max.
    Lowest,
}

impl PadValue {
    fn value<T: Datum>(&self) -> TfResult<T> {
        match self {
            PadValue::Constant(v) => T::cast_from_f64(*v),
            PadValue::Lowest => Ok(T::lowest()),
        }
    }
}

fn pad_t<T: Datum>(input: &Tensor, pads: &[(usize, usize)], value: &PadValue) -> TfResult<Tensor> {
    let input: ArrayViewD<T> = input.to_array_view::<T>()?;
    ensure!(
        pads.len() == input.ndim(),
        "Padding {:?} does not match input rank {}",
        pads,
        input.ndim()
    );
    let fill = value.value::<T>()?;
    let shape: Vec<usize> =
        input.shape().iter().zip(pads).map(|(&dim, &(bef, aft))| dim + bef + aft).collect();
    let mut index_in_input = vec![0; input.ndim()];
    let result: ArrayD<T> = Array::from_shape_fn(shape, |index| {
        for i in 0..input.ndim() {
            if index[i] < pads[i].0 || index[i] - pads[i].0 >= input.shape()[i] {
                return fill;
            } else {
                index_in_input[i] = index[i] - pads[i].0;
            };
        }
        input[&*index_in_input]
    });
    Ok(T::into_tensor(result))
}

/// Static padding, `tf.pad` in constant mode.
#[derive(Debug, Clone, new, PartialEq)]
pub struct Pad {
    pub pads: TVec<(usize, usize)>,
    pub value: PadValue,
}

impl Op for Pad {
    fn name(&self) -> Cow<'_, str> {
        "Pad".into()
    }

    fn info(&self) -> TfResult<Vec<String>> {
        Ok(vec![format!("pads: {:?} value: {:?}", self.pads, self.value)])
    }

    fn output_fact(&self, inputs: &[&TypedFact]) -> TfResult<TypedFact> {
        crate::ops::check_input_arity(inputs, 1)?;
        let input = inputs[0];
        let rank = input.rank().unwrap_or(self.pads.len());
        ensure!(rank == self.pads.len(), "Padding {:?} does not match input {:?}", self.pads, input);
        let dims = (0..rank)
            .map(|ax| input.shape.dim(ax).map_known(|d| Ok(d + self.pads[ax].0 + self.pads[ax].1)))
            .collect::<TfResult<TVec<Dim>>>()?;
        Ok(TypedFact::dt_shape(input.datum_type, dims))
    }

    fn eval(&self, inputs: TVec<Arc<Tensor>>) -> TfResult<Arc<Tensor>> {
        crate::ops::check_input_arity(&inputs, 1)?;
        let dt = inputs[0].datum_type();
        Ok(dispatch_datum!(pad_t(dt)(&inputs[0], &self.pads, &self.value))?.into_arc_tensor())
    }
}

/// Pooling-aware padding computed from the actual input shape at run time.
///
/// Used in place of `Pad` when the spatial shape is not known while the
/// graph is built.
#[derive(Debug, Clone, new, PartialEq)]
pub struct PoolPad {
    pub data_format: DataFormat,
    pub kernel_shape: TVec<usize>,
    pub strides: TVec<usize>,
    pub dilations: TVec<usize>,
    pub padding: PaddingSpec,
    pub value: PadValue,
}

impl Op for PoolPad {
    fn name(&self) -> Cow<'_, str> {
        "PoolPad".into()
    }

    fn info(&self) -> TfResult<Vec<String>> {
        Ok(vec![format!(
            "kernel: {:?} strides: {:?} dilations: {:?} padding: {:?} value: {:?}",
            self.kernel_shape, self.strides, self.dilations, self.padding, self.value
        )])
    }

    fn output_fact(&self, inputs: &[&TypedFact]) -> TfResult<TypedFact> {
        crate::ops::check_input_arity(inputs, 1)?;
        let input = inputs[0];
        let rank = input.rank().unwrap_or(self.kernel_shape.len() + 2);
        let shape = self.data_format.shape((0..rank).map(|ax| input.shape.dim(ax)).collect::<TVec<_>>())?;
        ensure!(
            shape.hw_rank() == self.kernel_shape.len(),
            "Pooling geometry {:?} does not fit input {:?}",
            self.kernel_shape,
            input
        );
        let spatial = shape
            .hw_dims()
            .iter()
            .enumerate()
            .map(|(ax, d)| {
                d.map_known(|i| {
                    let c = self.padding.compute_one(
                        ax,
                        i,
                        self.kernel_shape[ax],
                        self.dilations[ax],
                        self.strides[ax],
                    )?;
                    Ok(i + c.pad_before + c.pad_after)
                })
            })
            .collect::<TfResult<TVec<Dim>>>()?;
        let oshape = self.data_format.from_n_c_hw(shape.n().clone(), shape.c().clone(), spatial)?;
        Ok(TypedFact::dt_shape(input.datum_type, oshape.shape))
    }

    fn eval(&self, inputs: TVec<Arc<Tensor>>) -> TfResult<Arc<Tensor>> {
        crate::ops::check_input_arity(&inputs, 1)?;
        let pads = pool_pads(
            self.data_format,
            inputs[0].shape(),
            &self.kernel_shape,
            &self.strides,
            &self.dilations,
            &self.padding,
        )?;
        trace!("{:?} pads {:?} as {:?}", self, inputs[0].shape(), pads);
        let dt = inputs[0].datum_type();
        Ok(dispatch_datum!(pad_t(dt)(&inputs[0], &pads, &self.value))?.into_arc_tensor())
    }
}

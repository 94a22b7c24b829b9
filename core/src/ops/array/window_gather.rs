use crate::internal::*;
use tfbridge_data::ndarray::Axis;

/// Gathers, along one axis, the elements each window of a strided and
/// dilated kernel touches, laying the windows out contiguously.
///
/// A pooling with window and stride equal to `kernel` over the output is
/// equivalent to the strided, dilated pooling over the input.
#[derive(Debug, Clone, new, PartialEq, Eq, Hash)]
pub struct WindowGather {
    pub axis: usize,
    pub kernel: usize,
    pub stride: usize,
    pub dilation: usize,
}

impl WindowGather {
    fn windows(&self, input: usize) -> TfResult<usize> {
        ensure!(self.kernel > 0 && self.stride > 0 && self.dilation > 0, "Invalid window geometry {:?}", self);
        let field = (self.kernel - 1) * self.dilation + 1;
        ensure!(
            input >= field,
            "Window of {} (kernel {}, dilation {}) larger than axis of length {}",
            field,
            self.kernel,
            self.dilation,
            input
        );
        Ok((input - field) / self.stride + 1)
    }

    /// Input positions gathered, window by window.
    pub fn indices(&self, input: usize) -> TfResult<Vec<usize>> {
        let windows = self.windows(input)?;
        Ok((0..windows)
            .flat_map(|w| (0..self.kernel).map(move |k| w * self.stride + k * self.dilation))
            .collect())
    }

    fn eval_t<T: Datum>(&self, input: &Tensor) -> TfResult<Tensor> {
        let view = input.to_array_view::<T>()?;
        ensure!(self.axis < view.ndim(), "Axis {} out of range for {:?}", self.axis, input);
        let indices = self.indices(view.shape()[self.axis])?;
        Ok(T::into_tensor(view.select(Axis(self.axis), &indices)))
    }
}

impl Op for WindowGather {
    fn name(&self) -> Cow<'_, str> {
        "WindowGather".into()
    }

    fn info(&self) -> TfResult<Vec<String>> {
        Ok(vec![format!(
            "axis: {} kernel: {} stride: {} dilation: {}",
            self.axis, self.kernel, self.stride, self.dilation
        )])
    }

    fn output_fact(&self, inputs: &[&TypedFact]) -> TfResult<TypedFact> {
        crate::ops::check_input_arity(inputs, 1)?;
        let input = inputs[0];
        let Some(dims) = input.shape.dims() else { return Ok(input.clone()) };
        ensure!(self.axis < dims.len(), "Axis {} out of range for {:?}", self.axis, input);
        let mut dims: TVec<Dim> = dims.into();
        dims[self.axis] = dims[self.axis].map_known(|d| Ok(self.windows(d)? * self.kernel))?;
        Ok(TypedFact::dt_shape(input.datum_type, dims))
    }

    fn eval(&self, inputs: TVec<Arc<Tensor>>) -> TfResult<Arc<Tensor>> {
        crate::ops::check_input_arity(&inputs, 1)?;
        let dt = inputs[0].datum_type();
        Ok(dispatch_datum!(Self::eval_t(dt)(self, &inputs[0]))?.into_arc_tensor())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tfbridge_data::ndarray::arr2;

    #[test]
    fn indices() {
        // field 3, windows at 0, 2, 4
        let op = WindowGather::new(0, 2, 2, 2);
        assert_eq!(op.indices(7).unwrap(), vec![0, 2, 2, 4, 4, 6]);
        assert_eq!(WindowGather::new(0, 3, 3, 1).indices(6).unwrap(), vec![0, 1, 2, 3, 4, 5]);
        assert!(op.indices(2).is_err());
    }

    #[test]
    fn gather_axis_1() {
        let op = WindowGather::new(1, 2, 1, 2);
        let input = arr2(&[[0, 1, 2, 3], [4, 5, 6, 7]]);
        let output = op.eval(tvec!(input.into_arc_tensor())).unwrap();
        assert_eq!(*output, arr2(&[[0, 2, 1, 3], [4, 6, 5, 7]]).into_tensor());
    }

    #[test]
    fn output_fact() {
        let op = WindowGather::new(2, 2, 2, 2);
        let fact = TypedFact::dt_shape(
            DatumType::F32,
            ShapeFact::from_dims([Dim::Val(1), Dim::Any, Dim::Val(8)]),
        );
        assert_eq!(
            op.output_fact(&[&fact]).unwrap().shape,
            ShapeFact::from_dims([Dim::Val(1), Dim::Any, Dim::Val(6)])
        );
    }
}

use crate::internal::*;

use crate::ops::cnn::{PaddingMode, PatchSpec};
use crate::ops::nn::{DataFormat, DataShape};

/// Grayscale morphological dilation, `tf.nn.dilation2d`.
///
/// Inputs are the data and a `[kh, kw, depth]` structuring element. Each
/// output is the max over the window of `input + filter`. `depth` is
/// either the channel count or 1, the filter being broadcast over channels
/// in the latter case.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Dilation2D {
    pub data_format: DataFormat,
    pub strides: TVec<usize>,
    pub rates: TVec<usize>,
    pub padding: PaddingMode,
}

impl Dilation2D {
    /// `strides` and `rates` span the four data axes, batch and channel
    /// entries must be 1.
    pub fn new(
        data_format: DataFormat,
        strides: &[usize],
        rates: &[usize],
        padding: PaddingMode,
    ) -> TfResult<Dilation2D> {
        ensure!(
            strides.len() == 4 && rates.len() == 4,
            "Dilation2D expects 4 strides and rates, got {:?} and {:?}",
            strides,
            rates
        );
        let shape = data_format.shape(strides)?;
        let rate_shape = data_format.shape(rates)?;
        ensure!(
            *shape.n() == 1 && *shape.c() == 1 && *rate_shape.n() == 1 && *rate_shape.c() == 1,
            "Dilation2D does not stride or dilate over batch and channels: {:?}, {:?}",
            strides,
            rates
        );
        ensure!(
            shape.hw_dims().iter().chain(rate_shape.hw_dims()).all(|&x| x > 0),
            "Dilation2D strides and rates must be positive"
        );
        Ok(Dilation2D {
            data_format,
            strides: shape.hw_dims().into(),
            rates: rate_shape.hw_dims().into(),
            padding,
        })
    }

    fn kernel_shape(filter: &TypedFact) -> TfResult<(TVec<usize>, Dim)> {
        let Some(dims) = filter.shape.dims() else { bail!("Dilation2D filter rank must be known") };
        ensure!(dims.len() == 3, "Dilation2D filter must be [kh, kw, depth], got {:?}", filter);
        let kernel = dims[0..2]
            .iter()
            .map(|d| d.to_usize().context("Dilation2D filter spatial shape must be known"))
            .collect::<TfResult<TVec<usize>>>()?;
        Ok((kernel, dims[2].clone()))
    }

    fn eval_t<T: Datum>(&self, input: &Tensor, filter: &Tensor) -> TfResult<Tensor> {
        let input_shape: DataShape = self.data_format.shape(input.shape().into())?;
        ensure!(input_shape.rank() == 4, "Dilation2D expects a rank 4 input, got {:?}", input);
        let kernel: TVec<usize> = filter.shape()[0..2].into();
        let depth = filter.shape()[2];
        ensure!(
            depth == 1 || depth == *input_shape.c(),
            "Dilation2D filter depth is {}, input has {} channels",
            depth,
            input_shape.c()
        );
        let filter = filter.as_vec::<T>()?;
        let patch = PatchSpec::for_data_shape(&input_shape)
            .with_kernel_shape(kernel)
            .with_strides(self.strides.clone())
            .with_dilations(self.rates.clone())
            .with_padding(self.padding)
            .into_patch()?;
        let output = patch.fold(
            self.data_format,
            &input.to_array_view::<T>()?,
            T::lowest,
            |acc, v, tap, c| {
                let candidate = v + filter[tap * depth + if depth == 1 { 0 } else { c }];
                if candidate > acc { candidate } else { acc }
            },
            |acc, _| acc,
        )?;
        Ok(T::into_tensor(output))
    }
}

impl Op for Dilation2D {
    fn name(&self) -> Cow<'_, str> {
        "Dilation2D".into()
    }

    fn info(&self) -> TfResult<Vec<String>> {
        Ok(vec![format!(
            "Data format: {:?}, strides: {:?}, rates: {:?}, padding: {:?}",
            self.data_format, self.strides, self.rates, self.padding
        )])
    }

    fn output_fact(&self, inputs: &[&TypedFact]) -> TfResult<TypedFact> {
        crate::ops::check_input_arity(inputs, 2)?;
        let (input, filter) = (inputs[0], inputs[1]);
        ensure!(
            input.datum_type == filter.datum_type,
            "Dilation2D input is {:?}, filter is {:?}",
            input.datum_type,
            filter.datum_type
        );
        let (kernel, depth) = Self::kernel_shape(filter)?;
        let Some(dims) = input.shape.dims() else {
            return Ok(TypedFact::dt_shape(input.datum_type, ShapeFact::of_rank(4)));
        };
        let ishape = self.data_format.shape(dims)?;
        ensure!(ishape.rank() == 4, "Dilation2D expects a rank 4 input, got {:?}", input);
        if let (Some(c), Some(d)) = (ishape.c().as_known(), depth.as_known()) {
            ensure!(d == 1 || d == c, "Dilation2D filter depth is {}, input has {} channels", d, c);
        }
        let spatial = ishape
            .hw_dims()
            .iter()
            .enumerate()
            .map(|(ix, d)| self.padding.output_dim(d, kernel[ix], self.rates[ix], self.strides[ix]))
            .collect::<TfResult<TVec<Dim>>>()?;
        let oshape = self.data_format.from_n_c_hw(ishape.n().clone(), ishape.c().clone(), spatial)?;
        Ok(TypedFact::dt_shape(input.datum_type, oshape.shape))
    }

    fn eval(&self, inputs: TVec<Arc<Tensor>>) -> TfResult<Arc<Tensor>> {
        crate::ops::check_input_arity(&inputs, 2)?;
        let dt = inputs[0].datum_type();
        ensure!(inputs[1].datum_type() == dt, "Dilation2D input and filter types differ");
        let output = dispatch_datum!(Self::eval_t(dt)(self, &inputs[0], &inputs[1]))?;
        Ok(output.into_arc_tensor())
    }
}

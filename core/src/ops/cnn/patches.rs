use crate::internal::*;
use crate::ops::cnn::PaddingMode;
use crate::ops::nn::{DataFormat, DataShape};
use itertools::Itertools;
use tfbridge_data::ndarray::{indices, ArrayD, ArrayViewD, Dimension, IxDyn};

use std::fmt::Debug;

/// Sliding window geometry over the spatial axes of a concrete input.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct PatchSpec {
    pub input_shape: TVec<usize>,
    pub kernel_shape: TVec<usize>,
    pub strides: TVec<usize>,
    pub dilations: TVec<usize>,
    pub padding: PaddingMode,
}

impl Debug for PatchSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "input: {} kernel: {} strides: {} dil: {} pad: {:?}",
            self.input_shape.iter().join(","),
            self.kernel_shape.iter().join(","),
            self.strides.iter().join(","),
            self.dilations.iter().join(","),
            self.padding
        )
    }
}

impl PatchSpec {
    pub fn for_data_shape(data_shape: &DataShape) -> PatchSpec {
        let input_shape: TVec<usize> = data_shape.hw_dims().into();
        PatchSpec {
            kernel_shape: tvec!(1; input_shape.len()),
            strides: tvec!(1; input_shape.len()),
            dilations: tvec!(1; input_shape.len()),
            padding: PaddingMode::Valid,
            input_shape,
        }
    }

    pub fn with_kernel_shape(self, kernel_shape: TVec<usize>) -> PatchSpec {
        PatchSpec { kernel_shape, ..self }
    }

    pub fn with_dilations(self, dilations: TVec<usize>) -> PatchSpec {
        PatchSpec { dilations, ..self }
    }

    pub fn with_strides(self, strides: TVec<usize>) -> PatchSpec {
        PatchSpec { strides, ..self }
    }

    pub fn with_padding(self, padding: PaddingMode) -> PatchSpec {
        PatchSpec { padding, ..self }
    }

    pub fn into_patch(self) -> TfResult<Patch> {
        ensure!(
            self.kernel_shape.len() == self.input_shape.len()
                && self.strides.len() == self.input_shape.len()
                && self.dilations.len() == self.input_shape.len(),
            "Inconsistent patch geometry: {:?}",
            self
        );
        let computed = self
            .input_shape
            .iter()
            .zip(self.kernel_shape.iter())
            .zip(self.dilations.iter().zip(self.strides.iter()))
            .map(|((&i, &k), (&d, &s))| self.padding.compute_one(i, k, d, s))
            .collect::<TfResult<TVec<_>>>()
            .with_context(|| format!("Computing padding for {:?}", self))?;
        let output_shape = computed.iter().map(|c| c.output).collect();
        let pad_before = computed.iter().map(|c| c.pad_before).collect();
        let kernel_positions = indices(&*self.kernel_shape)
            .into_iter()
            .map(|k| {
                let k = k.slice();
                (0..k.len()).map(|ix| (k[ix] * self.dilations[ix]) as isize).collect()
            })
            .collect();
        Ok(Patch { spec: self, output_shape, pad_before, kernel_positions })
    }
}

#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Patch {
    pub spec: PatchSpec,
    pub output_shape: TVec<usize>,
    pub pad_before: TVec<usize>,
    /// offset of each kernel tap from the window origin, in kernel order
    pub kernel_positions: Vec<TVec<isize>>,
}

impl Debug for Patch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?} -> {}", self.spec, self.output_shape.iter().join(","))
    }
}

impl Patch {
    pub fn rank(&self) -> usize {
        self.spec.input_shape.len()
    }

    /// Reduce every window of `input`.
    ///
    /// `step` sees each tap that lands inside the input, with its tap index
    /// and the channel it belongs to. Taps falling in the implicit padding
    /// are skipped. `finish` receives the accumulator and the number of
    /// taps visited.
    pub fn fold<T, A>(
        &self,
        data_format: DataFormat,
        input: &ArrayViewD<T>,
        init: impl Fn() -> A,
        step: impl Fn(A, T, usize, usize) -> A,
        finish: impl Fn(A, usize) -> T,
    ) -> TfResult<ArrayD<T>>
    where
        T: Datum,
    {
        let input_shape = data_format.shape(input.shape())?;
        ensure!(
            input_shape.hw_dims() == &*self.spec.input_shape,
            "Patch was computed for {:?}, input is {:?}",
            self.spec.input_shape,
            input.shape()
        );
        let output_shape = data_format.from_n_c_hw(
            *input_shape.n(),
            *input_shape.c(),
            &*self.output_shape,
        )?;
        let h_axis = input_shape.h_axis();
        let c_axis = input_shape.c_axis();
        let rank = self.rank();
        let mut coords: Vec<usize> = vec![0; input.ndim()];
        let output = ArrayD::from_shape_fn(&*output_shape.shape, |o: IxDyn| {
            coords.copy_from_slice(o.slice());
            let mut acc = init();
            let mut count = 0;
            'taps: for (tap, offsets) in self.kernel_positions.iter().enumerate() {
                for ax in 0..rank {
                    let x = (o[h_axis + ax] * self.spec.strides[ax]) as isize + offsets[ax]
                        - self.pad_before[ax] as isize;
                    if x < 0 || x >= self.spec.input_shape[ax] as isize {
                        continue 'taps;
                    }
                    coords[h_axis + ax] = x as usize;
                }
                acc = step(acc, input[&*coords], tap, o[c_axis]);
                count += 1;
            }
            finish(acc, count)
        });
        Ok(output)
    }
}

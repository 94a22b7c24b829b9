//! `Tensor`, the concrete value flowing through a model at run time.
use crate::datum::{Datum, DatumType};
use crate::TfResult;
use ndarray::prelude::*;
use std::fmt;
use std::sync::Arc;

/// A dense tensor of one of the supported element types.
#[derive(Clone, PartialEq)]
pub enum Tensor {
    U8(ArrayD<u8>),
    I8(ArrayD<i8>),
    I16(ArrayD<i16>),
    I32(ArrayD<i32>),
    I64(ArrayD<i64>),
    F32(ArrayD<f32>),
    F64(ArrayD<f64>),
}

impl Tensor {
    pub fn datum_type(&self) -> DatumType {
        match self {
            Tensor::U8(_) => DatumType::U8,
            Tensor::I8(_) => DatumType::I8,
            Tensor::I16(_) => DatumType::I16,
            Tensor::I32(_) => DatumType::I32,
            Tensor::I64(_) => DatumType::I64,
            Tensor::F32(_) => DatumType::F32,
            Tensor::F64(_) => DatumType::F64,
        }
    }

    pub fn shape(&self) -> &[usize] {
        match self {
            Tensor::U8(a) => a.shape(),
            Tensor::I8(a) => a.shape(),
            Tensor::I16(a) => a.shape(),
            Tensor::I32(a) => a.shape(),
            Tensor::I64(a) => a.shape(),
            Tensor::F32(a) => a.shape(),
            Tensor::F64(a) => a.shape(),
        }
    }

    pub fn rank(&self) -> usize {
        self.shape().len()
    }

    pub fn len(&self) -> usize {
        self.shape().iter().product()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn zero_t<T: Datum>(shape: &[usize]) -> Tensor {
        T::into_tensor(ArrayD::<T>::zeros(shape))
    }

    /// Create a tensor filled with zeros.
    pub fn zero_dt(dt: DatumType, shape: &[usize]) -> Tensor {
        dispatch_datum!(Self::zero_t(dt)(shape))
    }

    /// Build a tensor from a shape and a flat, row-major vector of values.
    pub fn from_shape<T: Datum>(shape: &[usize], data: &[T]) -> TfResult<Tensor> {
        let array = ArrayD::from_shape_vec(shape, data.to_vec())?;
        Ok(T::into_tensor(array))
    }

    /// Access the data as an ndarray view, checking the element type.
    pub fn to_array_view<T: Datum>(&self) -> TfResult<ArrayViewD<'_, T>> {
        T::array_view(self).ok_or_else(|| {
            anyhow::format_err!(
                "Tensor datum type error: tensor is {:?}, accessed as {:?}",
                self.datum_type(),
                T::datum_type()
            )
        })
    }

    /// Flat copy of the values in logical order.
    pub fn as_vec<T: Datum>(&self) -> TfResult<Vec<T>> {
        Ok(self.to_array_view::<T>()?.iter().copied().collect())
    }
}

impl fmt::Debug for Tensor {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let shape = self.shape().iter().map(|d| d.to_string()).collect::<Vec<_>>().join(",");
        write!(f, "{},{:?} ", shape, self.datum_type())?;
        match self {
            Tensor::U8(a) => write!(f, "{}", a),
            Tensor::I8(a) => write!(f, "{}", a),
            Tensor::I16(a) => write!(f, "{}", a),
            Tensor::I32(a) => write!(f, "{}", a),
            Tensor::I64(a) => write!(f, "{}", a),
            Tensor::F32(a) => write!(f, "{}", a),
            Tensor::F64(a) => write!(f, "{}", a),
        }
    }
}

/// Convenient conversion to Tensor.
pub trait IntoTensor: Sized {
    /// Convert Self to a Tensor.
    fn into_tensor(self) -> Tensor;
}

/// Convenient conversion to Arc<Tensor>.
pub trait IntoArcTensor: Sized {
    /// Convert Self to a Arc<Tensor>.
    fn into_arc_tensor(self) -> Arc<Tensor>;
}

impl<T: Datum, D: Dimension> IntoTensor for Array<T, D> {
    fn into_tensor(self) -> Tensor {
        T::into_tensor(self.into_dyn())
    }
}

impl<T: Datum, D: Dimension> From<Array<T, D>> for Tensor {
    fn from(it: Array<T, D>) -> Tensor {
        it.into_tensor()
    }
}

impl IntoTensor for Tensor {
    fn into_tensor(self) -> Tensor {
        self
    }
}

impl IntoTensor for Arc<Tensor> {
    fn into_tensor(self) -> Tensor {
        Arc::try_unwrap(self).unwrap_or_else(|t| (*t).clone())
    }
}

impl<D: IntoTensor> IntoArcTensor for D {
    fn into_arc_tensor(self) -> Arc<Tensor> {
        Arc::new(self.into_tensor())
    }
}

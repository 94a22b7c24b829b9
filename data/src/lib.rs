//! Tensors and shape facts shared by the bridge crates.
#[macro_use]
mod macros;

/// A Smallvec instantiation with 4 embeddable values.
///
/// Used for node inputs, tensor dimensions and per-axis pooling parameters.
pub type TVec<T> = smallvec::SmallVec<[T; 4]>;

pub type TfError = anyhow::Error;
pub type TfResult<T> = anyhow::Result<T>;

pub mod prelude {
    pub use crate::datum::{Datum, DatumType};
    pub use crate::dim::{Dim, ShapeFact};
    pub use crate::tensor::{IntoArcTensor, IntoTensor, Tensor};
    pub use crate::tvec;
    pub use crate::TVec;
    pub use crate::{TfError, TfResult};
    pub use crate::dispatch_datum;
}

pub mod internal {
    pub use crate::prelude::*;
    pub use anyhow::{bail, ensure, format_err, Context};
    pub use ndarray as tf_ndarray;
    pub use smallvec as tf_smallvec;
    pub use std::borrow::Cow;
    pub use std::sync::Arc;
}

pub use anyhow;
pub use ndarray;

mod datum;
mod dim;
mod tensor;

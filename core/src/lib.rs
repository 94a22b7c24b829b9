//! # tfbridge-core
//!
//! The TensorFlow-flavoured graph runtime the ONNX bridge emits into.
//!
//! A [`model::TfModel`] is a list of nodes in topological order. Every node
//! wraps one native primitive ([`ops::Op`]) and exposes a single output,
//! addressed by an [`model::OutletId`]. Output facts are inferred as nodes are
//! wired, unknown dimensions propagating as unknown.
//!
//! ```
//! use tfbridge_core::internal::*;
//! use tfbridge_core::ops::cnn::{MaxPool, PaddingMode};
//! use tfbridge_core::ops::nn::DataFormat;
//!
//! let mut model = TfModel::default();
//! let input = model.add_source("input", TypedFact::dt_shape(DatumType::F32, [1, 1, 4, 4])).unwrap();
//! let pool = MaxPool::new(DataFormat::NCHW, tvec!(2, 2), tvec!(2, 2), PaddingMode::Valid);
//! let output = model.wire_node("pool", pool, &[input]).unwrap();
//! model.set_output_outlets(&[output]).unwrap();
//!
//! let data = tfbridge_core::ndarray::Array4::from_shape_fn((1, 1, 4, 4), |(_, _, y, x)| (y * 4 + x) as f32);
//! let result = SimplePlan::new(&model).unwrap().run(tvec!(data.into_tensor())).unwrap();
//! assert_eq!(result[0].as_vec::<f32>().unwrap(), vec![5., 7., 13., 15.]);
//! ```

#[macro_use]
extern crate derive_new;
#[allow(unused_imports)]
#[macro_use]
extern crate log;

pub mod model;
pub mod ops;
pub mod plan;

pub use tfbridge_data::ndarray;

pub mod prelude {
    pub use crate::model::{Node, OutletId, TfModel, TypedFact};
    pub use crate::plan::SimplePlan;
    pub use tfbridge_data::prelude::*;
}

pub mod internal {
    pub use crate::ops::Op;
    pub use crate::prelude::*;
    pub use tfbridge_data::internal::*;
}

#[cfg(test)]
#[allow(dead_code)]
fn setup_test_logger() {
    let _ = env_logger::Builder::from_env("TFBRIDGE_LOG").try_init();
}

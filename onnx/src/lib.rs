//! # tfbridge-onnx
//!
//! Translates ONNX operator nodes into `tfbridge-core` graphs built from
//! TensorFlow-like native primitives.
//!
//! A conversion walks the ONNX nodes in topological order. Each node is
//! handed to the translator registered for its op type, which wires native
//! ops into the target model and records the tensor it produced in the
//! layer registry, keyed by the ONNX output name.
#[allow(unused_imports)]
#[macro_use]
extern crate derive_new;
#[allow(unused_imports)]
#[macro_use]
extern crate log;

pub mod attrs;
pub mod errors;
pub mod graph;
pub mod helpers;
pub mod model;
pub mod ops;
pub mod padding;
pub mod registry;

pub use self::errors::OnnxError;
pub use self::graph::{Attribute, OnnxGraph, OnnxNode, TensorRef, Variable};
pub use self::model::{ConversionContext, ConversionOptions, ConversionResult, Onnx, OnnxOpRegister};
pub use self::registry::{LayerRecord, LayerRegistry};

pub use tfbridge_core::prelude;

/// A framework with every supported operator registered.
pub fn onnx() -> Onnx {
    let mut op_register = OnnxOpRegister::default();
    ops::register_all_ops(&mut op_register);
    Onnx { op_register }
}

#[cfg(test)]
#[allow(dead_code)]
fn setup_test_logger() {
    let _ = env_logger::Builder::from_env("TFBRIDGE_LOG").try_init();
}

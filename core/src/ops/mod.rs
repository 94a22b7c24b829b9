//! Ops
use std::fmt;

use downcast_rs::Downcast;
use dyn_clone::DynClone;

use crate::internal::*;

pub mod array;
pub mod cnn;
pub mod konst;
pub mod nn;
pub mod source;

pub fn check_input_arity(inputs: &[impl fmt::Debug], expected: usize) -> TfResult<()> {
    if inputs.len() != expected {
        bail!("Wrong input number. Op expects {}, node has {}.", expected, inputs.len())
    } else {
        Ok(())
    }
}

/// A native primitive of the target runtime.
///
/// Ops are stateless: they infer their output fact from input facts at
/// wiring time, and compute their output from concrete inputs at run time.
pub trait Op: fmt::Debug + DynClone + Downcast + Send + Sync + 'static {
    fn name(&self) -> Cow<'_, str>;

    /// Short human-readable description of the op attributes.
    fn info(&self) -> TfResult<Vec<String>> {
        Ok(vec![])
    }

    /// Deduce output fact from input facts.
    fn output_fact(&self, inputs: &[&TypedFact]) -> TfResult<TypedFact>;

    /// Compute the output from concrete inputs.
    fn eval(&self, inputs: TVec<Arc<Tensor>>) -> TfResult<Arc<Tensor>>;
}

dyn_clone::clone_trait_object!(Op);
downcast_rs::impl_downcast!(Op);

impl<O: Op> From<O> for Box<dyn Op> {
    fn from(it: O) -> Box<dyn Op> {
        Box::new(it)
    }
}

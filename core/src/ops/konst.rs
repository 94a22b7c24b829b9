use crate::internal::*;

/// A constant tensor, `tf.constant` and `tf.zeros` alike.
#[derive(Debug, Clone, new, PartialEq)]
pub struct Const(pub Arc<Tensor>);

impl Op for Const {
    fn name(&self) -> Cow<'_, str> {
        "Const".into()
    }

    fn info(&self) -> TfResult<Vec<String>> {
        Ok(vec![format!("{:?}", self.0)])
    }

    fn output_fact(&self, inputs: &[&TypedFact]) -> TfResult<TypedFact> {
        super::check_input_arity(inputs, 0)?;
        Ok(TypedFact::from(&*self.0))
    }

    fn eval(&self, _inputs: TVec<Arc<Tensor>>) -> TfResult<Arc<Tensor>> {
        Ok(self.0.clone())
    }
}

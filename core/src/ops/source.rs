use crate::internal::*;

/// A graph input placeholder.
///
/// Sources are never evaluated: the plan feeds them from the run inputs.
#[derive(Debug, Clone, new, PartialEq)]
pub struct Source {
    pub fact: TypedFact,
}

impl Op for Source {
    fn name(&self) -> Cow<'_, str> {
        "Source".into()
    }

    fn info(&self) -> TfResult<Vec<String>> {
        Ok(vec![format!("{:?}", self.fact)])
    }

    fn output_fact(&self, inputs: &[&TypedFact]) -> TfResult<TypedFact> {
        super::check_input_arity(inputs, 0)?;
        Ok(self.fact.clone())
    }

    fn eval(&self, _inputs: TVec<Arc<Tensor>>) -> TfResult<Arc<Tensor>> {
        bail!("Source should not get evaluated")
    }
}

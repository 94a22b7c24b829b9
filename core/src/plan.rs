use std::borrow::Borrow;

use crate::internal::*;
use crate::ops::source::Source;

/// Evaluation plan for a model: runs the nodes needed for the requested
/// outputs, in model order, on concrete inputs.
#[derive(Debug, Clone)]
pub struct SimplePlan<M: Borrow<TfModel>> {
    pub model: M,
    pub outputs: Vec<OutletId>,
    pub order: Vec<usize>,
    /// For each node, the last step of `order` its value is needed at.
    flush_lists: Vec<TVec<usize>>,
}

impl<M: Borrow<TfModel>> SimplePlan<M> {
    /// This contructor returns a plan that will compute all the model default outputs in one pass.
    pub fn new(model: M) -> TfResult<SimplePlan<M>> {
        let outputs = model.borrow().output_outlets().to_vec();
        Self::new_for_outputs(model, &outputs)
    }

    /// This contructor returns a plan that will compute all specified outputs in one pass.
    pub fn new_for_outputs(model: M, outputs: &[OutletId]) -> TfResult<SimplePlan<M>> {
        ensure!(!outputs.is_empty(), "Model has no output to compute");
        let graph = model.borrow();
        let mut needed = vec![false; graph.nodes().len()];
        for o in outputs {
            graph.outlet_fact(*o)?;
            needed[o.node] = true;
        }
        // nodes only refer to previous nodes, so one backward sweep is enough
        for id in (0..needed.len()).rev() {
            if needed[id] {
                for i in &graph.nodes()[id].inputs {
                    needed[i.node] = true;
                }
            }
        }
        let order: Vec<usize> = (0..needed.len()).filter(|&n| needed[n]).collect();
        let mut last_use = vec![0; graph.nodes().len()];
        for (step, &n) in order.iter().enumerate() {
            for i in &graph.nodes()[n].inputs {
                last_use[i.node] = step;
            }
        }
        for o in outputs {
            last_use[o.node] = order.len();
        }
        let mut flush_lists: Vec<TVec<usize>> = vec![tvec!(); order.len()];
        for &n in &order {
            if last_use[n] < order.len() {
                flush_lists[last_use[n]].push(n);
            }
        }
        Ok(SimplePlan { model, outputs: outputs.to_vec(), order, flush_lists })
    }

    pub fn model(&self) -> &TfModel {
        self.model.borrow()
    }

    /// Run the plan. `inputs` are matched with the model inputs, in order.
    pub fn run(&self, inputs: TVec<Tensor>) -> TfResult<TVec<Arc<Tensor>>> {
        let model = self.model();
        let sources = model.input_outlets();
        ensure!(
            inputs.len() == sources.len(),
            "Wrong number of inputs: model has {}, got {}",
            sources.len(),
            inputs.len()
        );
        let mut values: Vec<Option<Arc<Tensor>>> = vec![None; model.nodes().len()];
        for (outlet, input) in sources.iter().zip(inputs) {
            let fact = model.outlet_fact(*outlet)?;
            ensure!(
                fact.matches(&input),
                "Input for {} mismatches: expected {:?}, got {:?}",
                model.node(outlet.node)?.name,
                fact,
                input
            );
            values[outlet.node] = Some(input.into_arc_tensor());
        }
        for (step, &n) in self.order.iter().enumerate() {
            let node = model.node(n)?;
            if !node.op_is::<Source>() {
                let inputs = node
                    .inputs
                    .iter()
                    .map(|i| {
                        values[i.node]
                            .clone()
                            .ok_or_else(|| format_err!("Value for {} not computed", i))
                    })
                    .collect::<TfResult<TVec<_>>>()?;
                let output = node
                    .op
                    .eval(inputs)
                    .with_context(|| format!("Evaluating {:?}", node))?;
                ensure!(
                    node.output.matches(&output),
                    "Output of {:?} is {:?}, expected {:?}",
                    node,
                    output,
                    node.output
                );
                values[n] = Some(output);
            } else if values[n].is_none() {
                bail!("Source {:?} was not fed", node);
            }
            for &flush in &self.flush_lists[step] {
                values[flush] = None;
            }
        }
        self.outputs
            .iter()
            .map(|o| values[o.node].clone().ok_or_else(|| format_err!("Output {} not computed", o)))
            .collect()
    }
}

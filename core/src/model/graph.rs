use crate::internal::*;
use crate::ops::konst::Const;
use crate::ops::source::Source;
use std::collections::HashSet;

/// Main model class
///
/// Nodes are stored in topological order: a node can only be wired to
/// outlets of nodes already in the model.
#[derive(Clone, Debug, Default)]
pub struct TfModel {
    /// all nodes in the model
    nodes: Vec<Node>,
    /// model inputs
    inputs: Vec<OutletId>,
    /// model outputs
    outputs: Vec<OutletId>,
    names: HashSet<String>,
}

impl TfModel {
    /// Add a graph input placeholder.
    pub fn add_source(&mut self, name: impl Into<String>, fact: TypedFact) -> TfResult<OutletId> {
        let id = self.wire_node(name, Source::new(fact), &[])?;
        self.inputs.push(id);
        Ok(id)
    }

    /// Add a constant tensor.
    pub fn add_const(&mut self, name: impl Into<String>, v: impl IntoArcTensor) -> TfResult<OutletId> {
        self.wire_node(name, Const::new(v.into_arc_tensor()), &[])
    }

    /// Append a node computing `op` over `inputs`, returning its outlet.
    ///
    /// The output fact is inferred from the input facts.
    pub fn wire_node(
        &mut self,
        name: impl Into<String>,
        op: impl Into<Box<dyn Op>>,
        inputs: &[OutletId],
    ) -> TfResult<OutletId> {
        let name = name.into();
        let op = op.into();
        if self.names.contains(&name) {
            bail!("Duplicate name {}", name);
        }
        let facts = inputs.iter().map(|o| self.outlet_fact(*o)).collect::<TfResult<TVec<_>>>()?;
        let output = op
            .output_fact(&facts)
            .with_context(|| format!("wiring {} ({}), determining output fact", name, op.name()))?;
        let id = self.nodes.len();
        trace!("wired #{} \"{}\" {} {:?} -> {:?}", id, name, op.name(), facts, output);
        drop(facts);
        self.names.insert(name.clone());
        self.nodes.push(Node { id, name, inputs: inputs.into(), op, output });
        Ok(OutletId::new(id, 0))
    }

    /// Find a name not used by any node yet, derived from `prefix`.
    pub fn unique_name(&self, prefix: &str) -> String {
        if !self.names.contains(prefix) {
            return prefix.to_string();
        }
        (1..)
            .map(|i| format!("{}.{}", prefix, i))
            .find(|n| !self.names.contains(n))
            .unwrap_or_else(|| prefix.to_string())
    }

    pub fn outlet_fact(&self, outlet: OutletId) -> TfResult<&TypedFact> {
        ensure!(outlet.slot == 0, "Invalid outlet {}", outlet);
        Ok(&self.node(outlet.node)?.output)
    }

    pub fn node(&self, id: usize) -> TfResult<&Node> {
        self.nodes.get(id).ok_or_else(|| format_err!("Invalid node id {}", id))
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn node_by_name(&self, name: &str) -> TfResult<&Node> {
        self.nodes
            .iter()
            .find(|n| n.name == name)
            .ok_or_else(|| format_err!("No node found for name: \"{}\"", name))
    }

    /// Nodes whose operation is of type O, in model order.
    pub fn nodes_with_op<O: Op>(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter().filter(|n| n.op_is::<O>())
    }

    pub fn input_outlets(&self) -> &[OutletId] {
        &self.inputs
    }

    pub fn output_outlets(&self) -> &[OutletId] {
        &self.outputs
    }

    pub fn set_output_outlets(&mut self, outputs: &[OutletId]) -> TfResult<()> {
        for o in outputs {
            self.outlet_fact(*o)?;
        }
        self.outputs = outputs.to_vec();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::cnn::{MaxPool, PaddingMode};
    use crate::ops::nn::DataFormat;

    #[test]
    fn wire_infers_facts() {
        let mut model = TfModel::default();
        let input = model
            .add_source("input", TypedFact::dt_shape(DatumType::F32, [1, 3, 8, 8]))
            .unwrap();
        let pool = MaxPool::new(DataFormat::NCHW, tvec!(2, 2), tvec!(2, 2), PaddingMode::Valid);
        let out = model.wire_node("pool", pool, &[input]).unwrap();
        assert_eq!(
            model.outlet_fact(out).unwrap(),
            &TypedFact::dt_shape(DatumType::F32, [1, 3, 4, 4])
        );
        assert!(model.node_by_name("pool").unwrap().op_is::<MaxPool>());
        assert_eq!(model.input_outlets(), &[input]);
    }

    #[test]
    fn rejects_duplicate_names() {
        let mut model = TfModel::default();
        model.add_const("c", tfbridge_data::ndarray::arr1(&[1f32])).unwrap();
        assert!(model.add_const("c", tfbridge_data::ndarray::arr1(&[1f32])).is_err());
        assert_eq!(model.unique_name("c"), "c.1");
        assert_eq!(model.unique_name("d"), "d");
    }

    #[test]
    fn rejects_dangling_inputs() {
        let mut model = TfModel::default();
        let pool = MaxPool::new(DataFormat::NCHW, tvec!(2, 2), tvec!(2, 2), PaddingMode::Valid);
        assert!(model.wire_node("pool", pool, &[OutletId::new(12, 0)]).is_err());
    }
}

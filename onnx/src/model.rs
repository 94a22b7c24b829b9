use std::collections::HashMap;

use tfbridge_core::internal::*;
use tfbridge_core::ops::nn::DataFormat;

use crate::errors::OnnxError;
use crate::graph::{OnnxGraph, OnnxNode, Variable};
use crate::registry::{LayerRecord, LayerRegistry};

/// Translates one ONNX node, wiring the target model and recording the
/// node output in the layer registry.
pub type OpTranslator = fn(&mut ConversionContext, &OnnxNode) -> TfResult<()>;

#[derive(Clone, Default)]
pub struct OnnxOpRegister(pub HashMap<String, OpTranslator>);

impl OnnxOpRegister {
    pub fn insert(&mut self, s: &'static str, translator: OpTranslator) {
        self.0.insert(s.into(), translator);
    }

    pub fn get(&self, op_type: &str) -> Option<&OpTranslator> {
        self.0.get(op_type)
    }
}

/// Knobs of a conversion run.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ConversionOptions {
    /// Layout used by every native primitive of the produced graph, and
    /// expected from its inputs.
    pub data_format: DataFormat,
}

impl ConversionOptions {
    pub fn with_data_format(self, data_format: DataFormat) -> ConversionOptions {
        ConversionOptions { data_format, ..self }
    }
}

/// State of one conversion run: the target model under construction and
/// the registry of already translated tensors.
#[derive(Clone, Debug, Default)]
pub struct ConversionContext {
    pub model: TfModel,
    pub layers: LayerRegistry,
    pub options: ConversionOptions,
}

impl ConversionContext {
    pub fn new(options: ConversionOptions) -> ConversionContext {
        ConversionContext { options, ..ConversionContext::default() }
    }

    /// Add a graph input as a model source, registered with op type "Input".
    pub fn add_input(&mut self, input: &Variable) -> TfResult<OutletId> {
        let Some(dt) = input.datum_type else {
            bail!("Graph input {} has no element type", input.name)
        };
        let fact = TypedFact::dt_shape(dt, input.shape.clone());
        trace!("Input: {} is a source ({:?})", input.name, fact);
        let outlet = self.model.add_source(&*input.name, fact)?;
        self.layers.insert(
            &*input.name,
            LayerRecord::new("Input".into(), input.shape.clone(), dt, outlet),
        );
        Ok(outlet)
    }

    /// Wire a node named after `name`, made unique if needed.
    pub fn wire_node(
        &mut self,
        name: &str,
        op: impl Into<Box<dyn Op>>,
        inputs: &[OutletId],
    ) -> TfResult<OutletId> {
        let name = self.model.unique_name(name);
        self.model.wire_node(name, op, inputs)
    }

    /// Record `outlet` as the tensor produced for the node first output.
    ///
    /// Shape and type are the ones the ONNX graph declares for that output,
    /// falling back to the produced fact when the graph leaves them out.
    pub fn register_output(&mut self, node: &OnnxNode, outlet: OutletId) -> TfResult<()> {
        let Some(output) = node.outputs.first() else {
            return node.bail("expected at least one output");
        };
        let fact = self.model.outlet_fact(outlet)?.clone();
        let shape = if output.shape.rank().is_some() { output.shape.clone() } else { fact.shape.clone() };
        if let (Some(declared), Some(produced)) = (output.shape.as_concrete(), fact.shape.as_concrete()) {
            if declared != produced {
                warn!(
                    "Node {} ({}): declared output shape {:?} differs from produced {:?}",
                    node.name, node.op_type, declared, produced
                );
            }
        }
        let datum_type = output.datum_type.unwrap_or(fact.datum_type);
        self.layers.insert(&*output.name, LayerRecord::new(node.op_type.clone(), shape, datum_type, outlet));
        Ok(())
    }
}

/// Everything a conversion run produced.
#[derive(Clone, Debug)]
pub struct ConversionResult {
    pub model: TfModel,
    pub layers: LayerRegistry,
}

#[derive(Clone, Default)]
pub struct Onnx {
    pub op_register: OnnxOpRegister,
}

impl Onnx {
    /// Translate a single node in an ongoing conversion.
    pub fn translate_node(&self, ctx: &mut ConversionContext, node: &OnnxNode) -> TfResult<()> {
        let Some(translator) = self.op_register.get(&node.op_type) else {
            return Err(OnnxError::UnsupportedOp { node: node.name.clone(), op: node.op_type.clone() }.into());
        };
        trace!("Translating node {} ({})", node.name, node.op_type);
        translator(ctx, node)
    }

    pub fn convert(&self, graph: &OnnxGraph) -> TfResult<ConversionResult> {
        self.convert_with_options(graph, ConversionOptions::default())
    }

    /// Translate a whole graph. Nodes must come in topological order.
    pub fn convert_with_options(
        &self,
        graph: &OnnxGraph,
        options: ConversionOptions,
    ) -> TfResult<ConversionResult> {
        let mut ctx = ConversionContext::new(options);
        for input in &graph.inputs {
            ctx.add_input(input)?;
        }
        for node in &graph.nodes {
            self.translate_node(&mut ctx, node)
                .with_context(|| format!("Translating node {} ({})", node.name, node.op_type))?;
        }
        let outputs = graph
            .outputs
            .iter()
            .map(|name| {
                ctx.layers.get(name).map(|r| r.outlet).ok_or_else(|| {
                    TfError::from(OnnxError::UnknownTensor {
                        node: "<graph outputs>".into(),
                        tensor: name.clone(),
                    })
                })
            })
            .collect::<TfResult<Vec<_>>>()?;
        ctx.model.set_output_outlets(&outputs)?;
        debug!("Converted {} ONNX nodes into {} native ops", graph.nodes.len(), ctx.model.nodes().len());
        Ok(ConversionResult { model: ctx.model, layers: ctx.layers })
    }
}

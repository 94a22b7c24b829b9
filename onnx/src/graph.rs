//! In-memory ONNX graph: nodes, their attributes, and the tensors they
//! consume and produce.
use std::fmt;

use tfbridge_core::internal::*;

/// An ONNX node attribute value.
#[derive(Clone, Debug, PartialEq)]
pub enum Attribute {
    Int(i64),
    Ints(Vec<i64>),
    Float(f32),
    Floats(Vec<f32>),
    String(String),
    Strings(Vec<String>),
    Tensor(Tensor),
}

/// Attribute kinds, as ONNX names them in `AttributeProto.type`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum AttributeType {
    Int,
    Ints,
    Float,
    Floats,
    String,
    Strings,
    Tensor,
}

impl fmt::Display for AttributeType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match self {
            AttributeType::Int => "int",
            AttributeType::Float => "float",
            AttributeType::Tensor => "tensor",
            AttributeType::String => "string",
            AttributeType::Ints => "list of ints",
            AttributeType::Floats => "list of floats",
            AttributeType::Strings => "list of strings",
        })
    }
}

impl Attribute {
    pub fn attribute_type(&self) -> AttributeType {
        match self {
            Attribute::Int(_) => AttributeType::Int,
            Attribute::Ints(_) => AttributeType::Ints,
            Attribute::Float(_) => AttributeType::Float,
            Attribute::Floats(_) => AttributeType::Floats,
            Attribute::String(_) => AttributeType::String,
            Attribute::Strings(_) => AttributeType::Strings,
            Attribute::Tensor(_) => AttributeType::Tensor,
        }
    }
}

impl From<i64> for Attribute {
    fn from(v: i64) -> Attribute {
        Attribute::Int(v)
    }
}

impl From<Vec<i64>> for Attribute {
    fn from(v: Vec<i64>) -> Attribute {
        Attribute::Ints(v)
    }
}

impl From<&[i64]> for Attribute {
    fn from(v: &[i64]) -> Attribute {
        Attribute::Ints(v.to_vec())
    }
}

impl From<f32> for Attribute {
    fn from(v: f32) -> Attribute {
        Attribute::Float(v)
    }
}

impl From<&str> for Attribute {
    fn from(v: &str) -> Attribute {
        Attribute::String(v.to_string())
    }
}

impl From<Tensor> for Attribute {
    fn from(v: Tensor) -> Attribute {
        Attribute::Tensor(v)
    }
}

/// A tensor produced at run time: a graph input or a node output.
///
/// Type and shape come from ONNX value infos and may be partially or
/// entirely unknown.
#[derive(Clone, Debug, PartialEq, new)]
pub struct Variable {
    pub name: String,
    pub datum_type: Option<DatumType>,
    pub shape: ShapeFact,
}

impl Variable {
    /// A variable nothing is known about.
    pub fn named(name: impl Into<String>) -> Variable {
        Variable { name: name.into(), datum_type: None, shape: ShapeFact::unknown() }
    }

    pub fn typed(name: impl Into<String>, dt: DatumType, shape: impl Into<ShapeFact>) -> Variable {
        Variable { name: name.into(), datum_type: Some(dt), shape: shape.into() }
    }
}

/// A node input: either a value owned by the graph (initializer or
/// constant) or a reference to a variable produced upstream.
#[derive(Clone, Debug, PartialEq)]
pub enum TensorRef {
    Constant { name: String, value: Tensor },
    Variable(Variable),
}

impl TensorRef {
    pub fn constant(name: impl Into<String>, value: impl IntoTensor) -> TensorRef {
        TensorRef::Constant { name: name.into(), value: value.into_tensor() }
    }

    pub fn name(&self) -> &str {
        match self {
            TensorRef::Constant { name, .. } => name,
            TensorRef::Variable(v) => &v.name,
        }
    }
}

impl From<Variable> for TensorRef {
    fn from(v: Variable) -> TensorRef {
        TensorRef::Variable(v)
    }
}

#[derive(Clone, Debug, PartialEq, Default)]
pub struct OnnxNode {
    pub name: String,
    pub op_type: String,
    pub attributes: Vec<(String, Attribute)>,
    pub inputs: Vec<TensorRef>,
    pub outputs: Vec<Variable>,
}

impl OnnxNode {
    pub fn new(name: impl Into<String>, op_type: impl Into<String>) -> OnnxNode {
        OnnxNode { name: name.into(), op_type: op_type.into(), ..OnnxNode::default() }
    }

    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<Attribute>) -> OnnxNode {
        let name = name.into();
        self.attributes.retain(|(n, _)| *n != name);
        self.attributes.push((name, value.into()));
        self
    }

    pub fn with_input(mut self, input: impl Into<TensorRef>) -> OnnxNode {
        self.inputs.push(input.into());
        self
    }

    pub fn with_output(mut self, output: Variable) -> OnnxNode {
        self.outputs.push(output);
        self
    }

    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|(n, _)| n == name).map(|(_, a)| a)
    }
}

/// A topologically sorted ONNX graph.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct OnnxGraph {
    pub inputs: Vec<Variable>,
    pub nodes: Vec<OnnxNode>,
    pub outputs: Vec<String>,
}

impl OnnxGraph {
    pub fn with_input(mut self, input: Variable) -> OnnxGraph {
        self.inputs.push(input);
        self
    }

    pub fn with_node(mut self, node: OnnxNode) -> OnnxGraph {
        self.nodes.push(node);
        self
    }

    pub fn with_output(mut self, name: impl Into<String>) -> OnnxGraph {
        self.outputs.push(name.into());
        self
    }
}

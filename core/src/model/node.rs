use crate::internal::*;
use std::fmt;

/// A Node in a model.
///
/// Every node wraps one operator and produces a single output.
#[derive(Clone)]
pub struct Node {
    /// node id in the model
    ///
    /// Caution: this id will not be persistent during networks transformation
    pub id: usize,
    /// name of the node
    ///
    /// This will usually come from the importing framework.
    pub name: String,
    /// node inputs
    pub inputs: TVec<OutletId>,
    /// the operator
    pub op: Box<dyn Op>,
    /// type and shape of the output
    pub output: TypedFact,
}

impl fmt::Debug for Node {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        write!(fmt, "#{} \"{}\" {}", self.id, self.name, self.op.name())
    }
}

impl Node {
    /// Access the op of the node
    pub fn op(&self) -> &dyn Op {
        &*self.op
    }

    /// Try to downcast the node operation to O.
    pub fn op_as<O: Op>(&self) -> Option<&O> {
        self.op().downcast_ref::<O>()
    }

    /// Check if the node operation is of type O.
    pub fn op_is<O: Op>(&self) -> bool {
        self.op_as::<O>().is_some()
    }
}

/// A tensor produced by a node, designated by node id and output slot.
///
/// Nodes all have one output, so `slot` is always 0 for now. It is kept so
/// that outlets read the same as in multi-output graphs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, new)]
pub struct OutletId {
    pub node: usize,
    pub slot: usize,
}

impl fmt::Display for OutletId {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        write!(fmt, "{}/{}>", self.node, self.slot)
    }
}

impl From<usize> for OutletId {
    fn from(node: usize) -> OutletId {
        OutletId::new(node, 0)
    }
}

//! ## Models and graphs
//!
//! A model is a list of nodes in topological order. Each node consumes
//! outlets of previous nodes and produces exactly one output. The output
//! facts are computed by the node operator when the node is wired, so the
//! model always knows the (possibly partial) type and shape of every
//! tensor it produces.
mod fact;
mod graph;
mod node;

pub use self::fact::TypedFact;
pub use self::graph::TfModel;
pub use self::node::{Node, OutletId};

//! Typed conversion errors.
//!
//! They travel as `anyhow::Error` like every other error, and can be
//! recovered with `downcast_ref::<OnnxError>()`.

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum OnnxError {
    #[error("Node {node}: required attribute '{attribute}' is missing")]
    MissingAttribute { node: String, attribute: String },

    #[error("Node {node}: input tensor '{tensor}' was not produced by any previous node")]
    UnknownTensor { node: String, tensor: String },

    #[error("Node {node}: unsupported operator {op}")]
    UnsupportedOp { node: String, op: String },
}

//! Conversion helpers shared by operator translators: input resolution,
//! pooling padding and dilation removal.
use tfbridge_core::internal::*;
use tfbridge_core::ops::array::{Pad, PadValue, PoolPad, WindowGather};
use tfbridge_core::ops::cnn::{pool_pads, PaddingSpec};

use crate::errors::OnnxError;
use crate::graph::{OnnxNode, TensorRef};
use crate::model::ConversionContext;
use crate::padding::PoolPadding;

/// Turn a node input into a tensor of the target model.
///
/// Constants are wired as `Const` nodes. Variables must have been produced
/// by a previously translated node, or be graph inputs.
pub fn resolve_input(ctx: &mut ConversionContext, node: &OnnxNode, input: &TensorRef) -> TfResult<OutletId> {
    match input {
        TensorRef::Constant { name, value } => {
            let name = ctx.model.unique_name(name);
            ctx.model.add_const(name, value.clone())
        }
        TensorRef::Variable(v) => ctx.layers.get(&v.name).map(|r| r.outlet).ok_or_else(|| {
            OnnxError::UnknownTensor { node: node.name.clone(), tensor: v.name.clone() }.into()
        }),
    }
}

/// Explicit pads, in ONNX layout (`[begins..., ends...]`), equivalent to a
/// symbolic SAME policy over a known spatial shape.
pub fn calc_pads_same_pooling(
    in_spatial_shape: &[usize],
    kernel_shape: &[usize],
    strides: &[usize],
    dilations: &[usize],
    padding: &PaddingSpec,
) -> TfResult<TVec<usize>> {
    ensure!(
        matches!(padding, PaddingSpec::SameUpper | PaddingSpec::SameLower),
        "Expected a SAME padding policy, got {:?}",
        padding
    );
    let computed = padding.compute(in_spatial_shape, kernel_shape, dilations, strides)?;
    Ok(computed.iter().map(|c| c.pad_before).chain(computed.iter().map(|c| c.pad_after)).collect())
}

fn spatial_axis(ctx: &ConversionContext, spatial_size: usize, ix: usize) -> TfResult<usize> {
    let shape = ctx.options.data_format.shape(tvec![Dim::Any; spatial_size + 2])?;
    Ok(shape.h_axis() + ix)
}

/// Pad `input` ahead of a valid-padded pooling.
///
/// Explicit pads are applied as given, grown at the end in `ceil_mode` so
/// that a floor-rounded pooling yields the ceil-rounded output length.
/// Symbolic policies are resolved against the input spatial shape: right
/// away when it is known, at run time otherwise. No node is added when
/// the padding is zero.
#[allow(clippy::too_many_arguments)]
pub fn pad_input(
    ctx: &mut ConversionContext,
    name: &str,
    input: OutletId,
    kernel_shape: &[usize],
    ceil_mode: bool,
    strides: &[usize],
    dilations: &[usize],
    padding: &PoolPadding,
    value: PadValue,
) -> TfResult<OutletId> {
    let fmt = ctx.options.data_format;
    let spec = padding.to_spec(ceil_mode);
    let fact = ctx.model.outlet_fact(input)?.clone();
    let pads = match (&spec, fact.shape.as_concrete()) {
        (PaddingSpec::ExplicitOnnxPool(before, after, false), _) => {
            let spatial: TVec<(usize, usize)> = before.iter().copied().zip(after.iter().copied()).collect();
            Some(fmt.from_n_c_hw_values((0, 0), (0, 0), &spatial))
        }
        (_, Some(shape)) => Some(pool_pads(fmt, &shape, kernel_shape, strides, dilations, &spec)?),
        (_, None) => None,
    };
    match pads {
        Some(pads) if pads.iter().all(|&(b, a)| b == 0 && a == 0) => {
            trace!("{}: no padding needed", name);
            Ok(input)
        }
        Some(pads) => {
            debug!("{}: static padding {:?} with {:?}", name, pads, value);
            ctx.wire_node(name, Pad::new(pads, value), &[input])
        }
        None => {
            debug!("{}: input shape {:?} unknown, padding {:?} at run time", name, fact.shape, spec);
            let op = PoolPad::new(fmt, kernel_shape.into(), strides.into(), dilations.into(), spec, value);
            ctx.wire_node(name, op, &[input])
        }
    }
}

/// Gather the elements a strided, dilated window touches, so that a
/// pooling with window and stride equal to `kernel_shape` and no dilation
/// over the result matches the original pooling (valid padding).
pub fn remove_dilations(
    ctx: &mut ConversionContext,
    name: &str,
    input: OutletId,
    kernel_shape: &[usize],
    strides: &[usize],
    dilations: &[usize],
) -> TfResult<OutletId> {
    ensure!(
        strides.len() == kernel_shape.len() && dilations.len() == kernel_shape.len(),
        "Kernel shape {:?}, strides {:?} and dilations {:?} must have the same length",
        kernel_shape,
        strides,
        dilations
    );
    let mut wire = input;
    for ix in 0..kernel_shape.len() {
        if strides[ix] == kernel_shape[ix] && dilations[ix] == 1 {
            continue;
        }
        let axis = spatial_axis(ctx, kernel_shape.len(), ix)?;
        let op = WindowGather::new(axis, kernel_shape[ix], strides[ix], dilations[ix]);
        wire = ctx.wire_node(&format!("{}.{}", name, ix), op, &[wire])?;
    }
    Ok(wire)
}

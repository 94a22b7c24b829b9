//! ONNX `MaxPool`, lowered to native pooling primitives.
//!
//! Translation runs in two steps. The padding strategy decides whether the
//! input gets padded ahead of the pooling or the pooling pads by itself.
//! Then the first lowering whose predicate holds on the pooling geometry
//! wires the pooling itself.
use tfbridge_core::internal::*;
use tfbridge_core::ops::array::PadValue;
use tfbridge_core::ops::cnn::{
    Dilation2D, MaxPool, PaddingMode, PaddingSpec, Pool, PoolSpec, PoolingType,
};
use tfbridge_core::ops::nn::DataFormat;

use crate::attrs::OptionExt;
use crate::graph::OnnxNode;
use crate::helpers::{calc_pads_same_pooling, pad_input, remove_dilations, resolve_input};
use crate::model::ConversionContext;
use crate::padding::{AutoPad, PoolPadding};

/// MaxPool attributes, defaults resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaxPoolConfig {
    pub kernel_shape: TVec<usize>,
    pub strides: TVec<usize>,
    pub dilations: TVec<usize>,
    pub padding: PoolPadding,
    pub ceil_mode: bool,
    pub count_include_pad: bool,
}

impl MaxPoolConfig {
    pub fn from_node(node: &OnnxNode) -> TfResult<MaxPoolConfig> {
        let kernel_shape: TVec<usize> = node.get_attr_tvec("kernel_shape")?;
        let spatial = kernel_shape.len();
        node.expect_attr(
            "kernel_shape",
            spatial > 0 && kernel_shape.iter().all(|&k| k > 0),
            "non-empty list of positive ints",
        )?;
        let strides = Self::geometry(node, "strides", spatial)?;
        let dilations = Self::geometry(node, "dilations", spatial)?;
        let auto_pad = node
            .get_attr_opt::<&str>("auto_pad")?
            .and_try(|s| node.check_value("auto_pad", s.parse::<AutoPad>()))?
            .unwrap_or_default();
        let padding = if auto_pad == AutoPad::NotSet {
            let pads: TVec<usize> = node.get_attr_opt_tvec("pads")?.unwrap_or_else(|| tvec!(0; 2 * spatial));
            node.expect_attr("pads", pads.len() == 2 * spatial, || {
                format!("{} ints for {} spatial axes, got {:?}", 2 * spatial, spatial, pads)
            })?;
            PoolPadding::Explicit(pads)
        } else {
            PoolPadding::Auto(auto_pad)
        };
        if node.get_attr_opt::<i64>("storage_order")?.unwrap_or(0) != 0 {
            debug!("{}: storage_order only affects Indices, ignored", node.name);
        }
        Ok(MaxPoolConfig {
            kernel_shape,
            strides,
            dilations,
            padding,
            ceil_mode: node.get_attr_opt("ceil_mode")?.unwrap_or(false),
            count_include_pad: node.get_attr_opt("count_include_pad")?.unwrap_or(false),
        })
    }

    fn geometry(node: &OnnxNode, attr: &str, spatial: usize) -> TfResult<TVec<usize>> {
        let values: TVec<usize> = node.get_attr_opt_tvec(attr)?.unwrap_or_else(|| tvec!(1; spatial));
        node.expect_attr(attr, values.len() == spatial && values.iter().all(|&v| v > 0), || {
            format!("{} positive ints, got {:?}", spatial, values)
        })?;
        Ok(values)
    }

    pub fn spatial_size(&self) -> usize {
        self.kernel_shape.len()
    }

    /// Padding to translate with.
    ///
    /// Non-zero explicit pads equal to the ones SAME_UPPER yields on this
    /// input become SAME_UPPER. The input shape must be fully known for
    /// that, explicit pads are kept as they are otherwise.
    pub fn normalized_padding(&self, data_format: DataFormat, input: &TypedFact) -> TfResult<PoolPadding> {
        let PoolPadding::Explicit(pads) = &self.padding else { return Ok(self.padding.clone()) };
        if self.padding.is_zero() {
            return Ok(self.padding.clone());
        }
        let Some(shape) = input.shape.as_concrete() else {
            trace!("Input shape {:?} is not fully known, keeping explicit pads", input.shape);
            return Ok(self.padding.clone());
        };
        let shape = data_format.shape(shape)?;
        if shape.hw_rank() != self.spatial_size() {
            return Ok(self.padding.clone());
        }
        let same = calc_pads_same_pooling(
            shape.hw_dims(),
            &self.kernel_shape,
            &self.strides,
            &self.dilations,
            &PaddingSpec::SameUpper,
        )?;
        if &same == pads {
            debug!("Explicit pads {:?} are SAME_UPPER on input {:?}", pads, input.shape);
            Ok(PoolPadding::Auto(AutoPad::SameUpper))
        } else {
            Ok(self.padding.clone())
        }
    }
}

/// Where padding happens: in a zero-filled pad ahead of the pooling, or in
/// the pooling primitive itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaddingStrategy {
    PrePad,
    Native(PaddingMode),
}

impl PaddingStrategy {
    pub fn for_padding(padding: &PoolPadding, count_include_pad: bool) -> PaddingStrategy {
        match padding {
            PoolPadding::Explicit(_) | PoolPadding::Auto(AutoPad::SameLower) => PaddingStrategy::PrePad,
            PoolPadding::Auto(AutoPad::SameUpper) if count_include_pad => PaddingStrategy::PrePad,
            PoolPadding::Auto(AutoPad::SameUpper) => PaddingStrategy::Native(PaddingMode::Same),
            PoolPadding::Auto(AutoPad::NotSet | AutoPad::Valid) => PaddingStrategy::Native(PaddingMode::Valid),
        }
    }

    /// Padding mode of the pooling primitive.
    pub fn mode(&self) -> PaddingMode {
        match self {
            PaddingStrategy::PrePad => PaddingMode::Valid,
            PaddingStrategy::Native(mode) => *mode,
        }
    }
}

/// Native subgraphs a MaxPool can be lowered to, by decreasing priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Lowering {
    /// Grayscale dilation with a zero structuring element: 2-D, dilated.
    Dilation2D,
    /// `Pool(MAX)` when strides are all 1, `MaxPool` when dilations are.
    NativePool,
    /// Gather the windows, then pool them with stride equal to the kernel.
    DilationRemoval,
}

impl Lowering {
    pub const ORDER: [Lowering; 3] = [Lowering::Dilation2D, Lowering::NativePool, Lowering::DilationRemoval];

    pub fn applies(&self, config: &MaxPoolConfig) -> bool {
        let ones = |v: &[usize]| v.iter().all(|&x| x == 1);
        match self {
            Lowering::Dilation2D => config.spatial_size() == 2 && !ones(&config.dilations),
            Lowering::NativePool => {
                config.spatial_size() < 4 && (ones(&config.strides) || ones(&config.dilations))
            }
            Lowering::DilationRemoval => true,
        }
    }

    pub fn for_config(config: &MaxPoolConfig) -> Lowering {
        Self::ORDER.into_iter().find(|l| l.applies(config)).unwrap_or(Lowering::DilationRemoval)
    }

    /// Wire the pooling of `input`, the final node being named `name`.
    pub fn wire(
        &self,
        ctx: &mut ConversionContext,
        name: &str,
        input: OutletId,
        config: &MaxPoolConfig,
        mode: PaddingMode,
    ) -> TfResult<OutletId> {
        let fmt = ctx.options.data_format;
        match self {
            Lowering::Dilation2D => {
                let fact = ctx.model.outlet_fact(input)?.clone();
                let depth = match fact.shape.dims() {
                    Some(dims) if dims.len() == 4 => fmt.shape(dims)?.c().as_known(),
                    _ => None,
                };
                let depth = depth.unwrap_or_else(|| {
                    debug!("{}: channel count unknown, broadcasting a depth 1 structuring element", name);
                    1
                });
                let filter_shape = [config.kernel_shape[0], config.kernel_shape[1], depth];
                let filter_name = ctx.model.unique_name(&format!("{}.filter", name));
                let filter = ctx.model.add_const(filter_name, Tensor::zero_dt(fact.datum_type, &filter_shape))?;
                let strides = fmt.from_n_c_hw_values(1, 1, &config.strides);
                let rates = fmt.from_n_c_hw_values(1, 1, &config.dilations);
                let op = Dilation2D::new(fmt, &strides, &rates, mode)?;
                ctx.wire_node(name, op, &[input, filter])
            }
            Lowering::NativePool => {
                if config.strides.iter().all(|&s| s == 1) {
                    let spec = PoolSpec::new(
                        fmt,
                        config.kernel_shape.clone(),
                        config.strides.clone(),
                        config.dilations.clone(),
                        mode,
                    );
                    ctx.wire_node(name, Pool::new(PoolingType::Max, spec), &[input])
                } else {
                    let op = MaxPool::new(fmt, config.kernel_shape.clone(), config.strides.clone(), mode);
                    ctx.wire_node(name, op, &[input])
                }
            }
            Lowering::DilationRemoval => {
                let mut wire = input;
                if mode == PaddingMode::Same {
                    // padded cells never win, like the native Same pools
                    wire = pad_input(
                        ctx,
                        &format!("{}.same", name),
                        wire,
                        &config.kernel_shape,
                        false,
                        &config.strides,
                        &config.dilations,
                        &PoolPadding::Auto(AutoPad::SameUpper),
                        PadValue::Lowest,
                    )?;
                }
                wire = remove_dilations(
                    ctx,
                    &format!("{}.windows", name),
                    wire,
                    &config.kernel_shape,
                    &config.strides,
                    &config.dilations,
                )?;
                let spec = PoolSpec::new(
                    fmt,
                    config.kernel_shape.clone(),
                    config.kernel_shape.clone(),
                    tvec!(1; config.spatial_size()),
                    PaddingMode::Valid,
                );
                ctx.wire_node(name, Pool::new(PoolingType::Max, spec), &[wire])
            }
        }
    }
}

pub fn max_pool(ctx: &mut ConversionContext, node: &OnnxNode) -> TfResult<()> {
    node.expect(node.inputs.len() == 1, "exactly one input")?;
    let config = MaxPoolConfig::from_node(node)?;
    if node.outputs.len() > 1 {
        warn!("{}: MaxPool Indices output is not supported, only the values are produced", node.name);
    }
    let input = resolve_input(ctx, node, &node.inputs[0])?;
    let input_fact = ctx.model.outlet_fact(input)?.clone();
    if let Some(rank) = input_fact.rank() {
        node.expect(rank == config.spatial_size() + 2, || {
            format!("a rank {} input for kernel {:?}, got {:?}", config.spatial_size() + 2, config.kernel_shape, input_fact)
        })?;
    }
    let padding = config.normalized_padding(ctx.options.data_format, &input_fact)?;
    let strategy = PaddingStrategy::for_padding(&padding, config.count_include_pad);
    let lowering = Lowering::for_config(&config);
    debug!("{}: padding {:?} as {:?}, lowered as {:?}", node.name, padding, strategy, lowering);
    let mut wire = input;
    if strategy == PaddingStrategy::PrePad {
        wire = pad_input(
            ctx,
            &format!("{}.pad", node.name),
            wire,
            &config.kernel_shape,
            config.ceil_mode,
            &config.strides,
            &config.dilations,
            &padding,
            PadValue::Constant(0.0),
        )?;
    }
    let output = lowering.wire(ctx, &node.name, wire, &config, strategy.mode())?;
    ctx.register_output(node, output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::OnnxError;

    fn node(kernel: &[i64]) -> OnnxNode {
        OnnxNode::new("pool", "MaxPool").with_attr("kernel_shape", kernel)
    }

    fn config(kernel: &[i64], strides: &[i64], dilations: &[i64]) -> MaxPoolConfig {
        MaxPoolConfig::from_node(&node(kernel).with_attr("strides", strides).with_attr("dilations", dilations))
            .unwrap()
    }

    #[test]
    fn defaults() {
        let config = MaxPoolConfig::from_node(&node(&[3, 2])).unwrap();
        assert_eq!(config.strides, tvec!(1, 1));
        assert_eq!(config.dilations, tvec!(1, 1));
        assert_eq!(config.padding, PoolPadding::Explicit(tvec!(0, 0, 0, 0)));
        assert!(!config.ceil_mode);
        assert!(!config.count_include_pad);
    }

    #[test]
    fn auto_pad_wins_over_pads() {
        let node = node(&[3]).with_attr("auto_pad", "SAME_LOWER").with_attr("pads", &[1i64, 1][..]);
        assert_eq!(MaxPoolConfig::from_node(&node).unwrap().padding, PoolPadding::Auto(AutoPad::SameLower));
        let node = self::node(&[3]).with_attr("auto_pad", "NOTSET").with_attr("pads", &[1i64, 1][..]);
        assert_eq!(MaxPoolConfig::from_node(&node).unwrap().padding, PoolPadding::Explicit(tvec!(1, 1)));
    }

    #[test]
    fn missing_kernel_shape() {
        let err = MaxPoolConfig::from_node(&OnnxNode::new("pool", "MaxPool")).unwrap_err();
        assert_eq!(
            err.downcast_ref::<OnnxError>(),
            Some(&OnnxError::MissingAttribute { node: "pool".into(), attribute: "kernel_shape".into() })
        );
    }

    #[test]
    fn invalid_attributes() {
        assert!(MaxPoolConfig::from_node(&node(&[3, 3]).with_attr("strides", &[1i64][..])).is_err());
        assert!(MaxPoolConfig::from_node(&node(&[3]).with_attr("dilations", &[0i64][..])).is_err());
        assert!(MaxPoolConfig::from_node(&node(&[3]).with_attr("pads", &[1i64, 1, 1][..])).is_err());
        assert!(MaxPoolConfig::from_node(&node(&[3]).with_attr("auto_pad", "SAME")).is_err());
        assert!(MaxPoolConfig::from_node(&node(&[3]).with_attr("ceil_mode", 2i64)).is_err());
        assert!(MaxPoolConfig::from_node(&node(&[])).is_err());
    }

    #[test]
    fn same_upper_pads_are_normalized() {
        let config = MaxPoolConfig::from_node(&node(&[3, 3]).with_attr("pads", &[1i64, 1, 1, 1][..])).unwrap();
        let input = TypedFact::dt_shape(DatumType::F32, [1, 3, 10, 10]);
        assert_eq!(
            config.normalized_padding(DataFormat::NCHW, &input).unwrap(),
            PoolPadding::Auto(AutoPad::SameUpper)
        );
        let partial = TypedFact::dt_shape(DatumType::F32, ShapeFact::from_dims([Dim::Any, 3.into(), 10.into(), 10.into()]));
        assert_eq!(config.normalized_padding(DataFormat::NCHW, &partial).unwrap(), config.padding);
    }

    #[test]
    fn other_pads_are_kept() {
        // SAME_LOWER pads on an even input
        let config = MaxPoolConfig::from_node(&node(&[2]).with_attr("pads", &[1i64, 0][..])).unwrap();
        let input = TypedFact::dt_shape(DatumType::F32, [1, 1, 4]);
        assert_eq!(config.normalized_padding(DataFormat::NCHW, &input).unwrap(), config.padding);
        let zeros = MaxPoolConfig::from_node(&node(&[1])).unwrap();
        assert_eq!(zeros.normalized_padding(DataFormat::NCHW, &input).unwrap(), zeros.padding);
    }

    #[test]
    fn padding_strategies() {
        use PaddingStrategy::*;
        let explicit = PoolPadding::Explicit(tvec!(0, 1));
        assert_eq!(PaddingStrategy::for_padding(&explicit, false), PrePad);
        assert_eq!(PaddingStrategy::for_padding(&PoolPadding::Auto(AutoPad::SameLower), false), PrePad);
        assert_eq!(PaddingStrategy::for_padding(&PoolPadding::Auto(AutoPad::SameUpper), true), PrePad);
        assert_eq!(
            PaddingStrategy::for_padding(&PoolPadding::Auto(AutoPad::SameUpper), false),
            Native(PaddingMode::Same)
        );
        assert_eq!(
            PaddingStrategy::for_padding(&PoolPadding::Auto(AutoPad::Valid), true),
            Native(PaddingMode::Valid)
        );
        assert_eq!(PrePad.mode(), PaddingMode::Valid);
    }

    #[test]
    fn lowering_priorities() {
        assert_eq!(Lowering::for_config(&config(&[2, 2], &[1, 1], &[2, 2])), Lowering::Dilation2D);
        assert_eq!(Lowering::for_config(&config(&[2, 2], &[2, 2], &[2, 2])), Lowering::Dilation2D);
        assert_eq!(Lowering::for_config(&config(&[2, 2], &[2, 2], &[1, 1])), Lowering::NativePool);
        assert_eq!(Lowering::for_config(&config(&[2], &[1], &[3])), Lowering::NativePool);
        assert_eq!(Lowering::for_config(&config(&[2, 2, 2], &[2, 2, 2], &[2, 2, 2])), Lowering::DilationRemoval);
        assert_eq!(Lowering::for_config(&config(&[2; 4], &[1; 4], &[1; 4])), Lowering::DilationRemoval);
    }

    #[test]
    fn some_lowering_always_applies() {
        for spatial in 1..=5usize {
            for strides in [1i64, 2] {
                for dilations in [1i64, 3] {
                    let config =
                        config(&vec![2; spatial], &vec![strides; spatial], &vec![dilations; spatial]);
                    let matching = Lowering::ORDER.iter().filter(|l| l.applies(&config)).count();
                    assert!(matching >= 1);
                    assert!(Lowering::for_config(&config).applies(&config));
                }
            }
        }
    }
}

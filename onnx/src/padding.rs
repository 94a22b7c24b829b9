//! ONNX pooling padding descriptors.
use std::str::FromStr;

use tfbridge_core::internal::*;
use tfbridge_core::ops::cnn::PaddingSpec;

/// The `auto_pad` attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AutoPad {
    #[default]
    NotSet,
    SameUpper,
    SameLower,
    Valid,
}

impl FromStr for AutoPad {
    type Err = String;

    fn from_str(s: &str) -> Result<AutoPad, String> {
        match s {
            "NOTSET" => Ok(AutoPad::NotSet),
            "SAME_UPPER" => Ok(AutoPad::SameUpper),
            "SAME_LOWER" => Ok(AutoPad::SameLower),
            "VALID" => Ok(AutoPad::Valid),
            _ => Err(s.to_string()),
        }
    }
}

/// Padding of a pooling node: explicit amounts, or a symbolic policy.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PoolPadding {
    /// `[x1_begin, x2_begin, ..., x1_end, x2_end, ...]`
    Explicit(TVec<usize>),
    Auto(AutoPad),
}

impl PoolPadding {
    pub fn is_zero(&self) -> bool {
        matches!(self, PoolPadding::Explicit(pads) if pads.iter().all(|&p| p == 0))
    }

    /// Per-axis padding rule. `ceil_mode` only applies to explicit pads.
    pub fn to_spec(&self, ceil_mode: bool) -> PaddingSpec {
        match self {
            PoolPadding::Explicit(pads) => {
                let len = pads.len() / 2;
                PaddingSpec::ExplicitOnnxPool(
                    pads.iter().copied().take(len).collect(),
                    pads.iter().copied().skip(len).collect(),
                    ceil_mode,
                )
            }
            PoolPadding::Auto(AutoPad::SameUpper) => PaddingSpec::SameUpper,
            PoolPadding::Auto(AutoPad::SameLower) => PaddingSpec::SameLower,
            PoolPadding::Auto(AutoPad::NotSet | AutoPad::Valid) => PaddingSpec::Valid,
        }
    }
}

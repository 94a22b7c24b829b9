//! Dimensions and shapes that may be only partially known at conversion
//! time.
use crate::TfResult;
use std::fmt;

mod shape;

pub use self::shape::ShapeFact;

/// One tensor dimension.
///
/// ONNX value infos carry either a concrete size, a named parameter
/// (`dim_param`, like "batch"), or nothing at all.
#[derive(Clone, PartialEq, Eq, Hash, Default)]
pub enum Dim {
    Val(usize),
    Sym(String),
    #[default]
    Any,
}

impl Dim {
    pub fn sym(name: impl Into<String>) -> Dim {
        Dim::Sym(name.into())
    }

    pub fn is_known(&self) -> bool {
        matches!(self, Dim::Val(_))
    }

    pub fn as_known(&self) -> Option<usize> {
        match self {
            Dim::Val(v) => Some(*v),
            _ => None,
        }
    }

    /// Convert to regular integer.
    pub fn to_usize(&self) -> TfResult<usize> {
        self.as_known().ok_or_else(|| anyhow::format_err!("Dimension {} is not known", self))
    }

    /// Apply `f` to a known dimension. Unknown dimensions stay unknown,
    /// named ones lose their name as the result is a different quantity.
    pub fn map_known(&self, f: impl FnOnce(usize) -> TfResult<usize>) -> TfResult<Dim> {
        match self {
            Dim::Val(v) => Ok(Dim::Val(f(*v)?)),
            _ => Ok(Dim::Any),
        }
    }
}

impl From<usize> for Dim {
    fn from(v: usize) -> Dim {
        Dim::Val(v)
    }
}

impl fmt::Display for Dim {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Dim::Val(v) => write!(f, "{}", v),
            Dim::Sym(s) => write!(f, "{}", s),
            Dim::Any => write!(f, "?"),
        }
    }
}

impl fmt::Debug for Dim {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn map_known_drops_symbols() {
        assert_eq!(Dim::Val(4).map_known(|d| Ok(d * 2)).unwrap(), Dim::Val(8));
        assert_eq!(Dim::sym("batch").map_known(|d| Ok(d * 2)).unwrap(), Dim::Any);
        assert_eq!(Dim::Any.map_known(|d| Ok(d)).unwrap(), Dim::Any);
    }

    #[test]
    fn to_usize() {
        assert_eq!(Dim::Val(3).to_usize().unwrap(), 3);
        assert!(Dim::sym("N").to_usize().is_err());
    }
}

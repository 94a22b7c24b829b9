use super::Dim;
use crate::TVec;
use itertools::Itertools;
use std::fmt;

/// Partially known shape of a tensor.
///
/// The rank itself may be unknown (`dims` is `None`), or some of the
/// dimensions may be unknown or symbolic.
#[derive(Clone, PartialEq, Eq, Hash, Default)]
pub struct ShapeFact {
    dims: Option<TVec<Dim>>,
}

impl ShapeFact {
    /// A shape nothing is known about, not even the rank.
    pub fn unknown() -> ShapeFact {
        ShapeFact { dims: None }
    }

    pub fn from_dims<D: Into<Dim>>(dims: impl IntoIterator<Item = D>) -> ShapeFact {
        ShapeFact { dims: Some(dims.into_iter().map(Into::into).collect()) }
    }

    /// A shape of known rank where every dimension is unknown.
    pub fn of_rank(rank: usize) -> ShapeFact {
        ShapeFact { dims: Some(tvec![Dim::Any; rank]) }
    }

    pub fn rank(&self) -> Option<usize> {
        self.dims.as_ref().map(|d| d.len())
    }

    pub fn dims(&self) -> Option<&[Dim]> {
        self.dims.as_deref()
    }

    /// Extended dimension of the i-th axis. `Dim::Any` when unknown.
    pub fn dim(&self, i: usize) -> Dim {
        self.dims.as_ref().and_then(|d| d.get(i).cloned()).unwrap_or(Dim::Any)
    }

    /// True when rank and every dimension are known integers.
    pub fn is_fully_defined(&self) -> bool {
        self.as_concrete().is_some()
    }

    /// Shape as plain integers, if fully defined.
    pub fn as_concrete(&self) -> Option<TVec<usize>> {
        self.dims.as_ref()?.iter().map(Dim::as_known).collect()
    }
}

impl From<&[usize]> for ShapeFact {
    fn from(it: &[usize]) -> ShapeFact {
        ShapeFact::from_dims(it.iter().copied())
    }
}

impl<const N: usize> From<[usize; N]> for ShapeFact {
    fn from(it: [usize; N]) -> ShapeFact {
        ShapeFact::from_dims(it)
    }
}

impl From<TVec<Dim>> for ShapeFact {
    fn from(dims: TVec<Dim>) -> ShapeFact {
        ShapeFact { dims: Some(dims) }
    }
}

impl fmt::Debug for ShapeFact {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        match &self.dims {
            Some(dims) => write!(fmt, "{}", dims.iter().join(",")),
            None => write!(fmt, ".."),
        }
    }
}

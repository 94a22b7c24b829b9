//! Type information about a tensor flowing in a model.
use crate::internal::*;
use std::fmt;

/// Element type and partially known shape of a tensor.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct TypedFact {
    pub datum_type: DatumType,
    pub shape: ShapeFact,
}

impl TypedFact {
    pub fn dt_shape(datum_type: DatumType, shape: impl Into<ShapeFact>) -> TypedFact {
        TypedFact { datum_type, shape: shape.into() }
    }

    pub fn rank(&self) -> Option<usize> {
        self.shape.rank()
    }

    /// Check a concrete tensor against this fact. Unknown dimensions match
    /// anything.
    pub fn matches(&self, t: &Tensor) -> bool {
        if t.datum_type() != self.datum_type {
            return false;
        }
        match self.shape.dims() {
            None => true,
            Some(dims) => {
                dims.len() == t.rank()
                    && dims
                        .iter()
                        .zip(t.shape())
                        .all(|(d, &v)| d.as_known().map(|k| k == v).unwrap_or(true))
            }
        }
    }
}

impl From<&Tensor> for TypedFact {
    fn from(t: &Tensor) -> TypedFact {
        TypedFact::dt_shape(t.datum_type(), t.shape())
    }
}

impl fmt::Debug for TypedFact {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        write!(fmt, "{:?},{:?}", self.shape, self.datum_type)
    }
}

use crate::internal::*;
use std::fmt;

/// Memory layout of a pooled tensor: batch axis first, channel axis either
/// right after it or last.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
pub enum DataFormat {
    #[default]
    NCHW,
    NHWC,
}

impl DataFormat {
    pub fn shape<D, S>(&self, shape: S) -> TfResult<BaseDataShape<D, S>>
    where
        D: Clone + fmt::Debug,
        S: AsRef<[D]> + fmt::Debug,
    {
        ensure!(
            shape.as_ref().len() >= 3,
            "{:?} tensor needs a batch, a channel and at least one spatial axis, got {:?}",
            self,
            shape
        );
        Ok(BaseDataShape { fmt: *self, shape, _phantom: std::marker::PhantomData })
    }

    pub fn from_n_c_hw<D, S>(&self, n: D, c: D, hw: S) -> TfResult<BaseDataShape<D, TVec<D>>>
    where
        D: Clone + fmt::Debug,
        S: AsRef<[D]> + fmt::Debug,
    {
        let mut me = tvec!(n);
        if *self == DataFormat::NCHW {
            me.push(c.clone());
        }
        me.extend(hw.as_ref().iter().cloned());
        if *self == DataFormat::NHWC {
            me.push(c);
        }
        self.shape(me)
    }

    /// Lay out one value per axis from a batch value, a channel value and
    /// spatial values.
    pub fn from_n_c_hw_values<T: Clone>(&self, n: T, c: T, hw: &[T]) -> TVec<T> {
        let mut me = tvec!(n);
        if *self == DataFormat::NCHW {
            me.push(c.clone());
        }
        me.extend(hw.iter().cloned());
        if *self == DataFormat::NHWC {
            me.push(c);
        }
        me
    }
}

pub type DataShape = BaseDataShape<usize, TVec<usize>>;
pub type SymDataShape = BaseDataShape<Dim, TVec<Dim>>;

#[derive(Clone, Debug, PartialEq)]
pub struct BaseDataShape<D, S>
where
    D: Clone + fmt::Debug,
    S: AsRef<[D]> + fmt::Debug,
{
    pub fmt: DataFormat,
    pub shape: S,
    _phantom: std::marker::PhantomData<D>,
}

impl<D, S> BaseDataShape<D, S>
where
    D: Clone + fmt::Debug,
    S: AsRef<[D]> + fmt::Debug,
{
    #[inline]
    pub fn rank(&self) -> usize {
        self.shape.as_ref().len()
    }

    #[inline]
    pub fn hw_rank(&self) -> usize {
        self.rank() - 2
    }

    #[inline]
    pub fn n_axis(&self) -> usize {
        0
    }

    #[inline]
    pub fn c_axis(&self) -> usize {
        match self.fmt {
            DataFormat::NHWC => self.rank() - 1,
            DataFormat::NCHW => 1,
        }
    }

    #[inline]
    pub fn h_axis(&self) -> usize {
        match self.fmt {
            DataFormat::NHWC => 1,
            DataFormat::NCHW => 2,
        }
    }

    #[inline]
    pub fn hw_axes(&self) -> std::ops::Range<usize> {
        self.h_axis()..self.h_axis() + self.hw_rank()
    }

    #[inline]
    pub fn n(&self) -> &D {
        &self.shape.as_ref()[self.n_axis()]
    }

    #[inline]
    pub fn c(&self) -> &D {
        &self.shape.as_ref()[self.c_axis()]
    }

    #[inline]
    pub fn hw_dims(&self) -> &[D] {
        &self.shape.as_ref()[self.hw_axes()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nchw_axes() {
        let shape = DataFormat::NCHW.shape(tvec!(1usize, 3, 8, 9)).unwrap();
        assert_eq!(shape.c_axis(), 1);
        assert_eq!(shape.hw_axes(), 2..4);
        assert_eq!(shape.hw_dims(), &[8, 9]);
        assert_eq!(*shape.c(), 3);
    }

    #[test]
    fn nhwc_axes() {
        let shape = DataFormat::NHWC.shape(tvec!(1usize, 4, 5, 6, 3)).unwrap();
        assert_eq!(shape.hw_rank(), 3);
        assert_eq!(shape.c_axis(), 4);
        assert_eq!(shape.hw_dims(), &[4, 5, 6]);
    }

    #[test]
    fn from_n_c_hw() {
        let shape = DataFormat::NHWC.from_n_c_hw(Dim::Any, Dim::Val(3), [Dim::Val(7)]).unwrap();
        assert_eq!(shape.shape.as_slice(), &[Dim::Any, Dim::Val(7), Dim::Val(3)]);
        assert_eq!(DataFormat::NCHW.from_n_c_hw_values(1, 1, &[2, 3]).as_slice(), &[1, 1, 2, 3]);
    }

    #[test]
    fn needs_spatial_axes() {
        assert!(DataFormat::NCHW.shape(tvec!(1usize, 3)).is_err());
    }
}

//! Element types a `Tensor` can hold.
use crate::tensor::Tensor;
use crate::TfResult;
use ndarray::{ArrayD, ArrayViewD};
use num_traits::{Bounded, NumCast, Zero};
use std::fmt;

/// Element types accepted by the pooling primitives.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Ord, PartialOrd)]
pub enum DatumType {
    U8,
    I8,
    I16,
    I32,
    I64,
    F32,
    F64,
}

impl DatumType {
    pub fn is_unsigned(&self) -> bool {
        matches!(self, DatumType::U8)
    }

    pub fn is_signed(&self) -> bool {
        matches!(self, DatumType::I8 | DatumType::I16 | DatumType::I32 | DatumType::I64)
    }

    pub fn is_float(&self) -> bool {
        matches!(self, DatumType::F32 | DatumType::F64)
    }

    pub fn is_integer(&self) -> bool {
        self.is_signed() || self.is_unsigned()
    }

    #[inline]
    pub fn size_of(&self) -> usize {
        dispatch_datum!(std::mem::size_of(self)())
    }
}

impl fmt::Display for DatumType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

impl std::str::FromStr for DatumType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "U8" | "u8" | "uint8" => Ok(DatumType::U8),
            "I8" | "i8" | "int8" => Ok(DatumType::I8),
            "I16" | "i16" | "int16" => Ok(DatumType::I16),
            "I32" | "i32" | "int32" => Ok(DatumType::I32),
            "I64" | "i64" | "int64" => Ok(DatumType::I64),
            "F32" | "f32" | "float32" | "float" => Ok(DatumType::F32),
            "F64" | "f64" | "float64" | "double" => Ok(DatumType::F64),
            _ => anyhow::bail!("Unknown type {}", s),
        }
    }
}

pub trait Datum:
    Copy + Send + Sync + fmt::Debug + fmt::Display + PartialOrd + Zero + NumCast + 'static
{
    fn name() -> &'static str;
    fn datum_type() -> DatumType;
    /// Smallest representable value: the identity of `max`.
    fn lowest() -> Self;
    fn array_view(t: &Tensor) -> Option<ArrayViewD<'_, Self>>;
    fn into_tensor(array: ArrayD<Self>) -> Tensor;

    fn cast_from_f64(v: f64) -> TfResult<Self> {
        <Self as NumCast>::from(v).ok_or_else(|| {
            anyhow::format_err!("{} can not be represented as {:?}", v, Self::datum_type())
        })
    }
}

macro_rules! datum {
    ($t:ty, $v:ident, $lowest:expr) => {
        impl Datum for $t {
            fn name() -> &'static str {
                stringify!($t)
            }

            fn datum_type() -> DatumType {
                DatumType::$v
            }

            fn lowest() -> $t {
                $lowest
            }

            fn array_view(t: &Tensor) -> Option<ArrayViewD<'_, $t>> {
                match t {
                    Tensor::$v(a) => Some(a.view()),
                    _ => None,
                }
            }

            fn into_tensor(array: ArrayD<$t>) -> Tensor {
                Tensor::$v(array)
            }
        }
    };
}

datum!(u8, U8, <u8 as Bounded>::min_value());
datum!(i8, I8, <i8 as Bounded>::min_value());
datum!(i16, I16, <i16 as Bounded>::min_value());
datum!(i32, I32, <i32 as Bounded>::min_value());
datum!(i64, I64, <i64 as Bounded>::min_value());
datum!(f32, F32, f32::NEG_INFINITY);
datum!(f64, F64, f64::NEG_INFINITY);

mod dilation2d;
mod maxpool;
mod padding;
mod patches;
mod pools;

pub use self::dilation2d::Dilation2D;
pub use self::maxpool::MaxPool;
pub use self::padding::{pool_pads, ComputedPaddedDim, PaddingMode, PaddingSpec};
pub use self::patches::{Patch, PatchSpec};
pub use self::pools::{Pool, PoolSpec, PoolingType};

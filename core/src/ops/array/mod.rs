//! # Operators on arrays
mod pad;
mod window_gather;

pub use self::pad::{Pad, PadValue, PoolPad};
pub use self::window_gather::WindowGather;

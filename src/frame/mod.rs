//! Pixel buffers and the fixed-point math used to address them.

mod buffer;
pub mod fixed_point;

pub use buffer::{FrameBuffer, PixelStorage, StorageTooSmall};
pub use fixed_point::Fixed;

//! Capture devices and the ring of frame slots they fill.
//!
//! - [`DeviceRingBuffer`] tracks slot ownership over any [`CaptureDevice`]
//! - [`V4l2Device`] is the Linux backend (memory-mapped streaming I/O)

mod errors;
mod ring;
#[cfg(target_os = "linux")]
mod v4l2;

pub use errors::DeviceError;
pub use ring::{CaptureDevice, DequeuedSlot, DeviceRingBuffer, FilledSlot, SlotState};
#[cfg(target_os = "linux")]
pub use v4l2::{StreamFormat, V4l2Device};

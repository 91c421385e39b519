//! glyphcam library crate.
//!
//! Webcam frames in, terminal glyphs out. The modules are public so the
//! binary and the integration tests can assemble a pipeline from them.

pub mod cli;
pub mod config;
pub mod decode;
pub mod device;
pub mod frame;
pub mod pipeline;
pub mod render;
pub mod transform;

//! RGB to single-channel reduction by plain channel average.

use std::num::NonZeroU32;

use super::errors::TransformError;
use super::partition::PartitionedExecutor;
use crate::frame::FrameBuffer;

const STAGE: &str = "rgb_to_grey";

/// Color-space transform from 3-channel RGB to 1-channel intensity.
#[derive(Debug, Clone, Copy)]
pub struct GreyReducer {
    workers: NonZeroU32,
}

impl GreyReducer {
    pub fn new(workers: NonZeroU32) -> Self {
        Self { workers }
    }

    /// Write `floor((R + G + B) / 3)` for every pixel of `src` into `dst`.
    ///
    /// Sizes and depths are checked once, before any worker starts.
    ///
    /// # Errors
    /// * `TransformError::SizeMismatch` - `src` and `dst` differ in width or height
    /// * `TransformError::DepthMismatch` - `src` is not RGB or `dst` is not single-channel
    /// * `TransformError::ReadOnlyDestination` - `dst` borrows device memory
    /// * `TransformError::ResourceExhaustion` - a worker thread could not be spawned
    pub fn reduce(
        &self,
        src: &FrameBuffer<'_>,
        dst: &mut FrameBuffer<'_>,
    ) -> Result<(), TransformError> {
        if !src.same_size(dst) {
            return Err(TransformError::SizeMismatch {
                stage: STAGE,
                src_width: src.width(),
                src_height: src.height(),
                dst_width: dst.width(),
                dst_height: dst.height(),
            });
        }
        if src.depth() != 3 {
            return Err(TransformError::DepthMismatch {
                stage: STAGE,
                buffer: "src",
                actual: src.depth(),
                expected: 3,
            });
        }
        if dst.depth() != 1 {
            return Err(TransformError::DepthMismatch {
                stage: STAGE,
                buffer: "dst",
                actual: dst.depth(),
                expected: 1,
            });
        }

        let width = dst.width();
        let height = dst.height();
        let stride = dst.stride();
        let out = dst
            .as_bytes_mut()
            .ok_or(TransformError::ReadOnlyDestination { stage: STAGE })?;

        PartitionedExecutor::new(STAGE, self.workers).run(out, stride, height, |range, rows| {
            for (row, y) in rows.chunks_exact_mut(stride).zip(range.start..range.end()) {
                for (x, grey) in (0..width).zip(row.iter_mut()) {
                    let rgb = src.channels(x, y);
                    // average, truncated
                    *grey = ((rgb[0] as u32 + rgb[1] as u32 + rgb[2] as u32) / 3) as u8;
                }
            }
        })
    }
}

//! Nearest-neighbor resize in 16.16 fixed point.

use std::num::NonZeroU32;

use super::errors::TransformError;
use super::partition::PartitionedExecutor;
use crate::frame::{Fixed, FrameBuffer};

const STAGE: &str = "resize_image";

/// Geometric transform from any source size to the destination's size.
#[derive(Debug, Clone, Copy)]
pub struct Resampler {
    workers: NonZeroU32,
}

impl Resampler {
    pub fn new(workers: NonZeroU32) -> Self {
        Self { workers }
    }

    /// Fill `dst` by sampling channel 0 of `src`.
    ///
    /// Dimensions are not validated: both buffers must be non-empty, and the
    /// resolved source coordinates are not clamped. [`check_scale`] tells
    /// whether a geometry is safe.
    ///
    /// # Errors
    /// * `TransformError::ReadOnlyDestination` - `dst` borrows device memory
    /// * `TransformError::ResourceExhaustion` - a worker thread could not be spawned
    pub fn resample(
        &self,
        src: &FrameBuffer<'_>,
        dst: &mut FrameBuffer<'_>,
    ) -> Result<(), TransformError> {
        let dst_width = dst.width();
        let dst_height = dst.height();
        let dst_depth = dst.depth() as usize;
        let stride = dst.stride();
        let out = dst
            .as_bytes_mut()
            .ok_or(TransformError::ReadOnlyDestination { stage: STAGE })?;

        PartitionedExecutor::new(STAGE, self.workers).run(out, stride, dst_height, |range, rows| {
            let x_ratio = Fixed::from_int(src.width() as i32).div_int(dst_width as i32);
            let y_ratio = Fixed::from_int(src.height() as i32).div_int(dst_height as i32);

            for (row, y) in rows.chunks_exact_mut(stride).zip(range.start..range.end()) {
                let src_y = nearest(Fixed::from_int(y as i32).mul(y_ratio));
                for x in 0..dst_width {
                    let src_x = nearest(Fixed::from_int(x as i32).mul(x_ratio));
                    row[x as usize * dst_depth] = src.pixel(src_x, src_y);
                }
            }
        })
    }
}

/// Check that resampling `src` to `dst` stays inside the source.
///
/// `resample` doesn't clamp. Up to 2x per axis every rounded coordinate is
/// at most `side - 1`; past that the last column or row rounds onto the edge.
///
/// # Errors
/// * `TransformError::ScaleOutOfRange` - a side is zero or more than doubles
pub fn check_scale(
    src_width: u32,
    src_height: u32,
    dst_width: u32,
    dst_height: u32,
) -> Result<(), TransformError> {
    let fits = |src: u32, dst: u32| src > 0 && dst > 0 && u64::from(dst) <= 2 * u64::from(src);
    if fits(src_width, dst_width) && fits(src_height, dst_height) {
        Ok(())
    } else {
        Err(TransformError::ScaleOutOfRange {
            stage: STAGE,
            src_width,
            src_height,
            dst_width,
            dst_height,
        })
    }
}

/// Pick between `ceil(p)` and `floor(p)`.
///
/// `ceil` is taken only when it is strictly closer. Because `ceil` of an
/// integral value is one unit above it, exact grid positions and exact
/// halves both resolve to `floor`.
pub fn nearest(p: Fixed) -> u32 {
    let up = p.ceil();
    let down = p.floor();
    let chosen = if up - p < -(down - p) { up } else { down };
    chosen.to_int() as u32
}

//! Parallel per-frame transforms.
//!
//! Both stages fan out over destination rows with [`PartitionedExecutor`]
//! and return only after every worker has joined:
//!
//! 1. **Grey reduction** - RGB to single-channel average ([`GreyReducer`])
//! 2. **Resampling** - fixed-point nearest neighbor resize ([`Resampler`])

mod errors;
mod grey;
mod partition;
mod resample;

pub use errors::TransformError;
pub use grey::GreyReducer;
pub use partition::{PartitionPlan, PartitionedExecutor, RowRange};
pub use resample::{check_scale, nearest, Resampler};

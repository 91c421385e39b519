//! Error types for the parallel transform stages.

use std::io;

/// Errors returned by [`GreyReducer`](super::GreyReducer),
/// [`Resampler`](super::Resampler) and the executor underneath them.
#[derive(Debug, thiserror::Error)]
pub enum TransformError {
    #[error("{stage}: sizes don't match (src {src_width}x{src_height}, dst {dst_width}x{dst_height})")]
    SizeMismatch {
        stage: &'static str,
        src_width: u32,
        src_height: u32,
        dst_width: u32,
        dst_height: u32,
    },

    #[error("{stage}: {buffer} has depth {actual}, expected {expected}")]
    DepthMismatch {
        stage: &'static str,
        buffer: &'static str,
        actual: u8,
        expected: u8,
    },

    #[error("{stage}: cannot scale {src_width}x{src_height} to {dst_width}x{dst_height} (at most 2x per axis, no empty sides)")]
    ScaleOutOfRange {
        stage: &'static str,
        src_width: u32,
        src_height: u32,
        dst_width: u32,
        dst_height: u32,
    },

    #[error("{stage}: destination borrows device memory and cannot be written")]
    ReadOnlyDestination { stage: &'static str },

    #[error("{stage}: failed to spawn worker thread: {source}")]
    ResourceExhaustion {
        stage: &'static str,
        #[source]
        source: io::Error,
    },

    #[error("{stage}: worker {worker} panicked")]
    WorkerPanicked { stage: &'static str, worker: usize },
}

impl TransformError {
    /// True for contract violations between buffers (size, depth, ownership).
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            TransformError::SizeMismatch { .. }
                | TransformError::DepthMismatch { .. }
                | TransformError::ScaleOutOfRange { .. }
                | TransformError::ReadOnlyDestination { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_size_mismatch_display() {
        let err = TransformError::SizeMismatch {
            stage: "rgb_to_grey",
            src_width: 4,
            src_height: 3,
            dst_width: 2,
            dst_height: 3,
        };
        let msg = format!("{}", err);
        assert!(msg.contains("rgb_to_grey"));
        assert!(msg.contains("4x3"));
        assert!(msg.contains("2x3"));
        assert!(err.is_precondition());
    }

    #[test]
    fn test_resource_exhaustion_is_not_precondition() {
        let err = TransformError::ResourceExhaustion {
            stage: "resize",
            source: io::Error::new(io::ErrorKind::OutOfMemory, "no threads left"),
        };
        assert!(!err.is_precondition());
        assert!(format!("{}", err).contains("no threads left"));
    }
}

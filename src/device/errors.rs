//! Error types for capture devices and the slot ring.

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use super::ring::SlotState;

/// Errors that can occur while negotiating with or streaming from a device.
#[derive(Debug, thiserror::Error)]
pub enum DeviceError {
    #[error("Cannot identify '{}': {source}", path.display())]
    NotFound {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{} is no device", path.display())]
    NotCharDevice { path: PathBuf },

    #[error("Cannot open '{}': {source}", path.display())]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{} is no V4L2 device: {source}", path.display())]
    NotV4l2 {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{} is no video capture device", path.display())]
    NoCapture { path: PathBuf },

    #[error("{} does not support streaming i/o", path.display())]
    NoStreaming { path: PathBuf },

    #[error("Insufficient buffer memory: device granted {granted} buffer(s), need at least 2")]
    InsufficientBuffers { granted: usize },

    /// A system call failed. `op` names it, e.g. `VIDIOC_DQBUF`.
    #[error("{op} error: {source}")]
    Io {
        op: &'static str,
        #[source]
        source: io::Error,
    },

    #[error("select timeout: no frame within {0:?}")]
    Timeout(Duration),

    #[error("slot {index} is {actual:?}, expected {expected:?}")]
    SlotState {
        index: usize,
        actual: SlotState,
        expected: SlotState,
    },

    #[error("device returned slot {index}, but only {count} exist")]
    UnknownSlot { index: usize, count: usize },
}

impl DeviceError {
    pub(crate) fn io(op: &'static str, source: io::Error) -> Self {
        DeviceError::Io { op, source }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_names_operation() {
        let err = DeviceError::io("VIDIOC_DQBUF", io::Error::other("input/output error"));
        let msg = format!("{}", err);
        assert!(msg.starts_with("VIDIOC_DQBUF error"));
    }

    #[test]
    fn test_timeout_display() {
        let msg = format!("{}", DeviceError::Timeout(Duration::from_secs(1)));
        assert!(msg.contains("select timeout"));
        assert!(msg.contains("1s"));
    }

    #[test]
    fn test_insufficient_buffers_display() {
        let msg = format!("{}", DeviceError::InsufficientBuffers { granted: 1 });
        assert!(msg.contains("granted 1"));
    }

    #[test]
    fn test_not_char_device_display() {
        let err = DeviceError::NotCharDevice {
            path: PathBuf::from("/tmp/file"),
        };
        assert_eq!(format!("{}", err), "/tmp/file is no device");
    }
}

//! V4L2 memory-mapped streaming capture on top of the `v4l` crate.
//!
//! Opens a capture node, negotiates MJPEG at the driver's current
//! resolution, maps the driver's buffers and implements [`CaptureDevice`]
//! with `queue` / `dequeue` on the mmap stream.

use std::io;
use std::os::unix::fs::FileTypeExt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use v4l::buffer::Type;
use v4l::capability::Flags;
use v4l::io::mmap::Stream as MmapStream;
use v4l::io::traits::{CaptureStream, Stream};
use v4l::video::Capture;
use v4l::{Device, FourCC};

use super::errors::DeviceError;
use super::ring::{CaptureDevice, DequeuedSlot};

/// Compressed frames the decoder understands.
const MJPEG: &[u8; 4] = b"MJPG";

/// Capture resolution and pixel format reported by the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamFormat {
    pub width: u32,
    pub height: u32,
    pub fourcc: FourCC,
}

impl StreamFormat {
    pub fn is_mjpeg(&self) -> bool {
        self.fourcc == FourCC::new(MJPEG)
    }
}

/// An open V4L2 capture node with mapped buffers.
///
/// Field order matters: the stream unmaps its buffers before the device
/// handle goes away.
pub struct V4l2Device {
    stream: MmapStream<'static>,
    _device: Device,
    slots: usize,
    path: PathBuf,
    format: StreamFormat,
    timeout: Option<Duration>,
    streaming: bool,
}

impl std::fmt::Debug for V4l2Device {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("V4l2Device")
            .field("path", &self.path)
            .field("format", &self.format)
            .field("buffers", &self.slots)
            .field("streaming", &self.streaming)
            .finish_non_exhaustive()
    }
}

impl V4l2Device {
    /// Open `path` and map `buffer_count` capture buffers.
    ///
    /// The driver may grant fewer buffers than requested; fewer than 2 is an
    /// error.
    pub fn open(path: &Path, buffer_count: u32) -> Result<Self, DeviceError> {
        let meta = std::fs::metadata(path).map_err(|source| DeviceError::NotFound {
            path: path.to_path_buf(),
            source,
        })?;
        if !meta.file_type().is_char_device() {
            return Err(DeviceError::NotCharDevice {
                path: path.to_path_buf(),
            });
        }

        let device = Device::with_path(path).map_err(|source| DeviceError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let format = negotiate(path, &device)?;

        let stream = MmapStream::with_buffers(&device, Type::VideoCapture, buffer_count)
            .map_err(|e| DeviceError::io("VIDIOC_REQBUFS", e))?;
        let slots = (0..).take_while(|&i| stream.get(i).is_some()).count();
        if slots < 2 {
            return Err(DeviceError::InsufficientBuffers { granted: slots });
        }

        log::info!(
            "Opened {} at {}x{} {} with {} buffer(s)",
            path.display(),
            format.width,
            format.height,
            format.fourcc,
            slots
        );

        Ok(Self {
            stream,
            _device: device,
            slots,
            path: path.to_path_buf(),
            format,
            timeout: None,
            streaming: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn format(&self) -> StreamFormat {
        self.format
    }
}

impl CaptureDevice for V4l2Device {
    fn slot_count(&self) -> usize {
        self.slots
    }

    fn slot_memory(&self, index: usize) -> &[u8] {
        self.stream.get(index).unwrap_or(&[])
    }

    fn enqueue(&mut self, index: usize) -> Result<(), DeviceError> {
        self.stream
            .queue(index)
            .map_err(|e| DeviceError::io("VIDIOC_QBUF", e))
    }

    /// Waits up to the last `wait_ready` timeout inside the stream.
    fn dequeue(&mut self) -> Result<Option<DequeuedSlot>, DeviceError> {
        match self.stream.dequeue() {
            Ok(index) => Ok(Some(DequeuedSlot {
                index,
                bytes_used: self.slot_memory(index).len(),
            })),
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => Ok(None),
            Err(e) if e.kind() == io::ErrorKind::TimedOut => Err(DeviceError::Timeout(
                self.timeout.unwrap_or_default(),
            )),
            Err(e) => Err(DeviceError::io("VIDIOC_DQBUF", e)),
        }
    }

    fn wait_ready(&mut self, timeout: Duration) -> Result<bool, DeviceError> {
        if self.timeout != Some(timeout) {
            self.stream.set_timeout(timeout);
            self.timeout = Some(timeout);
        }
        Ok(true)
    }

    fn start_streaming(&mut self) -> Result<(), DeviceError> {
        self.stream
            .start()
            .map_err(|e| DeviceError::io("VIDIOC_STREAMON", e))?;
        self.streaming = true;
        Ok(())
    }

    fn stop_streaming(&mut self) -> Result<(), DeviceError> {
        if !self.streaming {
            return Ok(());
        }
        self.streaming = false;
        self.stream
            .stop()
            .map_err(|e| DeviceError::io("VIDIOC_STREAMOFF", e))
    }
}

impl Drop for V4l2Device {
    fn drop(&mut self) {
        if let Err(e) = self.stop_streaming() {
            log::warn!("{}", e);
        }
    }
}

/// Check capabilities and ask for MJPEG at the current resolution.
fn negotiate(path: &Path, device: &Device) -> Result<StreamFormat, DeviceError> {
    let caps = device.query_caps().map_err(|source| DeviceError::NotV4l2 {
        path: path.to_path_buf(),
        source,
    })?;
    if !caps.capabilities.contains(Flags::VIDEO_CAPTURE) {
        return Err(DeviceError::NoCapture {
            path: path.to_path_buf(),
        });
    }
    if !caps.capabilities.contains(Flags::STREAMING) {
        return Err(DeviceError::NoStreaming {
            path: path.to_path_buf(),
        });
    }
    log::info!("Capture device: {}", caps.card);

    let mut fmt = device
        .format()
        .map_err(|e| DeviceError::io("VIDIOC_G_FMT", e))?;
    fmt.fourcc = FourCC::new(MJPEG);
    let fmt = device
        .set_format(&fmt)
        .map_err(|e| DeviceError::io("VIDIOC_S_FMT", e))?;

    let format = StreamFormat {
        width: fmt.width,
        height: fmt.height,
        fourcc: fmt.fourcc,
    };
    if !format.is_mjpeg() {
        log::warn!(
            "{} delivers {} instead of MJPG; frames will likely fail to decode",
            path.display(),
            format.fourcc
        );
    }
    Ok(format)
}

//! Frame buffer type shared by the decoder, the transforms and the renderer.

use std::fmt;

/// Backing storage of a [`FrameBuffer`].
///
/// `Borrowed` storage belongs to the capture ring and must never be written
/// or freed by pipeline code; the type only hands out shared slices for it.
pub enum PixelStorage<'a> {
    /// Allocated by the pipeline (decode output, intermediate buffers).
    Owned(Vec<u8>),
    /// Device memory lent out for the duration of one frame.
    Borrowed(&'a [u8]),
}

impl PixelStorage<'_> {
    fn as_slice(&self) -> &[u8] {
        match self {
            PixelStorage::Owned(bytes) => bytes,
            PixelStorage::Borrowed(bytes) => bytes,
        }
    }
}

/// A rectangular pixel region.
///
/// Pixel `(x, y)` channel 0 lives at `width * depth * y + depth * x`.
pub struct FrameBuffer<'a> {
    storage: PixelStorage<'a>,
    width: u32,
    height: u32,
    depth: u8,
}

impl fmt::Debug for FrameBuffer<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrameBuffer")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("depth", &self.depth)
            .field("owned", &self.is_owned())
            .finish_non_exhaustive()
    }
}

/// Storage was too small for the requested geometry.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{width}x{height}x{depth} frame needs {needed} bytes, storage has {actual}")]
pub struct StorageTooSmall {
    pub width: u32,
    pub height: u32,
    pub depth: u8,
    pub needed: usize,
    pub actual: usize,
}

impl FrameBuffer<'static> {
    /// Allocate a zeroed owned buffer.
    pub fn zeroed(width: u32, height: u32, depth: u8) -> Self {
        let len = required_len(width, height, depth);
        Self {
            storage: PixelStorage::Owned(vec![0; len]),
            width,
            height,
            depth,
        }
    }

    /// Take ownership of existing bytes.
    pub fn from_vec(
        bytes: Vec<u8>,
        width: u32,
        height: u32,
        depth: u8,
    ) -> Result<Self, StorageTooSmall> {
        check_len(bytes.len(), width, height, depth)?;
        Ok(Self {
            storage: PixelStorage::Owned(bytes),
            width,
            height,
            depth,
        })
    }
}

impl<'a> FrameBuffer<'a> {
    /// Borrow memory owned by someone else (typically a capture slot).
    pub fn borrowed(
        bytes: &'a [u8],
        width: u32,
        height: u32,
        depth: u8,
    ) -> Result<Self, StorageTooSmall> {
        check_len(bytes.len(), width, height, depth)?;
        Ok(Self {
            storage: PixelStorage::Borrowed(bytes),
            width,
            height,
            depth,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Channels per pixel.
    pub fn depth(&self) -> u8 {
        self.depth
    }

    /// Bytes per row.
    pub fn stride(&self) -> usize {
        self.width as usize * self.depth as usize
    }

    pub fn is_owned(&self) -> bool {
        matches!(self.storage, PixelStorage::Owned(_))
    }

    /// Index of channel 0 of pixel `(x, y)`.
    #[inline]
    pub fn offset(&self, x: u32, y: u32) -> usize {
        debug_assert!(
            x < self.width && y < self.height,
            "pixel ({x}, {y}) outside {}x{}",
            self.width,
            self.height
        );
        self.stride() * y as usize + self.depth as usize * x as usize
    }

    /// Channel 0 of pixel `(x, y)`.
    #[inline]
    pub fn pixel(&self, x: u32, y: u32) -> u8 {
        self.as_bytes()[self.offset(x, y)]
    }

    /// All channels of pixel `(x, y)`.
    #[inline]
    pub fn channels(&self, x: u32, y: u32) -> &[u8] {
        let start = self.offset(x, y);
        &self.as_bytes()[start..start + self.depth as usize]
    }

    /// The meaningful bytes (`width * height * depth`).
    pub fn as_bytes(&self) -> &[u8] {
        &self.storage.as_slice()[..self.len()]
    }

    /// Writable pixel bytes; `None` for borrowed storage.
    pub fn as_bytes_mut(&mut self) -> Option<&mut [u8]> {
        let len = self.len();
        match &mut self.storage {
            PixelStorage::Owned(bytes) => Some(&mut bytes[..len]),
            PixelStorage::Borrowed(_) => None,
        }
    }

    /// Number of meaningful bytes.
    pub fn len(&self) -> usize {
        required_len(self.width, self.height, self.depth)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Same dimensions as `other`, ignoring depth.
    pub fn same_size(&self, other: &FrameBuffer<'_>) -> bool {
        self.width == other.width && self.height == other.height
    }
}

fn required_len(width: u32, height: u32, depth: u8) -> usize {
    width as usize * height as usize * depth as usize
}

fn check_len(actual: usize, width: u32, height: u32, depth: u8) -> Result<(), StorageTooSmall> {
    let needed = required_len(width, height, depth);
    if actual < needed {
        return Err(StorageTooSmall {
            width,
            height,
            depth,
            needed,
            actual,
        });
    }
    Ok(())
}

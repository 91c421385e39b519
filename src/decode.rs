//! Compressed frame decoding.

use image::ImageFormat;

use crate::frame::{FrameBuffer, StorageTooSmall};

/// Errors that can occur while decoding a captured frame.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("jpeg error: empty frame")]
    Empty,

    #[error("jpeg error: {0}")]
    Malformed(#[from] image::ImageError),

    #[error("jpeg error: {0}")]
    Storage(#[from] StorageTooSmall),
}

/// Turns the bytes of one captured slot into an owned RGB frame.
///
/// The returned buffer never borrows the input, so the slot can be
/// re-queued as soon as decoding is done.
pub trait FrameDecoder {
    fn decode(&mut self, compressed: &[u8]) -> Result<FrameBuffer<'static>, DecodeError>;
}

/// MJPEG frame decoder.
#[derive(Debug, Default, Clone, Copy)]
pub struct JpegDecoder;

impl FrameDecoder for JpegDecoder {
    fn decode(&mut self, compressed: &[u8]) -> Result<FrameBuffer<'static>, DecodeError> {
        if compressed.is_empty() {
            return Err(DecodeError::Empty);
        }
        let rgb = image::load_from_memory_with_format(compressed, ImageFormat::Jpeg)?.into_rgb8();
        let (width, height) = rgb.dimensions();
        Ok(FrameBuffer::from_vec(rgb.into_raw(), width, height, 3)?)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    fn encode_jpeg(width: u32, height: u32, rgb: [u8; 3]) -> Vec<u8> {
        let img = image::RgbImage::from_pixel(width, height, image::Rgb(rgb));
        let mut buf = Vec::new();
        image::DynamicImage::ImageRgb8(img)
            .write_to(&mut Cursor::new(&mut buf), ImageFormat::Jpeg)
            .unwrap();
        buf
    }

    #[test]
    fn test_decode_jpeg_dimensions() {
        let jpeg = encode_jpeg(8, 4, [128, 128, 128]);
        let frame = JpegDecoder.decode(&jpeg).unwrap();
        assert_eq!(frame.width(), 8);
        assert_eq!(frame.height(), 4);
        assert_eq!(frame.depth(), 3);
        assert!(frame.is_owned());
        assert_eq!(frame.as_bytes().len(), 8 * 4 * 3);
    }

    #[test]
    fn test_decode_grey_jpeg_stays_close() {
        let jpeg = encode_jpeg(8, 8, [100, 100, 100]);
        let frame = JpegDecoder.decode(&jpeg).unwrap();
        let px = frame.channels(4, 4);
        assert!(px.iter().all(|&c| (c as i32 - 100).abs() <= 4), "{:?}", px);
    }

    #[test]
    fn test_decode_rejects_garbage() {
        let err = JpegDecoder.decode(&[0xff, 0xd8, 0x00, 0x01, 0x02]).unwrap_err();
        assert!(matches!(err, DecodeError::Malformed(_)));
        assert!(format!("{}", err).starts_with("jpeg error"));
    }

    #[test]
    fn test_decode_rejects_empty_input() {
        assert!(matches!(JpegDecoder.decode(&[]), Err(DecodeError::Empty)));
    }
}

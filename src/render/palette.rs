//! Intensity to glyph mapping.

use crate::frame::FrameBuffer;

/// Standard density ramp (10 levels), darkest first.
pub const STANDARD_PALETTE: &[char] = &[' ', '.', ':', '-', '=', '+', '*', '#', '%', '@'];

/// Unicode block ramp (5 levels).
pub const BLOCKS_PALETTE: &[char] = &[' ', '░', '▒', '▓', '█'];

/// Sparse ramp (4 levels) for a cleaner look.
pub const MINIMAL_PALETTE: &[char] = &[' ', '.', ':', '#'];

/// Glyph ramp used by the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Palette {
    #[default]
    Standard,
    Blocks,
    Minimal,
}

impl Palette {
    pub fn glyphs(&self) -> &'static [char] {
        match self {
            Palette::Standard => STANDARD_PALETTE,
            Palette::Blocks => BLOCKS_PALETTE,
            Palette::Minimal => MINIMAL_PALETTE,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Palette::Standard => "standard",
            Palette::Blocks => "blocks",
            Palette::Minimal => "minimal",
        }
    }

    /// Parse a palette name as written in the config file.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "standard" => Some(Palette::Standard),
            "blocks" => Some(Palette::Blocks),
            "minimal" => Some(Palette::Minimal),
            _ => None,
        }
    }

    /// Glyph for intensity `value`.
    #[inline]
    pub fn glyph(&self, value: u8, invert: bool) -> char {
        let glyphs = self.glyphs();
        let value = if invert { 255 - value } else { value };
        glyphs[glyph_index(value, glyphs.len())]
    }
}

/// `floor(value * (levels - 1) / 255)`.
#[inline]
pub fn glyph_index(value: u8, levels: usize) -> usize {
    (value as usize * (levels - 1)) / 255
}

/// Turn a single-channel frame into text rows.
///
/// Each row is written right to left, which mirrors the picture like a
/// selfie camera.
pub fn compose_rows(frame: &FrameBuffer<'_>, palette: Palette, invert: bool) -> Vec<String> {
    let width = frame.width() as usize;
    if width == 0 {
        return Vec::new();
    }
    frame
        .as_bytes()
        .chunks_exact(frame.stride())
        .map(|row| {
            row.iter()
                .step_by(frame.depth() as usize)
                .rev()
                .map(|&v| palette.glyph(v, invert))
                .collect()
        })
        .collect()
}

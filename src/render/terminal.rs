//! Full-surface glyph renderer.

use crossterm::cursor::MoveTo;
use crossterm::style::Print;
use crossterm::terminal::{Clear, ClearType};
use crossterm::QueueableCommand;
use std::io::{self, Write};

use super::palette::{compose_rows, Palette};
use crate::frame::FrameBuffer;

/// Errors that can occur while drawing a frame.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("display error: {0}")]
    Io(#[from] io::Error),

    #[error("display error: expected a single-channel frame, got depth {0}")]
    Depth(u8),
}

/// Receives the final single-channel frame of each pipeline run.
pub trait FrameRenderer {
    fn render(&mut self, frame: &FrameBuffer<'_>) -> Result<(), RenderError>;
}

/// Draws frames as glyphs, clearing and redrawing the whole surface.
pub struct TerminalRenderer<W: Write> {
    out: W,
    palette: Palette,
    invert: bool,
}

impl<W: Write> TerminalRenderer<W> {
    pub fn new(out: W, palette: Palette, invert: bool) -> Self {
        Self {
            out,
            palette,
            invert,
        }
    }

    pub fn palette(&self) -> Palette {
        self.palette
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> FrameRenderer for TerminalRenderer<W> {
    fn render(&mut self, frame: &FrameBuffer<'_>) -> Result<(), RenderError> {
        if frame.depth() != 1 {
            return Err(RenderError::Depth(frame.depth()));
        }

        self.out.queue(Clear(ClearType::All))?;
        for (y, line) in compose_rows(frame, self.palette, self.invert).iter().enumerate() {
            self.out.queue(MoveTo(0, y as u16))?.queue(Print(line))?;
        }
        self.out.flush()?;
        Ok(())
    }
}

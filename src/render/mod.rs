//! Glyph rendering of single-channel frames.
//!
//! 1. **Palette** - intensity to glyph (`floor(v * (K - 1) / 255)`)
//! 2. **Renderer** - full clear and redraw, each row mirrored
//! 3. **Session** - raw mode and alternate screen with panic-safe restore

mod palette;
mod session;
mod terminal;

pub use palette::{
    compose_rows, glyph_index, Palette, BLOCKS_PALETTE, MINIMAL_PALETTE, STANDARD_PALETTE,
};
pub use session::{is_stop_key, poll_stop_key, TerminalSession};
pub use terminal::{FrameRenderer, RenderError, TerminalRenderer};

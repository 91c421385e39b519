//! Terminal setup with panic-safe cleanup.

use crossterm::cursor::{Hide, Show};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal::{
    self, disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use std::io;
use std::panic;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// Set while the terminal is in raw mode (read by the panic hook).
pub(crate) static SESSION_ACTIVE: AtomicBool = AtomicBool::new(false);

/// Raw mode plus alternate screen, restored on drop.
#[derive(Debug)]
pub struct TerminalSession {
    active: bool,
}

impl TerminalSession {
    /// Switch the terminal into drawing mode.
    ///
    /// # Errors
    /// Returns an error if raw mode or the alternate screen can't be entered
    pub fn enter() -> io::Result<Self> {
        install_panic_hook();

        enable_raw_mode()?;
        SESSION_ACTIVE.store(true, Ordering::SeqCst);
        let session = Self { active: true };
        crossterm::execute!(io::stdout(), EnterAlternateScreen, Hide)?;
        Ok(session)
    }

    /// Drawing surface size as `(columns, rows)`.
    ///
    /// # Errors
    /// Fails if the size can't be queried or either dimension is zero
    pub fn surface_size() -> io::Result<(u16, u16)> {
        let (cols, rows) = terminal::size()?;
        if cols == 0 || rows == 0 {
            return Err(io::Error::other(
                "At least one terminal dimension is equal to 0",
            ));
        }
        Ok((cols, rows))
    }

    /// Restore the terminal now. Dropping afterwards is a no-op.
    pub fn exit(&mut self) -> io::Result<()> {
        if self.active {
            self.active = false;
            SESSION_ACTIVE.store(false, Ordering::SeqCst);
            crossterm::execute!(io::stdout(), Show, LeaveAlternateScreen)?;
            disable_raw_mode()?;
        }
        Ok(())
    }
}

impl Drop for TerminalSession {
    fn drop(&mut self) {
        if self.active {
            SESSION_ACTIVE.store(false, Ordering::SeqCst);
            // Best-effort cleanup
            let _ = crossterm::execute!(io::stdout(), Show, LeaveAlternateScreen);
            let _ = disable_raw_mode();
        }
    }
}

/// Drain pending key events without blocking.
///
/// Returns true if Esc, `q` or Ctrl+C was pressed.
pub fn poll_stop_key() -> io::Result<bool> {
    let mut stop = false;
    while event::poll(Duration::ZERO)? {
        if let Event::Key(key) = event::read()? {
            stop |= is_stop_key(&key);
        }
    }
    Ok(stop)
}

/// Keys that end the capture loop.
pub fn is_stop_key(key: &KeyEvent) -> bool {
    if key.kind == KeyEventKind::Release {
        return false;
    }
    match key.code {
        KeyCode::Esc | KeyCode::Char('q') => true,
        KeyCode::Char('c') => key.modifiers.contains(KeyModifiers::CONTROL),
        _ => false,
    }
}

/// Install a panic hook that restores the terminal before the message prints.
pub(crate) fn install_panic_hook() {
    static HOOK_INSTALLED: AtomicBool = AtomicBool::new(false);

    if HOOK_INSTALLED.swap(true, Ordering::SeqCst) {
        return;
    }

    let original_hook = panic::take_hook();

    panic::set_hook(Box::new(move |panic_info| {
        if SESSION_ACTIVE.swap(false, Ordering::SeqCst) {
            let _ = crossterm::execute!(io::stdout(), Show, LeaveAlternateScreen);
            let _ = disable_raw_mode();
        }
        original_hook(panic_info);
    }));
}

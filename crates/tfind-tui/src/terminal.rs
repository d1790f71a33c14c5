//! Raw mode and alternate screen for the viewer.
//!
//! The terminal is restored when [`Screen`] drops, and by the panic hook if
//! the viewer panics first.

use std::io::{self, Stdout};
use std::panic;
use std::sync::Once;

use anyhow::{Context, Result};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;

pub type Backend = CrosstermBackend<Stdout>;

static PANIC_HOOK: Once = Once::new();

/// An entered full-screen terminal. Leaves it on drop.
pub struct Screen {
    terminal: Terminal<Backend>,
}

impl Screen {
    /// Installs the panic hook, then enters raw mode and the alternate screen.
    pub fn enter() -> Result<Self> {
        install_panic_hook();
        enable_raw_mode().context("Failed to enable raw mode")?;
        let mut stdout = io::stdout();
        if let Err(err) = execute!(stdout, EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(err).context("Failed to enter alternate screen");
        }
        let terminal = match Terminal::new(CrosstermBackend::new(stdout)) {
            Ok(terminal) => terminal,
            Err(err) => {
                let _ = restore();
                return Err(err).context("Failed to create terminal");
            }
        };
        Ok(Self { terminal })
    }

    pub fn terminal(&mut self) -> &mut Terminal<Backend> {
        &mut self.terminal
    }
}

impl Drop for Screen {
    fn drop(&mut self) {
        let _ = self.terminal.show_cursor();
        let _ = restore();
    }
}

/// Leaves the alternate screen and raw mode. Safe to call more than once.
pub fn restore() -> Result<()> {
    execute!(io::stdout(), LeaveAlternateScreen).context("Failed to leave alternate screen")?;
    disable_raw_mode().context("Failed to disable raw mode")
}

/// Restores the terminal before the default hook prints the panic.
fn install_panic_hook() {
    PANIC_HOOK.call_once(|| {
        let original = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            let _ = restore();
            original(info);
        }));
    });
}

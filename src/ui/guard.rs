//! Provides a RAII guard for safe terminal lifecycle management.
//!
//! A guard object is created to initialize the TUI, and its `Drop`
//! implementation restores the terminal when it goes out of scope, either on
//! normal exit or during a panic unwind. Mouse capture is part of the state
//! being restored, since gestures arrive as mouse events.
use std::io::{Result as IoResult, Stdout, stdout};
use std::panic::{set_hook, take_hook};

use crossterm::ExecutableCommand;
use crossterm::event::{DisableMouseCapture, EnableMouseCapture};
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode,
    enable_raw_mode,
};
use log::error;
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;

/// RAII wrapper for terminal state.
///
/// Manages the terminal's configuration, ensuring it is always returned
/// to its original state when this struct is dropped.
pub struct TerminalGuard;

impl TerminalGuard
{
    /// Creates a `TerminalGuard` for TUI setup.
    ///
    /// Enters raw mode, switches to the alternate screen buffer and turns on
    /// mouse capture.
    ///
    /// # Errors
    ///
    /// On failure to enter raw mode, switch screens or capture the mouse.
    pub fn new() -> IoResult<Self>
    {
        enable_raw_mode()?;
        stdout()
            .execute(EnterAlternateScreen)?
            .execute(EnableMouseCapture)?;
        Ok(Self)
    }
}

impl Drop for TerminalGuard
{
    /// Restores the terminal state.
    fn drop(&mut self)
    {
        restore_terminal();
    }
}

/// Undoes everything `TerminalGuard::new` set up.
///
/// Failures are only logged; the terminal will be borked then, but there is
/// nothing better to do on the way out.
fn restore_terminal()
{
    if let Err(err) = stdout().execute(DisableMouseCapture)
    {
        error!("Failed to disable mouse capture: {err}");
    }

    if let Err(err) = disable_raw_mode()
    {
        error!("Failed to disable raw mode: {err}");
    }

    if let Err(err) = stdout().execute(LeaveAlternateScreen)
    {
        error!("Failed to leave alternate screen: {err}");
    }
}

/// Initialize the terminal
///
/// # Errors
///
/// Returns an error if the terminal backend cannot be created.
pub fn init_tui() -> IoResult<Terminal<CrosstermBackend<Stdout>>>
{
    // Terminal modes are handled by TerminalGuard
    let backend = CrosstermBackend::new(stdout());
    Terminal::new(backend)
}

/// Initialize the panic hook to restore the terminal before the panic
/// message is printed.
pub fn init_panic_hook()
{
    let original_hook = take_hook();
    set_hook(Box::new(move |panic_info| {
        restore_terminal();

        error!("Application panicked: {panic_info}");

        original_hook(panic_info);
    }));
}

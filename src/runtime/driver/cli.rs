//! Interactive terminal session for the allocation widget.
//!
//! The widget commits a half-typed count when the terminal loses focus and
//! treats pasted text as a field edit, so the driver asks the terminal for
//! focus-change and bracketed-paste reports on top of raw mode.

use std::io::{self, Write};

use crossterm::cursor::{Hide, Show};
use crossterm::event::{
    DisableBracketedPaste, DisableFocusChange, EnableBracketedPaste, EnableFocusChange,
};
use crossterm::terminal::{self, Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::{execute, queue};
use thiserror::Error;

use crate::{RoomRuntime, Size, WidgetError};

pub type DriverResult<T> = std::result::Result<T, CliDriverError>;

#[derive(Debug, Error)]
pub enum CliDriverError {
    #[error("widget error: {0}")]
    Widget(#[from] WidgetError),
    #[error("cannot switch terminal mode: {0}")]
    Terminal(String),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

/// Terminal reports requested for the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TerminalModes {
    pub focus_change: bool,
    pub bracketed_paste: bool,
}

impl Default for TerminalModes {
    fn default() -> Self {
        Self {
            focus_change: true,
            bracketed_paste: true,
        }
    }
}

/// Runs a [`RoomRuntime`] in raw mode on the alternate screen and puts the
/// terminal back however the session ends.
pub struct CliDriver {
    runtime: RoomRuntime,
    modes: TerminalModes,
}

impl CliDriver {
    pub fn new(runtime: RoomRuntime) -> Self {
        Self {
            runtime,
            modes: TerminalModes::default(),
        }
    }

    pub fn with_modes(mut self, modes: TerminalModes) -> Self {
        self.modes = modes;
        self
    }

    /// Run until a plugin requests exit.
    pub fn run(mut self) -> DriverResult<()> {
        let mut stdout = io::stdout();
        terminal::enable_raw_mode().map_err(|err| CliDriverError::Terminal(err.to_string()))?;
        let result = self
            .write_enter(&mut stdout)
            .and_then(|()| self.session(&mut stdout));
        self.write_leave(&mut stdout).ok();
        terminal::disable_raw_mode().ok();
        result
    }

    fn session(&mut self, stdout: &mut impl Write) -> DriverResult<()> {
        let (width, height) = terminal::size()?;
        self.runtime.resize(Size::new(width, height))?;
        self.runtime.run(stdout)?;
        Ok(())
    }

    fn write_enter(&self, out: &mut impl Write) -> DriverResult<()> {
        queue!(out, EnterAlternateScreen, Hide, Clear(ClearType::All))?;
        if self.modes.focus_change {
            queue!(out, EnableFocusChange)?;
        }
        if self.modes.bracketed_paste {
            queue!(out, EnableBracketedPaste)?;
        }
        out.flush()?;
        Ok(())
    }

    fn write_leave(&self, out: &mut impl Write) -> DriverResult<()> {
        if self.modes.bracketed_paste {
            queue!(out, DisableBracketedPaste)?;
        }
        if self.modes.focus_change {
            queue!(out, DisableFocusChange)?;
        }
        execute!(out, Show, LeaveAlternateScreen)?;
        Ok(())
    }
}

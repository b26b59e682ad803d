use std::io::Write;

use crate::error::Result;
use crate::registry::{ZoneId, ZoneState};
use crate::width::fit_to_width;

/// Renderer runtime parameters.
#[derive(Debug, Clone, Default)]
pub struct RendererSettings {
    /// 0-based (row, col) to park the cursor on after each frame.
    pub restore_cursor: Option<(u16, u16)>,
}

/// Paints zone content with absolute ANSI cursor moves.
pub struct AnsiRenderer {
    settings: RendererSettings,
}

impl AnsiRenderer {
    pub fn new(settings: RendererSettings) -> Self {
        Self { settings }
    }

    pub fn with_default() -> Self {
        Self::new(RendererSettings::default())
    }

    pub fn settings_mut(&mut self) -> &mut RendererSettings {
        &mut self.settings
    }

    pub fn render(&mut self, writer: &mut impl Write, dirty: &[(ZoneId, ZoneState)]) -> Result<()> {
        for (_id, state) in dirty {
            render_zone(writer, state)?;
        }

        if let Some((row, col)) = self.settings.restore_cursor {
            write!(writer, "\x1b[{};{}H", row + 1, col + 1)?;
        }

        writer.flush()?;
        Ok(())
    }
}

/// Each content line owns one row; extra lines are cut and missing rows blanked.
fn render_zone(writer: &mut impl Write, state: &ZoneState) -> Result<()> {
    let rect = state.rect;
    if rect.is_empty() {
        return Ok(());
    }

    let mut lines = state.content.lines();
    for row in 0..rect.height {
        let line = fit_to_width(lines.next().unwrap_or(""), rect.width as usize);
        write!(writer, "\x1b[{};{}H{}", rect.y + row + 1, rect.x + 1, line)?;
    }
    Ok(())
}

use std::io::{stdout, BufWriter, Stdout, Write};

use anyhow::Result;
use crossterm::{
    cursor, execute, queue,
    style::{self, Attribute},
    terminal::{self, Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen},
};
use hexvi_messages::Size;

/// Raw-mode terminal with a buffered writer. Restores the screen on
/// drop.
pub(crate) struct Terminal {
    out: BufWriter<Stdout>,
    size: Size,
}

impl Terminal {
    pub fn new() -> Result<Terminal> {
        terminal::enable_raw_mode()?;
        let mut out = stdout();
        execute!(out, EnterAlternateScreen, cursor::Hide, Clear(ClearType::All))?;
        let (width, height) = terminal::size()?;
        Ok(Terminal {
            out: BufWriter::with_capacity(1 << 16, out),
            size: Size {
                width: width as usize,
                height: height as usize,
            },
        })
    }

    pub fn size(&self) -> Size {
        self.size
    }

    pub fn resize(&mut self, width: usize, height: usize) -> Result<()> {
        self.size = Size { width, height };
        queue!(self.out, Clear(ClearType::All))?;
        Ok(())
    }

    pub fn goto(&mut self, x: usize, y: usize) -> Result<()> {
        queue!(self.out, cursor::MoveTo(x as u16, y as u16))?;
        Ok(())
    }

    pub fn print(&mut self, text: &str) -> Result<()> {
        queue!(self.out, style::Print(text))?;
        Ok(())
    }

    pub fn attr(&mut self, attr: Attribute) -> Result<()> {
        queue!(self.out, style::SetAttribute(attr))?;
        Ok(())
    }

    pub fn reset_attr(&mut self) -> Result<()> {
        queue!(self.out, style::SetAttribute(Attribute::Reset))?;
        Ok(())
    }

    pub fn show_cursor_at(&mut self, x: usize, y: usize) -> Result<()> {
        queue!(self.out, cursor::MoveTo(x as u16, y as u16), cursor::Show)?;
        Ok(())
    }

    pub fn hide_cursor(&mut self) -> Result<()> {
        queue!(self.out, cursor::Hide)?;
        Ok(())
    }

    /// The visual flash: a BEL to the terminal.
    pub fn bell(&mut self) -> Result<()> {
        self.out.write_all(b"\x07")?;
        self.out.flush()?;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.out.flush()?;
        Ok(())
    }

    /// Leave raw mode around a blocking action (the external shell).
    pub fn suspend<F: FnOnce()>(&mut self, f: F) -> Result<()> {
        execute!(self.out, LeaveAlternateScreen, cursor::Show)?;
        terminal::disable_raw_mode()?;
        f();
        terminal::enable_raw_mode()?;
        execute!(
            self.out,
            EnterAlternateScreen,
            cursor::Hide,
            Clear(ClearType::All)
        )?;
        Ok(())
    }
}

impl Drop for Terminal {
    fn drop(&mut self) {
        let _ = execute!(self.out, LeaveAlternateScreen, cursor::Show);
        let _ = terminal::disable_raw_mode();
    }
}

/// Minimal progress line drawn outside the normal frame path, so the
/// save engine can publish percentages while the core is busy.
pub(crate) fn draw_progress(pct: u8) {
    let mut out = stdout();
    let _ = execute!(
        out,
        cursor::MoveTo(0, 0),
        style::Print(format!("saving... {:3}%", pct))
    );
    let _ = out.flush();
}

//! Frame rendering: address column, grouped hex pane, ASCII pane,
//! status and prompt lines, and the overlay box.

use anyhow::Result;
use crossterm::style::Attribute;
use hexvi_messages::{Frame, Pane};

use crate::terminal::Terminal;

const ADDR_W: usize = 10;

/// One display slot: two hex characters and an ASCII cell. Slots
/// normally carry a file address; the in-progress edit group does not.
#[derive(Clone)]
struct Cell {
    hex: [char; 2],
    ascii: char,
    addr: Option<u64>,
}

impl Cell {
    fn byte(b: u8, addr: u64) -> Cell {
        Cell {
            hex: [hex_digit(b >> 4), hex_digit(b & 0xF)],
            ascii: if (0x20..=0x7e).contains(&b) {
                b as char
            } else {
                '.'
            },
            addr: Some(addr),
        }
    }

    fn pending(b: u8) -> Cell {
        let mut c = Cell::byte(b, 0);
        c.addr = None;
        c
    }

    fn blank() -> Cell {
        Cell {
            hex: [' ', ' '],
            ascii: ' ',
            addr: None,
        }
    }
}

fn hex_digit(n: u8) -> char {
    char::from_digit(n as u32, 16).unwrap_or('?')
}

/// Build the display slots for the page, splicing the edit overlay in.
fn build_cells(frame: &Frame) -> Vec<Cell> {
    let g = frame.grouping.max(1);
    let start = frame.page_start;
    let mut cells: Vec<Cell> = frame
        .bytes
        .iter()
        .enumerate()
        .map(|(i, &b)| Cell::byte(b, start + i as u64))
        .collect();

    if let Some(edit) = &frame.edit {
        if edit.addr >= start {
            let at = (edit.addr - start) as usize;
            let mut group: Vec<Cell> = edit.group.iter().map(|&b| Cell::pending(b)).collect();
            if let Some(n) = edit.nibble {
                let mut c = Cell::blank();
                c.hex[0] = n;
                group.push(c);
            }
            if edit.hole {
                // Insert mode shows an open group at the edit point.
                while group.len() < g {
                    group.push(Cell::blank());
                }
                if at <= cells.len() {
                    cells.splice(at..at, group);
                }
            } else {
                // Overwrite and replace type over the existing cells.
                for (i, c) in group.into_iter().enumerate() {
                    if at + i < cells.len() {
                        let addr = cells[at + i].addr;
                        cells[at + i] = c;
                        cells[at + i].addr = addr;
                    }
                }
            }
        }
    }

    cells
}

fn cell_attr(frame: &Frame, cell: &Cell, in_cursor_pane: bool) -> Option<Attribute> {
    let addr = cell.addr?;
    if frame.edit.is_none() && addr == frame.cursor && in_cursor_pane {
        return Some(Attribute::Reverse);
    }
    if let Some((lo, hi)) = frame.selection {
        if (lo..=hi).contains(&addr) {
            return Some(Attribute::Reverse);
        }
    }
    if let Some((lo, hi)) = frame.highlight {
        if (lo..=hi).contains(&addr) {
            return Some(Attribute::Underlined);
        }
    }
    None
}

pub(crate) fn draw(term: &mut Terminal, frame: &Frame) -> Result<()> {
    let geom = frame.geometry;
    let g = frame.grouping.max(1);
    let bpl = geom.bytes_per_line.max(1);
    let width = term.size().width;

    let hex_w = bpl * 2 + bpl / g;
    let ascii_x = ADDR_W + hex_w + 2;

    let cells = build_cells(frame);

    for row in 0..geom.lines {
        term.goto(0, row)?;
        term.reset_attr()?;
        let line_cells = cells
            .get(row * bpl..((row + 1) * bpl).min(cells.len()))
            .unwrap_or(&[]);

        if line_cells.is_empty() {
            term.print(&" ".repeat(width.min(ascii_x + bpl)))?;
            continue;
        }

        let line_addr = frame.page_start + (row * bpl) as u64;
        term.print(&format!("{:08x}  ", line_addr))?;

        // Hex pane, groups separated by one space. Little endian shows
        // each group least significant byte first.
        for chunk in line_cells.chunks(g) {
            let order: Vec<&Cell> = if frame.little_endian {
                chunk.iter().rev().collect()
            } else {
                chunk.iter().collect()
            };
            for cell in order {
                match cell_attr(frame, cell, frame.pane == Pane::Hex) {
                    Some(a) => {
                        term.attr(a)?;
                        term.print(&cell.hex.iter().collect::<String>())?;
                        term.reset_attr()?;
                    }
                    None => term.print(&cell.hex.iter().collect::<String>())?,
                }
            }
            for _ in chunk.len()..g {
                term.print("  ")?;
            }
            term.print(" ")?;
        }
        term.goto(ascii_x, row)?;

        for cell in line_cells {
            match cell_attr(frame, cell, frame.pane == Pane::Ascii) {
                Some(a) => {
                    term.attr(a)?;
                    term.print(&cell.ascii.to_string())?;
                    term.reset_attr()?;
                }
                None => term.print(&cell.ascii.to_string())?,
            }
        }
        let used = ascii_x + line_cells.len();
        if used < width {
            term.print(&" ".repeat(width - used))?;
        }
    }

    draw_status(term, frame)?;
    draw_bottom(term, frame)?;
    if let Some(overlay) = &frame.overlay {
        draw_overlay(term, frame, overlay)?;
    }
    place_hardware_cursor(term, frame, ascii_x)?;
    Ok(())
}

fn draw_status(term: &mut Terminal, frame: &Frame) -> Result<()> {
    let geom = frame.geometry;
    let width = term.size().width;
    term.goto(0, geom.lines)?;
    term.attr(Attribute::Reverse)?;
    let mut line = format!(" {}", frame.status.left);
    let right = format!("{} ", frame.status.right);
    let pad = width.saturating_sub(line.len() + right.len());
    line.push_str(&" ".repeat(pad));
    line.push_str(&right);
    line.truncate(width.max(1));
    term.print(&line)?;
    term.reset_attr()?;
    Ok(())
}

fn draw_bottom(term: &mut Terminal, frame: &Frame) -> Result<()> {
    let geom = frame.geometry;
    let width = term.size().width;
    term.goto(0, geom.lines + 1)?;
    let text = if let Some(p) = &frame.prompt {
        format!("{}{}", p.prompt, p.input)
    } else if let Some(m) = &frame.status.message {
        m.clone()
    } else {
        String::new()
    };
    let mut text = text;
    if text.len() < width {
        text.push_str(&" ".repeat(width - text.len()));
    }
    text.truncate(width.max(1));
    term.print(&text)?;
    Ok(())
}

fn draw_overlay(
    term: &mut Terminal,
    frame: &Frame,
    overlay: &hexvi_messages::OverlayFrame,
) -> Result<()> {
    let geom = frame.geometry;
    let width = term.size().width;
    let box_w = width.saturating_sub(4).max(20);
    let box_h = geom.lines.saturating_sub(2).max(3);
    let inner = box_h.saturating_sub(1);

    for i in 0..box_h {
        term.goto(2, 1 + i)?;
        let row = overlay.top + i;
        if i + 1 == box_h {
            term.attr(Attribute::Reverse)?;
            let mut f = overlay.footer.clone();
            f.truncate(box_w);
            f.push_str(&" ".repeat(box_w.saturating_sub(f.len())));
            term.print(&f)?;
            term.reset_attr()?;
            break;
        }
        let text = if row < overlay.lines.len() && i < inner {
            overlay.lines[row].clone()
        } else {
            String::new()
        };
        let mut text = text;
        text.truncate(box_w);
        text.push_str(&" ".repeat(box_w.saturating_sub(text.len())));
        if overlay.selected == Some(row) {
            term.attr(Attribute::Reverse)?;
            term.print(&text)?;
            term.reset_attr()?;
        } else {
            term.print(&text)?;
        }
    }
    Ok(())
}

fn place_hardware_cursor(term: &mut Terminal, frame: &Frame, ascii_x: usize) -> Result<()> {
    let geom = frame.geometry;
    if let Some(p) = &frame.prompt {
        let x = p.prompt.len() + p.cursor;
        return term.show_cursor_at(x, geom.lines + 1);
    }
    if frame.overlay.is_some() {
        return term.hide_cursor();
    }

    let bpl = geom.bytes_per_line.max(1) as u64;
    let g = frame.grouping.max(1);
    let cur = frame.cursor;
    if cur < frame.page_start || cur >= frame.page_start + geom.page_size() {
        return term.hide_cursor();
    }
    let off = (cur - frame.page_start) as usize;
    let row = off / bpl as usize;
    let in_line = off % bpl as usize;
    let x = match frame.pane {
        Pane::Hex => {
            let group = in_line / g;
            let within = in_line % g;
            let within = if frame.little_endian {
                g - 1 - within
            } else {
                within
            };
            ADDR_W + group * (2 * g + 1) + within * 2
        }
        Pane::Ascii => ascii_x + in_line,
    };
    term.show_cursor_at(x, row)
}

use hexvi_messages::{Geometry, Pane, Size};

use super::options::Preferences;

/// Per-file display state: cursor, page window and the pane owning the
/// cursor. Stashed and restored when the file ring rotates.
#[derive(Debug, Clone, Copy)]
pub(crate) struct View {
    pub cursor: u64,
    pub page_start: u64,
    pub pane: Pane,
}

impl Default for View {
    fn default() -> Self {
        View {
            cursor: 0,
            page_start: 0,
            pane: Pane::Hex,
        }
    }
}

impl View {
    /// Clamp `addr` into the file and scroll the page window to keep the
    /// cursor visible.
    pub fn place_cursor(&mut self, addr: u64, file_size: u64, geom: &Geometry) {
        let max = file_size.saturating_sub(1);
        self.cursor = addr.min(max);
        self.follow(geom);
    }

    pub fn follow(&mut self, geom: &Geometry) {
        let bpl = geom.bytes_per_line as u64;
        let page = geom.page_size().max(bpl);
        let line = self.cursor - self.cursor % bpl;
        if self.cursor < self.page_start {
            self.page_start = line;
        } else if self.cursor >= self.page_start + page {
            self.page_start = (line + bpl).saturating_sub(page);
        }
    }

    pub fn toggle_pane(&mut self) {
        self.pane = match self.pane {
            Pane::Hex => Pane::Ascii,
            Pane::Ascii => Pane::Hex,
        };
    }
}

/// Derive the page layout from the terminal size: an address column,
/// two hex characters plus a trailing space per byte grouped by the
/// grouping preference, and the ASCII pane on the right. A nonzero
/// columns preference forces the bytes per line.
pub(crate) fn geometry_for(size: Size, prefs: &Preferences) -> Geometry {
    let lines = size.height.saturating_sub(2).max(1);
    let g = prefs.grouping as usize;
    let bytes_per_line = if prefs.columns > 0 {
        prefs.columns
    } else {
        let budget = size.width.saturating_sub(10 + 3);
        let per_group = 3 * g + 1;
        ((budget / per_group).max(1)) * g
    };
    Geometry {
        bytes_per_line,
        lines,
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn geom(bpl: usize, lines: usize) -> Geometry {
        Geometry {
            bytes_per_line: bpl,
            lines,
        }
    }

    #[test]
    fn cursor_clamps_to_file() {
        let mut v = View::default();
        v.place_cursor(100, 10, &geom(16, 4));
        assert_eq!(9, v.cursor);
        v.place_cursor(5, 0, &geom(16, 4));
        assert_eq!(0, v.cursor);
    }

    #[test]
    fn page_follows_cursor_down_and_up() {
        let g = geom(16, 4); // page of 64
        let mut v = View::default();
        v.place_cursor(200, 1000, &g);
        // Cursor line becomes the last page line.
        assert_eq!(200 - 200 % 16 + 16 - 64, v.page_start);
        v.place_cursor(0, 1000, &g);
        assert_eq!(0, v.page_start);
    }

    #[test]
    fn geometry_fits_groups() {
        let prefs = Preferences::default();
        let g = geometry_for(
            Size {
                width: 80,
                height: 24,
            },
            &prefs,
        );
        // 80 - 13 = 67 budget, 4 columns per byte group of one.
        assert_eq!(16, g.bytes_per_line);
        assert_eq!(22, g.lines);

        let mut wide = prefs.clone();
        wide.columns = 20;
        let g = geometry_for(
            Size {
                width: 80,
                height: 24,
            },
            &wide,
        );
        assert_eq!(20, g.bytes_per_line);
    }
}

//! The file browser and the scrollable text box (preference listing,
//! help). Both are overlays driven by a handful of keys.

use std::io;
use std::path::PathBuf;

use hexvi_messages::{Key, KeyEvent, OverlayFrame};

const BOX_LINES: usize = 16;

pub(crate) enum BrowserKey {
    Pending,
    Open(PathBuf),
    Close,
}

/// Directory listing with a selection bar.
#[derive(Debug)]
pub(crate) struct Browser {
    dir: PathBuf,
    entries: Vec<String>,
    selected: usize,
    top: usize,
}

impl Browser {
    pub fn load(dir: PathBuf) -> io::Result<Browser> {
        let mut entries = vec![String::from("..")];
        let mut names: Vec<String> = std::fs::read_dir(&dir)?
            .filter_map(|e| e.ok())
            .map(|e| {
                let mut name = e.file_name().to_string_lossy().into_owned();
                if e.path().is_dir() {
                    name.push('/');
                }
                name
            })
            .collect();
        names.sort();
        entries.extend(names);
        Ok(Browser {
            dir,
            entries,
            selected: 0,
            top: 0,
        })
    }

    pub fn handle(&mut self, key: KeyEvent) -> BrowserKey {
        if key.is_ctrl('c') {
            return BrowserKey::Close;
        }
        match (key.key(), key.plain_char()) {
            (Key::Esc, _) | (_, Some('q')) | (_, Some('Q')) => BrowserKey::Close,
            (Key::Down, _) | (_, Some('j')) => {
                if self.selected + 1 < self.entries.len() {
                    self.selected += 1;
                    if self.selected >= self.top + BOX_LINES {
                        self.top += 1;
                    }
                }
                BrowserKey::Pending
            }
            (Key::Up, _) | (_, Some('k')) => {
                if self.selected > 0 {
                    self.selected -= 1;
                    if self.selected < self.top {
                        self.top -= 1;
                    }
                }
                BrowserKey::Pending
            }
            (Key::Enter, _) | (_, Some('g')) => {
                let name = self.entries[self.selected].trim_end_matches('/');
                let path = self.dir.join(name);
                if path.is_dir() {
                    match Browser::load(path) {
                        Ok(next) => *self = next,
                        Err(e) => log::warn!("could not scan directory: {}", e),
                    }
                    BrowserKey::Pending
                } else {
                    BrowserKey::Open(path)
                }
            }
            _ => BrowserKey::Pending,
        }
    }

    pub fn frame(&self) -> OverlayFrame {
        OverlayFrame {
            lines: self.entries.clone(),
            top: self.top,
            selected: Some(self.selected),
            footer: String::from(" [j|DOWN] Down  [k|UP] Up  [ENTER|g] Select  [q|ESC] Cancel "),
        }
    }
}

/// Scrollable read-only text.
#[derive(Debug)]
pub(crate) struct ScrollBox {
    lines: Vec<String>,
    top: usize,
}

impl ScrollBox {
    pub fn new(lines: Vec<String>) -> ScrollBox {
        ScrollBox { lines, top: 0 }
    }

    /// Returns false when the box closes.
    pub fn handle(&mut self, key: KeyEvent) -> bool {
        if key.is_ctrl('c') {
            return false;
        }
        match (key.key(), key.plain_char()) {
            (Key::Esc, _) | (_, Some('q')) | (_, Some('Q')) | (Key::Enter, _) => false,
            (Key::Down, _) | (_, Some('j')) => {
                if self.top + BOX_LINES < self.lines.len() {
                    self.top += 1;
                }
                true
            }
            (Key::Up, _) | (_, Some('k')) => {
                self.top = self.top.saturating_sub(1);
                true
            }
            _ => true,
        }
    }

    pub fn frame(&self) -> OverlayFrame {
        OverlayFrame {
            lines: self.lines.clone(),
            top: self.top,
            selected: None,
            footer: String::from(" [j|DOWN] Down  [k|UP] Up  [q|ESC] Close "),
        }
    }
}

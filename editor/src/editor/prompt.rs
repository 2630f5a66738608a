//! The prompt line editor, fed one key at a time by the central loop.
//!
//! History is a fixed ring with a rolling write index: a submitted line
//! lands at the index the prompt opened with, empty submissions and
//! aborts leave the ring untouched.

use hexvi_messages::{Key, KeyEvent, PromptFrame};

pub(crate) const MAX_CMD_HISTORY: usize = 32;
const MAX_CMD_BUF: usize = 256;

#[derive(Debug, Default)]
pub(crate) struct HistoryRing {
    items: Vec<Option<String>>,
    index: usize,
}

impl HistoryRing {
    pub fn new() -> HistoryRing {
        HistoryRing {
            items: vec![None; MAX_CMD_HISTORY],
            index: 0,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// Step back one entry while browsing; refuses to pass the entry
    /// slot or an empty slot.
    fn up(&mut self, entry: usize) -> Option<String> {
        let prev = (self.index + MAX_CMD_HISTORY - 1) % MAX_CMD_HISTORY;
        if prev == entry {
            return None;
        }
        let item = self.items[prev].clone()?;
        self.index = prev;
        Some(item)
    }

    fn down(&mut self, entry: usize) -> Option<String> {
        if self.index == entry {
            return None;
        }
        let next = (self.index + 1) % MAX_CMD_HISTORY;
        self.index = next;
        self.items[next].clone()
    }

    fn submit(&mut self, entry: usize, line: &str) {
        self.items[entry] = Some(line.to_string());
        self.index = (entry + 1) % MAX_CMD_HISTORY;
    }

    fn restore(&mut self, entry: usize) {
        self.index = entry;
    }
}

#[derive(Debug, PartialEq, Eq)]
pub(crate) enum LineResult {
    Pending,
    Submit(String),
    Abort,
}

/// One open prompt: `:` commands and `/`/`\` searches share this.
#[derive(Debug)]
pub(crate) struct LineEditor {
    prompt: String,
    input: Vec<char>,
    pos: usize,
    entry: usize,
}

impl LineEditor {
    pub fn new(prompt: &str, history: &HistoryRing) -> LineEditor {
        LineEditor {
            prompt: prompt.to_string(),
            input: Vec::new(),
            pos: 0,
            entry: history.index(),
        }
    }

    pub fn handle(&mut self, key: KeyEvent, history: &mut HistoryRing) -> LineResult {
        if key.is_ctrl('c') {
            history.restore(self.entry);
            return LineResult::Abort;
        }
        if key.is_ctrl('a') {
            self.pos = 0;
            return LineResult::Pending;
        }
        if key.is_ctrl('e') {
            self.pos = self.input.len();
            return LineResult::Pending;
        }
        if key.is_ctrl('b') {
            self.pos = self.pos.saturating_sub(1);
            return LineResult::Pending;
        }
        if key.is_ctrl('f') {
            self.pos = (self.pos + 1).min(self.input.len());
            return LineResult::Pending;
        }
        if key.is_ctrl('u') {
            // Erase everything left of the cursor.
            self.input.drain(..self.pos);
            self.pos = 0;
            return LineResult::Pending;
        }

        match key.key() {
            Key::Esc => {
                history.restore(self.entry);
                LineResult::Abort
            }
            Key::Enter => {
                let line: String = self.input.iter().collect();
                if line.is_empty() {
                    history.restore(self.entry);
                    LineResult::Abort
                } else {
                    history.submit(self.entry, &line);
                    LineResult::Submit(line)
                }
            }
            Key::Backspace => {
                // Backspace at the start closes the prompt.
                if self.pos == 0 {
                    history.restore(self.entry);
                    return LineResult::Abort;
                }
                self.pos -= 1;
                self.input.remove(self.pos);
                LineResult::Pending
            }
            Key::Delete => {
                if self.pos < self.input.len() {
                    self.input.remove(self.pos);
                }
                LineResult::Pending
            }
            Key::Left => {
                self.pos = self.pos.saturating_sub(1);
                LineResult::Pending
            }
            Key::Right => {
                self.pos = (self.pos + 1).min(self.input.len());
                LineResult::Pending
            }
            Key::Up => {
                if let Some(line) = history.up(self.entry) {
                    self.input = line.chars().collect();
                    self.pos = self.input.len();
                }
                LineResult::Pending
            }
            Key::Down => {
                if let Some(line) = history.down(self.entry) {
                    self.input = line.chars().collect();
                    self.pos = self.input.len();
                }
                LineResult::Pending
            }
            _ => {
                if let Some(ch) = key.plain_char() {
                    if self.input.len() < MAX_CMD_BUF {
                        self.input.insert(self.pos, ch);
                        self.pos += 1;
                    }
                }
                LineResult::Pending
            }
        }
    }

    pub fn frame(&self) -> PromptFrame {
        PromptFrame {
            prompt: self.prompt.clone(),
            input: self.input.iter().collect(),
            cursor: self.pos,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn type_str(le: &mut LineEditor, hist: &mut HistoryRing, s: &str) {
        for ch in s.chars() {
            assert_eq!(LineResult::Pending, le.handle(KeyEvent::ch(ch), hist));
        }
    }

    fn submit(hist: &mut HistoryRing, s: &str) {
        let mut le = LineEditor::new(":", hist);
        type_str(&mut le, hist, s);
        assert_eq!(
            LineResult::Submit(s.to_string()),
            le.handle(KeyEvent::plain(Key::Enter), hist)
        );
    }

    #[test]
    fn backspace_at_start_aborts() {
        let mut hist = HistoryRing::new();
        let mut le = LineEditor::new(":", &hist);
        assert_eq!(
            LineResult::Abort,
            le.handle(KeyEvent::plain(Key::Backspace), &mut hist)
        );
    }

    #[test]
    fn empty_submit_does_not_advance_ring() {
        let mut hist = HistoryRing::new();
        let mut le = LineEditor::new(":", &hist);
        assert_eq!(
            LineResult::Abort,
            le.handle(KeyEvent::plain(Key::Enter), &mut hist)
        );
        assert_eq!(0, hist.index());
    }

    #[test]
    fn submit_stores_and_advances() {
        let mut hist = HistoryRing::new();
        submit(&mut hist, "w");
        assert_eq!(1, hist.index());
        submit(&mut hist, "q");
        assert_eq!(2, hist.index());
    }

    #[test]
    fn history_walk_up_down() {
        let mut hist = HistoryRing::new();
        submit(&mut hist, "first");
        submit(&mut hist, "second");

        let mut le = LineEditor::new(":", &hist);
        le.handle(KeyEvent::plain(Key::Up), &mut hist);
        assert_eq!("second", le.frame().input);
        le.handle(KeyEvent::plain(Key::Up), &mut hist);
        assert_eq!("first", le.frame().input);
        // Nothing older.
        le.handle(KeyEvent::plain(Key::Up), &mut hist);
        assert_eq!("first", le.frame().input);
        le.handle(KeyEvent::plain(Key::Down), &mut hist);
        assert_eq!("second", le.frame().input);
    }

    #[test]
    fn abort_restores_ring_position() {
        let mut hist = HistoryRing::new();
        submit(&mut hist, "one");
        let mut le = LineEditor::new(":", &hist);
        le.handle(KeyEvent::plain(Key::Up), &mut hist);
        le.handle(KeyEvent::plain(Key::Esc), &mut hist);
        assert_eq!(1, hist.index());
    }

    #[test]
    fn cursor_motion_and_editing() {
        let mut hist = HistoryRing::new();
        let mut le = LineEditor::new(":", &hist);
        type_str(&mut le, &mut hist, "st 4");
        le.handle(KeyEvent::ctrl('a'), &mut hist);
        type_str(&mut le, &mut hist, "e");
        assert_eq!("est 4", le.frame().input);
        le.handle(KeyEvent::ch('s'), &mut hist);
        // Went in at the cursor, not the end.
        assert_eq!("esst 4", le.frame().input);
        le.handle(KeyEvent::plain(Key::Backspace), &mut hist);
        assert_eq!("est 4", le.frame().input);
        le.handle(KeyEvent::ctrl('u'), &mut hist);
        assert_eq!("st 4", le.frame().input);
    }
}

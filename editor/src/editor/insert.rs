//! Byte collection for insert, overwrite and replace-one input.
//!
//! Typed bytes accumulate in a current group aligned to the grouping
//! preference; completed groups flush into the pending buffer. In the
//! hex window two digits make a byte, in the ASCII window every key is
//! one byte. Only whole groups are committed, matching the display
//! alignment.

use hexvi_messages::{EditOverlay, Key, KeyEvent, Pane};
use smallvec::SmallVec;

#[derive(Debug, PartialEq, Eq)]
pub(crate) enum EditKey {
    Pending,
    /// ESC or Ctrl-C: commit what was collected.
    Done,
    /// Key refused (non-hex digit, or writing past the end).
    Bell,
}

#[derive(Debug)]
pub(crate) struct EditInput {
    /// Address the collected bytes apply at.
    pub addr: u64,
    /// Entry key: i, I, a, A, R or r.
    pub entry: char,
    pub count: u64,
    /// Completed groups.
    pub buf: Vec<u8>,
    /// Bytes of the group being typed.
    pub group: SmallVec<[u8; 8]>,
    /// Odd leading hex digit.
    pub nibble: Option<char>,
}

impl EditInput {
    pub fn new(addr: u64, entry: char, count: u64) -> EditInput {
        EditInput {
            addr,
            entry,
            count,
            buf: Vec::new(),
            group: SmallVec::new(),
            nibble: None,
        }
    }

    pub fn typed(&self) -> usize {
        self.buf.len() + self.group.len()
    }

    /// Feed one key. `limit` is the file size for overwrite-style input
    /// which may not run past the end; inserts pass `None`.
    pub fn handle(
        &mut self,
        key: KeyEvent,
        pane: Pane,
        grouping: u64,
        limit: Option<u64>,
    ) -> EditKey {
        if key.is_ctrl('c') {
            return EditKey::Done;
        }
        match key.key() {
            Key::Esc => return EditKey::Done,
            Key::Backspace => {
                if self.nibble.take().is_some() {
                    return EditKey::Pending;
                }
                if self.group.pop().is_some() {
                    return EditKey::Pending;
                }
                if self.buf.pop().is_some() {
                    return EditKey::Pending;
                }
                return EditKey::Bell;
            }
            _ => {}
        }

        let ch = match key.plain_char() {
            Some(ch) => ch,
            None => return EditKey::Pending,
        };

        if let Some(limit) = limit {
            if self.addr + self.typed() as u64 >= limit {
                return EditKey::Bell;
            }
        }

        let byte = match pane {
            Pane::Hex => {
                if !ch.is_ascii_hexdigit() {
                    return EditKey::Bell;
                }
                match self.nibble.take() {
                    None => {
                        self.nibble = Some(ch);
                        return EditKey::Pending;
                    }
                    Some(hi) => {
                        let hi = hi.to_digit(16).unwrap_or(0) as u8;
                        let lo = ch.to_digit(16).unwrap_or(0) as u8;
                        (hi << 4) | lo
                    }
                }
            }
            Pane::Ascii => {
                let code = ch as u32;
                if code > 0xFF {
                    return EditKey::Bell;
                }
                code as u8
            }
        };

        self.group.push(byte);
        if self.group.len() as u64 >= grouping {
            self.buf.extend(self.group.drain(..));
        }
        EditKey::Pending
    }

    /// Whether a replace-one collection has its full group.
    pub fn group_complete(&self, grouping: u64) -> bool {
        self.buf.len() as u64 >= grouping
    }

    pub fn overlay(&self, hole: bool) -> EditOverlay {
        EditOverlay {
            addr: self.addr + self.buf.len() as u64,
            group: self.group.to_vec(),
            nibble: self.nibble,
            hole,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn hex(st: &mut EditInput, grouping: u64, s: &str) {
        for ch in s.chars() {
            assert_eq!(
                EditKey::Pending,
                st.handle(KeyEvent::ch(ch), Pane::Hex, grouping, None)
            );
        }
    }

    #[test]
    fn two_hex_digits_make_a_byte() {
        let mut st = EditInput::new(0, 'i', 1);
        hex(&mut st, 1, "4142");
        assert_eq!(vec![0x41, 0x42], st.buf);
    }

    #[test]
    fn non_hex_key_rings() {
        let mut st = EditInput::new(0, 'i', 1);
        assert_eq!(
            EditKey::Bell,
            st.handle(KeyEvent::ch('g'), Pane::Hex, 1, None)
        );
    }

    #[test]
    fn ascii_pane_takes_keys_literally() {
        let mut st = EditInput::new(0, 'i', 1);
        st.handle(KeyEvent::ch('A'), Pane::Ascii, 1, None);
        st.handle(KeyEvent::ch(' '), Pane::Ascii, 1, None);
        assert_eq!(vec![0x41, 0x20], st.buf);
    }

    #[test]
    fn grouping_holds_partial_groups() {
        let mut st = EditInput::new(0, 'i', 1);
        hex(&mut st, 4, "414243");
        // Three bytes typed, none committed until the group fills.
        assert!(st.buf.is_empty());
        assert_eq!(3, st.group.len());
        hex(&mut st, 4, "44");
        assert_eq!(vec![0x41, 0x42, 0x43, 0x44], st.buf);
        assert!(st.group.is_empty());
    }

    #[test]
    fn backspace_peels_nibble_byte_then_buf() {
        let mut st = EditInput::new(0, 'i', 1);
        hex(&mut st, 2, "4142");
        hex(&mut st, 2, "4");
        assert_eq!(Some('4'), st.nibble);
        let bs = KeyEvent::plain(Key::Backspace);
        st.handle(bs, Pane::Hex, 2, None);
        assert_eq!(None, st.nibble);
        st.handle(bs, Pane::Hex, 2, None);
        st.handle(bs, Pane::Hex, 2, None);
        assert!(st.buf.is_empty() && st.group.is_empty());
        assert_eq!(EditKey::Bell, st.handle(bs, Pane::Hex, 2, None));
    }

    #[test]
    fn overwrite_refuses_past_end() {
        let mut st = EditInput::new(2, 'R', 1);
        assert_eq!(
            EditKey::Pending,
            st.handle(KeyEvent::ch('x'), Pane::Ascii, 1, Some(4))
        );
        assert_eq!(
            EditKey::Pending,
            st.handle(KeyEvent::ch('y'), Pane::Ascii, 1, Some(4))
        );
        assert_eq!(
            EditKey::Bell,
            st.handle(KeyEvent::ch('z'), Pane::Ascii, 1, Some(4))
        );
    }

    #[test]
    fn esc_finishes() {
        let mut st = EditInput::new(0, 'i', 1);
        assert_eq!(
            EditKey::Done,
            st.handle(KeyEvent::plain(Key::Esc), Pane::Hex, 1, None)
        );
    }
}

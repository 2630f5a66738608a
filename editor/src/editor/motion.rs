//! Word motions over the byte stream.
//!
//! Bytes fall into three classes: alphanumeric, whitespace (space, tab
//! and everything non-printable) and punctuation (the rest). Lowercase
//! motions stop on alphanumeric/punctuation transitions; the uppercase
//! variants treat only whitespace as a delimiter. The scan pulls
//! 256-byte windows through the buffer reader.

use hexvi_buffer::FileManager;

const WINDOW: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Class {
    Alnum,
    White,
    Punct,
}

fn class_of(b: u8) -> Class {
    if b.is_ascii_alphanumeric() {
        Class::Alnum
    } else if b == b' ' || b == b'\t' || !(0x20..=0x7e).contains(&b) {
        Class::White
    } else {
        Class::Punct
    }
}

/// `w`/`W` (start of next word) and `e`/`E` (end of word). Returns the
/// target address, or None when no further word exists.
pub(crate) fn word_forward(fm: &FileManager, start: u64, key: char) -> Option<u64> {
    let ws_only = key == 'W' || key == 'E';
    let to_end = key == 'e' || key == 'E';

    let mut buf = [0u8; WINDOW];
    let mut next_addr = start;
    let mut size = fm.get_buf(&mut buf, next_addr).ok()?;
    if size == 0 {
        return None;
    }
    let mut current = buf[0];

    while size > 0 {
        for i in 0..size {
            let b = buf[i];
            let cc = class_of(current);
            let bc = class_of(b);

            if to_end {
                match cc {
                    Class::Alnum | Class::Punct => {
                        let boundary =
                            bc == Class::White || (!ws_only && bc != Class::White && bc != cc);
                        if boundary {
                            if i == 1 && next_addr == start {
                                // On the last byte of a word already:
                                // move on to the end of the next one.
                                current = b;
                                continue;
                            }
                            return Some(next_addr + i as u64 - 1);
                        }
                    }
                    Class::White => {
                        if bc != Class::White {
                            current = b;
                        }
                    }
                }
            } else {
                match cc {
                    Class::Alnum | Class::Punct => {
                        if bc == Class::White {
                            current = b;
                        } else if !ws_only && bc != cc {
                            return Some(next_addr + i as u64);
                        }
                    }
                    Class::White => {
                        if bc != Class::White {
                            return Some(next_addr + i as u64);
                        }
                    }
                }
            }
        }

        next_addr += size as u64;
        size = fm.get_buf(&mut buf, next_addr).ok()?;
    }

    // Ran off the end. For e/E the end of the file closes the current
    // run; w/W has no next word to land on.
    if to_end && class_of(current) != Class::White {
        let last = fm.size().saturating_sub(1);
        if last > start {
            return Some(last);
        }
    }
    None
}

/// `b`/`B`: backward to the start of the current (or previous) word.
pub(crate) fn word_back(fm: &FileManager, start: u64, key: char) -> Option<u64> {
    let ws_only = key == 'B';
    if start == 0 {
        return None;
    }

    let mut buf = [0u8; WINDOW];
    let (mut next_addr, mut want) = if start >= (WINDOW as u64 - 1) {
        (start - (WINDOW as u64 - 1), WINDOW)
    } else {
        (0, start as usize + 1)
    };
    let first_addr = next_addr;
    let mut size = fm.get_buf(&mut buf[..want], next_addr).ok()?;
    if size == 0 {
        return None;
    }
    let mut current = buf[size - 1];

    loop {
        for i in (0..size).rev() {
            let b = buf[i];
            let cc = class_of(current);
            let bc = class_of(b);

            match cc {
                Class::Alnum | Class::Punct => {
                    let boundary =
                        bc == Class::White || (!ws_only && bc != Class::White && bc != cc);
                    if boundary {
                        if i + 2 == size && next_addr == first_addr {
                            // Standing on the first byte of a word:
                            // keep going to the previous one.
                            current = b;
                            continue;
                        }
                        return Some(next_addr + i as u64 + 1);
                    }
                }
                Class::White => {
                    if bc != Class::White {
                        current = b;
                    }
                }
            }
        }

        if next_addr == 0 {
            // The word runs to the start of the file.
            return Some(0);
        }
        want = WINDOW.min(next_addr as usize);
        next_addr -= want as u64;
        size = fm.get_buf(&mut buf[..want], next_addr).ok()?;
        if size == 0 {
            return Some(0);
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn fm(bytes: &[u8]) -> FileManager {
        FileManager::from_bytes(bytes.to_vec())
    }

    #[test]
    fn w_stops_on_class_transitions() {
        let f = fm(b"abc   ,,,def");
        assert_eq!(Some(6), word_forward(&f, 0, 'w'));
        assert_eq!(Some(9), word_forward(&f, 6, 'w'));
        assert_eq!(None, word_forward(&f, 9, 'w'));
    }

    #[test]
    fn upper_w_only_whitespace_delimits() {
        let f = fm(b"ab,cd ef");
        // ",": not a boundary for W.
        assert_eq!(Some(6), word_forward(&f, 0, 'W'));
        let f = fm(b"abc   ,,,def");
        // The ,,,def run is one W-word starting after the spaces.
        assert_eq!(Some(6), word_forward(&f, 0, 'W'));
    }

    #[test]
    fn e_lands_on_word_end() {
        let f = fm(b"abc def");
        assert_eq!(Some(2), word_forward(&f, 0, 'e'));
        // From a word end, e moves to the next word's end.
        assert_eq!(Some(6), word_forward(&f, 2, 'e'));
    }

    #[test]
    fn e_through_punctuation_run() {
        let f = fm(b"abc   ,,,def");
        assert_eq!(Some(2), word_forward(&f, 0, 'e'));
        assert_eq!(Some(8), word_forward(&f, 2, 'e'));
    }

    #[test]
    fn b_finds_word_starts() {
        let f = fm(b"abc def");
        assert_eq!(Some(4), word_back(&f, 6, 'b'));
        // From a word start, b keeps going to the previous word.
        assert_eq!(Some(0), word_back(&f, 4, 'b'));
        assert_eq!(None, word_back(&f, 0, 'b'));
    }

    #[test]
    fn b_over_punctuation() {
        let f = fm(b"ab..cd");
        assert_eq!(Some(4), word_back(&f, 5, 'b'));
        assert_eq!(Some(2), word_back(&f, 4, 'b'));
        // B sees ab..cd as a single word.
        assert_eq!(Some(0), word_back(&f, 5, 'B'));
    }

    #[test]
    fn motion_across_window_boundary() {
        // A word that starts past the first 256-byte window.
        let mut data = vec![b'x'; 300];
        data[260] = b' ';
        let f = fm(&data);
        assert_eq!(Some(261), word_forward(&f, 0, 'w'));
    }

    #[test]
    fn nonprintable_counts_as_whitespace() {
        let f = fm(&[b'a', 0x00, 0x01, b'z', b'z']);
        assert_eq!(Some(3), word_forward(&f, 0, 'w'));
    }
}

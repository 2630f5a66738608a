//! Literal pattern search over the byte stream.
//!
//! Two flavors: `/` takes the pattern bytes as typed, `\` takes pairs of
//! hex digits. Scans run through the buffer reader in windows with a
//! pattern-sized overlap and wrap around the file once.

use hexvi_buffer::FileManager;

const SEARCH_WINDOW: usize = 4096;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SearchFlavor {
    Ascii,
    Hex,
}

#[derive(Debug, Default)]
pub(crate) struct SearchState {
    pub pattern: Vec<u8>,
    pub ignorecase: bool,
    pub backward: bool,
    /// Inclusive range of the last match.
    pub highlight: Option<(u64, u64)>,
}

impl SearchState {
    pub fn is_set(&self) -> bool {
        !self.pattern.is_empty()
    }
}

/// Each pair of hex digits is one byte; whitespace between pairs is
/// allowed, an odd digit count is not.
pub(crate) fn parse_hex_pattern(input: &str) -> Option<Vec<u8>> {
    let digits: Vec<u8> = input
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| c.to_digit(16).map(|d| d as u8))
        .collect::<Option<_>>()?;
    if digits.is_empty() || digits.len() % 2 != 0 {
        return None;
    }
    Some(digits.chunks(2).map(|p| (p[0] << 4) | p[1]).collect())
}

fn matches_at(window: &[u8], at: usize, pattern: &[u8], ignorecase: bool) -> bool {
    if at + pattern.len() > window.len() {
        return false;
    }
    window[at..at + pattern.len()]
        .iter()
        .zip(pattern)
        .all(|(a, b)| {
            if ignorecase {
                a.eq_ignore_ascii_case(b)
            } else {
                a == b
            }
        })
}

/// First match at or after `from`, without wrapping.
fn scan_forward(fm: &FileManager, pattern: &[u8], from: u64, ignorecase: bool) -> Option<u64> {
    let size = fm.size();
    if pattern.is_empty() || from >= size {
        return None;
    }
    let mut buf = vec![0u8; SEARCH_WINDOW + pattern.len() - 1];
    let mut base = from;
    while base < size {
        let got = fm.get_buf(&mut buf, base).ok()?;
        for i in 0..got.min(SEARCH_WINDOW) {
            if matches_at(&buf[..got], i, pattern, ignorecase) {
                return Some(base + i as u64);
            }
        }
        base += SEARCH_WINDOW as u64;
    }
    None
}

/// Last match starting at or before `from`, without wrapping.
fn scan_backward(fm: &FileManager, pattern: &[u8], from: u64, ignorecase: bool) -> Option<u64> {
    let size = fm.size();
    if pattern.is_empty() || size == 0 {
        return None;
    }
    let from = from.min(size.saturating_sub(1));
    let mut buf = vec![0u8; SEARCH_WINDOW + pattern.len() - 1];
    let mut base = from.saturating_sub(SEARCH_WINDOW as u64 - 1);
    loop {
        let got = fm.get_buf(&mut buf, base).ok()?;
        let last = ((from - base) as usize).min(got.saturating_sub(1));
        for i in (0..=last).rev() {
            if matches_at(&buf[..got], i, pattern, ignorecase) {
                return Some(base + i as u64);
            }
        }
        if base == 0 {
            return None;
        }
        base = base.saturating_sub(SEARCH_WINDOW as u64);
    }
}

/// Search from `from` in the given direction, wrapping around the file
/// once. Returns the match address.
pub(crate) fn find(
    fm: &FileManager,
    pattern: &[u8],
    from: u64,
    backward: bool,
    ignorecase: bool,
) -> Option<u64> {
    let size = fm.size();
    if size == 0 || pattern.is_empty() {
        return None;
    }
    if backward {
        scan_backward(fm, pattern, from, ignorecase)
            .or_else(|| scan_backward(fm, pattern, size.saturating_sub(1), ignorecase))
    } else {
        scan_forward(fm, pattern, from, ignorecase)
            .or_else(|| scan_forward(fm, pattern, 0, ignorecase))
    }
}

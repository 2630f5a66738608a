//! In-place materialization of the piece graph onto the backing file.
//!
//! Shifts file regions through a bounded window instead of rewriting the
//! file in memory: displaced original bytes are held in a FIFO capped at
//! the window size in the normal case. A net insertion backlog larger
//! than the window grows the FIFO past it (documented choice; the
//! alternative would be cascading shifts per window chunk). Regions with
//! no accumulated shift are skipped without any I/O.

use std::cmp;
use std::collections::VecDeque;
use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom, Write};

use super::graph::{Graph, ROOT};
use super::node::NodeKind;
use super::original::OriginalFile;

/// Size of the byte-shifting window, 4 MiB.
pub const SAVE_WINDOW: usize = 4 * 1024 * 1024;

struct Shifter<'a> {
    file: &'a mut File,
    window: usize,
    orig_len: u64,
    /// Next original byte not yet pulled off the disk.
    in_pos: u64,
    /// Next output byte to write.
    out_pos: u64,
    /// Displaced original bytes: the stream `[sp, in_pos)` where
    /// `sp = in_pos - pending.len()` is the next stream byte to consume.
    pending: VecDeque<u8>,
    scratch: Vec<u8>,
    /// Final file size, for progress percentages.
    total: u64,
}

impl<'a> Shifter<'a> {
    /// Next unconsumed byte of the original stream.
    #[inline]
    fn sp(&self) -> u64 {
        self.in_pos - self.pending.len() as u64
    }

    /// Pull original bytes off the disk into the FIFO until `in_pos`
    /// reaches `target` (clamped to the original length). Every byte a
    /// write may clobber must have passed through here first.
    fn fill_to(&mut self, target: u64) -> io::Result<()> {
        let target = cmp::min(target, self.orig_len);
        while self.in_pos < target {
            let k = cmp::min(self.window as u64, target - self.in_pos) as usize;
            self.scratch.resize(k, 0);
            self.file.seek(SeekFrom::Start(self.in_pos))?;
            let mut read = 0;
            while read < k {
                let n = self.file.read(&mut self.scratch[read..k])?;
                if n == 0 {
                    break;
                }
                read += n;
            }
            if read == 0 {
                break;
            }
            self.pending.extend(&self.scratch[..read]);
            self.in_pos += read as u64;
        }
        Ok(())
    }

    fn write_out(&mut self, len: usize) -> io::Result<()> {
        self.file.seek(SeekFrom::Start(self.out_pos))?;
        self.file.write_all(&self.scratch[..len])?;
        self.out_pos += len as u64;
        Ok(())
    }

    /// Copy `n` original-stream bytes to the output position.
    fn emit_original(&mut self, n: u64, progress: &mut dyn FnMut(u8)) -> io::Result<()> {
        let mut left = n;
        while left > 0 {
            // No shift accumulated: the bytes are already in place.
            if self.pending.is_empty() && self.sp() == self.out_pos {
                let skip = cmp::min(left, self.orig_len.saturating_sub(self.in_pos));
                if skip == 0 {
                    break;
                }
                self.in_pos += skip;
                self.out_pos += skip;
                left -= skip;
                continue;
            }

            let k = cmp::min(left, self.window as u64);
            let target = cmp::max(self.sp() + k, self.out_pos + k);
            self.fill_to(target)?;
            let k = cmp::min(k as usize, self.pending.len());
            if k == 0 {
                break;
            }
            self.scratch.clear();
            self.scratch.extend(self.pending.drain(..k));
            self.write_out(k)?;
            left -= k as u64;
            progress(pct(self.out_pos, self.total));
        }
        Ok(())
    }

    /// Drop `n` original-stream bytes (they are shadowed or deleted).
    fn discard_original(&mut self, n: u64) -> io::Result<()> {
        let mut left = n;
        if self.pending.is_empty() {
            let skip = cmp::min(left, self.orig_len.saturating_sub(self.in_pos));
            self.in_pos += skip;
            left -= skip;
        }
        if left > 0 {
            self.fill_to(self.sp() + left)?;
            let k = cmp::min(left as usize, self.pending.len());
            self.pending.drain(..k);
        }
        Ok(())
    }

    /// Write edit payload bytes at the output position, stashing any
    /// original bytes they would clobber first.
    fn write_payload(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.fill_to(self.out_pos + bytes.len() as u64)?;
        self.scratch.clear();
        self.scratch.extend_from_slice(bytes);
        self.write_out(bytes.len())
    }
}

#[inline]
fn pct(done: u64, total: u64) -> u8 {
    cmp::min(done * 100 / cmp::max(total, 1), 100) as u8
}

/// Shift the file into its edited form. `file` is open read+write; the
/// graph is walked top-level in logical order, payload bytes are resolved
/// through the graph so nested overlays come out flat. Returns the new
/// file length; the caller truncates nothing and collapses the graph
/// afterwards.
pub(crate) fn save_in_place(
    graph: &Graph,
    file: &mut File,
    window: usize,
    progress: &mut dyn FnMut(u8),
) -> io::Result<u64> {
    let orig_len = file.metadata()?.len();
    let total = graph.size();
    let mut sh = Shifter {
        file,
        window,
        orig_len,
        in_pos: 0,
        out_pos: 0,
        pending: VecDeque::new(),
        scratch: Vec::with_capacity(cmp::min(window, 64 * 1024)),
        total,
    };
    // Payload reads resolve insert/replace data only and never touch the
    // half-shifted disk contents.
    let detached = OriginalFile::new();

    let mut logical = 0;
    let children: Vec<_> = graph.node(ROOT).children.to_vec();
    for ch in children {
        let node = graph.node(ch);
        if !node.active || node.size == 0 {
            continue;
        }

        let gap = node.start.saturating_sub(logical);
        sh.emit_original(gap, progress)?;
        logical += gap;

        match node.kind {
            NodeKind::Delete => sh.discard_original(node.size)?,
            NodeKind::Insert | NodeKind::Replace => {
                let v = node.visible();
                sh.discard_original(node.consumed())?;
                let mut buf = vec![0u8; cmp::min(v as usize, window)];
                let mut done = 0;
                while done < v {
                    let k = cmp::min(v - done, window as u64) as usize;
                    let n = graph.read_node_at(&detached, ch, done, &mut buf[..k])?;
                    if n == 0 {
                        break;
                    }
                    sh.write_payload(&buf[..n])?;
                    done += n as u64;
                    progress(pct(sh.out_pos, total));
                }
                logical += v;
            }
            NodeKind::File => {}
        }
        progress(pct(sh.out_pos, total));
    }

    let rest = orig_len.saturating_sub(sh.sp());
    sh.emit_original(rest, progress)?;

    let new_len = sh.out_pos;
    debug_assert_eq!(new_len, graph.size(), "save drifted from logical size");
    if new_len < orig_len {
        sh.file.set_len(new_len)?;
    }
    sh.file.flush()?;
    progress(100);
    Ok(new_len)
}

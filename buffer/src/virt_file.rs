//! The virtual file: edits overlaid on an on-disk file without rewriting
//! it in memory.
//!
//! A [`FileManager`] owns the backing file, the piece graph of edits and
//! the undo log. Readers stream the edited view through [`get_buf`];
//! [`save`] shifts the file into its edited form in place through a
//! bounded window.
//!
//! [`get_buf`]: FileManager::get_buf
//! [`save`]: FileManager::save

mod graph;
mod node;
mod original;
pub mod ring;
mod save;
mod undo;

use std::cmp;
use std::env;
use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use self::graph::Graph;
use self::node::{NodeId, NodeKind};
use self::original::OriginalFile;
use self::undo::UndoLog;

pub use self::save::SAVE_WINDOW;

/// Expand a leading `~` against `HOME`. Anything else passes through.
pub fn expand_path<P: AsRef<Path>>(input: P) -> PathBuf {
    let p = input.as_ref();
    if let Some(s) = p.to_str() {
        if let Some(rest) = s.strip_prefix('~') {
            if let Ok(home) = env::var("HOME") {
                return PathBuf::from(format!("{}{}", home, rest));
            }
        }
    }
    p.to_path_buf()
}

/// One open file: name, handle, piece graph and undo log.
#[derive(Debug)]
pub struct FileManager {
    path: Option<PathBuf>,
    original: OriginalFile,
    graph: Graph,
    log: UndoLog,
    save_window: usize,
}

impl FileManager {
    /// A buffer with no backing file. It acquires one through
    /// [`create_file`](Self::create_file) at first save.
    pub fn empty() -> FileManager {
        FileManager {
            path: None,
            original: OriginalFile::new(),
            graph: Graph::new(0),
            log: UndoLog::new(),
            save_window: SAVE_WINDOW,
        }
    }

    /// Open `path`, creating it empty when it does not exist yet.
    /// Directories are refused.
    pub fn open<P: AsRef<Path>>(path: P) -> io::Result<FileManager> {
        let path = path.as_ref();
        if path.is_dir() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{} is a directory", path.display()),
            ));
        }
        if !path.exists() {
            OpenOptions::new().append(true).create(true).open(path)?;
        }
        let original = OriginalFile::from_file(File::open(path)?)?;
        let len = original.len();
        Ok(FileManager {
            path: Some(path.to_path_buf()),
            original,
            graph: Graph::new(len),
            log: UndoLog::new(),
            save_window: SAVE_WINDOW,
        })
    }

    /// An in-memory buffer over the given bytes. Used by readers that
    /// already hold the content, and pervasively by tests.
    pub fn from_bytes(bytes: Vec<u8>) -> FileManager {
        let len = bytes.len() as u64;
        FileManager {
            path: None,
            original: OriginalFile::from_bytes(bytes),
            graph: Graph::new(len),
            log: UndoLog::new(),
            save_window: SAVE_WINDOW,
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Final component of the path, for status lines.
    pub fn file_name(&self) -> Option<String> {
        let path = self.path.as_ref()?;
        Some(
            path.file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string()),
        )
    }

    /// Logical file size under the active edits.
    #[inline]
    pub fn size(&self) -> u64 {
        self.graph.size()
    }

    /// Override the byte-shifting window used by save.
    pub fn set_save_window(&mut self, window: usize) {
        self.save_window = window.max(1);
    }

    /// Resolve the edited view: fill `dest` starting at logical `offset`.
    /// Returns the bytes produced, short at end of file. Hidden bytes are
    /// never exposed.
    pub fn get_buf(&self, dest: &mut [u8], offset: u64) -> io::Result<usize> {
        self.graph.read_at(&self.original, dest, offset)
    }

    pub fn get_char(&self, offset: u64) -> Option<u8> {
        let mut b = [0u8; 1];
        match self.get_buf(&mut b, offset) {
            Ok(1) => Some(b[0]),
            _ => None,
        }
    }

    /// Splice `buf` in before logical `offset`. Returns the number of
    /// bytes inserted; zero when the offset is invalid.
    pub fn insert_before(&mut self, offset: u64, buf: &[u8]) -> u64 {
        self.prune();
        match self.graph.insert(offset, buf) {
            Some(id) => {
                self.log.push(vec![id]);
                buf.len() as u64
            }
            None => 0,
        }
    }

    /// Splice `buf` in after the byte at `offset`.
    pub fn insert_after(&mut self, offset: u64, buf: &[u8]) -> u64 {
        self.insert_before(offset + 1, buf)
    }

    /// Shadow bytes starting at `offset` with `buf`, clamped to the end
    /// of the file. Visible size is unchanged. Returns bytes replaced.
    pub fn replace(&mut self, offset: u64, buf: &[u8]) -> u64 {
        self.prune();
        let mut nodes = Vec::new();
        let done = self.graph.replace(offset, buf, &mut nodes);
        if !nodes.is_empty() {
            self.log.push(nodes);
        }
        done
    }

    /// Hide `len` bytes starting at `offset`, clamped to the end of the
    /// file. Returns bytes deleted.
    pub fn delete(&mut self, offset: u64, len: u64) -> u64 {
        self.prune();
        let mut nodes = Vec::new();
        let done = self.graph.delete(offset, len, &mut nodes);
        if !nodes.is_empty() {
            self.log.push(nodes);
        }
        done
    }

    /// Undo up to `count` change groups. Returns the number undone and
    /// the address of the last node toggled, for cursor placement.
    pub fn undo(&mut self, count: u64) -> (u64, Option<u64>) {
        let mut done = 0;
        let mut addr = None;
        while done < count {
            let i = match self.log.last_applied() {
                Some(i) => i,
                None => break,
            };
            let nodes = self.log.group(i).nodes.clone();
            for id in nodes {
                self.toggle_off(id);
                addr = Some(self.graph.abs_start(id));
            }
            self.log.group_mut(i).applied = false;
            done += 1;
        }
        (done, addr)
    }

    /// Re-apply up to `count` undone groups.
    pub fn redo(&mut self, count: u64) -> (u64, Option<u64>) {
        let mut done = 0;
        let mut addr = None;
        while done < count {
            let i = match self.log.first_unapplied() {
                Some(i) => i,
                None => break,
            };
            let nodes = self.log.group(i).nodes.clone();
            for id in nodes {
                self.toggle_on(id);
                addr = Some(self.graph.abs_start(id));
            }
            self.log.group_mut(i).applied = true;
            done += 1;
        }
        (done, addr)
    }

    fn toggle_off(&mut self, id: NodeId) {
        let (kind, size) = {
            let n = self.graph.node(id);
            (n.kind, n.size)
        };
        match kind {
            NodeKind::Insert => self.graph.apply_delta(id, -(size as i64)),
            NodeKind::Delete => self.graph.apply_delta(id, size as i64),
            NodeKind::Replace | NodeKind::File => {}
        }
        self.graph.node_mut(id).active = false;
    }

    fn toggle_on(&mut self, id: NodeId) {
        let (kind, size) = {
            let n = self.graph.node(id);
            (n.kind, n.size)
        };
        self.graph.node_mut(id).active = true;
        match kind {
            NodeKind::Insert => self.graph.apply_delta(id, size as i64),
            NodeKind::Delete => self.graph.apply_delta(id, -(size as i64)),
            NodeKind::Replace | NodeKind::File => {}
        }
    }

    /// Drop undone groups and free their nodes. Every edit runs through
    /// this first, so the redo history a new edit invalidates never
    /// lingers. Node ids ascend in edit order, which makes the freed set
    /// exactly the arena tail.
    fn prune(&mut self) {
        let dropped = self.log.prune();
        if dropped.is_empty() {
            return;
        }
        let mut first: Option<NodeId> = None;
        for group in &dropped {
            for &id in &group.nodes {
                self.graph.unlink(id);
                first = Some(match first {
                    Some(f) => cmp::min(f, id),
                    None => id,
                });
            }
        }
        if let Some(f) = first {
            self.graph.truncate(f);
        }
    }

    /// Whether any applied change has not reached the disk.
    pub fn needs_save(&self) -> bool {
        self.log.needs_save()
    }

    /// A buffer opened empty has no backing file yet and needs
    /// [`create_file`](Self::create_file) before it can save.
    pub fn needs_create(&self) -> bool {
        self.path.is_none()
    }

    /// Bind an empty buffer to a new file. Refused when the target
    /// already exists or when the buffer carries in-memory original
    /// content.
    pub fn create_file<P: AsRef<Path>>(&mut self, path: P) -> io::Result<()> {
        let path = path.as_ref();
        if path.exists() {
            return Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("{} already exists", path.display()),
            ));
        }
        if self.original.len() != 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "buffer already has content backing",
            ));
        }
        OpenOptions::new().write(true).create_new(true).open(path)?;
        self.original = OriginalFile::from_file(File::open(path)?)?;
        self.path = Some(path.to_path_buf());
        Ok(())
    }

    /// Materialize the edited view onto the backing file in place,
    /// reporting integer percent progress. On success the graph collapses
    /// to a fresh file node, history is persisted and the handle is
    /// reopened read-only. Returns the new size.
    pub fn save(&mut self, progress: &mut dyn FnMut(u8)) -> io::Result<u64> {
        self.prune();
        let path = match self.path.clone() {
            Some(p) => p,
            None => {
                return Err(io::Error::new(io::ErrorKind::InvalidInput, "no file name"));
            }
        };

        // Close the read handle before reopening for writing.
        self.original = OriginalFile::new();
        let mut file = match OpenOptions::new().read(true).write(true).open(&path) {
            Ok(f) => f,
            Err(e) => {
                self.reopen(&path);
                return Err(e);
            }
        };

        let res = save::save_in_place(&self.graph, &mut file, self.save_window, progress);
        drop(file);
        match res {
            Ok(new_len) => {
                self.original = OriginalFile::from_file(File::open(&path)?)?;
                self.graph.reset(new_len);
                self.log.clear();
                log::info!("saved {} ({} bytes)", path.display(), new_len);
                Ok(new_len)
            }
            Err(e) => {
                self.reopen(&path);
                Err(e)
            }
        }
    }

    fn reopen(&mut self, path: &Path) {
        match File::open(path).and_then(OriginalFile::from_file) {
            Ok(orig) => self.original = orig,
            Err(e) => log::warn!("could not reopen {}: {}", path.display(), e),
        }
    }

    /// Stream the edited view to `path` without touching this buffer.
    pub fn save_copy<P: AsRef<Path>>(&self, path: P) -> io::Result<u64> {
        let mut out = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(path.as_ref())?;
        let mut buf = vec![0u8; 64 * 1024];
        let mut pos = 0;
        loop {
            let n = self.get_buf(&mut buf, pos)?;
            if n == 0 {
                break;
            }
            io::Write::write_all(&mut out, &buf[..n])?;
            pos += n as u64;
        }
        Ok(pos)
    }

    /// Write the view to `path` and rebind the buffer to it.
    pub fn save_as<P: AsRef<Path>>(&mut self, path: P) -> io::Result<u64> {
        let path = path.as_ref();
        let len = self.save_copy(path)?;
        self.original = OriginalFile::from_file(File::open(path)?)?;
        self.path = Some(path.to_path_buf());
        self.graph.reset(len);
        self.log.clear();
        Ok(len)
    }

    /// Reread the backing file, discarding every edit.
    pub fn reload(&mut self) -> io::Result<()> {
        let path = match self.path.clone() {
            Some(p) => p,
            None => {
                return Err(io::Error::new(io::ErrorKind::InvalidInput, "no file name"));
            }
        };
        self.original = OriginalFile::from_file(File::open(&path)?)?;
        self.graph.reset(self.original.len());
        self.log.clear();
        Ok(())
    }

    /// Number of change groups currently recorded.
    pub fn undo_depth(&self) -> usize {
        self.log.len()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use rand_chacha::rand_core::{RngCore, SeedableRng};
    use std::io::{Read as _, Write as _};

    fn view(fm: &FileManager) -> Vec<u8> {
        let mut buf = vec![0u8; fm.size() as usize];
        let n = fm.get_buf(&mut buf, 0).unwrap();
        buf.truncate(n);
        buf
    }

    #[test]
    fn expand_path_home() {
        std::env::set_var("HOME", "/home/me");
        assert_eq!(PathBuf::from("/home/me/x"), expand_path("~/x"));
        assert_eq!(PathBuf::from("/etc/hosts"), expand_path("/etc/hosts"));
    }

    #[test]
    fn insert_then_read() {
        let mut fm = FileManager::from_bytes(vec![0xAA, 0xBB, 0xCC, 0xDD]);
        assert_eq!(2, fm.insert_before(0, &[0x41, 0x42]));
        assert_eq!(vec![0x41, 0x42, 0xAA, 0xBB, 0xCC, 0xDD], view(&fm));
        assert_eq!(6, fm.size());
    }

    #[test]
    fn delete_twice_then_undo() {
        // x x u on 00 11 22 33.
        let mut fm = FileManager::from_bytes(vec![0x00, 0x11, 0x22, 0x33]);
        assert_eq!(1, fm.delete(0, 1));
        assert_eq!(vec![0x11, 0x22, 0x33], view(&fm));
        assert_eq!(1, fm.delete(0, 1));
        assert_eq!(vec![0x22, 0x33], view(&fm));

        let (done, addr) = fm.undo(1);
        assert_eq!(1, done);
        assert_eq!(Some(0), addr);
        assert_eq!(vec![0x11, 0x22, 0x33], view(&fm));

        let mut buf = [0u8; 3];
        assert_eq!(3, fm.get_buf(&mut buf, 0).unwrap());
        assert_eq!([0x11, 0x22, 0x33], buf);
    }

    #[test]
    fn undo_redo_round_trip() {
        let mut fm = FileManager::from_bytes(b"hello world".to_vec());
        fm.insert_before(5, b"!!");
        fm.delete(0, 2);
        fm.replace(0, b"XY");
        let full = view(&fm);

        let (done, _) = fm.undo(3);
        assert_eq!(3, done);
        assert_eq!(b"hello world".to_vec(), view(&fm));
        // Nothing further to undo.
        assert_eq!(0, fm.undo(1).0);

        let (done, _) = fm.redo(3);
        assert_eq!(3, done);
        assert_eq!(full, view(&fm));
        assert_eq!(0, fm.redo(1).0);
    }

    #[test]
    fn edit_after_undo_prunes_redo() {
        let mut fm = FileManager::from_bytes(b"abcdef".to_vec());
        fm.insert_before(0, b"1");
        fm.insert_before(0, b"2");
        fm.undo(1);
        assert_eq!(b"1abcdef".to_vec(), view(&fm));

        fm.delete(0, 1);
        assert_eq!(b"abcdef".to_vec(), view(&fm));
        // The undone insert is gone for good.
        assert_eq!(0, fm.redo(1).0);
        assert_eq!(2, fm.undo_depth());
    }

    #[test]
    fn needs_save_tracking() {
        let mut fm = FileManager::from_bytes(b"ab".to_vec());
        assert!(!fm.needs_save());
        fm.insert_before(0, b"x");
        assert!(fm.needs_save());
        fm.undo(1);
        assert!(!fm.needs_save());
        fm.redo(1);
        assert!(fm.needs_save());
    }

    #[test]
    fn insert_after_last_byte() {
        let mut fm = FileManager::from_bytes(b"ab".to_vec());
        assert_eq!(1, fm.insert_after(1, b"c"));
        assert_eq!(b"abc".to_vec(), view(&fm));
        // Past the end is refused.
        assert_eq!(0, fm.insert_after(5, b"z"));
    }

    #[test]
    fn replace_spanning_tail_clamps() {
        let mut fm = FileManager::from_bytes(b"abcd".to_vec());
        assert_eq!(2, fm.replace(2, b"XXXX"));
        assert_eq!(b"abXX".to_vec(), view(&fm));
        assert_eq!(4, fm.size());
    }

    fn write_temp(bytes: &[u8]) -> tempfile::NamedTempFile {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        tmp.write_all(bytes).unwrap();
        tmp.flush().unwrap();
        tmp
    }

    fn disk_bytes(path: &Path) -> Vec<u8> {
        let mut buf = Vec::new();
        File::open(path).unwrap().read_to_end(&mut buf).unwrap();
        buf
    }

    #[test]
    fn save_round_trip() {
        let tmp = write_temp(&[0xAA, 0xBB, 0xCC, 0xDD]);
        let mut fm = FileManager::open(tmp.path()).unwrap();
        fm.insert_before(0, &[0x41, 0x42]);

        let expected = view(&fm);
        let mut last = 0;
        let new_len = fm.save(&mut |p| last = p).unwrap();
        assert_eq!(100, last);
        assert_eq!(6, new_len);
        assert_eq!(expected, disk_bytes(tmp.path()));
        assert_eq!(vec![0x41, 0x42, 0xAA, 0xBB, 0xCC, 0xDD], expected);

        // Collapsed: nothing left to undo, nothing unsaved.
        assert!(!fm.needs_save());
        assert_eq!(0, fm.undo(1).0);
        assert_eq!(expected, view(&fm));
    }

    #[test]
    fn save_shrinking_file() {
        let tmp = write_temp(b"0123456789");
        let mut fm = FileManager::open(tmp.path()).unwrap();
        fm.delete(2, 5);
        let expected = view(&fm);

        fm.save(&mut |_| {}).unwrap();
        assert_eq!(b"01789".to_vec(), disk_bytes(tmp.path()));
        assert_eq!(expected, disk_bytes(tmp.path()));
    }

    #[test]
    fn save_everything_deleted_truncates_to_zero() {
        let tmp = write_temp(b"0123456789");
        let mut fm = FileManager::open(tmp.path()).unwrap();
        fm.delete(0, 10);
        fm.save(&mut |_| {}).unwrap();
        assert!(disk_bytes(tmp.path()).is_empty());
        assert_eq!(0, fm.size());
    }

    #[test]
    fn save_empty_original_only_inserts() {
        let tmp = write_temp(b"");
        let mut fm = FileManager::open(tmp.path()).unwrap();
        fm.insert_before(0, b"fresh");
        fm.save(&mut |_| {}).unwrap();
        assert_eq!(b"fresh".to_vec(), disk_bytes(tmp.path()));
    }

    #[test]
    fn save_insert_larger_than_window() {
        let tmp = write_temp(b"0123456789");
        let mut fm = FileManager::open(tmp.path()).unwrap();
        fm.set_save_window(4);
        let big: Vec<u8> = (0..64u8).collect();
        fm.insert_before(5, &big);
        let expected = view(&fm);

        fm.save(&mut |_| {}).unwrap();
        assert_eq!(expected, disk_bytes(tmp.path()));
        assert_eq!(74, expected.len());
    }

    #[test]
    fn save_mixed_edits_small_window() {
        let data: Vec<u8> = (0..255u8).cycle().take(1000).collect();
        let tmp = write_temp(&data);
        let mut fm = FileManager::open(tmp.path()).unwrap();
        fm.set_save_window(16);

        fm.delete(990, 10);
        fm.insert_before(500, b"inserted-in-the-middle");
        fm.replace(100, b"SHADOW");
        fm.delete(0, 3);
        fm.insert_before(0, b"head");

        let expected = view(&fm);
        fm.save(&mut |_| {}).unwrap();
        assert_eq!(expected, disk_bytes(tmp.path()));
        assert_eq!(expected, view(&fm));
    }

    #[test]
    fn save_as_rebinds() {
        let tmp = write_temp(b"abcd");
        let out = tempfile::NamedTempFile::new().unwrap();
        let mut fm = FileManager::open(tmp.path()).unwrap();
        fm.insert_before(4, b"!");

        fm.save_as(out.path()).unwrap();
        assert_eq!(b"abcd!".to_vec(), disk_bytes(out.path()));
        // Old file untouched, buffer now points at the copy.
        assert_eq!(b"abcd".to_vec(), disk_bytes(tmp.path()));
        assert_eq!(Some(out.path()), fm.path());
        assert!(!fm.needs_save());
    }

    #[test]
    fn reload_discards_edits() {
        let tmp = write_temp(b"abcd");
        let mut fm = FileManager::open(tmp.path()).unwrap();
        fm.delete(0, 2);
        fm.reload().unwrap();
        assert_eq!(b"abcd".to_vec(), view(&fm));
        assert!(!fm.needs_save());
    }

    #[test]
    fn create_file_binds_empty_buffer() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("new.bin");
        let mut fm = FileManager::empty();
        assert!(fm.needs_create());
        fm.insert_before(0, b"xyz");

        fm.create_file(&path).unwrap();
        assert!(!fm.needs_create());
        fm.save(&mut |_| {}).unwrap();
        assert_eq!(b"xyz".to_vec(), disk_bytes(&path));
    }

    #[test]
    fn open_directory_refused() {
        let dir = tempfile::tempdir().unwrap();
        assert!(FileManager::open(dir.path()).is_err());
    }

    /// Every state reachable by random edits, undo and redo must read
    /// back exactly as a shadow model says.
    #[test]
    fn random_edits_match_model() {
        let mut gen = rand_chacha::ChaCha8Rng::seed_from_u64(42);
        let orig: Vec<u8> = (0..200u32).map(|i| (i * 7 % 251) as u8).collect();

        let mut fm = FileManager::from_bytes(orig.clone());
        // Model: undo history as a stack of full states.
        let mut states: Vec<Vec<u8>> = vec![orig];
        let mut at = 0;

        for round in 0..400 {
            let op = gen.next_u32() % 6;
            let cur = states[at].clone();
            match op {
                0 | 1 => {
                    let pos = (gen.next_u64() % (cur.len() as u64 + 1)) as usize;
                    let n = (gen.next_u32() % 7 + 1) as usize;
                    let data: Vec<u8> = (0..n).map(|_| gen.next_u32() as u8).collect();
                    assert_eq!(n as u64, fm.insert_before(pos as u64, &data));
                    let mut next = cur;
                    next.splice(pos..pos, data);
                    states.truncate(at + 1);
                    states.push(next);
                    at += 1;
                }
                2 => {
                    if cur.is_empty() {
                        continue;
                    }
                    let pos = (gen.next_u64() % cur.len() as u64) as usize;
                    let n = (gen.next_u32() % 9 + 1) as usize;
                    let n = n.min(cur.len() - pos);
                    assert_eq!(n as u64, fm.delete(pos as u64, n as u64));
                    let mut next = cur;
                    next.drain(pos..pos + n);
                    states.truncate(at + 1);
                    states.push(next);
                    at += 1;
                }
                3 => {
                    if cur.is_empty() {
                        continue;
                    }
                    let pos = (gen.next_u64() % cur.len() as u64) as usize;
                    let n = (gen.next_u32() % 9 + 1) as usize;
                    let n = n.min(cur.len() - pos);
                    let data: Vec<u8> = (0..n).map(|_| gen.next_u32() as u8).collect();
                    assert_eq!(n as u64, fm.replace(pos as u64, &data));
                    let mut next = cur;
                    next[pos..pos + n].copy_from_slice(&data);
                    states.truncate(at + 1);
                    states.push(next);
                    at += 1;
                }
                4 => {
                    let want = if at > 0 { 1 } else { 0 };
                    assert_eq!(want, fm.undo(1).0, "round {}", round);
                    at -= want as usize;
                }
                _ => {
                    let want = if at + 1 < states.len() { 1 } else { 0 };
                    assert_eq!(want, fm.redo(1).0, "round {}", round);
                    at += want as usize;
                }
            }

            assert_eq!(states[at], view(&fm), "round {}", round);
            assert_eq!(states[at].len() as u64, fm.size(), "round {}", round);
        }
    }

    /// Random edit batches against a real file, saved through a tiny
    /// window, must land on disk byte for byte.
    #[test]
    fn random_edits_save_round_trip() {
        let mut gen = rand_chacha::ChaCha8Rng::seed_from_u64(1337);
        for seed_round in 0..10 {
            let len = (gen.next_u32() % 600) as usize;
            let orig: Vec<u8> = (0..len).map(|_| gen.next_u32() as u8).collect();
            let tmp = write_temp(&orig);
            let mut fm = FileManager::open(tmp.path()).unwrap();
            fm.set_save_window(8);

            for _ in 0..30 {
                let size = fm.size();
                match gen.next_u32() % 3 {
                    0 => {
                        let pos = gen.next_u64() % (size + 1);
                        let n = (gen.next_u32() % 20 + 1) as usize;
                        let data: Vec<u8> = (0..n).map(|_| gen.next_u32() as u8).collect();
                        fm.insert_before(pos, &data);
                    }
                    1 if size > 0 => {
                        let pos = gen.next_u64() % size;
                        fm.delete(pos, gen.next_u64() % 25 + 1);
                    }
                    2 if size > 0 => {
                        let pos = gen.next_u64() % size;
                        let n = (gen.next_u32() % 12 + 1) as usize;
                        let data: Vec<u8> = (0..n).map(|_| gen.next_u32() as u8).collect();
                        fm.replace(pos, &data);
                    }
                    _ => {}
                }
            }

            let expected = view(&fm);
            fm.save(&mut |_| {}).unwrap();
            assert_eq!(expected, disk_bytes(tmp.path()), "seed round {}", seed_round);
            assert_eq!(expected, view(&fm), "seed round {}", seed_round);
        }
    }
}

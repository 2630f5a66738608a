use slotmap::SlotMap;

use super::FileManager;

slotmap::new_key_type!(
    pub struct FileKey;
);

/// Circular list of open files.
///
/// Files keep their insertion order (the order tabs are shown and
/// addressed in); `current` rotates over them. Keys are stable for the
/// lifetime of the file, so callers can stash per-file state against
/// them.
#[derive(Debug, Default)]
pub struct FileRing {
    files: SlotMap<FileKey, FileManager>,
    order: Vec<FileKey>,
    current: usize,
}

impl FileRing {
    pub fn new() -> FileRing {
        FileRing {
            files: SlotMap::with_key(),
            order: Vec::new(),
            current: 0,
        }
    }

    /// Add a file at the end of the ring and make it current.
    pub fn add(&mut self, fm: FileManager) -> FileKey {
        let key = self.files.insert(fm);
        self.order.push(key);
        self.current = self.order.len() - 1;
        key
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn current_key(&self) -> Option<FileKey> {
        self.order.get(self.current).copied()
    }

    pub fn current(&self) -> Option<&FileManager> {
        self.files.get(self.current_key()?)
    }

    pub fn current_mut(&mut self) -> Option<&mut FileManager> {
        let key = self.current_key()?;
        self.files.get_mut(key)
    }

    pub fn get(&self, key: FileKey) -> Option<&FileManager> {
        self.files.get(key)
    }

    pub fn get_mut(&mut self, key: FileKey) -> Option<&mut FileManager> {
        self.files.get_mut(key)
    }

    /// Rotate forward, returning the new current key.
    pub fn next(&mut self) -> Option<FileKey> {
        if self.order.is_empty() {
            return None;
        }
        self.current = (self.current + 1) % self.order.len();
        self.current_key()
    }

    /// Rotate backward.
    pub fn prev(&mut self) -> Option<FileKey> {
        if self.order.is_empty() {
            return None;
        }
        self.current = (self.current + self.order.len() - 1) % self.order.len();
        self.current_key()
    }

    /// Make the nth file (1-based from the head) current.
    pub fn goto_nth(&mut self, n: usize) -> Option<FileKey> {
        if self.order.is_empty() || n == 0 {
            return None;
        }
        self.current = (n - 1) % self.order.len();
        self.current_key()
    }

    pub fn set_current(&mut self, key: FileKey) -> bool {
        match self.order.iter().position(|&k| k == key) {
            Some(i) => {
                self.current = i;
                true
            }
            None => false,
        }
    }

    /// Drop the current file; the next one in ring order becomes current.
    pub fn remove_current(&mut self) -> Option<FileManager> {
        let key = self.current_key()?;
        self.order.remove(self.current);
        if self.current >= self.order.len() {
            self.current = 0;
        }
        self.files.remove(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (FileKey, &FileManager)> {
        self.order.iter().filter_map(|&k| Some((k, self.files.get(k)?)))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut FileManager> {
        self.files.iter_mut().map(|(_, fm)| fm)
    }
}

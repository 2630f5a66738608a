use std::{
    cell::RefCell,
    cmp,
    fs::File,
    io::{self, Read, Seek, SeekFrom},
    rc::Rc,
};

/// The unedited bytes a virtual file overlays.
///
/// Either a backing file read in cached blocks, or a plain in-memory
/// buffer for files created empty and for tests. The cache block is
/// reference counted so refreshing it does not invalidate a read that is
/// still copying out of the old block.
#[derive(Debug)]
pub(crate) enum OriginalFile {
    File {
        file: RefCell<File>,
        cache: RefCell<Rc<(u64, Vec<u8>)>>,
        len: u64,
    },
    Memory {
        bytes: Vec<u8>,
    },
}

impl OriginalFile {
    const BLOCK_SIZE: usize = 1024 * 1024;

    #[inline]
    pub fn new() -> OriginalFile {
        OriginalFile::Memory { bytes: vec![] }
    }

    pub fn from_bytes(bytes: Vec<u8>) -> OriginalFile {
        OriginalFile::Memory { bytes }
    }

    pub fn from_file(file: File) -> io::Result<OriginalFile> {
        let len = file.metadata()?.len();
        Ok(OriginalFile::File {
            file: RefCell::new(file),
            cache: RefCell::new(Rc::new((0, vec![]))),
            len,
        })
    }

    #[inline]
    pub fn len(&self) -> u64 {
        match self {
            OriginalFile::File { len, .. } => *len,
            OriginalFile::Memory { bytes } => bytes.len() as u64,
        }
    }

    /// Copy bytes at `pos` into `dest`. Returns the number copied, which
    /// is short only when the range runs past the end.
    pub fn read_at(&self, pos: u64, dest: &mut [u8]) -> io::Result<usize> {
        match self {
            OriginalFile::Memory { bytes } => {
                if pos >= bytes.len() as u64 {
                    return Ok(0);
                }
                let start = pos as usize;
                let n = cmp::min(dest.len(), bytes.len() - start);
                dest[..n].copy_from_slice(&bytes[start..start + n]);
                Ok(n)
            }
            OriginalFile::File { len, .. } => {
                let len = *len;
                if pos >= len {
                    return Ok(0);
                }
                let want = cmp::min(dest.len() as u64, len - pos) as usize;
                let mut copied = 0;
                while copied < want {
                    let at = pos + copied as u64;
                    let block = self.block_for(at)?;
                    let (block_pos, ref bytes) = *block;
                    let off = (at - block_pos) as usize;
                    if off >= bytes.len() {
                        // File shrank underneath us, give out what we have.
                        break;
                    }
                    let n = cmp::min(want - copied, bytes.len() - off);
                    dest[copied..copied + n].copy_from_slice(&bytes[off..off + n]);
                    copied += n;
                }
                Ok(copied)
            }
        }
    }

    /// The cached block containing `pos`, refreshed from the file when the
    /// current one does not cover it.
    fn block_for(&self, pos: u64) -> io::Result<Rc<(u64, Vec<u8>)>> {
        let (file, cache) = match self {
            OriginalFile::File { file, cache, .. } => (file, cache),
            OriginalFile::Memory { .. } => unreachable!(),
        };

        {
            let c = cache.borrow();
            let (block_pos, ref bytes) = **c;
            if block_pos <= pos && pos < block_pos + bytes.len() as u64 {
                return Ok(c.clone());
            }
        }

        let mut file = file.borrow_mut();
        file.seek(SeekFrom::Start(pos))?;
        let mut bytes = Vec::with_capacity(Self::BLOCK_SIZE);
        file.by_ref()
            .take(Self::BLOCK_SIZE as u64)
            .read_to_end(&mut bytes)?;

        let block = Rc::new((pos, bytes));
        *cache.borrow_mut() = block.clone();
        Ok(block)
    }
}

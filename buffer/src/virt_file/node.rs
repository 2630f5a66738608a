use std::fmt;

use bstr::BStr;
use smallvec::SmallVec;

/// Index of a node in the graph arena. Nodes are only ever allocated at
/// the end of the arena and only freed from the end (pruning dead redo
/// history), so an id handed out stays valid for as long as its undo
/// group exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) struct NodeId(pub(crate) usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum NodeKind {
    /// The original on-disk extent. Only the root is a file node.
    File,
    /// Inline data spliced into the parent.
    Insert,
    /// Same-size inline shadow over a region of the parent's content.
    Replace,
    /// Hides a region of the parent's content. Contributes zero visible
    /// bytes, `size` records the hidden span.
    Delete,
}

/// One edit overlay node.
///
/// `start` is an offset into the parent's logical space. `size` is the
/// node's visible length while active; for inserts it starts at the data
/// length and tracks net contributions of nested children, for deletes it
/// is the hidden span and never counts toward the parent.
pub(crate) struct Node {
    pub kind: NodeKind,
    pub start: u64,
    pub size: u64,
    pub data: Vec<u8>,
    pub active: bool,
    pub parent: Option<NodeId>,
    /// Children overlaying this node's logical space, sorted by `start`,
    /// arrival order among equal starts (newest last).
    pub children: SmallVec<[NodeId; 2]>,
}

impl Node {
    pub fn file(size: u64) -> Node {
        Node {
            kind: NodeKind::File,
            start: 0,
            size,
            data: Vec::new(),
            active: true,
            parent: None,
            children: SmallVec::new(),
        }
    }

    pub fn insert(parent: NodeId, start: u64, data: Vec<u8>) -> Node {
        Node {
            kind: NodeKind::Insert,
            start,
            size: data.len() as u64,
            data,
            active: true,
            parent: Some(parent),
            children: SmallVec::new(),
        }
    }

    pub fn replace(parent: NodeId, start: u64, data: Vec<u8>) -> Node {
        Node {
            kind: NodeKind::Replace,
            start,
            size: data.len() as u64,
            data,
            active: true,
            parent: Some(parent),
            children: SmallVec::new(),
        }
    }

    pub fn delete(parent: NodeId, start: u64, hidden: u64) -> Node {
        Node {
            kind: NodeKind::Delete,
            start,
            size: hidden,
            data: Vec::new(),
            active: true,
            parent: Some(parent),
            children: SmallVec::new(),
        }
    }

    /// Visible bytes this node contributes to its parent.
    #[inline]
    pub fn visible(&self) -> u64 {
        if self.active && self.kind != NodeKind::Delete {
            self.size
        } else {
            0
        }
    }

    /// Bytes of the parent's content this node consumes in a sequential
    /// walk: a replace shadows exactly its payload, a delete its hidden
    /// span, an insert nothing.
    #[inline]
    pub fn consumed(&self) -> u64 {
        match self.kind {
            NodeKind::Replace => self.data.len() as u64,
            NodeKind::Delete => self.size,
            NodeKind::Insert | NodeKind::File => 0,
        }
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("kind", &self.kind)
            .field("start", &self.start)
            .field("size", &self.size)
            .field("data", &BStr::new(&self.data))
            .field("active", &self.active)
            .field("parent", &self.parent)
            .field("children", &self.children)
            .finish()
    }
}

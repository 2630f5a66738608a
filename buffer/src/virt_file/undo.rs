use super::node::NodeId;

/// One user-visible edit step: the nodes it spliced in and whether it is
/// currently in effect.
#[derive(Debug)]
pub(crate) struct UndoGroup {
    pub nodes: Vec<NodeId>,
    pub applied: bool,
    pub saved: bool,
}

/// Ordered log of change groups, oldest first.
///
/// Applied groups always form a prefix: undo clears the last applied,
/// redo re-applies the first unapplied, and any new edit prunes the
/// unapplied tail. That keeps the log linear.
#[derive(Debug, Default)]
pub(crate) struct UndoLog {
    groups: Vec<UndoGroup>,
}

impl UndoLog {
    pub fn new() -> UndoLog {
        UndoLog { groups: Vec::new() }
    }

    pub fn push(&mut self, nodes: Vec<NodeId>) {
        debug_assert!(self.first_unapplied().is_none(), "edit without prune");
        self.groups.push(UndoGroup {
            nodes,
            applied: true,
            saved: false,
        });
    }

    pub fn last_applied(&self) -> Option<usize> {
        self.groups.iter().rposition(|g| g.applied)
    }

    pub fn first_unapplied(&self) -> Option<usize> {
        self.groups.iter().position(|g| !g.applied)
    }

    pub fn group(&self, i: usize) -> &UndoGroup {
        &self.groups[i]
    }

    pub fn group_mut(&mut self, i: usize) -> &mut UndoGroup {
        &mut self.groups[i]
    }

    /// Remove the non-applied tail, returning the dropped groups so the
    /// caller can free their nodes.
    pub fn prune(&mut self) -> Vec<UndoGroup> {
        match self.first_unapplied() {
            Some(i) => self.groups.split_off(i),
            None => Vec::new(),
        }
    }

    pub fn needs_save(&self) -> bool {
        self.groups.iter().any(|g| g.applied && !g.saved)
    }

    pub fn clear(&mut self) {
        self.groups.clear();
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }
}

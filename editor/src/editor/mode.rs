use super::browser::{Browser, ScrollBox};
use super::insert::EditInput;
use super::prompt::LineEditor;
use super::search::SearchFlavor;

/// Which cursor a motion drives: the primary cursor, or the scratch
/// cursor used while composing a motion for a pending operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CursorTarget {
    Real,
    Virtual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Operator {
    Change,
    Delete,
    Yank,
    /// `g` followed by a motion jumps to its result.
    Goto,
}

/// Composition state while an operator waits for its motion.
#[derive(Debug)]
pub(crate) struct MotionState {
    pub op: Operator,
    /// Count typed before the operator.
    pub count_prefix: u64,
    /// Count typed during composition.
    pub count: u64,
    pub jump: Option<u64>,
    pub awaiting: Option<MotionAwait>,
}

impl MotionState {
    pub fn new(op: Operator, count_prefix: u64) -> MotionState {
        MotionState {
            op,
            count_prefix,
            count: 0,
            jump: None,
            awaiting: None,
        }
    }

    /// Effective repeat for count-driven motions: prefix and composed
    /// counts multiply, absent counts mean one.
    pub fn repeat(&self) -> u64 {
        self.count_prefix.max(1) * self.count.max(1)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum MotionAwait {
    /// Backtick pressed, waiting for the mark key.
    Mark,
    /// `g` pressed, waiting for the second key.
    G,
}

/// One-key follow-up states entered from normal mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CharTarget {
    SetMark,
    JumpMark,
    Register,
    MacroRecord,
    MacroPlay,
    /// `g` seen; carries the count typed before it.
    GPrefix { jump: Option<u64> },
}

pub(crate) enum Mode {
    Normal,
    Insert(EditInput),
    Overwrite(EditInput),
    ReplaceOne(EditInput),
    Motion(MotionState),
    Char(CharTarget),
    Command {
        line: LineEditor,
        target: CursorTarget,
        op: Option<MotionState>,
    },
    SearchPrompt {
        line: LineEditor,
        flavor: SearchFlavor,
        backward: bool,
        target: CursorTarget,
        op: Option<MotionState>,
    },
    /// `?` pressed, waiting for `/` or `\` to pick the pattern flavor.
    SearchFlavorPending {
        target: CursorTarget,
        op: Option<MotionState>,
    },
    Browser(Browser),
    Overlay(ScrollBox),
}

impl Mode {
    pub fn name(&self) -> &'static str {
        match self {
            Mode::Normal => "",
            Mode::Insert(_) => "INSERT",
            Mode::Overwrite(_) => "OVERWRITE",
            Mode::ReplaceOne(_) => "REPLACE",
            Mode::Motion(_) => "PENDING",
            Mode::Char(_) => "",
            Mode::Command { .. } => "COMMAND",
            Mode::SearchPrompt { .. } | Mode::SearchFlavorPending { .. } => "SEARCH",
            Mode::Browser(_) => "BROWSE",
            Mode::Overlay(_) => "",
        }
    }
}

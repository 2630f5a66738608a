//! The modal editor core.
//!
//! A central loop owns the input source and feeds key events in one at a
//! time; the editor dispatches on its current mode, mutates the virtual
//! file and its own state, and hands back effects (bell, quit, suspend)
//! plus a [`Frame`] for the display sink. Macro playback and key
//! pushback go through a pending-key queue drained before the next real
//! key.

mod browser;
mod command;
mod insert;
mod macros;
mod mode;
mod motion;
mod options;
mod prompt;
mod search;
mod view;

use std::collections::{HashMap, VecDeque};
use std::path::Path;

use hexvi_buffer::{FileKey, FileManager, FileRing};
use hexvi_messages::{EditOverlay, Frame, Geometry, Key, KeyEvent, Size, StatusFrame};
use slotmap::SecondaryMap;
use thiserror::Error;

use self::browser::BrowserKey;
use self::insert::{EditInput, EditKey};
use self::macros::MacroTable;
use self::mode::{CharTarget, CursorTarget, Mode, MotionAwait, MotionState, Operator};
use self::prompt::{HistoryRing, LineEditor, LineResult};
use self::search::{SearchFlavor, SearchState};
use self::view::View;

/// Default register yanks land in when none was named.
const UNNAMED_REGISTER: char = '"';

#[derive(Debug, Error)]
pub(crate) enum ActionError {
    #[error("{0}")]
    Invalid(String),
    #[error("nothing to do")]
    NoAction,
}

/// What the loop must do beyond redrawing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    Bell,
    Quit,
    Suspend,
}

pub struct Editor {
    ring: FileRing,
    views: SecondaryMap<FileKey, View>,
    view: View,
    geometry: Geometry,
    term: Size,
    prefs: options::Preferences,
    mode: Mode,
    /// Visual selection anchor while visual mode is on.
    visual: Option<u64>,
    pending_count: u64,
    pending_jump: Option<u64>,
    esc_count: u8,
    /// Scratch cursor while composing a motion for an operator.
    virtual_cursor: Option<u64>,
    marks: HashMap<char, u64>,
    registers: HashMap<char, Vec<u8>>,
    active_register: char,
    search: SearchState,
    cmd_hist: HistoryRing,
    ascii_hist: HistoryRing,
    hex_hist: HistoryRing,
    macros: MacroTable,
    queue: VecDeque<KeyEvent>,
    message: Option<String>,
    progress: Option<Box<dyn FnMut(u8)>>,
}

impl Editor {
    pub fn new() -> Editor {
        Editor {
            ring: FileRing::new(),
            views: SecondaryMap::new(),
            view: View::default(),
            geometry: Geometry::default(),
            term: Size {
                width: 80,
                height: 24,
            },
            prefs: options::Preferences::default(),
            mode: Mode::Normal,
            visual: None,
            pending_count: 0,
            pending_jump: None,
            esc_count: 0,
            virtual_cursor: None,
            marks: HashMap::new(),
            registers: HashMap::new(),
            active_register: UNNAMED_REGISTER,
            search: SearchState::default(),
            cmd_hist: HistoryRing::new(),
            ascii_hist: HistoryRing::new(),
            hex_hist: HistoryRing::new(),
            macros: MacroTable::new(),
            queue: VecDeque::new(),
            message: None,
            progress: None,
        }
    }

    /// Open a file into the ring, making it current.
    pub fn open_file(&mut self, path: &Path) -> Result<(), String> {
        self.open_path(path).map_err(|e| e.to_string())
    }

    /// Make sure at least one (possibly empty) buffer exists.
    pub fn ensure_file(&mut self) {
        if self.ring.is_empty() {
            self.open_empty();
        }
    }

    /// Install the sink save progress is published through.
    pub fn set_progress_fn(&mut self, f: Box<dyn FnMut(u8)>) {
        self.progress = Some(f);
    }

    /// The display sink reports its size; the page layout follows it and
    /// the current preferences.
    pub fn set_size(&mut self, size: Size) {
        self.term = size;
        self.refresh_geometry();
    }

    pub(crate) fn refresh_geometry(&mut self) {
        self.geometry = view::geometry_for(self.term, &self.prefs);
        self.view.follow(&self.geometry);
    }

    /// Feed one key event from the input source. Returns the effects the
    /// loop must carry out; the screen should be redrawn afterwards
    /// regardless.
    pub fn feed(&mut self, key: KeyEvent) -> Vec<Effect> {
        let mut fx = Vec::new();
        self.message = None;
        self.queue.push_back(key);
        while let Some(k) = self.queue.pop_front() {
            self.dispatch(k, &mut fx);
            if fx.contains(&Effect::Quit) {
                break;
            }
        }
        fx
    }

    fn dispatch(&mut self, k: KeyEvent, fx: &mut Vec<Effect>) {
        // While recording, every key is captured except the ones that
        // name a macro slot.
        let exempt = matches!(
            self.mode,
            Mode::Char(CharTarget::MacroRecord) | Mode::Char(CharTarget::MacroPlay)
        );
        if self.macros.is_recording() && !exempt {
            self.macros.record(k);
        }

        let mode = std::mem::replace(&mut self.mode, Mode::Normal);
        match mode {
            Mode::Normal => self.dispatch_normal(k, fx),
            Mode::Insert(st) => self.dispatch_insert(st, k, fx, false),
            Mode::Overwrite(st) => self.dispatch_insert(st, k, fx, true),
            Mode::ReplaceOne(st) => self.dispatch_replace_one(st, k, fx),
            Mode::Motion(st) => self.dispatch_motion(st, k, fx),
            Mode::Char(t) => self.dispatch_char(t, k, fx),
            Mode::Command { mut line, target, op } => {
                match line.handle(k, &mut self.cmd_hist) {
                    LineResult::Pending => self.mode = Mode::Command { line, target, op },
                    LineResult::Abort => self.virtual_cursor = None,
                    LineResult::Submit(text) => {
                        if let Err(e) = command::execute(self, &text, target, fx) {
                            self.report(e, fx);
                        }
                        if let Some(st) = op {
                            self.finish_motion(st, fx);
                        }
                    }
                }
            }
            Mode::SearchPrompt {
                mut line,
                flavor,
                backward,
                target,
                op,
            } => {
                let hist = match flavor {
                    SearchFlavor::Ascii => &mut self.ascii_hist,
                    SearchFlavor::Hex => &mut self.hex_hist,
                };
                match line.handle(k, hist) {
                    LineResult::Pending => {
                        self.mode = Mode::SearchPrompt {
                            line,
                            flavor,
                            backward,
                            target,
                            op,
                        }
                    }
                    LineResult::Abort => self.virtual_cursor = None,
                    LineResult::Submit(text) => {
                        if let Err(e) = self.execute_search(&text, flavor, backward, target) {
                            self.report(e, fx);
                        }
                        if let Some(st) = op {
                            self.finish_motion(st, fx);
                        }
                    }
                }
            }
            Mode::SearchFlavorPending { target, op } => match k.plain_char() {
                Some('/') => self.enter_search_prompt(SearchFlavor::Ascii, true, target, op),
                Some('\\') => self.enter_search_prompt(SearchFlavor::Hex, true, target, op),
                _ if matches!(k.key(), Key::Esc) || k.is_ctrl('c') => {
                    self.virtual_cursor = None;
                }
                _ => {
                    fx.push(Effect::Bell);
                    self.mode = Mode::SearchFlavorPending { target, op };
                }
            },
            Mode::Browser(mut b) => match b.handle(k) {
                BrowserKey::Pending => self.mode = Mode::Browser(b),
                BrowserKey::Close => {}
                BrowserKey::Open(path) => {
                    if let Err(e) = command::open_browsed(self, path) {
                        self.report(e, fx);
                    }
                }
            },
            Mode::Overlay(mut sb) => {
                if sb.handle(k) {
                    self.mode = Mode::Overlay(sb);
                }
            }
        }
    }

    // ---- normal mode ----

    fn dispatch_normal(&mut self, k: KeyEvent, fx: &mut Vec<Effect>) {
        if let Some(c) = k.plain_char() {
            if c.is_ascii_digit() {
                self.handle_digit(c);
                self.esc_count = 0;
                return;
            }
        }

        if matches!(k.key(), Key::Esc) || k.is_ctrl('c') {
            self.handle_esc();
            self.pending_count = 0;
            self.pending_jump = None;
            return;
        }

        self.handle_normal_key(k, fx);

        self.esc_count = 0;
        self.pending_count = 0;
        self.pending_jump = None;
    }

    fn handle_digit(&mut self, c: char) {
        let d = c as u64 - '0' as u64;

        // ESC ESC <digit> picks the nth open file.
        if self.esc_count >= 2 && (1..=9).contains(&d) {
            self.switch_to_tab(d as usize);
            self.pending_count = 0;
            self.pending_jump = None;
            return;
        }

        if self.pending_count == 0 && d == 0 {
            let addr = self.addr_line_start(self.view.cursor);
            self.place(addr);
        }
        self.pending_count = self.pending_count * 10 + d;
        self.pending_jump = Some(self.pending_jump.unwrap_or(0) * 10 + d);
    }

    fn handle_esc(&mut self) {
        if self.visual.is_some() {
            self.visual = None;
            self.esc_count = 0;
        } else {
            self.esc_count = (self.esc_count + 1).min(2);
            if self.esc_count == 2 {
                self.search.highlight = None;
            }
        }
    }

    fn handle_normal_key(&mut self, k: KeyEvent, fx: &mut Vec<Effect>) {
        let count = self.pending_count.max(1);

        if k.control_pressed() {
            match k.plain_char_with_ctrl() {
                Some('d') => self.half_page(1),
                Some('u') => self.half_page(-1),
                Some('f') => self.half_page(2),
                Some('b') => self.half_page(-2),
                Some('n') => self.move_rel_lines(1, count),
                Some('p') => self.move_rel_lines(-1, count),
                Some('r') => self.do_redo(fx),
                Some('l') => {}
                _ => fx.push(Effect::Bell),
            }
            return;
        }

        match *k.key() {
            Key::Up => return self.move_rel_lines(-1, count),
            Key::Down => return self.move_rel_lines(1, count),
            Key::Left | Key::Backspace => return self.move_rel(-1, count),
            Key::Right => return self.move_rel(1, count),
            Key::Home => return self.place(self.addr_line_start(self.view.cursor)),
            Key::End => return self.place(self.addr_line_end(self.view.cursor)),
            Key::PageUp => return self.half_page(-2),
            Key::PageDown => return self.half_page(2),
            Key::Tab => return self.view.toggle_pane(),
            Key::Insert => return self.enter_insert('i'),
            _ => {}
        }

        let c = match k.plain_char() {
            Some(c) => c,
            None => return fx.push(Effect::Bell),
        };

        match c {
            '`' => self.mode = Mode::Char(CharTarget::JumpMark),
            'm' => self.mode = Mode::Char(CharTarget::SetMark),
            '"' => self.mode = Mode::Char(CharTarget::Register),
            '@' => self.mode = Mode::Char(CharTarget::MacroPlay),
            'q' => {
                if self.macros.is_recording() {
                    // The closing q is not part of the macro.
                    self.macros.unrecord_last();
                    self.macros.stop();
                } else {
                    self.mode = Mode::Char(CharTarget::MacroRecord);
                }
            }
            'g' => {
                self.mode = Mode::Char(CharTarget::GPrefix {
                    jump: self.pending_jump,
                })
            }
            'G' => match self.pending_jump {
                Some(j) => self.try_jump(j, fx),
                None => self.place(self.file_size().saturating_sub(1)),
            },
            'j' => self.move_rel_lines(1, count),
            'k' => self.move_rel_lines(-1, count),
            'h' => self.move_rel(-1, count),
            'l' | ' ' => self.move_rel(1, count),
            '^' => self.place(self.addr_line_start(self.view.cursor)),
            '$' => self.place(self.addr_line_end(self.view.cursor)),
            'v' => {
                self.visual = match self.visual {
                    Some(_) => None,
                    None => Some(self.view.cursor),
                }
            }
            'c' | 'C' | 's' | 'S' => self.begin_change(c, fx),
            'd' | 'D' => self.begin_delete(fx),
            'y' | 'Y' => self.begin_yank(c, fx),
            'w' | 'W' | 'e' | 'E' | 'b' | 'B' => self.word_motion_real(c, count, fx),
            'i' | 'I' | 'a' | 'A' => self.enter_insert(c),
            'R' => self.enter_overwrite(fx),
            'r' => self.enter_replace_one(),
            'x' => self.delete_bytes(false, count, fx),
            'X' => self.delete_bytes(true, count, fx),
            'p' => self.paste(true, count, fx),
            'P' => self.paste(false, count, fx),
            'u' => self.do_undo(fx),
            'U' => self.do_redo(fx),
            'n' => self.search_repeat(false, CursorTarget::Real, fx),
            'N' => self.search_repeat(true, CursorTarget::Real, fx),
            ':' => {
                self.mode = Mode::Command {
                    line: LineEditor::new(":", &self.cmd_hist),
                    target: CursorTarget::Real,
                    op: None,
                }
            }
            '/' => self.enter_search_prompt(SearchFlavor::Ascii, false, CursorTarget::Real, None),
            '\\' => self.enter_search_prompt(SearchFlavor::Hex, false, CursorTarget::Real, None),
            '?' => {
                self.mode = Mode::SearchFlavorPending {
                    target: CursorTarget::Real,
                    op: None,
                }
            }
            '~' => self.next_file(),
            _ => fx.push(Effect::Bell),
        }
    }

    // ---- one-key follow-ups ----

    fn dispatch_char(&mut self, target: CharTarget, k: KeyEvent, fx: &mut Vec<Effect>) {
        let ch = k.plain_char();
        match target {
            CharTarget::SetMark => match ch {
                Some(c) if c.is_ascii_alphabetic() => {
                    self.marks.insert(c, self.view.cursor);
                }
                _ => fx.push(Effect::Bell),
            },
            CharTarget::JumpMark => match ch.and_then(|c| self.marks.get(&c).copied()) {
                Some(a) => self.place(a),
                None => {
                    self.message = Some("Mark not set".into());
                    fx.push(Effect::Bell);
                }
            },
            CharTarget::Register => match ch {
                Some(c) if c.is_ascii_alphanumeric() => self.active_register = c,
                _ => fx.push(Effect::Bell),
            },
            CharTarget::MacroRecord => match ch {
                Some(c) if c.is_ascii_lowercase() => {
                    self.macros.start(c);
                }
                _ => {
                    self.message = Some("Record a macro on keys 'a' through 'z'".into());
                    fx.push(Effect::Bell);
                }
            },
            CharTarget::MacroPlay => {
                if self.macros.is_recording() {
                    // Flatten nested playback: drop the recorded @ and
                    // let the played keys record themselves.
                    self.macros.unrecord_last();
                }
                let slot = match ch {
                    Some('@') => None,
                    Some(c) => Some(c),
                    None => return,
                };
                if let Some(keys) = self.macros.playback(slot) {
                    for key in keys.into_iter().rev() {
                        self.queue.push_front(key);
                    }
                }
            }
            CharTarget::GPrefix { jump } => match ch {
                Some('g') => match jump {
                    Some(j) => self.try_jump(j, fx),
                    None => self.place(0),
                },
                Some(c) if ('1'..='9').contains(&c) => fx.push(Effect::Bell),
                _ => {
                    // Anything else composes a motion and jumps to it.
                    self.queue.push_front(k);
                    self.virtual_cursor = None;
                    self.mode = Mode::Motion(MotionState::new(Operator::Goto, 0));
                }
            },
        }
    }

    // ---- operator / motion composition ----

    fn dispatch_motion(&mut self, mut st: MotionState, k: KeyEvent, fx: &mut Vec<Effect>) {
        match st.awaiting.take() {
            Some(MotionAwait::Mark) => {
                match k.plain_char().and_then(|c| self.marks.get(&c).copied()) {
                    Some(a) => self.set_virtual(a),
                    None => fx.push(Effect::Bell),
                }
                return self.finish_motion(st, fx);
            }
            Some(MotionAwait::G) => {
                match k.plain_char() {
                    Some('g') => self.set_virtual(0),
                    _ => {
                        // The g case falls through to G when the second
                        // key is not g; the key is consumed.
                        let a = match st.jump {
                            Some(j) => j,
                            None => self.file_size().saturating_sub(1),
                        };
                        self.set_virtual(a);
                    }
                }
                return self.finish_motion(st, fx);
            }
            None => {}
        }

        if let Some(c) = k.plain_char() {
            if c.is_ascii_digit() {
                let d = c as u64 - '0' as u64;
                if st.count == 0 && d == 0 {
                    self.set_virtual(self.addr_line_start(self.view.cursor));
                    return self.finish_motion(st, fx);
                }
                st.count = st.count * 10 + d;
                st.jump = Some(st.jump.unwrap_or(0) * 10 + d);
                self.mode = Mode::Motion(st);
                return;
            }
        }

        if matches!(k.key(), Key::Esc) || k.is_ctrl('c') {
            // Cancels the pending operator.
            self.virtual_cursor = None;
            return;
        }

        if k.control_pressed() {
            match k.plain_char_with_ctrl() {
                Some('d') => self.set_virtual(self.addr_half_page(1)),
                Some('u') => self.set_virtual(self.addr_half_page(-1)),
                Some('f') => self.set_virtual(self.addr_half_page(2)),
                Some('b') => self.set_virtual(self.addr_half_page(-2)),
                _ => {
                    fx.push(Effect::Bell);
                    st.count = 0;
                    st.jump = None;
                    self.mode = Mode::Motion(st);
                    return;
                }
            }
            return self.finish_motion(st, fx);
        }

        let repeat = st.repeat();
        let cursor = self.view.cursor;
        let bpl = self.geometry.bytes_per_line as u64;

        match (*k.key(), k.plain_char()) {
            (Key::Down, _) | (_, Some('j')) => self.set_virtual(cursor + bpl * repeat),
            (Key::Up, _) | (_, Some('k')) => self.set_virtual(cursor.saturating_sub(bpl * repeat)),
            (Key::Left, _) | (_, Some('h')) => self.set_virtual(cursor.saturating_sub(repeat)),
            (Key::Right, _) | (_, Some('l')) => self.set_virtual(cursor + repeat),
            (Key::End, _) | (_, Some('$')) => self.set_virtual(self.addr_line_end(cursor)),
            (Key::Home, _) => self.set_virtual(self.addr_line_start(cursor)),
            (Key::PageDown, _) => self.set_virtual(self.addr_half_page(2)),
            (Key::PageUp, _) => self.set_virtual(self.addr_half_page(-2)),
            (_, Some('`')) => {
                st.awaiting = Some(MotionAwait::Mark);
                self.mode = Mode::Motion(st);
                return;
            }
            (_, Some('g')) => {
                st.awaiting = Some(MotionAwait::G);
                self.mode = Mode::Motion(st);
                return;
            }
            (_, Some('G')) => {
                let a = match st.jump {
                    Some(j) => j,
                    None => self.file_size().saturating_sub(1),
                };
                self.set_virtual(a);
            }
            (_, Some('n')) => {
                self.search_repeat(false, CursorTarget::Virtual, fx);
            }
            (_, Some('N')) => {
                self.search_repeat(true, CursorTarget::Virtual, fx);
            }
            (_, Some(':')) => {
                self.mode = Mode::Command {
                    line: LineEditor::new(":", &self.cmd_hist),
                    target: CursorTarget::Virtual,
                    op: Some(st),
                };
                return;
            }
            (_, Some('/')) => {
                return self.enter_search_prompt(
                    SearchFlavor::Ascii,
                    false,
                    CursorTarget::Virtual,
                    Some(st),
                );
            }
            (_, Some('\\')) => {
                return self.enter_search_prompt(
                    SearchFlavor::Hex,
                    false,
                    CursorTarget::Virtual,
                    Some(st),
                );
            }
            (_, Some('?')) => {
                self.mode = Mode::SearchFlavorPending {
                    target: CursorTarget::Virtual,
                    op: Some(st),
                };
                return;
            }
            (_, Some(c @ ('w' | 'W' | 'e' | 'E'))) => {
                // change-word never eats trailing whitespace.
                let c = match (st.op, c) {
                    (Operator::Change, 'w') => 'e',
                    (Operator::Change, 'W') => 'E',
                    _ => c,
                };
                self.word_motion_virtual(c, repeat, fx);
            }
            (_, Some(c @ ('b' | 'B'))) => self.word_motion_virtual(c, repeat, fx),
            _ => {
                fx.push(Effect::Bell);
                st.count = 0;
                st.jump = None;
                self.mode = Mode::Motion(st);
                return;
            }
        }

        self.finish_motion(st, fx);
    }

    fn finish_motion(&mut self, st: MotionState, fx: &mut Vec<Effect>) {
        let end = self.virtual_cursor.take();
        match st.op {
            Operator::Goto => match end {
                Some(a) => self.place(a),
                None => self.place(0),
            },
            Operator::Delete => {
                if let Some(a) = end {
                    self.op_delete_range(self.view.cursor, a, fx);
                }
            }
            Operator::Yank => {
                if let Some(a) = end {
                    self.op_yank_range(self.view.cursor, a, fx);
                }
            }
            Operator::Change => {
                if let Some(a) = end {
                    self.op_delete_range(self.view.cursor, a, fx);
                    self.enter_insert_at(self.view.cursor, 'i', 1);
                }
            }
        }
    }

    // ---- operators ----

    fn begin_change(&mut self, c: char, fx: &mut Vec<Effect>) {
        if self.visual.is_some() {
            self.delete_selection(fx);
            self.enter_insert_at(self.view.cursor, 'i', 1);
            return;
        }
        match c {
            'c' | 'C' => {
                self.virtual_cursor = None;
                self.mode = Mode::Motion(MotionState::new(Operator::Change, self.pending_count));
            }
            _ => {
                // s/S substitute count bytes at the cursor.
                let cur = self.view.cursor;
                let n = self.pending_count.max(1);
                if let Some(fm) = self.ring.current_mut() {
                    fm.delete(cur, n);
                }
                self.enter_insert_at(cur, 'i', 1);
            }
        }
    }

    fn begin_delete(&mut self, fx: &mut Vec<Effect>) {
        if self.visual.is_some() {
            self.delete_selection(fx);
        } else {
            self.virtual_cursor = None;
            self.mode = Mode::Motion(MotionState::new(Operator::Delete, self.pending_count));
        }
    }

    fn begin_yank(&mut self, c: char, fx: &mut Vec<Effect>) {
        if let Some(anchor) = self.visual {
            let (lo, hi) = ordered(anchor, self.view.cursor);
            self.yank_range(lo, hi - lo + 1, fx);
            self.visual = None;
            return;
        }
        if c == 'Y' {
            // The current byte group.
            let g = self.prefs.grouping;
            let count = self.pending_count.max(1);
            let addr = self.view.cursor - self.view.cursor % g;
            self.yank_range(addr, g * count, fx);
            return;
        }
        self.virtual_cursor = None;
        self.mode = Mode::Motion(MotionState::new(Operator::Yank, self.pending_count));
    }

    fn op_delete_range(&mut self, from: u64, to: u64, fx: &mut Vec<Effect>) {
        let (lo, hi) = ordered(from, to);
        let len = hi - lo + 1;
        let done = match self.ring.current_mut() {
            Some(fm) => fm.delete(lo, len),
            None => 0,
        };
        if done == 0 {
            fx.push(Effect::Bell);
        }
        self.place(lo);
        self.visual = None;
    }

    fn op_yank_range(&mut self, from: u64, to: u64, fx: &mut Vec<Effect>) {
        let (lo, hi) = ordered(from, to);
        self.yank_range(lo, hi - lo + 1, fx);
    }

    fn yank_range(&mut self, addr: u64, len: u64, fx: &mut Vec<Effect>) {
        let reg = self.active_register;
        self.active_register = UNNAMED_REGISTER;
        let bytes = self.read_range(addr, len);
        if bytes.is_empty() {
            fx.push(Effect::Bell);
            return;
        }
        self.registers.insert(reg, bytes);
    }

    fn delete_selection(&mut self, fx: &mut Vec<Effect>) {
        if let Some(anchor) = self.visual {
            self.op_delete_range(anchor, self.view.cursor, fx);
        }
    }

    fn delete_bytes(&mut self, move_left_first: bool, count: u64, fx: &mut Vec<Effect>) {
        if move_left_first {
            let addr = self.view.cursor.saturating_sub(count);
            self.place(addr);
        }
        let (addr, len) = match self.visual {
            Some(anchor) => {
                let (lo, hi) = ordered(anchor, self.view.cursor);
                (lo, hi - lo + 1)
            }
            None => (self.view.cursor, count),
        };
        self.yank_range(addr, len, fx);
        let done = match self.ring.current_mut() {
            Some(fm) => fm.delete(addr, len),
            None => 0,
        };
        if done == 0 {
            fx.push(Effect::Bell);
        }
        self.place(addr);
        self.visual = None;
    }

    fn paste(&mut self, after: bool, count: u64, fx: &mut Vec<Effect>) {
        let reg = self.active_register;
        self.active_register = UNNAMED_REGISTER;
        let data = self.registers.get(&reg).cloned().unwrap_or_default();
        if data.is_empty() {
            self.message = Some(format!("Nothing in register {}", reg));
            fx.push(Effect::Bell);
            return;
        }
        let size = self.file_size();
        let at = if size == 0 {
            0
        } else if after {
            self.view.cursor + 1
        } else {
            self.view.cursor
        };
        if let Some(fm) = self.ring.current_mut() {
            for _ in 0..count {
                fm.insert_before(at, &data);
            }
        }
        self.place(at);
    }

    fn do_undo(&mut self, fx: &mut Vec<Effect>) {
        let count = self.pending_count.max(1);
        let (done, addr) = match self.ring.current_mut() {
            Some(fm) => fm.undo(count),
            None => (0, None),
        };
        if done == 0 {
            fx.push(Effect::Bell);
            return;
        }
        if let Some(a) = addr {
            self.place(a);
        }
    }

    fn do_redo(&mut self, fx: &mut Vec<Effect>) {
        let count = self.pending_count.max(1);
        let (done, addr) = match self.ring.current_mut() {
            Some(fm) => fm.redo(count),
            None => (0, None),
        };
        if done == 0 {
            fx.push(Effect::Bell);
            return;
        }
        if let Some(a) = addr {
            self.place(a);
        }
    }

    // ---- insert / overwrite / replace-one ----

    fn enter_insert(&mut self, c: char) {
        let g = self.prefs.grouping;
        let size = self.file_size();
        let addr = match c {
            'a' | 'A' if size > 0 => (self.view.cursor + g).min(size),
            _ => self.view.cursor,
        };
        self.enter_insert_at(addr, c, self.pending_count);
    }

    fn enter_insert_at(&mut self, addr: u64, entry: char, count: u64) {
        self.visual = None;
        self.mode = Mode::Insert(EditInput::new(addr, entry, count));
    }

    fn enter_overwrite(&mut self, fx: &mut Vec<Effect>) {
        if self.visual.is_some() {
            fx.push(Effect::Bell);
            return;
        }
        self.mode = Mode::Overwrite(EditInput::new(self.view.cursor, 'R', self.pending_count));
    }

    fn enter_replace_one(&mut self) {
        self.mode = Mode::ReplaceOne(EditInput::new(self.view.cursor, 'r', self.pending_count));
    }

    fn dispatch_insert(&mut self, mut st: EditInput, k: KeyEvent, fx: &mut Vec<Effect>, over: bool) {
        let limit = if over { Some(self.file_size()) } else { None };
        match st.handle(k, self.view.pane, self.prefs.grouping, limit) {
            EditKey::Pending => {
                self.scroll_to_edit(&st, !over);
                self.mode = if over {
                    Mode::Overwrite(st)
                } else {
                    Mode::Insert(st)
                };
            }
            EditKey::Bell => {
                fx.push(Effect::Bell);
                self.mode = if over {
                    Mode::Overwrite(st)
                } else {
                    Mode::Insert(st)
                };
            }
            EditKey::Done => {
                if over {
                    self.commit_overwrite(st);
                } else {
                    self.commit_insert(st);
                }
            }
        }
    }

    fn commit_insert(&mut self, st: EditInput) {
        let count = st.count.max(1);
        if !st.buf.is_empty() {
            log::debug!(
                "insert({}) {} bytes at {:#x}, count {}",
                st.entry,
                st.buf.len(),
                st.addr,
                count
            );
            if let Some(fm) = self.ring.current_mut() {
                for _ in 0..count {
                    fm.insert_before(st.addr, &st.buf);
                }
            }
        }
        self.place(st.addr + st.buf.len() as u64);
    }

    fn commit_overwrite(&mut self, st: EditInput) {
        let count = st.count.max(1);
        if !st.buf.is_empty() {
            let data: Vec<u8> = st
                .buf
                .iter()
                .copied()
                .cycle()
                .take(st.buf.len() * count as usize)
                .collect();
            if let Some(fm) = self.ring.current_mut() {
                fm.replace(st.addr, &data);
            }
        }
        self.place(st.addr + st.buf.len() as u64);
    }

    fn dispatch_replace_one(&mut self, mut st: EditInput, k: KeyEvent, fx: &mut Vec<Effect>) {
        match st.handle(k, self.view.pane, self.prefs.grouping, None) {
            EditKey::Bell => {
                fx.push(Effect::Bell);
                self.mode = Mode::ReplaceOne(st);
            }
            EditKey::Done => {
                // ESC before the group completed: no replacement.
                self.visual = None;
            }
            EditKey::Pending => {
                if st.group_complete(self.prefs.grouping) {
                    self.commit_replace_one(st);
                } else {
                    self.mode = Mode::ReplaceOne(st);
                }
            }
        }
    }

    fn commit_replace_one(&mut self, st: EditInput) {
        let g = self.prefs.grouping;
        let group = &st.buf[..g as usize];
        let (addr, want) = match self.visual {
            Some(anchor) => {
                let (lo, hi) = ordered(anchor, self.view.cursor);
                let span = hi - lo + 1;
                (lo, (span / g) * g)
            }
            None => (self.view.cursor, st.count.max(1) * g),
        };
        let size = self.file_size();
        if addr < size {
            // Whole groups only, never past the end.
            let avail = size - addr;
            let want = want.min(avail - avail % g);
            if want > 0 {
                let data: Vec<u8> = group.iter().copied().cycle().take(want as usize).collect();
                if let Some(fm) = self.ring.current_mut() {
                    fm.replace(addr, &data);
                }
            }
        }
        self.visual = None;
    }

    fn scroll_to_edit(&mut self, st: &EditInput, hole: bool) {
        let g = if hole { self.prefs.grouping } else { 0 };
        let edit = st.addr + st.typed() as u64 + g;
        let bpl = self.geometry.bytes_per_line as u64;
        let page = self.geometry.page_size().max(bpl);
        while edit >= self.view.page_start + page {
            self.view.page_start += bpl;
        }
    }

    // ---- movement ----

    fn file_size(&self) -> u64 {
        self.ring.current().map(|f| f.size()).unwrap_or(0)
    }

    pub(crate) fn fm(&self) -> Option<&FileManager> {
        self.ring.current()
    }

    pub(crate) fn fm_mut(&mut self) -> Option<&mut FileManager> {
        self.ring.current_mut()
    }

    fn place(&mut self, addr: u64) {
        let size = self.file_size();
        let geom = self.geometry;
        self.view.place_cursor(addr, size, &geom);
    }

    pub(crate) fn cursor_for(&self, target: CursorTarget) -> u64 {
        match target {
            CursorTarget::Real => self.view.cursor,
            CursorTarget::Virtual => self.virtual_cursor.unwrap_or(self.view.cursor),
        }
    }

    pub(crate) fn jump_to(&mut self, addr: u64, target: CursorTarget) {
        match target {
            CursorTarget::Real => self.place(addr),
            CursorTarget::Virtual => self.set_virtual(addr),
        }
    }

    fn try_jump(&mut self, addr: u64, fx: &mut Vec<Effect>) {
        if addr >= self.file_size() {
            self.message = Some(format!("Invalid jump address: {}", addr));
            fx.push(Effect::Bell);
        } else {
            self.place(addr);
        }
    }

    fn set_virtual(&mut self, addr: u64) {
        let max = self.file_size().saturating_sub(1);
        self.virtual_cursor = Some(addr.min(max));
    }

    fn move_rel(&mut self, dir: i64, count: u64) {
        let cur = self.view.cursor;
        let addr = if dir < 0 {
            cur.saturating_sub(count)
        } else {
            cur + count
        };
        self.place(addr);
    }

    fn move_rel_lines(&mut self, dir: i64, count: u64) {
        let bpl = self.geometry.bytes_per_line as u64;
        self.move_rel(dir, bpl * count);
    }

    fn addr_line_start(&self, from: u64) -> u64 {
        let bpl = self.geometry.bytes_per_line as u64;
        from - from % bpl
    }

    fn addr_line_end(&self, from: u64) -> u64 {
        let bpl = self.geometry.bytes_per_line as u64;
        self.addr_line_start(from) + bpl - 1
    }

    /// Half pages; the full-page motions pass 2, preserving the original
    /// half-page-multiplier scheme.
    fn addr_half_page(&self, n: i64) -> u64 {
        let half = (self.geometry.page_size() / 2).max(1);
        let delta = half * n.unsigned_abs();
        if n < 0 {
            self.view.cursor.saturating_sub(delta)
        } else {
            self.view.cursor + delta
        }
    }

    fn half_page(&mut self, n: i64) {
        let addr = self.addr_half_page(n);
        self.place(addr);
    }

    fn word_motion_real(&mut self, c: char, count: u64, fx: &mut Vec<Effect>) {
        match self.word_motion_addr(c, count, self.view.cursor) {
            Some(a) => self.place(a),
            None => fx.push(Effect::Bell),
        }
    }

    fn word_motion_virtual(&mut self, c: char, count: u64, fx: &mut Vec<Effect>) {
        match self.word_motion_addr(c, count, self.view.cursor) {
            Some(a) => self.set_virtual(a),
            None => fx.push(Effect::Bell),
        }
    }

    fn word_motion_addr(&self, c: char, count: u64, mut from: u64) -> Option<u64> {
        let fm = self.ring.current()?;
        for _ in 0..count.max(1) {
            from = match c {
                'b' | 'B' => motion::word_back(fm, from, c)?,
                _ => motion::word_forward(fm, from, c)?,
            };
        }
        Some(from)
    }

    // ---- search ----

    fn enter_search_prompt(
        &mut self,
        flavor: SearchFlavor,
        backward: bool,
        target: CursorTarget,
        op: Option<MotionState>,
    ) {
        let (prompt, hist) = match (backward, flavor) {
            (false, SearchFlavor::Ascii) => ("/", &self.ascii_hist),
            (false, SearchFlavor::Hex) => ("\\", &self.hex_hist),
            (true, SearchFlavor::Ascii) => ("?/", &self.ascii_hist),
            (true, SearchFlavor::Hex) => ("?\\", &self.hex_hist),
        };
        self.mode = Mode::SearchPrompt {
            line: LineEditor::new(prompt, hist),
            flavor,
            backward,
            target,
            op,
        };
    }

    fn execute_search(
        &mut self,
        input: &str,
        flavor: SearchFlavor,
        backward: bool,
        target: CursorTarget,
    ) -> Result<(), ActionError> {
        let pattern = match flavor {
            SearchFlavor::Ascii => input.as_bytes().to_vec(),
            SearchFlavor::Hex => search::parse_hex_pattern(input)
                .ok_or_else(|| ActionError::Invalid("Invalid hex pattern".into()))?,
        };
        self.search = SearchState {
            pattern,
            ignorecase: self.prefs.ignorecase && flavor == SearchFlavor::Ascii,
            backward,
            highlight: None,
        };
        self.search_from_cursor(target)
    }

    fn search_repeat(&mut self, reverse: bool, target: CursorTarget, fx: &mut Vec<Effect>) {
        if !self.search.is_set() {
            self.message = Some("No previous search".into());
            fx.push(Effect::Bell);
            return;
        }
        let was = self.search.backward;
        self.search.backward = was ^ reverse;
        let res = self.search_from_cursor(target);
        self.search.backward = was;
        if let Err(e) = res {
            self.report(e, fx);
        }
    }

    fn search_from_cursor(&mut self, target: CursorTarget) -> Result<(), ActionError> {
        let fm = self.ring.current().ok_or(ActionError::NoAction)?;
        let cursor = self.view.cursor;
        let from = if self.search.backward {
            cursor.saturating_sub(1)
        } else {
            cursor + 1
        };
        match search::find(
            fm,
            &self.search.pattern,
            from,
            self.search.backward,
            self.search.ignorecase,
        ) {
            Some(a) => {
                let end = a + self.search.pattern.len() as u64 - 1;
                self.search.highlight = Some((a, end));
                self.jump_to(a, target);
                Ok(())
            }
            None => Err(ActionError::Invalid("Pattern not found".into())),
        }
    }

    // ---- file ring ----

    pub(crate) fn stash_view(&mut self) {
        if let Some(key) = self.ring.current_key() {
            self.views.insert(key, self.view);
        }
    }

    pub(crate) fn restore_view(&mut self, key: FileKey) {
        self.view = self.views.get(key).copied().unwrap_or_default();
        let size = self.ring.get(key).map(|f| f.size()).unwrap_or(0);
        let geom = self.geometry;
        self.view.place_cursor(self.view.cursor, size, &geom);
    }

    pub(crate) fn next_file(&mut self) {
        self.stash_view();
        if let Some(key) = self.ring.next() {
            self.restore_view(key);
        }
    }

    pub(crate) fn prev_file(&mut self) {
        self.stash_view();
        if let Some(key) = self.ring.prev() {
            self.restore_view(key);
        }
    }

    fn switch_to_tab(&mut self, n: usize) {
        self.stash_view();
        if let Some(key) = self.ring.goto_nth(n) {
            self.restore_view(key);
        }
    }

    fn report(&mut self, e: ActionError, fx: &mut Vec<Effect>) {
        match e {
            ActionError::NoAction => {}
            ActionError::Invalid(msg) => self.message = Some(msg),
        }
        fx.push(Effect::Bell);
    }

    // ---- frame ----

    fn read_range(&self, addr: u64, len: u64) -> Vec<u8> {
        let fm = match self.ring.current() {
            Some(fm) => fm,
            None => return Vec::new(),
        };
        let mut buf = vec![0u8; len as usize];
        match fm.get_buf(&mut buf, addr) {
            Ok(n) => {
                buf.truncate(n);
                buf
            }
            Err(e) => {
                log::warn!("read failed at {:#x}: {}", addr, e);
                Vec::new()
            }
        }
    }

    /// Compose the page bytes the display sink draws. Insert mode splices
    /// the typed bytes in at the edit point; overwrite shadows.
    fn page_bytes(&self) -> Vec<u8> {
        let page = self.geometry.page_size();
        let start = self.view.page_start;

        let (addr, typed, shadow) = match &self.mode {
            Mode::Insert(st) => (st.addr, &st.buf[..], false),
            Mode::Overwrite(st) => (st.addr, &st.buf[..], true),
            _ => return self.read_range(start, page),
        };

        let mut out = Vec::with_capacity(page as usize);
        if addr > start {
            out.extend(self.read_range(start, (addr - start).min(page)));
        }
        let skip = start.saturating_sub(addr) as usize;
        if skip < typed.len() {
            out.extend(&typed[skip..]);
        }
        let resume = if shadow { addr + typed.len() as u64 } else { addr };
        if (out.len() as u64) < page {
            out.extend(self.read_range(resume, page - out.len() as u64));
        }
        out.truncate(page as usize);
        out
    }

    pub fn frame(&self) -> Frame {
        let size = self.file_size();
        let cursor = match &self.mode {
            Mode::Insert(st) | Mode::Overwrite(st) => st.addr + st.buf.len() as u64,
            _ => self.view.cursor,
        };

        let edit = match &self.mode {
            Mode::Insert(st) => Some(st.overlay(true)),
            Mode::Overwrite(st) => Some(st.overlay(false)),
            Mode::ReplaceOne(st) => Some(EditOverlay {
                addr: self.view.cursor,
                group: st.group.to_vec(),
                nibble: st.nibble,
                hole: false,
            }),
            _ => None,
        };

        let prompt = match &self.mode {
            Mode::Command { line, .. } | Mode::SearchPrompt { line, .. } => Some(line.frame()),
            Mode::SearchFlavorPending { .. } => Some(hexvi_messages::PromptFrame {
                prompt: "?".into(),
                input: String::new(),
                cursor: 0,
            }),
            _ => None,
        };

        let overlay = match &self.mode {
            Mode::Browser(b) => Some(b.frame()),
            Mode::Overlay(sb) => Some(sb.frame()),
            _ => None,
        };

        let name = self
            .fm()
            .map(|fm| {
                let mut n = fm
                    .file_name()
                    .unwrap_or_else(|| String::from("[No Name]"));
                if fm.needs_save() {
                    n.push_str(" [+]");
                }
                n
            })
            .unwrap_or_default();

        let mut left = name;
        let tag = self.mode.name();
        if !tag.is_empty() {
            left.push_str(&format!("  -- {} --", tag));
        }
        if self.visual.is_some() {
            left.push_str("  -- VISUAL --");
        }
        if self.macros.is_recording() {
            left.push_str("  recording");
        }

        Frame {
            page_start: self.view.page_start,
            bytes: self.page_bytes(),
            file_size: size,
            cursor,
            pane: self.view.pane,
            grouping: self.prefs.grouping as usize,
            little_endian: self.prefs.little_endian,
            geometry: self.geometry,
            selection: self
                .visual
                .map(|a| ordered(a, self.view.cursor)),
            highlight: if self.prefs.search_hl {
                self.search.highlight
            } else {
                None
            },
            edit,
            prompt,
            overlay,
            status: StatusFrame {
                left,
                right: format!("{:#010x}/{:#x}", cursor, size),
                message: self.message.clone(),
            },
        }
    }
}

impl Default for Editor {
    fn default() -> Self {
        Editor::new()
    }
}

fn ordered(a: u64, b: u64) -> (u64, u64) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

trait CtrlChar {
    fn plain_char_with_ctrl(&self) -> Option<char>;
}

impl CtrlChar for KeyEvent {
    /// The character of a ctrl chord.
    fn plain_char_with_ctrl(&self) -> Option<char> {
        match self.key() {
            Key::Char(c) if self.control_pressed() => Some(*c),
            _ => None,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::io::{Read as _, Write as _};

    fn ed_with(bytes: &[u8]) -> Editor {
        let mut ed = Editor::new();
        ed.ring.add(FileManager::from_bytes(bytes.to_vec()));
        ed.set_size(Size {
            width: 80,
            height: 24,
        });
        ed
    }

    fn feed_str(ed: &mut Editor, s: &str) {
        for ch in s.chars() {
            ed.feed(KeyEvent::ch(ch));
        }
    }

    fn esc(ed: &mut Editor) {
        ed.feed(KeyEvent::plain(Key::Esc));
    }

    fn enter(ed: &mut Editor) {
        ed.feed(KeyEvent::plain(Key::Enter));
    }

    fn view_bytes(ed: &Editor) -> Vec<u8> {
        let fm = ed.fm().unwrap();
        let mut buf = vec![0u8; fm.size() as usize];
        let n = fm.get_buf(&mut buf, 0).unwrap();
        buf.truncate(n);
        buf
    }

    #[test]
    fn insert_two_bytes_at_start() {
        let mut ed = ed_with(&[0xAA, 0xBB, 0xCC, 0xDD]);
        feed_str(&mut ed, "i4142");
        esc(&mut ed);
        assert_eq!(vec![0x41, 0x42, 0xAA, 0xBB, 0xCC, 0xDD], view_bytes(&ed));
        assert_eq!(2, ed.view.cursor);
        assert!(matches!(ed.mode, Mode::Normal));
    }

    #[test]
    fn insert_save_round_trip() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        tmp.write_all(&[0xAA, 0xBB, 0xCC, 0xDD]).unwrap();
        tmp.flush().unwrap();

        let mut ed = Editor::new();
        ed.open_file(tmp.path()).unwrap();
        ed.set_size(Size {
            width: 80,
            height: 24,
        });
        feed_str(&mut ed, "i4142");
        esc(&mut ed);
        feed_str(&mut ed, ":w");
        enter(&mut ed);

        let mut disk = Vec::new();
        std::fs::File::open(tmp.path())
            .unwrap()
            .read_to_end(&mut disk)
            .unwrap();
        assert_eq!(vec![0x41, 0x42, 0xAA, 0xBB, 0xCC, 0xDD], disk);
        assert!(!ed.fm().unwrap().needs_save());
    }

    #[test]
    fn delete_twice_and_undo() {
        let mut ed = ed_with(&[0x00, 0x11, 0x22, 0x33]);
        feed_str(&mut ed, "x");
        assert_eq!(vec![0x11, 0x22, 0x33], view_bytes(&ed));
        feed_str(&mut ed, "x");
        assert_eq!(vec![0x22, 0x33], view_bytes(&ed));
        feed_str(&mut ed, "u");
        assert_eq!(vec![0x11, 0x22, 0x33], view_bytes(&ed));
    }

    #[test]
    fn count_deletes_bytes() {
        let mut ed = ed_with(b"abcdef");
        feed_str(&mut ed, "3x");
        assert_eq!(b"def".to_vec(), view_bytes(&ed));
        // The register holds what x removed.
        feed_str(&mut ed, "P");
        assert_eq!(b"abcdef".to_vec(), view_bytes(&ed));
    }

    #[test]
    fn visual_replace_fills_selection() {
        let mut ed = ed_with(&[0, 1, 2, 3, 4, 5, 6, 7]);
        feed_str(&mut ed, "vlllrFF");
        assert_eq!(
            vec![0xFF, 0xFF, 0xFF, 0xFF, 4, 5, 6, 7],
            view_bytes(&ed)
        );
        assert!(ed.visual.is_none());
    }

    #[test]
    fn word_motions_follow_classes() {
        let mut ed = ed_with(b"abc   ,,,def");
        feed_str(&mut ed, "w");
        assert_eq!(6, ed.view.cursor);
        feed_str(&mut ed, "w");
        assert_eq!(9, ed.view.cursor);
    }

    #[test]
    fn command_jumps() {
        let mut ed = ed_with(&vec![0u8; 100]);
        feed_str(&mut ed, ":20");
        enter(&mut ed);
        assert_eq!(20, ed.view.cursor);

        feed_str(&mut ed, ":+10");
        enter(&mut ed);
        assert_eq!(30, ed.view.cursor);

        feed_str(&mut ed, ":-5");
        enter(&mut ed);
        assert_eq!(25, ed.view.cursor);

        feed_str(&mut ed, ":0x20");
        enter(&mut ed);
        assert_eq!(32, ed.view.cursor);

        feed_str(&mut ed, ":99999999999");
        enter(&mut ed);
        assert_eq!(32, ed.view.cursor);
        assert!(ed
            .message
            .as_deref()
            .unwrap_or("")
            .starts_with("Invalid jump address"));
    }

    #[test]
    fn macro_record_and_replay() {
        let mut ed = ed_with(&[0, 1, 2, 3, 4, 5]);
        feed_str(&mut ed, "qaxxq");
        assert_eq!(vec![2, 3, 4, 5], view_bytes(&ed));
        feed_str(&mut ed, "@a");
        assert_eq!(vec![4, 5], view_bytes(&ed));
    }

    #[test]
    fn marks_round_trip() {
        let mut ed = ed_with(&vec![0u8; 64]);
        feed_str(&mut ed, ":20");
        enter(&mut ed);
        feed_str(&mut ed, "ma");
        feed_str(&mut ed, ":5");
        enter(&mut ed);
        feed_str(&mut ed, "`a");
        assert_eq!(20, ed.view.cursor);
    }

    #[test]
    fn marks_do_not_shift_on_edits() {
        let mut ed = ed_with(b"0123456789");
        feed_str(&mut ed, ":5");
        enter(&mut ed);
        feed_str(&mut ed, "ma");
        feed_str(&mut ed, ":0");
        enter(&mut ed);
        feed_str(&mut ed, "x");
        feed_str(&mut ed, "`a");
        // The mark still names address 5 in the new view.
        assert_eq!(5, ed.view.cursor);
    }

    #[test]
    fn yank_motion_and_paste() {
        let mut ed = ed_with(b"abcdef");
        // Yank 3 to the right, inclusive.
        feed_str(&mut ed, "y3l");
        feed_str(&mut ed, "P");
        assert_eq!(b"abcdabcdef".to_vec(), view_bytes(&ed));
    }

    #[test]
    fn named_register() {
        let mut ed = ed_with(b"abcdef");
        feed_str(&mut ed, "\"zyl");
        feed_str(&mut ed, "$\"zp");
        assert_eq!(b"abcdefab".to_vec(), view_bytes(&ed));
    }

    #[test]
    fn register_key_does_not_undo() {
        let mut ed = ed_with(b"abc");
        feed_str(&mut ed, "x");
        assert_eq!(b"bc".to_vec(), view_bytes(&ed));
        // Selecting a register must not fall through into undo.
        feed_str(&mut ed, "\"z");
        assert_eq!(b"bc".to_vec(), view_bytes(&ed));
    }

    #[test]
    fn delete_word_inclusive() {
        let mut ed = ed_with(b"abc def");
        feed_str(&mut ed, "dw");
        assert_eq!(b"ef".to_vec(), view_bytes(&ed));
    }

    #[test]
    fn change_word_stops_at_word_end() {
        let mut ed = ed_with(b"abc def");
        feed_str(&mut ed, "cw");
        // w was rewritten to e: only the word went away.
        assert!(matches!(ed.mode, Mode::Insert(_)));
        esc(&mut ed);
        assert_eq!(b" def".to_vec(), view_bytes(&ed));
    }

    #[test]
    fn overwrite_replaces_in_place() {
        let mut ed = ed_with(&[0x00, 0x11, 0x22, 0x33]);
        feed_str(&mut ed, "lRFF");
        esc(&mut ed);
        assert_eq!(vec![0x00, 0xFF, 0x22, 0x33], view_bytes(&ed));
        assert_eq!(4, ed.fm().unwrap().size());
    }

    #[test]
    fn motion_pending_esc_cancels() {
        let mut ed = ed_with(b"abcdef");
        feed_str(&mut ed, "d");
        assert!(matches!(ed.mode, Mode::Motion(_)));
        esc(&mut ed);
        assert!(matches!(ed.mode, Mode::Normal));
        assert_eq!(b"abcdef".to_vec(), view_bytes(&ed));
    }

    #[test]
    fn count_jump_with_g() {
        let mut ed = ed_with(&vec![0u8; 64]);
        feed_str(&mut ed, "10G");
        assert_eq!(10, ed.view.cursor);
        feed_str(&mut ed, "gg");
        assert_eq!(0, ed.view.cursor);
        feed_str(&mut ed, "G");
        assert_eq!(63, ed.view.cursor);
        feed_str(&mut ed, "5gg");
        assert_eq!(5, ed.view.cursor);
    }

    #[test]
    fn search_ascii_and_repeat() {
        let mut ed = ed_with(b"one two one two");
        feed_str(&mut ed, "/two");
        enter(&mut ed);
        assert_eq!(4, ed.view.cursor);
        assert_eq!(Some((4, 6)), ed.search.highlight);
        feed_str(&mut ed, "n");
        assert_eq!(12, ed.view.cursor);
        // Wraps around.
        feed_str(&mut ed, "n");
        assert_eq!(4, ed.view.cursor);
        feed_str(&mut ed, "N");
        assert_eq!(12, ed.view.cursor);
    }

    #[test]
    fn search_hex_pattern() {
        let mut ed = ed_with(&[0x00, 0xDE, 0xAD, 0xBE, 0xEF]);
        feed_str(&mut ed, "\\adbe");
        enter(&mut ed);
        assert_eq!(2, ed.view.cursor);
    }

    #[test]
    fn double_esc_clears_highlight() {
        let mut ed = ed_with(b"needle haystack");
        feed_str(&mut ed, "/hay");
        enter(&mut ed);
        assert!(ed.search.highlight.is_some());
        esc(&mut ed);
        esc(&mut ed);
        assert!(ed.search.highlight.is_none());
    }

    #[test]
    fn esc_esc_digit_switches_file() {
        let mut ed = ed_with(b"first");
        let first = ed.ring.current_key().unwrap();
        ed.ring.add(FileManager::from_bytes(b"second".to_vec()));
        let second = ed.ring.current_key().unwrap();

        esc(&mut ed);
        esc(&mut ed);
        feed_str(&mut ed, "1");
        assert_eq!(Some(first), ed.ring.current_key());

        esc(&mut ed);
        esc(&mut ed);
        feed_str(&mut ed, "2");
        assert_eq!(Some(second), ed.ring.current_key());
    }

    #[test]
    fn tilde_cycles_files_and_stashes_view() {
        let mut ed = ed_with(&vec![0u8; 64]);
        feed_str(&mut ed, ":9");
        enter(&mut ed);
        // Open an empty second buffer, then cycle back.
        feed_str(&mut ed, ":e");
        enter(&mut ed);
        assert_eq!(0, ed.view.cursor);

        feed_str(&mut ed, "~");
        // Back on the first file with its cursor restored.
        assert_eq!(9, ed.view.cursor);
    }

    #[test]
    fn quit_discards_only_with_bang() {
        let mut ed = ed_with(b"ab");
        feed_str(&mut ed, "x:q");
        enter(&mut ed);
        // Refused, buffer modified.
        assert!(ed.fm().is_some());
        assert!(ed.message.is_some());

        feed_str(&mut ed, ":q!");
        let fx = ed.feed(KeyEvent::plain(Key::Enter));
        assert!(fx.contains(&Effect::Quit));
    }

    #[test]
    fn grouping_pref_aligns_insert() {
        let mut ed = ed_with(&[0xAA, 0xBB]);
        feed_str(&mut ed, ":set grp 2");
        enter(&mut ed);
        feed_str(&mut ed, "i41");
        esc(&mut ed);
        // One byte is only half a group: nothing committed.
        assert_eq!(vec![0xAA, 0xBB], view_bytes(&ed));
        feed_str(&mut ed, "i4142");
        esc(&mut ed);
        assert_eq!(vec![0x41, 0x42, 0xAA, 0xBB], view_bytes(&ed));
    }

    #[test]
    fn append_enters_after_group() {
        let mut ed = ed_with(&[0xAA, 0xBB]);
        feed_str(&mut ed, "a41");
        esc(&mut ed);
        assert_eq!(vec![0xAA, 0x41, 0xBB], view_bytes(&ed));
    }

    #[test]
    fn ascii_pane_insert() {
        let mut ed = ed_with(b"xy");
        ed.feed(KeyEvent::plain(Key::Tab));
        feed_str(&mut ed, "iAB");
        esc(&mut ed);
        assert_eq!(b"ABxy".to_vec(), view_bytes(&ed));
    }

    #[test]
    fn frame_reflects_insert_in_progress() {
        let mut ed = ed_with(&[0xAA, 0xBB]);
        feed_str(&mut ed, "i41");
        let frame = ed.frame();
        // Typed byte spliced into the page at the edit point.
        assert_eq!(vec![0x41, 0xAA, 0xBB], frame.bytes[..3].to_vec());
        let edit = frame.edit.unwrap();
        assert!(edit.hole);
        assert_eq!(1, edit.addr);
    }

    #[test]
    fn unknown_command_bells() {
        let mut ed = ed_with(b"ab");
        feed_str(&mut ed, ":nonsense");
        let fx = ed.feed(KeyEvent::plain(Key::Enter));
        assert!(fx.contains(&Effect::Bell));
    }
}

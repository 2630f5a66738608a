//! `:` command parsing and execution.
//!
//! Tokens split on spaces and `=`. A leading numeric token is a jump:
//! absolute, or relative with a `+`/`-` prefix, base auto-detected
//! (0x hex, leading 0 octal, else decimal).

use hexvi_buffer::{expand_path, FileManager};

use super::browser::{Browser, ScrollBox};
use super::mode::{CursorTarget, Mode};
use super::{ActionError, Editor, Effect};

pub(crate) const HELP_TEXT: &[&str] = &[
    " hexvi - a modal hex editor",
    "",
    " Motion:   h j k l  arrows   0 ^ $  gg G  w W e E b B",
    "           ctrl+d/u half page, ctrl+f/b page, `<mark> jump",
    " Edit:     i I a A insert   R overwrite   r replace group",
    "           x X delete byte  d/c/y + motion  v visual select",
    "           p P paste        u undo          ctrl+r redo",
    " Marks:    m<key> set, `<key> jump",
    " Macros:   q<a-z> record, q end, @<key> play, @@ replay",
    " Search:   /text  \\hexbytes  ?/ ?\\ backward, n N repeat",
    " Files:    ~ next file, ESC ESC <n> pick file",
    "",
    " Commands: :<addr>  :+n  :-n        jump",
    "           :w [path]  :wq  :wa      write",
    "           :q  :q!  :qa  :qa!      quit",
    "           :e [path]  :e!  :tabe   open / reload",
    "           :saveas <path>          write and rename",
    "           :next :prev             cycle files",
    "           :set [name [value]]     preferences",
    "           :help                   this text",
    "           :external               shell",
];

fn parse_number(tok: &str) -> Option<u64> {
    if let Some(hex) = tok.strip_prefix("0x").or_else(|| tok.strip_prefix("0X")) {
        u64::from_str_radix(hex, 16).ok()
    } else if tok.len() > 1 && tok.starts_with('0') {
        u64::from_str_radix(&tok[1..], 8).ok()
    } else {
        tok.parse().ok()
    }
}

/// Execute one submitted command line against the editor.
pub(crate) fn execute(
    ed: &mut Editor,
    line: &str,
    target: CursorTarget,
    fx: &mut Vec<Effect>,
) -> Result<(), ActionError> {
    let tokens: Vec<&str> = line
        .split(|c| c == ' ' || c == '=')
        .filter(|t| !t.is_empty())
        .collect();
    let tok = match tokens.first() {
        Some(t) => *t,
        None => return Err(ActionError::NoAction),
    };

    // Numeric jump, absolute or relative.
    let (relative, num_tok) = match tok.as_bytes()[0] {
        b'+' => (1i64, &tok[1..]),
        b'-' => (-1i64, &tok[1..]),
        _ => (0, tok),
    };
    if let Some(num) = parse_number(num_tok) {
        let addr = if relative == 0 {
            Some(num)
        } else {
            let cur = ed.cursor_for(target) as i64;
            let moved = cur + relative * num as i64;
            if moved < 0 {
                None
            } else {
                Some(moved as u64)
            }
        };
        let size = ed.fm().map(|f| f.size()).unwrap_or(0);
        return match addr {
            Some(a) if a < size => {
                ed.jump_to(a, target);
                Ok(())
            }
            Some(a) => Err(ActionError::Invalid(format!("Invalid jump address: {}", a))),
            None => Err(ActionError::Invalid("Invalid jump address".into())),
        };
    }

    match tok {
        "set" => {
            let name = tokens.get(1);
            match name {
                None => {
                    ed.mode = Mode::Overlay(ScrollBox::new(ed.prefs.listing()));
                    Ok(())
                }
                Some(name) => {
                    ed.prefs.set(name, tokens.get(2).copied())?;
                    // A display pref may have changed the layout.
                    ed.refresh_geometry();
                    Ok(())
                }
            }
        }
        "next" | "tabn" | "bn" => {
            ed.next_file();
            Ok(())
        }
        "prev" | "previous" | "bp" | "tabp" | "last" => {
            ed.prev_file();
            Ok(())
        }
        "e" | "tabe" => match tokens.get(1) {
            None => {
                ed.open_empty();
                Ok(())
            }
            Some(arg) => {
                let path = expand_path(arg);
                let meta = std::fs::metadata(&path)
                    .map_err(|_| ActionError::Invalid(format!("Could not find {}", arg)))?;
                if meta.is_dir() {
                    let b = Browser::load(path)
                        .map_err(|e| ActionError::Invalid(format!("Could not scan: {}", e)))?;
                    ed.mode = Mode::Browser(b);
                    Ok(())
                } else {
                    ed.open_path(&path)
                }
            }
        },
        "e!" => ed.reload_current(),
        "q" | "bd" => ed.quit(false, fx),
        "q!" => ed.quit(true, fx),
        "qa" => ed.quit_all(false, fx),
        "qa!" => ed.quit_all(true, fx),
        "wa" => ed.save_all(),
        "wqa" | "waq" => {
            ed.save_all()?;
            ed.quit_all(false, fx)
        }
        "saveas" => match tokens.get(1) {
            None => Err(ActionError::NoAction),
            Some(arg) => ed.save_current_as(&expand_path(arg), true),
        },
        "w" => match tokens.get(1) {
            None => ed.save_current(),
            Some(arg) => ed.save_current_as(&expand_path(arg), false),
        },
        "wq" | "qw" => {
            match tokens.get(1) {
                None => ed.save_current()?,
                Some(arg) => ed.save_current_as(&expand_path(arg), false)?,
            }
            ed.quit(false, fx)
        }
        "help" | "h" => {
            let lines = HELP_TEXT.iter().map(|s| s.to_string()).collect();
            ed.mode = Mode::Overlay(ScrollBox::new(lines));
            Ok(())
        }
        "external" | "ex" => {
            fx.push(Effect::Suspend);
            Ok(())
        }
        _ => Err(ActionError::NoAction),
    }
}

/// Open a file picked in the browser; failures keep the current buffer.
pub(crate) fn open_browsed(ed: &mut Editor, path: std::path::PathBuf) -> Result<(), ActionError> {
    ed.open_path(&path)
}

/// Editor-level helpers the command table drives.
impl Editor {
    pub(crate) fn open_path(&mut self, path: &std::path::Path) -> Result<(), ActionError> {
        let fm = FileManager::open(path)
            .map_err(|e| ActionError::Invalid(format!("Could not open {}: {}", path.display(), e)))?;
        self.stash_view();
        self.ring.add(fm);
        self.view = super::view::View::default();
        Ok(())
    }

    pub(crate) fn open_empty(&mut self) {
        self.stash_view();
        self.ring.add(FileManager::empty());
        self.view = super::view::View::default();
    }

    pub(crate) fn reload_current(&mut self) -> Result<(), ActionError> {
        let cursor = self.view.cursor;
        let page = self.view.page_start;
        let fm = self.fm_mut().ok_or(ActionError::NoAction)?;
        fm.reload()
            .map_err(|e| ActionError::Invalid(format!("Could not reload: {}", e)))?;
        let size = fm.size();
        let geom = self.geometry;
        self.view.place_cursor(cursor, size, &geom);
        self.view.page_start = if page < size { page } else { 0 };
        self.view.follow(&geom);
        Ok(())
    }

    pub(crate) fn save_current(&mut self) -> Result<(), ActionError> {
        let Editor { ring, progress, .. } = self;
        let fm = ring
            .current_mut()
            .ok_or(ActionError::NoAction)?;
        if fm.needs_create() {
            return Err(ActionError::Invalid(
                "No file name (use :w <path> or :saveas)".into(),
            ));
        }
        let mut sink: Box<dyn FnMut(u8) + '_> = match progress.as_mut() {
            Some(p) => Box::new(|pct| p(pct)),
            None => Box::new(|_| {}),
        };
        let len = fm
            .save(&mut *sink)
            .map_err(|e| ActionError::Invalid(format!("Could not write: {}", e)))?;
        self.message = Some(format!("written, {} bytes", len));
        Ok(())
    }

    /// `:w path` writes a copy; `:saveas path` also rebinds the buffer.
    pub(crate) fn save_current_as(
        &mut self,
        path: &std::path::Path,
        rename: bool,
    ) -> Result<(), ActionError> {
        let fm = self.fm_mut().ok_or(ActionError::NoAction)?;
        let len = if rename {
            fm.save_as(path)
        } else {
            fm.save_copy(path)
        }
        .map_err(|e| ActionError::Invalid(format!("Could not write: {}", e)))?;
        self.message = Some(format!("{} written, {} bytes", path.display(), len));
        Ok(())
    }

    pub(crate) fn save_all(&mut self) -> Result<(), ActionError> {
        let Editor { ring, progress, .. } = self;
        let mut sink: Box<dyn FnMut(u8) + '_> = match progress.as_mut() {
            Some(p) => Box::new(|pct| p(pct)),
            None => Box::new(|_| {}),
        };
        for fm in ring.iter_mut() {
            if fm.needs_save() && !fm.needs_create() {
                fm.save(&mut *sink)
                    .map_err(|e| ActionError::Invalid(format!("Could not write: {}", e)))?;
            }
        }
        Ok(())
    }

    pub(crate) fn quit(&mut self, force: bool, fx: &mut Vec<Effect>) -> Result<(), ActionError> {
        let needs = self.fm().map(|f| f.needs_save()).unwrap_or(false);
        if needs && !force {
            return Err(ActionError::Invalid(
                "No write since last change (add ! to override)".into(),
            ));
        }
        if let Some(key) = self.ring.current_key() {
            self.views.remove(key);
        }
        self.ring.remove_current();
        match self.ring.current_key() {
            None => fx.push(Effect::Quit),
            Some(key) => self.restore_view(key),
        }
        Ok(())
    }

    pub(crate) fn quit_all(&mut self, force: bool, fx: &mut Vec<Effect>) -> Result<(), ActionError> {
        if !force {
            if let Some((_, fm)) = self.ring.iter().find(|(_, fm)| fm.needs_save()) {
                return Err(ActionError::Invalid(format!(
                    "No write since last change in {} (add ! to override)",
                    fm.file_name().unwrap_or_else(|| "[No Name]".into())
                )));
            }
        }
        fx.push(Effect::Quit);
        Ok(())
    }
}

use bitflags::bitflags;

#[derive(Debug, Hash, PartialEq, Eq, Clone, Copy)]
pub struct KeyEvent {
    pub(crate) key: Key,
    pub(crate) mods: KeyMods,
}

impl KeyEvent {
    pub fn new(key: Key, mods: KeyMods) -> KeyEvent {
        KeyEvent { key, mods }
    }

    pub fn plain(key: Key) -> KeyEvent {
        KeyEvent {
            key,
            mods: KeyMods::empty(),
        }
    }

    /// A plain character press, no modifiers.
    pub fn ch(ch: char) -> KeyEvent {
        KeyEvent::plain(Key::Char(ch))
    }

    /// A ctrl chord, `ctrl('d')` is ctrl+d.
    pub fn ctrl(ch: char) -> KeyEvent {
        KeyEvent {
            key: Key::Char(ch),
            mods: KeyMods::CONTROL,
        }
    }

    pub fn key(&self) -> &Key {
        &self.key
    }

    pub fn control_pressed(&self) -> bool {
        self.mods.contains(KeyMods::CONTROL)
    }

    pub fn alt_pressed(&self) -> bool {
        self.mods.contains(KeyMods::ALT)
    }

    /// The character of this event if it is one pressed without modifiers.
    /// The modal dispatch is mostly interested in these.
    pub fn plain_char(&self) -> Option<char> {
        match self.key {
            Key::Char(ch) if self.mods.is_empty() => Some(ch),
            _ => None,
        }
    }

    pub fn is_ctrl(&self, ch: char) -> bool {
        self.key == Key::Char(ch) && self.mods == KeyMods::CONTROL
    }
}

bitflags! {
    pub struct KeyMods: u8 {
        const CONTROL = 0b00_00_10;
        const ALT = 0b00_01_00;
    }
}

/// Keyboard keys
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub enum Key {
    Char(char),
    Enter,
    Esc,
    Tab,
    BackTab,
    Up,
    Down,
    Left,
    Right,
    Backspace,
    Delete,
    Home,
    End,
    PageUp,
    PageDown,
    Insert,
    Unknown,
}
